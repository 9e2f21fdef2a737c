//! Chunked, append-only token buffer shared by every state of a stream.

use crate::source::TokenSource;
use lazyparse_common::StreamError;
use std::cell::{Cell, OnceCell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Owner of the underlying source.
///
/// Every state derived from the same stream shares one slot, so the source
/// is released exactly once no matter which state triggers it.
pub(crate) struct SourceSlot<T> {
    source: RefCell<Option<Box<dyn TokenSource<T>>>>,
    chunk_size: usize,
    chunks_read: Cell<usize>,
}

impl<T> SourceSlot<T> {
    pub(crate) fn new(source: Box<dyn TokenSource<T>>, chunk_size: usize) -> Self {
        Self {
            source: RefCell::new(Some(source)),
            chunk_size: chunk_size.max(1),
            chunks_read: Cell::new(0),
        }
    }

    /// A slot for in-memory streams, which have nothing to read or release.
    pub(crate) fn detached() -> Self {
        Self {
            source: RefCell::new(None),
            chunk_size: 1,
            chunks_read: Cell::new(0),
        }
    }

    /// Reads the next chunk. An empty chunk means the source is exhausted,
    /// in which case it has already been released.
    pub(crate) fn read_chunk(&self) -> Result<Vec<T>, StreamError> {
        let mut slot = self.source.borrow_mut();
        let Some(source) = slot.as_mut() else {
            return Err(StreamError::Released);
        };

        let mut tokens = Vec::with_capacity(self.chunk_size);
        match source.fill(&mut tokens, self.chunk_size) {
            Ok(()) => {
                let index = self.chunks_read.get();
                self.chunks_read.set(index + 1);
                if tokens.is_empty() {
                    *slot = None;
                    log::debug!("source exhausted after {index} chunks; released");
                } else {
                    log::trace!("read chunk {index} ({} tokens)", tokens.len());
                }
                Ok(tokens)
            }
            Err(err) => {
                *slot = None;
                log::debug!("source read failed, released: {err}");
                Err(err)
            }
        }
    }

    /// Drops the source. Returns `false` if it was already gone.
    pub(crate) fn release(&self) -> bool {
        let released = self.source.borrow_mut().take().is_some();
        if released {
            log::debug!(
                "released source after {} chunks",
                self.chunks_read.get()
            );
        }
        released
    }

    pub(crate) fn is_live(&self) -> bool {
        self.source.borrow().is_some()
    }
}

/// A run of buffered tokens plus the memoized link to the run that follows.
pub(crate) struct Chunk<T> {
    tokens: Vec<T>,
    next: OnceCell<Rc<Chunk<T>>>,
}

impl<T> Chunk<T> {
    pub(crate) fn new(tokens: Vec<T>) -> Self {
        Self {
            tokens,
            next: OnceCell::new(),
        }
    }

    /// The empty chunk that marks end of input.
    pub(crate) fn end() -> Self {
        Self::new(Vec::new())
    }

    /// A chunk already known to be the last one with tokens.
    pub(crate) fn sealed(tokens: Vec<T>) -> Self {
        let chunk = Self::new(tokens);
        let _ = chunk.next.set(Rc::new(Self::end()));
        chunk
    }

    pub(crate) fn get(&self, index: usize) -> Option<&T> {
        self.tokens.get(index)
    }

    pub(crate) fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Returns the following chunk, reading it from `slot` the first time.
    pub(crate) fn successor(&self, slot: &SourceSlot<T>) -> Result<Rc<Chunk<T>>, StreamError> {
        if let Some(next) = self.next.get() {
            return Ok(Rc::clone(next));
        }
        let next = Rc::new(Chunk::new(slot.read_chunk()?));
        Ok(Rc::clone(self.next.get_or_init(|| next)))
    }
}

// Unlink iteratively: a long chain of small chunks would otherwise drop
// recursively, one frame per chunk.
impl<T> Drop for Chunk<T> {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(chunk) = next {
            match Rc::try_unwrap(chunk) {
                Ok(mut chunk) => next = chunk.next.take(),
                Err(_) => break,
            }
        }
    }
}

impl<T> fmt::Debug for Chunk<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("len", &self.tokens.len())
            .field("linked", &self.next.get().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::IterSource;

    #[test]
    fn test_successor_is_memoized() {
        let slot = SourceSlot::new(Box::new(IterSource::new(0..4)), 2);
        let first = Chunk::new(slot.read_chunk().unwrap());
        let a = first.successor(&slot).unwrap();
        let b = first.successor(&slot).unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(a.get(0), Some(&2));
        assert_eq!(slot.chunks_read.get(), 2);
    }

    #[test]
    fn test_exhaustion_releases_source() {
        let slot = SourceSlot::new(Box::new(IterSource::new(0..1)), 4);
        assert_eq!(slot.read_chunk().unwrap(), vec![0]);
        assert!(slot.is_live());
        assert!(slot.read_chunk().unwrap().is_empty());
        assert!(!slot.is_live());
        assert!(matches!(slot.read_chunk(), Err(StreamError::Released)));
    }

    #[test]
    fn test_long_chain_drops_without_recursion() {
        let slot = SourceSlot::new(Box::new(IterSource::new(0..200_000)), 1);
        let head = Rc::new(Chunk::new(slot.read_chunk().unwrap()));
        let mut cursor = Rc::clone(&head);
        while cursor.len() > 0 {
            cursor = cursor.successor(&slot).unwrap();
        }
        drop(cursor);
        drop(head);
    }
}
