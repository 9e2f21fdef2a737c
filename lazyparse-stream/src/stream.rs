use crate::buffer::{Chunk, SourceSlot};
use crate::options::StreamOptions;
use crate::source::{ByteSource, IterSource, TextSource, TokenSource};
use lazyparse_common::{LinearPosition, Position, StreamError, TextPosition, Token};
use std::fmt;
use std::io::Read;
use std::rc::Rc;

/// An immutable cursor: "the input remaining from this point on".
///
/// Advancing never mutates a state; it produces a new one. States share the
/// chunk buffer they live in, so keeping old states around as backtracking
/// points costs nothing and never re-reads the source. Two states compare
/// equal when they sit at the same place in the same buffer.
pub struct Stream<T, P = LinearPosition> {
    chunk: Rc<Chunk<T>>,
    index: usize,
    position: P,
    slot: Rc<SourceSlot<T>>,
}

/// A character stream with line/column positions.
pub type TextStream = Stream<char, TextPosition>;

/// A byte stream with index positions.
pub type ByteStream = Stream<u8, LinearPosition>;

impl<T: Token, P: Position<T>> Stream<T, P> {
    /// Creates a stream over an in-memory sequence.
    pub fn from_vec(tokens: Vec<T>) -> Self {
        let chunk = if tokens.is_empty() {
            Chunk::end()
        } else {
            Chunk::sealed(tokens)
        };
        Self::at_start(Rc::new(chunk), Rc::new(SourceSlot::detached()))
    }

    /// Creates a stream over a copy of `tokens`.
    pub fn from_slice(tokens: &[T]) -> Self {
        Self::from_vec(tokens.to_vec())
    }

    /// Creates a stream over a forward-only iterator, read in chunks.
    pub fn from_iterator<I>(iter: I) -> Result<Self, StreamError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::from_iterator_with(iter, &StreamOptions::default())
    }

    /// Like [`Stream::from_iterator`], with explicit options.
    pub fn from_iterator_with<I>(iter: I, options: &StreamOptions) -> Result<Self, StreamError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Self::from_source_with(IterSource::new(iter), options)
    }

    /// Creates a stream that owns `source`, using default options.
    pub fn from_source<S>(source: S) -> Result<Self, StreamError>
    where
        S: TokenSource<T> + 'static,
    {
        Self::from_source_with(source, &StreamOptions::default())
    }

    /// Creates a stream that owns `source`. The first chunk is read eagerly,
    /// so a failing source is reported here rather than during parsing.
    pub fn from_source_with<S>(source: S, options: &StreamOptions) -> Result<Self, StreamError>
    where
        S: TokenSource<T> + 'static,
    {
        let slot = Rc::new(SourceSlot::new(Box::new(source), options.chunk_size));
        let chunk = Rc::new(Chunk::new(slot.read_chunk()?));
        Ok(Self::at_start(chunk, slot))
    }

    fn at_start(chunk: Rc<Chunk<T>>, slot: Rc<SourceSlot<T>>) -> Self {
        Self {
            chunk,
            index: 0,
            position: P::start(),
            slot,
        }
    }

    /// Returns the current token, or `None` at end of input.
    pub fn current(&self) -> Option<&T> {
        self.chunk.get(self.index)
    }

    /// Returns true if a current token exists.
    pub fn has_value(&self) -> bool {
        self.index < self.chunk.len()
    }

    /// Returns the position of the current token.
    pub fn position(&self) -> &P {
        &self.position
    }

    /// Returns the state one token further on.
    ///
    /// The end-of-input state advances to itself. Crossing a chunk boundary
    /// reads the next chunk from the source unless a sibling state already
    /// did.
    pub fn advance(&self) -> Result<Self, StreamError> {
        let Some(token) = self.current() else {
            return Ok(self.clone());
        };
        let position = self.position.advance(token);

        let (chunk, index) = if self.index + 1 < self.chunk.len() {
            (Rc::clone(&self.chunk), self.index + 1)
        } else {
            (self.chunk.successor(&self.slot)?, 0)
        };

        Ok(Self {
            chunk,
            index,
            position,
            slot: Rc::clone(&self.slot),
        })
    }

    /// Advances `count` tokens, stopping early at end of input.
    pub fn advance_by(&self, count: usize) -> Result<Self, StreamError> {
        let mut state = self.clone();
        for _ in 0..count {
            if !state.has_value() {
                break;
            }
            state = state.advance()?;
        }
        Ok(state)
    }

    /// Collects every remaining token. Reads the rest of the source.
    pub fn remaining(&self) -> Result<Vec<T>, StreamError> {
        let mut tokens = Vec::new();
        let mut state = self.clone();
        while let Some(token) = state.current() {
            tokens.push(token.clone());
            state = state.advance()?;
        }
        Ok(tokens)
    }

    /// Releases the underlying source for every state of this stream.
    ///
    /// Returns `false` when there was nothing left to release. Tokens that
    /// were already buffered stay readable; advancing past them afterwards
    /// fails with [`StreamError::Released`].
    pub fn release(&self) -> bool {
        self.slot.release()
    }

    /// Returns `true` while the underlying source is still held open.
    pub fn is_source_live(&self) -> bool {
        self.slot.is_live()
    }

    /// Returns `true` when both states read from the same buffered chunk.
    pub fn shares_buffer_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.chunk, &other.chunk)
    }
}

impl<P: Position<char>> Stream<char, P> {
    /// Creates a stream over the characters of `text`.
    pub fn from_text(text: &str) -> Self {
        Self::from_vec(text.chars().collect())
    }

    /// Creates a character stream over a reader, decoded as UTF-8.
    pub fn from_text_reader<R>(reader: R) -> Result<Self, StreamError>
    where
        R: Read + 'static,
    {
        Self::from_text_reader_with(reader, &StreamOptions::default())
    }

    /// Like [`Stream::from_text_reader`], with explicit options.
    pub fn from_text_reader_with<R>(reader: R, options: &StreamOptions) -> Result<Self, StreamError>
    where
        R: Read + 'static,
    {
        Self::from_source_with(TextSource::new(reader, options.encoding), options)
    }
}

impl<P: Position<u8>> Stream<u8, P> {
    /// Creates a stream over a copy of `bytes`.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_slice(bytes)
    }

    /// Creates a byte stream over a reader.
    pub fn from_reader<R>(reader: R) -> Result<Self, StreamError>
    where
        R: Read + 'static,
    {
        Self::from_reader_with(reader, &StreamOptions::default())
    }

    /// Like [`Stream::from_reader`], with explicit options.
    pub fn from_reader_with<R>(reader: R, options: &StreamOptions) -> Result<Self, StreamError>
    where
        R: Read + 'static,
    {
        Self::from_source_with(ByteSource::new(reader), options)
    }
}

impl<T, P: Clone> Clone for Stream<T, P> {
    fn clone(&self) -> Self {
        Self {
            chunk: Rc::clone(&self.chunk),
            index: self.index,
            position: self.position.clone(),
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T, P> PartialEq for Stream<T, P> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.chunk, &other.chunk) && self.index == other.index
    }
}

impl<T, P> Eq for Stream<T, P> {}

impl<T: fmt::Debug, P: fmt::Debug> fmt::Debug for Stream<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("position", &self.position)
            .field("current", &self.chunk.get(self.index))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stream_is_at_end() {
        let stream = ByteStream::from_bytes(b"");
        assert!(!stream.has_value());
        assert_eq!(stream.current(), None);
        assert_eq!(stream.advance().unwrap(), stream);
    }

    #[test]
    fn test_states_within_a_chunk_share_it() {
        let stream = TextStream::from_text("abc");
        let next = stream.advance().unwrap();
        assert!(stream.shares_buffer_with(&next));
        assert_ne!(stream, next);
        assert_eq!(next, stream.advance().unwrap());
    }
}
