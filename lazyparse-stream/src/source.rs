use crate::encoding::{Decoder, Encoding};
use lazyparse_common::StreamError;
use std::io::{self, Read};
use std::iter::Fuse;

/// A forward-only producer of tokens.
///
/// Streams pull tokens from a source in chunks and never ask for the same
/// token twice. The source is dropped as soon as it reports exhaustion or an
/// error, or when the owning stream releases it.
pub trait TokenSource<T> {
    /// Appends up to `max` tokens to `buf`.
    ///
    /// Appending nothing signals that the source is exhausted.
    fn fill(&mut self, buf: &mut Vec<T>, max: usize) -> Result<(), StreamError>;
}

/// Source over any iterator, including unbounded ones.
#[derive(Debug)]
pub struct IterSource<I: Iterator> {
    iter: Fuse<I>,
}

impl<I: Iterator> IterSource<I> {
    /// Wraps an iterator.
    pub fn new<S>(iter: S) -> Self
    where
        S: IntoIterator<IntoIter = I>,
    {
        Self {
            iter: iter.into_iter().fuse(),
        }
    }
}

impl<I: Iterator> TokenSource<I::Item> for IterSource<I> {
    fn fill(&mut self, buf: &mut Vec<I::Item>, max: usize) -> Result<(), StreamError> {
        buf.extend(self.iter.by_ref().take(max));
        Ok(())
    }
}

/// Byte source over a reader.
#[derive(Debug)]
pub struct ByteSource<R> {
    reader: R,
}

impl<R: Read> ByteSource<R> {
    /// Wraps a byte reader.
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: Read> TokenSource<u8> for ByteSource<R> {
    fn fill(&mut self, buf: &mut Vec<u8>, max: usize) -> Result<(), StreamError> {
        let start = buf.len();
        buf.resize(start + max, 0);
        match read_retrying(&mut self.reader, &mut buf[start..]) {
            Ok(read) => {
                buf.truncate(start + read);
                Ok(())
            }
            Err(err) => {
                buf.truncate(start);
                Err(err.into())
            }
        }
    }
}

/// Character source over a reader, decoding with a configurable encoding.
#[derive(Debug)]
pub struct TextSource<R> {
    reader: R,
    decoder: Decoder,
    raw: Vec<u8>,
    done: bool,
}

impl<R: Read> TextSource<R> {
    /// Wraps a reader decoded with `encoding`.
    pub fn new(reader: R, encoding: Encoding) -> Self {
        Self {
            reader,
            decoder: Decoder::new(encoding),
            raw: Vec::new(),
            done: false,
        }
    }
}

impl<R: Read> TokenSource<char> for TextSource<R> {
    fn fill(&mut self, buf: &mut Vec<char>, max: usize) -> Result<(), StreamError> {
        let start = buf.len();
        // A read may end inside a multi-byte sequence and yield nothing.
        while buf.len() == start && !self.done {
            self.raw.resize(max, 0);
            let read = read_retrying(&mut self.reader, &mut self.raw)?;
            self.done = read == 0;
            self.decoder.decode(&self.raw[..read], buf, self.done)?;
        }
        Ok(())
    }
}

fn read_retrying<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(buf) {
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}
