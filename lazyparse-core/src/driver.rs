//! Entry points that run a parser against a stream.

use crate::parser::Parser;
use crate::reply::Reply;
use lazyparse_stream::{ByteStream, Input, StreamError, TextStream};

/// Releases the input's underlying source when dropped, on every exit path
/// out of a parse.
struct ReleaseGuard<'a, I: Input> {
    input: &'a I,
}

impl<'a, I: Input> ReleaseGuard<'a, I> {
    fn new(input: &'a I) -> Self {
        Self { input }
    }
}

impl<I: Input> Drop for ReleaseGuard<'_, I> {
    fn drop(&mut self) {
        log::debug!("releasing input after parse");
        self.input.release();
    }
}

impl<I: Input, T: 'static> Parser<I, T> {
    /// Runs the parser once and releases the input's source afterwards,
    /// whatever the outcome.
    ///
    /// The returned reply may still refer to states of the input; tokens
    /// already buffered stay readable after the release.
    pub fn parse(&self, input: I) -> Result<Reply<T, I>, StreamError> {
        let _guard = ReleaseGuard::new(&input);
        self.run(input.clone())
    }

    /// Runs the parser once without releasing anything, and returns the
    /// state to continue from.
    ///
    /// After a success the rest starts where the parser stopped; otherwise it
    /// is the input unchanged.
    pub fn parse_partially(&self, input: I) -> Result<(Reply<T, I>, I), StreamError> {
        let reply = self.run(input.clone())?;
        let rest = match &reply {
            Reply::Success { state, .. } => state.clone(),
            _ => input,
        };
        Ok((reply, rest))
    }
}

impl<T: 'static> Parser<TextStream, T> {
    /// Parses an in-memory string.
    pub fn parse_text(&self, text: &str) -> Result<Reply<T, TextStream>, StreamError> {
        self.parse(TextStream::from_text(text))
    }
}

impl<T: 'static> Parser<ByteStream, T> {
    /// Parses an in-memory byte slice.
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Reply<T, ByteStream>, StreamError> {
        self.parse(ByteStream::from_bytes(bytes))
    }
}
