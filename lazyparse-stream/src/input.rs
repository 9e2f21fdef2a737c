use crate::stream::Stream;
use lazyparse_common::{Position, StreamError, Token};
use std::fmt;

/// The view of a stream state that parsers run against.
///
/// Implementations are immutable cursors: `advance` returns a new state and
/// leaves `self` valid as a backtracking point. Equal states must denote the
/// same place in the same input.
pub trait Input: Clone + PartialEq + fmt::Debug + 'static {
    type Token: Token;
    type Position: Position<Self::Token>;

    /// Returns the current token without advancing.
    fn current(&self) -> Option<&Self::Token>;

    /// Returns true if a current token exists.
    fn has_value(&self) -> bool {
        self.current().is_some()
    }

    /// Returns true if at end of input.
    fn is_eof(&self) -> bool {
        !self.has_value()
    }

    /// Returns the current position.
    fn position(&self) -> Self::Position;

    /// Returns the state advanced by exactly one token.
    fn advance(&self) -> Result<Self, StreamError>;

    /// Releases the underlying resource, if any.
    fn release(&self);
}

impl<T: Token, P: Position<T>> Input for Stream<T, P> {
    type Token = T;
    type Position = P;

    fn current(&self) -> Option<&T> {
        Stream::current(self)
    }

    fn has_value(&self) -> bool {
        Stream::has_value(self)
    }

    fn position(&self) -> P {
        Stream::position(self).clone()
    }

    fn advance(&self) -> Result<Self, StreamError> {
        Stream::advance(self)
    }

    fn release(&self) {
        Stream::release(self);
    }
}
