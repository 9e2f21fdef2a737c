//! Outcome of running a parser at a given state.

use lazyparse_stream::{Input, Token};
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// The error a user callback raised, kept as the cause of a failure.
pub type Cause = Arc<dyn Error + Send + Sync>;

/// Details of a failed or aborted parse.
#[derive(Clone)]
pub struct Fault<I> {
    message: Option<String>,
    cause: Option<Cause>,
    state: I,
}

impl<I: Input> Fault<I> {
    /// A fault with the default `Unexpected '...'` message.
    pub fn unexpected(state: I) -> Self {
        Self {
            message: None,
            cause: None,
            state,
        }
    }

    /// A fault with a custom message.
    pub fn new(message: impl Into<String>, state: I) -> Self {
        Self {
            message: Some(message.into()),
            cause: None,
            state,
        }
    }

    /// A fault raised by a failing user callback.
    pub fn caused_by(cause: Cause, state: I) -> Self {
        Self {
            message: Some(cause.to_string()),
            cause: Some(cause),
            state,
        }
    }

    /// Returns the message, falling back to the token found at the fault.
    pub fn message(&self) -> String {
        match &self.message {
            Some(message) => message.clone(),
            None => match self.state.current() {
                Some(token) => format!("Unexpected '{}'", token.describe()),
                None => "Unexpected '<EndOfStream>'".to_string(),
            },
        }
    }

    /// The message set explicitly, if any.
    pub fn custom_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The error that caused the fault, if a callback raised one.
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }

    /// The state at which the fault occurred.
    pub fn state(&self) -> &I {
        &self.state
    }

    /// Position of the fault.
    pub fn position(&self) -> I::Position {
        self.state.position()
    }

    /// Returns the same fault with its message replaced.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Returns the same fault moved to `state`.
    pub fn with_state(mut self, state: I) -> Self {
        self.state = state;
        self
    }

    /// Detaches the fault from its stream.
    pub fn to_error(&self, kind: ErrorKind) -> ParseError {
        ParseError {
            kind,
            location: self.position().to_string(),
            message: self.message(),
            cause: self.cause.clone(),
        }
    }
}

impl<I: Input> fmt::Debug for Fault<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("message", &self.message())
            .field("position", &self.position())
            .field("cause", &self.cause.as_ref().map(|c| c.to_string()))
            .finish()
    }
}

impl<I: Input> PartialEq for Fault<I> {
    fn eq(&self, other: &Self) -> bool {
        self.message == other.message
            && self.state == other.state
            && self.cause.as_ref().map(|c| c.to_string()) == other.cause.as_ref().map(|c| c.to_string())
    }
}

/// The three outcomes of running a parser.
///
/// `Failure` is recoverable: an enclosing alternative resets to where it
/// started and tries its next branch. `Abort` is not: it passes every
/// pending alternative and reaches the driver.
#[derive(Clone)]
pub enum Reply<T, I> {
    Success { value: T, state: I },
    Failure(Fault<I>),
    Abort(Fault<I>),
}

impl<T, I: Input> Reply<T, I> {
    /// Creates a success.
    pub fn success(value: T, state: I) -> Self {
        Reply::Success { value, state }
    }

    /// Creates a recoverable failure.
    pub fn failure(fault: Fault<I>) -> Self {
        Reply::Failure(fault)
    }

    /// Creates an abort.
    pub fn abort(fault: Fault<I>) -> Self {
        Reply::Abort(fault)
    }

    /// Returns true for a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Reply::Success { .. })
    }

    /// Returns true for a recoverable failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Reply::Failure(_))
    }

    /// Returns true for an abort.
    pub fn is_abort(&self) -> bool {
        matches!(self, Reply::Abort(_))
    }

    /// The state after a success, or the state where the fault occurred.
    pub fn state(&self) -> &I {
        match self {
            Reply::Success { state, .. } => state,
            Reply::Failure(fault) | Reply::Abort(fault) => fault.state(),
        }
    }

    /// Position of [`Reply::state`].
    pub fn position(&self) -> I::Position {
        self.state().position()
    }

    /// The fault of a failure or abort.
    pub fn fault(&self) -> Option<&Fault<I>> {
        match self {
            Reply::Success { .. } => None,
            Reply::Failure(fault) | Reply::Abort(fault) => Some(fault),
        }
    }

    /// Returns the failure message, or `None` on success.
    pub fn message(&self) -> Option<String> {
        self.fault().map(Fault::message)
    }

    /// Borrows the value of a success.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Reply::Success { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Extracts the value, turning a failure or abort into a [`ParseError`].
    pub fn value(self) -> Result<T, ParseError> {
        self.into_result().map(|(value, _)| value)
    }

    /// Splits a success into its value and remaining state.
    pub fn into_result(self) -> Result<(T, I), ParseError> {
        match self {
            Reply::Success { value, state } => Ok((value, state)),
            Reply::Failure(fault) => Err(fault.to_error(ErrorKind::Failure)),
            Reply::Abort(fault) => Err(fault.to_error(ErrorKind::Abort)),
        }
    }

    /// Branches on the outcome.
    pub fn fold<R>(self, on_success: impl FnOnce(T, I) -> R, on_error: impl FnOnce(ErrorKind, Fault<I>) -> R) -> R {
        match self {
            Reply::Success { value, state } => on_success(value, state),
            Reply::Failure(fault) => on_error(ErrorKind::Failure, fault),
            Reply::Abort(fault) => on_error(ErrorKind::Abort, fault),
        }
    }

    /// Transforms the value of a success.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U, I> {
        match self {
            Reply::Success { value, state } => Reply::Success {
                value: f(value),
                state,
            },
            Reply::Failure(fault) => Reply::Failure(fault),
            Reply::Abort(fault) => Reply::Abort(fault),
        }
    }
}

impl<T: fmt::Debug, I: Input> fmt::Debug for Reply<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Success { value, state } => f
                .debug_struct("Success")
                .field("value", value)
                .field("position", &state.position())
                .finish(),
            Reply::Failure(fault) => f.debug_tuple("Failure").field(fault).finish(),
            Reply::Abort(fault) => f.debug_tuple("Abort").field(fault).finish(),
        }
    }
}

impl<T: fmt::Debug, I: Input> fmt::Display for Reply<T, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Success { value, state } => {
                write!(f, "Success ({}): {:?}", state.position(), value)
            }
            Reply::Failure(fault) => write!(f, "{}", fault.to_error(ErrorKind::Failure)),
            Reply::Abort(fault) => write!(f, "{}", fault.to_error(ErrorKind::Abort)),
        }
    }
}

impl<T: PartialEq, I: Input> PartialEq for Reply<T, I> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                Reply::Success { value, state },
                Reply::Success {
                    value: other_value,
                    state: other_state,
                },
            ) => value == other_value && state == other_state,
            (Reply::Failure(a), Reply::Failure(b)) | (Reply::Abort(a), Reply::Abort(b)) => a == b,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Failure,
    Abort,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Failure => f.write_str("Failure"),
            ErrorKind::Abort => f.write_str("Abort"),
        }
    }
}

/// A failed parse, detached from the stream it ran against.
#[derive(Debug, Clone, Error)]
#[error("{kind} ({location}): {message}")]
pub struct ParseError {
    kind: ErrorKind,
    location: String,
    message: String,
    #[source]
    cause: Option<Cause>,
}

impl ParseError {
    /// Whether the parse failed or aborted.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The rendered position, e.g. `Line: 1, Column: 3`.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The failure message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error raised by a fallible callback, if any.
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazyparse_stream::TextStream;

    #[test]
    fn test_default_message_names_the_token() {
        let state = TextStream::from_text("xyz");
        let fault = Fault::unexpected(state);
        assert_eq!(fault.message(), "Unexpected 'x'");
    }

    #[test]
    fn test_default_message_at_end() {
        let state = TextStream::from_text("");
        assert_eq!(Fault::unexpected(state).message(), "Unexpected '<EndOfStream>'");
    }

    #[test]
    fn test_rendering() {
        let state = TextStream::from_text("ab").advance().unwrap();
        let reply: Reply<(), _> = Reply::failure(Fault::unexpected(state.clone()));
        assert_eq!(reply.to_string(), "Failure (Line: 1, Column: 2): Unexpected 'b'");
        let reply: Reply<(), _> = Reply::abort(Fault::new("stop", state));
        assert_eq!(reply.to_string(), "Abort (Line: 1, Column: 2): stop");
    }

    #[test]
    fn test_value_extraction() {
        let state = TextStream::from_text("a");
        let ok: Reply<i32, _> = Reply::success(7, state.clone());
        assert_eq!(ok.value().unwrap(), 7);

        let err = Reply::<i32, _>::failure(Fault::new("nope", state))
            .value()
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Failure);
        assert_eq!(err.location(), "Line: 1, Column: 1");
        assert_eq!(err.to_string(), "Failure (Line: 1, Column: 1): nope");
    }
}
