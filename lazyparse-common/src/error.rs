use std::io;
use thiserror::Error;

/// Errors raised while reading tokens from an underlying source.
///
/// These are not parse failures: they are propagated out of stream
/// construction and advancement so that no alternative branch of a grammar
/// can swallow them.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("failed to read from source: {0}")]
    Io(#[from] io::Error),
    #[error("invalid {encoding} sequence at byte offset {offset}")]
    Decode {
        encoding: &'static str,
        offset: u64,
    },
    #[error("the underlying source has already been released")]
    Released,
    #[error("tokenizer stopped: {message}")]
    Tokenize { message: String },
}
