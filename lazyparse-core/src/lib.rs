//! Parser combinators over lazily buffered streams.
//!
//! Parsers are built from the functions in [`combinators`] and [`text`] and
//! the methods on [`Parser`], then run with [`Parser::parse`] or
//! [`Parser::parse_partially`]. Composition is stored as data and executed
//! by an iterative engine, so neither input length nor grammar depth is
//! limited by the call stack.

pub mod combinators;
mod driver;
mod engine;
mod node;
pub mod parser;
pub mod reply;
pub mod text;

pub use combinators::{
    abort, any, chain_left, chain_left1, chain_right, chain_right1, choice, delay, end, fail, fail_with, fix,
    look_ahead, none_of, not, one_of, position, pure, satisfy, sequence, state, take, token,
};
pub use parser::Parser;
pub use reply::{Cause, ErrorKind, Fault, ParseError, Reply};
pub use text::{
    alphanumeric, bytes, character, digit, float, integer, letter, newline, none_of_str, one_of_str, spaces,
    spaces1, string, whitespace, NumberError,
};

pub use lazyparse_stream::{
    ByteStream, Encoding, Input, LinearPosition, Position, Stream, StreamError, StreamOptions, TextPosition,
    TextStream, Token, TokenSource,
};
