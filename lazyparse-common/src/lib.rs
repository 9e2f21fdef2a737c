//! Common Framework
//!
//! Building blocks shared by the stream layer and the parser engine:
//! positions, token rendering and the resource error type.

pub mod error;
pub mod position;
pub mod token;

pub use error::StreamError;
pub use position::{LinearPosition, Position, TextPosition};
pub use token::Token;
