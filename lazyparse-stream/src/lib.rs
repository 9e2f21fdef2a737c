pub mod buffer;
pub mod encoding;
pub mod input;
pub mod options;
pub mod source;
pub mod stream;

pub use encoding::{Decoder, Encoding};
pub use input::Input;
pub use lazyparse_common::{LinearPosition, Position, StreamError, TextPosition, Token};
pub use options::{StreamOptions, DEFAULT_CHUNK_SIZE};
pub use source::{ByteSource, IterSource, TextSource, TokenSource};
pub use stream::{ByteStream, Stream, TextStream};
