use lazyparse_core::{Input, Parser, Reply};
use lazyparse_stream::{Stream, StreamError, StreamOptions, Token, TokenSource};

/// Chunk size used by [`tokenize`]: one lexer run per token the grammar
/// actually looks at.
pub const TOKENIZE_CHUNK_SIZE: usize = 1;

/// A token source that runs a lexer parser over an underlying input.
///
/// Every `fill` resumes from where the previous lexer run stopped, so the
/// underlying input is advanced once per produced token. The underlying
/// source is released when this source is dropped.
pub struct TokenizeSource<I: Input, T> {
    state: I,
    lexer: Parser<I, T>,
}

impl<I: Input, T: 'static> TokenizeSource<I, T> {
    /// Starts lexing at `input`.
    pub fn new(input: I, lexer: Parser<I, T>) -> Self {
        Self { state: input, lexer }
    }
}

impl<I: Input, T: Token> TokenSource<T> for TokenizeSource<I, T> {
    fn fill(&mut self, buf: &mut Vec<T>, max: usize) -> Result<(), StreamError> {
        while buf.len() < max {
            if self.state.is_eof() {
                log::debug!("tokenizer reached end of input at {}", self.state.position());
                break;
            }
            match self.lexer.run(self.state.clone())? {
                Reply::Success { value, state } => {
                    if state == self.state {
                        return Err(StreamError::Tokenize {
                            message: format!("lexer consumed no input at {}", state.position()),
                        });
                    }
                    buf.push(value);
                    self.state = state;
                }
                reply => {
                    return Err(StreamError::Tokenize {
                        message: reply.to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl<I: Input, T> Drop for TokenizeSource<I, T> {
    fn drop(&mut self) {
        self.state.release();
    }
}

/// Turns `input` into a stream of the successive values of `lexer`.
///
/// Tokens are produced on demand. The stream ends when the lexer is
/// tried at the end of `input`; a lexer failure before that point is reported
/// as [`StreamError::Tokenize`] by whichever read hits it.
pub fn tokenize<I, T>(input: I, lexer: &Parser<I, T>) -> Result<Stream<T>, StreamError>
where
    I: Input,
    T: Token,
{
    tokenize_with(input, lexer, &StreamOptions::new().with_chunk_size(TOKENIZE_CHUNK_SIZE))
}

/// Like [`tokenize`], with explicit options for the token stream.
pub fn tokenize_with<I, T>(input: I, lexer: &Parser<I, T>, options: &StreamOptions) -> Result<Stream<T>, StreamError>
where
    I: Input,
    T: Token,
{
    Stream::from_source_with(TokenizeSource::new(input, lexer.clone()), options)
}
