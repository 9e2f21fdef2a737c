mod tokenize;

pub use tokenize::{tokenize, tokenize_with, TokenizeSource, TOKENIZE_CHUNK_SIZE};

use lazyparse_core::{Input, Parser, Reply};
use lazyparse_stream::{Stream, StreamError, StreamOptions, Token};

/// Drives a lexer and a grammar parser in lockstep: the grammar reads
/// from a token stream that the lexer fills on demand.
pub struct Pipeline<I: Input, Tok: Token, Ast> {
    lexer: Parser<I, Tok>,
    parser: Parser<Stream<Tok>, Ast>,
    options: StreamOptions,
}

impl<I, Tok, Ast> Pipeline<I, Tok, Ast>
where
    I: Input,
    Tok: Token,
    Ast: 'static,
{
    /// Creates a pipeline whose token stream reads one token per chunk.
    pub fn new(lexer: Parser<I, Tok>, parser: Parser<Stream<Tok>, Ast>) -> Self {
        Self {
            lexer,
            parser,
            options: StreamOptions::new().with_chunk_size(TOKENIZE_CHUNK_SIZE),
        }
    }

    /// Sets the options of the intermediate token stream.
    pub fn with_options(mut self, options: StreamOptions) -> Self {
        self.options = options;
        self
    }

    /// Runs the grammar over the tokens lexed from `input`. Both streams are
    /// released when the run ends.
    pub fn run(&self, input: I) -> Result<Reply<Ast, Stream<Tok>>, StreamError> {
        let tokens = tokenize_with(input, &self.lexer, &self.options)?;
        self.parser.parse(tokens)
    }
}
