//! Word counter example.
//!
//! Reads a file (or stdin) through a buffered text stream, tokenizes it into
//! words and counts them with a second parser over the word stream.
//!
//! Usage: `word-count [--encoding <ENCODING>] [FILE]`

use clap::{Parser as ClapParser, ValueEnum};
use lazyparse_core::{alphanumeric, any, satisfy, Parser, TextStream};
use lazyparse_pipeline::tokenize;
use lazyparse_stream::{Encoding, Stream, StreamError, StreamOptions};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

/// Text encodings accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EncodingArg {
    #[value(alias = "utf-8")]
    Utf8,
    #[value(alias = "utf-16le")]
    Utf16le,
    #[value(alias = "utf-16be")]
    Utf16be,
    #[value(alias = "iso-8859-1")]
    Latin1,
    Ascii,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Utf8 => Encoding::Utf8,
            EncodingArg::Utf16le => Encoding::Utf16Le,
            EncodingArg::Utf16be => Encoding::Utf16Be,
            EncodingArg::Latin1 => Encoding::Latin1,
            EncodingArg::Ascii => Encoding::Ascii,
        }
    }
}

/// Count word occurrences in a file or stdin.
#[derive(Debug, ClapParser)]
#[command(name = "word-count")]
struct Args {
    /// Encoding of the input text
    #[arg(short, long, value_enum, default_value_t = EncodingArg::Utf8)]
    encoding: EncodingArg,

    /// File to read; stdin when omitted
    file: Option<PathBuf>,
}

/// A run of letters or digits, skipping whatever separates it from the next.
fn word() -> Parser<TextStream, String> {
    let separator = satisfy::<TextStream>(|c: &char| !c.is_alphanumeric());
    separator
        .skip_many()
        .then(&alphanumeric().many1().collect_string())
        .skip(&separator.skip_many())
        .map(|word| word.to_lowercase())
}

fn count_words(reader: Box<dyn Read>, options: &StreamOptions) -> Result<BTreeMap<String, usize>, StreamError> {
    let text = TextStream::from_text_reader_with(reader, options)?;
    let words = tokenize(text, &word())?;
    let counter = any::<Stream<String>>().fold_left(BTreeMap::new(), |mut counts, word| {
        *counts.entry(word).or_insert(0usize) += 1;
        counts
    });
    let reply = counter.parse(words)?;
    Ok(reply.value().unwrap_or_default())
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();
    let options = StreamOptions::default().with_encoding(args.encoding.into());

    let reader: Box<dyn Read> = match &args.file {
        Some(path) => match File::open(path) {
            Ok(file) => Box::new(file),
            Err(err) => {
                eprintln!("Error: cannot open {}: {err}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => Box::new(io::stdin()),
    };

    match count_words(reader, &options) {
        Ok(counts) => {
            let total: usize = counts.values().sum();
            for (word, count) in &counts {
                println!("{count:>8} {word}");
            }
            println!("{total:>8} total ({} distinct)", counts.len());
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["word-count"]).unwrap();
        assert_eq!(args.encoding, EncodingArg::Utf8);
        assert!(args.file.is_none());
    }

    #[test]
    fn test_args_encoding_and_file() {
        let args = Args::try_parse_from(["word-count", "--encoding", "utf-16le", "notes.txt"]).unwrap();
        assert_eq!(Encoding::from(args.encoding), Encoding::Utf16Le);
        assert_eq!(args.file, Some(PathBuf::from("notes.txt")));
        assert!(Args::try_parse_from(["word-count", "--encoding", "ebcdic"]).is_err());
    }

    #[test]
    fn test_count_words() {
        let reader = Box::new(Cursor::new(b"The cat, the hat.".to_vec()));
        let counts = count_words(reader, &StreamOptions::default()).unwrap();
        assert_eq!(counts.get("the"), Some(&2));
        assert_eq!(counts.get("cat"), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), 4);
    }
}
