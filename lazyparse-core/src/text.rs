//! Character and byte level helpers.

use crate::combinators::{satisfy, sequence, token};
use crate::parser::Parser;
use lazyparse_stream::Input;
use std::any::type_name;
use std::error::Error;
use std::str::FromStr;
use thiserror::Error;

/// Matched text that does not convert to the requested number type.
#[derive(Debug, Error)]
#[error("'{text}' is not a valid {target}")]
pub struct NumberError {
    pub text: String,
    pub target: &'static str,
    #[source]
    pub source: Box<dyn Error + Send + Sync>,
}

/// Consumes the character `expected`.
pub fn character<I: Input<Token = char>>(expected: char) -> Parser<I, char> {
    token(expected)
}

/// Matches `literal` character by character. A mismatch is reported at the
/// first character that differs.
pub fn string<I: Input<Token = char>>(literal: &str) -> Parser<I, String> {
    let owned = literal.to_string();
    sequence(literal.chars().map(character::<I>)).map(move |_| owned.clone())
}

/// Consumes an ASCII digit.
pub fn digit<I: Input<Token = char>>() -> Parser<I, char> {
    satisfy(|c: &char| c.is_ascii_digit())
}

/// Consumes an alphabetic character.
pub fn letter<I: Input<Token = char>>() -> Parser<I, char> {
    satisfy(|c: &char| c.is_alphabetic())
}

/// Consumes an alphabetic or numeric character.
pub fn alphanumeric<I: Input<Token = char>>() -> Parser<I, char> {
    satisfy(|c: &char| c.is_alphanumeric())
}

/// Consumes a whitespace character.
pub fn whitespace<I: Input<Token = char>>() -> Parser<I, char> {
    satisfy(|c: &char| c.is_whitespace())
}

/// Matches `\n` or `\r\n`, yielding `'\n'`.
pub fn newline<I: Input<Token = char>>() -> Parser<I, char> {
    character::<I>('\n').or(&character('\r').then(&character('\n')))
}

/// Skips zero or more whitespace characters.
pub fn spaces<I: Input<Token = char>>() -> Parser<I, ()> {
    whitespace::<I>().skip_many()
}

/// Skips one or more whitespace characters.
pub fn spaces1<I: Input<Token = char>>() -> Parser<I, ()> {
    whitespace::<I>().skip_many1()
}

/// Consumes a character contained in `set`.
pub fn one_of_str<I: Input<Token = char>>(set: &str) -> Parser<I, char> {
    let set = set.to_string();
    satisfy(move |c: &char| set.contains(*c))
}

/// Consumes a character not contained in `set`.
pub fn none_of_str<I: Input<Token = char>>(set: &str) -> Parser<I, char> {
    let set = set.to_string();
    satisfy(move |c: &char| !set.contains(*c))
}

fn sign<I: Input<Token = char>>() -> Parser<I, String> {
    one_of_str::<I>("+-").map(String::from).with_default(String::new())
}

fn digits<I: Input<Token = char>>() -> Parser<I, String> {
    digit::<I>().many1().collect_string()
}

fn convert<N>(text: String) -> Result<N, NumberError>
where
    N: FromStr,
    N::Err: Error + Send + Sync + 'static,
{
    text.parse::<N>().map_err(|source| NumberError {
        target: type_name::<N>(),
        text,
        source: Box::new(source),
    })
}

/// An optionally signed run of decimal digits, converted to `N`.
///
/// Fails with a [`NumberError`] cause when the digits do not fit `N`.
pub fn integer<I, N>() -> Parser<I, N>
where
    I: Input<Token = char>,
    N: FromStr + 'static,
    N::Err: Error + Send + Sync + 'static,
{
    sign::<I>().zip_with(&digits(), |sign, digits| sign + &digits).try_map(convert::<N>)
}

/// A decimal number with optional sign, fraction and exponent.
pub fn float<I, N>() -> Parser<I, N>
where
    I: Input<Token = char>,
    N: FromStr + 'static,
    N::Err: Error + Send + Sync + 'static,
{
    let fraction = character::<I>('.').then(&digits()).map(|digits| format!(".{digits}"));
    let exponent = one_of_str::<I>("eE")
        .then(&sign())
        .zip_with(&digits(), |sign, digits| format!("e{sign}{digits}"));
    sign::<I>()
        .zip_with(&digits(), |sign, digits| sign + &digits)
        .zip_with(&fraction.with_default(String::new()), |text, fraction| text + &fraction)
        .zip_with(&exponent.with_default(String::new()), |text, exponent| text + &exponent)
        .try_map(convert::<N>)
}

/// Matches a byte literal.
pub fn bytes<I: Input<Token = u8>>(literal: &[u8]) -> Parser<I, Vec<u8>> {
    sequence(literal.iter().copied().map(token::<I>))
}
