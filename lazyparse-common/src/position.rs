use std::fmt;

/// A coordinate that advances as tokens are consumed.
///
/// Positions only ever move forward. Combinators compare them to find out
/// whether a parser consumed any input, so two states at the same place in a
/// stream must report equal positions.
pub trait Position<T>: Clone + Ord + fmt::Debug + fmt::Display + 'static {
    /// The position of the first token of an input.
    fn start() -> Self;

    /// Returns the position that follows `token`.
    fn advance(&self, token: &T) -> Self;
}

/// A flat token index, used for streams whose tokens are not text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinearPosition(pub usize);

impl LinearPosition {
    /// Returns the zero-based index of the token at this position.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl<T> Position<T> for LinearPosition {
    fn start() -> Self {
        Self(0)
    }

    fn advance(&self, _token: &T) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for LinearPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Index: {}", self.0)
    }
}

/// Represents a line/column position in source text.
///
/// The column resets to 1 and the line increments after a newline token;
/// any other token increments the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TextPosition {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Offset from the start of the input, in bytes
    pub offset: usize,
}

impl TextPosition {
    /// Creates a new position at the start of the input.
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Creates a position with the given values.
    pub fn at(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }

    fn step(&self, newline: bool, width: usize) -> Self {
        if newline {
            Self::at(self.line + 1, 1, self.offset + width)
        } else {
            Self::at(self.line, self.column + 1, self.offset + width)
        }
    }
}

impl Default for TextPosition {
    fn default() -> Self {
        Self::new()
    }
}

impl Position<char> for TextPosition {
    fn start() -> Self {
        Self::new()
    }

    fn advance(&self, token: &char) -> Self {
        self.step(*token == '\n', token.len_utf8())
    }
}

impl Position<u8> for TextPosition {
    fn start() -> Self {
        Self::new()
    }

    fn advance(&self, token: &u8) -> Self {
        self.step(*token == b'\n', 1)
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line: {}, Column: {}", self.line, self.column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_new() {
        let pos = TextPosition::new();
        assert_eq!(pos.line, 1);
        assert_eq!(pos.column, 1);
        assert_eq!(pos.offset, 0);
    }

    #[test]
    fn test_position_default() {
        assert_eq!(TextPosition::default(), TextPosition::new());
        assert_eq!(<LinearPosition as Position<char>>::start(), LinearPosition(0));
    }

    #[test]
    fn test_text_position_advance() {
        let pos = <TextPosition as Position<char>>::start();
        let pos = pos.advance(&'a');
        assert_eq!(pos, TextPosition::at(1, 2, 1));
        let pos = pos.advance(&'\n');
        assert_eq!(pos, TextPosition::at(2, 1, 2));
        let pos = pos.advance(&'é');
        assert_eq!(pos, TextPosition::at(2, 2, 4));
    }

    #[test]
    fn test_byte_position_advance() {
        let pos = <TextPosition as Position<u8>>::start();
        let pos = pos.advance(&b'\n').advance(&b'x');
        assert_eq!(pos, TextPosition::at(2, 2, 2));
    }

    #[test]
    fn test_ordering() {
        assert!(TextPosition::at(1, 5, 4) < TextPosition::at(2, 1, 5));
        assert!(LinearPosition(3) > LinearPosition(2));
    }

    #[test]
    fn test_display() {
        assert_eq!(TextPosition::at(3, 7, 20).to_string(), "Line: 3, Column: 7");
        assert_eq!(LinearPosition(12).to_string(), "Index: 12");
    }
}
