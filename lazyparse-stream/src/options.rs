use crate::encoding::Encoding;

/// Number of tokens pulled from a source per read unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Tuning knobs for streams built over forward-only sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Maximum number of tokens requested from the source per read.
    pub chunk_size: usize,
    /// Encoding used by text sources to decode bytes into characters.
    pub encoding: Encoding,
}

impl StreamOptions {
    /// Creates the default options.
    pub fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            encoding: Encoding::Utf8,
        }
    }

    /// Sets the chunk size. A size of zero is treated as one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Sets the encoding used by text readers.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StreamOptions::default();
        assert_eq!(options.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(options.encoding, Encoding::Utf8);
    }

    #[test]
    fn test_zero_chunk_size_is_clamped() {
        assert_eq!(StreamOptions::new().with_chunk_size(0).chunk_size, 1);
    }
}
