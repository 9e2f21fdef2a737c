use lazyparse_common::StreamError;
use std::fmt;

/// Text encodings understood by [`TextSource`](crate::TextSource).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    Latin1,
    Ascii,
}

impl Encoding {
    /// The conventional name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Encoding::Utf8 => "UTF-8",
            Encoding::Utf16Le => "UTF-16LE",
            Encoding::Utf16Be => "UTF-16BE",
            Encoding::Latin1 => "ISO-8859-1",
            Encoding::Ascii => "US-ASCII",
        }
    }

    /// Creates a fresh incremental decoder.
    pub fn decoder(self) -> Decoder {
        Decoder::new(self)
    }

    fn has_byte_order_mark(&self) -> bool {
        matches!(self, Encoding::Utf8 | Encoding::Utf16Le | Encoding::Utf16Be)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Incremental byte-to-char decoder.
///
/// Multi-byte sequences may be split across calls to [`Decoder::decode`]; the
/// incomplete tail is kept until the following call supplies the rest. A
/// leading byte order mark is dropped.
#[derive(Debug, Clone)]
pub struct Decoder {
    encoding: Encoding,
    pending: Vec<u8>,
    /// Offset of `pending[0]` in the whole input.
    offset: u64,
    started: bool,
}

impl Decoder {
    /// Creates a decoder at the start of the input.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            pending: Vec::new(),
            offset: 0,
            started: false,
        }
    }

    /// The encoding being decoded.
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Decodes `bytes`, appending the characters to `out`.
    ///
    /// With `last` set, a leftover partial sequence is reported as an error.
    pub fn decode(&mut self, bytes: &[u8], out: &mut Vec<char>, last: bool) -> Result<(), StreamError> {
        self.pending.extend_from_slice(bytes);
        let start = out.len();
        let consumed = match self.encoding {
            Encoding::Utf8 => self.decode_utf8(out)?,
            Encoding::Utf16Le => self.decode_utf16(out, u16::from_le_bytes)?,
            Encoding::Utf16Be => self.decode_utf16(out, u16::from_be_bytes)?,
            Encoding::Latin1 => {
                out.extend(self.pending.iter().map(|&byte| char::from(byte)));
                self.pending.len()
            }
            Encoding::Ascii => {
                if let Some(bad) = self.pending.iter().position(|byte| !byte.is_ascii()) {
                    return Err(self.error_at(bad));
                }
                out.extend(self.pending.iter().map(|&byte| char::from(byte)));
                self.pending.len()
            }
        };
        self.pending.drain(..consumed);
        self.offset += consumed as u64;

        if !self.started && out.len() > start {
            self.started = true;
            if self.encoding.has_byte_order_mark() && out[start] == '\u{feff}' {
                out.remove(start);
            }
        }

        if last && !self.pending.is_empty() {
            return Err(self.error_at(0));
        }
        Ok(())
    }

    fn decode_utf8(&self, out: &mut Vec<char>) -> Result<usize, StreamError> {
        match std::str::from_utf8(&self.pending) {
            Ok(text) => {
                out.extend(text.chars());
                Ok(self.pending.len())
            }
            Err(err) => {
                let valid = err.valid_up_to();
                let text =
                    std::str::from_utf8(&self.pending[..valid]).map_err(|_| self.error_at(0))?;
                out.extend(text.chars());
                match err.error_len() {
                    Some(_) => Err(self.error_at(valid)),
                    // Incomplete sequence at the end: wait for more bytes.
                    None => Ok(valid),
                }
            }
        }
    }

    fn decode_utf16(&self, out: &mut Vec<char>, read: fn([u8; 2]) -> u16) -> Result<usize, StreamError> {
        let units: Vec<u16> = self
            .pending
            .chunks_exact(2)
            .map(|pair| read([pair[0], pair[1]]))
            .collect();

        let mut index = 0;
        while index < units.len() {
            let unit = units[index];
            if (0xD800..0xDC00).contains(&unit) {
                match units.get(index + 1) {
                    None => break,
                    Some(&low) if (0xDC00..0xE000).contains(&low) => {
                        let code = 0x10000 + ((u32::from(unit) - 0xD800) << 10) + (u32::from(low) - 0xDC00);
                        let ch = char::from_u32(code).ok_or_else(|| self.error_at(index * 2))?;
                        out.push(ch);
                        index += 2;
                    }
                    Some(_) => return Err(self.error_at(index * 2)),
                }
            } else {
                let ch = char::from_u32(u32::from(unit)).ok_or_else(|| self.error_at(index * 2))?;
                out.push(ch);
                index += 1;
            }
        }
        Ok(index * 2)
    }

    fn error_at(&self, at: usize) -> StreamError {
        StreamError::Decode {
            encoding: self.encoding.name(),
            offset: self.offset + at as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(encoding: Encoding, parts: &[&[u8]]) -> Result<String, StreamError> {
        let mut decoder = encoding.decoder();
        let mut out = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            decoder.decode(part, &mut out, i + 1 == parts.len())?;
        }
        Ok(out.into_iter().collect())
    }

    #[test]
    fn test_utf8_split_sequence() {
        let bytes = "héllo".as_bytes();
        let text = decode_all(Encoding::Utf8, &[&bytes[..2], &bytes[2..]]).unwrap();
        assert_eq!(text, "héllo");
    }

    #[test]
    fn test_utf8_bom_is_dropped() {
        let text = decode_all(Encoding::Utf8, &[&[0xEF, 0xBB], &[0xBF, b'a']]).unwrap();
        assert_eq!(text, "a");
    }

    #[test]
    fn test_utf8_invalid_byte_reports_offset() {
        let err = decode_all(Encoding::Utf8, &[b"ab", &[0xFF, b'c']]).unwrap_err();
        match err {
            StreamError::Decode { offset, encoding } => {
                assert_eq!(offset, 2);
                assert_eq!(encoding, "UTF-8");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_utf8_truncated_input_is_an_error() {
        assert!(decode_all(Encoding::Utf8, &[&[b'a', 0xE4, 0xBD]]).is_err());
    }

    #[test]
    fn test_utf16_surrogate_pair_split() {
        let units: Vec<u8> = "a😀".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let text = decode_all(Encoding::Utf16Le, &[&units[..3], &units[3..]]).unwrap();
        assert_eq!(text, "a😀");
    }

    #[test]
    fn test_utf16_big_endian() {
        let units: Vec<u8> = "ok".encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        assert_eq!(decode_all(Encoding::Utf16Be, &[&units]).unwrap(), "ok");
    }

    #[test]
    fn test_latin1_and_ascii() {
        assert_eq!(decode_all(Encoding::Latin1, &[&[0x63, 0xE9]]).unwrap(), "cé");
        assert!(decode_all(Encoding::Ascii, &[&[0x63, 0xE9]]).is_err());
    }
}
