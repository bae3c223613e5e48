// Wire codec - primitive values on the helper pipes
//
// Every value is plain text followed by a single space, and every decoder
// consumes that space along with its value. Strings carry their UTF-8 byte
// length up front and are read by count, so they may contain any byte (NUL,
// spaces, newlines) without escaping. Nothing on the wire says which
// kind comes next: both ends must agree on each command's argument list.

use super::error::ProtocolError;
use std::io::{self, BufRead, Write};

/// Field separator written after every value.
pub const SEPARATOR: u8 = b' ';

/// Largest string the decoder accepts before assuming the stream is garbage.
pub const MAX_STRING_LEN: usize = 64 * 1024 * 1024;

/// Largest string-list count the decoder accepts.
pub const MAX_LIST_LEN: usize = 1 << 20;

/// Longest numeric token; anything longer cannot be a valid integer.
const MAX_TOKEN_LEN: usize = 24;

/// A value that can be written to and read back from the wire.
pub trait WireValue: Sized {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()>;
    fn decode<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self, ProtocolError>;
}

/// Skip ASCII whitespace, then collect bytes up to the next whitespace.
///
/// Returns `Ok(None)` when the stream ends before any token byte is seen, which
/// lets command readers tell a clean shutdown apart from a truncated value.
pub(crate) fn read_token<R: BufRead + ?Sized>(
    reader: &mut R,
) -> Result<Option<String>, ProtocolError> {
    let mut token = Vec::new();

    loop {
        let (consumed, done) = {
            let buf = reader.fill_buf()?;
            if buf.is_empty() {
                // EOF: either nothing was read yet, or the token ended with the stream
                break;
            }

            let mut consumed = 0;
            let mut done = false;
            for &byte in buf {
                if byte.is_ascii_whitespace() {
                    if token.is_empty() {
                        consumed += 1;
                        continue;
                    }
                    // The separator is the caller's to consume
                    done = true;
                    break;
                }
                token.push(byte);
                consumed += 1;
                if token.len() > MAX_TOKEN_LEN {
                    return Err(ProtocolError::Desync(format!(
                        "numeric token longer than {} bytes",
                        MAX_TOKEN_LEN
                    )));
                }
            }
            (consumed, done)
        };

        reader.consume(consumed);
        if done {
            break;
        }
    }

    if token.is_empty() {
        return Ok(None);
    }

    String::from_utf8(token)
        .map(Some)
        .map_err(|_| ProtocolError::Desync("non-ASCII numeric token".to_string()))
}

fn expect_token<R: BufRead + ?Sized>(reader: &mut R, kind: &str) -> Result<String, ProtocolError> {
    read_token(reader)?.ok_or_else(|| {
        ProtocolError::Transport(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("stream closed while reading {}", kind),
        ))
    })
}

pub(crate) fn consume_separator<R: BufRead + ?Sized>(reader: &mut R) -> Result<(), ProtocolError> {
    let mut byte = [0u8; 1];
    reader.read_exact(&mut byte)?;
    if !byte[0].is_ascii_whitespace() {
        return Err(ProtocolError::Desync(format!(
            "expected separator, found byte {:#04x}",
            byte[0]
        )));
    }
    Ok(())
}

macro_rules! impl_wire_integer {
    ($($ty:ty),*) => {
        $(
            impl WireValue for $ty {
                fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
                    write!(writer, "{}", self)?;
                    writer.write_all(&[SEPARATOR])
                }

                fn decode<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self, ProtocolError> {
                    let token = expect_token(reader, stringify!($ty))?;
                    let value = token.parse::<$ty>().map_err(|_| {
                        ProtocolError::Desync(format!(
                            "expected {}, found {:?}",
                            stringify!($ty),
                            token
                        ))
                    })?;
                    consume_separator(reader)?;
                    Ok(value)
                }
            }
        )*
    };
}

impl_wire_integer!(i16, u16, u32, u64);

impl WireValue for bool {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(if *self { b"1 " } else { b"0 " })
    }

    fn decode<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self, ProtocolError> {
        let value = match expect_token(reader, "bool")?.as_str() {
            "0" => false,
            "1" => true,
            other => {
                return Err(ProtocolError::Desync(format!(
                    "expected bool, found {:?}",
                    other
                )));
            }
        };
        consume_separator(reader)?;
        Ok(value)
    }
}

impl WireValue for String {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        let bytes = self.as_bytes();
        write!(writer, "{}", bytes.len())?;
        writer.write_all(&[SEPARATOR])?;
        writer.write_all(bytes)?;
        writer.write_all(&[SEPARATOR])
    }

    fn decode<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self, ProtocolError> {
        let len = u32::decode(reader)? as usize;
        if len > MAX_STRING_LEN {
            return Err(ProtocolError::Desync(format!(
                "string length {} exceeds limit",
                len
            )));
        }

        let mut buffer = vec![0u8; len];
        reader.read_exact(&mut buffer)?;
        consume_separator(reader)?;

        String::from_utf8(buffer)
            .map_err(|e| ProtocolError::Desync(format!("string is not UTF-8: {}", e)))
    }
}

impl WireValue for Vec<String> {
    fn encode<W: Write + ?Sized>(&self, writer: &mut W) -> io::Result<()> {
        (self.len() as u32).encode(writer)?;
        for item in self {
            item.encode(writer)?;
        }
        Ok(())
    }

    fn decode<R: BufRead + ?Sized>(reader: &mut R) -> Result<Self, ProtocolError> {
        let count = u32::decode(reader)? as usize;
        if count > MAX_LIST_LEN {
            return Err(ProtocolError::Desync(format!(
                "list length {} exceeds limit",
                count
            )));
        }

        let mut items = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            items.push(String::decode(reader)?);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encoded<T: WireValue>(value: &T) -> Vec<u8> {
        let mut out = Vec::new();
        value.encode(&mut out).unwrap();
        out
    }

    #[test]
    fn test_bool_encoding() {
        assert_eq!(encoded(&true), b"1 ");
        assert_eq!(encoded(&false), b"0 ");
    }

    #[test]
    fn test_string_encoding_counts_utf8_bytes() {
        // "é" is two bytes in UTF-8
        assert_eq!(encoded(&"é!".to_string()), b"3 \xc3\xa9! ");
    }

    #[test]
    fn test_string_with_embedded_nul_and_spaces() {
        let value = "a\0b c\n".to_string();
        let bytes = encoded(&value);
        let decoded = String::decode(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_empty_list() {
        let bytes = encoded(&Vec::<String>::new());
        assert_eq!(bytes, b"0 ");
        let decoded = Vec::<String>::decode(&mut Cursor::new(bytes)).unwrap();
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_values_in_sequence() {
        let mut bytes = Vec::new();
        7i16.encode(&mut bytes).unwrap();
        "x y".to_string().encode(&mut bytes).unwrap();
        true.encode(&mut bytes).unwrap();

        let mut reader = Cursor::new(bytes);
        assert_eq!(i16::decode(&mut reader).unwrap(), 7);
        assert_eq!(String::decode(&mut reader).unwrap(), "x y");
        assert!(bool::decode(&mut reader).unwrap());
    }

    #[test]
    fn test_truncated_string_is_transport_error() {
        let mut reader = Cursor::new(b"10 abc".to_vec());
        let err = String::decode(&mut reader).unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)), "got {:?}", err);
    }

    #[test]
    fn test_empty_stream_is_transport_error() {
        let mut reader = Cursor::new(Vec::new());
        let err = bool::decode(&mut reader).unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)));
    }

    #[test]
    fn test_invalid_bool_is_desync() {
        let mut reader = Cursor::new(b"2 ".to_vec());
        let err = bool::decode(&mut reader).unwrap_err();
        assert!(matches!(err, ProtocolError::Desync(_)));
    }

    #[test]
    fn test_non_numeric_length_is_desync() {
        let mut reader = Cursor::new(b"abc def".to_vec());
        let err = String::decode(&mut reader).unwrap_err();
        assert!(matches!(err, ProtocolError::Desync(_)));
    }

    #[test]
    fn test_oversized_string_is_rejected() {
        let header = format!("{} ", MAX_STRING_LEN + 1);
        let mut reader = Cursor::new(header.into_bytes());
        let err = String::decode(&mut reader).unwrap_err();
        assert!(matches!(err, ProtocolError::Desync(_)));
    }

    #[test]
    fn test_leading_whitespace_is_skipped() {
        let mut reader = Cursor::new(b"  \n 42 ".to_vec());
        assert_eq!(u64::decode(&mut reader).unwrap(), 42);
    }

    #[test]
    fn test_each_value_consumes_its_separator() {
        let mut bytes = encoded(&"Text".to_string());
        true.encode(&mut bytes).unwrap();
        300u16.encode(&mut bytes).unwrap();
        vec!["a".to_string(), String::new()].encode(&mut bytes).unwrap();
        let len = bytes.len();

        let mut reader = Cursor::new(bytes);
        assert_eq!(String::decode(&mut reader).unwrap(), "Text");
        assert_eq!(reader.position(), 7);
        assert!(bool::decode(&mut reader).unwrap());
        assert_eq!(reader.position(), 9);
        assert_eq!(u16::decode(&mut reader).unwrap(), 300);
        assert_eq!(
            Vec::<String>::decode(&mut reader).unwrap(),
            vec!["a".to_string(), String::new()]
        );
        assert_eq!(reader.position() as usize, len);
    }

    #[test]
    fn test_missing_trailing_separator_is_transport_error() {
        let mut reader = Cursor::new(b"4 Text".to_vec());
        let err = String::decode(&mut reader).unwrap_err();
        assert!(matches!(err, ProtocolError::Transport(_)), "got {:?}", err);
    }

    #[test]
    fn test_read_token_reports_clean_eof() {
        let mut reader = Cursor::new(b"   ".to_vec());
        assert!(read_token(&mut reader).unwrap().is_none());
    }
}
