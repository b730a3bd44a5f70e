//! Field-level decoding of the raw bytes inside a tar header: trimmed
//! strings, octal-ASCII integers, and unix timestamps.

/// A decoded point in time, with optional sub-second resolution as carried
/// by pax `atime`/`ctime`/`mtime` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Timestamp {
    /// Whole seconds since the unix epoch.
    pub seconds: i64,
    /// Nanoseconds within the second, `0..1_000_000_000`.
    pub nanoseconds: u32,
}

impl Timestamp {
    /// A timestamp with no fractional part.
    #[must_use]
    pub fn from_seconds(seconds: i64) -> Self {
        Self {
            seconds,
            nanoseconds: 0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("field is not valid UTF-8")]
    NotUtf8,
    #[error("field contains a byte other than an octal digit, space, or NUL")]
    BadOctalDigit,
    #[error("field overflows a 64-bit integer")]
    Overflow,
}

/// Finds the first NUL byte in `field`, or `field.len()` if there is none.
#[must_use]
pub fn null_terminator_index(field: &[u8]) -> usize {
    field.iter().position(|&b| b == 0).unwrap_or(field.len())
}

/// Decodes a fixed-width tar string field: bytes up to the first NUL (or
/// the whole field if there is none), trimmed of trailing ASCII spaces,
/// then interpreted as UTF-8.
pub fn parse_string_field(field: &[u8]) -> Result<String, CodecError> {
    let end = null_terminator_index(field);
    let trimmed = trim_trailing_spaces(&field[..end]);
    String::from_utf8(trimmed.to_vec()).map_err(|_| CodecError::NotUtf8)
}

fn trim_trailing_spaces(bytes: &[u8]) -> &[u8] {
    let end = bytes
        .iter()
        .rposition(|&b| b != b' ')
        .map_or(0, |pos| pos + 1);
    &bytes[..end]
}

/// Decodes a fixed-width octal-ASCII numeric field (the classic tar
/// encoding for mode/uid/gid/size/mtime/checksum). Accepts a field that is
/// entirely NUL or space as zero. Stops at the first NUL or space and
/// ignores a single trailing NUL/space terminator, matching GNU tar's own
/// leniency.
pub fn parse_octal(field: &[u8]) -> Result<u64, CodecError> {
    let mut value: u64 = 0;
    let mut saw_digit = false;
    for &byte in field {
        match byte {
            b'0'..=b'7' => {
                saw_digit = true;
                value = value
                    .checked_mul(8)
                    .and_then(|v| v.checked_add(u64::from(byte - b'0')))
                    .ok_or(CodecError::Overflow)?;
            }
            b' ' | 0 => {
                if saw_digit {
                    break;
                }
            }
            _ => return Err(CodecError::BadOctalDigit),
        }
    }
    Ok(value)
}

/// Decodes a mode/uid/gid/size/mtime field, supporting GNU's base-256
/// extension: when the first byte has its high bit set, the remaining
/// bytes (including the low 7 bits of the first byte) form a big-endian
/// binary integer instead of octal ASCII.
pub fn parse_numeric(field: &[u8]) -> Result<u64, CodecError> {
    if let Some((&first, _)) = field.split_first() {
        if first & 0x80 != 0 {
            let mut value: u64 = u64::from(first & 0x7f);
            for &byte in &field[1..] {
                value = value
                    .checked_shl(8)
                    .and_then(|v| v.checked_add(u64::from(byte)))
                    .ok_or(CodecError::Overflow)?;
            }
            return Ok(value);
        }
    }
    parse_octal(field)
}

/// Whether every byte in `block` is zero.
#[must_use]
pub fn is_all_zero(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Rounds `size` up to the next multiple of the 512-byte block size.
#[must_use]
pub fn padded_size(size: u64) -> u64 {
    (size + 511) / 512 * 512
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_string() {
        let mut field = [0u8; 16];
        field[..5].copy_from_slice(b"hello");
        assert_eq!(parse_string_field(&field).unwrap(), "hello");
    }

    #[test]
    fn parses_space_padded_string() {
        let field = b"hello           ";
        assert_eq!(parse_string_field(field).unwrap(), "hello");
    }

    #[test]
    fn parses_octal_field() {
        assert_eq!(parse_octal(b"0000644\0").unwrap(), 0o644);
        assert_eq!(parse_octal(b"       \0").unwrap(), 0);
    }

    #[test]
    fn rejects_bad_octal_digit() {
        assert!(parse_octal(b"0000899\0").is_err());
    }

    #[test]
    fn base256_extension_decodes_large_size() {
        let mut field = [0u8; 12];
        field[0] = 0x80;
        field[11] = 0xff;
        assert_eq!(parse_numeric(&field).unwrap(), 0xff);
    }

    #[test]
    fn padded_size_rounds_up() {
        assert_eq!(padded_size(0), 0);
        assert_eq!(padded_size(1), 512);
        assert_eq!(padded_size(512), 512);
        assert_eq!(padded_size(513), 1024);
    }

    #[test]
    fn detects_all_zero_block() {
        assert!(is_all_zero(&[0u8; 512]));
        let mut block = [0u8; 512];
        block[511] = 1;
        assert!(!is_all_zero(&block));
    }
}
