//! The pax extended-attribute record grammar: `"<len> <key>=<value>\n"`,
//! repeated back to back inside an `x`/`g` entry's data block.
//!
//! Unlike the teacher's incremental push-based parser, this decoder reads
//! the whole pax data block into memory before parsing it (the archive
//! facade already needs the entry's exact size up front), so the grammar
//! is parsed with a single forward scan rather than a byte-at-a-time state
//! machine.

use std::collections::HashMap;

/// Well-known pax keys, named exactly as `pax_parser.rs`'s
/// `pax_keys_well_known` module names them.
pub mod well_known_keys {
    pub const PATH: &str = "path";
    pub const LINKPATH: &str = "linkpath";
    pub const SIZE: &str = "size";
    pub const UID: &str = "uid";
    pub const GID: &str = "gid";
    pub const UNAME: &str = "uname";
    pub const GNAME: &str = "gname";
    pub const MTIME: &str = "mtime";
    pub const ATIME: &str = "atime";
    pub const CTIME: &str = "ctime";
    pub const CHARSET: &str = "charset";
    pub const COMMENT: &str = "comment";
    pub const HDRCHARSET: &str = "hdrcharset";
}

#[derive(Debug, thiserror::Error)]
pub enum PaxError {
    #[error("pax record length prefix is not a decimal number")]
    BadLength,
    #[error("pax record length {declared} does not fit the {remaining} bytes remaining")]
    LengthOutOfRange { declared: usize, remaining: usize },
    #[error("pax record is missing its '=' separator")]
    MissingEquals,
    #[error("pax record does not end with the newline its length prescribes")]
    MissingNewline,
    #[error("pax record is not valid UTF-8")]
    NotUtf8,
}

/// Parses every `"<len> <key>=<value>\n"` record in `data`, in order,
/// returning them as a map. A key repeated within the same block keeps its
/// last occurrence, matching GNU tar's own pax parser.
pub fn parse_records(data: &[u8]) -> Result<HashMap<String, String>, PaxError> {
    let mut attrs = HashMap::new();
    let mut rest = data;
    while !rest.is_empty() {
        let (key, value, tail) = parse_one_record(rest)?;
        attrs.insert(key, value);
        rest = tail;
    }
    Ok(attrs)
}

/// Parses a single leading record off `data`, returning the decoded
/// `(key, value)` pair and the remaining, unparsed bytes.
fn parse_one_record(data: &[u8]) -> Result<(String, String, &[u8]), PaxError> {
    let space_at = data
        .iter()
        .position(|&b| b == b' ')
        .ok_or(PaxError::BadLength)?;
    let declared_len: usize = std::str::from_utf8(&data[..space_at])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(PaxError::BadLength)?;
    if declared_len == 0 || declared_len > data.len() {
        return Err(PaxError::LengthOutOfRange {
            declared: declared_len,
            remaining: data.len(),
        });
    }
    let record = &data[..declared_len];
    let rest = &data[declared_len..];

    let kv = &record[space_at + 1..];
    let Some(last) = kv.last().copied() else {
        return Err(PaxError::MissingNewline);
    };
    if last != b'\n' {
        return Err(PaxError::MissingNewline);
    }
    let kv = &kv[..kv.len() - 1];

    let eq_at = kv
        .iter()
        .position(|&b| b == b'=')
        .ok_or(PaxError::MissingEquals)?;
    let key = std::str::from_utf8(&kv[..eq_at]).map_err(|_| PaxError::NotUtf8)?;
    let value = std::str::from_utf8(&kv[eq_at + 1..]).map_err(|_| PaxError::NotUtf8)?;
    Ok((key.to_string(), value.to_string(), rest))
}
