use crate::constants::EntryType;

/// Every way decoding a tar archive can fail.
///
/// The decoder is fail-fast: the first error encountered is returned to the
/// caller immediately, there is no pluggable strict/lenient policy.
#[derive(Debug, thiserror::Error)]
pub enum TarError {
    /// The stream ended before a fixed-size field or block could be read in
    /// full.
    #[error("unexpected end of stream while reading {field}")]
    UnexpectedEnd {
        /// Name of the field or block being read.
        field: &'static str,
    },

    /// A field's bytes do not form a value valid for that field (bad octal
    /// digits, a string that is not null/space-terminated where required,
    /// an unrecognized magic string, and so on).
    #[error("malformed {field}: {reason}")]
    Malformed {
        /// Name of the field that failed to decode.
        field: &'static str,
        /// Human-readable reason.
        reason: String,
    },

    /// The entry's type flag is recognized but explicitly unsupported:
    /// GNU sparse files, multi-volume continuation entries, tape-volume
    /// labels, and rename/symlink-type GNU extensions.
    #[error("unsupported entry type {0:?}")]
    Unsupported(EntryType),

    /// The header's stored checksum does not match the checksum computed
    /// over the header bytes.
    #[error("header checksum mismatch: header says {expected}, computed {actual}")]
    ChecksumMismatch {
        /// Checksum value decoded from the header.
        expected: u64,
        /// Checksum computed by summing the header bytes.
        actual: u64,
    },

    /// The archive was opened with a mode other than [`crate::options::Mode::Read`].
    #[error("archive was not opened in read mode")]
    InvalidMode,

    /// An operation was attempted on an archive or entry after
    /// [`crate::archive::Archive::dispose`] released its underlying stream.
    #[error("archive has already been disposed")]
    UseAfterFree,

    /// A seek landed outside an entry's data window.
    #[error("seek position out of range for this entry's data window")]
    OutOfRange,

    /// Propagated from the underlying byte source.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TarError {
    pub(crate) fn unexpected_end(field: &'static str) -> Self {
        Self::UnexpectedEnd { field }
    }

    pub(crate) fn malformed(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            reason: reason.into(),
        }
    }
}

/// Converts a [`TarError`] into an [`std::io::Error`], for substreams whose
/// `Read`/`Seek` implementations must report failures through `io::Result`.
impl From<TarError> for std::io::Error {
    fn from(err: TarError) -> Self {
        match err {
            TarError::Io(io_err) => io_err,
            other => std::io::Error::new(std::io::ErrorKind::InvalidData, other),
        }
    }
}
