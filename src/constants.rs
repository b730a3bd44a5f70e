//! Wire-format constants and the type tags that drive header dispatch.

/// Every tar header and data block is aligned to this size.
pub const BLOCK_SIZE: usize = 512;

/// All-zero 512-byte block, used to detect and construct the end-of-archive
/// marker (two consecutive zero blocks).
pub const ZERO_BLOCK: [u8; BLOCK_SIZE] = [0u8; BLOCK_SIZE];

/// `ustar\0`, the magic for ustar and pax headers.
pub const USTAR_MAGIC: &[u8; 6] = b"ustar\0";
/// `00`, the version field that follows [`USTAR_MAGIC`].
pub const USTAR_VERSION: &[u8; 2] = b"00";
/// `ustar `, the magic for GNU headers.
pub const GNU_MAGIC: &[u8; 6] = b"ustar ";
/// ` \0`, the version field that follows [`GNU_MAGIC`].
pub const GNU_VERSION: &[u8; 2] = b" \0";

/// The header dialect used to lay out the bytes following the common
/// 257-byte prefix. Sticky for the whole archive once promoted beyond
/// [`Format::Unknown`]: `spec.md` treats format as an archive-wide property,
/// not something re-derived from scratch for every header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// No header has been seen yet.
    #[default]
    Unknown,
    /// Pre-POSIX header with no magic bytes.
    V7,
    /// POSIX ustar header (`ustar\0`, version `00`).
    Ustar,
    /// ustar header carrying pax extended attributes.
    Pax,
    /// GNU header (`ustar `, version ` \0`).
    Gnu,
}

/// The on-wire type-flag byte, decoded into its recognized meanings.
///
/// `M`, `N`, `S`, and `V` are recognized but rejected outright: GNU sparse
/// files (`S`), multi-volume continuation (`M`), tape-volume labels (`V`),
/// and the old rename/symlink-with-payload extension (`N`) are explicit
/// Non-goals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// `'0'` or `'\0'`: a regular file.
    Regular,
    /// `'1'`: a hard link; `link_name` names the target.
    HardLink,
    /// `'2'`: a symbolic link; `link_name` names the target.
    SymbolicLink,
    /// `'3'`: a character device.
    CharacterDevice,
    /// `'4'`: a block device.
    BlockDevice,
    /// `'5'`: a directory.
    Directory,
    /// `'6'`: a FIFO.
    Fifo,
    /// `'7'`: a contiguous file, treated identically to a regular file.
    Contiguous,
    /// `'D'`: a GNU dump-directory entry. Surfaces as its own logical entry
    /// (it is not folded into a successor the way `K`/`L`/`x`/`g` are), but
    /// carries no data substream — its payload bytes are discarded like any
    /// other non-regular type.
    GnuDumpDir,
    /// `'x'`: a pax extended header applying to the next entry only.
    PaxLocal,
    /// `'g'`: a pax extended header applying to all following entries.
    PaxGlobal,
    /// `'L'`: a GNU long-path meta-entry.
    GnuLongPath,
    /// `'K'`: a GNU long-link meta-entry.
    GnuLongLink,
    /// `'M'`: GNU multi-volume continuation. Rejected.
    GnuMultiVolume,
    /// `'N'`: old GNU rename-with-payload extension. Rejected.
    GnuRename,
    /// `'S'`: GNU sparse file. Rejected.
    GnuSparse,
    /// `'V'`: tape/volume label. Rejected.
    VolumeLabel,
    /// Any other byte value.
    Unknown(u8),
}

impl EntryType {
    /// Classifies a raw type-flag byte.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            b'0' | 0 => Self::Regular,
            b'1' => Self::HardLink,
            b'2' => Self::SymbolicLink,
            b'3' => Self::CharacterDevice,
            b'4' => Self::BlockDevice,
            b'5' => Self::Directory,
            b'6' => Self::Fifo,
            b'7' => Self::Contiguous,
            b'D' => Self::GnuDumpDir,
            b'x' => Self::PaxLocal,
            b'g' => Self::PaxGlobal,
            b'L' => Self::GnuLongPath,
            b'K' => Self::GnuLongLink,
            b'M' => Self::GnuMultiVolume,
            b'N' => Self::GnuRename,
            b'S' => Self::GnuSparse,
            b'V' => Self::VolumeLabel,
            other => Self::Unknown(other),
        }
    }

    /// Whether this type flag is rejected outright as an explicit
    /// Non-goal, regardless of how well-formed its header otherwise is.
    #[must_use]
    pub fn is_rejected(self) -> bool {
        matches!(
            self,
            Self::GnuMultiVolume | Self::GnuRename | Self::GnuSparse | Self::VolumeLabel
        )
    }

    /// Whether this type flag introduces a pax extended-attribute block
    /// (`x` or `g`) rather than a real entry.
    #[must_use]
    pub fn is_pax_meta(self) -> bool {
        matches!(self, Self::PaxLocal | Self::PaxGlobal)
    }

    /// Whether this type flag introduces a GNU long-name meta-entry (`K`
    /// or `L`) rather than a real entry.
    #[must_use]
    pub fn is_gnu_long_meta(self) -> bool {
        matches!(self, Self::GnuLongPath | Self::GnuLongLink)
    }

    /// Whether a real entry of this type carries a data substream.
    /// Only regular and contiguous files do; directories, links, devices,
    /// and GNU dump-directory entries have their payload bytes (if any)
    /// discarded instead.
    #[must_use]
    pub fn has_data(self) -> bool {
        matches!(self, Self::Regular | Self::Contiguous)
    }
}
