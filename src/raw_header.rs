//! Zero-copy overlays of the 512-byte tar header onto typed field layouts.
//!
//! Each struct below is a view over a contiguous byte range of the header;
//! a header is read by overlaying [`V7RawHeader`] first (the 257-byte
//! common prefix every dialect shares, plus the 8-byte magic/version pair),
//! then, once the archive's format is known, overlaying the dialect-specific
//! tail ([`CommonAdditions`] -> [`UstarAdditions`] or [`GnuAdditions`]) on
//! top of the bytes [`V7RawHeader::rest`] already holds. No byte is ever
//! copied to parse a header field; [`zerocopy`] proves at compile time that
//! every accessor here is a free reinterpretation of the underlying bytes.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::constants::BLOCK_SIZE;

/// The 257-byte common prefix, the 8-byte magic/version pair, and the
/// 247-byte dialect-specific tail of a tar header, laid out exactly as the
/// bytes appear on the wire.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct V7RawHeader {
    pub name: [u8; 100],
    pub mode: [u8; 8],
    pub uid: [u8; 8],
    pub gid: [u8; 8],
    pub size: [u8; 12],
    pub mtime: [u8; 12],
    pub checksum: [u8; 8],
    pub typeflag: u8,
    pub linkname: [u8; 100],
    pub magic: [u8; 6],
    pub version: [u8; 2],
    pub rest: [u8; 247],
}

const _: () = assert!(core::mem::size_of::<V7RawHeader>() == BLOCK_SIZE);

impl V7RawHeader {
    /// Overlays a 512-byte block as a header, without copying it.
    #[must_use]
    pub fn view(block: &[u8; BLOCK_SIZE]) -> &Self {
        Self::ref_from_bytes(block).expect("V7RawHeader matches BLOCK_SIZE exactly")
    }
}

/// The ustar/pax/GNU common tail: owner/group names and device numbers,
/// shared by every dialect beyond plain v7.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct CommonAdditions {
    pub uname: [u8; 32],
    pub gname: [u8; 32],
    pub devmajor: [u8; 8],
    pub devminor: [u8; 8],
    pub tail: [u8; 167],
}

const _: () = assert!(core::mem::size_of::<CommonAdditions>() == 247);

impl CommonAdditions {
    #[must_use]
    pub fn view(rest: &[u8; 247]) -> &Self {
        Self::ref_from_bytes(rest).expect("CommonAdditions matches the v7 tail exactly")
    }
}

/// The ustar-specific 167-byte tail: the path `prefix` field, joined with
/// `name` by `'/'` when non-empty.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct UstarAdditions {
    pub prefix: [u8; 155],
    pub padding: [u8; 12],
}

const _: () = assert!(core::mem::size_of::<UstarAdditions>() == 167);

impl UstarAdditions {
    #[must_use]
    pub fn view(tail: &[u8; 167]) -> &Self {
        Self::ref_from_bytes(tail).expect("UstarAdditions matches the common tail exactly")
    }
}

/// The GNU-specific 167-byte tail. The sparse-instruction bytes are kept
/// as opaque storage rather than interpreted: GNU sparse files are an
/// explicit Non-goal, and entries carrying them (type flag `S`, or pax
/// `GNU.sparse.*` attributes) are rejected before this layout is consulted
/// for anything but `atime`/`ctime`/`real_size` curiosity fields most GNU
/// writers also set on ordinary entries.
#[derive(FromBytes, IntoBytes, KnownLayout, Immutable, Debug)]
#[repr(C)]
pub struct GnuAdditions {
    pub atime: [u8; 12],
    pub ctime: [u8; 12],
    pub offset: [u8; 12],
    pub longnames: [u8; 4],
    pub unused: u8,
    pub sparse: [u8; 96],
    pub is_extended: u8,
    pub real_size: [u8; 12],
    pub padding: [u8; 17],
}

const _: () = assert!(core::mem::size_of::<GnuAdditions>() == 167);

impl GnuAdditions {
    #[must_use]
    pub fn view(tail: &[u8; 167]) -> &Self {
        Self::ref_from_bytes(tail).expect("GnuAdditions matches the common tail exactly")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn v7_header_overlays_257_byte_prefix() {
        let mut block = [0u8; BLOCK_SIZE];
        block[..5].copy_from_slice(b"hello");
        block[156] = b'0';
        let header = V7RawHeader::view(&block);
        assert_eq!(&header.name[..5], b"hello");
        assert_eq!(header.typeflag, b'0');
    }

    #[test]
    fn common_additions_overlays_v7_rest() {
        let mut rest = [0u8; 247];
        rest[..4].copy_from_slice(b"me\0\0");
        let common = CommonAdditions::view(&rest);
        assert_eq!(&common.uname[..2], b"me");
    }

    #[test]
    fn ustar_additions_overlays_common_tail() {
        let mut tail = [0u8; 167];
        tail[..3].copy_from_slice(b"pfx");
        let ustar = UstarAdditions::view(&tail);
        assert_eq!(&ustar.prefix[..3], b"pfx");
    }
}
