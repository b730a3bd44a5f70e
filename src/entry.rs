//! The logical entry a caller sees: one per real file/directory/link/device
//! the archive describes, with GNU long-name and pax extended-attribute
//! meta-entries already folded in by the time it is handed out.

use std::collections::HashMap;

use relative_path::RelativePathBuf;

use crate::codec::Timestamp;
use crate::constants::{EntryType, Format};
use crate::substream::EntryData;

/// `key -> value` pax attributes that applied to this entry, after local
/// (`x`) overrides have been layered on top of persistent global (`g`)
/// attributes.
pub type ExtendedAttributes = HashMap<String, String>;

/// One logical entry: a header's fields plus, for file-like types, a
/// lazily-read data substream.
pub struct Entry<R> {
    pub entry_type: EntryType,
    pub name: RelativePathBuf,
    pub link_name: RelativePathBuf,
    pub mode: u32,
    pub uid: u64,
    pub gid: u64,
    pub uname: String,
    pub gname: String,
    pub size: u64,
    pub mtime: Timestamp,
    pub checksum: u64,
    pub format: Format,
    pub atime: Option<Timestamp>,
    pub ctime: Option<Timestamp>,
    pub dev_major: Option<u32>,
    pub dev_minor: Option<u32>,
    pub extended_attributes: ExtendedAttributes,
    data: Option<EntryData<R>>,
}

impl<R> Entry<R> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry_type: EntryType,
        name: RelativePathBuf,
        link_name: RelativePathBuf,
        mode: u32,
        uid: u64,
        gid: u64,
        uname: String,
        gname: String,
        size: u64,
        mtime: Timestamp,
        checksum: u64,
        format: Format,
        atime: Option<Timestamp>,
        ctime: Option<Timestamp>,
        dev_major: Option<u32>,
        dev_minor: Option<u32>,
        extended_attributes: ExtendedAttributes,
        data: Option<EntryData<R>>,
    ) -> Self {
        Self {
            entry_type,
            name,
            link_name,
            mode,
            uid,
            gid,
            uname,
            gname,
            size,
            mtime,
            checksum,
            format,
            atime,
            ctime,
            dev_major,
            dev_minor,
            extended_attributes,
            data,
        }
    }

    /// Whether this entry carries a data substream at all (directories,
    /// links, and devices never do).
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }

    /// Borrows this entry's data substream, if it has one.
    pub fn data_mut(&mut self) -> Option<&mut EntryData<R>> {
        self.data.as_mut()
    }

    /// Consumes the entry and returns its data substream, if it has one.
    pub fn into_data(self) -> Option<EntryData<R>> {
        self.data
    }
}
