//! The archive facade (component F) and entry iterator (component E): opens
//! a byte source, walks its headers one at a time, and folds pax `x`/`g`
//! and GNU `K`/`L` meta-entries into the next real entry before handing it
//! to the caller.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Read, SeekFrom};
use std::rc::Rc;

use relative_path::RelativePathBuf;

use crate::codec::{self, Timestamp};
use crate::constants::Format;
use crate::entry::Entry;
use crate::error::TarError;
use crate::header_parser::{self, MetaStep, ParseStep, RawEntry};
use crate::options::{ArchiveOptions, Mode};
use crate::pax::well_known_keys;
use crate::source::TarSource;
use crate::substream::{EntryData, SeekableWindow};

/// A read-only tar archive.
///
/// Holds the underlying stream behind `Rc<RefCell<_>>` so that entries
/// handed out by [`Archive::next_entry`] own their data windows outright —
/// they never borrow from the `Archive` that produced them, which is what
/// lets `Archive` implement [`Iterator`] directly instead of a
/// lifetime-bound streaming iterator.
pub struct Archive<R> {
    source: Rc<RefCell<R>>,
    leave_open: bool,
    disposed: bool,
    format: Format,
    verify_checksum: bool,
    global_attrs: HashMap<String, String>,
    next_header_offset: u64,
}

impl<R: TarSource> Archive<R> {
    /// Opens `source` for reading. Fails only if `options.mode` is
    /// anything other than [`Mode::Read`].
    pub fn open(source: R, options: ArchiveOptions) -> Result<Self, TarError> {
        if options.mode != Mode::Read {
            return Err(TarError::InvalidMode);
        }
        Ok(Self {
            source: Rc::new(RefCell::new(source)),
            leave_open: options.leave_open,
            disposed: false,
            format: Format::Unknown,
            verify_checksum: true,
            global_attrs: HashMap::new(),
            next_header_offset: 0,
        })
    }

    /// Disables the mandatory end-of-archive all-zero-block detection's
    /// sibling check, header checksum verification. All-zero detection
    /// itself always runs regardless of this setting.
    #[must_use]
    pub fn with_checksum_verification(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Returns the next logical entry, or `None` once the end-of-archive
    /// marker has been read. Folds any pax `x`/`g` or GNU `K`/`L`
    /// meta-entries preceding a real entry into it.
    pub fn next_entry(&mut self) -> Result<Option<Entry<R>>, TarError> {
        if self.disposed {
            return Err(TarError::UseAfterFree);
        }
        {
            let mut source = self.source.borrow_mut();
            TarSource::seek(&mut *source, SeekFrom::Start(self.next_header_offset))?;
        }

        let mut pending_path: Option<String> = None;
        let mut pending_link: Option<String> = None;
        let mut pending_pax: HashMap<String, String> = HashMap::new();

        loop {
            let step = {
                let mut source = self.source.borrow_mut();
                header_parser::parse_one(&mut *source, &mut self.format, self.verify_checksum)?
            };
            match step {
                ParseStep::EndOfArchive => {
                    self.dispose();
                    return Ok(None);
                }
                ParseStep::Meta(MetaStep::Pax { attrs, global }) => {
                    if global {
                        self.global_attrs.extend(attrs);
                    } else {
                        pending_pax.extend(attrs);
                    }
                }
                ParseStep::Meta(MetaStep::GnuLongName(name)) => pending_path = Some(name),
                ParseStep::Meta(MetaStep::GnuLongLink(link)) => pending_link = Some(link),
                ParseStep::Entry(raw) => {
                    let entry =
                        self.finish_entry(raw, pending_path, pending_link, pending_pax)?;
                    return Ok(Some(entry));
                }
            }
        }
    }

    fn finish_entry(
        &mut self,
        raw: RawEntry,
        pending_path: Option<String>,
        pending_link: Option<String>,
        pending_pax: HashMap<String, String>,
    ) -> Result<Entry<R>, TarError> {
        let mut extended_attributes = self.global_attrs.clone();
        extended_attributes.extend(pending_pax);

        // GNU long-name/long-link meta-entries and pax local attributes
        // can in principle both precede the same real entry; GNU's
        // explicit literal string wins over a pax key of the same purpose
        // since it is the more recent, more specific override for that
        // single entry.
        let mut name = raw.name;
        if let Some(path) = extended_attributes.get(well_known_keys::PATH) {
            name = path.clone();
        }
        if let Some(path) = pending_path {
            name = path;
        }

        let mut link_name = raw.link_name;
        if let Some(link) = extended_attributes.get(well_known_keys::LINKPATH) {
            link_name = link.clone();
        }
        if let Some(link) = pending_link {
            link_name = link;
        }

        let mut size = raw.size;
        if let Some(value) = extended_attributes.get(well_known_keys::SIZE) {
            size = value
                .parse()
                .map_err(|_| TarError::malformed("pax size", "not a valid integer"))?;
        }
        let mut uid = raw.uid;
        if let Some(value) = extended_attributes.get(well_known_keys::UID) {
            uid = value
                .parse()
                .map_err(|_| TarError::malformed("pax uid", "not a valid integer"))?;
        }
        let mut gid = raw.gid;
        if let Some(value) = extended_attributes.get(well_known_keys::GID) {
            gid = value
                .parse()
                .map_err(|_| TarError::malformed("pax gid", "not a valid integer"))?;
        }
        let mut uname = raw.uname;
        if let Some(value) = extended_attributes.get(well_known_keys::UNAME) {
            uname = value.clone();
        }
        let mut gname = raw.gname;
        if let Some(value) = extended_attributes.get(well_known_keys::GNAME) {
            gname = value.clone();
        }
        let mut mtime = raw.mtime;
        if let Some(value) = extended_attributes.get(well_known_keys::MTIME) {
            mtime = parse_pax_timestamp(value)?;
        }
        let mut atime = raw.atime;
        if let Some(value) = extended_attributes.get(well_known_keys::ATIME) {
            atime = Some(parse_pax_timestamp(value)?);
        }
        let mut ctime = raw.ctime;
        if let Some(value) = extended_attributes.get(well_known_keys::CTIME) {
            ctime = Some(parse_pax_timestamp(value)?);
        }

        let padded = codec::padded_size(size);
        self.next_header_offset = raw.data_start + padded;

        let data = if raw.entry_type.has_data() {
            Some(self.make_entry_data(raw.data_start, size)?)
        } else {
            None
        };

        Ok(Entry::new(
            raw.entry_type,
            RelativePathBuf::from(name),
            RelativePathBuf::from(link_name),
            raw.mode,
            uid,
            gid,
            uname,
            gname,
            size,
            mtime,
            raw.checksum,
            raw.format,
            atime,
            ctime,
            raw.dev_major,
            raw.dev_minor,
            extended_attributes,
            data,
        ))
    }

    fn make_entry_data(&mut self, data_start: u64, len: u64) -> Result<EntryData<R>, TarError> {
        let seekable = self.source.borrow().is_seekable();
        if seekable {
            return Ok(EntryData::Seekable(SeekableWindow::new(
                self.source.clone(),
                data_start,
                len,
            )));
        }

        let mut buf = vec![0u8; usize::try_from(len).map_err(|_| TarError::OutOfRange)?];
        self.source
            .borrow_mut()
            .read_exact(&mut buf)
            .map_err(|_| TarError::unexpected_end("entry data"))?;
        let padding = codec::padded_size(len) - len;
        if padding > 0 {
            let mut discard = vec![0u8; padding as usize];
            self.source
                .borrow_mut()
                .read_exact(&mut discard)
                .map_err(|_| TarError::unexpected_end("block padding"))?;
        }
        Ok(EntryData::Buffered(Cursor::new(buf)))
    }

    /// Idempotently releases this archive's hold on its underlying stream.
    /// A subsequent call to `next_entry` fails with
    /// [`TarError::UseAfterFree`]. Does not close or otherwise touch the
    /// stream itself when `leave_open` was set.
    pub fn dispose(&mut self) {
        self.disposed = true;
    }
}

impl<R: TarSource> Iterator for Archive<R> {
    type Item = Result<Entry<R>, TarError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_entry().transpose()
    }
}

impl<R> Drop for Archive<R> {
    fn drop(&mut self) {
        self.disposed = true;
        let _ = self.leave_open;
    }
}

fn parse_pax_timestamp(value: &str) -> Result<Timestamp, TarError> {
    let (seconds_part, nanos_part) = value.split_once('.').unwrap_or((value, ""));
    let seconds: i64 = seconds_part
        .parse()
        .map_err(|_| TarError::malformed("pax timestamp", "not a valid number"))?;
    let nanoseconds: u32 = if nanos_part.is_empty() {
        0
    } else {
        let padded = format!("{nanos_part:0<9}");
        padded[..9]
            .parse()
            .map_err(|_| TarError::malformed("pax timestamp", "invalid fractional seconds"))?
    };
    Ok(Timestamp {
        seconds,
        nanoseconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor as IoCursor;

    fn header_block(name: &str, typeflag: u8, size: u64, magic: &[u8; 8]) -> Vec<u8> {
        let mut block = vec![0u8; 512];
        block[..name.len()].copy_from_slice(name.as_bytes());
        block[100..108].copy_from_slice(b"0000644\0");
        block[108..116].copy_from_slice(b"0000000\0");
        block[116..124].copy_from_slice(b"0000000\0");
        let size_octal = format!("{size:011o}\0");
        block[124..136].copy_from_slice(size_octal.as_bytes());
        block[136..148].copy_from_slice(b"00000000000\0");
        block[156] = typeflag;
        block[257..265].copy_from_slice(magic);
        block[148..156].copy_from_slice(b"        ");
        let checksum = checksum_of(&block);
        let checksum_octal = format!("{checksum:06o}\0 ");
        block[148..156].copy_from_slice(checksum_octal.as_bytes());
        block
    }

    fn checksum_of(block: &[u8]) -> u64 {
        let mut sum = 0u64;
        for (i, &b) in block.iter().enumerate() {
            if (148..156).contains(&i) {
                sum += u64::from(b' ');
            } else {
                sum += u64::from(b);
            }
        }
        sum
    }

    fn pad_to_block(buf: &mut Vec<u8>) {
        let padding = (512 - buf.len() % 512) % 512;
        buf.extend(std::iter::repeat(0u8).take(padding));
    }

    #[test]
    fn reads_single_v7_file() {
        let mut archive_bytes = Vec::new();
        archive_bytes.extend(header_block("hello.txt", 0, 5, &[0u8; 8]));
        archive_bytes.extend(b"world");
        pad_to_block(&mut archive_bytes);
        archive_bytes.extend(std::iter::repeat(0u8).take(1024));

        let mut archive = Archive::open(IoCursor::new(archive_bytes), ArchiveOptions::default())
            .unwrap();
        let mut entry = archive.next_entry().unwrap().unwrap();
        assert_eq!(entry.name.as_str(), "hello.txt");
        let mut data = Vec::new();
        entry.data_mut().unwrap().read_to_end(&mut data).unwrap();
        assert_eq!(data, b"world");
        assert!(archive.next_entry().unwrap().is_none());
    }

    #[test]
    fn ustar_prefix_is_joined_with_name() {
        let mut block = header_block("file.txt", b'0', 3, &[0u8; 8]);
        block[257..265].copy_from_slice(b"ustar\x0000");
        let prefix = "a/long/prefix/path";
        block[345..345 + prefix.len()].copy_from_slice(prefix.as_bytes());
        let checksum = checksum_of(
            &{
                let mut zeroed = block.clone();
                zeroed[148..156].copy_from_slice(b"        ");
                zeroed
            },
        );
        let checksum_octal = format!("{checksum:06o}\0 ");
        block[148..156].copy_from_slice(checksum_octal.as_bytes());

        let mut archive_bytes = block;
        archive_bytes.extend(b"abc");
        pad_to_block(&mut archive_bytes);
        archive_bytes.extend(std::iter::repeat(0u8).take(1024));

        let mut archive = Archive::open(IoCursor::new(archive_bytes), ArchiveOptions::default())
            .unwrap();
        let entry = archive.next_entry().unwrap().unwrap();
        assert_eq!(entry.name.as_str(), "a/long/prefix/path/file.txt");
    }

    #[test]
    fn pax_local_path_overrides_header_name() {
        let pax_data: &[u8] = b"13 path=over\n";
        let mut archive_bytes = Vec::new();
        let mut pax_header =
            header_block("PaxHeaders/x", b'x', pax_data.len() as u64, &[0u8; 8]);
        pax_header[257..265].copy_from_slice(b"ustar\x0000");
        let pax_checksum = checksum_of(&{
            let mut zeroed = pax_header.clone();
            zeroed[148..156].copy_from_slice(b"        ");
            zeroed
        });
        pax_header[148..156].copy_from_slice(format!("{pax_checksum:06o}\0 ").as_bytes());
        archive_bytes.extend(pax_header);
        archive_bytes.extend(pax_data);
        pad_to_block(&mut archive_bytes);

        let mut real_header = header_block("original.txt", b'0', 2, &[0u8; 8]);
        real_header[257..265].copy_from_slice(b"ustar\x0000");
        let real_checksum = checksum_of(&{
            let mut zeroed = real_header.clone();
            zeroed[148..156].copy_from_slice(b"        ");
            zeroed
        });
        real_header[148..156].copy_from_slice(format!("{real_checksum:06o}\0 ").as_bytes());
        archive_bytes.extend(real_header);
        archive_bytes.extend(b"ok");
        pad_to_block(&mut archive_bytes);
        archive_bytes.extend(std::iter::repeat(0u8).take(1024));

        let mut archive = Archive::open(IoCursor::new(archive_bytes), ArchiveOptions::default())
            .unwrap();
        let entry = archive.next_entry().unwrap().unwrap();
        assert_eq!(entry.name.as_str(), "over");
    }
}
