//! A read-only tar archive decoder.
//!
//! Reads v7, ustar, pax, and GNU tar archives from any byte source,
//! yielding one logical [`Entry`] per real file/directory/link/device the
//! archive describes. GNU long-name/long-link meta-entries and pax
//! extended-attribute blocks are folded into the entry they describe
//! before the caller ever sees them.
//!
//! ```no_run
//! use std::fs::File;
//! use tar_format::{Archive, ArchiveOptions};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let file = File::open("archive.tar")?;
//! let mut archive = Archive::open(file, ArchiveOptions::default())?;
//! while let Some(entry) = archive.next_entry()? {
//!     println!("{}", entry.name.as_str());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! GNU sparse files, multi-volume archives, tape-volume labels, and the
//! old GNU rename-with-payload extension are recognized and rejected with
//! [`TarError::Unsupported`]; decompressing a compressed outer stream
//! (gzip or otherwise) is left to the caller.

mod archive;
mod codec;
mod constants;
mod entry;
mod error;
mod header_parser;
mod options;
mod pax;
mod source;
mod substream;

pub use archive::Archive;
pub use codec::Timestamp;
pub use constants::{EntryType, Format};
pub use entry::{Entry, ExtendedAttributes};
pub use error::TarError;
pub use options::{ArchiveOptions, Mode};
pub use source::{NonSeekable, TarSource};
pub use substream::EntryData;
