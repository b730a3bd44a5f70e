//! Per-entry data windows (component C of the design).
//!
//! A seekable parent stream is never copied: [`SeekableWindow`] shares the
//! parent via `Rc<RefCell<_>>` and reconciles the parent's position to its
//! own expected offset before every read, since the parent may have moved
//! underneath it (another substream, or the archive itself, may have read
//! from it in the meantime). Seeking only adjusts the window's own logical
//! position; it carries no I/O, so reconciliation against the parent is
//! deferred to the next read. A non-seekable parent cannot support
//! that, so its entry data is read eagerly into a `Vec<u8>` and handed out
//! as a `std::io::Cursor`, which already implements `Read + Seek` exactly
//! the way an in-memory window should.

use std::cell::RefCell;
use std::io::{self, Cursor, Read, Seek, SeekFrom};
use std::rc::Rc;

use crate::error::TarError;
use crate::source::TarSource;

/// A read-only, seekable window into a shared parent stream, covering
/// `[base, base + len)`.
pub struct SeekableWindow<R> {
    parent: Rc<RefCell<R>>,
    base: u64,
    len: u64,
    pos: u64,
}

impl<R: TarSource> SeekableWindow<R> {
    pub(crate) fn new(parent: Rc<RefCell<R>>, base: u64, len: u64) -> Self {
        Self {
            parent,
            base,
            len,
            pos: 0,
        }
    }

    fn reconcile(&self) -> io::Result<()> {
        self.parent
            .borrow_mut()
            .seek(SeekFrom::Start(self.base + self.pos))?;
        Ok(())
    }

    /// Bytes remaining between the current position and the end of the
    /// window.
    #[must_use]
    pub fn remaining(&self) -> u64 {
        self.len - self.pos
    }
}

impl<R: TarSource> Read for SeekableWindow<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reconcile()?;
        let remaining = self.remaining();
        if remaining == 0 {
            return Ok(0);
        }
        let cap = remaining.min(buf.len() as u64) as usize;
        let n = self.parent.borrow_mut().read(&mut buf[..cap])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: TarSource> Seek for SeekableWindow<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let candidate = match pos {
            SeekFrom::Start(n) => i128::from(n),
            SeekFrom::Current(n) => i128::from(self.pos) + i128::from(n),
            SeekFrom::End(n) => i128::from(self.len) + i128::from(n),
        };
        if candidate < 0 || candidate > i128::from(self.len) {
            return Err(TarError::OutOfRange.into());
        }
        self.pos = candidate as u64;
        Ok(self.pos)
    }
}

/// An entry's data, either a zero-copy window into a seekable parent
/// stream, or an eagerly-buffered in-memory copy read from a forward-only
/// parent.
pub enum EntryData<R> {
    Seekable(SeekableWindow<R>),
    Buffered(Cursor<Vec<u8>>),
}

impl<R: TarSource> Read for EntryData<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Seekable(window) => window.read(buf),
            Self::Buffered(cursor) => cursor.read(buf),
        }
    }
}

impl<R: TarSource> Seek for EntryData<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            Self::Seekable(window) => window.seek(pos),
            Self::Buffered(cursor) => cursor.seek(pos),
        }
    }
}
