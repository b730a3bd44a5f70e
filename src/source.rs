//! The byte source the archive facade reads from, with an explicit
//! seekability capability query (`spec.md` §6: "optionally seekable,
//! reported via a capability query").

use std::io::{self, Read, Seek, SeekFrom};

/// A byte source the decoder can read from, which may or may not support
/// random access.
///
/// Any `R: Read + Seek` gets this for free via the blanket impl below.
/// Forward-only sources (sockets, pipes) should be wrapped in
/// [`NonSeekable`], which reports `is_seekable() == false` and emulates a
/// restricted forward-only `seek` by reading and discarding bytes.
pub trait TarSource: Read {
    /// Whether `seek` can be trusted to reposition the stream to an
    /// arbitrary offset, including backward.
    fn is_seekable(&self) -> bool;

    /// Repositions the stream. On a non-seekable source this only
    /// supports moving forward.
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64>;

    /// The total length of the stream, if it can be determined without
    /// consuming it.
    fn stream_len(&mut self) -> io::Result<Option<u64>>;
}

impl<R: Read + Seek> TarSource for R {
    fn is_seekable(&self) -> bool {
        true
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Seek::seek(self, pos)
    }

    fn stream_len(&mut self) -> io::Result<Option<u64>> {
        let current = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(current))?;
        Ok(Some(end))
    }
}

/// Wraps a forward-only `Read` so it can be used where a [`TarSource`] is
/// expected. `seek` only ever moves forward, by reading and discarding
/// bytes, mirroring how a real tape or pipe is skipped.
pub struct NonSeekable<R> {
    inner: R,
    position: u64,
}

impl<R: Read> NonSeekable<R> {
    pub fn new(inner: R) -> Self {
        Self { inner, position: 0 }
    }
}

impl<R: Read> Read for NonSeekable<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }
}

impl<R: Read> TarSource for NonSeekable<R> {
    fn is_seekable(&self) -> bool {
        false
    }

    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n) => n,
            SeekFrom::Current(n) => {
                u64::try_from(i64::try_from(self.position).unwrap_or(i64::MAX) + n)
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "seek underflow"))?
            }
            SeekFrom::End(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    "cannot seek from the end of a non-seekable stream",
                ))
            }
        };
        if target < self.position {
            return Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "cannot seek backward on a non-seekable stream",
            ));
        }
        let mut discard = [0u8; 4096];
        let mut remaining = target - self.position;
        while remaining > 0 {
            let chunk = remaining.min(discard.len() as u64) as usize;
            let n = self.inner.read(&mut discard[..chunk])?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "stream ended while skipping forward",
                ));
            }
            self.position += n as u64;
            remaining -= n as u64;
        }
        Ok(self.position)
    }

    fn stream_len(&mut self) -> io::Result<Option<u64>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn blanket_impl_reports_seekable() {
        let cursor = Cursor::new(vec![0u8; 16]);
        assert!(TarSource::is_seekable(&cursor));
    }

    #[test]
    fn non_seekable_skips_forward_by_discarding() {
        let mut source = NonSeekable::new(Cursor::new(b"0123456789".to_vec()));
        TarSource::seek(&mut source, SeekFrom::Start(5)).unwrap();
        let mut buf = [0u8; 2];
        source.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"56");
    }

    #[test]
    fn non_seekable_rejects_backward_seek() {
        let mut source = NonSeekable::new(Cursor::new(b"0123456789".to_vec()));
        TarSource::seek(&mut source, SeekFrom::Start(5)).unwrap();
        assert!(TarSource::seek(&mut source, SeekFrom::Start(2)).is_err());
    }
}
