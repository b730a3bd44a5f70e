//! Archive configuration (component F).

/// The only mode this decoder supports is reading; the field exists so the
/// shape matches a read/write archive API and future modes can be added
/// without breaking callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Read,
}

/// Options passed to [`crate::archive::Archive::open`].
#[derive(Debug, Clone, Copy)]
pub struct ArchiveOptions {
    /// Must be [`Mode::Read`]; any other value is rejected with
    /// [`crate::error::TarError::InvalidMode`].
    pub mode: Mode,
    /// If `true`, [`crate::archive::Archive::dispose`] and `Drop` leave the
    /// underlying stream open (do not read the trailing end-of-archive
    /// blocks or otherwise touch it further beyond what was already read).
    pub leave_open: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            mode: Mode::Read,
            leave_open: false,
        }
    }
}
