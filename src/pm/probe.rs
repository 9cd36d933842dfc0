//! Lock-file probing
//!
//! Package manager detection only needs to know whether a marker file exists.
//! The check is a trait so the installer never reaches for global filesystem
//! state directly.

use std::path::Path;

/// Answers "does this lock file exist?"
pub trait LockfileProber {
    fn exists(&self, path: &Path) -> bool;
}

/// Probes the real filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsProber;

impl LockfileProber for FsProber {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

impl<P: LockfileProber + ?Sized> LockfileProber for &P {
    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }
}
