//! Error handling stuff
use displaydoc::Display;
#[cfg(feature = "snapshot")]
use std::io;
use thiserror::Error;

/// Error type for node tree operations, see [`crate::vfs`]
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum FsError {
    /// `{0}` already exists
    Exists(String),

    /// `{0}` not found
    NotFound(String),

    /// Not a directory
    NotDirectory,

    /// Is a directory
    IsDirectory,

    /// Invalid argument
    InvalidArgument,

    /// Operation not permitted
    PermissionDenied,

    /// Device is gone
    NoDevice,
}

impl FsError {
    /// The errno the kernel returns for the same failure.
    ///
    /// Always negative, like a file operation return value.
    pub fn errno(&self) -> i32 {
        let errno = match self {
            Self::Exists(_) => libc::EEXIST,
            Self::NotFound(_) => libc::ENOENT,
            Self::NotDirectory => libc::ENOTDIR,
            Self::IsDirectory => libc::EISDIR,
            Self::InvalidArgument => libc::EINVAL,
            Self::PermissionDenied => libc::EPERM,
            Self::NoDevice => libc::ENODEV,
        };
        -errno
    }
}

/// Error type for [`crate::snapshot`]
#[cfg(feature = "snapshot")]
#[derive(Debug, Display, Error)]
pub enum SnapshotError {
    /// IO Failed
    Io(#[from] io::Error),

    /// Couldn't walk snapshot directory
    Walk(#[from] walkdir::Error),

    /// Node tree error: {0}
    Fs(#[from] FsError),
}
