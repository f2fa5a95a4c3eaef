//! OS Error Codes
//!
//! POSIX-style errno values raised to scripts, and the translation table
//! from FAT driver results to errno.

use std::fmt;

use thiserror::Error;

/// Error numbers surfaced as `OSError: [Errno N] NAME`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Errno {
    EPERM,
    ENOENT,
    EIO,
    EBADF,
    EAGAIN,
    ENOMEM,
    EACCES,
    EBUSY,
    EEXIST,
    EXDEV,
    ENODEV,
    ENOTDIR,
    EISDIR,
    EINVAL,
    EMFILE,
    ENOSPC,
    EROFS,
}

impl Errno {
    /// Numeric value, matching newlib/Linux.
    pub fn code(self) -> i32 {
        match self {
            Errno::EPERM => 1,
            Errno::ENOENT => 2,
            Errno::EIO => 5,
            Errno::EBADF => 9,
            Errno::EAGAIN => 11,
            Errno::ENOMEM => 12,
            Errno::EACCES => 13,
            Errno::EBUSY => 16,
            Errno::EEXIST => 17,
            Errno::EXDEV => 18,
            Errno::ENODEV => 19,
            Errno::ENOTDIR => 20,
            Errno::EISDIR => 21,
            Errno::EINVAL => 22,
            Errno::EMFILE => 24,
            Errno::ENOSPC => 28,
            Errno::EROFS => 30,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Errno::EPERM => "EPERM",
            Errno::ENOENT => "ENOENT",
            Errno::EIO => "EIO",
            Errno::EBADF => "EBADF",
            Errno::EAGAIN => "EAGAIN",
            Errno::ENOMEM => "ENOMEM",
            Errno::EACCES => "EACCES",
            Errno::EBUSY => "EBUSY",
            Errno::EEXIST => "EEXIST",
            Errno::EXDEV => "EXDEV",
            Errno::ENODEV => "ENODEV",
            Errno::ENOTDIR => "ENOTDIR",
            Errno::EISDIR => "EISDIR",
            Errno::EINVAL => "EINVAL",
            Errno::EMFILE => "EMFILE",
            Errno::ENOSPC => "ENOSPC",
            Errno::EROFS => "EROFS",
        }
    }
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Errno {}] {}", self.code(), self.name())
    }
}

/// Result codes reported by the FAT driver (everything except `FR_OK`).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FatResult {
    #[error("low level disk I/O error")]
    DiskErr,
    #[error("assertion failed in driver")]
    IntErr,
    #[error("physical drive not ready")]
    NotReady,
    #[error("file not found")]
    NoFile,
    #[error("path not found")]
    NoPath,
    #[error("invalid path name")]
    InvalidName,
    #[error("access denied or directory full")]
    Denied,
    #[error("object already exists")]
    Exist,
    #[error("invalid file or directory object")]
    InvalidObject,
    #[error("drive is write protected")]
    WriteProtected,
    #[error("invalid logical drive")]
    InvalidDrive,
    #[error("volume has no work area")]
    NotEnabled,
    #[error("no valid FAT volume")]
    NoFilesystem,
    #[error("format aborted")]
    MkfsAborted,
    #[error("timed out waiting for volume access")]
    Timeout,
    #[error("object locked by file sharing policy")]
    Locked,
    #[error("not enough memory for long file name buffer")]
    NotEnoughCore,
    #[error("too many open files")]
    TooManyOpenFiles,
    #[error("invalid parameter")]
    InvalidParameter,
}

impl FatResult {
    /// Translate a driver result into the errno raised to scripts.
    pub fn to_errno(self) -> Errno {
        match self {
            FatResult::DiskErr
            | FatResult::IntErr
            | FatResult::MkfsAborted
            | FatResult::Timeout
            | FatResult::Locked => Errno::EIO,
            FatResult::NotReady => Errno::EBUSY,
            FatResult::NoFile | FatResult::NoPath => Errno::ENOENT,
            FatResult::InvalidName | FatResult::InvalidObject | FatResult::InvalidParameter => {
                Errno::EINVAL
            }
            FatResult::Denied => Errno::EACCES,
            FatResult::Exist => Errno::EEXIST,
            FatResult::WriteProtected => Errno::EROFS,
            FatResult::InvalidDrive | FatResult::NotEnabled | FatResult::NoFilesystem => {
                Errno::ENODEV
            }
            FatResult::NotEnoughCore => Errno::ENOMEM,
            FatResult::TooManyOpenFiles => Errno::EMFILE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errno_display() {
        assert_eq!(Errno::ENOENT.to_string(), "[Errno 2] ENOENT");
        assert_eq!(Errno::EROFS.to_string(), "[Errno 30] EROFS");
    }

    #[test]
    fn test_fat_result_translation() {
        assert_eq!(FatResult::NoFile.to_errno(), Errno::ENOENT);
        assert_eq!(FatResult::NoPath.to_errno(), Errno::ENOENT);
        assert_eq!(FatResult::DiskErr.to_errno(), Errno::EIO);
        assert_eq!(FatResult::NotReady.to_errno(), Errno::EBUSY);
        assert_eq!(FatResult::Denied.to_errno(), Errno::EACCES);
        assert_eq!(FatResult::NoFilesystem.to_errno(), Errno::ENODEV);
        assert_eq!(FatResult::WriteProtected.to_errno(), Errno::EROFS);
        assert_eq!(FatResult::TooManyOpenFiles.to_errno(), Errno::EMFILE);
    }
}
