//! File System Types
//!
//! Core types and traits for the filesystems that can be mounted into the VFS.
//! Paths handed to a `FileSystem` are relative to its mount point, written in
//! absolute form ("/" is the root of the volume).

use async_trait::async_trait;
use thiserror::Error;

use crate::errno::{Errno, FatResult};

/// Mode bit for directories in `stat` results.
pub const S_IFDIR: u32 = 0x4000;
/// Mode bit for regular files in `stat` results.
pub const S_IFREG: u32 = 0x8000;

/// File system errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FsError {
    #[error("ENOENT: no such file or directory, {operation} '{path}'")]
    NotFound { path: String, operation: String },

    #[error("EEXIST: file already exists, {operation} '{path}'")]
    AlreadyExists { path: String, operation: String },

    #[error("EISDIR: illegal operation on a directory, {operation} '{path}'")]
    IsDirectory { path: String, operation: String },

    #[error("ENOTDIR: not a directory, {operation} '{path}'")]
    NotDirectory { path: String, operation: String },

    #[error("EACCES: directory not empty, {operation} '{path}'")]
    NotEmpty { path: String, operation: String },

    #[error("EINVAL: invalid argument, {operation} '{path}'")]
    InvalidArgument { path: String, operation: String },

    #[error("EROFS: read-only file system, {operation}")]
    ReadOnly { operation: String },

    #[error("ENOSPC: no space left on device, {operation} '{path}'")]
    NoSpace { path: String, operation: String },

    #[error("ENODEV: no filesystem on volume, {operation}")]
    NoFilesystem { operation: String },

    #[error("driver error during {operation}: {result}")]
    Driver { result: FatResult, operation: String },
}

impl FsError {
    /// The errno raised to scripts for this error.
    pub fn errno(&self) -> Errno {
        match self {
            FsError::NotFound { .. } => Errno::ENOENT,
            FsError::AlreadyExists { .. } => Errno::EEXIST,
            FsError::IsDirectory { .. } => Errno::EISDIR,
            FsError::NotDirectory { .. } => Errno::ENOTDIR,
            // FAT refuses to remove a populated directory with FR_DENIED
            FsError::NotEmpty { .. } => Errno::EACCES,
            FsError::InvalidArgument { .. } => Errno::EINVAL,
            FsError::ReadOnly { .. } => Errno::EROFS,
            FsError::NoSpace { .. } => Errno::ENOSPC,
            FsError::NoFilesystem { .. } => Errno::ENODEV,
            FsError::Driver { result, .. } => result.to_errno(),
        }
    }
}

/// File status information
#[derive(Debug, Clone, PartialEq)]
pub struct FsStat {
    pub is_directory: bool,
    pub size: u64,
    /// Seconds since 2000-01-01 00:00:00
    pub mtime: u64,
}

impl FsStat {
    pub fn mode(&self) -> u32 {
        if self.is_directory {
            S_IFDIR
        } else {
            S_IFREG
        }
    }
}

/// Directory entry with type information
#[derive(Debug, Clone, PartialEq)]
pub struct DirentEntry {
    pub name: String,
    pub is_directory: bool,
}

/// Volume statistics, in the order `statvfs` reports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatVfs {
    pub bsize: u64,
    pub frsize: u64,
    pub blocks: u64,
    pub bfree: u64,
    pub bavail: u64,
    pub files: u64,
    pub ffree: u64,
    pub favail: u64,
    pub flag: u64,
    pub namemax: u64,
}

/// Cluster accounting exposed by a FAT volume descriptor.
#[async_trait]
pub trait FatVolume: Send + Sync {
    /// Sectors per cluster (`csize`)
    fn cluster_size(&self) -> u32;

    /// Bytes per sector (`ssize`)
    fn sector_size(&self) -> u32;

    /// Number of data clusters on the volume
    fn total_clusters(&self) -> u32;

    /// Count of free clusters, as `f_getfree` reports it
    async fn free_clusters(&self) -> Result<u32, FatResult>;
}

/// Abstract filesystem interface that can be mounted into the VFS.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Called when the filesystem is attached to the mount table
    async fn mount(&self, _readonly: bool) -> Result<(), FsError> {
        Ok(())
    }

    /// Called when the filesystem is detached from the mount table
    async fn umount(&self) -> Result<(), FsError> {
        Ok(())
    }

    /// Create a fresh, empty filesystem on the volume
    async fn mkfs(&self) -> Result<(), FsError> {
        Err(FsError::InvalidArgument {
            path: "/".to_string(),
            operation: "mkfs".to_string(),
        })
    }

    /// Get file/directory information
    async fn stat(&self, path: &str) -> Result<FsStat, FsError>;

    /// Read directory contents with file type information, sorted by name
    async fn readdir_with_file_types(&self, path: &str) -> Result<Vec<DirentEntry>, FsError>;

    /// Read directory contents (returns entry names)
    async fn readdir(&self, path: &str) -> Result<Vec<String>, FsError> {
        let entries = self.readdir_with_file_types(path).await?;
        Ok(entries.into_iter().map(|e| e.name).collect())
    }

    /// Create a directory; the parent must exist
    async fn mkdir(&self, path: &str) -> Result<(), FsError>;

    /// Remove a file
    async fn remove(&self, path: &str) -> Result<(), FsError>;

    /// Remove an empty directory
    async fn rmdir(&self, path: &str) -> Result<(), FsError>;

    /// Move/rename a file or directory, replacing an existing file at `new`
    async fn rename(&self, old: &str, new: &str) -> Result<(), FsError>;

    /// Read the contents of a file as bytes
    async fn read_file(&self, path: &str) -> Result<Vec<u8>, FsError>;

    /// Write content to a file, creating it if it doesn't exist
    async fn write_file(&self, path: &str, content: &[u8]) -> Result<(), FsError>;

    /// Volume statistics
    async fn statvfs(&self, path: &str) -> Result<StatVfs, FsError>;

    /// The FAT descriptor behind this filesystem, if it is one
    fn as_fat(&self) -> Option<&dyn FatVolume> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_error_errno() {
        let err = FsError::NotEmpty {
            path: "/lib".to_string(),
            operation: "rmdir".to_string(),
        };
        assert_eq!(err.errno(), Errno::EACCES);

        let err = FsError::Driver {
            result: FatResult::DiskErr,
            operation: "getfree".to_string(),
        };
        assert_eq!(err.errno(), Errno::EIO);
    }

    #[test]
    fn test_stat_mode() {
        let dir = FsStat { is_directory: true, size: 0, mtime: 0 };
        let file = FsStat { is_directory: false, size: 12, mtime: 0 };
        assert_eq!(dir.mode(), S_IFDIR);
        assert_eq!(file.mode(), S_IFREG);
    }
}
