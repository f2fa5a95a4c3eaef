//! File System Module
//!
//! Filesystem abstractions that can be mounted into the VFS:
//! - FatFs: in-memory volume with FAT cluster accounting
//! - FatVolume: the cluster accounting `getfree` reads

pub mod fat_fs;
pub mod path;
pub mod timestamp;
pub mod types;

pub use fat_fs::{FatFs, FatGeometry, SECTOR_SIZE};
pub use timestamp::FatTimestamp;
pub use types::*;
