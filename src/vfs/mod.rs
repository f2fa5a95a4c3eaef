//! VFS Module
//!
//! The mount table and the path-routing layer on top of it.

pub mod mount_table;
pub mod vfs;

pub use mount_table::{Lookup, MountEntry, MountTable};
pub use vfs::{ListEntry, MountOptions, StatResult, UmountTarget, Vfs, ST_RDONLY};
