//! OS Services
//!
//! The functions implemented here rather than delegated to the VFS:
//! `uname`, `getfree`, `sync`, `urandom` and `dupterm`, plus the context
//! that owns their state.

pub mod context;
pub mod flash;
pub mod getfree;
pub mod random;
pub mod uname;

pub use context::OsContext;
pub use flash::{DiskCache, FlashCache};
pub use getfree::getfree;
pub use random::{urandom, HardwareRng, RandomSource};
pub use uname::{uname, UnameInfo};
