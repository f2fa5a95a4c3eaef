//! uos - operating-system services for an embedded scripting runtime
//!
//! Filesystem and system-identity operations exposed as a flat module
//! namespace: a mount table with path routing, FAT free-space accounting,
//! a duplicate terminal slot, `uname`, `urandom` and `sync`.

pub mod config;
pub mod errno;
pub mod error;
pub mod fs;
pub mod module;
pub mod os;
pub mod session;
pub mod term;
pub mod value;
pub mod vfs;

pub use config::{ConfigError, MountConfig, OsConfig};
pub use errno::{Errno, FatResult};
pub use error::{OsError, Result};
pub use module::{create_uos_module, Builtin, ModuleRegistry, VfsFat};
pub use os::OsContext;
pub use session::{ExecResult, Session};
pub use value::{Method, ScriptObject, Value};
pub use vfs::Vfs;
