//! Module Namespace
//!
//! The flat namespace of callables and constants the scripting runtime sees
//! as `uos`. Each callable is a `Builtin`; `ModuleRegistry` maps names to them.

pub mod args;
pub mod os_builtins;
pub mod registry;
pub mod types;
pub mod vfs_builtins;
pub mod vfs_fat;

pub use registry::{create_uos_module, register_uos, Attr, ModuleRegistry};
pub use types::Builtin;
pub use vfs_fat::VfsFat;
