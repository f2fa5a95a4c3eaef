//! Builtins that delegate to the VFS.

use async_trait::async_trait;

use crate::error::{OsError, Result};
use crate::fs::StatVfs;
use crate::os::OsContext;
use crate::value::Value;
use crate::vfs::{ListEntry, MountOptions, StatResult, UmountTarget};

use super::args::{arg_flag, arg_opt_str, arg_str, check_arity};
use super::types::Builtin;

fn int_tuple(fields: &[u64]) -> Value {
    Value::Tuple(fields.iter().map(|&n| Value::from(n)).collect())
}

fn stat_value(st: &StatResult) -> Value {
    int_tuple(&[
        st.mode as u64,
        st.ino,
        st.dev,
        st.nlink,
        st.uid,
        st.gid,
        st.size,
        st.atime,
        st.mtime,
        st.ctime,
    ])
}

fn statvfs_value(st: &StatVfs) -> Value {
    int_tuple(&[
        st.bsize,
        st.frsize,
        st.blocks,
        st.bfree,
        st.bavail,
        st.files,
        st.ffree,
        st.favail,
        st.flag,
        st.namemax,
    ])
}

fn list_entry_value(entry: ListEntry) -> Value {
    Value::Tuple(vec![
        Value::Str(entry.name),
        Value::Int(entry.kind as i64),
        Value::from(entry.inode),
    ])
}

// ============================================================================
// Navigation
// ============================================================================

pub struct ChdirBuiltin;

#[async_trait]
impl Builtin for ChdirBuiltin {
    fn name(&self) -> &'static str {
        "chdir"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        ctx.vfs.chdir(arg_str(&args, 0)?).await?;
        Ok(Value::None)
    }
}

pub struct GetcwdBuiltin;

#[async_trait]
impl Builtin for GetcwdBuiltin {
    fn name(&self) -> &'static str {
        "getcwd"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 0, 0)?;
        Ok(Value::Str(ctx.vfs.getcwd()))
    }
}

/// Yields `(name, type, inode)` for each entry.
pub struct IlistdirBuiltin;

#[async_trait]
impl Builtin for IlistdirBuiltin {
    fn name(&self) -> &'static str {
        "ilistdir"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 0, 1)?;
        let entries = ctx.vfs.ilistdir(arg_opt_str(&args, 0)?).await?;
        Ok(Value::List(entries.into_iter().map(list_entry_value).collect()))
    }
}

pub struct ListdirBuiltin;

#[async_trait]
impl Builtin for ListdirBuiltin {
    fn name(&self) -> &'static str {
        "listdir"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 0, 1)?;
        let names = ctx.vfs.listdir(arg_opt_str(&args, 0)?).await?;
        Ok(Value::List(names.into_iter().map(Value::Str).collect()))
    }
}

// ============================================================================
// Mutations
// ============================================================================

pub struct MkdirBuiltin;

#[async_trait]
impl Builtin for MkdirBuiltin {
    fn name(&self) -> &'static str {
        "mkdir"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        ctx.vfs.mkdir(arg_str(&args, 0)?).await?;
        Ok(Value::None)
    }
}

pub struct RenameBuiltin;

#[async_trait]
impl Builtin for RenameBuiltin {
    fn name(&self) -> &'static str {
        "rename"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 2, 2)?;
        ctx.vfs.rename(arg_str(&args, 0)?, arg_str(&args, 1)?).await?;
        Ok(Value::None)
    }
}

/// Registered as both `remove` and `unlink`.
pub struct RemoveBuiltin;

#[async_trait]
impl Builtin for RemoveBuiltin {
    fn name(&self) -> &'static str {
        "remove"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        ctx.vfs.remove(arg_str(&args, 0)?).await?;
        Ok(Value::None)
    }
}

pub struct RmdirBuiltin;

#[async_trait]
impl Builtin for RmdirBuiltin {
    fn name(&self) -> &'static str {
        "rmdir"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        ctx.vfs.rmdir(arg_str(&args, 0)?).await?;
        Ok(Value::None)
    }
}

// ============================================================================
// Status
// ============================================================================

pub struct StatBuiltin;

#[async_trait]
impl Builtin for StatBuiltin {
    fn name(&self) -> &'static str {
        "stat"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        let st = ctx.vfs.stat(arg_str(&args, 0)?).await?;
        Ok(stat_value(&st))
    }
}

pub struct StatvfsBuiltin;

#[async_trait]
impl Builtin for StatvfsBuiltin {
    fn name(&self) -> &'static str {
        "statvfs"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        let st = ctx.vfs.statvfs(arg_str(&args, 0)?).await?;
        Ok(statvfs_value(&st))
    }
}

// ============================================================================
// Mounting
// ============================================================================

/// `mount(obj, path[, readonly[, mkfs]])`
pub struct MountBuiltin;

#[async_trait]
impl Builtin for MountBuiltin {
    fn name(&self) -> &'static str {
        "mount"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 2, 4)?;
        let object = match &args[0] {
            Value::Object(object) => object.clone(),
            other => {
                return Err(OsError::Attribute {
                    type_name: other.type_name(),
                    attr: "mount".to_string(),
                })
            }
        };
        let fs = object.filesystem().ok_or_else(|| OsError::Attribute {
            type_name: object.type_name().to_string(),
            attr: "mount".to_string(),
        })?;
        let path = arg_str(&args, 1)?;
        let options = MountOptions {
            readonly: arg_flag(&args, 2),
            mkfs: arg_flag(&args, 3),
        };
        ctx.vfs.mount(fs, Some(object), path, options).await?;
        Ok(Value::None)
    }
}

/// `umount(path)` or `umount(obj)`
pub struct UmountBuiltin;

#[async_trait]
impl Builtin for UmountBuiltin {
    fn name(&self) -> &'static str {
        "umount"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        let target = match &args[0] {
            Value::Object(object) => UmountTarget::Object(object.clone()),
            _ => UmountTarget::Path(arg_str(&args, 0)?.to_string()),
        };
        ctx.vfs.umount(target).await?;
        Ok(Value::None)
    }
}
