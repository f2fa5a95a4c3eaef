//! Builtins implemented by the OS services themselves rather than the VFS.

use async_trait::async_trait;

use crate::error::Result;
use crate::os::OsContext;
use crate::value::Value;

use super::args::{arg_int, arg_str, check_arity};
use super::types::Builtin;

pub struct UnameBuiltin;

#[async_trait]
impl Builtin for UnameBuiltin {
    fn name(&self) -> &'static str {
        "uname"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 0, 0)?;
        Ok(ctx.uname().to_value())
    }
}

pub struct GetfreeBuiltin;

#[async_trait]
impl Builtin for GetfreeBuiltin {
    fn name(&self) -> &'static str {
        "getfree"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        let kib = ctx.getfree(arg_str(&args, 0)?).await?;
        Ok(Value::from(kib))
    }
}

pub struct SyncBuiltin;

#[async_trait]
impl Builtin for SyncBuiltin {
    fn name(&self) -> &'static str {
        "sync"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 0, 0)?;
        ctx.sync();
        Ok(Value::None)
    }
}

pub struct UrandomBuiltin;

#[async_trait]
impl Builtin for UrandomBuiltin {
    fn name(&self) -> &'static str {
        "urandom"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 1, 1)?;
        let n = arg_int(&args, 0)?;
        Ok(Value::Bytes(ctx.urandom(n)?))
    }
}

pub struct DuptermBuiltin;

#[async_trait]
impl Builtin for DuptermBuiltin {
    fn name(&self) -> &'static str {
        "dupterm"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 0, 1)?;
        ctx.dupterm(args.into_iter().next())
    }
}
