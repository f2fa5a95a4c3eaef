use async_trait::async_trait;

use crate::error::Result;
use crate::os::OsContext;
use crate::value::Value;

/// A function exposed in the module namespace.
#[async_trait]
pub trait Builtin: Send + Sync {
    fn name(&self) -> &'static str;
    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value>;
}
