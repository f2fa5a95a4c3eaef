//! The `VfsFat` type: a mountable FAT volume object.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{OsError, Result};
use crate::fs::{FatFs, FatGeometry, FileSystem, SECTOR_SIZE};
use crate::os::OsContext;
use crate::value::{Method, ScriptObject, Value};

use super::args::{arg_int, check_arity};
use super::types::Builtin;

pub struct VfsFat {
    fs: Arc<FatFs>,
}

impl VfsFat {
    pub fn new(fs: Arc<FatFs>) -> Self {
        Self { fs }
    }

    pub fn volume(&self) -> &Arc<FatFs> {
        &self.fs
    }
}

impl ScriptObject for VfsFat {
    fn type_name(&self) -> &str {
        "VfsFat"
    }

    fn load_method(self: Arc<Self>, _name: &str) -> Option<Method> {
        None
    }

    fn filesystem(&self) -> Option<Arc<dyn FileSystem>> {
        Some(self.fs.clone())
    }
}

fn geometry_arg(args: &[Value], index: usize) -> Result<u32> {
    let n = arg_int(args, index)?;
    u32::try_from(n).map_err(|_| OsError::Value(format!("{} out of range", n)))
}

/// `VfsFat(total_sectors, sectors_per_cluster[, sector_size])`
pub struct VfsFatBuiltin;

#[async_trait]
impl Builtin for VfsFatBuiltin {
    fn name(&self) -> &'static str {
        "VfsFat"
    }

    async fn call(&self, ctx: &mut OsContext, args: Vec<Value>) -> Result<Value> {
        check_arity(&args, 2, 3)?;
        let sector_size = if args.len() > 2 {
            geometry_arg(&args, 2)?
        } else {
            SECTOR_SIZE
        };
        let geometry = FatGeometry::new(geometry_arg(&args, 0)?, geometry_arg(&args, 1)?, sector_size);
        let fs = ctx.fat_volume(geometry)?;
        Ok(Value::Object(Arc::new(VfsFat::new(Arc::new(fs)))))
    }
}
