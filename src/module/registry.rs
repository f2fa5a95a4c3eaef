use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{OsError, Result};
use crate::fs::path::SEP;
use crate::os::OsContext;
use crate::value::Value;

use super::types::Builtin;

/// A module attribute: a callable or a constant.
#[derive(Clone)]
pub enum Attr {
    Function(Arc<dyn Builtin>),
    Const(Value),
}

pub struct ModuleRegistry {
    name: &'static str,
    attrs: HashMap<String, Attr>,
}

impl ModuleRegistry {
    pub fn new(name: &'static str) -> Self {
        let mut attrs = HashMap::new();
        attrs.insert("__name__".to_string(), Attr::Const(Value::from(name)));
        Self { name, attrs }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn register(&mut self, builtin: Arc<dyn Builtin>) {
        self.attrs.insert(builtin.name().to_string(), Attr::Function(builtin));
    }

    /// Bind an existing builtin under another name.
    pub fn alias(&mut self, alias: &str, builtin: Arc<dyn Builtin>) {
        self.attrs.insert(alias.to_string(), Attr::Function(builtin));
    }

    pub fn constant(&mut self, name: &str, value: Value) {
        self.attrs.insert(name.to_string(), Attr::Const(value));
    }

    pub fn get(&self, name: &str) -> Option<&Attr> {
        self.attrs.get(name)
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.attrs.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    fn missing(&self, name: &str) -> OsError {
        OsError::Attribute {
            type_name: "module".to_string(),
            attr: name.to_string(),
        }
    }

    /// Read an attribute as a value. Functions have no value form here.
    pub fn load(&self, name: &str) -> Result<Value> {
        match self.attrs.get(name) {
            Some(Attr::Const(value)) => Ok(value.clone()),
            Some(Attr::Function(builtin)) => Err(OsError::Type(format!(
                "function '{}' is not a value",
                builtin.name()
            ))),
            None => Err(self.missing(name)),
        }
    }

    /// Call the attribute `name` with positional `args`.
    pub async fn call(&self, ctx: &mut OsContext, name: &str, args: Vec<Value>) -> Result<Value> {
        match self.attrs.get(name) {
            Some(Attr::Function(builtin)) => builtin.call(ctx, args).await,
            Some(Attr::Const(value)) => Err(OsError::Type(format!(
                "'{}' object isn't callable",
                value.type_name()
            ))),
            None => Err(self.missing(name)),
        }
    }
}

impl Default for ModuleRegistry {
    fn default() -> Self {
        create_uos_module()
    }
}

use super::os_builtins::{DuptermBuiltin, GetfreeBuiltin, SyncBuiltin, UnameBuiltin, UrandomBuiltin};
use super::vfs_builtins::{
    ChdirBuiltin, GetcwdBuiltin, IlistdirBuiltin, ListdirBuiltin, MkdirBuiltin, MountBuiltin,
    RemoveBuiltin, RenameBuiltin, RmdirBuiltin, StatBuiltin, StatvfsBuiltin, UmountBuiltin,
};
use super::vfs_fat::VfsFatBuiltin;

/// Register every `uos` attribute.
pub fn register_uos(registry: &mut ModuleRegistry) {
    registry.register(Arc::new(UnameBuiltin));
    registry.register(Arc::new(ChdirBuiltin));
    registry.register(Arc::new(GetcwdBuiltin));
    registry.register(Arc::new(IlistdirBuiltin));
    registry.register(Arc::new(ListdirBuiltin));
    registry.register(Arc::new(MkdirBuiltin));
    registry.register(Arc::new(RenameBuiltin));
    registry.register(Arc::new(RmdirBuiltin));
    registry.register(Arc::new(StatBuiltin));
    registry.register(Arc::new(StatvfsBuiltin));
    registry.register(Arc::new(SyncBuiltin));
    registry.register(Arc::new(UrandomBuiltin));
    registry.register(Arc::new(GetfreeBuiltin));
    registry.register(Arc::new(MountBuiltin));
    registry.register(Arc::new(UmountBuiltin));
    registry.register(Arc::new(VfsFatBuiltin));
    registry.register(Arc::new(DuptermBuiltin));

    let remove: Arc<dyn Builtin> = Arc::new(RemoveBuiltin);
    registry.register(remove.clone());
    registry.alias("unlink", remove);

    registry.constant("sep", Value::from(SEP));
}

/// Create the `uos` module namespace.
pub fn create_uos_module() -> ModuleRegistry {
    let mut registry = ModuleRegistry::new("uos");
    register_uos(&mut registry);
    registry
}
