//! Runtime Values
//!
//! The values that cross the boundary between the scripting runtime and this
//! module. Script-defined objects are duck-typed: they are reached only
//! through `ScriptObject`, which resolves methods by name.

use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::fs::FileSystem;
use crate::term::SerialPort;

/// A method bound to its receiver.
pub type Method = Arc<dyn Fn(&[Value]) -> Result<Value> + Send + Sync>;

/// An object owned by the scripting runtime.
pub trait ScriptObject: Send + Sync {
    /// Type name used in error messages and reprs
    fn type_name(&self) -> &str;

    /// Look up a callable attribute, binding it to this object
    fn load_method(self: Arc<Self>, name: &str) -> Option<Method>;

    /// The hardware serial port, if this object is one
    fn as_serial(&self) -> Option<&dyn SerialPort> {
        None
    }

    /// The filesystem this object wraps, if it can be mounted
    fn filesystem(&self) -> Option<Arc<dyn FileSystem>> {
        None
    }
}

/// A value passed to or returned from a module function.
#[derive(Clone)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    Tuple(Vec<Value>),
    /// Tuple whose fields are also reachable by name
    AttrTuple(Vec<(String, Value)>),
    List(Vec<Value>),
    Object(Arc<dyn ScriptObject>),
}

impl Value {
    pub fn type_name(&self) -> String {
        match self {
            Value::None => "NoneType".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Str(_) => "str".to_string(),
            Value::Bytes(_) => "bytes".to_string(),
            Value::Tuple(_) | Value::AttrTuple(_) => "tuple".to_string(),
            Value::List(_) => "list".to_string(),
            Value::Object(obj) => obj.type_name().to_string(),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Field of an attribute tuple by name
    pub fn attr(&self, name: &str) -> Option<&Value> {
        match self {
            Value::AttrTuple(fields) => fields.iter().find(|(k, _)| k == name).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Element of a tuple or list by position
    pub fn item(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Tuple(items) | Value::List(items) => items.get(index),
            Value::AttrTuple(fields) => fields.get(index).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Int(n.min(i64::MAX as u64) as i64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::Tuple(a), Value::Tuple(b)) | (Value::List(a), Value::List(b)) => a == b,
            (Value::AttrTuple(a), Value::AttrTuple(b)) => a == b,
            // objects compare by identity
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

fn write_str_repr(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    write!(f, "{}", quote)?;
    for c in s.chars() {
        match c {
            '\\' => write!(f, "\\\\")?,
            '\n' => write!(f, "\\n")?,
            '\r' => write!(f, "\\r")?,
            '\t' => write!(f, "\\t")?,
            c if c == quote => write!(f, "\\{}", c)?,
            c => write!(f, "{}", c)?,
        }
    }
    write!(f, "{}", quote)
}

fn write_bytes_repr(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    write!(f, "b'")?;
    for &b in bytes {
        match b {
            b'\\' => write!(f, "\\\\")?,
            b'\'' => write!(f, "\\'")?,
            b'\n' => write!(f, "\\n")?,
            b'\r' => write!(f, "\\r")?,
            b'\t' => write!(f, "\\t")?,
            0x20..=0x7e => write!(f, "{}", b as char)?,
            _ => write!(f, "\\x{:02x}", b)?,
        }
    }
    write!(f, "'")
}

fn write_seq(f: &mut fmt::Formatter<'_>, items: &[Value]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

/// Python-style repr
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Str(s) => write_str_repr(f, s),
            Value::Bytes(b) => write_bytes_repr(f, b),
            Value::Tuple(items) => {
                write!(f, "(")?;
                write_seq(f, items)?;
                if items.len() == 1 {
                    write!(f, ",")?;
                }
                write!(f, ")")
            }
            Value::AttrTuple(fields) => {
                write!(f, "(")?;
                for (i, (name, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}={}", name, value)?;
                }
                write!(f, ")")
            }
            Value::List(items) => {
                write!(f, "[")?;
                write_seq(f, items)?;
                write!(f, "]")
            }
            Value::Object(obj) => write!(f, "<{}>", obj.type_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl ScriptObject for Plain {
        fn type_name(&self) -> &str {
            "Plain"
        }

        fn load_method(self: Arc<Self>, _name: &str) -> Option<Method> {
            None
        }
    }

    #[test]
    fn test_repr() {
        assert_eq!(Value::None.to_string(), "None");
        assert_eq!(Value::Bool(true).to_string(), "True");
        assert_eq!(Value::Str("it's".to_string()).to_string(), "\"it's\"");
        assert_eq!(Value::Bytes(vec![b'a', 0, 0xff]).to_string(), "b'a\\x00\\xff'");
        assert_eq!(Value::Tuple(vec![Value::Int(1)]).to_string(), "(1,)");
        assert_eq!(
            Value::List(vec![Value::from("a"), Value::Int(2)]).to_string(),
            "['a', 2]"
        );
        assert_eq!(
            Value::AttrTuple(vec![("sysname".to_string(), Value::from("esp32"))]).to_string(),
            "(sysname='esp32')"
        );
    }

    #[test]
    fn test_object_identity() {
        let a: Arc<dyn ScriptObject> = Arc::new(Plain);
        let b: Arc<dyn ScriptObject> = Arc::new(Plain);
        assert_eq!(Value::Object(a.clone()), Value::Object(a.clone()));
        assert_ne!(Value::Object(a), Value::Object(b));
    }

    #[test]
    fn test_accessors() {
        let t = Value::AttrTuple(vec![
            ("release".to_string(), Value::from("1.0")),
            ("machine".to_string(), Value::from("WiPy with ESP32")),
        ]);
        assert_eq!(t.attr("machine"), Some(&Value::from("WiPy with ESP32")));
        assert_eq!(t.item(0), Some(&Value::from("1.0")));
        assert_eq!(t.attr("nope"), None);
        assert_eq!(Value::Bool(true).as_int(), Some(1));
        assert_eq!(Value::from(7u64).as_int(), Some(7));
    }
}
