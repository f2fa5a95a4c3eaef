//! Duplicate Terminal
//!
//! A single slot holding an optional stream that console traffic is mirrored
//! to. Script streams are checked for `read` and `write` when registered and
//! the bound methods are cached for later dispatch.

use std::sync::Arc;

use crate::error::{OsError, Result};
use crate::value::{Method, ScriptObject, Value};

/// A registered redirect target.
#[derive(Clone)]
pub enum DuptermTarget {
    /// The machine UART, driven directly
    Serial(Arc<dyn ScriptObject>),
    /// A script stream with its cached methods
    Stream {
        object: Arc<dyn ScriptObject>,
        read: Method,
        write: Method,
    },
}

impl DuptermTarget {
    pub fn object(&self) -> &Arc<dyn ScriptObject> {
        match self {
            DuptermTarget::Serial(object) => object,
            DuptermTarget::Stream { object, .. } => object,
        }
    }
}

fn missing(object: &Arc<dyn ScriptObject>, attr: &str) -> OsError {
    OsError::Attribute {
        type_name: object.type_name().to_string(),
        attr: attr.to_string(),
    }
}

/// Check that `object` can act as a console stream.
pub fn check_stream(object: &Arc<dyn ScriptObject>) -> Result<DuptermTarget> {
    if object.as_serial().is_some() {
        return Ok(DuptermTarget::Serial(object.clone()));
    }
    let read = object.clone().load_method("read").ok_or_else(|| missing(object, "read"))?;
    let write = object.clone().load_method("write").ok_or_else(|| missing(object, "write"))?;
    Ok(DuptermTarget::Stream {
        object: object.clone(),
        read,
        write,
    })
}

/// The process-wide redirect slot.
#[derive(Default)]
pub struct TerminalRedirect {
    slot: Option<DuptermTarget>,
}

impl TerminalRedirect {
    pub fn new() -> Self {
        Self { slot: None }
    }

    /// The current target, or `None`.
    pub fn get(&self) -> Value {
        match &self.slot {
            Some(target) => Value::Object(target.object().clone()),
            None => Value::None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.slot.is_some()
    }

    /// Replace the target; `None` clears it. On failure the slot is untouched.
    pub fn set(&mut self, target: Value) -> Result<()> {
        match target {
            Value::None => {
                if self.slot.take().is_some() {
                    log::debug!("dupterm cleared");
                }
                Ok(())
            }
            Value::Object(object) => {
                let target = check_stream(&object)?;
                log::debug!("dupterm set to {}", object.type_name());
                self.slot = Some(target);
                Ok(())
            }
            other => Err(OsError::Attribute {
                type_name: other.type_name(),
                attr: "read".to_string(),
            }),
        }
    }

    /// Mirror console output to the target. Returns the number of bytes the
    /// target accepted; 0 with no target.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        match &self.slot {
            None => Ok(0),
            Some(DuptermTarget::Serial(object)) => Ok(object
                .as_serial()
                .map(|port| port.write_bytes(data))
                .unwrap_or(0)),
            Some(DuptermTarget::Stream { write, .. }) => {
                match write(&[Value::Bytes(data.to_vec())])? {
                    Value::Int(n) => Ok(n.max(0) as usize),
                    Value::None => Ok(0),
                    _ => Ok(data.len()),
                }
            }
        }
    }

    /// Poll the target for up to `n` bytes of console input.
    pub fn read(&self, n: usize) -> Result<Vec<u8>> {
        match &self.slot {
            None => Ok(Vec::new()),
            Some(DuptermTarget::Serial(object)) => Ok(object
                .as_serial()
                .map(|port| port.read_bytes(n))
                .unwrap_or_default()),
            Some(DuptermTarget::Stream { read, .. }) => match read(&[Value::Int(n as i64)])? {
                Value::Bytes(b) => Ok(b),
                Value::Str(s) => Ok(s.into_bytes()),
                _ => Ok(Vec::new()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::Uart;
    use std::sync::Mutex;

    /// Duck-typed stream exposing only the methods it was built with.
    struct Sink {
        methods: Vec<&'static str>,
        written: Arc<Mutex<Vec<u8>>>,
    }

    impl Sink {
        fn new(methods: Vec<&'static str>) -> Arc<Self> {
            Arc::new(Self { methods, written: Arc::new(Mutex::new(Vec::new())) })
        }
    }

    impl ScriptObject for Sink {
        fn type_name(&self) -> &str {
            "Sink"
        }

        fn load_method(self: Arc<Self>, name: &str) -> Option<Method> {
            if !self.methods.contains(&name) {
                return None;
            }
            let written = self.written.clone();
            match name {
                "write" => Some(Arc::new(move |args: &[Value]| {
                    let data = args[0].as_bytes().unwrap_or_default().to_vec();
                    let n = data.len();
                    written.lock().unwrap().extend(data);
                    Ok(Value::Int(n as i64))
                })),
                "read" => Some(Arc::new(|_args: &[Value]| Ok(Value::Bytes(b"k".to_vec())))),
                _ => None,
            }
        }
    }

    #[test]
    fn test_fresh_slot_is_none() {
        let slot = TerminalRedirect::new();
        assert_eq!(slot.get(), Value::None);
        assert!(!slot.is_active());
        assert_eq!(slot.write(b"x").unwrap(), 0);
        assert!(slot.read(4).unwrap().is_empty());
    }

    #[test]
    fn test_set_get_clear() {
        let mut slot = TerminalRedirect::new();
        let sink: Arc<dyn ScriptObject> = Sink::new(vec!["read", "write"]);
        slot.set(Value::Object(sink.clone())).unwrap();
        assert_eq!(slot.get(), Value::Object(sink));

        slot.set(Value::None).unwrap();
        assert_eq!(slot.get(), Value::None);
    }

    #[test]
    fn test_missing_write_keeps_previous() {
        let mut slot = TerminalRedirect::new();
        let good: Arc<dyn ScriptObject> = Sink::new(vec!["read", "write"]);
        slot.set(Value::Object(good.clone())).unwrap();

        let bad: Arc<dyn ScriptObject> = Sink::new(vec!["read"]);
        let err = slot.set(Value::Object(bad)).unwrap_err();
        assert_eq!(
            err,
            OsError::Attribute { type_name: "Sink".to_string(), attr: "write".to_string() }
        );
        assert_eq!(slot.get(), Value::Object(good));
    }

    #[test]
    fn test_missing_read() {
        let mut slot = TerminalRedirect::new();
        let bad: Arc<dyn ScriptObject> = Sink::new(vec!["write"]);
        let err = slot.set(Value::Object(bad)).unwrap_err();
        assert!(matches!(err, OsError::Attribute { ref attr, .. } if attr == "read"));
        assert_eq!(slot.get(), Value::None);
    }

    #[test]
    fn test_non_object_target() {
        let mut slot = TerminalRedirect::new();
        let err = slot.set(Value::Int(3)).unwrap_err();
        assert_eq!(
            err,
            OsError::Attribute { type_name: "int".to_string(), attr: "read".to_string() }
        );
    }

    #[test]
    fn test_dispatch_through_cached_methods() {
        let mut slot = TerminalRedirect::new();
        let sink = Sink::new(vec!["read", "write"]);
        slot.set(Value::Object(sink.clone())).unwrap();
        assert_eq!(slot.write(b">>> ").unwrap(), 4);
        assert_eq!(*sink.written.lock().unwrap(), b">>> ");
        assert_eq!(slot.read(1).unwrap(), b"k");
    }

    #[test]
    fn test_serial_skips_method_lookup() {
        let mut slot = TerminalRedirect::new();
        let uart = Arc::new(Uart::new(1));
        slot.set(Value::Object(uart.clone())).unwrap();
        assert_eq!(slot.write(b"boot\r\n").unwrap(), 6);
        assert_eq!(uart.take_output(), b"boot\r\n");

        uart.feed(b"\x03");
        assert_eq!(slot.read(8).unwrap(), b"\x03");
    }

    struct NegativeWriter;

    impl ScriptObject for NegativeWriter {
        fn type_name(&self) -> &str {
            "NegativeWriter"
        }

        fn load_method(self: Arc<Self>, name: &str) -> Option<Method> {
            match name {
                "read" => Some(Arc::new(|_: &[Value]| Ok(Value::None))),
                "write" => Some(Arc::new(|_: &[Value]| Ok(Value::Int(-1)))),
                _ => None,
            }
        }
    }

    #[test]
    fn test_negative_write_count_is_zero() {
        let mut slot = TerminalRedirect::new();
        slot.set(Value::Object(Arc::new(NegativeWriter))).unwrap();
        assert_eq!(slot.write(b"lost").unwrap(), 0);
    }
}
