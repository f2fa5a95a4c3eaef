//! Hardware Serial Port
//!
//! The machine UART is the one stream type `dupterm` accepts without probing
//! for `read`/`write`, since console traffic reaches it directly.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::OsError;
use crate::value::{Method, ScriptObject, Value};

/// Byte-level access to a serial port.
pub trait SerialPort: Send + Sync {
    /// Queue bytes for transmission; returns how many were accepted
    fn write_bytes(&self, data: &[u8]) -> usize;

    /// Take up to `n` received bytes
    fn read_bytes(&self, n: usize) -> Vec<u8>;

    /// Number of received bytes waiting
    fn any(&self) -> usize;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A UART with in-memory receive and transmit buffers.
pub struct Uart {
    id: u8,
    rx: Mutex<VecDeque<u8>>,
    tx: Mutex<Vec<u8>>,
}

impl Uart {
    pub fn new(id: u8) -> Self {
        Self {
            id,
            rx: Mutex::new(VecDeque::new()),
            tx: Mutex::new(Vec::new()),
        }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    /// Simulate bytes arriving on the wire.
    pub fn feed(&self, data: &[u8]) {
        lock(&self.rx).extend(data.iter().copied());
    }

    /// Drain everything transmitted so far.
    pub fn take_output(&self) -> Vec<u8> {
        std::mem::take(&mut *lock(&self.tx))
    }
}

impl SerialPort for Uart {
    fn write_bytes(&self, data: &[u8]) -> usize {
        lock(&self.tx).extend_from_slice(data);
        data.len()
    }

    fn read_bytes(&self, n: usize) -> Vec<u8> {
        let mut rx = lock(&self.rx);
        let n = n.min(rx.len());
        rx.drain(..n).collect()
    }

    fn any(&self) -> usize {
        lock(&self.rx).len()
    }
}

impl ScriptObject for Uart {
    fn type_name(&self) -> &str {
        "UART"
    }

    fn load_method(self: Arc<Self>, name: &str) -> Option<Method> {
        let uart = self;
        match name {
            "write" => Some(Arc::new(move |args: &[Value]| match args.first() {
                Some(Value::Bytes(b)) => Ok(Value::Int(uart.write_bytes(b) as i64)),
                Some(Value::Str(s)) => Ok(Value::Int(uart.write_bytes(s.as_bytes()) as i64)),
                _ => Err(OsError::Type("object with buffer protocol required".to_string())),
            })),
            "read" => Some(Arc::new(move |args: &[Value]| {
                let n = match args.first() {
                    Some(Value::Int(n)) if *n >= 0 => *n as usize,
                    Some(Value::None) | None => uart.any(),
                    _ => return Err(OsError::Type("can't convert to int".to_string())),
                };
                let data = uart.read_bytes(n);
                if data.is_empty() {
                    Ok(Value::None)
                } else {
                    Ok(Value::Bytes(data))
                }
            })),
            "any" => Some(Arc::new(move |_args: &[Value]| Ok(Value::Int(uart.any() as i64)))),
            _ => None,
        }
    }

    fn as_serial(&self) -> Option<&dyn SerialPort> {
        Some(self)
    }
}
