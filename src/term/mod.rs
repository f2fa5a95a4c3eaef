//! Terminal Module
//!
//! The duplicate-terminal slot and the hardware serial port it can target.

pub mod dupterm;
pub mod serial;

pub use dupterm::{check_stream, DuptermTarget, TerminalRedirect};
pub use serial::{SerialPort, Uart};
