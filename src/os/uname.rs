//! System identification
//!
//! The record returned by `uname()`. Its schema is fixed at build time: the
//! `lorawan` and `sigfox` fields exist only on boards carrying those radios.

use lazy_static::lazy_static;

use crate::value::Value;

/// Platform reported as `sysname` and `nodename`.
pub const PLATFORM: &str = "esp32";

pub const MCU_NAME: &str = "ESP32";

pub const BOARD_NAME: &str = if cfg!(feature = "fipy") {
    "FiPy"
} else if cfg!(feature = "lopy4") {
    "LoPy4"
} else if cfg!(feature = "lopy") {
    "LoPy"
} else if cfg!(feature = "sipy") {
    "SiPy"
} else {
    "WiPy"
};

#[cfg(feature = "lorawan")]
pub const LORAWAN_VERSION: &str = "1.0.2";

#[cfg(feature = "sigfox")]
pub const SIGFOX_VERSION: &str = "1.0.1";

/// Build identity, as `uname()` reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnameInfo {
    pub sysname: &'static str,
    pub nodename: &'static str,
    pub release: &'static str,
    pub version: String,
    pub machine: String,
    #[cfg(feature = "lorawan")]
    pub lorawan: &'static str,
    #[cfg(feature = "sigfox")]
    pub sigfox: &'static str,
}

impl UnameInfo {
    fn build() -> Self {
        let tag = option_env!("UOS_GIT_TAG").unwrap_or(concat!("v", env!("CARGO_PKG_VERSION")));
        let date = option_env!("UOS_BUILD_DATE").unwrap_or("unknown");
        Self {
            sysname: PLATFORM,
            nodename: PLATFORM,
            release: env!("CARGO_PKG_VERSION"),
            version: format!("{} on {}", tag, date),
            machine: format!("{} with {}", BOARD_NAME, MCU_NAME),
            #[cfg(feature = "lorawan")]
            lorawan: LORAWAN_VERSION,
            #[cfg(feature = "sigfox")]
            sigfox: SIGFOX_VERSION,
        }
    }

    /// Field names and values in tuple order.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        #[allow(unused_mut)]
        let mut fields = vec![
            ("sysname", self.sysname),
            ("nodename", self.nodename),
            ("release", self.release),
            ("version", self.version.as_str()),
            ("machine", self.machine.as_str()),
        ];
        #[cfg(feature = "lorawan")]
        fields.push(("lorawan", self.lorawan));
        #[cfg(feature = "sigfox")]
        fields.push(("sigfox", self.sigfox));
        fields
    }

    pub fn to_value(&self) -> Value {
        Value::AttrTuple(
            self.fields()
                .into_iter()
                .map(|(k, v)| (k.to_string(), Value::from(v)))
                .collect(),
        )
    }
}

lazy_static! {
    static ref UNAME_INFO: UnameInfo = UnameInfo::build();
}

pub fn uname() -> &'static UnameInfo {
    &UNAME_INFO
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_fields() {
        let info = uname();
        assert_eq!(info.sysname, "esp32");
        assert_eq!(info.nodename, "esp32");
        assert_eq!(info.release, env!("CARGO_PKG_VERSION"));
        assert!(info.version.contains(" on "));
        assert!(info.machine.ends_with(" with ESP32"));
    }

    #[test]
    fn test_field_order() {
        let names: Vec<&str> = uname().fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(&names[..5], &["sysname", "nodename", "release", "version", "machine"]);
        let expected = 5 + cfg!(feature = "lorawan") as usize + cfg!(feature = "sigfox") as usize;
        assert_eq!(names.len(), expected);
    }

    #[test]
    fn test_to_value() {
        let value = uname().to_value();
        assert_eq!(value.attr("sysname"), Some(&Value::from("esp32")));
        assert_eq!(value.item(0), Some(&Value::from("esp32")));
    }

    #[cfg(feature = "lorawan")]
    #[test]
    fn test_lorawan_field() {
        assert_eq!(uname().to_value().attr("lorawan"), Some(&Value::from(LORAWAN_VERSION)));
    }

    #[cfg(feature = "sigfox")]
    #[test]
    fn test_sigfox_field() {
        assert_eq!(uname().to_value().attr("sigfox"), Some(&Value::from(SIGFOX_VERSION)));
    }
}
