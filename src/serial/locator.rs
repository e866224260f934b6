//! Serial device discovery
//!
//! Picks the device the reader is attached to. Enumeration order comes from
//! the OS; the first path containing the naming pattern wins. Nothing is
//! opened here.

use crate::error::{GateError, Result};
use log::{debug, info};

/// Information about an enumerated serial port
#[derive(Debug, Clone)]
pub struct PortInfo {
    pub path: String,
    pub port_type: PortType,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub serial_number: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
}

impl PortInfo {
    /// Port with only a path known
    pub fn bare(path: &str) -> Self {
        Self {
            path: path.to_string(),
            port_type: PortType::Unknown,
            manufacturer: None,
            product: None,
            serial_number: None,
            vid: None,
            pid: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PortType {
    UsbSerial,
    PciSerial,
    Bluetooth,
    Unknown,
}

impl std::fmt::Display for PortType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortType::UsbSerial => write!(f, "USB Serial"),
            PortType::PciSerial => write!(f, "PCI Serial"),
            PortType::Bluetooth => write!(f, "Bluetooth"),
            PortType::Unknown => write!(f, "Unknown"),
        }
    }
}

/// First port whose path contains `pattern`
pub fn locate(ports: &[PortInfo], pattern: &str) -> Result<String> {
    for port in ports {
        debug!("Considering {} ({})", port.path, port.port_type);
        if port.path.contains(pattern) {
            return Ok(port.path.clone());
        }
    }

    Err(GateError::NoDeviceFound {
        pattern: pattern.to_string(),
    })
}

/// Resolve the device path: an explicit port wins, otherwise enumerate and
/// locate. `enumerate` is only called when no explicit port is given.
pub fn resolve<E>(explicit: Option<&str>, pattern: &str, enumerate: E) -> Result<String>
where
    E: FnOnce() -> Result<Vec<PortInfo>>,
{
    if let Some(path) = explicit {
        info!("Using configured serial port: {}", path);
        return Ok(path.to_string());
    }

    let ports = enumerate()?;
    let path = locate(&ports, pattern)?;
    info!("Using serial port: {}", path);
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ports(paths: &[&str]) -> Vec<PortInfo> {
        paths.iter().map(|p| PortInfo::bare(p)).collect()
    }

    #[test]
    fn test_first_match_wins() {
        let found = locate(&ports(&["/dev/ttyUSB1", "/dev/ttyACM0"]), "tty").unwrap();
        assert_eq!(found, "/dev/ttyUSB1");
    }

    #[test]
    fn test_non_matching_skipped() {
        let found = locate(&ports(&["/dev/rfcomm0", "/dev/ttyS0"]), "tty").unwrap();
        assert_eq!(found, "/dev/ttyS0");
    }

    #[test]
    fn test_no_match() {
        let err = locate(&ports(&["COM3"]), "tty").unwrap_err();
        assert!(matches!(err, GateError::NoDeviceFound { ref pattern } if pattern == "tty"));

        assert!(locate(&[], "tty").is_err());
    }

    #[test]
    fn test_explicit_port_skips_enumeration() {
        let path = resolve(Some("/dev/ttyAMA0"), "tty", || {
            panic!("enumeration must not run")
        })
        .unwrap();
        assert_eq!(path, "/dev/ttyAMA0");
    }

    #[test]
    fn test_enumeration_error_propagates() {
        let err = resolve(None, "tty", || {
            Err(GateError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "udev unavailable",
            )))
        })
        .unwrap_err();
        assert!(matches!(err, GateError::Io(_)));
    }
}
