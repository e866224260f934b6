//! Serial link to the reader
//!
//! This module provides:
//! - Port discovery by device naming convention
//! - Port configuration and the duplex connection used by the gatekeeper
//!   (requires the `serial` feature)

pub mod locator;
#[cfg(feature = "serial")]
pub mod port;

pub use locator::{PortInfo, PortType};
#[cfg(feature = "serial")]
pub use port::{PortConfig, SerialConnection};
