//! Serial port configuration and connection management
//!
//! Wraps the `serialport` crate: enumeration, opening the reader's port, and
//! line-oriented reads for the gatekeeper.

use crate::error::{GateError, Result};
use crate::gate::Link;
use crate::serial::{PortInfo, PortType};
use colored::Colorize;
use log::debug;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{self, Read, Write};
use std::time::Duration;

/// Configuration for serial port connection
#[derive(Debug, Clone)]
pub struct PortConfig {
    /// Serial port path (e.g., /dev/ttyUSB0, /dev/ttyACM0)
    pub port_path: String,
    /// Baud rate (default: 115200)
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub parity: Parity,
    pub stop_bits: StopBits,
    pub flow_control: FlowControl,
    /// Read timeout, i.e. how long one poll may block
    pub timeout: Duration,
}

impl Default for PortConfig {
    fn default() -> Self {
        Self {
            port_path: String::from("/dev/ttyUSB0"),
            baud_rate: crate::config::DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            flow_control: FlowControl::None,
            timeout: Duration::from_millis(crate::config::DEFAULT_POLL_INTERVAL_MS),
        }
    }
}

impl PortConfig {
    pub fn new(port_path: &str) -> Self {
        Self {
            port_path: port_path.to_string(),
            ..Default::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Longest unterminated line kept before it is handed over as-is
pub const MAX_LINE_LEN: usize = 1024;

/// Open session with the reader. The port is closed when this is dropped.
pub struct SerialConnection {
    port: Box<dyn SerialPort>,
    config: PortConfig,
    /// Bytes received after the last complete line
    pending: Vec<u8>,
}

impl SerialConnection {
    pub fn open(config: PortConfig) -> Result<Self> {
        let port = serialport::new(&config.port_path, config.baud_rate)
            .data_bits(config.data_bits)
            .parity(config.parity)
            .stop_bits(config.stop_bits)
            .flow_control(config.flow_control)
            .timeout(config.timeout)
            .open()
            .map_err(|e| GateError::PortOpen {
                path: config.port_path.clone(),
                source: e.into(),
            })?;

        debug!(
            "Opened {} at {} baud (poll {:?})",
            config.port_path, config.baud_rate, config.timeout
        );

        Ok(Self::from_port(port, config))
    }

    /// Wrap an already opened port
    pub fn from_port(port: Box<dyn SerialPort>, config: PortConfig) -> Self {
        Self {
            port,
            config,
            pending: Vec::new(),
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.pending.drain(..=end).collect();
        line.pop();
        Some(line)
    }

    /// Whatever is buffered, terminated or not
    fn take_partial(&mut self) -> Option<Vec<u8>> {
        if self.pending.is_empty() {
            return None;
        }
        debug!("Read timed out mid-line, taking {} bytes", self.pending.len());
        Some(self.pending.drain(..).collect())
    }
}

impl Link for SerialConnection {
    /// A read that times out with bytes buffered ends the line there, like
    /// a timed-out `read_line`. Nothing carries over into the next request.
    fn poll_line(&mut self) -> io::Result<Option<Vec<u8>>> {
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }

        let mut buffer = [0u8; 256];
        match self.port.read(&mut buffer) {
            Ok(0) => Ok(self.take_partial()),
            Ok(n) => {
                self.pending.extend_from_slice(&buffer[..n]);
                match self.take_line() {
                    Some(line) => Ok(Some(line)),
                    None if self.pending.len() >= MAX_LINE_LEN => Ok(self.take_partial()),
                    None => Ok(None),
                }
            }
            Err(ref e) if e.kind() == io::ErrorKind::TimedOut => Ok(self.take_partial()),
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.port.write_all(data)?;
        self.port.flush()
    }
}

impl Drop for SerialConnection {
    fn drop(&mut self) {
        debug!("Closing serial port {}", self.config.port_path);
    }
}

/// List all available serial ports
pub fn list_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports().map_err(|e| GateError::Io(e.into()))?;

    let port_infos = ports
        .into_iter()
        .map(|p| {
            let (port_type, manufacturer, product, serial_number, vid, pid) = match p.port_type {
                serialport::SerialPortType::UsbPort(info) => (
                    PortType::UsbSerial,
                    info.manufacturer,
                    info.product,
                    info.serial_number,
                    Some(info.vid),
                    Some(info.pid),
                ),
                serialport::SerialPortType::PciPort => {
                    (PortType::PciSerial, None, None, None, None, None)
                }
                serialport::SerialPortType::BluetoothPort => {
                    (PortType::Bluetooth, None, None, None, None, None)
                }
                serialport::SerialPortType::Unknown => {
                    (PortType::Unknown, None, None, None, None, None)
                }
            };

            PortInfo {
                path: p.port_name,
                port_type,
                manufacturer,
                product,
                serial_number,
                vid,
                pid,
            }
        })
        .collect();

    Ok(port_infos)
}

/// Print formatted list of available serial ports, marking the one the
/// gatekeeper would pick
pub fn print_ports(pattern: &str) -> Result<()> {
    let ports = list_ports()?;

    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        println!("\n{}", "Troubleshooting tips:".cyan().bold());
        println!("  1. Connect the reader's USB cable");
        println!("  2. Check if the device is recognized: ls -la /dev/ttyUSB* /dev/ttyACM*");
        println!("  3. Add your user to the 'dialout' group: sudo usermod -aG dialout $USER");
        return Ok(());
    }

    let selected = crate::serial::locator::locate(&ports, pattern).ok();

    println!("{}", "Available Serial Ports:".green().bold());
    println!("{}", "=".repeat(60));

    for port in &ports {
        let marker = if selected.as_deref() == Some(port.path.as_str()) {
            " [selected]".green().bold().to_string()
        } else {
            String::new()
        };
        println!("\n{}: {}{}", "Port".cyan(), port.path.white().bold(), marker);
        println!("  Type: {}", port.port_type);

        if let Some(ref mfg) = port.manufacturer {
            println!("  Manufacturer: {}", mfg);
        }
        if let Some(ref prod) = port.product {
            println!("  Product: {}", prod);
        }
        if let Some(ref sn) = port.serial_number {
            println!("  Serial: {}", sn);
        }
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            println!("  VID:PID: {:04x}:{:04x}", vid, pid);
        }
    }

    println!("\n{}", "=".repeat(60));
    if selected.is_none() {
        println!(
            "{}",
            format!("No port matches '{}'; pass --port to choose one", pattern).yellow()
        );
    }

    Ok(())
}
