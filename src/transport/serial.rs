//! Serial port byte source
//!
//! The controller firmware writes its frames to a USB CDC serial line at
//! 115200 baud, 8N1. The read timeout bounds every blocking read, so the
//! session loop never spins and notices a stop request within two of them.

use crate::transport::{ByteSource, ReadSource, TransportError};
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::time::Duration;
use tracing::info;

pub const DEFAULT_BAUD_RATE: u32 = 115_200;
pub const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Connection parameters for the controller's serial line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Device path, e.g. /dev/ttyACM0 or COM3
    pub port: String,
    pub baud_rate: u32,
    /// Upper bound for a single blocking read
    pub timeout: Duration,
}

impl SerialSettings {
    pub fn new(port: &str) -> Self {
        Self {
            port: port.to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
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

/// Byte source backed by an open serial port
pub struct SerialSource {
    settings: SerialSettings,
    inner: ReadSource<Box<dyn SerialPort>>,
}

impl SerialSource {
    pub fn open(settings: SerialSettings) -> Result<Self, TransportError> {
        info!(
            "Opening serial port {} at {} baud (timeout {:?})",
            settings.port, settings.baud_rate, settings.timeout
        );

        let port = serialport::new(&settings.port, settings.baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(settings.timeout)
            .open()?;

        info!("Connected to {}", settings.port);
        Ok(Self {
            settings,
            inner: ReadSource::new(port),
        })
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }
}

impl ByteSource for SerialSource {
    fn read(&mut self, max_len: usize) -> Result<Option<Vec<u8>>, TransportError> {
        self.inner.read(max_len)
    }
}
