use std::io::{ErrorKind, Read, Write};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use bytes::Bytes;
use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::{debug, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::{BaudRate, Transport};

/// Configuration for [`SerialTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Device path, e.g. `/dev/ttyS3`.
    pub device: String,
    pub baudrate: u32,
    /// Upper bound for a single [`Transport::receive`] call.
    pub read_timeout: Duration,
    /// Intermediate bitrate applied during [`Transport::recover`].
    pub recovery_baudrate: u32,
    /// Bytes requested per read.
    pub read_chunk: usize,
}

impl SerialConfig {
    pub const DEFAULT_BAUDRATE: u32 = 115_200;
    pub const RECOVERY_BAUDRATE: u32 = 9_600;

    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Self::default()
        }
    }

    pub fn with_baudrate(mut self, baudrate: u32) -> Self {
        self.baudrate = baudrate;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            baudrate: Self::DEFAULT_BAUDRATE,
            read_timeout: Duration::from_millis(100),
            recovery_baudrate: Self::RECOVERY_BAUDRATE,
            read_chunk: 1024,
        }
    }
}

/// Serial line transport, 8N1 without flow control.
///
/// Reading and writing use separate handles to the same device so the
/// receive thread never blocks a transmission.
pub struct SerialTransport {
    config: SerialConfig,
    reader: Mutex<Box<dyn SerialPort>>,
    writer: Mutex<Box<dyn SerialPort>>,
}

impl SerialTransport {
    /// Open the device described by `config`.
    pub fn open(config: SerialConfig) -> Result<Self> {
        let writer = serialport::new(&config.device, config.baudrate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(config.read_timeout)
            .open()
            .map_err(|e| TransportError::Open {
                device: config.device.clone(),
                source: e.into(),
            })?;
        let reader = writer.try_clone()?;

        info!(device = %config.device, baudrate = config.baudrate, "opened serial port");

        Ok(Self {
            config,
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        })
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    fn writer(&self) -> MutexGuard<'_, Box<dyn SerialPort>> {
        // poisoning does not invalidate the port handle
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reader(&self) -> MutexGuard<'_, Box<dyn SerialPort>> {
        self.reader.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Transport for SerialTransport {
    fn receive(&self) -> Result<Option<Bytes>> {
        let mut buf = vec![0u8; self.config.read_chunk];
        match self.reader().read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(Bytes::from(buf)))
            }
            Err(e) if e.kind() == ErrorKind::TimedOut || e.kind() == ErrorKind::WouldBlock => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn transmit(&self, data: &[u8]) -> Result<()> {
        let mut port = self.writer();
        let written = port.write(data)?;
        if written != data.len() {
            return Err(TransportError::ShortWrite {
                written,
                expected: data.len(),
            });
        }
        port.flush()?;
        Ok(())
    }

    /// Reprogram the line speed while the port stays open. Some UARTs
    /// resume reception only after this sequence.
    fn recover(&self) {
        let mut port = self.writer();
        let current = match port.baud_rate() {
            Ok(baudrate) => baudrate,
            Err(e) => {
                warn!(error = %e, "cannot read bitrate, skipping recovery");
                return;
            }
        };

        warn!(device = %self.config.device, "performing serial recovery");
        if let Err(e) = port.set_baud_rate(self.config.recovery_baudrate) {
            warn!(error = %e, "recovery bitrate change failed");
        }
        if let Err(e) = port.set_baud_rate(current) {
            warn!(error = %e, baudrate = current, "failed to restore bitrate");
        }
    }

    fn flush_input(&self) -> Result<()> {
        self.reader().clear(ClearBuffer::Input)?;
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "serial"
    }
}

impl BaudRate for SerialTransport {
    fn baudrate(&self) -> Result<u32> {
        Ok(self.writer().baud_rate()?)
    }

    fn set_baudrate(&self, baudrate: u32) -> Result<()> {
        debug!(baudrate, "changing bitrate");
        self.writer().set_baud_rate(baudrate)?;
        Ok(())
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("device", &self.config.device)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_receiver_defaults() {
        let config = SerialConfig::new("/dev/ttyS3");
        assert_eq!(config.device, "/dev/ttyS3");
        assert_eq!(config.baudrate, 115_200);
        assert_eq!(config.read_timeout, Duration::from_millis(100));
        assert_eq!(config.recovery_baudrate, 9_600);
    }

    #[test]
    fn with_baudrate_overrides_default() {
        let config = SerialConfig::new("/dev/ttyUSB0").with_baudrate(9_600);
        assert_eq!(config.baudrate, 9_600);
    }

    #[test]
    fn open_missing_device_fails() {
        let config = SerialConfig::new("/dev/ubxlib-does-not-exist");
        let result = SerialTransport::open(config);
        assert!(matches!(result, Err(TransportError::Open { .. })));
    }
}
