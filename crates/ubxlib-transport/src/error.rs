use std::net::SocketAddr;
use std::path::PathBuf;

/// Errors that can occur in receiver transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the serial device.
    #[error("failed to open {device}: {source}")]
    Open {
        device: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to connect to the gpsd data stream.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// Failed to connect to the gpsd control socket.
    #[error("failed to connect to control socket {path}: {source}")]
    Control {
        path: PathBuf,
        source: std::io::Error,
    },

    /// An I/O error occurred on the transport.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial driver reported an error.
    #[cfg(feature = "serial")]
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// A gpsd report could not be decoded.
    #[error("invalid gpsd report: {0}")]
    Json(#[from] serde_json::Error),

    /// gpsd did not report the requested device.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The peer refused a transmitted frame.
    #[error("transmission rejected: {0}")]
    Rejected(String),

    /// Fewer bytes were written than requested.
    #[error("short write ({written} of {expected} bytes)")]
    ShortWrite { written: usize, expected: usize },
}

pub type Result<T> = std::result::Result<T, TransportError>;
