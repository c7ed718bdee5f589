use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::error::{Result, TransportError};
use crate::traits::Transport;

/// Request that switches the data stream to raw receiver output.
pub const WATCH_RAW: &[u8] = br#"?WATCH={"enable":true,"raw":2}"#;

/// Configuration for [`GpsdTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpsdConfig {
    /// gpsd TCP data stream.
    pub data_addr: SocketAddr,
    /// gpsd control socket accepting raw frames for a device.
    pub control_socket: PathBuf,
    /// Device to bind to; the first reported device when `None`.
    pub device: Option<String>,
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
    /// How long to wait for the device report after enabling the stream.
    pub enable_timeout: Duration,
}

impl Default for GpsdConfig {
    fn default() -> Self {
        Self {
            data_addr: SocketAddr::from(([127, 0, 0, 1], 2947)),
            control_socket: PathBuf::from("/var/run/gpsd.sock"),
            device: None,
            read_timeout: Duration::from_millis(250),
            connect_timeout: Duration::from_secs(1),
            enable_timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "class")]
enum Report {
    #[serde(rename = "VERSION")]
    Version { release: String },
    #[serde(rename = "DEVICES")]
    Devices { devices: Vec<DeviceInfo> },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct DeviceInfo {
    path: String,
}

/// Pick the device to use from a `DEVICES` report.
fn select_device(devices: &[DeviceInfo], wanted: Option<&str>) -> Option<String> {
    for device in devices {
        debug!(path = %device.path, "gpsd device");
    }
    match wanted {
        Some(wanted) => devices
            .iter()
            .find(|device| device.path == wanted)
            .map(|device| device.path.clone()),
        None => devices.first().map(|device| device.path.clone()),
    }
}

/// Receiver access shared with a running gpsd.
///
/// Raw receiver output is read from gpsd's watch stream; frames are sent
/// through the control socket, hex encoded, addressed to the selected
/// device.
#[derive(Debug)]
pub struct GpsdTransport {
    config: GpsdConfig,
    stream: TcpStream,
    device: String,
    /// Stream bytes that arrived together with the device report.
    backlog: Mutex<Vec<u8>>,
    errors: AtomicU32,
}

impl GpsdTransport {
    /// Connect to gpsd, enable raw output and select a device.
    pub fn connect(config: GpsdConfig) -> Result<Self> {
        info!(addr = %config.data_addr, "connecting to gpsd");
        let mut stream = TcpStream::connect_timeout(&config.data_addr, config.connect_timeout)
            .map_err(|e| TransportError::Connect {
                addr: config.data_addr,
                source: e,
            })?;
        stream.set_read_timeout(Some(config.read_timeout))?;

        stream.write_all(WATCH_RAW)?;
        let (device, backlog) = Self::wait_for_device(&mut stream, &config)?;
        info!(%device, "gpsd device selected");

        Ok(Self {
            config,
            stream,
            device,
            backlog: Mutex::new(backlog),
            errors: AtomicU32::new(0),
        })
    }

    /// The device frames are sent to.
    pub fn device(&self) -> &str {
        &self.device
    }

    fn wait_for_device(stream: &mut TcpStream, config: &GpsdConfig) -> Result<(String, Vec<u8>)> {
        let deadline = Instant::now() + config.enable_timeout;
        let mut pending: Vec<u8> = Vec::new();
        let mut buf = [0u8; 8192];

        while Instant::now() < deadline {
            let n = match stream.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if is_timeout(&e) => continue,
                Err(e) => return Err(e.into()),
            };
            pending.extend_from_slice(&buf[..n]);

            while let Some(pos) = pending.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = pending.drain(..=pos).collect();
                if let Some(device) = handle_line(&line, config.device.as_deref()) {
                    return Ok((device, pending));
                }
            }
        }

        let wanted = config.device.clone().unwrap_or_else(|| "any".to_string());
        error!(%wanted, "cannot connect to desired device");
        Err(TransportError::DeviceNotFound(wanted))
    }
}

/// Interpret one line of the watch stream before raw output starts.
/// Non-JSON lines (NMEA or binary data) are skipped.
fn handle_line(line: &[u8], wanted: Option<&str>) -> Option<String> {
    let text = std::str::from_utf8(line).ok()?.trim();
    let report: Report = serde_json::from_str(text).ok()?;
    match report {
        Report::Version { release } => {
            debug!(%release, "gpsd version");
            None
        }
        Report::Devices { devices } => {
            let selected = select_device(&devices, wanted);
            if selected.is_none() {
                error!(?wanted, "device not reported by gpsd");
            }
            selected
        }
        Report::Other => None,
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

impl Transport for GpsdTransport {
    fn receive(&self) -> Result<Option<Bytes>> {
        {
            let mut backlog = self.backlog.lock().unwrap_or_else(|e| e.into_inner());
            if !backlog.is_empty() {
                return Ok(Some(Bytes::from(std::mem::take(&mut *backlog))));
            }
        }

        let mut buf = vec![0u8; 8192];
        match (&self.stream).read(&mut buf) {
            Ok(0) => Err(TransportError::Io(std::io::Error::new(
                ErrorKind::UnexpectedEof,
                "gpsd closed the connection",
            ))),
            Ok(n) => {
                buf.truncate(n);
                Ok(Some(Bytes::from(buf)))
            }
            Err(e) if is_timeout(&e) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn transmit(&self, data: &[u8]) -> Result<()> {
        let path = &self.config.control_socket;
        let mut control = UnixStream::connect(path).map_err(|e| TransportError::Control {
            path: path.clone(),
            source: e,
        })?;
        control.set_read_timeout(Some(self.config.connect_timeout))?;

        let command = format!("&{}={}", self.device, hex::encode(data));
        debug!(%command, "sending control message");
        control.write_all(command.as_bytes())?;

        let mut reply = [0u8; 512];
        let n = control.read(&mut reply)?;
        let response = String::from_utf8_lossy(&reply[..n]).trim().to_string();
        debug!(%response, "control response");

        if response.contains("ERROR") {
            let errors = self.errors.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(errors, "command not accepted by gpsd");
            return Err(TransportError::Rejected(response));
        }
        self.errors.store(0, Ordering::Relaxed);
        Ok(())
    }

    fn recover(&self) {
        // the line is owned by gpsd
        debug!("no recovery available through gpsd");
    }

    fn transport_name(&self) -> &'static str {
        "gpsd"
    }
}
