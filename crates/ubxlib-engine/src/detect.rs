//! Bitrate detection for serial-attached receivers.
//!
//! Passive detection listens at each candidate rate and counts well-formed
//! NMEA sentences and UBX frames; it sends nothing. Active probing polls the
//! UART port configuration and compares the reported rate. Receivers with
//! protocol version 18 and later disable their UART RX after repeated frame
//! errors, so prefer the passive scan.

use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};
use ubxlib_frame::{NmeaParser, UbxParser};
use ubxlib_messages::{CfgPrt, CfgPrtPoll};
use ubxlib_transport::{BaudRate, Transport};

use crate::engine::Engine;
use crate::error::{EngineError, Result};

/// Parameters for [`detect_bitrate`] and [`Engine::probe_bitrate`].
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Rates to try, most likely first.
    pub candidates: Vec<u32>,

    /// Receive calls per candidate in a passive scan. With a 100 ms read
    /// timeout and the default once-per-second output, 15 reads cover one
    /// output cycle.
    pub reads: usize,

    /// Valid frames required to accept a candidate.
    pub min_frames: u64,

    /// Per-attempt wait of an active probe.
    pub probe_timeout: Duration,

    /// Pause between active probes.
    pub throttle: Duration,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            candidates: vec![115_200, 9_600],
            reads: 15,
            min_frames: 2,
            probe_timeout: Duration::from_millis(1500),
            throttle: Duration::from_secs(1),
        }
    }
}

/// Listen at each candidate bitrate until enough valid frames arrive.
///
/// Must run before an [`Engine`] takes over the transport. Returns `None`
/// when no candidate produced frames; the transport is left at the last
/// candidate.
pub fn detect_bitrate<T>(transport: &T, config: &DetectConfig) -> Result<Option<u32>>
where
    T: Transport + BaudRate + ?Sized,
{
    for &baudrate in &config.candidates {
        info!(baudrate, "checking bitrate");
        transport.set_baudrate(baudrate)?;
        transport.flush_input()?;

        if scan(transport, config)? {
            info!(baudrate, "bitrate detected");
            return Ok(Some(baudrate));
        }
        debug!(baudrate, "no frames at this bitrate");
    }
    Ok(None)
}

fn scan<T: Transport + ?Sized>(transport: &T, config: &DetectConfig) -> Result<bool> {
    let mut nmea = NmeaParser::new();
    // No filter armed: frames are verified and counted, never queued.
    let mut ubx = UbxParser::new();

    for _ in 0..config.reads {
        if let Some(chunk) = transport.receive()? {
            nmea.process(&chunk);
            ubx.process(&chunk);
        }
        if nmea.frames_rx() + ubx.frames_rx() >= config.min_frames {
            debug!(
                nmea = nmea.frames_rx(),
                ubx = ubx.frames_rx(),
                "frames received"
            );
            return Ok(true);
        }
    }
    Ok(false)
}

impl<T: Transport + BaudRate + 'static> Engine<T> {
    /// Find the bitrate by polling UBX-CFG-PRT at each candidate.
    ///
    /// Retries drop to one and the per-attempt wait to
    /// `config.probe_timeout` for the duration of the probe.
    pub fn probe_bitrate(&mut self, config: &DetectConfig) -> Result<Option<u32>> {
        let retries = self.set_retries(1)?;
        let delay = match self.set_retry_delay(config.probe_timeout) {
            Ok(delay) => delay,
            Err(err) => {
                self.set_retries(retries)?;
                return Err(err);
            }
        };

        let result = self.probe_candidates(config);

        self.set_retries(retries)?;
        self.set_retry_delay(delay)?;
        result
    }

    fn probe_candidates(&mut self, config: &DetectConfig) -> Result<Option<u32>> {
        let poll = CfgPrtPoll::uart()?;

        for (index, &baudrate) in config.candidates.iter().enumerate() {
            if index > 0 {
                thread::sleep(config.throttle);
            }
            info!(baudrate, "probing bitrate");
            self.transport().set_baudrate(baudrate)?;

            match self.poll_as::<CfgPrt>(&poll) {
                Ok(port) => {
                    let reported = port.baudrate()?;
                    if reported == baudrate {
                        info!(baudrate, "bitrate confirmed by receiver");
                        return Ok(Some(baudrate));
                    }
                    warn!(baudrate, reported, "reported bitrate does not match");
                }
                Err(EngineError::Timeout { .. }) => debug!(baudrate, "no answer at this bitrate"),
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }
}
