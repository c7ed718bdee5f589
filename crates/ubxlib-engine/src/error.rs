use std::time::Duration;

use ubxlib_frame::{Cid, FrameError};
use ubxlib_registry::RegistryError;
use ubxlib_transport::TransportError;

use crate::config::{MAX_RETRIES, MAX_RETRY_DELAY};

/// Errors that can occur while talking to a receiver.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Every attempt ended without the expected reply.
    #[error("no reply to {cid} after {attempts} attempts")]
    Timeout { cid: Cid, attempts: u32 },

    /// The receiver rejected a request with ACK-NAK.
    #[error("request {0} rejected by receiver")]
    Nak(Cid),

    /// The receiver answered assistance data with a non-zero info code.
    #[error("assistance data rejected (info code {info_code})")]
    MgaRejected { info_code: u8 },

    #[error("retry count {0} out of range (max {max})", max = MAX_RETRIES)]
    InvalidRetries(u32),

    #[error("retry delay {0:?} out of range (max {max:?})", max = MAX_RETRY_DELAY)]
    InvalidRetryDelay(Duration),

    /// A reply decoded to a different type than the caller asked for.
    #[error("reply {cid} is not a {expected}")]
    UnexpectedFrame { cid: Cid, expected: &'static str },

    /// The receive thread is gone; no further replies can arrive.
    #[error("receive thread stopped")]
    ReceiverStopped,

    #[error("failed to start receive thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
