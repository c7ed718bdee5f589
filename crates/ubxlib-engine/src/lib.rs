//! Transactions with u-blox receivers over any [`Transport`].
//!
//! The [`Engine`] owns the stream parser and a background receive thread.
//! Each operation arms the parser for the frames it expects, transmits, and
//! waits with bounded retries:
//!
//! - [`Engine::poll`] waits for a frame with the request's identity
//! - [`Engine::set`] waits for ACK-ACK or ACK-NAK echoing the request
//! - [`Engine::set_mga`] waits for MGA-ACK-DATA0
//! - [`Engine::fire_and_forget`] transmits once and returns
//!
//! A timeout or a checksum error triggers [`Transport::recover`] before the
//! next attempt. When every attempt fails the operation returns
//! [`EngineError::Timeout`].
//!
//! [`Transport`]: ubxlib_transport::Transport
//! [`Transport::recover`]: ubxlib_transport::Transport::recover

pub mod config;
pub mod detect;
pub mod engine;
pub mod error;

pub use config::{EngineConfig, MAX_RECEIVE_BACKOFF, MAX_RETRIES, MAX_RETRY_DELAY};
pub use detect::{detect_bitrate, DetectConfig};
pub use engine::{AckStatus, Engine};
pub use error::{EngineError, Result};
