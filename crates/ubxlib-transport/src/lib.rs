//! Byte transports for u-blox receivers.
//!
//! Provides a unified interface over the ways a receiver can be reached:
//! - A serial line opened directly (feature `serial`)
//! - A gpsd instance that owns the line (Unix only)
//!
//! This is the lowest layer of ubxlib. The transaction engine drives any
//! [`Transport`] implementation.

pub mod error;
pub mod traits;

#[cfg(unix)]
pub mod gpsd;
#[cfg(feature = "serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use traits::{BaudRate, Transport};

#[cfg(unix)]
pub use gpsd::{GpsdConfig, GpsdTransport};
#[cfg(feature = "serial")]
pub use serial::{SerialConfig, SerialTransport};
