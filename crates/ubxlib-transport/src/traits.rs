use bytes::Bytes;

use crate::error::Result;

/// A byte link to a receiver.
///
/// All methods take `&self`: one instance is shared between the thread that
/// drains [`receive`](Transport::receive) and the caller that transmits
/// requests. Implementations synchronize internally.
pub trait Transport: Send + Sync {
    /// Read whatever bytes are available.
    ///
    /// Blocks for at most the transport's read timeout and returns
    /// `Ok(None)` when nothing arrived in that window.
    fn receive(&self) -> Result<Option<Bytes>>;

    /// Send a complete frame. Succeeds only if every byte was accepted.
    fn transmit(&self, data: &[u8]) -> Result<()>;

    /// Try to bring a stuck link back to life. Failures are logged.
    fn recover(&self);

    /// Discard bytes received but not yet read.
    fn flush_input(&self) -> Result<()> {
        Ok(())
    }

    /// Transport name for diagnostics.
    fn transport_name(&self) -> &'static str;
}

/// A transport whose line speed can be changed.
pub trait BaudRate {
    fn baudrate(&self) -> Result<u32>;

    fn set_baudrate(&self, baudrate: u32) -> Result<()>;
}

impl<T: BaudRate + ?Sized> BaudRate for std::sync::Arc<T> {
    fn baudrate(&self) -> Result<u32> {
        (**self).baudrate()
    }

    fn set_baudrate(&self, baudrate: u32) -> Result<()> {
        (**self).set_baudrate(baudrate)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn receive(&self) -> Result<Option<Bytes>> {
        (**self).receive()
    }

    fn transmit(&self, data: &[u8]) -> Result<()> {
        (**self).transmit(data)
    }

    fn recover(&self) {
        (**self).recover()
    }

    fn flush_input(&self) -> Result<()> {
        (**self).flush_input()
    }

    fn transport_name(&self) -> &'static str {
        (**self).transport_name()
    }
}
