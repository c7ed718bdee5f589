use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use bytes::Bytes;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TrySendError};
use tracing::{debug, error, info, trace, warn};
use ubxlib_frame::{Cid, Frame, Packet, Prototype, RawFrame, UbxFrame, UbxParser};
use ubxlib_messages::ack::{ACK_ACK, ACK_NAK};
use ubxlib_messages::mga::MGA_ACK_DATA0;
use ubxlib_messages::{AckAck, AckNak, MgaAckData0};
use ubxlib_registry::{FrameRegistry, RegistryError};
use ubxlib_transport::Transport;

use crate::config::{check_retries, check_retry_delay, EngineConfig, MAX_RECEIVE_BACKOFF};
use crate::error::{EngineError, Result};

/// Outcome of a `set` request the receiver answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckStatus {
    Ack,
    Nak,
}

impl AckStatus {
    /// Turn a NAK for `request` into [`EngineError::Nak`].
    pub fn ensure_ack(self, request: Cid) -> Result<()> {
        match self {
            AckStatus::Ack => Ok(()),
            AckStatus::Nak => Err(EngineError::Nak(request)),
        }
    }
}

/// What the current transaction waits for.
enum Expect {
    /// A frame with the request's identity; configuration polls are
    /// followed by an acknowledge as well.
    Response { cid: Cid, needs_ack: bool },
    Ack { request: Cid },
    MgaAck { request: Cid },
}

impl Expect {
    fn filters(&self) -> Vec<Cid> {
        match self {
            Expect::Response {
                cid,
                needs_ack: true,
            } => vec![*cid, ACK_ACK, ACK_NAK],
            Expect::Response { cid, .. } => vec![*cid],
            Expect::Ack { .. } => vec![ACK_ACK, ACK_NAK],
            Expect::MgaAck { .. } => vec![MGA_ACK_DATA0],
        }
    }
}

enum Reply {
    Frame(Box<dyn UbxFrame>),
    Ack(AckStatus),
    MgaAck { info_code: u8 },
}

enum Wait {
    Reply(Reply),
    /// A corrupted frame arrived; `held` is a configuration response
    /// received before it.
    ChecksumError { held: Option<Reply> },
    Timeout,
}

/// Request/response engine for one receiver.
///
/// A background thread named `ubx-rx` drains the transport and hands raw
/// chunks over a bounded channel. The engine owns the stream parser and
/// decodes only inside a transaction, with the parser filter armed for the
/// identities that transaction expects. Outside a transaction received data
/// is dropped.
///
/// One transaction runs at a time; every operation takes `&mut self`.
pub struct Engine<T: Transport + 'static> {
    transport: Arc<T>,
    registry: FrameRegistry,
    config: EngineConfig,
    parser: UbxParser,
    chunks: Receiver<Bytes>,
    shutdown: Arc<AtomicBool>,
    rx_thread: Option<JoinHandle<()>>,
}

impl<T: Transport + 'static> Engine<T> {
    /// Start the receive thread and take ownership of `registry`.
    ///
    /// ACK-ACK, ACK-NAK and MGA-ACK-DATA0 are registered on top of whatever
    /// the registry already holds.
    pub fn new(transport: T, mut registry: FrameRegistry, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        registry.register::<AckAck>()?;
        registry.register::<AckNak>()?;
        registry.register::<MgaAckData0>()?;

        let transport = Arc::new(transport);
        let shutdown = Arc::new(AtomicBool::new(false));
        let (tx, rx) = crossbeam_channel::bounded(config.channel_capacity.max(1));

        let rx_thread = {
            let transport = Arc::clone(&transport);
            let shutdown = Arc::clone(&shutdown);
            let backoff = config.receive_backoff;
            thread::Builder::new()
                .name("ubx-rx".to_string())
                .spawn(move || receive_loop(&*transport, &tx, &shutdown, backoff))
                .map_err(EngineError::Spawn)?
        };
        info!(
            transport = transport.transport_name(),
            "receive thread started"
        );

        Ok(Self {
            transport,
            registry,
            parser: UbxParser::with_config(config.parser),
            config,
            chunks: rx,
            shutdown,
            rx_thread: Some(rx_thread),
        })
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn registry(&self) -> &FrameRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FrameRegistry {
        &mut self.registry
    }

    /// Register a response type for decoding.
    pub fn register<F: Prototype>(&mut self) -> Result<()> {
        Ok(self.registry.register::<F>()?)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn retries(&self) -> u32 {
        self.config.max_retries
    }

    pub fn retry_delay(&self) -> Duration {
        self.config.retry_delay
    }

    /// Replace the retry count, returning the previous one.
    pub fn set_retries(&mut self, retries: u32) -> Result<u32> {
        check_retries(retries)?;
        Ok(std::mem::replace(&mut self.config.max_retries, retries))
    }

    /// Replace the per-attempt wait, returning the previous one.
    pub fn set_retry_delay(&mut self, delay: Duration) -> Result<Duration> {
        check_retry_delay(delay)?;
        Ok(std::mem::replace(&mut self.config.retry_delay, delay))
    }

    /// Send `request` and wait for a frame with the same identity.
    ///
    /// The reply is decoded through the registry. An unregistered identity
    /// comes back as a [`RawFrame`]; a registered one that fails to decode is
    /// an error.
    pub fn poll(&mut self, request: &dyn UbxFrame) -> Result<Box<dyn UbxFrame>> {
        let cid = request.cid();
        let expect = Expect::Response {
            cid,
            needs_ack: cid.is_cfg(),
        };
        match self.transact(request, expect)? {
            Reply::Frame(frame) => Ok(frame),
            _ => Err(EngineError::UnexpectedFrame {
                cid,
                expected: "poll response",
            }),
        }
    }

    /// [`poll`](Self::poll) into a concrete response type, registering it
    /// first if needed.
    pub fn poll_as<F: Prototype>(&mut self, request: &dyn UbxFrame) -> Result<F> {
        self.registry.register::<F>()?;
        let frame = self.poll(request)?;
        let cid = frame.cid();
        match frame.into_any().downcast::<F>() {
            Ok(typed) => Ok(*typed),
            Err(_) => Err(EngineError::UnexpectedFrame {
                cid,
                expected: std::any::type_name::<F>(),
            }),
        }
    }

    /// Send `request` and wait for the acknowledge echoing its identity.
    ///
    /// A NAK is a valid answer and is returned, not raised; use
    /// [`AckStatus::ensure_ack`] to treat it as an error.
    pub fn set(&mut self, request: &dyn UbxFrame) -> Result<AckStatus> {
        let cid = request.cid();
        match self.transact(request, Expect::Ack { request: cid })? {
            Reply::Ack(status) => Ok(status),
            _ => Err(EngineError::UnexpectedFrame {
                cid,
                expected: "acknowledge",
            }),
        }
    }

    /// Send an assistance data message and wait for MGA-ACK-DATA0.
    ///
    /// # Panics
    ///
    /// Panics if `request` is not in the MGA class.
    pub fn set_mga(&mut self, request: &dyn UbxFrame) -> Result<()> {
        let cid = request.cid();
        assert_eq!(
            cid.class,
            Cid::CLASS_MGA,
            "set_mga requires an MGA request, got {cid}"
        );

        match self.transact(request, Expect::MgaAck { request: cid })? {
            Reply::MgaAck { info_code } if info_code == MgaAckData0::INFO_ACCEPTED => Ok(()),
            Reply::MgaAck { info_code } => {
                warn!(%cid, info_code, "assistance data rejected");
                Err(EngineError::MgaRejected { info_code })
            }
            _ => Err(EngineError::UnexpectedFrame {
                cid,
                expected: "MGA acknowledge",
            }),
        }
    }

    /// Transmit once without waiting for any reply.
    pub fn fire_and_forget(&mut self, request: &dyn UbxFrame) -> Result<()> {
        let wire = request.to_bytes()?;
        debug!(cid = %request.cid(), len = wire.len(), "sending without reply");
        self.transport.transmit(&wire)?;
        Ok(())
    }

    fn transact(&mut self, request: &dyn UbxFrame, expect: Expect) -> Result<Reply> {
        let wire = request.to_bytes()?;
        self.parser.set_filters(expect.filters());
        let result = self.run_attempts(request.cid(), &wire, &expect);
        self.parser.clear_filter();
        self.parser.empty_queue();
        result
    }

    fn run_attempts(&mut self, cid: Cid, wire: &[u8], expect: &Expect) -> Result<Reply> {
        let attempts = self.config.max_retries + 1;
        for attempt in 1..=attempts {
            self.flush_input();
            if let Err(err) = self.transport.transmit(wire) {
                warn!(%cid, attempt, error = %err, "transmit failed");
                continue;
            }

            match self.await_reply(expect)? {
                Wait::Reply(reply) => {
                    debug!(%cid, attempt, "transaction complete");
                    return Ok(reply);
                }
                Wait::ChecksumError { held: Some(reply) } => {
                    warn!(%cid, attempt, "checksum error after response, recovering link");
                    self.transport.recover();
                    return Ok(reply);
                }
                Wait::ChecksumError { held: None } => {
                    warn!(%cid, attempt, "checksum error, recovering link")
                }
                Wait::Timeout => warn!(%cid, attempt, "no reply, recovering link"),
            }
            self.transport.recover();
        }

        // Earlier revisions of this protocol stack disagreed on whether an
        // exhausted poll returns nothing or aborts. Report a typed timeout and
        // let the caller pick.
        Err(EngineError::Timeout { cid, attempts })
    }

    fn flush_input(&mut self) {
        if let Err(err) = self.transport.flush_input() {
            warn!(error = %err, "failed to flush input");
        }
        let stale = self.chunks.try_iter().count();
        if stale > 0 {
            trace!(stale, "discarded buffered chunks");
        }
        self.parser.restart();
        self.parser.empty_queue();
    }

    fn await_reply(&mut self, expect: &Expect) -> Result<Wait> {
        let deadline = Instant::now() + self.config.retry_delay;
        let mut response = None;

        loop {
            while let Some(packet) = self.parser.packet() {
                let frame = match packet {
                    Packet::ChecksumError => {
                        return Ok(Wait::ChecksumError {
                            held: response.take().map(Reply::Frame),
                        })
                    }
                    Packet::Frame(frame) => frame,
                };
                if let Some(reply) = self.on_frame(expect, frame, &mut response)? {
                    return Ok(Wait::Reply(reply));
                }
            }

            match self.chunks.recv_deadline(deadline) {
                Ok(chunk) => self.parser.process(&chunk),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Err(EngineError::ReceiverStopped),
            }
        }

        // Not every receiver generation acknowledges configuration polls.
        if let Some(frame) = response {
            debug!(cid = %frame.cid(), "no acknowledge after configuration response");
            return Ok(Wait::Reply(Reply::Frame(frame)));
        }
        Ok(Wait::Timeout)
    }

    fn on_frame(
        &self,
        expect: &Expect,
        frame: Frame,
        response: &mut Option<Box<dyn UbxFrame>>,
    ) -> Result<Option<Reply>> {
        match *expect {
            Expect::Response { cid, needs_ack } => {
                if frame.cid == cid {
                    let decoded = self.decode(frame)?;
                    if !needs_ack {
                        return Ok(Some(Reply::Frame(decoded)));
                    }
                    debug!(%cid, "response received, waiting for acknowledge");
                    *response = Some(decoded);
                    return Ok(None);
                }

                let Some((status, echo)) = acknowledgement(&frame) else {
                    return Ok(None);
                };
                if echo != cid {
                    error!(request = %cid, %echo, "acknowledge does not match request");
                    return Ok(None);
                }
                if response.is_none() {
                    debug!(%cid, ?status, "acknowledge before response, still waiting");
                    return Ok(None);
                }
                Ok(response.take().map(Reply::Frame))
            }

            Expect::Ack { request } => {
                let Some((status, echo)) = acknowledgement(&frame) else {
                    return Ok(None);
                };
                if echo != request {
                    error!(%request, %echo, "acknowledge does not match request");
                    return Ok(None);
                }
                if status == AckStatus::Nak {
                    warn!(%request, "request rejected with NAK");
                }
                Ok(Some(Reply::Ack(status)))
            }

            Expect::MgaAck { request } => {
                let Some((info_code, msg_id)) = mga_acknowledgement(&frame) else {
                    return Ok(None);
                };
                if msg_id != request.id {
                    error!(%request, msg_id, "assistance acknowledge does not match request");
                    return Ok(None);
                }
                Ok(Some(Reply::MgaAck { info_code }))
            }
        }
    }

    fn decode(&self, frame: Frame) -> Result<Box<dyn UbxFrame>> {
        match self.registry.build_with_data(frame.cid, &frame.payload) {
            Ok(decoded) => Ok(decoded),
            Err(RegistryError::NotRegistered(cid)) => {
                debug!(%cid, payload = frame.payload.len(), "frame not registered, returning raw frame");
                Ok(Box::new(RawFrame::from(frame)))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl<T: Transport + 'static> Drop for Engine<T> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Release);
        if let Some(handle) = self.rx_thread.take() {
            if handle.join().is_err() {
                warn!("receive thread panicked");
            }
        }
        debug!("receive thread stopped");
    }
}

impl<T: Transport + 'static> std::fmt::Debug for Engine<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("transport", &self.transport.transport_name())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Decode an ACK-ACK or ACK-NAK into its status and echoed request identity.
///
/// Other frames and malformed acknowledges yield `None`.
fn acknowledgement(frame: &Frame) -> Option<(AckStatus, Cid)> {
    let decoded = match frame.cid {
        ACK_ACK => {
            let mut ack = AckAck::default();
            ack.unpack(&frame.payload)
                .and_then(|()| ack.request())
                .map(|echo| (AckStatus::Ack, echo))
        }
        ACK_NAK => {
            let mut nak = AckNak::default();
            nak.unpack(&frame.payload)
                .and_then(|()| nak.request())
                .map(|echo| (AckStatus::Nak, echo))
        }
        _ => return None,
    };
    match decoded {
        Ok(ack) => Some(ack),
        Err(err) => {
            error!(cid = %frame.cid, error = %err, "malformed acknowledge, skipping");
            None
        }
    }
}

/// `(infoCode, msgId)` of an MGA-ACK-DATA0, `None` for anything else.
fn mga_acknowledgement(frame: &Frame) -> Option<(u8, u8)> {
    if frame.cid != MGA_ACK_DATA0 {
        return None;
    }
    let mut ack = MgaAckData0::default();
    let decoded = ack
        .unpack(&frame.payload)
        .and_then(|()| Ok((ack.info_code()?, ack.msg_id()?)));
    match decoded {
        Ok(fields) => Some(fields),
        Err(err) => {
            error!(cid = %frame.cid, error = %err, "malformed assistance acknowledge, skipping");
            None
        }
    }
}

fn receive_loop<T: Transport + ?Sized>(
    transport: &T,
    tx: &Sender<Bytes>,
    shutdown: &AtomicBool,
    backoff: Duration,
) {
    let mut failures = 0u32;
    let mut last_error: Option<String> = None;

    while !shutdown.load(Ordering::Acquire) {
        let received = transport.receive();
        if received.is_ok() && failures > 0 {
            info!(failures, "receive recovered");
            failures = 0;
            last_error = None;
        }
        match received {
            Ok(Some(chunk)) => match tx.try_send(chunk) {
                Ok(()) => {}
                Err(TrySendError::Full(chunk)) => {
                    trace!(len = chunk.len(), "no transaction draining input, dropping chunk");
                }
                Err(TrySendError::Disconnected(_)) => break,
            },
            Ok(None) => {}
            Err(err) => {
                let message = err.to_string();
                if last_error.as_deref() != Some(message.as_str()) {
                    warn!(error = %message, "receive failed");
                    last_error = Some(message);
                } else {
                    trace!(failures, "receive still failing");
                }
                failures = failures.saturating_add(1);
                thread::sleep(failure_backoff(backoff, failures));
            }
        }
    }
}

/// Pause after the `failures`-th consecutive receive error: `base` doubled
/// per failure, capped at [`MAX_RECEIVE_BACKOFF`].
fn failure_backoff(base: Duration, failures: u32) -> Duration {
    let doublings = failures.saturating_sub(1).min(16);
    base.saturating_mul(1 << doublings).min(MAX_RECEIVE_BACKOFF)
}
