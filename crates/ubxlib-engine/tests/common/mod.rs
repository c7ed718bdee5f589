#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use ubxlib_engine::EngineConfig;
use ubxlib_frame::{Cid, Frame};
use ubxlib_transport::{BaudRate, Result, Transport, TransportError};

/// What the scripted receiver does after the n-th transmit (1-based).
pub enum Action {
    /// Queue these chunks for the receive side.
    Reply(Vec<Vec<u8>>),
    /// Report the transmit as failed.
    Fail,
    Silence,
}

type Responder = Box<dyn Fn(usize, &[u8]) -> Action + Send + Sync>;

/// In-memory transport driven by a responder closure.
pub struct ScriptedTransport {
    responder: Responder,
    inbox: Mutex<VecDeque<Bytes>>,
    sent: Mutex<Vec<Vec<u8>>>,
    transmits: AtomicUsize,
    recoveries: AtomicUsize,
    flushes: AtomicUsize,
    baudrate: AtomicU32,
}

impl ScriptedTransport {
    pub fn new(responder: impl Fn(usize, &[u8]) -> Action + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            inbox: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            transmits: AtomicUsize::new(0),
            recoveries: AtomicUsize::new(0),
            flushes: AtomicUsize::new(0),
            baudrate: AtomicU32::new(115_200),
        })
    }

    pub fn silent() -> Arc<Self> {
        Self::new(|_, _| Action::Silence)
    }

    /// Queue bytes as if the receiver sent them unprompted.
    pub fn inject(&self, chunk: &[u8]) {
        self.inbox
            .lock()
            .expect("inbox lock should not be poisoned")
            .push_back(Bytes::copy_from_slice(chunk));
    }

    pub fn transmits(&self) -> usize {
        self.transmits.load(Ordering::SeqCst)
    }

    pub fn recoveries(&self) -> usize {
        self.recoveries.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent
            .lock()
            .expect("sent lock should not be poisoned")
            .clone()
    }
}

impl Transport for ScriptedTransport {
    fn receive(&self) -> Result<Option<Bytes>> {
        let chunk = self
            .inbox
            .lock()
            .expect("inbox lock should not be poisoned")
            .pop_front();
        if chunk.is_none() {
            thread::sleep(Duration::from_millis(1));
        }
        Ok(chunk)
    }

    fn transmit(&self, data: &[u8]) -> Result<()> {
        let n = self.transmits.fetch_add(1, Ordering::SeqCst) + 1;
        self.sent
            .lock()
            .expect("sent lock should not be poisoned")
            .push(data.to_vec());
        match (self.responder)(n, data) {
            Action::Reply(chunks) => {
                for chunk in chunks {
                    self.inject(&chunk);
                }
                Ok(())
            }
            Action::Fail => Err(TransportError::ShortWrite {
                written: 0,
                expected: data.len(),
            }),
            Action::Silence => Ok(()),
        }
    }

    fn recover(&self) {
        self.recoveries.fetch_add(1, Ordering::SeqCst);
    }

    fn flush_input(&self) -> Result<()> {
        self.flushes.fetch_add(1, Ordering::SeqCst);
        self.inbox
            .lock()
            .expect("inbox lock should not be poisoned")
            .clear();
        Ok(())
    }

    fn transport_name(&self) -> &'static str {
        "scripted"
    }
}

impl BaudRate for ScriptedTransport {
    fn baudrate(&self) -> Result<u32> {
        Ok(self.baudrate.load(Ordering::SeqCst))
    }

    fn set_baudrate(&self, baudrate: u32) -> Result<()> {
        self.baudrate.store(baudrate, Ordering::SeqCst);
        Ok(())
    }
}

/// Wire bytes of a frame with a freshly computed checksum.
pub fn wire(class: u8, id: u8, payload: &[u8]) -> Vec<u8> {
    Frame::new(Cid::new(class, id), payload.to_vec())
        .to_bytes()
        .expect("test frame should encode")
        .to_vec()
}

pub fn ack(request: Cid) -> Vec<u8> {
    wire(0x05, 0x01, &[request.class, request.id])
}

pub fn nak(request: Cid) -> Vec<u8> {
    wire(0x05, 0x00, &[request.class, request.id])
}

/// Short waits so exhausted retries finish quickly.
pub fn fast_config(max_retries: u32) -> EngineConfig {
    EngineConfig {
        max_retries,
        retry_delay: Duration::from_millis(100),
        ..EngineConfig::default()
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
