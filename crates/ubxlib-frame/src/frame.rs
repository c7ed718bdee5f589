use std::any::Any;
use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::debug;

use crate::checksum::Checksum;
use crate::cid::Cid;
use crate::error::{FrameError, Result};
use crate::fields::FieldSet;

/// First sync byte.
pub const SYNC_1: u8 = 0xB5;

/// Second sync byte.
pub const SYNC_2: u8 = 0x62;

/// Envelope overhead: sync (2) + class (1) + id (1) + length (2) + checksum (2).
pub const OVERHEAD: usize = 8;

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD: usize = u16::MAX as usize;

/// A raw frame: identity and payload as seen on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub cid: Cid,
    pub payload: Bytes,
}

impl Frame {
    pub fn new(cid: Cid, payload: impl Into<Bytes>) -> Self {
        Self {
            cid,
            payload: payload.into(),
        }
    }

    /// Total wire size including sync bytes and checksum.
    pub fn wire_size(&self) -> usize {
        OVERHEAD + self.payload.len()
    }

    /// Serialize with a freshly computed checksum.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_frame(self.cid, &self.payload, &mut dst)?;
        Ok(dst.freeze())
    }
}

/// Checksum over class, id, length and payload, in wire order.
pub fn frame_checksum(cid: Cid, payload: &[u8]) -> (u8, u8) {
    let len = payload.len() as u16;
    let mut checksum = Checksum::new();
    checksum.add(cid.class);
    checksum.add(cid.id);
    checksum.add((len & 0xFF) as u8);
    checksum.add((len >> 8) as u8);
    checksum.update(payload);
    checksum.value()
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌────────────┬───────┬────┬──────────┬──────────────┬────────────┐
/// │ Sync (2B)  │ Class │ Id │ Length   │ Payload      │ CK_A CK_B  │
/// │ 0xB5 0x62  │ (1B)  │(1B)│ (2B LE)  │ (Length B)   │            │
/// └────────────┴───────┴────┴──────────┴──────────────┴────────────┘
/// ```
///
/// The checksum covers class through payload.
pub fn encode_frame(cid: Cid, payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    let (ck_a, ck_b) = frame_checksum(cid, payload);

    dst.reserve(OVERHEAD + payload.len());
    dst.put_u8(SYNC_1);
    dst.put_u8(SYNC_2);
    dst.put_u8(cid.class);
    dst.put_u8(cid.id);
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    dst.put_u8(ck_a);
    dst.put_u8(ck_b);
    Ok(())
}

/// Conversion into `Any` for downcasting boxed frames to their concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A typed UBX message backed by a [`FieldSet`].
pub trait UbxFrame: AsAny + fmt::Debug + Send {
    /// Identity of this message.
    fn cid(&self) -> Cid;

    /// Human readable message name.
    fn name(&self) -> &'static str {
        "UBX"
    }

    fn fields(&self) -> &FieldSet;

    fn fields_mut(&mut self) -> &mut FieldSet;

    /// Payload bytes in field declaration order.
    fn pack(&self) -> Result<Bytes> {
        self.fields().pack()
    }

    /// Decode a payload into this frame's fields.
    fn unpack(&mut self, payload: &[u8]) -> Result<()> {
        let rest = self.fields_mut().unpack(payload)?;
        if !rest.is_empty() {
            debug!(cid = %self.cid(), trailing = rest.len(), "ignoring trailing payload bytes");
        }
        Ok(())
    }

    /// Full wire representation with envelope and checksum.
    fn to_bytes(&self) -> Result<Bytes> {
        Frame::new(self.cid(), self.pack()?).to_bytes()
    }
}

/// A frame type with a fixed identity that can be built with no arguments.
pub trait Prototype: UbxFrame + Default + 'static {
    const CID: Cid;
}

/// Opaque frame used when no typed decoder is registered for an identity.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    cid: Cid,
    payload: Bytes,
    fields: FieldSet,
}

impl RawFrame {
    pub fn new(cid: Cid, payload: impl Into<Bytes>) -> Self {
        Self {
            cid,
            payload: payload.into(),
            fields: FieldSet::new(),
        }
    }

    pub fn payload(&self) -> &Bytes {
        &self.payload
    }
}

impl From<Frame> for RawFrame {
    fn from(frame: Frame) -> Self {
        Self::new(frame.cid, frame.payload)
    }
}

impl UbxFrame for RawFrame {
    fn cid(&self) -> Cid {
        self.cid
    }

    fn name(&self) -> &'static str {
        "UBX-RAW"
    }

    fn fields(&self) -> &FieldSet {
        &self.fields
    }

    fn fields_mut(&mut self) -> &mut FieldSet {
        &mut self.fields
    }

    fn pack(&self) -> Result<Bytes> {
        Ok(self.payload.clone())
    }

    fn unpack(&mut self, payload: &[u8]) -> Result<()> {
        self.payload = Bytes::copy_from_slice(payload);
        Ok(())
    }
}
