//! UBX frame envelope, typed field codec and byte-stream parsers.
//!
//! Every binary message on the wire is framed as:
//! - Two sync bytes `0xB5 0x62`
//! - A class byte and an id byte identifying the message
//! - A 2-byte little-endian payload length
//! - The payload
//! - A two byte Fletcher checksum over class through payload
//!
//! [`UbxParser`] extracts frames from arbitrary chunks of a byte stream,
//! [`NmeaParser`] counts text sentences on the same stream.

pub mod cfgkey;
pub mod checksum;
pub mod cid;
pub mod error;
pub mod fields;
pub mod frame;
pub mod nmea;
pub mod parser;
pub mod schema;

pub use cfgkey::{keys, CfgKey, CfgKeyData, CfgValue};
pub use checksum::Checksum;
pub use cid::Cid;
pub use error::{FrameError, Result};
pub use fields::{bit, with_bit, Field, FieldKind, FieldSet, Value};
pub use frame::{
    encode_frame, frame_checksum, AsAny, Frame, Prototype, RawFrame, UbxFrame, MAX_PAYLOAD,
    OVERHEAD, SYNC_1, SYNC_2,
};
pub use nmea::NmeaParser;
pub use parser::{Packet, ParserConfig, UbxParser, MAX_MESSAGE_LENGTH};
pub use schema::Schema;
