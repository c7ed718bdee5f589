//! UBX-ACK-ACK / UBX-ACK-NAK: replies to configuration requests.
//!
//! Both carry the identity of the request they answer.

use ubxlib_frame::{Cid, FieldKind, FieldSet, Prototype, Result, Schema};

use crate::macros::{schema_default, ubx_frame};

pub const ACK_ACK: Cid = Cid::new(Cid::CLASS_ACK, 0x01);
pub const ACK_NAK: Cid = Cid::new(Cid::CLASS_ACK, 0x00);

fn ack_schema() -> Schema {
    Schema::new()
        .field("clsId", FieldKind::U1)
        .field("msgId", FieldKind::U1)
}

fn echoed(fields: &FieldSet) -> Result<Cid> {
    Ok(Cid::new(
        fields.get_u("clsId")? as u8,
        fields.get_u("msgId")? as u8,
    ))
}

fn echo(fields: &mut FieldSet, request: Cid) -> Result<()> {
    fields.set_u("clsId", u64::from(request.class))?;
    fields.set_u("msgId", u64::from(request.id))
}

/// The receiver accepted a request.
#[derive(Debug, Clone, PartialEq)]
pub struct AckAck {
    fields: FieldSet,
}

impl AckAck {
    pub fn schema() -> Schema {
        ack_schema()
    }

    pub fn for_request(request: Cid) -> Result<Self> {
        let mut ack = Self::default();
        echo(&mut ack.fields, request)?;
        Ok(ack)
    }

    /// Identity of the acknowledged request.
    pub fn request(&self) -> Result<Cid> {
        echoed(&self.fields)
    }
}

schema_default!(AckAck);
ubx_frame!(AckAck, ACK_ACK, "UBX-ACK-ACK");

impl Prototype for AckAck {
    const CID: Cid = ACK_ACK;
}

/// The receiver rejected a request.
#[derive(Debug, Clone, PartialEq)]
pub struct AckNak {
    fields: FieldSet,
}

impl AckNak {
    pub fn schema() -> Schema {
        ack_schema()
    }

    pub fn for_request(request: Cid) -> Result<Self> {
        let mut nak = Self::default();
        echo(&mut nak.fields, request)?;
        Ok(nak)
    }

    /// Identity of the rejected request.
    pub fn request(&self) -> Result<Cid> {
        echoed(&self.fields)
    }
}

schema_default!(AckNak);
ubx_frame!(AckNak, ACK_NAK, "UBX-ACK-NAK");

impl Prototype for AckNak {
    const CID: Cid = ACK_NAK;
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ubxlib_frame::UbxFrame;

    use super::*;

    #[test]
    fn ack_for_valset() {
        let ack = AckAck::for_request(Cid::new(0x06, 0x8a)).unwrap();
        assert_eq!(
            ack.to_bytes().unwrap().as_ref(),
            &[0xB5, 0x62, 0x05, 0x01, 0x02, 0x00, 0x06, 0x8a, 0x98, 0xC1]
        );
    }

    #[test]
    fn nak_decodes_rejected_identity() {
        let mut nak = AckNak::default();
        nak.unpack(&[0x06, 0x3E]).unwrap();
        assert_eq!(nak.request().unwrap(), Cid::new(0x06, 0x3E));
        assert_eq!(nak.name(), "UBX-ACK-NAK");
    }

    #[test]
    fn short_ack_is_a_decode_error() {
        let mut ack = AckAck::default();
        assert!(ack.unpack(&[0x06]).is_err());
    }
}
