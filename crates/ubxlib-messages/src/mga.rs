//! Assisted data messages (UBX-MGA-*).

use std::time::Duration;

use ubxlib_frame::{Cid, FieldKind, FieldSet, Prototype, Result, Schema};

use crate::macros::{schema_default, ubx_frame};

pub const MGA_ACK_DATA0: Cid = Cid::new(Cid::CLASS_MGA, 0x60);
pub const MGA_INI_TIME_UTC: Cid = Cid::new(Cid::CLASS_MGA, 0x40);

/// UBX-MGA-ACK-DATA0: the receiver's verdict on an assisted data message.
#[derive(Debug, Clone, PartialEq)]
pub struct MgaAckData0 {
    fields: FieldSet,
}

impl MgaAckData0 {
    /// The data was accepted.
    pub const INFO_ACCEPTED: u8 = 0;
    pub const INFO_NO_TIME: u8 = 1;
    pub const INFO_VERSION_UNSUPPORTED: u8 = 2;
    pub const INFO_SIZE_MISMATCH: u8 = 3;
    pub const INFO_STORE_FAILED: u8 = 4;
    pub const INFO_NOT_READY: u8 = 5;
    pub const INFO_TYPE_UNKNOWN: u8 = 6;

    pub fn schema() -> Schema {
        Schema::new()
            .field("type", FieldKind::U1)
            .field("version", FieldKind::U1)
            .field("infoCode", FieldKind::U1)
            .field("msgId", FieldKind::U1)
            .field("msgPayloadStart", FieldKind::X4)
    }

    pub fn info_code(&self) -> Result<u8> {
        Ok(self.fields.get_u("infoCode")? as u8)
    }

    /// Message id of the acknowledged assisted data message.
    pub fn msg_id(&self) -> Result<u8> {
        Ok(self.fields.get_u("msgId")? as u8)
    }

    pub fn accepted(&self) -> Result<bool> {
        Ok(self.info_code()? == Self::INFO_ACCEPTED)
    }
}

schema_default!(MgaAckData0);
ubx_frame!(MgaAckData0, MGA_ACK_DATA0, "UBX-MGA-ACK-DATA0");

impl Prototype for MgaAckData0 {
    const CID: Cid = MGA_ACK_DATA0;
}

/// Calendar time in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub nanos: u32,
}

/// UBX-MGA-INI-TIME_UTC: initial time assistance.
#[derive(Debug, Clone, PartialEq)]
pub struct MgaIniTimeUtc {
    fields: FieldSet,
}

impl MgaIniTimeUtc {
    pub const MSG_TYPE: u8 = 0x10;

    pub fn schema() -> Schema {
        Schema::new()
            .field("type", FieldKind::U1)
            .field("version", FieldKind::U1)
            .field("ref", FieldKind::X1)
            .field("leapSecs", FieldKind::I1)
            .field("year", FieldKind::U2)
            .field("month", FieldKind::U1)
            .field("day", FieldKind::U1)
            .field("hour", FieldKind::U1)
            .field("minute", FieldKind::U1)
            .field("second", FieldKind::U1)
            .field("res1", FieldKind::Padding(1))
            .field("ns", FieldKind::U4)
            .field("tAccS", FieldKind::U2)
            .field("res2", FieldKind::Padding(2))
            .field("tAccNs", FieldKind::U4)
    }

    /// Time valid on receipt of the message, with the given accuracy.
    pub fn new(time: &UtcTime, leap_secs: i8, accuracy: Duration) -> Result<Self> {
        let mut msg = Self::default();
        let f = &mut msg.fields;
        f.set_u("type", u64::from(Self::MSG_TYPE))?;
        f.set_i("leapSecs", i64::from(leap_secs))?;
        f.set_u("year", u64::from(time.year))?;
        f.set_u("month", u64::from(time.month))?;
        f.set_u("day", u64::from(time.day))?;
        f.set_u("hour", u64::from(time.hour))?;
        f.set_u("minute", u64::from(time.minute))?;
        f.set_u("second", u64::from(time.second))?;
        f.set_u("ns", u64::from(time.nanos))?;
        f.set_u("tAccS", accuracy.as_secs())?;
        f.set_u("tAccNs", u64::from(accuracy.subsec_nanos()))?;
        Ok(msg)
    }

    pub fn time(&self) -> Result<UtcTime> {
        let f = &self.fields;
        Ok(UtcTime {
            year: f.get_u("year")? as u16,
            month: f.get_u("month")? as u8,
            day: f.get_u("day")? as u8,
            hour: f.get_u("hour")? as u8,
            minute: f.get_u("minute")? as u8,
            second: f.get_u("second")? as u8,
            nanos: f.get_u("ns")? as u32,
        })
    }

    pub fn leap_secs(&self) -> Result<i8> {
        Ok(self.fields.get_i("leapSecs")? as i8)
    }
}

schema_default!(MgaIniTimeUtc);
ubx_frame!(MgaIniTimeUtc, MGA_INI_TIME_UTC, "UBX-MGA-INI-TIME_UTC");

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ubxlib_frame::UbxFrame;

    use super::*;

    const SAMPLE_TIME: UtcTime = UtcTime {
        year: 2020,
        month: 9,
        day: 5,
        hour: 6,
        minute: 40,
        second: 48,
        nanos: 217_000_000,
    };

    #[test]
    fn time_utc_wire_format() {
        let msg = MgaIniTimeUtc::new(&SAMPLE_TIME, 18, Duration::from_secs(10)).unwrap();
        let expected = [
            0xB5, 0x62, 0x13, 0x40, 0x18, 0x00, 0x10, 0x00, 0x00, 0x12, 0xE4, 0x07, 0x09, 0x05,
            0x06, 0x28, 0x30, 0x00, 0x40, 0x28, 0xEF, 0x0C, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x51, 0xAC,
        ];
        assert_eq!(msg.to_bytes().unwrap().as_ref(), &expected[..]);
    }

    #[test]
    fn time_utc_decodes() {
        let wire = MgaIniTimeUtc::new(&SAMPLE_TIME, -1, Duration::from_millis(1500))
            .unwrap()
            .pack()
            .unwrap();

        let mut msg = MgaIniTimeUtc::default();
        msg.unpack(&wire).unwrap();
        assert_eq!(msg.time().unwrap(), SAMPLE_TIME);
        assert_eq!(msg.leap_secs().unwrap(), -1);
        assert_eq!(msg.fields().get_u("tAccS").unwrap(), 1);
        assert_eq!(msg.fields().get_u("tAccNs").unwrap(), 500_000_000);
    }

    #[test]
    fn ack_data0_info_code() {
        let mut ack = MgaAckData0::default();
        ack.unpack(&[0x01, 0x00, 0x00, 0x40, 0x10, 0x00, 0x00, 0x12])
            .unwrap();
        assert!(ack.accepted().unwrap());
        assert_eq!(ack.msg_id().unwrap(), 0x40);

        ack.unpack(&[0x00, 0x00, 0x01, 0x40, 0x10, 0x00, 0x00, 0x12])
            .unwrap();
        assert_eq!(ack.info_code().unwrap(), MgaAckData0::INFO_NO_TIME);
        assert!(!ack.accepted().unwrap());
    }
}
