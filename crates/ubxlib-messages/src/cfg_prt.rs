//! UBX-CFG-PRT: port configuration.
//!
//! Changing the bitrate through this message takes effect before the
//! receiver can acknowledge it; send it with `fire_and_forget`.

use ubxlib_frame::{bit, Cid, FieldKind, FieldSet, Prototype, Result, Schema};

use crate::macros::{schema_default, ubx_frame};

pub const CFG_PRT: Cid = Cid::new(Cid::CLASS_CFG, 0x00);

pub const PORT_UART: u8 = 1;

/// Protocol mask bits used by `inProtoMask` / `outProtoMask`.
pub mod proto {
    pub const UBX: u16 = 0x01;
    pub const NMEA: u16 = 0x02;
    pub const RTCM: u16 = 0x04;
}

/// Names of the protocols enabled in a mask, e.g. `["UBX", "NMEA"]`.
pub fn protocol_names(mask: u16) -> Vec<&'static str> {
    [(proto::UBX, "UBX"), (proto::NMEA, "NMEA"), (proto::RTCM, "RTCM")]
        .into_iter()
        .filter(|(flag, _)| mask & flag != 0)
        .map(|(_, name)| name)
        .collect()
}

/// Request the configuration of one port.
#[derive(Debug, Clone, PartialEq)]
pub struct CfgPrtPoll {
    fields: FieldSet,
}

impl CfgPrtPoll {
    pub fn schema() -> Schema {
        Schema::new().field("PortId", FieldKind::U1)
    }

    pub fn new(port_id: u8) -> Result<Self> {
        let mut poll = Self::default();
        poll.fields.set_u("PortId", u64::from(port_id))?;
        Ok(poll)
    }

    pub fn uart() -> Result<Self> {
        Self::new(PORT_UART)
    }
}

schema_default!(CfgPrtPoll);
ubx_frame!(CfgPrtPoll, CFG_PRT, "UBX-CFG-PRT-POLL");

/// UART port settings.
#[derive(Debug, Clone, PartialEq)]
pub struct CfgPrt {
    fields: FieldSet,
}

/// Character framing decoded from the `mode` bitfield.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartMode {
    pub data_bits: u8,
    pub parity: &'static str,
    pub stop_bits: &'static str,
}

impl CfgPrt {
    /// 8N1 in the `mode` bitfield.
    pub const MODE_8N1: u32 = 0x0000_08C0;

    pub fn schema() -> Schema {
        Schema::new()
            .field("PortId", FieldKind::U1)
            .field("res1", FieldKind::Padding(1))
            .field("txReady", FieldKind::X2)
            .field("mode", FieldKind::X4)
            .field("baudRate", FieldKind::U4)
            .field("inProtoMask", FieldKind::X2)
            .field("outProtoMask", FieldKind::X2)
            .field("flags", FieldKind::X2)
            .field("res2", FieldKind::Padding(2))
    }

    pub fn port_id(&self) -> Result<u8> {
        Ok(self.fields.get_u("PortId")? as u8)
    }

    pub fn baudrate(&self) -> Result<u32> {
        Ok(self.fields.get_u("baudRate")? as u32)
    }

    pub fn set_baudrate(&mut self, baudrate: u32) -> Result<()> {
        self.fields.set_u("baudRate", u64::from(baudrate))
    }

    pub fn in_protocols(&self) -> Result<u16> {
        Ok(self.fields.get_u("inProtoMask")? as u16)
    }

    pub fn out_protocols(&self) -> Result<u16> {
        Ok(self.fields.get_u("outProtoMask")? as u16)
    }

    pub fn set_protocols(&mut self, inbound: u16, outbound: u16) -> Result<()> {
        self.fields.set_u("inProtoMask", u64::from(inbound))?;
        self.fields.set_u("outProtoMask", u64::from(outbound))
    }

    pub fn mode(&self) -> Result<UartMode> {
        let mode = self.fields.get_u("mode")?;
        let data_bits = 5 + ((mode >> 6) & 0x03) as u8;
        let parity = match (mode >> 9) & 0x07 {
            0 => "even",
            1 => "odd",
            4 | 5 => "none",
            _ => "reserved",
        };
        let stop_bits = match (mode >> 12) & 0x03 {
            0 => "1",
            1 => "1.5",
            2 => "2",
            _ => "0.5",
        };
        Ok(UartMode {
            data_bits,
            parity,
            stop_bits,
        })
    }

    /// Whether the TX-ready pin feature is enabled.
    pub fn tx_ready_enabled(&self) -> Result<bool> {
        Ok(bit(self.fields.get_u("txReady")?, 0))
    }
}

schema_default!(CfgPrt);
ubx_frame!(CfgPrt, CFG_PRT, "UBX-CFG-PRT");

impl Prototype for CfgPrt {
    const CID: Cid = CFG_PRT;
}
