//! UBX-CFG-RATE: navigation measurement rate.

use ubxlib_frame::{Cid, FieldKind, FieldSet, FrameError, Prototype, Result, Schema};

use crate::macros::{schema_default, ubx_frame};

pub const CFG_RATE: Cid = Cid::new(Cid::CLASS_CFG, 0x08);

/// Highest navigation rate the receivers handled here accept.
pub const MAX_RATE_HZ: u32 = 10;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CfgRatePoll {
    fields: FieldSet,
}

ubx_frame!(CfgRatePoll, CFG_RATE, "UBX-CFG-RATE-POLL");

#[derive(Debug, Clone, PartialEq)]
pub struct CfgRate {
    fields: FieldSet,
}

impl CfgRate {
    pub const TIME_REF_UTC: u16 = 0;
    pub const TIME_REF_GPS: u16 = 1;

    pub fn schema() -> Schema {
        Schema::new()
            .field("measRate", FieldKind::U2)
            .field("navRate", FieldKind::U2)
            .field("timeRef", FieldKind::U2)
    }

    /// Measurement period in milliseconds.
    pub fn meas_rate_ms(&self) -> Result<u16> {
        Ok(self.fields.get_u("measRate")? as u16)
    }

    /// Measurements per navigation solution.
    pub fn nav_rate(&self) -> Result<u16> {
        Ok(self.fields.get_u("navRate")? as u16)
    }

    pub fn time_ref(&self) -> Result<u16> {
        Ok(self.fields.get_u("timeRef")? as u16)
    }

    /// Navigation solutions per second, rounded down.
    pub fn rate_hz(&self) -> Result<u32> {
        let period = u32::from(self.meas_rate_ms()?) * u32::from(self.nav_rate()?.max(1));
        Ok(if period == 0 { 0 } else { 1000 / period })
    }

    /// One measurement per solution at `hz` solutions per second.
    pub fn set_rate_hz(&mut self, hz: u32) -> Result<()> {
        if hz == 0 || hz > MAX_RATE_HZ {
            return Err(FrameError::ValueOutOfRange {
                field: "rate".to_string(),
                value: hz.to_string(),
            });
        }
        self.fields.set_u("measRate", u64::from(1000 / hz))?;
        self.fields.set_u("navRate", 1)
    }
}

schema_default!(CfgRate);
ubx_frame!(CfgRate, CFG_RATE, "UBX-CFG-RATE");

impl Prototype for CfgRate {
    const CID: Cid = CFG_RATE;
}
