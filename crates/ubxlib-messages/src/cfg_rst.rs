//! UBX-CFG-RST: receiver reset and GNSS start/stop.
//!
//! The receiver does not acknowledge a reset, so these frames go out with
//! `fire_and_forget`.

use ubxlib_frame::{Cid, FieldKind, FieldSet, Result, Schema};

use crate::macros::{schema_default, ubx_frame};

pub const CFG_RST: Cid = Cid::new(Cid::CLASS_CFG, 0x04);

/// Battery-backed RAM sections to clear.
pub mod bbr {
    pub const HOT_START: u16 = 0x0000;
    pub const WARM_START: u16 = 0x0001;
    pub const COLD_START: u16 = 0xFFFF;
}

/// Values of `resetMode`.
pub mod mode {
    pub const HW_RESET: u8 = 0x00;
    pub const SW_RESET: u8 = 0x01;
    pub const SW_RESET_GNSS: u8 = 0x02;
    pub const HW_RESET_AFTER_SHUTDOWN: u8 = 0x04;
    pub const GNSS_STOP: u8 = 0x08;
    pub const GNSS_START: u8 = 0x09;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CfgRst {
    fields: FieldSet,
}

impl CfgRst {
    pub fn schema() -> Schema {
        Schema::new()
            .field("navBbrMask", FieldKind::X2)
            .field("resetMode", FieldKind::U1)
            .field("res1", FieldKind::Padding(1))
    }

    pub fn new(nav_bbr_mask: u16, reset_mode: u8) -> Result<Self> {
        let mut rst = Self::default();
        rst.fields.set_u("navBbrMask", u64::from(nav_bbr_mask))?;
        rst.fields.set_u("resetMode", u64::from(reset_mode))?;
        Ok(rst)
    }

    /// Software reset keeping almanac, dropping ephemeris.
    pub fn warm_start() -> Result<Self> {
        Self::new(bbr::WARM_START, mode::SW_RESET)
    }

    /// Software reset clearing all navigation data.
    pub fn cold_start() -> Result<Self> {
        Self::new(bbr::COLD_START, mode::SW_RESET)
    }

    /// Controlled hardware reset after shutdown.
    pub fn hardware_reset() -> Result<Self> {
        Self::new(bbr::HOT_START, mode::HW_RESET_AFTER_SHUTDOWN)
    }

    /// Stop GNSS tracking without resetting.
    pub fn stop() -> Result<Self> {
        Self::new(bbr::HOT_START, mode::GNSS_STOP)
    }

    /// Resume GNSS tracking after `stop`.
    pub fn start() -> Result<Self> {
        Self::new(bbr::HOT_START, mode::GNSS_START)
    }

    pub fn nav_bbr_mask(&self) -> Result<u16> {
        Ok(self.fields.get_u("navBbrMask")? as u16)
    }

    pub fn reset_mode(&self) -> Result<u8> {
        Ok(self.fields.get_u("resetMode")? as u8)
    }
}

schema_default!(CfgRst);
ubx_frame!(CfgRst, CFG_RST, "UBX-CFG-RST");

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ubxlib_frame::UbxFrame;

    use super::*;

    #[test]
    fn cold_start_payload() {
        let rst = CfgRst::cold_start().unwrap();
        assert_eq!(rst.pack().unwrap().as_ref(), &[0xFF, 0xFF, 0x01, 0x00]);
    }

    #[test]
    fn stop_and_start() {
        assert_eq!(CfgRst::stop().unwrap().reset_mode().unwrap(), mode::GNSS_STOP);
        let start = CfgRst::start().unwrap();
        assert_eq!(start.reset_mode().unwrap(), mode::GNSS_START);
        assert_eq!(start.nav_bbr_mask().unwrap(), bbr::HOT_START);
    }

    #[test]
    fn warm_start_frame() {
        let wire = CfgRst::warm_start().unwrap().to_bytes().unwrap();
        assert_eq!(&wire[..10], &[0xB5, 0x62, 0x06, 0x04, 0x04, 0x00, 0x01, 0x00, 0x01, 0x00]);
    }
}
