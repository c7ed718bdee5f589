//! UBX-ESF-STATUS: external sensor fusion status.

use ubxlib_frame::{bit, Cid, FieldKind, FieldSet, Prototype, Result, Schema};

use crate::macros::{schema_default, ubx_frame};

pub const ESF_STATUS: Cid = Cid::new(Cid::CLASS_ESF, 0x10);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EsfStatusPoll {
    fields: FieldSet,
}

ubx_frame!(EsfStatusPoll, ESF_STATUS, "UBX-ESF-STATUS-POLL");

/// Fusion mode reported in `fusionMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FusionMode {
    Initializing,
    Fusion,
    Suspended,
    Disabled,
    Unknown(u8),
}

impl From<u8> for FusionMode {
    fn from(value: u8) -> Self {
        match value {
            0 => FusionMode::Initializing,
            1 => FusionMode::Fusion,
            2 => FusionMode::Suspended,
            3 => FusionMode::Disabled,
            other => FusionMode::Unknown(other),
        }
    }
}

/// Decoded status block of a single sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorStatus {
    pub sensor_type: u8,
    pub used: bool,
    pub ready: bool,
    /// 0 not calibrated, 1 calibrating, 2 and 3 calibrated.
    pub calib_status: u8,
    /// 0 no data, 1 first byte, 2 event input, 3 time tag.
    pub time_status: u8,
    pub freq_hz: u8,
    pub faults: u8,
}

impl SensorStatus {
    pub fn is_calibrated(&self) -> bool {
        self.calib_status >= 2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EsfStatus {
    fields: FieldSet,
}

impl EsfStatus {
    pub fn schema() -> Schema {
        Schema::new()
            .field("iTow", FieldKind::U4)
            .field("version", FieldKind::U1)
            .field("initStatus1", FieldKind::X1)
            .field("initStatus2", FieldKind::X1)
            .field("res1", FieldKind::Padding(5))
            .field("fusionMode", FieldKind::U1)
            .field("res2", FieldKind::Padding(2))
            .field("numSens", FieldKind::U1)
            .counted(
                "numSens",
                &[
                    ("sensStatus1", FieldKind::X1),
                    ("sensStatus2", FieldKind::X1),
                    ("freq", FieldKind::U1),
                    ("faults", FieldKind::X1),
                ],
            )
    }

    pub fn itow_ms(&self) -> Result<u32> {
        Ok(self.fields.get_u("iTow")? as u32)
    }

    pub fn fusion_mode(&self) -> Result<FusionMode> {
        Ok(FusionMode::from(self.fields.get_u("fusionMode")? as u8))
    }

    /// Wheel-tick initialization status, bits 0-1 of `initStatus1`.
    pub fn wheel_tick_init(&self) -> Result<u8> {
        Ok((self.fields.get_u("initStatus1")? & 0x03) as u8)
    }

    /// IMU initialization status, bits 0-1 of `initStatus2`.
    pub fn imu_init(&self) -> Result<u8> {
        Ok((self.fields.get_u("initStatus2")? & 0x03) as u8)
    }

    pub fn num_sensors(&self) -> Result<usize> {
        Ok(self.fields.get_u("numSens")? as usize)
    }

    pub fn sensors(&self) -> Result<Vec<SensorStatus>> {
        (0..self.num_sensors()?).map(|i| self.sensor(i)).collect()
    }

    fn sensor(&self, index: usize) -> Result<SensorStatus> {
        let status1 = self.fields.get_u(&format!("sensStatus1_{index}"))?;
        let status2 = self.fields.get_u(&format!("sensStatus2_{index}"))?;
        Ok(SensorStatus {
            sensor_type: (status1 & 0x3F) as u8,
            used: bit(status1, 6),
            ready: bit(status1, 7),
            calib_status: (status2 & 0x03) as u8,
            time_status: ((status2 >> 2) & 0x03) as u8,
            freq_hz: self.fields.get_u(&format!("freq_{index}"))? as u8,
            faults: self.fields.get_u(&format!("faults_{index}"))? as u8,
        })
    }
}

schema_default!(EsfStatus);
ubx_frame!(EsfStatus, ESF_STATUS, "UBX-ESF-STATUS", staged);

impl Prototype for EsfStatus {
    const CID: Cid = ESF_STATUS;
}
