//! UBX-CFG-GNSS: satellite system selection.

use ubxlib_frame::{bit, with_bit, Cid, FieldKind, FieldSet, Prototype, Result, Schema};

use crate::macros::{schema_default, ubx_frame};

pub const CFG_GNSS: Cid = Cid::new(Cid::CLASS_CFG, 0x3E);

/// Satellite systems by `gnssId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum GnssSystem {
    Gps = 0,
    Sbas = 1,
    Galileo = 2,
    BeiDou = 3,
    Imes = 4,
    Qzss = 5,
    Glonass = 6,
    Irnss = 7,
}

impl GnssSystem {
    pub fn from_id(id: u8) -> Option<Self> {
        let system = match id {
            0 => GnssSystem::Gps,
            1 => GnssSystem::Sbas,
            2 => GnssSystem::Galileo,
            3 => GnssSystem::BeiDou,
            4 => GnssSystem::Imes,
            5 => GnssSystem::Qzss,
            6 => GnssSystem::Glonass,
            7 => GnssSystem::Irnss,
            _ => return None,
        };
        Some(system)
    }

    pub fn name(self) -> &'static str {
        match self {
            GnssSystem::Gps => "gps",
            GnssSystem::Sbas => "sbas",
            GnssSystem::Galileo => "galileo",
            GnssSystem::BeiDou => "beidou",
            GnssSystem::Imes => "imes",
            GnssSystem::Qzss => "qzss",
            GnssSystem::Glonass => "glonass",
            GnssSystem::Irnss => "irnss",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CfgGnssPoll {
    fields: FieldSet,
}

ubx_frame!(CfgGnssPoll, CFG_GNSS, "UBX-CFG-GNSS-POLL");

/// Per-system tracking channel and enable configuration.
///
/// A decoded frame is typically modified and sent back with `set`.
#[derive(Debug, Clone, PartialEq)]
pub struct CfgGnss {
    fields: FieldSet,
}

impl CfgGnss {
    pub fn schema() -> Schema {
        Schema::new()
            .field("msgVer", FieldKind::U1)
            .field("numTrkChHw", FieldKind::U1)
            .field("numTrkChUse", FieldKind::U1)
            .field("numConfigBlocks", FieldKind::U1)
            .counted(
                "numConfigBlocks",
                &[
                    ("gnssId", FieldKind::U1),
                    ("resTrkCh", FieldKind::U1),
                    ("maxTrkCh", FieldKind::U1),
                    ("res1", FieldKind::Padding(1)),
                    ("flags", FieldKind::X4),
                ],
            )
    }

    pub fn num_blocks(&self) -> Result<usize> {
        Ok(self.fields.get_u("numConfigBlocks")? as usize)
    }

    /// Systems listed in the configuration, in block order.
    pub fn systems(&self) -> Result<Vec<GnssSystem>> {
        let mut systems = Vec::new();
        for index in 0..self.num_blocks()? {
            let id = self.fields.get_u(&format!("gnssId_{index}"))? as u8;
            if let Some(system) = GnssSystem::from_id(id) {
                systems.push(system);
            }
        }
        Ok(systems)
    }

    /// `None` when the receiver does not list `system`.
    pub fn is_enabled(&self, system: GnssSystem) -> Result<Option<bool>> {
        match self.block(system)? {
            Some(index) => Ok(Some(bit(self.fields.get_u(&format!("flags_{index}"))?, 0))),
            None => Ok(None),
        }
    }

    /// Enable or disable `system`. Returns false if the receiver does not
    /// list it.
    pub fn set_enabled(&mut self, system: GnssSystem, enabled: bool) -> Result<bool> {
        let Some(index) = self.block(system)? else {
            return Ok(false);
        };
        let name = format!("flags_{index}");
        let flags = self.fields.get_u(&name)?;
        self.fields.set_u(&name, with_bit(flags, 0, enabled))?;
        Ok(true)
    }

    /// Enable exactly the systems in `enabled`, disable every other listed one.
    pub fn select(&mut self, enabled: &[GnssSystem]) -> Result<()> {
        for system in self.systems()? {
            self.set_enabled(system, enabled.contains(&system))?;
        }
        Ok(())
    }

    /// GPS with SBAS and GLONASS.
    pub fn gps_glonass(&mut self) -> Result<()> {
        self.select(&[GnssSystem::Gps, GnssSystem::Sbas, GnssSystem::Glonass])
    }

    /// GPS with SBAS, Galileo and BeiDou.
    pub fn gps_galileo_beidou(&mut self) -> Result<()> {
        self.select(&[
            GnssSystem::Gps,
            GnssSystem::Sbas,
            GnssSystem::Galileo,
            GnssSystem::BeiDou,
        ])
    }

    fn block(&self, system: GnssSystem) -> Result<Option<usize>> {
        for index in 0..self.num_blocks()? {
            if self.fields.get_u(&format!("gnssId_{index}"))? == system as u64 {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }
}

schema_default!(CfgGnss);
ubx_frame!(CfgGnss, CFG_GNSS, "UBX-CFG-GNSS", staged);

impl Prototype for CfgGnss {
    const CID: Cid = CFG_GNSS;
}
