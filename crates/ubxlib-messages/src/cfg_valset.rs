//! UBX-CFG-VALSET: write configuration items.

use ubxlib_frame::{CfgKeyData, Cid, FieldKind, FieldSet, Result, Schema, Value};

use crate::cfg_valget::check_key_count;
use crate::macros::{schema_default, ubx_frame};

pub const CFG_VALSET: Cid = Cid::new(Cid::CLASS_CFG, 0x8a);

/// Storage layers a write applies to; combine with `|`.
pub mod layers {
    pub const RAM: u8 = 0x01;
    pub const BBR: u8 = 0x02;
    pub const FLASH: u8 = 0x04;
}

/// Set up to 64 configuration items. Acknowledged with ACK-ACK / ACK-NAK.
#[derive(Debug, Clone, PartialEq)]
pub struct CfgValSet {
    fields: FieldSet,
}

impl CfgValSet {
    pub fn schema() -> Schema {
        Schema::new()
            .field("version", FieldKind::U1)
            .field("layers", FieldKind::X1)
            .field("res1", FieldKind::Padding(2))
            .remaining(&[("data", FieldKind::KeyValue)])
    }

    /// Write `items` to the RAM layer.
    pub fn new(items: &[CfgKeyData]) -> Result<Self> {
        Self::with_layers(items, layers::RAM)
    }

    pub fn with_layers(items: &[CfgKeyData], layers: u8) -> Result<Self> {
        check_key_count(items.len())?;

        let mut fields = Self::schema().instantiate(&[items.len()]);
        fields.set_u("layers", u64::from(layers))?;
        for (index, item) in items.iter().enumerate() {
            fields.set(&format!("data_{index}"), Value::KeyValue(*item))?;
        }
        Ok(Self { fields })
    }

    pub fn layers(&self) -> Result<u8> {
        Ok(self.fields.get_u("layers")? as u8)
    }
}

schema_default!(CfgValSet);
ubx_frame!(CfgValSet, CFG_VALSET, "UBX-CFG-VALSET", staged);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use ubxlib_frame::{keys, UbxFrame};

    use super::*;

    #[test]
    fn valset_payload() {
        let items = [
            CfgKeyData::from_key(keys::CFG_RATE_MEAS, 250).unwrap(),
            CfgKeyData::from_key(keys::CFG_SIGNAL_GAL_ENA, 1).unwrap(),
        ];
        let msg = CfgValSet::with_layers(&items, layers::RAM | layers::BBR).unwrap();
        assert_eq!(
            msg.pack().unwrap().as_ref(),
            &[
                0x00, 0x03, 0x00, 0x00, // version, layers, reserved
                0x01, 0x00, 0x21, 0x30, 0xFA, 0x00, // CFG-RATE-MEAS 250
                0x21, 0x00, 0x31, 0x10, 0x01, // CFG-SIGNAL-GAL_ENA true
            ]
        );
    }

    #[test]
    fn valset_roundtrips_through_staged_decode() {
        let items = [CfgKeyData::from_key(keys::CFG_UART1_BAUDRATE, 9600).unwrap()];
        let msg = CfgValSet::new(&items).unwrap();

        let mut decoded = CfgValSet::default();
        decoded.unpack(&msg.pack().unwrap()).unwrap();
        assert_eq!(decoded, msg);
        assert_eq!(decoded.layers().unwrap(), layers::RAM);
    }

    #[test]
    fn valset_requires_items() {
        assert!(CfgValSet::new(&[]).is_err());
    }
}
