//! UBX-CFG-VALGET: read configuration items by key.

use ubxlib_frame::{
    CfgKey, CfgKeyData, CfgValue, Cid, FieldKind, FieldSet, FrameError, Prototype, Result,
    Schema, Value,
};

use crate::macros::{schema_default, ubx_frame};

pub const CFG_VALGET: Cid = Cid::new(Cid::CLASS_CFG, 0x8b);

/// Most keys a single request may carry.
pub const MAX_KEYS: usize = 64;

/// Configuration storage layer to read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Layer {
    #[default]
    Ram = 0,
    Bbr = 1,
    Flash = 2,
    Default = 7,
}

pub(crate) fn check_key_count(count: usize) -> Result<()> {
    if count == 0 || count > MAX_KEYS {
        return Err(FrameError::ValueOutOfRange {
            field: "keys".to_string(),
            value: count.to_string(),
        });
    }
    Ok(())
}

/// Request for the current values of up to 64 keys.
#[derive(Debug, Clone, PartialEq)]
pub struct CfgValGetPoll {
    fields: FieldSet,
}

impl CfgValGetPoll {
    pub fn schema() -> Schema {
        Schema::new()
            .field("version", FieldKind::U1)
            .field("layer", FieldKind::U1)
            .field("position", FieldKind::U2)
            .remaining(&[("key", FieldKind::U4)])
    }

    /// Poll `keys` from the RAM layer.
    pub fn new(keys: &[CfgKey]) -> Result<Self> {
        Self::with_layer(keys, Layer::Ram)
    }

    pub fn with_layer(keys: &[CfgKey], layer: Layer) -> Result<Self> {
        check_key_count(keys.len())?;

        let mut fields = Self::schema().instantiate(&[keys.len()]);
        fields.set_u("layer", layer as u64)?;
        for (index, key) in keys.iter().enumerate() {
            fields.set_u(&format!("key_{index}"), u64::from(key.raw()))?;
        }
        Ok(Self { fields })
    }
}

ubx_frame!(CfgValGetPoll, CFG_VALGET, "UBX-CFG-VALGET-POLL", staged);

/// Key/value items reported by the receiver.
#[derive(Debug, Clone, PartialEq)]
pub struct CfgValGet {
    fields: FieldSet,
}

impl CfgValGet {
    pub fn schema() -> Schema {
        Schema::new()
            .field("version", FieldKind::U1)
            .field("layer", FieldKind::U1)
            .field("position", FieldKind::U2)
            .remaining(&[("data", FieldKind::KeyValue)])
    }

    /// All reported items in receive order.
    pub fn items(&self) -> impl Iterator<Item = &CfgKeyData> {
        self.fields.iter().filter_map(|field| match field.value() {
            Value::KeyValue(item) => Some(item),
            _ => None,
        })
    }

    /// Value reported for `key`, if any.
    pub fn get(&self, key: CfgKey) -> Option<CfgValue> {
        self.items()
            .find(|item| item.key == key)
            .map(|item| item.value)
    }
}

schema_default!(CfgValGet);
ubx_frame!(CfgValGet, CFG_VALGET, "UBX-CFG-VALGET", staged);

impl Prototype for CfgValGet {
    const CID: Cid = CFG_VALGET;
}
