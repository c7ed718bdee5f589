//! UBX-MON-VER: receiver software and hardware versions.

use ubxlib_frame::{Cid, FieldKind, FieldSet, Prototype, Result, Schema, Value};

use crate::macros::{schema_default, ubx_frame};

pub const MON_VER: Cid = Cid::new(Cid::CLASS_MON, 0x04);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonVerPoll {
    fields: FieldSet,
}

ubx_frame!(MonVerPoll, MON_VER, "UBX-MON-VER-POLL");

#[derive(Debug, Clone, PartialEq)]
pub struct MonVer {
    fields: FieldSet,
}

impl MonVer {
    /// Fixed version strings followed by any number of 30 byte extensions.
    pub fn schema() -> Schema {
        Schema::new()
            .field("swVersion", FieldKind::Chars(30))
            .field("hwVersion", FieldKind::Chars(10))
            .remaining(&[("extension", FieldKind::Chars(30))])
    }

    pub fn sw_version(&self) -> Result<&str> {
        self.fields.get_str("swVersion")
    }

    pub fn hw_version(&self) -> Result<&str> {
        self.fields.get_str("hwVersion")
    }

    /// Extension strings such as `FWVER=...` and `PROTVER=...`.
    pub fn extensions(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|field| field.name().starts_with("extension_"))
            .filter_map(|field| match field.value() {
                Value::Text(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Value of an extension of the form `KEY=value`.
    pub fn extension(&self, key: &str) -> Option<&str> {
        self.extensions().into_iter().find_map(|ext| {
            ext.strip_prefix(key)
                .and_then(|rest| rest.strip_prefix('='))
        })
    }
}

schema_default!(MonVer);
ubx_frame!(MonVer, MON_VER, "UBX-MON-VER", staged);

impl Prototype for MonVer {
    const CID: Cid = MON_VER;
}
