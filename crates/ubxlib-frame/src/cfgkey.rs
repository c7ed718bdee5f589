//! Configuration key/value items of the CFG-VALGET / CFG-VALSET sub-protocol.
//!
//! A key is a 32-bit little-endian word:
//!
//! ```text
//!  31  30..28   27..24  23..16   15..12  11..0
//! ┌───┬────────┬───────┬────────┬───────┬─────────┐
//! │ - │  size  │   -   │ group  │   -   │  item   │
//! └───┴────────┴───────┴────────┴───────┴─────────┘
//! ```
//!
//! The value follows the key immediately; its width comes from the size
//! code. Signedness is not on the wire and is looked up in [`keys`].

use std::fmt;

use bytes::{Buf, BufMut};

use crate::error::{FrameError, Result};

const KEY_SIZE: usize = 4;
const MAX_GROUP: u32 = 0xFF;
const MAX_ITEM: u32 = 0xFFF;

/// A packed configuration key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CfgKey(u32);

impl CfgKey {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Build a key from group id, item id and value width in bits.
    pub fn from_parts(group: u32, item: u32, bits: u8) -> Result<Self> {
        if group > MAX_GROUP || item > MAX_ITEM {
            return Err(FrameError::InvalidKey { group, item });
        }
        let size = size_code_for_bits(bits)?;
        Ok(Self((u32::from(size) << 28) | (group << 16) | item))
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    /// The 3-bit size code in bits 30..28.
    pub fn size_code(self) -> u8 {
        ((self.0 >> 28) & 0x7) as u8
    }

    /// Value width in bits (1, 8, 16, 32 or 64).
    pub fn bits(self) -> Result<u8> {
        match self.size_code() {
            1 => Ok(1),
            2 => Ok(8),
            3 => Ok(16),
            4 => Ok(32),
            5 => Ok(64),
            code => Err(FrameError::InvalidSizeCode(code)),
        }
    }

    /// Number of value bytes on the wire. One-bit values occupy a full byte.
    pub fn value_len(self) -> Result<usize> {
        Ok(match self.bits()? {
            1 | 8 => 1,
            16 => 2,
            32 => 4,
            _ => 8,
        })
    }

    pub fn group(self) -> u8 {
        ((self.0 >> 16) & MAX_GROUP) as u8
    }

    pub fn item(self) -> u16 {
        (self.0 & MAX_ITEM) as u16
    }

    /// Whether the value is a signed integer, according to the key table.
    pub fn is_signed(self) -> bool {
        keys::info(self).is_some_and(|info| info.signed)
    }

    /// Symbolic name from the key table, if known.
    pub fn name(self) -> Option<&'static str> {
        keys::info(self).map(|info| info.name)
    }
}

impl fmt::Debug for CfgKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "CfgKey({name})"),
            None => write!(f, "CfgKey({:#010x})", self.0),
        }
    }
}

impl From<u32> for CfgKey {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

fn size_code_for_bits(bits: u8) -> Result<u8> {
    match bits {
        1 => Ok(1),
        8 => Ok(2),
        16 => Ok(3),
        32 => Ok(4),
        64 => Ok(5),
        other => Err(FrameError::ValueOutOfRange {
            field: "bits".to_string(),
            value: other.to_string(),
        }),
    }
}

/// A configuration value with its wire width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CfgValue {
    Bit(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
}

impl CfgValue {
    /// Fit an integer into a value of the given width and signedness.
    pub fn fit(bits: u8, signed: bool, value: i128) -> Result<Self> {
        let out_of_range = || FrameError::ValueOutOfRange {
            field: format!("{bits}-bit value"),
            value: value.to_string(),
        };
        let fitted = match (bits, signed) {
            (1, _) => match value {
                0 => CfgValue::Bit(false),
                1 => CfgValue::Bit(true),
                _ => return Err(out_of_range()),
            },
            (8, false) => CfgValue::U8(u8::try_from(value).map_err(|_| out_of_range())?),
            (16, false) => CfgValue::U16(u16::try_from(value).map_err(|_| out_of_range())?),
            (32, false) => CfgValue::U32(u32::try_from(value).map_err(|_| out_of_range())?),
            (64, false) => CfgValue::U64(u64::try_from(value).map_err(|_| out_of_range())?),
            (8, true) => CfgValue::I8(i8::try_from(value).map_err(|_| out_of_range())?),
            (16, true) => CfgValue::I16(i16::try_from(value).map_err(|_| out_of_range())?),
            (32, true) => CfgValue::I32(i32::try_from(value).map_err(|_| out_of_range())?),
            (64, true) => CfgValue::I64(i64::try_from(value).map_err(|_| out_of_range())?),
            _ => return Err(out_of_range()),
        };
        Ok(fitted)
    }

    /// Width in bits.
    pub fn bits(&self) -> u8 {
        match self {
            CfgValue::Bit(_) => 1,
            CfgValue::U8(_) | CfgValue::I8(_) => 8,
            CfgValue::U16(_) | CfgValue::I16(_) => 16,
            CfgValue::U32(_) | CfgValue::I32(_) => 32,
            CfgValue::U64(_) | CfgValue::I64(_) => 64,
        }
    }

    /// Widened integer view of the value.
    pub fn as_i128(&self) -> i128 {
        match *self {
            CfgValue::Bit(v) => i128::from(v),
            CfgValue::U8(v) => i128::from(v),
            CfgValue::U16(v) => i128::from(v),
            CfgValue::U32(v) => i128::from(v),
            CfgValue::U64(v) => i128::from(v),
            CfgValue::I8(v) => i128::from(v),
            CfgValue::I16(v) => i128::from(v),
            CfgValue::I32(v) => i128::from(v),
            CfgValue::I64(v) => i128::from(v),
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        u64::try_from(self.as_i128()).ok()
    }

    pub fn as_i64(&self) -> Option<i64> {
        i64::try_from(self.as_i128()).ok()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CfgValue::Bit(v) => Some(*v),
            _ => None,
        }
    }

    fn put<B: BufMut>(&self, dst: &mut B) {
        match *self {
            CfgValue::Bit(v) => dst.put_u8(u8::from(v)),
            CfgValue::U8(v) => dst.put_u8(v),
            CfgValue::U16(v) => dst.put_u16_le(v),
            CfgValue::U32(v) => dst.put_u32_le(v),
            CfgValue::U64(v) => dst.put_u64_le(v),
            CfgValue::I8(v) => dst.put_i8(v),
            CfgValue::I16(v) => dst.put_i16_le(v),
            CfgValue::I32(v) => dst.put_i32_le(v),
            CfgValue::I64(v) => dst.put_i64_le(v),
        }
    }
}

impl fmt::Display for CfgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CfgValue::Bit(v) => write!(f, "{v}"),
            other => write!(f, "{}", other.as_i128()),
        }
    }
}

/// One key/value item as carried in CFG-VALGET responses and CFG-VALSET requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CfgKeyData {
    pub key: CfgKey,
    pub value: CfgValue,
}

impl CfgKeyData {
    /// Pair a known key with a value, checking the value fits the key's width.
    ///
    /// ```
    /// use ubxlib_frame::cfgkey::{keys, CfgKeyData};
    ///
    /// let item = CfgKeyData::from_key(keys::CFG_RATE_MEAS, 250).unwrap();
    /// assert_eq!(item.to_vec(), [0x01, 0x00, 0x21, 0x30, 0xFA, 0x00]);
    /// ```
    pub fn from_key(key: impl Into<CfgKey>, value: impl Into<i128>) -> Result<Self> {
        let key = key.into();
        let value = CfgValue::fit(key.bits()?, key.is_signed(), value.into())?;
        Ok(Self { key, value })
    }

    /// Build an item from raw group/item ids and width.
    pub fn from_parts(group: u32, item: u32, bits: u8, value: impl Into<i128>) -> Result<Self> {
        let key = CfgKey::from_parts(group, item, bits)?;
        Self::from_key(key, value)
    }

    /// Wire size: key plus value bytes.
    pub fn wire_size(&self) -> usize {
        KEY_SIZE + byte_len(self.value.bits())
    }

    pub fn pack_into<B: BufMut>(&self, dst: &mut B) {
        dst.put_u32_le(self.key.raw());
        self.value.put(dst);
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.wire_size());
        self.pack_into(&mut out);
        out
    }

    /// Decode one item from the front of `src`, returning it and the bytes consumed.
    pub fn unpack(src: &[u8]) -> Result<(Self, usize)> {
        if src.len() < KEY_SIZE {
            return Err(FrameError::Truncated {
                field: "configuration key".to_string(),
                needed: KEY_SIZE,
                available: src.len(),
            });
        }
        let mut buf = src;
        let key = CfgKey(buf.get_u32_le());
        let bits = key.bits()?;
        let len = key.value_len()?;
        if buf.len() < len {
            return Err(FrameError::Truncated {
                field: format!("{key:?} value"),
                needed: len,
                available: buf.len(),
            });
        }

        let signed = key.is_signed();
        let value = match (bits, signed) {
            (1, _) => match buf.get_u8() {
                0 => CfgValue::Bit(false),
                1 => CfgValue::Bit(true),
                other => {
                    return Err(FrameError::ValueOutOfRange {
                        field: format!("{key:?}"),
                        value: other.to_string(),
                    })
                }
            },
            (8, false) => CfgValue::U8(buf.get_u8()),
            (16, false) => CfgValue::U16(buf.get_u16_le()),
            (32, false) => CfgValue::U32(buf.get_u32_le()),
            (8, true) => CfgValue::I8(buf.get_i8()),
            (16, true) => CfgValue::I16(buf.get_i16_le()),
            (32, true) => CfgValue::I32(buf.get_i32_le()),
            (_, false) => CfgValue::U64(buf.get_u64_le()),
            (_, true) => CfgValue::I64(buf.get_i64_le()),
        };

        Ok((Self { key, value }, KEY_SIZE + len))
    }
}

impl fmt::Display for CfgKeyData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.key.name() {
            Some(name) => write!(f, "{name}: {}", self.value),
            None => write!(
                f,
                "group:{:02x} item:{:03x}: {}",
                self.key.group(),
                self.key.item(),
                self.value
            ),
        }
    }
}

fn byte_len(bits: u8) -> usize {
    match bits {
        1 | 8 => 1,
        16 => 2,
        32 => 4,
        _ => 8,
    }
}

/// Known configuration keys.
pub mod keys {
    use super::CfgKey;

    pub const CFG_SIGNAL_GPS_ENA: CfgKey = CfgKey::new(0x1031_001f);
    pub const CFG_SIGNAL_GPS_L1CA_ENA: CfgKey = CfgKey::new(0x1031_0001);
    pub const CFG_SIGNAL_SBAS_ENA: CfgKey = CfgKey::new(0x1031_0020);
    pub const CFG_SIGNAL_SBAS_L1CA_ENA: CfgKey = CfgKey::new(0x1031_0005);
    pub const CFG_SIGNAL_GAL_ENA: CfgKey = CfgKey::new(0x1031_0021);
    pub const CFG_SIGNAL_GAL_E1_ENA: CfgKey = CfgKey::new(0x1031_0007);
    pub const CFG_SIGNAL_BDS_ENA: CfgKey = CfgKey::new(0x1031_0022);
    pub const CFG_SIGNAL_BDS_B1_ENA: CfgKey = CfgKey::new(0x1031_000d);
    pub const CFG_SIGNAL_GLO_ENA: CfgKey = CfgKey::new(0x1031_0025);
    pub const CFG_SIGNAL_GLO_L1_ENA: CfgKey = CfgKey::new(0x1031_0018);
    pub const CFG_SIGNAL_QZSS_ENA: CfgKey = CfgKey::new(0x1031_0024);
    pub const CFG_SIGNAL_QZSS_L1CA_ENA: CfgKey = CfgKey::new(0x1031_0012);
    pub const CFG_SIGNAL_QZSS_L1S_ENA: CfgKey = CfgKey::new(0x1031_0014);

    pub const CFG_NMEA_PROTVER: CfgKey = CfgKey::new(0x2093_0001);
    pub const CFG_UART1_BAUDRATE: CfgKey = CfgKey::new(0x4052_0001);

    pub const CFG_NAVSPG_FIXMODE: CfgKey = CfgKey::new(0x2011_0011);
    pub const CFG_NAVSPG_DYNMODEL: CfgKey = CfgKey::new(0x2011_0021);

    pub const CFG_RATE_MEAS: CfgKey = CfgKey::new(0x3021_0001);
    pub const CFG_RATE_NAV: CfgKey = CfgKey::new(0x3021_0002);
    pub const CFG_RATE_NAV_PRIO: CfgKey = CfgKey::new(0x2021_0004);

    pub const CFG_SFCORE_USE_SF: CfgKey = CfgKey::new(0x1008_0001);
    pub const CFG_SFIMU_IMU_MNTALG_YAW: CfgKey = CfgKey::new(0x4006_002d);
    pub const CFG_SFIMU_IMU_MNTALG_PITCH: CfgKey = CfgKey::new(0x3006_002e);
    pub const CFG_SFIMU_IMU_MNTALG_ROLL: CfgKey = CfgKey::new(0x3006_002f);

    pub const CFG_TP_PULSE_DEF: CfgKey = CfgKey::new(0x2005_0023);
    pub const CFG_TP_PULSE_LENGTH_DEF: CfgKey = CfgKey::new(0x2005_0030);
    pub const CFG_TP_TP2_ENA: CfgKey = CfgKey::new(0x1005_0012);
    pub const CFG_TP_PERIOD_TP2: CfgKey = CfgKey::new(0x4005_000d);
    pub const CFG_TP_LEN_TP2: CfgKey = CfgKey::new(0x4005_000f);
    pub const CFG_TP_TIMEGRID_TP2: CfgKey = CfgKey::new(0x2005_0017);
    pub const CFG_TP_ALIGN_TO_TOW_TP2: CfgKey = CfgKey::new(0x1005_0015);
    pub const CFG_TP_USE_LOCKED_TP2: CfgKey = CfgKey::new(0x1005_0014);
    pub const CFG_TP_POL_TP2: CfgKey = CfgKey::new(0x1005_0016);
    pub const CFG_TP_PERIOD_LOCK_TP2: CfgKey = CfgKey::new(0x4005_000e);
    pub const CFG_TP_LEN_LOCK_TP2: CfgKey = CfgKey::new(0x4005_0010);

    /// Name and signedness of a known key.
    #[derive(Debug, Clone, Copy)]
    pub struct KeyInfo {
        pub key: CfgKey,
        pub name: &'static str,
        pub signed: bool,
    }

    const fn unsigned(key: CfgKey, name: &'static str) -> KeyInfo {
        KeyInfo {
            key,
            name,
            signed: false,
        }
    }

    const fn signed(key: CfgKey, name: &'static str) -> KeyInfo {
        KeyInfo {
            key,
            name,
            signed: true,
        }
    }

    pub const KEY_INFO: &[KeyInfo] = &[
        unsigned(CFG_SIGNAL_GPS_ENA, "CFG-SIGNAL-GPS_ENA"),
        unsigned(CFG_SIGNAL_GPS_L1CA_ENA, "CFG-SIGNAL-GPS_L1CA_ENA"),
        unsigned(CFG_SIGNAL_SBAS_ENA, "CFG-SIGNAL-SBAS_ENA"),
        unsigned(CFG_SIGNAL_SBAS_L1CA_ENA, "CFG-SIGNAL-SBAS_L1CA_ENA"),
        unsigned(CFG_SIGNAL_GAL_ENA, "CFG-SIGNAL-GAL_ENA"),
        unsigned(CFG_SIGNAL_GAL_E1_ENA, "CFG-SIGNAL-GAL_E1_ENA"),
        unsigned(CFG_SIGNAL_BDS_ENA, "CFG-SIGNAL-BDS_ENA"),
        unsigned(CFG_SIGNAL_BDS_B1_ENA, "CFG-SIGNAL-BDS_B1_ENA"),
        unsigned(CFG_SIGNAL_GLO_ENA, "CFG-SIGNAL-GLO_ENA"),
        unsigned(CFG_SIGNAL_GLO_L1_ENA, "CFG-SIGNAL-GLO_L1_ENA"),
        unsigned(CFG_SIGNAL_QZSS_ENA, "CFG-SIGNAL-QZSS_ENA"),
        unsigned(CFG_SIGNAL_QZSS_L1CA_ENA, "CFG-SIGNAL-QZSS_L1CA_ENA"),
        unsigned(CFG_SIGNAL_QZSS_L1S_ENA, "CFG-SIGNAL-QZSS_L1S_ENA"),
        unsigned(CFG_NMEA_PROTVER, "CFG-NMEA-PROTVER"),
        unsigned(CFG_UART1_BAUDRATE, "CFG-UART1-BAUDRATE"),
        unsigned(CFG_NAVSPG_FIXMODE, "CFG-NAVSPG-FIXMODE"),
        unsigned(CFG_NAVSPG_DYNMODEL, "CFG-NAVSPG-DYNMODEL"),
        unsigned(CFG_RATE_MEAS, "CFG-RATE-MEAS"),
        unsigned(CFG_RATE_NAV, "CFG-RATE-NAV"),
        unsigned(CFG_RATE_NAV_PRIO, "CFG-RATE-NAV_PRIO"),
        unsigned(CFG_SFCORE_USE_SF, "CFG-SFCORE-USE_SF"),
        unsigned(CFG_SFIMU_IMU_MNTALG_YAW, "CFG-SFIMU-IMU_MNTALG_YAW"),
        signed(CFG_SFIMU_IMU_MNTALG_PITCH, "CFG-SFIMU-IMU_MNTALG_PITCH"),
        signed(CFG_SFIMU_IMU_MNTALG_ROLL, "CFG-SFIMU-IMU_MNTALG_ROLL"),
        unsigned(CFG_TP_PULSE_DEF, "CFG-TP-PULSE_DEF"),
        unsigned(CFG_TP_PULSE_LENGTH_DEF, "CFG-TP-PULSE_LENGTH_DEF"),
        unsigned(CFG_TP_TP2_ENA, "CFG-TP-TP2_ENA"),
        unsigned(CFG_TP_PERIOD_TP2, "CFG-TP-PERIOD_TP2"),
        unsigned(CFG_TP_LEN_TP2, "CFG-TP-LEN_TP2"),
        unsigned(CFG_TP_TIMEGRID_TP2, "CFG-TP-TIMEGRID_TP2"),
        unsigned(CFG_TP_ALIGN_TO_TOW_TP2, "CFG-TP-ALIGN_TO_TOW_TP2"),
        unsigned(CFG_TP_USE_LOCKED_TP2, "CFG-TP-USE_LOCKED_TP2"),
        unsigned(CFG_TP_POL_TP2, "CFG-TP-POL_TP2"),
        unsigned(CFG_TP_PERIOD_LOCK_TP2, "CFG-TP-PERIOD_LOCK_TP2"),
        unsigned(CFG_TP_LEN_LOCK_TP2, "CFG-TP-LEN_LOCK_TP2"),
    ];

    /// Look up a key in the table.
    pub fn info(key: CfgKey) -> Option<&'static KeyInfo> {
        KEY_INFO.iter().find(|info| info.key == key)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn hex(s: &str) -> Vec<u8> {
        s.split_whitespace()
            .map(|b| u8::from_str_radix(b, 16).unwrap())
            .collect()
    }

    #[test]
    fn rate_meas_packs_to_reference_bytes() {
        let item = CfgKeyData::from_key(keys::CFG_RATE_MEAS, 250).unwrap();
        assert_eq!(item.to_vec(), hex("01 00 21 30 FA 00"));

        let (decoded, consumed) = CfgKeyData::unpack(&item.to_vec()).unwrap();
        assert_eq!(consumed, 6);
        assert_eq!(decoded.key.group(), 0x21);
        assert_eq!(decoded.key.item(), 0x001);
        assert_eq!(decoded.key.bits().unwrap(), 16);
        assert_eq!(decoded.value, CfgValue::U16(250));
    }

    #[test]
    fn key_fields_from_known_keys() {
        let gps = CfgKeyData::from_key(keys::CFG_SIGNAL_GPS_ENA, true).unwrap();
        assert_eq!(gps.key.bits().unwrap(), 1);
        assert_eq!(gps.key.group(), 0x31);
        assert_eq!(gps.key.item(), 0x01f);
        assert_eq!(gps.value.as_bool(), Some(true));

        let yaw = CfgKeyData::from_key(keys::CFG_SFIMU_IMU_MNTALG_YAW, 12345).unwrap();
        assert_eq!(yaw.key.bits().unwrap(), 32);
        assert_eq!(yaw.key.group(), 0x06);
        assert_eq!(yaw.key.item(), 0x02d);
        assert_eq!(yaw.value, CfgValue::U32(12345));
    }

    #[test]
    fn unpack_u32() {
        let (item, consumed) = CfgKeyData::unpack(&hex("2D 00 06 40 11 22 33 44")).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(item.key.bits().unwrap(), 32);
        assert_eq!(item.key.group(), 0x06);
        assert_eq!(item.key.item(), 0x02D);
        assert_eq!(item.value.as_u64(), Some(0x4433_2211));
    }

    #[test]
    fn unpack_max_ids() {
        let (item, _) = CfgKeyData::unpack(&hex("FF 03 FF 40 11 22 33 44")).unwrap();
        assert_eq!(item.key.group(), 0xFF);
        assert_eq!(item.key.item(), 0x3FF);
    }

    #[test]
    fn unpack_bit_values() {
        let (item, consumed) = CfgKeyData::unpack(&hex("00 00 00 10 00")).unwrap();
        assert_eq!(consumed, 5);
        assert_eq!(item.value, CfgValue::Bit(false));

        let (item, _) = CfgKeyData::unpack(&hex("00 00 00 10 01")).unwrap();
        assert_eq!(item.value, CfgValue::Bit(true));

        let err = CfgKeyData::unpack(&hex("00 00 00 10 FF")).unwrap_err();
        assert!(matches!(err, FrameError::ValueOutOfRange { .. }));
    }

    #[test]
    fn unpack_each_width() {
        let (item, consumed) = CfgKeyData::unpack(&hex("00 00 00 20 FF")).unwrap();
        assert_eq!((item.value, consumed), (CfgValue::U8(0xFF), 5));

        let (item, consumed) = CfgKeyData::unpack(&hex("00 00 00 30 11 22")).unwrap();
        assert_eq!((item.value, consumed), (CfgValue::U16(0x2211), 6));

        let (item, consumed) =
            CfgKeyData::unpack(&hex("00 00 00 50 11 22 33 44 55 66 77 88")).unwrap();
        assert_eq!((item.value, consumed), (CfgValue::U64(0x8877_6655_4433_2211), 12));
    }

    #[test]
    fn unpack_signed_key_from_table() {
        // CFG-SFIMU-IMU_MNTALG_PITCH, -2
        let (item, _) = CfgKeyData::unpack(&hex("2E 00 06 30 FE FF")).unwrap();
        assert_eq!(item.value, CfgValue::I16(-2));
        assert_eq!(item.key.name(), Some("CFG-SFIMU-IMU_MNTALG_PITCH"));
    }

    #[test]
    fn unpack_rejects_invalid_size_codes() {
        for data in ["11 01 22 00 11 22 33 44", "11 01 22 60 11 22 33 44", "11 01 22 70 11 22 33 44"] {
            let err = CfgKeyData::unpack(&hex(data)).unwrap_err();
            assert!(matches!(err, FrameError::InvalidSizeCode(_)), "{data}");
        }
    }

    #[test]
    fn unpack_rejects_short_data() {
        for data in ["", "FF", "FF FF FF", "00 00 00 40", "00 00 00 40 11 22 33"] {
            let err = CfgKeyData::unpack(&hex(data)).unwrap_err();
            assert!(matches!(err, FrameError::Truncated { .. }), "{data:?}");
        }
    }

    #[test]
    fn pack_from_parts() {
        let item = CfgKeyData::from_parts(0x06, 0x2d, 64, 0x8877_6655_4433_2211_u64).unwrap();
        assert_eq!(item.to_vec(), hex("2D 00 06 50 11 22 33 44 55 66 77 88"));

        let item = CfgKeyData::from_parts(0x12, 0x145, 16, 0x7788).unwrap();
        assert_eq!(item.to_vec(), hex("45 01 12 30 88 77"));

        let item = CfgKeyData::from_parts(0x06, 0x2d, 8, 0x55).unwrap();
        assert_eq!(item.to_vec(), hex("2D 00 06 20 55"));

        let item = CfgKeyData::from_parts(0x06, 0x2d, 1, false).unwrap();
        assert_eq!(item.to_vec(), hex("2D 00 06 10 00"));

        let item = CfgKeyData::from_parts(0xFF, 0x3FF, 8, 0x55).unwrap();
        assert_eq!(item.to_vec(), hex("FF 03 FF 20 55"));
    }

    #[test]
    fn pack_rejects_value_too_large() {
        let err = CfgKeyData::from_parts(0xFF, 0x3FF, 16, 0x1FFFF).unwrap_err();
        assert!(matches!(err, FrameError::ValueOutOfRange { .. }));

        let err = CfgKeyData::from_parts(0x06, 0x2d, 1, 2).unwrap_err();
        assert!(matches!(err, FrameError::ValueOutOfRange { .. }));
    }

    #[test]
    fn pack_rejects_invalid_ids() {
        let err = CfgKeyData::from_parts(0x100, 0, 16, 0x1234).unwrap_err();
        assert!(matches!(err, FrameError::InvalidKey { .. }));

        let err = CfgKeyData::from_parts(0, 0x1000, 16, 0x1234).unwrap_err();
        assert!(matches!(err, FrameError::InvalidKey { .. }));
    }

    #[test]
    fn signed_keys_accept_negative_values() {
        let item = CfgKeyData::from_key(keys::CFG_SFIMU_IMU_MNTALG_ROLL, -100).unwrap();
        assert_eq!(item.value, CfgValue::I16(-100));

        let err = CfgKeyData::from_key(keys::CFG_RATE_MEAS, -1).unwrap_err();
        assert!(matches!(err, FrameError::ValueOutOfRange { .. }));
    }
}
