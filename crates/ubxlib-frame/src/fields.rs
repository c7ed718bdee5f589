//! Typed field descriptors and ordered field sets.
//!
//! All multi-byte integers are little endian. A [`FieldSet`] packs and
//! unpacks its fields strictly in declaration order.

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::cfgkey::CfgKeyData;
use crate::error::{FrameError, Result};

/// Wire type of a field.
///
/// `X` kinds are bitfields; they are stored like unsigned integers and
/// read with [`bit`] / [`with_bit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    U1,
    U2,
    U4,
    U8,
    I1,
    I2,
    I4,
    I8,
    X1,
    X2,
    X4,
    X8,
    /// Fixed-length character string, zero padded.
    Chars(usize),
    /// Reserved bytes, always packed as zero.
    Padding(usize),
    /// Configuration key followed by a value of key-dependent width.
    KeyValue,
}

impl FieldKind {
    /// Wire size in bytes, `None` when it depends on the content.
    pub fn size(self) -> Option<usize> {
        match self {
            FieldKind::U1 | FieldKind::I1 | FieldKind::X1 => Some(1),
            FieldKind::U2 | FieldKind::I2 | FieldKind::X2 => Some(2),
            FieldKind::U4 | FieldKind::I4 | FieldKind::X4 => Some(4),
            FieldKind::U8 | FieldKind::I8 | FieldKind::X8 => Some(8),
            FieldKind::Chars(n) | FieldKind::Padding(n) => Some(n),
            FieldKind::KeyValue => None,
        }
    }

    /// Smallest number of bytes this kind can occupy.
    pub fn min_size(self) -> usize {
        // key plus a one byte value
        self.size().unwrap_or(5)
    }

    fn is_signed(self) -> bool {
        matches!(
            self,
            FieldKind::I1 | FieldKind::I2 | FieldKind::I4 | FieldKind::I8
        )
    }

    fn default_value(self) -> Value {
        match self {
            FieldKind::I1 | FieldKind::I2 | FieldKind::I4 | FieldKind::I8 => Value::Signed(0),
            FieldKind::Chars(_) => Value::Text(String::new()),
            FieldKind::Padding(_) => Value::Padding,
            FieldKind::KeyValue => Value::Unset,
            _ => Value::Unsigned(0),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            FieldKind::I1 | FieldKind::I2 | FieldKind::I4 | FieldKind::I8 => "signed integer",
            FieldKind::Chars(_) => "string",
            FieldKind::Padding(_) => "padding",
            FieldKind::KeyValue => "configuration item",
            _ => "unsigned integer",
        }
    }
}

/// Current value of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Unsigned(u64),
    Signed(i64),
    Text(String),
    Padding,
    KeyValue(CfgKeyData),
    /// A configuration item that has not been assigned or decoded yet.
    Unset,
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Unsigned(v) => write!(f, "{v}"),
            Value::Signed(v) => write!(f, "{v}"),
            Value::Text(v) => write!(f, "{v:?}"),
            Value::Padding => f.write_str("-"),
            Value::KeyValue(v) => write!(f, "{v}"),
            Value::Unset => f.write_str("<unset>"),
        }
    }
}

/// A named, typed field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    kind: FieldKind,
    value: Value,
}

impl Field {
    /// Create a field holding the zero value of its kind.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: kind.default_value(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Replace the value, checking it matches the field kind.
    ///
    /// Range is checked when packing.
    pub fn set(&mut self, value: Value) -> Result<()> {
        let compatible = match (&value, self.kind) {
            (Value::Signed(_), kind) => kind.is_signed(),
            (Value::Unsigned(_), FieldKind::Chars(_) | FieldKind::Padding(_)) => false,
            (Value::Unsigned(_), FieldKind::KeyValue) => false,
            (Value::Unsigned(_), kind) => !kind.is_signed(),
            (Value::Text(_), FieldKind::Chars(_)) => true,
            (Value::Padding, FieldKind::Padding(_)) => true,
            (Value::KeyValue(_), FieldKind::KeyValue) => true,
            _ => false,
        };
        if !compatible {
            return Err(self.mismatch());
        }
        self.value = value;
        Ok(())
    }

    /// Append the wire representation to `dst`.
    pub fn pack_into(&self, dst: &mut BytesMut) -> Result<()> {
        match (self.kind, &self.value) {
            (FieldKind::U1 | FieldKind::X1, Value::Unsigned(v)) => dst.put_u8(self.fit(*v)?),
            (FieldKind::U2 | FieldKind::X2, Value::Unsigned(v)) => dst.put_u16_le(self.fit(*v)?),
            (FieldKind::U4 | FieldKind::X4, Value::Unsigned(v)) => dst.put_u32_le(self.fit(*v)?),
            (FieldKind::U8 | FieldKind::X8, Value::Unsigned(v)) => dst.put_u64_le(*v),
            (FieldKind::I1, Value::Signed(v)) => dst.put_i8(self.fit(*v)?),
            (FieldKind::I2, Value::Signed(v)) => dst.put_i16_le(self.fit(*v)?),
            (FieldKind::I4, Value::Signed(v)) => dst.put_i32_le(self.fit(*v)?),
            (FieldKind::I8, Value::Signed(v)) => dst.put_i64_le(*v),
            (FieldKind::Chars(n), Value::Text(text)) => {
                let bytes = text.as_bytes();
                if bytes.len() > n {
                    return Err(FrameError::StringTooLong {
                        field: self.name.clone(),
                        len: bytes.len(),
                        max: n,
                    });
                }
                dst.put_slice(bytes);
                dst.put_bytes(0, n - bytes.len());
            }
            (FieldKind::Padding(n), _) => dst.put_bytes(0, n),
            (FieldKind::KeyValue, Value::KeyValue(item)) => item.pack_into(dst),
            _ => return Err(self.mismatch()),
        }
        Ok(())
    }

    /// Decode this field from the front of `src`, returning the bytes consumed.
    pub fn unpack(&mut self, src: &[u8]) -> Result<usize> {
        if self.kind == FieldKind::KeyValue {
            let (item, consumed) = CfgKeyData::unpack(src)?;
            self.value = Value::KeyValue(item);
            return Ok(consumed);
        }

        let size = self.kind.size().unwrap_or(0);
        if src.len() < size {
            return Err(FrameError::Truncated {
                field: self.name.clone(),
                needed: size,
                available: src.len(),
            });
        }

        let mut buf = &src[..size];
        self.value = match self.kind {
            FieldKind::U1 | FieldKind::X1 => Value::Unsigned(u64::from(buf.get_u8())),
            FieldKind::U2 | FieldKind::X2 => Value::Unsigned(u64::from(buf.get_u16_le())),
            FieldKind::U4 | FieldKind::X4 => Value::Unsigned(u64::from(buf.get_u32_le())),
            FieldKind::U8 | FieldKind::X8 => Value::Unsigned(buf.get_u64_le()),
            FieldKind::I1 => Value::Signed(i64::from(buf.get_i8())),
            FieldKind::I2 => Value::Signed(i64::from(buf.get_i16_le())),
            FieldKind::I4 => Value::Signed(i64::from(buf.get_i32_le())),
            FieldKind::I8 => Value::Signed(buf.get_i64_le()),
            FieldKind::Chars(_) => {
                let end = buf.iter().rposition(|&b| b != 0).map_or(0, |pos| pos + 1);
                let text = std::str::from_utf8(&buf[..end]).map_err(|_| {
                    FrameError::InvalidString {
                        field: self.name.clone(),
                    }
                })?;
                Value::Text(text.to_string())
            }
            FieldKind::Padding(_) => Value::Padding,
            FieldKind::KeyValue => Value::Unset,
        };
        Ok(size)
    }

    fn fit<T, V>(&self, value: V) -> Result<T>
    where
        T: TryFrom<V>,
        V: Copy + fmt::Display,
    {
        T::try_from(value).map_err(|_| FrameError::ValueOutOfRange {
            field: self.name.clone(),
            value: value.to_string(),
        })
    }

    fn mismatch(&self) -> FrameError {
        FrameError::TypeMismatch {
            field: self.name.clone(),
            expected: self.kind.expected(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.value)
    }
}

/// Fields in declaration order, addressable by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    fields: Vec<Field>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Names must be unique within the set.
    pub fn add(&mut self, field: Field) -> Result<()> {
        if self.position(&field.name).is_some() {
            return Err(FrameError::DuplicateField(field.name));
        }
        self.fields.push(field);
        Ok(())
    }

    /// Append all fields of `other`, keeping their order.
    pub fn append(&mut self, other: FieldSet) -> Result<()> {
        for field in other.fields {
            self.add(field)?;
        }
        Ok(())
    }

    pub(crate) fn push_unchecked(&mut self, field: Field) {
        debug_assert!(
            self.position(&field.name).is_none(),
            "duplicate field {}",
            field.name
        );
        self.fields.push(field);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.field(name).map(Field::value)
    }

    /// Set a field value by name.
    pub fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| FrameError::UnknownField(name.to_string()))?;
        self.fields[index].set(value)
    }

    pub fn get_u(&self, name: &str) -> Result<u64> {
        match self.require(name)? {
            Value::Unsigned(v) => Ok(*v),
            _ => Err(mismatch(name, "unsigned integer")),
        }
    }

    pub fn get_i(&self, name: &str) -> Result<i64> {
        match self.require(name)? {
            Value::Signed(v) => Ok(*v),
            _ => Err(mismatch(name, "signed integer")),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<&str> {
        match self.require(name)? {
            Value::Text(v) => Ok(v),
            _ => Err(mismatch(name, "string")),
        }
    }

    pub fn get_key_value(&self, name: &str) -> Result<&CfgKeyData> {
        match self.require(name)? {
            Value::KeyValue(v) => Ok(v),
            _ => Err(mismatch(name, "configuration item")),
        }
    }

    pub fn set_u(&mut self, name: &str, value: u64) -> Result<()> {
        self.set(name, Value::Unsigned(value))
    }

    pub fn set_i(&mut self, name: &str, value: i64) -> Result<()> {
        self.set(name, Value::Signed(value))
    }

    pub fn set_str(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.set(name, Value::Text(value.into()))
    }

    /// Pack all fields in declaration order.
    pub fn pack(&self) -> Result<Bytes> {
        let mut dst = BytesMut::with_capacity(self.min_size());
        self.pack_into(&mut dst)?;
        Ok(dst.freeze())
    }

    pub fn pack_into(&self, dst: &mut BytesMut) -> Result<()> {
        for field in &self.fields {
            field.pack_into(dst)?;
        }
        Ok(())
    }

    /// Unpack fields in declaration order and return the unconsumed tail.
    pub fn unpack<'a>(&mut self, data: &'a [u8]) -> Result<&'a [u8]> {
        let mut rest = data;
        for field in &mut self.fields {
            let consumed = field.unpack(rest)?;
            rest = &rest[consumed..];
        }
        Ok(rest)
    }

    fn min_size(&self) -> usize {
        self.fields.iter().map(|field| field.kind.min_size()).sum()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    fn require(&self, name: &str) -> Result<&Value> {
        self.get(name)
            .ok_or_else(|| FrameError::UnknownField(name.to_string()))
    }
}

impl fmt::Display for FieldSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for field in &self.fields {
            write!(f, "\n  {field}")?;
        }
        Ok(())
    }
}

fn mismatch(name: &str, expected: &'static str) -> FrameError {
    FrameError::TypeMismatch {
        field: name.to_string(),
        expected,
    }
}

/// Test bit `n` of a bitfield value.
pub fn bit(value: u64, n: u32) -> bool {
    n < 64 && value & (1 << n) != 0
}

/// Return `value` with bit `n` set or cleared.
pub fn with_bit(value: u64, n: u32, on: bool) -> u64 {
    if n >= 64 {
        return value;
    }
    if on {
        value | (1 << n)
    } else {
        value & !(1 << n)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cfgkey::{keys, CfgValue};

    fn set_of(fields: &[(&str, FieldKind)]) -> FieldSet {
        let mut set = FieldSet::new();
        for (name, kind) in fields {
            set.add(Field::new(*name, *kind)).unwrap();
        }
        set
    }

    #[test]
    fn pack_in_declaration_order() {
        let mut set = set_of(&[
            ("a", FieldKind::I4),
            ("b", FieldKind::U1),
            ("pad", FieldKind::Padding(3)),
            ("c", FieldKind::I4),
        ]);
        set.set_i("a", i64::from(0x9876_5432_u32 as i32)).unwrap();
        set.set_u("b", 0xAF).unwrap();
        set.set_i("c", i64::from(0xcafe_babe_u32 as i32)).unwrap();

        assert_eq!(
            set.pack().unwrap().as_ref(),
            &[0x32, 0x54, 0x76, 0x98, 0xAF, 0x00, 0x00, 0x00, 0xbe, 0xba, 0xfe, 0xca]
        );
    }

    #[test]
    fn unpack_in_declaration_order() {
        let mut set = set_of(&[
            ("z", FieldKind::U2),
            ("a", FieldKind::I2),
            ("m", FieldKind::U4),
        ]);
        let rest = set
            .unpack(&[0x01, 0x02, 0xFE, 0xFF, 0x78, 0x56, 0x34, 0x12])
            .unwrap();

        assert!(rest.is_empty());
        assert_eq!(set.get_u("z").unwrap(), 0x0201);
        assert_eq!(set.get_i("a").unwrap(), -2);
        assert_eq!(set.get_u("m").unwrap(), 0x1234_5678);
    }

    #[test]
    fn unpack_returns_trailing_bytes() {
        let mut set = set_of(&[("count", FieldKind::U1)]);
        let rest = set.unpack(&[0x02, 0xAA, 0xBB]).unwrap();
        assert_eq!(rest, &[0xAA, 0xBB]);
        assert_eq!(set.get_u("count").unwrap(), 2);
    }

    #[test]
    fn unpack_truncated_buffer_fails() {
        let mut set = set_of(&[("a", FieldKind::U1), ("b", FieldKind::U4)]);
        let err = set.unpack(&[0x01, 0x02, 0x03]).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                needed: 4,
                available: 2,
                ..
            }
        ));
    }

    #[test]
    fn duplicate_names_rejected() {
        let mut set = set_of(&[("a", FieldKind::U1)]);
        let err = set.add(Field::new("a", FieldKind::U2)).unwrap_err();
        assert!(matches!(err, FrameError::DuplicateField(name) if name == "a"));
    }

    #[test]
    fn values_round_trip_through_wire() {
        let mut set = set_of(&[
            ("u1", FieldKind::U1),
            ("u8", FieldKind::U8),
            ("i1", FieldKind::I1),
            ("i8", FieldKind::I8),
            ("flags", FieldKind::X2),
            ("name", FieldKind::Chars(6)),
        ]);
        set.set_u("u1", 0xFF).unwrap();
        set.set_u("u8", u64::MAX).unwrap();
        set.set_i("i1", -128).unwrap();
        set.set_i("i8", i64::MIN).unwrap();
        set.set_u("flags", 0x8001).unwrap();
        set.set_str("name", "ROM").unwrap();

        let wire = set.pack().unwrap();
        assert_eq!(wire.len(), 1 + 8 + 1 + 8 + 2 + 6);

        let mut decoded = set_of(&[
            ("u1", FieldKind::U1),
            ("u8", FieldKind::U8),
            ("i1", FieldKind::I1),
            ("i8", FieldKind::I8),
            ("flags", FieldKind::X2),
            ("name", FieldKind::Chars(6)),
        ]);
        decoded.unpack(&wire).unwrap();
        assert_eq!(decoded, set);
    }

    #[test]
    fn out_of_range_value_fails_on_pack() {
        let mut set = set_of(&[("small", FieldKind::U1)]);
        set.set_u("small", 0x100).unwrap();
        let err = set.pack().unwrap_err();
        assert!(matches!(err, FrameError::ValueOutOfRange { .. }));

        let mut set = set_of(&[("signed", FieldKind::I2)]);
        set.set_i("signed", -40_000).unwrap();
        assert!(set.pack().is_err());
    }

    #[test]
    fn typed_access_checks_kind() {
        let mut set = set_of(&[("a", FieldKind::U1), ("s", FieldKind::Chars(4))]);
        assert!(matches!(
            set.set_i("a", -1),
            Err(FrameError::TypeMismatch { .. })
        ));
        assert!(matches!(
            set.set_u("s", 1),
            Err(FrameError::TypeMismatch { .. })
        ));
        assert!(matches!(set.get_str("a"), Err(FrameError::TypeMismatch { .. })));
        assert!(matches!(set.get_u("missing"), Err(FrameError::UnknownField(_))));
    }

    #[test]
    fn chars_pad_on_pack() {
        let mut set = set_of(&[("s", FieldKind::Chars(4))]);
        set.set_str("s", "AB").unwrap();
        assert_eq!(set.pack().unwrap().as_ref(), &[0x41, 0x42, 0x00, 0x00]);

        set.set_str("s", "1234").unwrap();
        assert_eq!(set.pack().unwrap().as_ref(), b"1234");
    }

    #[test]
    fn chars_strip_trailing_zeros_on_unpack() {
        let mut set = set_of(&[("s", FieldKind::Chars(10))]);
        set.unpack(&[0x41, 0x42, 0x43, 0x44, 0x45, 0x00, 0x00, 0x00, 0x00, 0x00])
            .unwrap();
        assert_eq!(set.get_str("s").unwrap(), "ABCDE");
    }

    #[test]
    fn chars_too_long_fails() {
        let mut set = set_of(&[("s", FieldKind::Chars(6))]);
        set.set_str("s", "1234567").unwrap();
        let err = set.pack().unwrap_err();
        assert!(matches!(err, FrameError::StringTooLong { len: 7, max: 6, .. }));
    }

    #[test]
    fn chars_short_buffer_fails() {
        let mut set = set_of(&[("s", FieldKind::Chars(5))]);
        assert!(matches!(
            set.unpack(&[0x31, 0x32]),
            Err(FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn chars_invalid_encoding_fails() {
        let mut set = set_of(&[("s", FieldKind::Chars(2))]);
        assert!(matches!(
            set.unpack(&[0xd8, 0x00]),
            Err(FrameError::InvalidString { .. })
        ));
    }

    #[test]
    fn padding_ignores_content() {
        let mut set = set_of(&[("pad", FieldKind::Padding(2)), ("v", FieldKind::U1)]);
        set.unpack(&[0xDE, 0xAD, 0x07]).unwrap();
        assert_eq!(set.get("pad"), Some(&Value::Padding));
        assert_eq!(set.get_u("v").unwrap(), 7);
        assert_eq!(set.pack().unwrap().as_ref(), &[0x00, 0x00, 0x07]);
    }

    #[test]
    fn key_value_field() {
        let mut set = set_of(&[("item", FieldKind::KeyValue)]);
        assert!(set.pack().is_err());

        let item = CfgKeyData::from_key(keys::CFG_RATE_MEAS, 250).unwrap();
        set.set("item", Value::KeyValue(item)).unwrap();
        let wire = set.pack().unwrap();
        assert_eq!(wire.as_ref(), &[0x01, 0x00, 0x21, 0x30, 0xFA, 0x00]);

        let mut decoded = set_of(&[("item", FieldKind::KeyValue)]);
        decoded.unpack(&wire).unwrap();
        assert_eq!(
            decoded.get_key_value("item").unwrap().value,
            CfgValue::U16(250)
        );
    }

    #[test]
    fn bit_helpers() {
        assert!(bit(0b0100, 2));
        assert!(!bit(0b0100, 1));
        assert!(!bit(u64::MAX, 64));
        assert_eq!(with_bit(0, 0, true), 1);
        assert_eq!(with_bit(0b11, 1, false), 0b01);
        assert_eq!(with_bit(5, 70, true), 5);
    }
}
