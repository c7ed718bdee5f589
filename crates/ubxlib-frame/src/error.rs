/// Errors that can occur while encoding or decoding frames and fields.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// Not enough bytes left to decode a field.
    #[error("truncated data for {field} ({needed} bytes needed, {available} available)")]
    Truncated {
        field: String,
        needed: usize,
        available: usize,
    },

    /// A string does not fit its fixed-size field.
    #[error("string too long for {field} ({len} bytes, max {max})")]
    StringTooLong {
        field: String,
        len: usize,
        max: usize,
    },

    /// A string field contains bytes that are not valid UTF-8.
    #[error("invalid string data in {field}")]
    InvalidString { field: String },

    /// A value does not fit the width of its field.
    #[error("value {value} out of range for {field}")]
    ValueOutOfRange { field: String, value: String },

    /// A field with this name already exists in the field set.
    #[error("duplicate field {0}")]
    DuplicateField(String),

    /// No field with this name exists in the field set.
    #[error("unknown field {0}")]
    UnknownField(String),

    /// The value does not match the field kind.
    #[error("type mismatch for {field}: expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
    },

    /// The size code of a configuration key is not one of the defined codes.
    #[error("invalid size code {0} in configuration key")]
    InvalidSizeCode(u8),

    /// Group or item id of a configuration key is out of range.
    #[error("invalid configuration key (group {group:#x}, item {item:#x})")]
    InvalidKey { group: u32, item: u32 },

    /// The payload exceeds what the 16-bit length field can describe.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
