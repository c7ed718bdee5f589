use std::fmt;

/// Frame identity: the `(class, id)` pair naming a UBX message type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cid {
    pub class: u8,
    pub id: u8,
}

impl Cid {
    pub const CLASS_NAV: u8 = 0x01;
    pub const CLASS_ACK: u8 = 0x05;
    pub const CLASS_CFG: u8 = 0x06;
    pub const CLASS_UPD: u8 = 0x09;
    pub const CLASS_MON: u8 = 0x0A;
    pub const CLASS_ESF: u8 = 0x10;
    pub const CLASS_MGA: u8 = 0x13;

    /// Reserved identity reported for frames that failed checksum verification.
    /// No receiver message uses class 0x00.
    pub const CHECKSUM_ERROR: Cid = Cid::new(0x00, 0x01);

    pub const fn new(class: u8, id: u8) -> Self {
        Self { class, id }
    }

    /// Whether this identity belongs to the configuration class.
    pub fn is_cfg(&self) -> bool {
        self.class == Self::CLASS_CFG
    }
}

impl fmt::Display for Cid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cls:{:02x} id:{:02x}", self.class, self.id)
    }
}

impl From<(u8, u8)> for Cid {
    fn from((class, id): (u8, u8)) -> Self {
        Self::new(class, id)
    }
}
