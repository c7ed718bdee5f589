/// Running two-byte checksum used by the UBX envelope.
///
/// Both accumulators wrap modulo 256: `a += byte; b += a`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Checksum {
    a: u8,
    b: u8,
}

impl Checksum {
    /// Create a zeroed accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one byte.
    pub fn add(&mut self, byte: u8) {
        self.a = self.a.wrapping_add(byte);
        self.b = self.b.wrapping_add(self.a);
    }

    /// Feed a slice of bytes in order.
    pub fn update(&mut self, data: &[u8]) {
        for &byte in data {
            self.add(byte);
        }
    }

    /// Zero both accumulators.
    pub fn reset(&mut self) {
        self.a = 0;
        self.b = 0;
    }

    /// Current `(a, b)` pair.
    pub fn value(&self) -> (u8, u8) {
        (self.a, self.b)
    }

    /// Compare against a received checksum pair.
    pub fn matches(&self, a: u8, b: u8) -> bool {
        self.a == a && self.b == b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // class, id, length and payload of the MGA-INI-TIME_UTC sample frame
    const SAMPLE: [u8; 28] = [
        0x13, 0x40, 0x18, 0x00, 0x10, 0x00, 0x00, 0x12, 0xE4, 0x07, 0x09, 0x05, 0x06, 0x28, 0x30,
        0x00, 0x40, 0x28, 0xEF, 0x0C, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];

    #[test]
    fn new_checksum_is_zero() {
        let checksum = Checksum::new();
        assert!(checksum.matches(0x00, 0x00));
    }

    #[test]
    fn reset_clears_accumulators() {
        let mut checksum = Checksum::new();
        checksum.add(0xF0);
        checksum.add(0xE0);
        assert!(!checksum.matches(0x00, 0x00));

        checksum.reset();
        assert!(checksum.matches(0x00, 0x00));
    }

    #[test]
    fn sample_frame_checksum() {
        let mut checksum = Checksum::new();
        for byte in SAMPLE {
            checksum.add(byte);
        }
        assert!(checksum.matches(0x51, 0xAC));
        assert_eq!(checksum.value(), (0x51, 0xAC));
    }

    #[test]
    fn single_byte_corruption_is_detected() {
        for index in 0..SAMPLE.len() {
            let mut corrupted = SAMPLE;
            corrupted[index] ^= 0x01;

            let mut checksum = Checksum::new();
            checksum.update(&corrupted);
            assert!(
                !checksum.matches(0x51, 0xAC),
                "corruption at byte {index} not detected"
            );
        }
    }

    #[test]
    fn accumulators_wrap() {
        let mut checksum = Checksum::new();
        checksum.update(&[0xFF, 0xFF]);
        // a: 0xFF, 0xFE; b: 0xFF, 0xFD
        assert_eq!(checksum.value(), (0xFE, 0xFD));
    }
}
