use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitStart,
    Data,
    ChecksumHi,
    ChecksumLo,
    LineEnd,
}

/// Counts valid NMEA sentences in an arbitrary byte stream.
///
/// ```text
/// $GNRMC,155215.00,A,4719.13883,N,00758.44996,E,0.259,,171020,2.47,E,A*3E\r\n
/// ```
///
/// Sentences are not decoded; the counter serves as a liveness signal when
/// probing the line bitrate. Binary frames on the same stream are skipped
/// while scanning for `$`.
#[derive(Debug, Clone)]
pub struct NmeaParser {
    state: State,
    checksum: u8,
    expected: u8,
    len: usize,
    frames_rx: u64,
}

impl NmeaParser {
    pub fn new() -> Self {
        Self {
            state: State::WaitStart,
            checksum: 0,
            expected: 0,
            len: 0,
            frames_rx: 0,
        }
    }

    /// Sentences received with a valid checksum.
    pub fn frames_rx(&self) -> u64 {
        self.frames_rx
    }

    pub fn restart(&mut self) {
        self.state = State::WaitStart;
    }

    pub fn process(&mut self, data: &[u8]) {
        for &byte in data {
            self.process_byte(byte);
        }
    }

    fn process_byte(&mut self, byte: u8) {
        // `$` always starts a new sentence
        if byte == b'$' {
            self.checksum = 0;
            self.expected = 0;
            self.len = 0;
            self.state = State::Data;
            return;
        }

        match self.state {
            State::WaitStart => {}
            State::Data => {
                if byte == b'*' {
                    self.state = State::ChecksumHi;
                } else {
                    self.checksum ^= byte;
                    self.len += 1;
                }
            }
            State::ChecksumHi => match hex_nibble(byte) {
                Some(nibble) => {
                    self.expected = nibble << 4;
                    self.state = State::ChecksumLo;
                }
                None => self.state = State::WaitStart,
            },
            State::ChecksumLo => match hex_nibble(byte) {
                Some(nibble) => {
                    self.expected |= nibble;
                    if self.expected == self.checksum {
                        self.frames_rx += 1;
                        debug!(len = self.len, "nmea sentence received");
                    } else {
                        warn!("checksum error in nmea sentence, discarding");
                    }
                    self.state = State::LineEnd;
                }
                None => self.state = State::WaitStart,
            },
            State::LineEnd => {
                if byte == b'\n' {
                    self.state = State::WaitStart;
                }
            }
        }
    }
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Value of an ASCII hex digit.
pub fn hex_nibble(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => {
            debug!(byte, "invalid checksum character");
            None
        }
    }
}
