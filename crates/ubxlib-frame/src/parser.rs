use std::collections::{HashSet, VecDeque};

use bytes::BytesMut;
use tracing::{debug, warn};

use crate::checksum::Checksum;
use crate::cid::Cid;
use crate::frame::{Frame, SYNC_1, SYNC_2};

/// Declared lengths above this are treated as line garbage.
pub const MAX_MESSAGE_LENGTH: usize = 1000;

/// Configuration for [`UbxParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserConfig {
    /// Largest payload length accepted before the frame is abandoned.
    pub max_message_length: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_message_length: MAX_MESSAGE_LENGTH,
        }
    }
}

/// An item produced by the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// A frame with a valid checksum whose identity passed the filter.
    Frame(Frame),
    /// A frame failed checksum verification.
    ChecksumError,
}

impl Packet {
    /// Identity of the packet; [`Cid::CHECKSUM_ERROR`] for checksum failures.
    pub fn cid(&self) -> Cid {
        match self {
            Packet::Frame(frame) => frame.cid,
            Packet::ChecksumError => Cid::CHECKSUM_ERROR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    WaitSync1,
    WaitSync2,
    Class,
    Id,
    LenLo,
    LenHi,
    Payload,
    CrcA,
    CrcB,
}

/// Byte-at-a-time UBX frame extractor.
///
/// Feed arbitrary chunks with [`process`](Self::process); accepted frames
/// and checksum failures are queued until taken with
/// [`packet`](Self::packet). Only identities in the active filter are
/// queued.
#[derive(Debug)]
pub struct UbxParser {
    config: ParserConfig,
    state: State,
    checksum: Checksum,
    class: u8,
    id: u8,
    len: usize,
    payload: BytesMut,
    ck_a: u8,
    filter: HashSet<Cid>,
    queue: VecDeque<Packet>,
    frames_rx: u64,
}

impl UbxParser {
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            state: State::WaitSync1,
            checksum: Checksum::new(),
            class: 0,
            id: 0,
            len: 0,
            payload: BytesMut::new(),
            ck_a: 0,
            filter: HashSet::new(),
            queue: VecDeque::new(),
            frames_rx: 0,
        }
    }

    /// Accept only `cid` from now on.
    pub fn set_filter(&mut self, cid: Cid) {
        self.set_filters([cid]);
    }

    /// Replace the active filter set.
    pub fn set_filters(&mut self, cids: impl IntoIterator<Item = Cid>) {
        self.filter = cids.into_iter().collect();
        if tracing::enabled!(tracing::Level::DEBUG) {
            for cid in &self.filter {
                debug!(%cid, "expecting");
            }
        }
    }

    /// Drop every identity from the filter; nothing is queued until re-armed.
    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    pub fn filters(&self) -> &HashSet<Cid> {
        &self.filter
    }

    /// Discard all queued packets.
    pub fn empty_queue(&mut self) {
        self.queue.clear();
    }

    /// Return to sync search without touching the queue.
    pub fn restart(&mut self) {
        self.state = State::WaitSync1;
    }

    /// Take the oldest queued packet.
    pub fn packet(&mut self) -> Option<Packet> {
        self.queue.pop_front()
    }

    /// Number of queued packets.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Frames received with a valid checksum, filtered or not.
    pub fn frames_rx(&self) -> u64 {
        self.frames_rx
    }

    /// Feed a chunk of raw bytes.
    pub fn process(&mut self, data: &[u8]) {
        for &byte in data {
            self.process_byte(byte);
        }
    }

    fn process_byte(&mut self, byte: u8) {
        match self.state {
            State::WaitSync1 => {
                if byte == SYNC_1 {
                    self.state = State::WaitSync2;
                }
            }
            State::WaitSync2 => {
                if byte == SYNC_2 {
                    self.reset_frame();
                    self.state = State::Class;
                } else {
                    self.state = State::WaitSync1;
                }
            }
            State::Class => {
                self.class = byte;
                self.checksum.add(byte);
                self.state = State::Id;
            }
            State::Id => {
                self.id = byte;
                self.checksum.add(byte);
                self.state = State::LenLo;
            }
            State::LenLo => {
                self.len = usize::from(byte);
                self.checksum.add(byte);
                self.state = State::LenHi;
            }
            State::LenHi => {
                self.len |= usize::from(byte) << 8;
                self.checksum.add(byte);
                if self.len == 0 {
                    self.state = State::CrcA;
                } else if self.len > self.config.max_message_length {
                    warn!(len = self.len, "invalid message length, resyncing");
                    self.state = State::WaitSync1;
                } else {
                    self.payload.reserve(self.len);
                    self.state = State::Payload;
                }
            }
            State::Payload => {
                self.payload.extend_from_slice(&[byte]);
                self.checksum.add(byte);
                if self.payload.len() == self.len {
                    self.state = State::CrcA;
                }
            }
            State::CrcA => {
                self.ck_a = byte;
                self.state = State::CrcB;
            }
            State::CrcB => {
                self.finish_frame(byte);
                self.state = State::WaitSync1;
            }
        }
    }

    fn finish_frame(&mut self, ck_b: u8) {
        let cid = Cid::new(self.class, self.id);
        if !self.checksum.matches(self.ck_a, ck_b) {
            warn!(%cid, len = self.len, "checksum error in frame, discarding");
            self.queue.push_back(Packet::ChecksumError);
            return;
        }

        self.frames_rx += 1;
        let payload = self.payload.split().freeze();
        if !self.filter.is_empty() && self.filter.contains(&cid) {
            self.queue.push_back(Packet::Frame(Frame::new(cid, payload)));
        } else {
            debug!(%cid, len = self.len, "no match, dropping frame");
        }
    }

    fn reset_frame(&mut self) {
        self.class = 0;
        self.id = 0;
        self.len = 0;
        self.payload.clear();
        self.ck_a = 0;
        self.checksum.reset();
    }
}

impl Default for UbxParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const FRAME_1: [u8; 32] = [
        0xB5, 0x62, 0x13, 0x40, 0x18, 0x00, 0x10, 0x00, 0x00, 0x12, 0xE4, 0x07, 0x09, 0x05, 0x06,
        0x28, 0x30, 0x00, 0x40, 0x28, 0xEF, 0x0C, 0x0A, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        0x51, 0xAC,
    ];

    const FRAME_1_CID: Cid = Cid::new(0x13, 0x40);

    fn armed(cid: Cid) -> UbxParser {
        let mut parser = UbxParser::new();
        parser.set_filter(cid);
        parser
    }

    #[test]
    fn no_frames() {
        let mut parser = UbxParser::new();
        assert_eq!(parser.packet(), None);
    }

    #[test]
    fn accepts_filtered_frame() {
        let mut parser = armed(FRAME_1_CID);
        parser.process(&FRAME_1);

        match parser.packet() {
            Some(Packet::Frame(frame)) => {
                assert_eq!(frame.cid, FRAME_1_CID);
                assert_eq!(frame.payload.as_ref(), &FRAME_1[6..30]);
            }
            other => panic!("expected frame, got {other:?}"),
        }
        assert_eq!(parser.packet(), None);
        assert_eq!(parser.frames_rx(), 1);
    }

    #[test]
    fn drops_other_class_or_id() {
        for cid in [Cid::new(0x12, 0x40), Cid::new(0x13, 0x41)] {
            let mut parser = armed(cid);
            parser.process(&FRAME_1);
            assert_eq!(parser.packet(), None);
            assert_eq!(parser.frames_rx(), 1);
        }
    }

    #[test]
    fn empty_filter_drops_everything() {
        let mut parser = UbxParser::new();
        parser.process(&FRAME_1);
        assert_eq!(parser.packet(), None);
    }

    #[test]
    fn multiple_filters() {
        let mut parser = UbxParser::new();
        parser.set_filters([
            Cid::new(0x12, 0x12),
            FRAME_1_CID,
            Cid::new(0xFF, 0x00),
            Cid::new(0xFF, 0x00),
        ]);
        assert_eq!(parser.filters().len(), 3);

        parser.process(&FRAME_1);
        assert_eq!(parser.packet().map(|p| p.cid()), Some(FRAME_1_CID));
    }

    #[test]
    fn change_filter_between_passes() {
        let mut parser = armed(FRAME_1_CID);
        parser.process(&FRAME_1);
        assert!(parser.packet().is_some());

        parser.set_filter(Cid::new(0x00, 0x00));
        parser.process(&FRAME_1);
        assert_eq!(parser.packet(), None);
    }

    #[test]
    fn chunked_input() {
        let mut parser = armed(FRAME_1_CID);
        for chunk in FRAME_1.chunks(3) {
            parser.process(chunk);
        }
        assert_eq!(parser.packet().map(|p| p.cid()), Some(FRAME_1_CID));
    }

    #[test]
    fn checksum_error_queues_sentinel() {
        let mut frame = FRAME_1;
        frame[31] = frame[31].wrapping_add(1);

        // the sentinel is queued regardless of the filter
        let mut parser = armed(Cid::new(0x13, 0x41));
        parser.process(&frame);

        let packet = parser.packet().expect("should queue checksum error");
        assert_eq!(packet, Packet::ChecksumError);
        assert_eq!(packet.cid(), Cid::CHECKSUM_ERROR);
        assert_eq!(parser.frames_rx(), 0);
    }

    #[test]
    fn any_corrupted_byte_is_rejected_without_desync() {
        for index in 2..30 {
            let mut corrupted = FRAME_1;
            corrupted[index] ^= 0x01;
            // a corrupted length makes the parser wait for more payload;
            // skip those, they are covered by the length tests
            if index == 4 || index == 5 {
                continue;
            }

            let mut parser = armed(FRAME_1_CID);
            parser.process(&corrupted);
            assert_eq!(
                parser.packet(),
                Some(Packet::ChecksumError),
                "byte {index}"
            );

            parser.process(&FRAME_1);
            assert_eq!(
                parser.packet().map(|p| p.cid()),
                Some(FRAME_1_CID),
                "byte {index}"
            );
        }
    }

    #[test]
    fn oversized_length_is_abandoned() {
        let mut frame = FRAME_1;
        // 0x03e9 = 1001
        frame[4] = 0xe9;
        frame[5] = 0x03;

        let mut parser = armed(FRAME_1_CID);
        parser.process(&frame);
        assert_eq!(parser.packet(), None);
    }

    #[test]
    fn oversized_length_keeps_following_frame() {
        let mut wire = vec![0xB5, 0x62, 0x13, 0x40, 0xe9, 0x03];
        wire.extend_from_slice(&FRAME_1);

        let mut parser = armed(FRAME_1_CID);
        parser.process(&wire);
        assert_eq!(parser.packet().map(|p| p.cid()), Some(FRAME_1_CID));
        assert_eq!(parser.packet(), None);
    }

    #[test]
    fn resync_after_garbage_with_false_sync() {
        let mut wire = FRAME_1.to_vec();
        // false sync pair followed by a zero length frame header and junk
        wire.extend_from_slice(&[0x00, 0xB5, 0x00, 0xB5, 0x62, 0x01, 0x02, 0x00, 0x00, 0x77, 0x88]);
        wire.extend_from_slice(&FRAME_1);

        let mut parser = armed(FRAME_1_CID);
        parser.process(&wire);

        assert_eq!(parser.packet().map(|p| p.cid()), Some(FRAME_1_CID));
        // the embedded empty frame fails its checksum
        assert_eq!(parser.packet(), Some(Packet::ChecksumError));
        assert_eq!(parser.packet().map(|p| p.cid()), Some(FRAME_1_CID));
        assert_eq!(parser.packet(), None);
    }

    #[test]
    fn zero_length_frame() {
        let wire = Frame::new(Cid::new(0x0A, 0x04), Vec::new()).to_bytes().unwrap();
        let mut parser = armed(Cid::new(0x0A, 0x04));
        parser.process(&wire);

        match parser.packet() {
            Some(Packet::Frame(frame)) => assert!(frame.payload.is_empty()),
            other => panic!("expected empty frame, got {other:?}"),
        }
    }

    #[test]
    fn restart_keeps_queue() {
        let mut parser = armed(FRAME_1_CID);
        parser.process(&FRAME_1);
        parser.process(&FRAME_1[..10]);
        parser.restart();
        parser.process(&FRAME_1);

        assert_eq!(parser.pending(), 2);
        parser.empty_queue();
        assert_eq!(parser.packet(), None);
    }

    #[test]
    fn configurable_max_length() {
        let mut parser = UbxParser::with_config(ParserConfig {
            max_message_length: 16,
        });
        parser.set_filter(FRAME_1_CID);
        parser.process(&FRAME_1);
        assert_eq!(parser.packet(), None);
    }
}
