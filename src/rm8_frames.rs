//! Command frames understood by the relay board.
//!
//! Every frame has the layout `55 AA 01 02 00 <relay> <state> <checksum>` where
//! the checksum is the low byte of the sum of the seven preceding bytes. The two
//! tables below are the complete set of frames the board accepts.

use crate::rm8_types::RelayId;
use crate::rm8_types::RelayState;

pub const FRAME_LEN: usize = 8;

pub type Frame = [u8; FRAME_LEN];

pub const RELAY_LOW: [Frame; 8] = [
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x01, 0x00, 0x03],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x02, 0x00, 0x04],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x03, 0x00, 0x05],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x04, 0x00, 0x06],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x05, 0x00, 0x07],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x06, 0x00, 0x08],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x07, 0x00, 0x09],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x08, 0x00, 0x0A],
];

pub const RELAY_HIGH: [Frame; 8] = [
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x01, 0x01, 0x04],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x02, 0x01, 0x05],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x03, 0x01, 0x06],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x04, 0x01, 0x07],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x05, 0x01, 0x08],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x06, 0x01, 0x09],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x07, 0x01, 0x0A],
    [0x55, 0xAA, 0x01, 0x02, 0x00, 0x08, 0x01, 0x0B],
];

/// The only reply the board sends for an executed command.
pub const ACK: [u8; 7] = [0x55, 0xAA, 0x01, 0x01, 0xFF, 0x00, 0x00];

pub fn frame_for(relay: &RelayId, state: RelayState) -> &'static Frame {
    match state {
        RelayState::On => &RELAY_HIGH[relay.index()],
        RelayState::Off => &RELAY_LOW[relay.index()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_frames() -> Vec<(RelayId, RelayState, &'static Frame)> {
        let mut frames = Vec::new();
        for relay in RelayId::ALL {
            for state in [RelayState::On, RelayState::Off] {
                frames.push((relay, state, frame_for(&relay, state)));
            }
        }
        frames
    }

    #[test]
    fn lookup_is_injective() {
        let frames = all_frames();
        assert_eq!(frames.len(), 16);
        let distinct: HashSet<&Frame> = frames.iter().map(|f| f.2).collect();
        assert_eq!(distinct.len(), 16);
    }

    #[test]
    fn lookup_is_deterministic() {
        for (relay, state, frame) in all_frames() {
            assert_eq!(frame_for(&relay, state), frame);
        }
    }

    #[test]
    fn checksum_is_low_byte_of_sum() {
        for (_, _, frame) in all_frames() {
            let sum: u32 = frame[..7].iter().map(|b| *b as u32).sum();
            assert_eq!(frame[7], (sum & 0xFF) as u8, "{:02X?}", frame);
        }
    }

    #[test]
    fn frames_address_relay_and_state() {
        for (relay, state, frame) in all_frames() {
            assert_eq!(&frame[..5], &[0x55, 0xAA, 0x01, 0x02, 0x00]);
            assert_eq!(frame[5], relay.number());
            assert_eq!(frame[6], state.is_on() as u8);
        }
    }
}
