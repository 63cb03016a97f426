// src/common/packet.rs

use super::crc::{calculate_crc16, encode_trailer, TRAILER_LEN};

/// Length of one optical-link packet: two payload bytes plus the CRC trailer.
pub const PACKET_LEN: usize = 4;
/// Payload bytes ahead of the trailer.
pub const PAYLOAD_LEN: usize = PACKET_LEN - TRAILER_LEN;
/// One period measurement per bit of a packet.
pub const RING_CAPACITY: usize = PACKET_LEN * 8;

/// A raw packet as recovered from the link, trailer included.
pub type Packet = [u8; PACKET_LEN];

/// Sets bit `index` (counted MSB-first across the whole packet) to `bit`.
#[inline]
pub fn set_bit(packet: &mut Packet, index: usize, bit: bool) {
    let mask = 0x80 >> (index % 8);
    if bit {
        packet[index / 8] |= mask;
    } else {
        packet[index / 8] &= !mask;
    }
}

/// Bits of `packet` in transmission order (MSB-first per byte).
pub fn bits_msb_first(packet: &Packet) -> impl Iterator<Item = bool> + '_ {
    (0..RING_CAPACITY).map(move |i| packet[i / 8] & (0x80 >> (i % 8)) != 0)
}

/// Frames a payload with its bit-reversed CRC trailer, ready for transmission.
pub fn frame_payload(payload: [u8; PAYLOAD_LEN]) -> Packet {
    let [t0, t1] = encode_trailer(calculate_crc16(&payload));
    [payload[0], payload[1], t0, t1]
}

// --- Unit Tests ---
#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::crc::verify_packet_trailer;

    #[test]
    fn test_set_bit_msb_first() {
        let mut packet = [0u8; PACKET_LEN];
        set_bit(&mut packet, 0, true);
        set_bit(&mut packet, 15, true);
        set_bit(&mut packet, 17, true);
        assert_eq!(packet, [0x80, 0x01, 0x40, 0x00]);
        set_bit(&mut packet, 0, false);
        assert_eq!(packet[0], 0x00);
    }

    #[test]
    fn test_bits_msb_first_order() {
        let packet = [0xA0, 0x00, 0x00, 0x01];
        let bits: Vec<bool> = bits_msb_first(&packet).collect();
        assert_eq!(bits.len(), RING_CAPACITY);
        assert!(bits[0] && !bits[1] && bits[2]);
        assert!(bits[31]);
        assert_eq!(bits.iter().filter(|b| **b).count(), 3);
    }

    #[test]
    fn test_frame_payload() {
        let packet = frame_payload([0x12, 0x83]);
        assert_eq!(packet, [0x12, 0x83, 0x23, 0x5F]);
        assert!(verify_packet_trailer(&packet).is_ok());
    }
}
