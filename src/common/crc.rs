// src/common/crc.rs

use super::error::FrameReject;
use crc::{Crc, CRC_16_XMODEM};

/// CRC-16/XMODEM as used by the optical link.
/// Polynomial: 0x1021
/// Initial Value: 0x0000
/// Input Reflected: false
/// Output Reflected: false
/// Final XOR: 0x0000
/// Check Value: 0x31C3 (for "123456789")
const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&CRC_16_XMODEM);

/// Number of trailer bytes carrying the CRC at the end of a packet.
pub const TRAILER_LEN: usize = 2;

/// Calculates the CRC-16/XMODEM of `data`.
#[inline]
pub fn calculate_crc16(data: &[u8]) -> u16 {
    CRC_COMPUTER.checksum(data)
}

/// Returns `b` with its bit order reversed (bit 7 becomes bit 0).
#[inline]
pub const fn reverse_bits(b: u8) -> u8 {
    b.reverse_bits()
}

/// Encodes a CRC into the two trailer bytes as they appear on the wire.
///
/// The transmitter sends each trailer byte bit-reversed relative to the payload,
/// high byte first.
pub fn encode_trailer(crc_value: u16) -> [u8; TRAILER_LEN] {
    let [hi, lo] = crc_value.to_be_bytes();
    [reverse_bits(hi), reverse_bits(lo)]
}

/// Verifies a packet whose last two bytes are a bit-reversed CRC-16/XMODEM trailer
/// over all preceding bytes.
///
/// # Returns
///
/// * `Ok(())` if the trailer matches.
/// * `Err(FrameReject::TooShort)` if there is no room for a trailer.
/// * `Err(FrameReject::ChecksumMismatch)` otherwise.
pub fn verify_packet_trailer(packet: &[u8]) -> Result<(), FrameReject> {
    if packet.len() < TRAILER_LEN {
        return Err(FrameReject::TooShort);
    }
    let data_len = packet.len() - TRAILER_LEN;
    let calculated = calculate_crc16(&packet[..data_len]);
    let received = u16::from_be_bytes([
        reverse_bits(packet[data_len]),
        reverse_bits(packet[data_len + 1]),
    ]);

    if calculated == received {
        Ok(())
    } else {
        Err(FrameReject::ChecksumMismatch { expected: received, calculated })
    }
}
