const CRC_POLYNOMIAL: u8 = 0x31;

/// Initial value used by Sensirion parts (SHTC3).
pub(crate) const CRC_INIT_SENSIRION: u8 = 0xFF;
/// Initial value used by the HTU21D.
pub(crate) const CRC_INIT_HTU21D: u8 = 0x00;

/// CRC-8 with polynomial x^8 + x^5 + x^4 + 1, no reflection, no final XOR.
pub(crate) fn crc8(data: &[u8], init: u8) -> u8 {
    let mut crc = init;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            if (crc & 0x80) != 0 {
                crc = (crc << 1) ^ CRC_POLYNOMIAL;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

/// Checks a big-endian word followed by its CRC byte and returns the word.
pub(crate) fn checked_word(bytes: &[u8], init: u8) -> Option<u16> {
    match bytes {
        [msb, lsb, crc, ..] if crc8(&[*msb, *lsb], init) == *crc => {
            Some(u16::from_be_bytes([*msb, *lsb]))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensirion_reference_vector() {
        // Example from the Sensirion datasheets.
        assert_eq!(crc8(&[0xBE, 0xEF], CRC_INIT_SENSIRION), 0x92);
    }

    #[test]
    fn htu21d_reference_vector() {
        // 0x683A with checksum 0x7C, from the HTU21D datasheet.
        assert_eq!(crc8(&[0x68, 0x3A], CRC_INIT_HTU21D), 0x7C);
        assert_eq!(crc8(&[0x4E, 0x85], CRC_INIT_HTU21D), 0x6B);
    }

    #[test]
    fn checked_word_rejects_bad_crc() {
        assert_eq!(checked_word(&[0xBE, 0xEF, 0x92], CRC_INIT_SENSIRION), Some(0xBEEF));
        assert_eq!(checked_word(&[0xBE, 0xEF, 0x93], CRC_INIT_SENSIRION), None);
        assert_eq!(checked_word(&[0xBE, 0xEF], CRC_INIT_SENSIRION), None);
    }
}
