use ::crc::{CRC_16_MODBUS, Crc};

// CRC-16/MODBUS: reflected polynomial 0xA001, init 0xFFFF.
const CRC_COMPUTER: Crc<u16> = Crc::<u16>::new(&CRC_16_MODBUS);

/// Calculates the Modbus CRC-16 used by the AM2315 over `data`.
#[inline]
pub fn crc16(data: &[u8]) -> u16 {
    CRC_COMPUTER.checksum(data)
}

/// Checks a response frame whose last two bytes are its CRC, LSB first.
///
/// Frames shorter than the CRC itself never verify.
pub fn verify_frame(frame: &[u8]) -> bool {
    if frame.len() < 2 {
        return false;
    }
    let (data, received) = frame.split_at(frame.len() - 2);
    crc16(data) == u16::from_le_bytes([received[0], received[1]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_value() {
        assert_eq!(crc16(b"123456789"), 0x4B37);
    }

    #[test]
    fn test_sensor_frame() {
        // Humidity 24.0 %RH, temperature 30.0 C
        let frame = [0x03, 0x04, 0x00, 0xF0, 0x01, 0x2C, 0xF1, 0x96];
        assert_eq!(crc16(&frame[..6]), 0x96F1);
        assert!(verify_frame(&frame));
    }

    #[test]
    fn test_single_byte_corruption() {
        let frame = [0x03, 0x04, 0x00, 0xF0, 0x01, 0x2C, 0xF1, 0x96];
        for i in 0..frame.len() {
            let mut corrupted = frame;
            corrupted[i] ^= 0x01;
            assert!(!verify_frame(&corrupted), "byte {i} corrupted but CRC passed");
        }
    }

    #[test]
    fn test_short_frame() {
        assert!(!verify_frame(&[]));
        assert!(!verify_frame(&[0xFF]));
    }
}
