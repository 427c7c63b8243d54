//! HDC1000 register map and word codec.
//!
//! Every register is 16 bits wide and transferred most significant byte first.

pub mod config;

pub const TEMPERATURE: u8 = 0x00;
pub const HUMIDITY: u8 = 0x01;
pub const CONFIGURATION: u8 = 0x02;
pub const SERIAL_ID_HIGH: u8 = 0xFB;
pub const SERIAL_ID_MID: u8 = 0xFC;
pub const SERIAL_ID_LOW: u8 = 0xFD;
pub const MANUFACTURER_ID: u8 = 0xFE;
pub const DEVICE_ID: u8 = 0xFF;

/// Decodes a register word, most significant byte first.
pub fn decode_word(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Builds the configuration write frame `[selector, high byte, 0x00]`.
///
/// Bits outside `field_mask` keep their value from `current`. The low byte
/// of the configuration register is reserved and always written as zero.
pub fn encode_config_write(current: u16, field_mask: u16, field_value: u16) -> [u8; 3] {
    let word = (current & !field_mask) | (field_value & field_mask);
    let [high, _] = word.to_be_bytes();
    [CONFIGURATION, high, 0x00]
}
