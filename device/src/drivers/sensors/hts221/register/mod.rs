pub mod calibration;
pub mod ctrl1;
pub mod ctrl2;
pub mod status;

use crate::drivers::transport::I2cTransport;
use crate::traits::sensors::AcquisitionError;
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

pub const CTRL_REG1: u8 = 0x20;
pub const CTRL_REG2: u8 = 0x21;
pub const STATUS: u8 = 0x27;

// auto-increment variants of the 2 byte output registers
pub const H_OUT: u8 = 0xA8;
pub const T_OUT: u8 = 0xAA;

/// Register writes take effect immediately.
pub const NO_SETTLE: Duration = Duration::from_ticks(0);

pub async fn read_byte<I: I2c, D: DelayNs>(
    transport: &mut I2cTransport<I, D>,
    register: u8,
) -> Result<u8, AcquisitionError> {
    let [value] = transport.write_read::<1>(register).await?;
    Ok(value)
}

/// Reads a little-endian output word.
pub async fn read_output<I: I2c, D: DelayNs>(
    transport: &mut I2cTransport<I, D>,
    register: u8,
) -> Result<i16, AcquisitionError> {
    Ok(i16::from_le_bytes(transport.write_read::<2>(register).await?))
}
