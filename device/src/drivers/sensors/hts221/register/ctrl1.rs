use super::{read_byte, CTRL_REG1, NO_SETTLE};
use crate::drivers::transport::I2cTransport;
use crate::traits::sensors::AcquisitionError;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

const POWER: u8 = 0b1000_0000;
const BLOCK_DATA_UPDATE: u8 = 0b0000_0100;
const OUTPUT_DATA_RATE: u8 = 0b0000_0011;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Power {
    PowerDown,
    Active,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BlockDataUpdate {
    Continuous,
    MsbLsbReading,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum OutputDataRate {
    OneShot,
    Hz1,
    Hz7,
    Hz12p5,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ctrl1 {
    power: Power,
    block_data_update: BlockDataUpdate,
    output_data_rate: OutputDataRate,
    reserved: u8,
}

impl Ctrl1 {
    pub async fn read<I: I2c, D: DelayNs>(
        transport: &mut I2cTransport<I, D>,
    ) -> Result<Ctrl1, AcquisitionError> {
        Ok(read_byte(transport, CTRL_REG1).await?.into())
    }

    pub async fn write<I: I2c, D: DelayNs>(
        transport: &mut I2cTransport<I, D>,
        reg: Ctrl1,
    ) -> Result<(), AcquisitionError> {
        transport
            .write_command(CTRL_REG1, &[reg.into()], NO_SETTLE)
            .await
    }

    pub async fn modify<I: I2c, D: DelayNs, F: FnOnce(&mut Ctrl1)>(
        transport: &mut I2cTransport<I, D>,
        modify: F,
    ) -> Result<(), AcquisitionError> {
        let mut reg = Self::read(transport).await?;
        modify(&mut reg);
        Self::write(transport, reg).await
    }

    pub fn power_down(&mut self) -> &mut Self {
        self.power = Power::PowerDown;
        self
    }

    pub fn power_active(&mut self) -> &mut Self {
        self.power = Power::Active;
        self
    }

    pub fn output_data_rate(&mut self, odr: OutputDataRate) -> &mut Self {
        self.output_data_rate = odr;
        self
    }

    pub fn block_data_update(&mut self, bdu: BlockDataUpdate) -> &mut Self {
        self.block_data_update = bdu;
        self
    }
}

impl From<u8> for Ctrl1 {
    fn from(value: u8) -> Self {
        Ctrl1 {
            power: if value & POWER != 0 {
                Power::Active
            } else {
                Power::PowerDown
            },
            block_data_update: if value & BLOCK_DATA_UPDATE != 0 {
                BlockDataUpdate::MsbLsbReading
            } else {
                BlockDataUpdate::Continuous
            },
            output_data_rate: match value & OUTPUT_DATA_RATE {
                0b01 => OutputDataRate::Hz1,
                0b10 => OutputDataRate::Hz7,
                0b11 => OutputDataRate::Hz12p5,
                _ => OutputDataRate::OneShot,
            },
            reserved: value & !(POWER | BLOCK_DATA_UPDATE | OUTPUT_DATA_RATE),
        }
    }
}

impl From<Ctrl1> for u8 {
    fn from(reg: Ctrl1) -> Self {
        let power = match reg.power {
            Power::PowerDown => 0,
            Power::Active => POWER,
        };
        let bdu = match reg.block_data_update {
            BlockDataUpdate::Continuous => 0,
            BlockDataUpdate::MsbLsbReading => BLOCK_DATA_UPDATE,
        };
        let odr = match reg.output_data_rate {
            OutputDataRate::OneShot => 0b00,
            OutputDataRate::Hz1 => 0b01,
            OutputDataRate::Hz7 => 0b10,
            OutputDataRate::Hz12p5 => 0b11,
        };
        reg.reserved | power | bdu | odr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_bits_survive() {
        let mut reg = Ctrl1::from(0b0101_1000);
        reg.power_active()
            .output_data_rate(OutputDataRate::Hz1)
            .block_data_update(BlockDataUpdate::MsbLsbReading);
        assert_eq!(0b1101_1101, u8::from(reg));
    }

    #[test]
    fn test_decode() {
        let reg = Ctrl1::from(0x87);
        assert_eq!(Power::Active, reg.power);
        assert_eq!(BlockDataUpdate::MsbLsbReading, reg.block_data_update);
        assert_eq!(OutputDataRate::Hz12p5, reg.output_data_rate);
    }
}
