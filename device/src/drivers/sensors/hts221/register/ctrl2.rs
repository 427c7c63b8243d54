use super::{read_byte, CTRL_REG2};
use crate::drivers::transport::{I2cTransport, CONFIGURATION_SETTLE};
use crate::traits::sensors::AcquisitionError;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

const BOOT: u8 = 0b1000_0000;
const HEATER: u8 = 0b0000_0010;
const ONE_SHOT: u8 = 0b0000_0001;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Ctrl2 {
    boot: bool,
    heater: bool,
    one_shot: bool,
    reserved: u8,
}

impl Ctrl2 {
    pub async fn read<I: I2c, D: DelayNs>(
        transport: &mut I2cTransport<I, D>,
    ) -> Result<Ctrl2, AcquisitionError> {
        Ok(read_byte(transport, CTRL_REG2).await?.into())
    }

    /// Writes the register. Rebooting the memory content takes a while, so
    /// every write waits for it.
    pub async fn write<I: I2c, D: DelayNs>(
        transport: &mut I2cTransport<I, D>,
        reg: Ctrl2,
    ) -> Result<(), AcquisitionError> {
        transport
            .write_command(CTRL_REG2, &[reg.into()], CONFIGURATION_SETTLE)
            .await
    }

    pub async fn modify<I: I2c, D: DelayNs, F: FnOnce(&mut Ctrl2)>(
        transport: &mut I2cTransport<I, D>,
        modify: F,
    ) -> Result<(), AcquisitionError> {
        let mut reg = Self::read(transport).await?;
        modify(&mut reg);
        Self::write(transport, reg).await
    }

    pub fn boot(&mut self) -> &mut Self {
        self.boot = true;
        self
    }

    pub fn heater(&mut self, on: bool) -> &mut Self {
        self.heater = on;
        self
    }

    pub fn heater_enabled(&self) -> bool {
        self.heater
    }
}

impl From<u8> for Ctrl2 {
    fn from(value: u8) -> Self {
        Ctrl2 {
            boot: value & BOOT != 0,
            heater: value & HEATER != 0,
            one_shot: value & ONE_SHOT != 0,
            reserved: value & !(BOOT | HEATER | ONE_SHOT),
        }
    }
}

impl From<Ctrl2> for u8 {
    fn from(reg: Ctrl2) -> Self {
        let mut value = reg.reserved;
        if reg.boot {
            value |= BOOT;
        }
        if reg.heater {
            value |= HEATER;
        }
        if reg.one_shot {
            value |= ONE_SHOT;
        }
        value
    }
}
