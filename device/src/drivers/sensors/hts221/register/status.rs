use super::{read_byte, STATUS};
use crate::drivers::transport::I2cTransport;
use crate::traits::sensors::AcquisitionError;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

pub struct Status {
    temperature_available: bool,
    humidity_available: bool,
}

impl Status {
    pub async fn read<I: I2c, D: DelayNs>(
        transport: &mut I2cTransport<I, D>,
    ) -> Result<Status, AcquisitionError> {
        Ok(read_byte(transport, STATUS).await?.into())
    }

    pub fn temperature_available(&self) -> bool {
        self.temperature_available
    }

    pub fn humidity_available(&self) -> bool {
        self.humidity_available
    }

    pub fn any_available(&self) -> bool {
        self.temperature_available || self.humidity_available
    }
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Status {
            temperature_available: (value & 0b01) != 0,
            humidity_available: (value & 0b10) != 0,
        }
    }
}
