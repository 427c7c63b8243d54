use super::{decode_word, encode_config_write, CONFIGURATION};
use crate::config::{HumidityResolution, TemperatureResolution};
use crate::drivers::transport::{I2cTransport, CONFIGURATION_SETTLE, CONVERSION_SETTLE};
use crate::traits::sensors::AcquisitionError;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;

pub const RESET: u16 = 0x8000;
pub const HEATER: u16 = 0x2000;
pub const ACQUISITION_MODE: u16 = 0x1000;
pub const BATTERY_STATUS: u16 = 0x0800;
pub const TEMPERATURE_RESOLUTION: u16 = 0x0400;
pub const HUMIDITY_RESOLUTION: u16 = 0x0300;

/// A named group of bits in the configuration register and the value to
/// store in them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Field {
    pub mask: u16,
    pub value: u16,
}

impl Field {
    pub const fn reset() -> Self {
        Self {
            mask: RESET,
            value: RESET,
        }
    }

    pub const fn heater(on: bool) -> Self {
        Self {
            mask: HEATER,
            value: if on { HEATER } else { 0 },
        }
    }

    /// Temperature and humidity acquired in sequence by one trigger.
    pub const fn sequential_acquisition() -> Self {
        Self {
            mask: ACQUISITION_MODE,
            value: ACQUISITION_MODE,
        }
    }
}

impl From<TemperatureResolution> for Field {
    fn from(resolution: TemperatureResolution) -> Self {
        Self {
            mask: TEMPERATURE_RESOLUTION,
            value: match resolution {
                TemperatureResolution::Bits14 => 0x0000,
                TemperatureResolution::Bits11 => 0x0400,
            },
        }
    }
}

impl From<HumidityResolution> for Field {
    fn from(resolution: HumidityResolution) -> Self {
        Self {
            mask: HUMIDITY_RESOLUTION,
            value: match resolution {
                HumidityResolution::Bits14 => 0x0000,
                HumidityResolution::Bits11 => 0x0100,
                HumidityResolution::Bits8 => 0x0200,
            },
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatteryStatus {
    /// Supply above 2.8 V.
    Ok,
    /// Supply below 2.8 V.
    Low,
}

/// Raw configuration register state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config(pub u16);

impl Config {
    pub async fn read<I: I2c, D: DelayNs>(
        transport: &mut I2cTransport<I, D>,
    ) -> Result<Config, AcquisitionError> {
        transport
            .write_command(CONFIGURATION, &[], CONVERSION_SETTLE)
            .await?;
        let word = decode_word(transport.read_response().await?);
        Ok(Config(word))
    }

    /// Writes `field` on top of `current` and returns the resulting state.
    pub async fn write<I: I2c, D: DelayNs>(
        transport: &mut I2cTransport<I, D>,
        current: Config,
        field: Field,
    ) -> Result<Config, AcquisitionError> {
        let [selector, high, low] = encode_config_write(current.0, field.mask, field.value);
        transport
            .write_command(selector, &[high, low], CONFIGURATION_SETTLE)
            .await?;
        Ok(Config(decode_word([high, low])))
    }

    /// Read-modify-write of a single field.
    pub async fn modify<I: I2c, D: DelayNs>(
        transport: &mut I2cTransport<I, D>,
        field: Field,
    ) -> Result<Config, AcquisitionError> {
        let current = Self::read(transport).await?;
        Self::write(transport, current, field).await
    }

    pub fn heater(&self) -> bool {
        self.0 & HEATER != 0
    }

    pub fn battery(&self) -> BatteryStatus {
        if self.0 & BATTERY_STATUS != 0 {
            BatteryStatus::Low
        } else {
            BatteryStatus::Ok
        }
    }

    pub fn temperature_resolution(&self) -> TemperatureResolution {
        if self.0 & TEMPERATURE_RESOLUTION != 0 {
            TemperatureResolution::Bits11
        } else {
            TemperatureResolution::Bits14
        }
    }

    pub fn humidity_resolution(&self) -> HumidityResolution {
        match self.0 & HUMIDITY_RESOLUTION {
            0x0000 => HumidityResolution::Bits14,
            0x0100 => HumidityResolution::Bits11,
            // 0b11 is reserved and behaves like 8-bit
            _ => HumidityResolution::Bits8,
        }
    }
}
