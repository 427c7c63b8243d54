//! Per-device configuration supplied by the external configuration store.

use crate::domain::unit::Unit;
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

pub const MAX_IDENTITY_LEN: usize = 32;

/// Identity of one configured device, unique across the process.
pub type Identity = heapless::String<MAX_IDENTITY_LEN>;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    EmptyIdentity,
    IdentityTooLong,
    UnsupportedResolution(u8),
    UnsupportedUnit(Unit),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::EmptyIdentity => write!(f, "device identity is empty"),
            Self::IdentityTooLong => write!(
                f,
                "device identity is longer than {} bytes",
                MAX_IDENTITY_LEN
            ),
            Self::UnsupportedResolution(bits) => write!(f, "unsupported resolution: {} bits", bits),
            Self::UnsupportedUnit(unit) => write!(f, "unsupported target unit: {}", unit),
        }
    }
}

/// Sensor model tag used to pick the driver variant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum SensorModel {
    /// TI HDC1000 humidity and temperature sensor.
    Hdc1000,
    /// ST HTS221 humidity and temperature sensor.
    Hts221,
}

impl SensorModel {
    pub const fn default_address(&self) -> u8 {
        match self {
            Self::Hdc1000 => crate::drivers::sensors::hdc1000::ADDR,
            Self::Hts221 => crate::drivers::sensors::hts221::ADDR,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(try_from = "u8", into = "u8")]
pub enum TemperatureResolution {
    Bits11,
    Bits14,
}

impl TryFrom<u8> for TemperatureResolution {
    type Error = ConfigError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            11 => Ok(Self::Bits11),
            14 => Ok(Self::Bits14),
            _ => Err(ConfigError::UnsupportedResolution(bits)),
        }
    }
}

impl From<TemperatureResolution> for u8 {
    fn from(resolution: TemperatureResolution) -> Self {
        match resolution {
            TemperatureResolution::Bits11 => 11,
            TemperatureResolution::Bits14 => 14,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(try_from = "u8", into = "u8")]
pub enum HumidityResolution {
    Bits8,
    Bits11,
    Bits14,
}

impl TryFrom<u8> for HumidityResolution {
    type Error = ConfigError;

    fn try_from(bits: u8) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(Self::Bits8),
            11 => Ok(Self::Bits11),
            14 => Ok(Self::Bits14),
            _ => Err(ConfigError::UnsupportedResolution(bits)),
        }
    }
}

impl From<HumidityResolution> for u8 {
    fn from(resolution: HumidityResolution) -> Self {
        match resolution {
            HumidityResolution::Bits8 => 8,
            HumidityResolution::Bits11 => 11,
            HumidityResolution::Bits14 => 14,
        }
    }
}

/// Immutable for the lifetime of a driver instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub identity: Identity,
    pub model: SensorModel,
    pub bus_id: u8,
    pub bus_address: u8,
    pub resolution_primary: TemperatureResolution,
    pub resolution_secondary: HumidityResolution,
    pub target_unit: Unit,
}

impl DeviceConfig {
    /// Configuration on bus 1 at the model's default address, full
    /// resolution, reporting in Celsius.
    pub fn new(identity: &str, model: SensorModel) -> Result<Self, ConfigError> {
        if identity.is_empty() {
            return Err(ConfigError::EmptyIdentity);
        }
        let identity = Identity::try_from(identity).map_err(|_| ConfigError::IdentityTooLong)?;
        Ok(Self {
            identity,
            model,
            bus_id: 1,
            bus_address: model.default_address(),
            resolution_primary: TemperatureResolution::Bits14,
            resolution_secondary: HumidityResolution::Bits14,
            target_unit: Unit::Celsius,
        })
    }

    pub fn bus(mut self, bus_id: u8, bus_address: u8) -> Self {
        self.bus_id = bus_id;
        self.bus_address = bus_address;
        self
    }

    pub fn resolution(
        mut self,
        primary: TemperatureResolution,
        secondary: HumidityResolution,
    ) -> Self {
        self.resolution_primary = primary;
        self.resolution_secondary = secondary;
        self
    }

    pub fn target_unit(mut self, unit: Unit) -> Self {
        self.target_unit = unit;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.is_empty() {
            return Err(ConfigError::EmptyIdentity);
        }
        if !self.target_unit.is_temperature() {
            return Err(ConfigError::UnsupportedUnit(self.target_unit));
        }
        Ok(())
    }
}
