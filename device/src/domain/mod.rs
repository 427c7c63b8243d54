pub mod unit;

use core::fmt::{Debug, Formatter};
use embassy_time::Instant;
use serde::{Deserialize, Serialize};
use unit::*;

/// Output channel of a driver.
///
/// For the combined hygrometers the primary channel is temperature, the
/// secondary channel relative humidity and the derived channel dew point.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Primary,
    Secondary,
    Derived,
}

impl Channel {
    pub const fn quantity(&self) -> Quantity {
        match self {
            Self::Primary => Quantity::Temperature,
            Self::Secondary => Quantity::Humidity,
            Self::Derived => Quantity::DewPoint,
        }
    }
}

/// One complete acquisition.
///
/// A new value replaces the previous one on every successful acquisition; it
/// is never patched field by field.
#[derive(Copy, Clone, PartialEq)]
pub struct Measurement {
    pub primary: f32,
    pub secondary: f32,
    pub derived: f32,
    pub unit_primary: Unit,
    pub unit_secondary: Unit,
    pub unit_derived: Unit,
    pub timestamp: Instant,
}

impl Measurement {
    pub fn value(&self, channel: Channel) -> f32 {
        match channel {
            Channel::Primary => self.primary,
            Channel::Secondary => self.secondary,
            Channel::Derived => self.derived,
        }
    }

    pub fn unit(&self, channel: Channel) -> Unit {
        match channel {
            Channel::Primary => self.unit_primary,
            Channel::Secondary => self.unit_secondary,
            Channel::Derived => self.unit_derived,
        }
    }
}

impl Debug for Measurement {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Measurement")
            .field("temperature", &self.primary)
            .field("relative_humidity", &self.secondary)
            .field("dew_point", &self.derived)
            .field("unit", &self.unit_primary)
            .field("timestamp", &self.timestamp.as_millis())
            .finish()
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Measurement {
    fn format(&self, f: defmt::Formatter<'_>) {
        defmt::write!(
            f,
            "Measurement(temperature: {}{}, relative_humidity: {}{}, dew_point: {}{})",
            self.primary,
            self.unit_primary,
            self.secondary,
            self.unit_secondary,
            self.derived,
            self.unit_derived,
        );
    }
}
