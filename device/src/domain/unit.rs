//! Units and quantity kinds produced by the sensor drivers.

use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// The physical quantity a value describes.
///
/// Conversions are looked up per quantity: dew point is a temperature, but a
/// conversion table may still treat it separately.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Quantity {
    Temperature,
    Humidity,
    DewPoint,
}

impl Quantity {
    /// The unit drivers natively produce for this quantity.
    pub const fn canonical_unit(&self) -> Unit {
        match self {
            Self::Temperature | Self::DewPoint => Unit::Celsius,
            Self::Humidity => Unit::PercentRelativeHumidity,
        }
    }
}

/// Unit of measurement.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    /// Degrees Celsius (°C).
    Celsius,
    /// Degrees Fahrenheit (°F).
    Fahrenheit,
    /// Kelvin (K).
    Kelvin,
    /// %RH.
    PercentRelativeHumidity,
}

impl Unit {
    /// Whether values of `quantity` can be expressed in this unit.
    pub const fn measures(&self, quantity: Quantity) -> bool {
        match quantity {
            Quantity::Temperature | Quantity::DewPoint => self.is_temperature(),
            Quantity::Humidity => matches!(self, Self::PercentRelativeHumidity),
        }
    }

    pub const fn is_temperature(&self) -> bool {
        matches!(self, Self::Celsius | Self::Fahrenheit | Self::Kelvin)
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Celsius => write!(f, "°C"),
            Self::Fahrenheit => write!(f, "°F"),
            Self::Kelvin => write!(f, "K"),
            Self::PercentRelativeHumidity => write!(f, "%RH"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_units_measure_dew_point() {
        assert!(Unit::Fahrenheit.measures(Quantity::DewPoint));
        assert!(Unit::Kelvin.measures(Quantity::Temperature));
        assert!(!Unit::Celsius.measures(Quantity::Humidity));
        assert!(!Unit::PercentRelativeHumidity.measures(Quantity::Temperature));
    }

    #[test]
    fn test_canonical_units() {
        assert_eq!(Unit::Celsius, Quantity::DewPoint.canonical_unit());
        assert_eq!(
            Unit::PercentRelativeHumidity,
            Quantity::Humidity.canonical_unit()
        );
    }
}
