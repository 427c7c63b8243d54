//! Unit conversion and derived quantities.

use crate::domain::unit::{Quantity, Unit};
use core::fmt::{Display, Formatter};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConversionError {
    /// No conversion from the first unit to the second exists for the quantity.
    Unsupported(Quantity, Unit, Unit),
}

impl Display for ConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unsupported(quantity, from, to) => {
                write!(f, "cannot convert {:?} from {} to {}", quantity, from, to)
            }
        }
    }
}

/// Stateless unit conversion, called once per output field per acquisition.
pub trait Converter {
    fn convert(
        &self,
        quantity: Quantity,
        from: Unit,
        to: Unit,
        value: f32,
    ) -> Result<f32, ConversionError>;
}

/// Built-in conversion table covering the temperature scales.
#[derive(Debug, Copy, Clone, Default)]
pub struct Conversions;

impl Converter for Conversions {
    fn convert(
        &self,
        quantity: Quantity,
        from: Unit,
        to: Unit,
        value: f32,
    ) -> Result<f32, ConversionError> {
        if !from.measures(quantity) || !to.measures(quantity) {
            return Err(ConversionError::Unsupported(quantity, from, to));
        }
        if from == to {
            return Ok(value);
        }
        let celsius = match from {
            Unit::Celsius => value,
            Unit::Fahrenheit => (value - 32.0) * 5.0 / 9.0,
            Unit::Kelvin => value - 273.15,
            Unit::PercentRelativeHumidity => {
                return Err(ConversionError::Unsupported(quantity, from, to))
            }
        };
        match to {
            Unit::Celsius => Ok(celsius),
            Unit::Fahrenheit => Ok(celsius * 9.0 / 5.0 + 32.0),
            Unit::Kelvin => Ok(celsius + 273.15),
            Unit::PercentRelativeHumidity => {
                Err(ConversionError::Unsupported(quantity, from, to))
            }
        }
    }
}

// Magnus coefficients (Sonntag 1990), valid from -45 °C to 60 °C over water.
const MAGNUS_A: f32 = 17.62;
const MAGNUS_B: f32 = 243.12;

/// Dew point in °C from a temperature in °C and relative humidity in %RH.
///
/// Humidity at or below zero has no dew point and is clamped to a tiny
/// positive value so the result stays finite.
pub fn dew_point(temperature: f32, relative_humidity: f32) -> f32 {
    let rh = relative_humidity.max(f32::EPSILON);
    let gamma = libm::logf(rh / 100.0) + (MAGNUS_A * temperature) / (MAGNUS_B + temperature);
    MAGNUS_B * gamma / (MAGNUS_A - gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(expected: f32, actual: f32, epsilon: f32) {
        assert!(
            (expected - actual).abs() <= epsilon,
            "expected {} but was {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_dew_point_reference() {
        assert_close(13.85, dew_point(25.0, 50.0), 0.1);
    }

    #[test]
    fn test_dew_point_saturated_air() {
        assert_close(20.0, dew_point(20.0, 100.0), 0.01);
    }

    #[test]
    fn test_dew_point_dry_air_is_finite() {
        assert!(dew_point(25.0, 0.0).is_finite());
    }

    #[test]
    fn test_temperature_scales() {
        let c = Conversions;
        assert_close(
            77.0,
            c.convert(Quantity::Temperature, Unit::Celsius, Unit::Fahrenheit, 25.0)
                .unwrap(),
            1e-4,
        );
        assert_close(
            298.15,
            c.convert(Quantity::DewPoint, Unit::Celsius, Unit::Kelvin, 25.0)
                .unwrap(),
            1e-3,
        );
        assert_close(
            -40.0,
            c.convert(Quantity::Temperature, Unit::Fahrenheit, Unit::Celsius, -40.0)
                .unwrap(),
            1e-4,
        );
    }

    #[test]
    fn test_humidity_passes_through() {
        let c = Conversions;
        let rh = c
            .convert(
                Quantity::Humidity,
                Unit::PercentRelativeHumidity,
                Unit::PercentRelativeHumidity,
                42.5,
            )
            .unwrap();
        assert_eq!(42.5, rh);
    }

    #[test]
    fn test_humidity_to_temperature_is_rejected() {
        let c = Conversions;
        assert_eq!(
            Err(ConversionError::Unsupported(
                Quantity::Humidity,
                Unit::PercentRelativeHumidity,
                Unit::Celsius
            )),
            c.convert(
                Quantity::Humidity,
                Unit::PercentRelativeHumidity,
                Unit::Celsius,
                50.0
            )
        );
    }
}
