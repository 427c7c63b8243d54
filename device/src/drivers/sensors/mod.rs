//! Sensor driver variants and the output stage they share.

pub mod hdc1000;
pub mod hts221;

use crate::calibration::LinearCalibration;
use crate::config::{ConfigError, DeviceConfig, SensorModel};
use crate::conversion::{dew_point, Conversions, Converter};
use crate::domain::unit::{Quantity, Unit};
use crate::domain::{Channel, Measurement};
use crate::traits::i2c::BusProvider;
use crate::traits::sensors::{AcquisitionError, Sensor, Setting};
use core::fmt::{Display, Formatter};
use embassy_time::Instant;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use hdc1000::Hdc1000;
use hts221::Hts221;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpenError {
    Config(ConfigError),
    Acquisition(AcquisitionError),
}

impl From<ConfigError> for OpenError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<AcquisitionError> for OpenError {
    fn from(e: AcquisitionError) -> Self {
        Self::Acquisition(e)
    }
}

impl Display for OpenError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid configuration: {}", e),
            Self::Acquisition(e) => write!(f, "{}", e),
        }
    }
}

/// Linear mapping of a full-scale unsigned 16-bit reading: `raw / 2^16 * range - offset`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LinearScale {
    pub range: f32,
    pub offset: f32,
}

impl LinearScale {
    pub fn scale(&self, raw: u16) -> f32 {
        raw as f32 / 65536.0 * self.range - self.offset
    }
}

/// Turns canonical readings into a [`Measurement`] in the configured units.
///
/// Temperature and humidity are converted, then corrected. The dew point is
/// derived from the corrected values and converted on its own.
pub struct Output<C> {
    converter: C,
    target: Unit,
    corrections: [LinearCalibration; 3],
}

impl<C: Converter> Output<C> {
    pub fn new(converter: C, target: Unit) -> Self {
        Self {
            converter,
            target,
            corrections: [LinearCalibration::IDENTITY; 3],
        }
    }

    pub fn measurement(
        &self,
        temperature: f32,
        relative_humidity: f32,
    ) -> Result<Measurement, AcquisitionError> {
        let primary = self.correct(
            Channel::Primary,
            self.converter.convert(
                Quantity::Temperature,
                Unit::Celsius,
                self.target,
                temperature,
            )?,
        );
        let secondary = self.correct(
            Channel::Secondary,
            self.converter.convert(
                Quantity::Humidity,
                Unit::PercentRelativeHumidity,
                Unit::PercentRelativeHumidity,
                relative_humidity,
            )?,
        );

        let corrected = self.converter.convert(
            Quantity::Temperature,
            self.target,
            Unit::Celsius,
            primary,
        )?;
        let derived = self.correct(
            Channel::Derived,
            self.converter.convert(
                Quantity::DewPoint,
                Unit::Celsius,
                self.target,
                dew_point(corrected, secondary),
            )?,
        );

        Ok(Measurement {
            primary,
            secondary,
            derived,
            unit_primary: self.target,
            unit_secondary: Unit::PercentRelativeHumidity,
            unit_derived: self.target,
            timestamp: Instant::now(),
        })
    }

    pub fn calibrate(&mut self, channel: Channel, calibration: &LinearCalibration) {
        let slot = &mut self.corrections[Self::index(channel)];
        *slot = slot.then(calibration);
    }

    pub fn correction(&self, channel: Channel) -> LinearCalibration {
        self.corrections[Self::index(channel)]
    }

    fn correct(&self, channel: Channel, value: f32) -> f32 {
        self.corrections[Self::index(channel)].apply(value)
    }

    fn index(channel: Channel) -> usize {
        match channel {
            Channel::Primary => 0,
            Channel::Secondary => 1,
            Channel::Derived => 2,
        }
    }
}

/// One variant per supported sensor model, picked by [`SensorModel`].
pub enum SensorDriver<I, D, C = Conversions> {
    Hdc1000(Hdc1000<I, D, C>),
    Hts221(Hts221<I, D, C>),
}

impl<I, D, C> SensorDriver<I, D, C>
where
    I: I2c,
    D: DelayNs,
    C: Converter,
{
    /// Opens the bus named in `config` and initializes the configured model.
    pub async fn open<P>(
        provider: &mut P,
        config: DeviceConfig,
        delay: D,
        converter: C,
    ) -> Result<Self, OpenError>
    where
        P: BusProvider<Bus = I>,
    {
        match config.model {
            SensorModel::Hdc1000 => Ok(Self::Hdc1000(
                Hdc1000::open(provider, config, delay, converter).await?,
            )),
            SensorModel::Hts221 => Ok(Self::Hts221(
                Hts221::open(provider, config, delay, converter).await?,
            )),
        }
    }

    pub fn model(&self) -> SensorModel {
        match self {
            Self::Hdc1000(_) => SensorModel::Hdc1000,
            Self::Hts221(_) => SensorModel::Hts221,
        }
    }
}

impl<I, D, C> Sensor for SensorDriver<I, D, C>
where
    I: I2c,
    D: DelayNs,
    C: Converter,
{
    fn config(&self) -> &DeviceConfig {
        match self {
            Self::Hdc1000(sensor) => sensor.config(),
            Self::Hts221(sensor) => sensor.config(),
        }
    }

    async fn acquire(&mut self) -> Result<Measurement, AcquisitionError> {
        match self {
            Self::Hdc1000(sensor) => sensor.acquire().await,
            Self::Hts221(sensor) => sensor.acquire().await,
        }
    }

    async fn configure(&mut self, setting: Setting) -> Result<(), AcquisitionError> {
        match self {
            Self::Hdc1000(sensor) => sensor.configure(setting).await,
            Self::Hts221(sensor) => sensor.configure(setting).await,
        }
    }

    async fn calibrate(
        &mut self,
        channel: Channel,
        calibration: &LinearCalibration,
    ) -> Result<(), AcquisitionError> {
        match self {
            Self::Hdc1000(sensor) => sensor.calibrate(channel, calibration).await,
            Self::Hts221(sensor) => sensor.calibrate(channel, calibration).await,
        }
    }

    fn correction(&self, channel: Channel) -> Option<LinearCalibration> {
        match self {
            Self::Hdc1000(sensor) => sensor.correction(channel),
            Self::Hts221(sensor) => sensor.correction(channel),
        }
    }
}
