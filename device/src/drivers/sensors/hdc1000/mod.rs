//! TI HDC1000 humidity and temperature sensor.

pub mod register;

use super::{LinearScale, OpenError, Output};
use crate::calibration::LinearCalibration;
use crate::config::DeviceConfig;
use crate::conversion::{Conversions, Converter};
use crate::domain::{Channel, Measurement};
use crate::drivers::transport::{I2cTransport, CONVERSION_SETTLE};
use crate::traits::i2c::BusProvider;
use crate::traits::sensors::{AcquisitionError, Sensor, Setting};
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use register::config::{BatteryStatus, Config, Field};
use register::*;

pub const ADDR: u8 = 0x40;

/// Power-up time before the first register access.
const STARTUP: Duration = Duration::from_millis(15);

/// Extra wait before the humidity conversion is triggered.
const HUMIDITY_PRE_DELAY: Duration = Duration::from_millis(15);

const TEMPERATURE_SCALE: LinearScale = LinearScale {
    range: 165.0,
    offset: 40.0,
};

const HUMIDITY_SCALE: LinearScale = LinearScale {
    range: 100.0,
    offset: 0.0,
};

pub struct Hdc1000<I, D, C = Conversions> {
    config: DeviceConfig,
    transport: I2cTransport<I, D>,
    output: Output<C>,
}

impl<I, D, C> Hdc1000<I, D, C>
where
    I: I2c,
    D: DelayNs,
    C: Converter,
{
    pub async fn open<P>(
        provider: &mut P,
        config: DeviceConfig,
        delay: D,
        converter: C,
    ) -> Result<Self, OpenError>
    where
        P: BusProvider<Bus = I>,
    {
        config.validate()?;
        let transport = I2cTransport::open(provider, config.bus_id, config.bus_address, delay)?;
        let mut sensor = Self::new(config, transport, converter);
        sensor.initialize().await?;
        Ok(sensor)
    }

    /// Wraps an already bound transport. Call [`Hdc1000::initialize`] before
    /// the first acquisition.
    pub fn new(config: DeviceConfig, transport: I2cTransport<I, D>, converter: C) -> Self {
        let output = Output::new(converter, config.target_unit);
        Self {
            config,
            transport,
            output,
        }
    }

    /// Selects sequential acquisition and applies the configured resolutions.
    pub async fn initialize(&mut self) -> Result<(), AcquisitionError> {
        self.transport.settle(STARTUP).await;

        let current = Config::read(&mut self.transport).await?;
        let current =
            Config::write(&mut self.transport, current, Field::sequential_acquisition()).await?;
        let current = Config::write(
            &mut self.transport,
            current,
            self.config.resolution_primary.into(),
        )
        .await?;
        let current = Config::write(
            &mut self.transport,
            current,
            self.config.resolution_secondary.into(),
        )
        .await?;

        debug!(
            "[{}] HDC1000 at {:?} initialized, config {:04X}",
            self.config.identity.as_str(),
            self.transport.address(),
            current.0
        );
        Ok(())
    }

    /// Temperature in degrees Celsius.
    pub async fn read_temperature(&mut self) -> Result<f32, AcquisitionError> {
        let raw = self.read_register(TEMPERATURE).await?;
        Ok(TEMPERATURE_SCALE.scale(raw))
    }

    /// Relative humidity in percent.
    pub async fn read_humidity(&mut self) -> Result<f32, AcquisitionError> {
        self.transport.settle(HUMIDITY_PRE_DELAY).await;
        let raw = self.read_register(HUMIDITY).await?;
        Ok(HUMIDITY_SCALE.scale(raw))
    }

    pub async fn manufacturer_id(&mut self) -> Result<u16, AcquisitionError> {
        self.read_register(MANUFACTURER_ID).await
    }

    pub async fn device_id(&mut self) -> Result<u16, AcquisitionError> {
        self.read_register(DEVICE_ID).await
    }

    /// The 48-bit serial number, high word first.
    pub async fn serial_number(&mut self) -> Result<u64, AcquisitionError> {
        let high = self.read_register(SERIAL_ID_HIGH).await? as u64;
        let mid = self.read_register(SERIAL_ID_MID).await? as u64;
        let low = self.read_register(SERIAL_ID_LOW).await? as u64;
        Ok((high << 32) | (mid << 16) | low)
    }

    pub async fn battery(&mut self) -> Result<BatteryStatus, AcquisitionError> {
        Ok(Config::read(&mut self.transport).await?.battery())
    }

    pub async fn heater(&mut self) -> Result<bool, AcquisitionError> {
        Ok(Config::read(&mut self.transport).await?.heater())
    }

    /// Soft reset. The device restores its power-on configuration.
    pub async fn reset(&mut self) -> Result<(), AcquisitionError> {
        Config::modify(&mut self.transport, Field::reset()).await?;
        Ok(())
    }

    pub fn release(self) -> (I, D) {
        self.transport.release()
    }

    async fn read_register(&mut self, register: u8) -> Result<u16, AcquisitionError> {
        self.transport
            .write_command(register, &[], CONVERSION_SETTLE)
            .await?;
        Ok(decode_word(self.transport.read_response().await?))
    }
}

impl<I, D, C> Sensor for Hdc1000<I, D, C>
where
    I: I2c,
    D: DelayNs,
    C: Converter,
{
    fn config(&self) -> &DeviceConfig {
        &self.config
    }

    async fn acquire(&mut self) -> Result<Measurement, AcquisitionError> {
        let temperature = self.read_temperature().await?;
        let humidity = self.read_humidity().await?;
        trace!(
            "[{}] raw {} C, {} %RH",
            self.config.identity.as_str(),
            temperature,
            humidity
        );
        self.output.measurement(temperature, humidity)
    }

    async fn configure(&mut self, setting: Setting) -> Result<(), AcquisitionError> {
        let field = match setting {
            Setting::PrimaryResolution(resolution) => resolution.into(),
            Setting::SecondaryResolution(resolution) => resolution.into(),
            Setting::Heater(on) => Field::heater(on),
        };
        Config::modify(&mut self.transport, field).await?;
        Ok(())
    }

    async fn calibrate(
        &mut self,
        channel: Channel,
        calibration: &LinearCalibration,
    ) -> Result<(), AcquisitionError> {
        self.output.calibrate(channel, calibration);
        Ok(())
    }

    fn correction(&self, channel: Channel) -> Option<LinearCalibration> {
        Some(self.output.correction(channel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HumidityResolution, SensorModel, TemperatureResolution};
    use crate::testutil::RecordingDelay;
    use crate::traits::i2c::I2cAddress;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
    use futures::executor::block_on;

    fn sensor(
        expectations: &[Transaction],
        config: DeviceConfig,
    ) -> (Hdc1000<Mock, RecordingDelay>, RecordingDelay) {
        let delay = RecordingDelay::new();
        let transport = I2cTransport::new(Mock::new(expectations), I2cAddress::new(ADDR), delay.clone());
        (Hdc1000::new(config, transport, Conversions), delay)
    }

    fn config() -> DeviceConfig {
        DeviceConfig::new("hdc", SensorModel::Hdc1000).unwrap()
    }

    #[test]
    fn test_initialize_sequence() {
        let config = config().resolution(
            TemperatureResolution::Bits11,
            HumidityResolution::Bits8,
        );
        let expectations = [
            Transaction::write(ADDR, vec![CONFIGURATION]),
            Transaction::read(ADDR, vec![0x00, 0x00]),
            Transaction::write(ADDR, vec![CONFIGURATION, 0x10, 0x00]),
            Transaction::write(ADDR, vec![CONFIGURATION, 0x14, 0x00]),
            Transaction::write(ADDR, vec![CONFIGURATION, 0x16, 0x00]),
        ];
        let (mut sensor, delay) = sensor(&expectations, config);

        block_on(sensor.initialize()).unwrap();

        assert_eq!(
            vec![15_000, 62_500, 15_000, 15_000, 15_000],
            delay.waits_us()
        );
        sensor.release().0.done();
    }

    #[test]
    fn test_acquire_sequence() {
        let expectations = [
            Transaction::write(ADDR, vec![TEMPERATURE]),
            Transaction::read(ADDR, vec![0x66, 0x66]),
            Transaction::write(ADDR, vec![HUMIDITY]),
            Transaction::read(ADDR, vec![0x80, 0x00]),
        ];
        let (mut sensor, delay) = sensor(&expectations, config());

        let m = block_on(sensor.acquire()).unwrap();

        assert!((m.primary - 26.0).abs() < 0.01, "{}", m.primary);
        assert_eq!(50.0, m.secondary);
        assert_eq!(vec![62_500, 15_000, 62_500], delay.waits_us());
        sensor.release().0.done();
    }

    #[test]
    fn test_heater_preserves_other_bits() {
        let expectations = [
            Transaction::write(ADDR, vec![CONFIGURATION]),
            Transaction::read(ADDR, vec![0x15, 0x00]),
            Transaction::write(ADDR, vec![CONFIGURATION, 0x35, 0x00]),
        ];
        let (mut sensor, _) = sensor(&expectations, config());

        block_on(sensor.configure(Setting::Heater(true))).unwrap();
        sensor.release().0.done();
    }

    #[test]
    fn test_serial_number_is_concatenated() {
        let expectations = [
            Transaction::write(ADDR, vec![SERIAL_ID_HIGH]),
            Transaction::read(ADDR, vec![0x12, 0x34]),
            Transaction::write(ADDR, vec![SERIAL_ID_MID]),
            Transaction::read(ADDR, vec![0x56, 0x78]),
            Transaction::write(ADDR, vec![SERIAL_ID_LOW]),
            Transaction::read(ADDR, vec![0x9A, 0x80]),
        ];
        let (mut sensor, _) = sensor(&expectations, config());

        assert_eq!(0x1234_5678_9A80, block_on(sensor.serial_number()).unwrap());
        sensor.release().0.done();
    }

    #[test]
    fn test_raw_extremes() {
        let expectations = [
            Transaction::write(ADDR, vec![TEMPERATURE]),
            Transaction::read(ADDR, vec![0x00, 0x00]),
            Transaction::write(ADDR, vec![HUMIDITY]),
            Transaction::read(ADDR, vec![0xFF, 0xFF]),
        ];
        let (mut sensor, _) = sensor(&expectations, config());

        assert_eq!(-40.0, block_on(sensor.read_temperature()).unwrap());
        let humidity = block_on(sensor.read_humidity()).unwrap();
        assert!(humidity < 100.0 && humidity > 99.99);
        sensor.release().0.done();
    }
}
