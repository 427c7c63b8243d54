//! ST HTS221 humidity and temperature sensor.

pub mod register;

use super::{OpenError, Output};
use crate::calibration::LinearCalibration;
use crate::config::DeviceConfig;
use crate::conversion::{Conversions, Converter};
use crate::domain::{Channel, Measurement};
use crate::drivers::transport::I2cTransport;
use crate::traits::i2c::BusProvider;
use crate::traits::sensors::{AcquisitionError, Sensor, Setting};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::i2c::I2c;
use register::calibration::Calibration;
use register::ctrl1::{BlockDataUpdate, Ctrl1, OutputDataRate};
use register::ctrl2::Ctrl2;
use register::status::Status;
use register::{read_output, H_OUT, T_OUT};

pub const ADDR: u8 = 0x5F;

pub struct Hts221<I, D, C = Conversions> {
    config: DeviceConfig,
    transport: I2cTransport<I, D>,
    calibration: Calibration,
    output: Output<C>,
}

impl<I, D, C> Hts221<I, D, C>
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
        let mut transport =
            I2cTransport::open(provider, config.bus_id, config.bus_address, delay)?;
        let calibration = Self::initialize(&mut transport).await?;
        debug!(
            "[{}] HTS221 at {:?} initialized",
            config.identity.as_str(),
            transport.address()
        );
        let output = Output::new(converter, config.target_unit);
        Ok(Self {
            config,
            transport,
            calibration,
            output,
        })
    }

    /// Reboots, powers up in continuous mode and reads the factory calibration.
    pub async fn initialize(
        transport: &mut I2cTransport<I, D>,
    ) -> Result<Calibration, AcquisitionError> {
        Ctrl2::modify(transport, |reg| {
            reg.boot();
        })
        .await?;

        Ctrl1::modify(transport, |reg| {
            reg.power_active()
                .output_data_rate(OutputDataRate::Hz1)
                .block_data_update(BlockDataUpdate::MsbLsbReading);
        })
        .await?;

        // Reading both outputs empties the status register
        if Status::read(transport).await?.any_available() {
            read_output(transport, T_OUT).await?;
            read_output(transport, H_OUT).await?;
        }

        Calibration::read(transport).await
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub async fn heater(&mut self) -> Result<bool, AcquisitionError> {
        Ok(Ctrl2::read(&mut self.transport).await?.heater_enabled())
    }

    pub fn release(self) -> (I, D) {
        self.transport.release()
    }
}

impl<I, D, C> Sensor for Hts221<I, D, C>
where
    I: I2c,
    D: DelayNs,
    C: Converter,
{
    fn config(&self) -> &DeviceConfig {
        &self.config
    }

    async fn acquire(&mut self) -> Result<Measurement, AcquisitionError> {
        let t_out = read_output(&mut self.transport, T_OUT).await?;
        let temperature = self.calibration.calibrated_temperature(t_out);

        let h_out = read_output(&mut self.transport, H_OUT).await?;
        let relative_humidity = self.calibration.calibrated_humidity(h_out);

        self.output.measurement(temperature, relative_humidity)
    }

    async fn configure(&mut self, setting: Setting) -> Result<(), AcquisitionError> {
        match setting {
            Setting::Heater(on) => {
                Ctrl2::modify(&mut self.transport, |reg| {
                    reg.heater(on);
                })
                .await
            }
            Setting::PrimaryResolution(_) | Setting::SecondaryResolution(_) => {
                Err(AcquisitionError::Unsupported)
            }
        }
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
    use crate::config::{HumidityResolution, SensorModel};
    use crate::testutil::RecordingDelay;
    use crate::traits::i2c::I2cAddress;
    use embedded_hal_mock::eh1::i2c::{Mock, Transaction};
    use futures::executor::block_on;
    use register::{CTRL_REG1, CTRL_REG2, STATUS};

    const BLOCK: [u8; 16] = [
        40, 160, 80, 64, 0, 0b0100, 0, 0, 0, 0, 0x70, 0x17, 0, 0, 0xB8, 0x0B,
    ];

    fn sensor(expectations: &[Transaction]) -> Hts221<Mock, RecordingDelay> {
        let transport = I2cTransport::new(
            Mock::new(expectations),
            I2cAddress::new(ADDR),
            RecordingDelay::new(),
        );
        Hts221 {
            config: DeviceConfig::new("hts", SensorModel::Hts221).unwrap(),
            transport,
            calibration: BLOCK.into(),
            output: Output::new(Conversions, crate::domain::unit::Unit::Celsius),
        }
    }

    #[test]
    fn test_initialize_sequence() {
        let expectations = [
            Transaction::write_read(ADDR, vec![CTRL_REG2], vec![0x00]),
            Transaction::write(ADDR, vec![CTRL_REG2, 0x80]),
            Transaction::write_read(ADDR, vec![CTRL_REG1], vec![0x00]),
            Transaction::write(ADDR, vec![CTRL_REG1, 0x85]),
            Transaction::write_read(ADDR, vec![STATUS], vec![0x03]),
            Transaction::write_read(ADDR, vec![T_OUT], vec![0x00, 0x00]),
            Transaction::write_read(ADDR, vec![H_OUT], vec![0x00, 0x00]),
            Transaction::write_read(ADDR, vec![0xB0], BLOCK.to_vec()),
        ];
        let delay = RecordingDelay::new();
        let mut transport =
            I2cTransport::new(Mock::new(&expectations), I2cAddress::new(ADDR), delay.clone());

        let calibration =
            block_on(Hts221::<Mock, RecordingDelay, Conversions>::initialize(&mut transport))
                .unwrap();

        assert_eq!(Calibration::from(BLOCK), calibration);
        assert_eq!(vec![15_000], delay.waits_us());
        transport.release().0.done();
    }

    #[test]
    fn test_acquire_interpolates() {
        let expectations = [
            Transaction::write_read(ADDR, vec![T_OUT], vec![0xDC, 0x05]),
            Transaction::write_read(ADDR, vec![H_OUT], vec![0xB8, 0x0B]),
        ];
        let mut sensor = sensor(&expectations);

        let m = block_on(sensor.acquire()).unwrap();

        assert!((m.primary - 25.0).abs() < 1e-3, "{}", m.primary);
        assert!((m.secondary - 50.0).abs() < 1e-3, "{}", m.secondary);
        assert!((m.derived - 13.85).abs() < 0.1, "{}", m.derived);
        sensor.release().0.done();
    }

    #[test]
    fn test_heater_and_resolution() {
        let expectations = [
            Transaction::write_read(ADDR, vec![CTRL_REG2], vec![0x00]),
            Transaction::write(ADDR, vec![CTRL_REG2, 0x02]),
        ];
        let mut sensor = sensor(&expectations);

        block_on(sensor.configure(Setting::Heater(true))).unwrap();
        assert_eq!(
            Err(AcquisitionError::Unsupported),
            block_on(sensor.configure(Setting::SecondaryResolution(
                HumidityResolution::Bits11
            )))
        );
        sensor.release().0.done();
    }
}
