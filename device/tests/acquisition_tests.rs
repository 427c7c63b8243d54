#[cfg(feature = "std")]
mod tests {
    use drogue_sensors::config::{ConfigError, HumidityResolution, TemperatureResolution};
    use drogue_sensors::drivers::sensors::hdc1000::register::config::{
        BatteryStatus, BATTERY_STATUS, HEATER, HUMIDITY_RESOLUTION, TEMPERATURE_RESOLUTION,
    };
    use drogue_sensors::drivers::sensors::hdc1000::register::TEMPERATURE;
    use drogue_sensors::drivers::sensors::hdc1000::{Hdc1000, ADDR};
    use drogue_sensors::drivers::sensors::OpenError;
    use drogue_sensors::drivers::transport::I2cTransport;
    use drogue_sensors::testutil::*;
    use drogue_sensors::traits::i2c::I2cAddress;
    use drogue_sensors::*;
    use embassy_futures::join::join;
    use embassy_time::Duration;
    use embedded_hal::i2c::ErrorKind;
    use futures::executor::block_on;
    use futures::StreamExt;
    use serde::Serialize;
    use std::thread;

    type Driver = SensorDriver<SimulatedHdc1000, RecordingDelay>;

    fn setup(
        identity: &str,
        bus_id: u8,
        configure: impl FnOnce(DeviceConfig) -> DeviceConfig,
    ) -> (SimulatedHdc1000, RecordingDelay, Driver) {
        let delay = RecordingDelay::new();
        let device = SimulatedHdc1000::new(ADDR, delay.clock());
        let mut bus = SimulatedBus::new().with_line(bus_id, device.clone());
        let config = configure(
            DeviceConfig::new(identity, SensorModel::Hdc1000)
                .unwrap()
                .bus(bus_id, ADDR),
        );
        let sensor = block_on(SensorDriver::open(&mut bus, config, delay.clone(), Conversions))
            .unwrap();
        (device, delay, sensor)
    }

    #[test]
    fn test_open_applies_resolutions() {
        let (device, delay, sensor) = setup("hdc", 1, |c| {
            c.resolution(TemperatureResolution::Bits11, HumidityResolution::Bits8)
        });

        assert_eq!(SensorModel::Hdc1000, sensor.model());
        assert_eq!(0x1600, device.config());
        assert_eq!(
            vec![15_000, 62_500, 15_000, 15_000, 15_000],
            delay.waits_us()
        );
        assert_eq!(
            vec![
                vec![0x02],
                vec![0x02, 0x10, 0x00],
                vec![0x02, 0x14, 0x00],
                vec![0x02, 0x16, 0x00],
            ],
            device.writes()
        );
    }

    #[test]
    fn test_open_failures() {
        let delay = RecordingDelay::new();
        let device = SimulatedHdc1000::new(ADDR, delay.clock());
        let mut bus = SimulatedBus::new().with_line(1, device);

        let config = DeviceConfig::new("hdc", SensorModel::Hdc1000)
            .unwrap()
            .bus(2, ADDR);
        let result = block_on(Driver::open(&mut bus, config, delay.clone(), Conversions));
        assert!(matches!(
            result,
            Err(OpenError::Acquisition(AcquisitionError::Unavailable))
        ));

        let config = DeviceConfig::new("hdc", SensorModel::Hdc1000)
            .unwrap()
            .target_unit(Unit::PercentRelativeHumidity);
        let result = block_on(Driver::open(&mut bus, config, delay.clone(), Conversions));
        assert!(matches!(
            result,
            Err(OpenError::Config(ConfigError::UnsupportedUnit(_)))
        ));

        // nothing answers at the wrong address
        let config = DeviceConfig::new("hdc", SensorModel::Hdc1000)
            .unwrap()
            .bus(1, 0x41);
        let result = block_on(Driver::open(&mut bus, config, delay, Conversions));
        assert!(matches!(
            result,
            Err(OpenError::Acquisition(AcquisitionError::Timeout))
        ));
    }

    #[test]
    fn test_measurement_in_target_unit() {
        let (device, delay, mut sensor) =
            setup("hdc", 1, |c| c.target_unit(Unit::Fahrenheit));
        device.set_reading(25.0, 50.0);
        let before = delay.waits_us().len();

        let m = block_on(sensor.acquire()).unwrap();

        assert!((m.primary - 77.0).abs() < 0.01, "{}", m.primary);
        assert!((m.secondary - 50.0).abs() < 0.01, "{}", m.secondary);
        // 13.85 °C
        assert!((m.derived - 56.93).abs() < 0.18, "{}", m.derived);
        assert_eq!(Unit::Fahrenheit, m.unit_primary);
        assert_eq!(Unit::PercentRelativeHumidity, m.unit_secondary);
        assert_eq!(Unit::Fahrenheit, m.unit_derived);
        assert_eq!(&[62_500, 15_000, 62_500], &delay.waits_us()[before..]);
    }

    #[test]
    fn test_raw_bounds() {
        let (device, _, mut sensor) = setup("hdc", 1, |c| c);

        device.set_raw(0x0000, 0x0000);
        let m = block_on(sensor.acquire()).unwrap();
        assert_eq!(-40.0, m.primary);
        assert_eq!(0.0, m.secondary);

        device.set_raw(0xFFFF, 0xFFFF);
        let m = block_on(sensor.acquire()).unwrap();
        assert!(m.primary > 124.99 && m.primary < 125.0, "{}", m.primary);
        assert!(m.secondary > 99.99 && m.secondary < 100.0, "{}", m.secondary);
    }

    #[test]
    fn test_configure_changes_only_its_field() {
        let (device, _, mut sensor) = setup("hdc", 1, |c| c);
        let settings = [
            (Setting::PrimaryResolution(TemperatureResolution::Bits11), TEMPERATURE_RESOLUTION, 0x0400),
            (Setting::PrimaryResolution(TemperatureResolution::Bits14), TEMPERATURE_RESOLUTION, 0x0000),
            (Setting::SecondaryResolution(HumidityResolution::Bits8), HUMIDITY_RESOLUTION, 0x0200),
            (Setting::SecondaryResolution(HumidityResolution::Bits11), HUMIDITY_RESOLUTION, 0x0100),
            (Setting::SecondaryResolution(HumidityResolution::Bits14), HUMIDITY_RESOLUTION, 0x0000),
            (Setting::Heater(true), HEATER, 0x2000),
            (Setting::Heater(false), HEATER, 0x0000),
        ];

        for start in [0x1000, 0x3E00, 0x1900, 0x0300, 0x2C00] {
            for (setting, mask, value) in settings {
                device.set_config(start);
                block_on(sensor.configure(setting)).unwrap();
                let after = device.config();
                assert_eq!(0, (start ^ after) & !mask, "{:?} from {:04X}", setting, start);
                assert_eq!(value, after & mask, "{:?} from {:04X}", setting, start);
            }
        }
    }

    #[test]
    fn test_status_registers() {
        let delay = RecordingDelay::new();
        let device = SimulatedHdc1000::new(ADDR, delay.clock());
        let mut bus = SimulatedBus::new().with_line(1, device.clone());
        let config = DeviceConfig::new("hdc", SensorModel::Hdc1000).unwrap();
        let mut sensor = block_on(Hdc1000::open(&mut bus, config, delay, Conversions)).unwrap();

        assert_eq!(0x5449, block_on(sensor.manufacturer_id()).unwrap());
        assert_eq!(0x1000, block_on(sensor.device_id()).unwrap());
        assert_eq!(0x0123_4567_8900, block_on(sensor.serial_number()).unwrap());
        assert_eq!(BatteryStatus::Ok, block_on(sensor.battery()).unwrap());

        device.set_config(device.config() | BATTERY_STATUS);
        assert_eq!(BatteryStatus::Low, block_on(sensor.battery()).unwrap());

        block_on(sensor.configure(Setting::Heater(true))).unwrap();
        assert!(block_on(sensor.heater()).unwrap());
        // read-only bit survives the write
        assert_eq!(BATTERY_STATUS, device.config() & BATTERY_STATUS);

        block_on(sensor.reset()).unwrap();
        assert_eq!(SimulatedHdc1000::POWER_ON_CONFIG, device.config());
    }

    #[test]
    fn test_reading_before_conversion_completes() {
        let delay = RecordingDelay::new();
        let device = SimulatedHdc1000::new(ADDR, delay.clock());
        let mut transport = I2cTransport::new(device, I2cAddress::new(ADDR), delay);

        block_on(transport.write_command(TEMPERATURE, &[], Duration::from_millis(10))).unwrap();
        assert_eq!(
            Err(AcquisitionError::Timeout),
            block_on(transport.read_response::<2>())
        );

        block_on(transport.write_command(TEMPERATURE, &[], Duration::from_micros(62_500)))
            .unwrap();
        assert!(block_on(transport.read_response::<2>()).is_ok());
    }

    #[test]
    fn test_fault_is_reported_not_raised() {
        let (device, _, sensor) = setup("hdc", 1, |c| c);
        let sink = RecordingSink::new();
        let mut acquisition = Acquisition::with_log(sensor, sink.clone());
        device.set_reading(21.0, 40.0);

        assert!(block_on(acquisition.temperature()).is_some());
        let good = *acquisition.latest().unwrap();

        device.fail_with(Some(ErrorKind::ArbitrationLoss));
        acquisition.invalidate();
        assert_eq!(None, block_on(acquisition.temperature()));
        assert_eq!(None, block_on(acquisition.dew_point()));
        assert_eq!(
            Fault::Acquisition(AcquisitionError::Bus(ErrorKind::ArbitrationLoss)),
            acquisition.fault()
        );
        assert_eq!(Some(&good), acquisition.latest());
        // one record per failed attempt
        assert_eq!(2, sink.faults());

        device.fail_with(None);
        device.set_reading(22.0, 40.0);
        let t = block_on(acquisition.temperature()).unwrap();
        assert!((t - 22.0).abs() < 0.01);
        assert_eq!(Fault::None, acquisition.fault());
        assert_eq!(2, sink.faults());
    }

    #[test]
    fn test_configure_starts_new_cycle() {
        let (device, _, sensor) = setup("hdc", 1, |c| c);
        let sink = RecordingSink::new();
        let mut acquisition = Acquisition::with_log(sensor, sink.clone());
        device.set_reading(21.0, 40.0);
        block_on(acquisition.get_or_acquire()).unwrap();

        device.set_reading(23.0, 40.0);
        block_on(acquisition.configure(Setting::Heater(true))).unwrap();
        let t = block_on(acquisition.temperature()).unwrap();

        assert!((t - 23.0).abs() < 0.01);
        assert_eq!(1, sink.count("Configured"));
    }

    #[test]
    fn test_readings_stream() {
        let (device, _, sensor) = setup("hdc", 1, |c| c);
        let mut acquisition = Acquisition::new(sensor);
        device.set_reading(18.0, 55.0);

        let readings: Vec<_> = block_on(acquisition.readings().take(3).collect());

        assert_eq!(3, readings.len());
        for reading in readings {
            let m = reading.unwrap();
            assert!((m.primary - 18.0).abs() < 0.01);
        }
    }

    #[test]
    fn test_devices_are_isolated_when_joined() {
        let (first, _, a) = setup("first", 1, |c| c);
        let (second, _, b) = setup("second", 2, |c| c.target_unit(Unit::Kelvin));
        first.set_reading(10.0, 20.0);
        second.set_reading(30.0, 80.0);
        let mut a = Acquisition::new(a);
        let mut b = Acquisition::new(b);

        let (ma, mb) = block_on(join(a.get_or_acquire(), b.get_or_acquire()));
        let (ma, mb) = (ma.unwrap(), mb.unwrap());

        assert!((ma.primary - 10.0).abs() < 0.01);
        assert!((ma.secondary - 20.0).abs() < 0.01);
        assert!((mb.primary - 303.15).abs() < 0.01);
        assert!((mb.secondary - 80.0).abs() < 0.01);
    }

    #[test]
    fn test_devices_are_isolated_across_threads() {
        let handles: Vec<_> = [(1u8, 21.0f32, 35.0f32), (2, 28.0, 60.0), (3, -5.0, 90.0)]
            .into_iter()
            .map(|(bus_id, temperature, humidity)| {
                thread::spawn(move || {
                    let identity = format!("device-{}", bus_id);
                    let (device, _, sensor) = setup(&identity, bus_id, |c| c);
                    device.set_reading(temperature, humidity);
                    let mut acquisition = Acquisition::new(sensor);
                    for _ in 0..20 {
                        acquisition.invalidate();
                        let m = block_on(acquisition.get_or_acquire()).unwrap();
                        assert!((m.primary - temperature).abs() < 0.01);
                        assert!((m.secondary - humidity).abs() < 0.01);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[derive(Serialize)]
    struct RawConfig<'a> {
        identity: &'a str,
        model: &'a str,
        bus_id: u8,
        bus_address: u8,
        resolution_primary: u8,
        resolution_secondary: u8,
        target_unit: &'a str,
    }

    #[test]
    fn test_config_from_cbor() {
        let raw = RawConfig {
            identity: "greenhouse",
            model: "hdc1000",
            bus_id: 1,
            bus_address: 0x40,
            resolution_primary: 11,
            resolution_secondary: 8,
            target_unit: "fahrenheit",
        };
        let bytes = serde_cbor::to_vec(&raw).unwrap();
        let config: DeviceConfig = serde_cbor::from_slice(&bytes).unwrap();
        assert_eq!(
            DeviceConfig::new("greenhouse", SensorModel::Hdc1000)
                .unwrap()
                .resolution(TemperatureResolution::Bits11, HumidityResolution::Bits8)
                .target_unit(Unit::Fahrenheit),
            config
        );

        let bytes = serde_cbor::to_vec(&RawConfig {
            resolution_secondary: 12,
            ..raw
        })
        .unwrap();
        assert!(serde_cbor::from_slice::<DeviceConfig>(&bytes).is_err());
    }
}
