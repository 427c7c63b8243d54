#![cfg_attr(not(feature = "std"), no_std)]
//! Drogue Sensors is an async, no-alloc framework for humidity and temperature sensors on a
//! register bus, built on [embedded-hal-async](https://docs.rs/embedded-hal-async) and the
//! [embassy](https://github.com/embassy-rs/embassy) time and sync primitives.
//!
//! # Drivers
//!
//! Every sensor model implements the [`Sensor`](traits::sensors::Sensor) trait: `acquire` a
//! complete [`Measurement`](domain::Measurement), `configure` one setting and optionally
//! `calibrate` an output channel. [`SensorDriver`](drivers::sensors::SensorDriver) picks the
//! variant named by the [`DeviceConfig`](config::DeviceConfig).
//!
//! Bus access goes through an [`I2cTransport`](drivers::transport::I2cTransport), which waits
//! the settle time the device needs after every write.
//!
//! # Acquisition cycles
//!
//! [`Acquisition`](acquisition::Acquisition) caches one measurement per cycle and reports faults
//! without propagating them, so one failing sensor never stops the others.
//!
//! # Calibration
//!
//! A [`CalibrationWorkflow`](calibration::CalibrationWorkflow) collects reference points over
//! independent requests and applies a linear correction when the session is cleared.
//!
//! # Example
//!
//! ```ignore
//! let config = DeviceConfig::new("greenhouse", SensorModel::Hdc1000)?.target_unit(Unit::Fahrenheit);
//! let sensor = SensorDriver::open(&mut buses, config, Delay, Conversions).await?;
//! let mut acquisition = Acquisition::new(sensor);
//!
//! if let Some(temperature) = acquisition.temperature().await {
//!     info!("temperature: {}", temperature);
//! }
//! ```

pub(crate) mod fmt;

pub mod acquisition;
pub mod calibration;
pub mod config;
pub mod conversion;
pub mod domain;
pub mod drivers;
pub mod traits;

pub use acquisition::{Acquisition, Fault};
pub use calibration::{CalibrationAction, CalibrationWorkflow, Calibrations, Stage};
pub use config::{DeviceConfig, SensorModel};
pub use conversion::{Conversions, Converter};
pub use domain::{unit::Unit, Channel, Measurement};
pub use drivers::sensors::SensorDriver;
pub use traits::sensors::{AcquisitionError, Sensor, Setting};

#[cfg(feature = "std")]
pub mod testutil;
