use crate::calibration::LinearCalibration;
use crate::config::{DeviceConfig, HumidityResolution, TemperatureResolution};
use crate::conversion::ConversionError;
use crate::domain::{Channel, Measurement};
use core::fmt::{Display, Formatter};
use embedded_hal::i2c::ErrorKind;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionError {
    /// The bus endpoint could not be opened.
    Unavailable,
    /// The device did not answer, usually because a conversion was still running.
    Timeout,
    /// Fewer bytes than requested were transferred.
    ShortRead { expected: usize },
    /// Any other bus failure.
    Bus(ErrorKind),
    /// A write frame longer than the bus protocol allows.
    Frame,
    Conversion(ConversionError),
    /// The driver does not implement the requested capability.
    Unsupported,
}

impl AcquisitionError {
    pub(crate) fn from_bus<E: embedded_hal::i2c::Error>(e: E, expected: usize) -> Self {
        match e.kind() {
            ErrorKind::NoAcknowledge(_) => Self::Timeout,
            ErrorKind::Overrun => Self::ShortRead { expected },
            kind => Self::Bus(kind),
        }
    }
}

impl From<ConversionError> for AcquisitionError {
    fn from(e: ConversionError) -> Self {
        Self::Conversion(e)
    }
}

impl Display for AcquisitionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "bus endpoint unavailable"),
            Self::Timeout => write!(f, "bus transfer timed out"),
            Self::ShortRead { expected } => {
                write!(f, "short read, expected {} bytes", expected)
            }
            Self::Bus(kind) => write!(f, "bus error: {}", kind),
            Self::Frame => write!(f, "write frame too long"),
            Self::Conversion(e) => write!(f, "{}", e),
            Self::Unsupported => write!(f, "operation not supported by this sensor"),
        }
    }
}

/// A single configurable feature of a sensor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Setting {
    PrimaryResolution(TemperatureResolution),
    SecondaryResolution(HumidityResolution),
    Heater(bool),
}

/// Capabilities shared by every sensor variant.
///
/// Implementations keep no measurement state between calls: every
/// `acquire` runs the complete bus sequence.
#[allow(async_fn_in_trait)]
pub trait Sensor {
    fn config(&self) -> &DeviceConfig;

    /// Runs one complete, timed acquisition. Must not be called again on the
    /// same sensor before the previous call has finished.
    async fn acquire(&mut self) -> Result<Measurement, AcquisitionError>;

    /// Changes exactly one feature, preserving every other configuration bit.
    async fn configure(&mut self, setting: Setting) -> Result<(), AcquisitionError>;

    /// Applies a linear correction to one output channel, on top of any
    /// correction already in place.
    async fn calibrate(
        &mut self,
        channel: Channel,
        calibration: &LinearCalibration,
    ) -> Result<(), AcquisitionError> {
        let _ = (channel, calibration);
        Err(AcquisitionError::Unsupported)
    }

    /// Correction currently applied to `channel`, `None` if the sensor
    /// cannot be calibrated. Passing it to `calibrate` on a freshly opened
    /// sensor restores it.
    fn correction(&self, channel: Channel) -> Option<LinearCalibration> {
        let _ = channel;
        None
    }
}
