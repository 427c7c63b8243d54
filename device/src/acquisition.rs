//! Acquisition cycles on top of a [`Sensor`].

use crate::domain::Measurement;
use crate::traits::log::{Event, GlobalLog, LogSink};
use crate::traits::sensors::{AcquisitionError, Sensor, Setting};
use futures::stream::{self, Stream};

/// Outcome of the most recent acquisition attempt.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Fault {
    None,
    Acquisition(AcquisitionError),
}

impl Fault {
    pub fn is_fault(&self) -> bool {
        !matches!(self, Fault::None)
    }
}

/// Caches the measurement of the current cycle for one sensor.
///
/// Reading a field acquires only if the current cycle has no measurement
/// yet. A new cycle starts with [`Acquisition::invalidate`]. Failed attempts
/// are recorded in the log sink and reported through [`Acquisition::fault`];
/// the last good measurement stays available from [`Acquisition::latest`].
pub struct Acquisition<S, L = GlobalLog>
where
    S: Sensor,
    L: LogSink,
{
    sensor: S,
    log: L,
    latest: Option<Measurement>,
    fresh: bool,
    fault: Fault,
}

impl<S: Sensor> Acquisition<S, GlobalLog> {
    pub fn new(sensor: S) -> Self {
        Self::with_log(sensor, GlobalLog)
    }
}

impl<S, L> Acquisition<S, L>
where
    S: Sensor,
    L: LogSink,
{
    pub fn with_log(sensor: S, log: L) -> Self {
        Self {
            sensor,
            log,
            latest: None,
            fresh: false,
            fault: Fault::None,
        }
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn sensor_mut(&mut self) -> &mut S {
        &mut self.sensor
    }

    pub fn into_inner(self) -> S {
        self.sensor
    }

    /// The measurement of the current cycle, acquiring it first if needed.
    pub async fn get_or_acquire(&mut self) -> Result<Measurement, AcquisitionError> {
        match self.latest {
            Some(measurement) if self.fresh => Ok(measurement),
            _ => self.acquire().await,
        }
    }

    /// Runs a new acquisition regardless of the cache.
    pub async fn acquire(&mut self) -> Result<Measurement, AcquisitionError> {
        match self.sensor.acquire().await {
            Ok(measurement) => {
                self.latest.replace(measurement);
                self.fresh = true;
                self.fault = Fault::None;
                Ok(measurement)
            }
            Err(error) => {
                self.log.record(&Event::AcquisitionFault {
                    device: self.sensor.config().identity.as_str(),
                    error,
                });
                self.fresh = false;
                self.fault = Fault::Acquisition(error);
                Err(error)
            }
        }
    }

    /// Starts a new cycle. The next field access acquires again.
    pub fn invalidate(&mut self) {
        self.fresh = false;
    }

    /// Last successful measurement, from this or an earlier cycle.
    pub fn latest(&self) -> Option<&Measurement> {
        self.latest.as_ref()
    }

    pub fn fault(&self) -> Fault {
        self.fault
    }

    pub async fn temperature(&mut self) -> Option<f32> {
        self.get_or_acquire().await.ok().map(|m| m.primary)
    }

    pub async fn humidity(&mut self) -> Option<f32> {
        self.get_or_acquire().await.ok().map(|m| m.secondary)
    }

    pub async fn dew_point(&mut self) -> Option<f32> {
        self.get_or_acquire().await.ok().map(|m| m.derived)
    }

    /// Changes one sensor setting. Measurements taken before the change are
    /// not reused.
    pub async fn configure(&mut self, setting: Setting) -> Result<(), AcquisitionError> {
        self.sensor.configure(setting).await?;
        self.log.record(&Event::Configured {
            device: self.sensor.config().identity.as_str(),
            setting,
        });
        self.invalidate();
        Ok(())
    }

    /// One fresh acquisition per item. The stream never ends on its own; the
    /// consumer stops polling when it is done, and may call `readings` again
    /// later to continue.
    pub fn readings(
        &mut self,
    ) -> impl Stream<Item = Result<Measurement, AcquisitionError>> + '_ {
        stream::unfold(self, |this| async move {
            let reading = this.acquire().await;
            Some((reading, this))
        })
    }
}
