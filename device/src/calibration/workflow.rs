use super::*;
use crate::traits::log::{Event, GlobalLog, LogSink};
use crate::traits::sensors::Sensor;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

/// Calibration state machine for one device identity.
///
/// The store is guarded by a per-device lock, so concurrent actions for the
/// same device are applied one after the other. Actions for other devices go
/// through their own workflow and never contend for this lock.
pub struct CalibrationWorkflow<M, St, L = GlobalLog>
where
    M: RawMutex,
    St: SessionStore,
    L: LogSink,
{
    device: Identity,
    channel: Channel,
    store: Mutex<M, St>,
    log: L,
}

impl<M, St> CalibrationWorkflow<M, St, GlobalLog>
where
    M: RawMutex,
    St: SessionStore,
{
    pub fn new(device: Identity, channel: Channel, store: St) -> Self {
        Self::with_log(device, channel, store, GlobalLog)
    }
}

impl<M, St, L> CalibrationWorkflow<M, St, L>
where
    M: RawMutex,
    St: SessionStore,
    L: LogSink,
{
    pub fn with_log(device: Identity, channel: Channel, store: St, log: L) -> Self {
        Self {
            device,
            channel,
            store: Mutex::new(store),
            log,
        }
    }

    pub fn device(&self) -> &str {
        self.device.as_str()
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Current stage and point count, without changing anything.
    pub async fn status(&self) -> Result<CalibrationStatus, CalibrationError> {
        let mut store = self.store.lock().await;
        Ok(store
            .load(&self.device)
            .await?
            .map(|s| s.status())
            .unwrap_or(CalibrationStatus::IDLE))
    }

    /// Applies `action`. Rejected or failed actions leave the stored session
    /// exactly as it was.
    pub async fn handle<S: Sensor>(
        &self,
        sensor: &mut S,
        action: CalibrationAction,
    ) -> Result<CalibrationStatus, CalibrationError> {
        if sensor.config().identity != self.device {
            return Err(CalibrationError::UnknownDevice);
        }

        let mut store = self.store.lock().await;
        let current = store.load(&self.device).await?;
        let from = current.as_ref().map(|s| s.stage).unwrap_or(Stage::Idle);
        let kind = action.kind();

        if kind.next(from).is_none() {
            return Err(self.reject(
                kind,
                from,
                CalibrationStateError {
                    stage: from,
                    action: kind,
                }
                .into(),
            ));
        }

        let status = match (action, current) {
            (CalibrationAction::Begin, _) => {
                let session = CalibrationSession::new(self.device.clone(), self.channel);
                store.save(&session).await?;
                session.status()
            }
            (CalibrationAction::SubmitPoint(reference), Some(mut session)) => {
                if !reference.is_finite() {
                    return Err(self.reject(kind, from, CalibrationError::InvalidReference));
                }
                if session.contains_reference(reference) {
                    return Err(self.reject(kind, from, CalibrationError::DuplicatePoint));
                }
                if session.points.is_full() {
                    return Err(self.reject(kind, from, CalibrationError::SessionFull));
                }
                let measurement = sensor.acquire().await?;
                let raw = measurement.value(session.channel);
                session
                    .points
                    .push(CalibrationPoint { raw, reference })
                    .map_err(|_| CalibrationError::SessionFull)?;
                session.stage = Stage::AwaitingNextPoint;
                store.save(&session).await?;
                session.status()
            }
            (CalibrationAction::Finish, Some(mut session)) => {
                session.stage = Stage::Completed;
                store.save(&session).await?;
                session.status()
            }
            (CalibrationAction::Clear, Some(session)) => {
                // already handed to the sensor by a Clear whose removal failed
                let applied = match session.applied {
                    Some(calibration) => Some(calibration),
                    None => self.apply(&mut *store, sensor, session).await?,
                };
                store.remove(&self.device).await?;
                CalibrationStatus {
                    applied,
                    ..CalibrationStatus::IDLE
                }
            }
            (CalibrationAction::Abort, _) => {
                store.remove(&self.device).await?;
                CalibrationStatus::IDLE
            }
            // every other combination was rejected by the transition table
            (_, None) => {
                return Err(CalibrationStateError {
                    stage: from,
                    action: kind,
                }
                .into())
            }
        };

        self.log.record(&Event::CalibrationTransition {
            device: self.device.as_str(),
            action: kind,
            from,
            to: status.stage,
        });
        Ok(status)
    }

    fn reject(&self, action: ActionKind, stage: Stage, error: CalibrationError) -> CalibrationError {
        self.log.record(&Event::CalibrationRejected {
            device: self.device.as_str(),
            action,
            stage,
            error,
        });
        error
    }

    /// Fits the session and hands the correction to the sensor.
    ///
    /// The fit is stored in the session before the sensor sees it, so the
    /// correction reaches the sensor at most once even if the session cannot
    /// be removed afterwards. If the sensor refuses it, the session is stored
    /// back as it was.
    async fn apply<S: Sensor>(
        &self,
        store: &mut St,
        sensor: &mut S,
        session: CalibrationSession,
    ) -> Result<Option<LinearCalibration>, CalibrationError> {
        let calibration = match LinearCalibration::fit(&session.points) {
            Some(calibration) => calibration,
            None => return Ok(None),
        };
        let mut committed = session.clone();
        committed.applied = Some(calibration);
        store.save(&committed).await?;

        match sensor.calibrate(session.channel, &calibration).await {
            Ok(()) => {
                self.log.record(&Event::CalibrationApplied {
                    device: self.device.as_str(),
                    channel: session.channel,
                    calibration,
                });
                Ok(Some(calibration))
            }
            Err(AcquisitionError::Unsupported) => {
                warn!(
                    "[{}] sensor does not support calibration, discarding session",
                    self.device.as_str()
                );
                store.save(&session).await?;
                Ok(None)
            }
            Err(e) => {
                store.save(&session).await?;
                Err(e.into())
            }
        }
    }
}

/// Fixed set of workflows, looked up by device identity.
pub struct Calibrations<M, St, L, const N: usize>
where
    M: RawMutex,
    St: SessionStore,
    L: LogSink,
{
    workflows: heapless::Vec<CalibrationWorkflow<M, St, L>, N>,
}

impl<M, St, L, const N: usize> Default for Calibrations<M, St, L, N>
where
    M: RawMutex,
    St: SessionStore,
    L: LogSink,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<M, St, L, const N: usize> Calibrations<M, St, L, N>
where
    M: RawMutex,
    St: SessionStore,
    L: LogSink,
{
    pub fn new() -> Self {
        Self {
            workflows: heapless::Vec::new(),
        }
    }

    /// Registers a workflow. Gives it back if the registry is full or the
    /// identity is already registered.
    pub fn register(
        &mut self,
        workflow: CalibrationWorkflow<M, St, L>,
    ) -> Result<(), CalibrationWorkflow<M, St, L>> {
        if self.get(workflow.device()).is_some() {
            return Err(workflow);
        }
        self.workflows.push(workflow)
    }

    pub fn get(&self, device: &str) -> Option<&CalibrationWorkflow<M, St, L>> {
        self.workflows.iter().find(|w| w.device() == device)
    }

    pub async fn handle<S: Sensor>(
        &self,
        device: &str,
        sensor: &mut S,
        action: CalibrationAction,
    ) -> Result<CalibrationStatus, CalibrationError> {
        match self.get(device) {
            Some(workflow) => workflow.handle(sensor, action).await,
            None => Err(CalibrationError::UnknownDevice),
        }
    }
}
