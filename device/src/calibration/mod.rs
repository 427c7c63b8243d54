//! Multi-step calibration driven by independent requests.
//!
//! A calibration is a small state machine per device:
//!
//! ```text
//! Idle --begin--> AwaitingFirstPoint --submit--> AwaitingNextPoint --finish--> Completed
//!                                                 ^            |                  |
//!                                                 +--submit----+                  |
//! Idle <-------------------------------- clear -----------------------------------+
//! ```
//!
//! `abort` returns to `Idle` from any stage. The session is loaded from and
//! saved to a [`SessionStore`] on every action, so consecutive actions may
//! arrive through unrelated invocations.

mod fit;
mod store;
mod workflow;

pub use fit::LinearCalibration;
pub use store::{MemorySessionStore, SessionStore, StoreError};
pub use workflow::{Calibrations, CalibrationWorkflow};

use crate::config::Identity;
use crate::domain::Channel;
use crate::traits::sensors::AcquisitionError;
use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

/// Points a single session can accumulate.
pub const MAX_POINTS: usize = 16;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    AwaitingFirstPoint,
    AwaitingNextPoint,
    Completed,
}

/// A request against the workflow.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationAction {
    Begin,
    /// Take a fresh reading and pair it with the reference value.
    SubmitPoint(f32),
    Finish,
    /// Compute and apply the correction, then discard the session.
    Clear,
    /// Discard the session from any stage.
    Abort,
}

impl CalibrationAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Begin => ActionKind::Begin,
            Self::SubmitPoint(_) => ActionKind::SubmitPoint,
            Self::Finish => ActionKind::Finish,
            Self::Clear => ActionKind::Clear,
            Self::Abort => ActionKind::Abort,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ActionKind {
    Begin,
    SubmitPoint,
    Finish,
    Clear,
    Abort,
}

impl ActionKind {
    /// Stage reached when this action is accepted in `from`.
    pub fn next(&self, from: Stage) -> Option<Stage> {
        match (self, from) {
            (Self::Begin, Stage::Idle) => Some(Stage::AwaitingFirstPoint),
            (Self::SubmitPoint, Stage::AwaitingFirstPoint | Stage::AwaitingNextPoint) => {
                Some(Stage::AwaitingNextPoint)
            }
            (Self::Finish, Stage::AwaitingNextPoint) => Some(Stage::Completed),
            (Self::Clear, Stage::Completed) => Some(Stage::Idle),
            (Self::Abort, _) => Some(Stage::Idle),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationPoint {
    /// Reading taken by the device when the point was submitted.
    pub raw: f32,
    pub reference: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSession {
    pub device: Identity,
    pub channel: Channel,
    pub stage: Stage,
    pub points: heapless::Vec<CalibrationPoint, MAX_POINTS>,
    /// Set once `Clear` has handed the fit to the sensor. A retried `Clear`
    /// only removes the session.
    #[serde(default)]
    pub applied: Option<LinearCalibration>,
}

impl CalibrationSession {
    pub fn new(device: Identity, channel: Channel) -> Self {
        Self {
            device,
            channel,
            stage: Stage::AwaitingFirstPoint,
            points: heapless::Vec::new(),
            applied: None,
        }
    }

    pub fn completed(&self) -> bool {
        self.stage == Stage::Completed
    }

    pub fn contains_reference(&self, reference: f32) -> bool {
        self.points
            .iter()
            .any(|p| p.reference.to_bits() == reference.to_bits())
    }

    pub fn status(&self) -> CalibrationStatus {
        CalibrationStatus {
            stage: self.stage,
            points: self.points.len(),
            complete: self.completed(),
            applied: self.applied,
        }
    }
}

/// Result of an accepted action.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationStatus {
    pub stage: Stage,
    pub points: usize,
    pub complete: bool,
    /// Correction applied by a `Clear`, if any.
    pub applied: Option<LinearCalibration>,
}

impl CalibrationStatus {
    pub const IDLE: Self = Self {
        stage: Stage::Idle,
        points: 0,
        complete: false,
        applied: None,
    };
}

/// An action that is not valid in the current stage.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationStateError {
    pub stage: Stage,
    pub action: ActionKind,
}

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    State(CalibrationStateError),
    /// The reference value was already submitted in this session.
    DuplicatePoint,
    /// The reference value is NaN or infinite.
    InvalidReference,
    SessionFull,
    /// No workflow is registered for the device, or the sensor belongs to another device.
    UnknownDevice,
    Acquisition(AcquisitionError),
    Store(StoreError),
}

impl From<CalibrationStateError> for CalibrationError {
    fn from(e: CalibrationStateError) -> Self {
        Self::State(e)
    }
}

impl From<AcquisitionError> for CalibrationError {
    fn from(e: AcquisitionError) -> Self {
        Self::Acquisition(e)
    }
}

impl From<StoreError> for CalibrationError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl Display for CalibrationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::State(e) => write!(f, "{:?} is not allowed in stage {:?}", e.action, e.stage),
            Self::DuplicatePoint => write!(f, "reference value already submitted"),
            Self::InvalidReference => write!(f, "reference value is not finite"),
            Self::SessionFull => write!(f, "session holds {} points already", MAX_POINTS),
            Self::UnknownDevice => write!(f, "unknown device"),
            Self::Acquisition(e) => write!(f, "{}", e),
            Self::Store(e) => write!(f, "{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        assert_eq!(Some(Stage::AwaitingFirstPoint), ActionKind::Begin.next(Stage::Idle));
        assert_eq!(None, ActionKind::Begin.next(Stage::AwaitingNextPoint));
        assert_eq!(
            Some(Stage::AwaitingNextPoint),
            ActionKind::SubmitPoint.next(Stage::AwaitingFirstPoint)
        );
        assert_eq!(
            Some(Stage::AwaitingNextPoint),
            ActionKind::SubmitPoint.next(Stage::AwaitingNextPoint)
        );
        assert_eq!(None, ActionKind::SubmitPoint.next(Stage::Completed));
        assert_eq!(None, ActionKind::Finish.next(Stage::Idle));
        assert_eq!(None, ActionKind::Finish.next(Stage::AwaitingFirstPoint));
        assert_eq!(Some(Stage::Completed), ActionKind::Finish.next(Stage::AwaitingNextPoint));
        assert_eq!(None, ActionKind::Clear.next(Stage::AwaitingNextPoint));
        assert_eq!(Some(Stage::Idle), ActionKind::Clear.next(Stage::Completed));
        for stage in [
            Stage::Idle,
            Stage::AwaitingFirstPoint,
            Stage::AwaitingNextPoint,
            Stage::Completed,
        ] {
            assert_eq!(Some(Stage::Idle), ActionKind::Abort.next(stage));
        }
    }

    #[test]
    fn test_duplicate_reference_detection() {
        let mut session = CalibrationSession::new(Identity::try_from("hdc").unwrap(), Channel::Primary);
        session
            .points
            .push(CalibrationPoint {
                raw: 20.1,
                reference: 20.0,
            })
            .unwrap();
        assert!(session.contains_reference(20.0));
        assert!(!session.contains_reference(20.5));
    }
}
