//! Structured log events and the sinks that receive them.

use crate::calibration::{ActionKind, CalibrationError, LinearCalibration, Stage};
use crate::domain::Channel;
use crate::traits::sensors::{AcquisitionError, Setting};

#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event<'a> {
    AcquisitionFault {
        device: &'a str,
        error: AcquisitionError,
    },
    Configured {
        device: &'a str,
        setting: Setting,
    },
    CalibrationTransition {
        device: &'a str,
        action: ActionKind,
        from: Stage,
        to: Stage,
    },
    CalibrationRejected {
        device: &'a str,
        action: ActionKind,
        stage: Stage,
        error: CalibrationError,
    },
    CalibrationApplied {
        device: &'a str,
        channel: Channel,
        calibration: LinearCalibration,
    },
}

/// Receives structured events from acquisition cycles and calibration
/// workflows. Injected at construction.
pub trait LogSink {
    fn record(&self, event: &Event<'_>);
}

impl<L: LogSink> LogSink for &L {
    fn record(&self, event: &Event<'_>) {
        (*self).record(event)
    }
}

/// Forwards events to the global `log` or `defmt` logger.
#[derive(Debug, Copy, Clone, Default)]
pub struct GlobalLog;

impl LogSink for GlobalLog {
    fn record(&self, event: &Event<'_>) {
        match event {
            Event::AcquisitionFault { device, error } => {
                warn!("[{}] acquisition fault: {:?}", device, error);
            }
            Event::Configured { device, setting } => {
                debug!("[{}] configured {:?}", device, setting);
            }
            Event::CalibrationTransition {
                device,
                action,
                from,
                to,
            } => {
                info!("[{}] calibration {:?}: {:?} -> {:?}", device, action, from, to);
            }
            Event::CalibrationRejected {
                device,
                action,
                stage,
                error,
            } => {
                warn!(
                    "[{}] calibration {:?} rejected in {:?}: {:?}",
                    device,
                    action,
                    stage,
                    error
                );
            }
            Event::CalibrationApplied {
                device,
                channel,
                calibration,
            } => {
                info!(
                    "[{}] calibration applied to {:?}: slope={} offset={}",
                    device,
                    channel,
                    calibration.slope,
                    calibration.offset
                );
            }
        }
    }
}
