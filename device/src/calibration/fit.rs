use super::CalibrationPoint;
use serde::{Deserialize, Serialize};

/// Correction `y = slope * x + offset` applied to one output channel.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearCalibration {
    pub slope: f32,
    pub offset: f32,
}

impl Default for LinearCalibration {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl LinearCalibration {
    pub const IDENTITY: Self = Self {
        slope: 1.0,
        offset: 0.0,
    };

    pub fn apply(&self, value: f32) -> f32 {
        self.slope * value + self.offset
    }

    /// The correction equivalent to applying `self` first and `next` after it.
    pub fn then(&self, next: &LinearCalibration) -> LinearCalibration {
        LinearCalibration {
            slope: next.slope * self.slope,
            offset: next.slope * self.offset + next.offset,
        }
    }

    /// Least-squares fit of reference values against raw readings.
    ///
    /// A single point, or points that share one raw reading, only determine
    /// an offset. Returns `None` without points.
    pub fn fit(points: &[CalibrationPoint]) -> Option<LinearCalibration> {
        if points.is_empty() {
            return None;
        }
        let n = points.len() as f32;
        let mean_x = points.iter().map(|p| p.raw).sum::<f32>() / n;
        let mean_y = points.iter().map(|p| p.reference).sum::<f32>() / n;

        let mut sxx = 0.0;
        let mut sxy = 0.0;
        for p in points {
            let dx = p.raw - mean_x;
            sxx += dx * dx;
            sxy += dx * (p.reference - mean_y);
        }

        if sxx <= f32::EPSILON {
            return Some(LinearCalibration {
                slope: 1.0,
                offset: mean_y - mean_x,
            });
        }

        let slope = sxy / sxx;
        Some(LinearCalibration {
            slope,
            offset: mean_y - slope * mean_x,
        })
    }
}
