//! Presentation bridge
//!
//! HUD text does not need to change every frame. The bridge samples the
//! mission state at a wall-clock interval and hands the host a flat,
//! display-ready snapshot.

use std::fmt;

use serde::Serialize;

use crate::consts::*;
use crate::rad_per_frame_to_rpm;
use crate::sim::{FailureReason, MissionPhase, MissionState};

/// Match percentage above which the HUD shows "SYNC"
const SYNC_DISPLAY_PERCENT: f32 = 92.0;
/// Tilt magnitude at which the alignment meter bottoms out
const ALIGNMENT_FULL_SCALE: f32 = TILT_MATCH_THRESHOLD * 2.5;
/// Fraction of the drift radius that raises a warning
const DRIFT_WARNING_FRACTION: f32 = 0.7;

/// Range readout
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum DisplayDistance {
    Meters(f32),
    /// Docked and holding, no range to show
    Stable,
}

impl fmt::Display for DisplayDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayDistance::Meters(m) => write!(f, "{m:.0} m"),
            DisplayDistance::Stable => write!(f, "STABLE"),
        }
    }
}

/// Display-ready view of one mission state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HudSnapshot {
    pub phase: MissionPhase,
    /// Spin being steered (RPM)
    pub current_rpm: f32,
    /// Spin to match (RPM)
    pub target_rpm: f32,
    pub distance: DisplayDistance,
    /// Pitch component (beta)
    pub tilt_x: f32,
    /// Roll component (gamma)
    pub tilt_y: f32,
    pub failure_reason: FailureReason,
    /// 0-100
    pub spin_match_percent: f32,
    /// 0-100
    pub alignment_percent: f32,
    pub is_sync: bool,
    pub is_aligned: bool,
    pub drift_warning: bool,
    pub is_finished: bool,
    pub outcome: Option<&'static str>,
}

impl HudSnapshot {
    pub fn from_state(state: &MissionState) -> Self {
        let (current, target) = match state.phase {
            MissionPhase::Stabilizing => (state.station_spin, STABILIZATION_TARGET_SPIN),
            _ => (state.ship_spin, state.station_spin),
        };
        let distance = match state.phase {
            MissionPhase::Stabilizing => DisplayDistance::Stable,
            _ => DisplayDistance::Meters(state.distance / 10.0),
        };
        let spin_match_percent = match_percent(current, target);

        Self {
            phase: state.phase,
            current_rpm: rad_per_frame_to_rpm(current),
            target_rpm: rad_per_frame_to_rpm(target),
            distance,
            tilt_x: state.tilt.beta,
            tilt_y: state.tilt.gamma,
            failure_reason: state.failure_reason,
            spin_match_percent,
            alignment_percent: alignment_percent(state.tilt.magnitude()),
            is_sync: spin_match_percent > SYNC_DISPLAY_PERCENT,
            is_aligned: state.tilt.is_aligned(),
            drift_warning: state.drift_radius() > MAX_DRIFT_RADIUS * DRIFT_WARNING_FRACTION,
            is_finished: state.is_finished(),
            outcome: outcome_message(state),
        }
    }
}

/// Closeness of two spins as a 0-100 meter
pub fn match_percent(current: f32, target: f32) -> f32 {
    let scale = target.abs().max(0.1);
    (100.0 - (current - target).abs() / scale * 100.0).max(0.0)
}

/// Levelness as a 0-100 meter
pub fn alignment_percent(tilt_magnitude: f32) -> f32 {
    (100.0 - tilt_magnitude / ALIGNMENT_FULL_SCALE * 100.0).max(0.0)
}

fn outcome_message(state: &MissionState) -> Option<&'static str> {
    match (state.phase, state.failure_reason) {
        (MissionPhase::Success, _) => Some("Docking complete. Station rotation stabilized."),
        (MissionPhase::Failed, FailureReason::Boundary) => {
            Some("Drifted out of the approach corridor.")
        }
        (MissionPhase::Failed, _) => Some("Collision with the docking port."),
        _ => None,
    }
}

/// Throttled snapshot producer
#[derive(Debug, Clone)]
pub struct PresentationBridge {
    interval_ms: f64,
    last_sample: Option<f64>,
    latest: Option<HudSnapshot>,
}

impl Default for PresentationBridge {
    fn default() -> Self {
        Self::new(HUD_INTERVAL_MS)
    }
}

impl PresentationBridge {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(0.0),
            last_sample: None,
            latest: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Most recent snapshot, if any was taken
    pub fn latest(&self) -> Option<&HudSnapshot> {
        self.latest.as_ref()
    }

    /// Take a new snapshot if the interval has elapsed.
    ///
    /// Returns `None` while throttled; the host keeps showing `latest`.
    pub fn sample(&mut self, state: &MissionState, now_ms: f64) -> Option<&HudSnapshot> {
        let due = match self.last_sample {
            None => true,
            // A clock that jumps backwards resamples immediately
            Some(last) => now_ms - last >= self.interval_ms || now_ms < last,
        };
        if !due {
            return None;
        }
        self.last_sample = Some(now_ms);
        self.latest = Some(HudSnapshot::from_state(state));
        self.latest.as_ref()
    }

    /// Snapshot now regardless of the interval (phase changes)
    pub fn force(&mut self, state: &MissionState, now_ms: f64) -> &HudSnapshot {
        self.last_sample = Some(now_ms);
        self.latest.insert(HudSnapshot::from_state(state))
    }

    pub fn reset(&mut self) {
        self.last_sample = None;
        self.latest = None;
    }
}
