//! Mission state and core simulation types
//!
//! One `MissionState` exists per attempt. A retry builds a fresh one; nothing
//! carries over between attempts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Current phase of the mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MissionPhase {
    /// Idle, no simulation
    #[default]
    Start,
    /// Approach: range closes, drift accrues, spin and tilt must converge
    Playing,
    /// Latches engaging: station spin damps while range closes slowly
    Docking,
    /// Docked: drive station spin to the stabilization target
    Stabilizing,
    /// Station stabilized (terminal)
    Success,
    /// Boundary or collision failure (terminal)
    Failed,
}

impl MissionPhase {
    /// Terminal phases stop the physics
    pub fn is_terminal(self) -> bool {
        matches!(self, MissionPhase::Success | MissionPhase::Failed)
    }

    /// Phases in which the engine integrates physics
    pub fn is_simulating(self) -> bool {
        matches!(
            self,
            MissionPhase::Playing | MissionPhase::Docking | MissionPhase::Stabilizing
        )
    }

    /// Whether `next` is a legal successor of this phase.
    ///
    /// Terminal → Playing is only legal through a full reset.
    pub fn can_transition_to(self, next: MissionPhase) -> bool {
        use MissionPhase::*;
        matches!(
            (self, next),
            (Start, Playing)
                | (Playing, Docking)
                | (Playing, Failed)
                | (Docking, Stabilizing)
                | (Docking, Failed)
                | (Stabilizing, Success)
                | (Success, Playing)
                | (Failed, Playing)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MissionPhase::Start => "Start",
            MissionPhase::Playing => "Playing",
            MissionPhase::Docking => "Docking",
            MissionPhase::Stabilizing => "Stabilizing",
            MissionPhase::Success => "Success",
            MissionPhase::Failed => "Failed",
        }
    }
}

/// Why a mission failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FailureReason {
    #[default]
    None,
    /// Drift left the safe approach corridor
    Boundary,
    /// Reached docking range without synchronization
    Collision,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::None => "",
            FailureReason::Boundary => "Boundary",
            FailureReason::Collision => "Collision",
        }
    }
}

/// Two-axis orientation (degrees): beta tilts around x, gamma around y
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Tilt {
    pub beta: f32,
    pub gamma: f32,
}

impl Tilt {
    pub const LEVEL: Tilt = Tilt { beta: 0.0, gamma: 0.0 };

    pub fn new(beta: f32, gamma: f32) -> Self {
        Self { beta, gamma }
    }

    /// Tilt severity used for the alignment check
    #[inline]
    pub fn magnitude(&self) -> f32 {
        (self.beta * self.beta + self.gamma * self.gamma).sqrt()
    }

    /// Reticle displacement caused by this tilt (gamma drives x, beta drives y)
    #[inline]
    pub fn drift(&self) -> Vec2 {
        Vec2::new(self.gamma, self.beta) * TILT_DRIFT_MULTIPLIER
    }

    #[inline]
    pub fn is_aligned(&self) -> bool {
        self.magnitude() < TILT_MATCH_THRESHOLD
    }
}

/// Notifications emitted by the engine during a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimEvent {
    /// Ship spin entered the match band (rising edge)
    SyncAchieved,
    /// Tilt entered the alignment band (rising edge)
    AlignmentAchieved,
    /// Periodic beep while closing in; intensity in (0, 1]
    ProximityAlert { intensity: f32 },
    /// Matched approach reached docking range; the phase owner should hand off
    DockingInitiated,
    /// Docking range reached zero without a latch; the phase owner decides
    DockingStalled,
    /// Terminal outcome
    Finished { success: bool },
}

/// Complete mission state for one attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionState {
    /// Accumulated station rotation (radians, unbounded)
    pub station_rotation: f32,
    /// Station angular velocity (rad/frame)
    pub station_spin: f32,
    /// Accumulated ship rotation (radians, unbounded)
    pub ship_rotation: f32,
    /// Ship angular velocity (rad/frame)
    pub ship_spin: f32,
    /// Range to the docking port, never negative
    pub distance: f32,
    pub tilt: Tilt,
    /// Consecutive in-band stabilization frames
    pub sync_timer: u32,
    /// Frames since the last proximity alert. Starts saturated so the first
    /// frame in range alerts at once.
    pub proximity_timer: u32,
    /// Smoothed thruster intensity (0-1), visual only
    pub active_thrust: f32,
    pub phase: MissionPhase,
    pub failure_reason: FailureReason,
    /// Previous-frame spin match, for edge detection
    pub was_sync: bool,
    /// Previous-frame alignment, for edge detection
    pub was_aligned: bool,
    /// `DockingInitiated` already emitted this attempt
    pub docking_signaled: bool,
    /// `DockingStalled` already emitted this attempt
    pub handoff_requested: bool,
    /// Frames advanced this attempt
    pub time_ticks: u64,
}

impl Default for MissionState {
    fn default() -> Self {
        Self::new()
    }
}

impl MissionState {
    /// Fresh state, idle in `Start`
    pub fn new() -> Self {
        Self {
            station_rotation: 0.0,
            station_spin: TARGET_STATION_SPIN,
            ship_rotation: 0.0,
            ship_spin: INITIAL_SHIP_SPIN,
            distance: INITIAL_DISTANCE,
            tilt: Tilt::LEVEL,
            sync_timer: 0,
            proximity_timer: u32::MAX,
            active_thrust: 0.0,
            phase: MissionPhase::Start,
            failure_reason: FailureReason::None,
            was_sync: false,
            was_aligned: false,
            docking_signaled: false,
            handoff_requested: false,
            time_ticks: 0,
        }
    }

    /// Fresh state already in `Playing` (launch or retry)
    pub fn launched() -> Self {
        Self {
            phase: MissionPhase::Playing,
            ..Self::new()
        }
    }

    /// Reticle drift distance derived from tilt
    #[inline]
    pub fn drift_radius(&self) -> f32 {
        self.tilt.drift().length()
    }

    #[inline]
    pub fn spin_difference(&self) -> f32 {
        (self.ship_spin - self.station_spin).abs()
    }

    #[inline]
    pub fn is_spin_matched(&self) -> bool {
        self.spin_difference() < SPIN_MATCH_EPSILON
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.phase.is_terminal()
    }

    /// The spin the player is currently steering
    pub fn controlled_spin(&self) -> f32 {
        match self.phase {
            MissionPhase::Stabilizing => self.station_spin,
            _ => self.ship_spin,
        }
    }

    /// Station zoom factor as the range closes (render helper)
    pub fn approach_scale(&self) -> f32 {
        ((INITIAL_DISTANCE - self.distance) / INITIAL_DISTANCE * 2.5 + 0.4).max(0.1)
    }

    /// Enter a terminal failure
    pub(crate) fn fail(&mut self, reason: FailureReason) {
        self.phase = MissionPhase::Failed;
        self.failure_reason = reason;
    }
}
