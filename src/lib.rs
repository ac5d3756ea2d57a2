//! Orbital Dock - spin-matching docking simulation
//!
//! Core modules:
//! - `sim`: Deterministic per-frame simulation (mission state, input, phases)
//! - `clock`: Tick scheduling independent of how frames are sourced
//! - `session`: Wires simulation, input, audio and HUD sampling together
//! - `bridge`: Throttled read-only HUD snapshots
//! - `audio`: Audio collaborator interface (Web Audio on wasm)
//! - `tracking`: Hand-gesture to rotation-delta conversion
//! - `platform`: Device class detection and input source selection
//! - `settings`: User preferences and input gains
//! - `pilot`: Seeded scripted pilot for headless runs and end-to-end tests

pub mod audio;
pub mod bridge;
pub mod clock;
pub mod pilot;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;
pub mod tracking;

pub use bridge::{HudSnapshot, PresentationBridge};
pub use session::Session;
pub use settings::Settings;

use std::f32::consts::{PI, TAU};

/// Mission tuning constants
///
/// Spins are radians advanced per simulation tick; one tick per display refresh
/// (nominally 60 Hz).
pub mod consts {
    use super::rpm_to_rad_per_frame;

    /// Nominal refresh rate the per-frame constants are tuned for
    pub const NOMINAL_HZ: f32 = 60.0;
    /// Fixed step used by `FramePacing::Fixed60` (milliseconds)
    pub const FIXED_STEP_MS: f64 = 1000.0 / 60.0;
    /// Maximum substeps per callback to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    pub const INITIAL_STATION_RPM: f32 = 120.0;
    pub const INITIAL_SHIP_RPM: f32 = 22.0;
    pub const STABILIZATION_TARGET_RPM: f32 = 22.0;

    /// Station spin at launch (rad/frame)
    pub const TARGET_STATION_SPIN: f32 = rpm_to_rad_per_frame(INITIAL_STATION_RPM);
    /// Ship spin at launch (rad/frame)
    pub const INITIAL_SHIP_SPIN: f32 = rpm_to_rad_per_frame(INITIAL_SHIP_RPM);
    /// Station spin the player must hold during stabilization (rad/frame)
    pub const STABILIZATION_TARGET_SPIN: f32 = rpm_to_rad_per_frame(STABILIZATION_TARGET_RPM);

    /// Starting range (display metres are distance / 10)
    pub const INITIAL_DISTANCE: f32 = 3000.0;
    /// Range closed per frame during approach
    pub const APPROACH_SPEED: f32 = 1.0;
    /// Range closed per frame while the latches engage
    pub const DOCKING_CLOSE_SPEED: f32 = 0.5;
    pub const DOCKING_THRESHOLD_DISTANCE: f32 = 50.0;
    /// Proximity alerts start inside this range
    pub const PROXIMITY_RANGE: f32 = 800.0;

    pub const SPIN_MATCH_EPSILON: f32 = 0.004;
    /// Tilt magnitude (degrees) under which the ship counts as aligned
    pub const TILT_MATCH_THRESHOLD: f32 = 0.3;
    pub const TILT_DRIFT_MULTIPLIER: f32 = 6.0;
    pub const MAX_DRIFT_RADIUS: f32 = 250.0;

    /// Multiplicative station spin damping per docking frame
    pub const STABILIZATION_DECEL: f32 = 0.995;
    pub const STABILIZATION_EPSILON: f32 = 0.005;
    /// Consecutive in-band frames required before stabilization succeeds
    pub const STABILIZATION_HOLD_FRAMES: u32 = 120;

    /// Spin gain per pixel of pointer drag
    pub const DRAG_GAIN: f32 = 0.002;
    /// Spin gain per wheel delta unit (negative: scrolling up spins up)
    pub const WHEEL_GAIN: f32 = -0.0002;
    /// Spin gain per pixel of touch swipe
    pub const TOUCH_GAIN: f32 = 0.001;
    /// Tilt (degrees) written when the pointer sits on the viewport edge
    pub const POINTER_TILT_RANGE: f32 = 60.0;
    /// Hand-circle angle to spin conversion
    pub const CIRCULAR_GESTURE_SENSITIVITY: f32 = 0.0025;

    /// HUD sampling interval (milliseconds)
    pub const HUD_INTERVAL_MS: f64 = 50.0;
}

/// Convert revolutions per minute to radians per frame at the nominal rate
#[inline]
pub const fn rpm_to_rad_per_frame(rpm: f32) -> f32 {
    rpm * 2.0 * PI / (60.0 * consts::NOMINAL_HZ)
}

/// Convert radians per frame at the nominal rate to revolutions per minute
#[inline]
pub fn rad_per_frame_to_rpm(spin: f32) -> f32 {
    spin * 60.0 * consts::NOMINAL_HZ / TAU
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    while angle >= PI {
        angle -= TAU;
    }
    while angle < -PI {
        angle += TAU;
    }
    angle
}
