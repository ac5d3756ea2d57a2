//! Scripted pilot
//!
//! Flies a mission through the same input path a player uses: wheel notches
//! for spin and a slightly shaky orientation sensor for tilt. Seeded, so a
//! given seed always flies the same mission. Used by the headless runner and
//! by end-to-end tests.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::Serialize;

use crate::audio::{AudioSink, SilentAudio};
use crate::consts::{FIXED_STEP_MS, STABILIZATION_TARGET_SPIN};
use crate::session::Session;
use crate::settings::Settings;
use crate::sim::{FailureReason, InputSource, MissionPhase, MissionState, RawInput};

/// Hand-steadiness of the scripted pilot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PilotProfile {
    /// Fraction of the spin error corrected per frame (0-1)
    pub response: f32,
    /// Peak sensor noise per tilt axis (degrees)
    pub jitter: f32,
}

impl Default for PilotProfile {
    fn default() -> Self {
        Self {
            response: 0.2,
            jitter: 0.1,
        }
    }
}

pub struct Pilot {
    rng: Pcg32,
    profile: PilotProfile,
    wheel_gain: f32,
}

impl Pilot {
    pub fn new(seed: u64, profile: PilotProfile, wheel_gain: f32) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            profile,
            wheel_gain,
        }
    }

    /// Wheel movement that closes part of the spin error, if any is needed
    fn steer(&self, state: &MissionState) -> Option<RawInput> {
        if self.wheel_gain == 0.0 {
            return None;
        }
        // Spin that the phase's control law adds per unit of wheel
        let (error, sign) = match state.phase {
            MissionPhase::Playing => (state.station_spin - state.ship_spin, 1.0),
            MissionPhase::Stabilizing => (STABILIZATION_TARGET_SPIN - state.station_spin, -1.0),
            _ => return None,
        };
        if error == 0.0 {
            return None;
        }
        let delta_y = error * self.profile.response / (self.wheel_gain * sign);
        Some(RawInput::Wheel { delta_y })
    }

    /// Noisy sensor reading around level
    fn sense_tilt(&mut self) -> (f32, f32) {
        let j = self.profile.jitter;
        if j <= 0.0 {
            return (0.0, 0.0);
        }
        (
            self.rng.random_range(-j..=j),
            self.rng.random_range(-j..=j),
        )
    }

    /// Push this frame's control input into the session
    pub fn fly<A: AudioSink>(&mut self, session: &mut Session<A>) {
        let state = session.state();
        if !state.phase.is_simulating() {
            return;
        }
        if let Some(raw) = self.steer(state) {
            session.input(raw);
        }
        let (beta, gamma) = self.sense_tilt();
        session.set_tilt(beta, gamma);
    }
}

/// Result of a scripted flight
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Flight {
    pub phase: MissionPhase,
    pub failure_reason: FailureReason,
    /// Simulation ticks flown
    pub ticks: u64,
}

impl Flight {
    pub fn succeeded(&self) -> bool {
        self.phase == MissionPhase::Success
    }
}

/// Fly one complete mission headless, giving up after `max_frames` callbacks
pub fn fly_mission(seed: u64, profile: PilotProfile, settings: &Settings, max_frames: u32) -> Flight {
    let mut session = Session::new(settings, vec![InputSource::pointer()], SilentAudio::default());
    let mut pilot = Pilot::new(seed, profile, settings.gains.wheel);
    if let Err(e) = session.launch() {
        log::warn!("{e}");
    }

    let mut now = 0.0;
    for _ in 0..max_frames {
        if session.state().is_finished() {
            break;
        }
        pilot.fly(&mut session);
        now += FIXED_STEP_MS;
        session.frame(now);
    }
    session.teardown();

    let state = session.state();
    Flight {
        phase: state.phase,
        failure_reason: state.failure_reason,
        ticks: state.time_ticks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    #[test]
    fn test_default_pilot_docks() {
        for seed in 0..4 {
            let flight = fly_mission(seed, PilotProfile::default(), &Settings::default(), 10_000);
            assert!(flight.succeeded(), "seed {seed}: {flight:?}");
            assert_eq!(flight.failure_reason, FailureReason::None);
        }
    }

    #[test]
    fn test_same_seed_same_flight() {
        let a = fly_mission(7, PilotProfile::default(), &Settings::default(), 10_000);
        let b = fly_mission(7, PilotProfile::default(), &Settings::default(), 10_000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_shaky_pilot_collides() {
        // Tilt noise well past the alignment threshold but inside the corridor
        let profile = PilotProfile {
            response: 0.2,
            jitter: 20.0,
        };
        let flight = fly_mission(3, profile, &Settings::default(), 10_000);
        assert_eq!(flight.phase, MissionPhase::Failed);
    }

    #[test]
    fn test_pilot_without_controls_collides() {
        let mut settings = Settings::default();
        settings.gains.wheel = 0.0;
        let flight = fly_mission(1, PilotProfile::default(), &settings, 10_000);
        assert_eq!(flight.phase, MissionPhase::Failed);
        assert_eq!(flight.failure_reason, FailureReason::Collision);
        assert_eq!(
            flight.ticks,
            (INITIAL_DISTANCE - DOCKING_THRESHOLD_DISTANCE) as u64
        );
    }

    #[test]
    fn test_steer_inverts_when_stabilizing() {
        let pilot = Pilot::new(0, PilotProfile::default(), WHEEL_GAIN);
        let mut state = MissionState::launched();
        let Some(RawInput::Wheel { delta_y: approach }) = pilot.steer(&state) else {
            panic!("expected wheel input");
        };
        state.phase = MissionPhase::Stabilizing;
        // Both errors ask for more spin on the controlled body
        state.station_spin = STABILIZATION_TARGET_SPIN - 0.01;
        let Some(RawInput::Wheel { delta_y: stabilize }) = pilot.steer(&state) else {
            panic!("expected wheel input");
        };
        assert!(approach.signum() != stabilize.signum());

        state.phase = MissionPhase::Docking;
        assert_eq!(pilot.steer(&state), None);
    }
}
