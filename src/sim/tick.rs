//! Per-frame simulation tick
//!
//! One call advances the mission by exactly one frame. Spins are per-frame
//! quantities, so no delta time is involved.

use super::input::{TickInput, TiltOrigin, control_sign};
use super::state::{FailureReason, MissionPhase, MissionState, SimEvent};
use crate::consts::*;

/// Advance the mission by one frame, appending notifications to `events`
pub fn tick(state: &mut MissionState, input: &TickInput, events: &mut Vec<SimEvent>) {
    // Terminal and idle phases freeze the physics
    if !state.phase.is_simulating() {
        return;
    }

    apply_input(state, input);

    state.time_ticks += 1;
    state.active_thrust = state.active_thrust * 0.9 + input.thrust_demand.min(1.0) * 0.1;

    match state.phase {
        MissionPhase::Playing => tick_approach(state, events),
        MissionPhase::Docking => tick_docking(state, events),
        MissionPhase::Stabilizing => tick_stabilizing(state, events),
        MissionPhase::Start | MissionPhase::Success | MissionPhase::Failed => {}
    }
}

/// Fold one frame's input into the controlled spin and tilt
fn apply_input(state: &mut MissionState, input: &TickInput) {
    let adjustment = input.spin_delta * control_sign(state.phase);
    match state.phase {
        MissionPhase::Playing => state.ship_spin += adjustment,
        MissionPhase::Stabilizing => state.station_spin += adjustment,
        _ => {}
    }

    if let Some(write) = input.tilt {
        let accepted = match write.origin {
            TiltOrigin::Sensor => true,
            TiltOrigin::Pointer => state.phase == MissionPhase::Playing,
        };
        if accepted {
            state.tilt = write.tilt;
        }
    }
}

fn tick_approach(state: &mut MissionState, events: &mut Vec<SimEvent>) {
    state.station_rotation += state.station_spin;
    state.ship_rotation += state.ship_spin;
    state.distance = (state.distance - APPROACH_SPEED).max(0.0);

    state.proximity_timer = state.proximity_timer.saturating_add(1);
    if state.distance < PROXIMITY_RANGE {
        let intensity = 1.0 - state.distance / PROXIMITY_RANGE;
        let interval = 60.0 - 54.0 * intensity;
        if state.proximity_timer as f32 > interval {
            events.push(SimEvent::ProximityAlert { intensity });
            state.proximity_timer = 0;
        }
    }

    // Boundary is fail-fast: checked before any matching
    if state.drift_radius() > MAX_DRIFT_RADIUS {
        log::info!("Drift {:.1} beyond corridor, mission failed", state.drift_radius());
        state.fail(FailureReason::Boundary);
        events.push(SimEvent::Finished { success: false });
        return;
    }

    let spin_match = state.is_spin_matched();
    let tilt_match = state.tilt.is_aligned();

    if spin_match && !state.was_sync {
        events.push(SimEvent::SyncAchieved);
    }
    state.was_sync = spin_match;
    if tilt_match && !state.was_aligned {
        events.push(SimEvent::AlignmentAchieved);
    }
    state.was_aligned = tilt_match;

    // Once docking is signaled the phase owner owns the next move
    if state.docking_signaled {
        return;
    }

    if state.distance <= DOCKING_THRESHOLD_DISTANCE {
        if spin_match && tilt_match {
            state.docking_signaled = true;
            events.push(SimEvent::DockingInitiated);
        } else {
            log::info!(
                "Contact without sync (spin diff {:.4}, tilt {:.2}), mission failed",
                state.spin_difference(),
                state.tilt.magnitude()
            );
            state.fail(FailureReason::Collision);
            events.push(SimEvent::Finished { success: false });
        }
    }
}

fn tick_docking(state: &mut MissionState, events: &mut Vec<SimEvent>) {
    // Zero range already reported and still docking: no handoff came
    if state.handoff_requested {
        log::warn!("Docking stalled without handoff, mission failed");
        state.fail(FailureReason::Collision);
        events.push(SimEvent::Finished { success: false });
        return;
    }

    state.station_spin *= STABILIZATION_DECEL;
    slave_ship_to_station(state);
    state.distance = (state.distance - DOCKING_CLOSE_SPEED).max(0.0);

    if state.distance <= 0.0 {
        state.handoff_requested = true;
        events.push(SimEvent::DockingStalled);
    }
}

fn tick_stabilizing(state: &mut MissionState, events: &mut Vec<SimEvent>) {
    slave_ship_to_station(state);
    state.distance = 0.0;

    if (state.station_spin - STABILIZATION_TARGET_SPIN).abs() < STABILIZATION_EPSILON {
        state.sync_timer += 1;
        if state.sync_timer > STABILIZATION_HOLD_FRAMES {
            log::info!("Station stabilized after {} frames", state.time_ticks);
            state.phase = MissionPhase::Success;
            events.push(SimEvent::Finished { success: true });
        }
    } else {
        state.sync_timer = 0;
    }
}

/// Docked: the ship turns with the station
fn slave_ship_to_station(state: &mut MissionState) {
    state.ship_spin = state.station_spin;
    state.station_rotation += state.station_spin;
    state.ship_rotation = state.station_rotation;
}
