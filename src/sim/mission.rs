//! Mission phase owner
//!
//! The engine moves itself into `Failed` and `Success`. Every other phase
//! change goes through the controller, which answers the engine's
//! `DockingInitiated` / `DockingStalled` notifications and handles launch and
//! retry.

use thiserror::Error;

use super::input::TickInput;
use super::state::{MissionPhase, MissionState, SimEvent};
use super::tick::tick;

/// Rejected phase change request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("illegal phase transition {from} -> {to}")]
    Illegal {
        from: &'static str,
        to: &'static str,
    },
    #[error("mission is already running ({0})")]
    AlreadyRunning(&'static str),
}

/// Owns the mission state and applies phase reassignments
#[derive(Debug, Clone, Default)]
pub struct MissionController {
    state: MissionState,
    /// Completed attempts (terminal outcomes reached)
    attempts: u32,
}

impl MissionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &MissionState {
        &self.state
    }

    pub fn phase(&self) -> MissionPhase {
        self.state.phase
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Start → Playing
    pub fn launch(&mut self) -> Result<(), TransitionError> {
        if self.state.phase != MissionPhase::Start {
            return Err(TransitionError::AlreadyRunning(self.state.phase.as_str()));
        }
        self.state = MissionState::launched();
        log::info!("Mission launched");
        Ok(())
    }

    /// Discard the current attempt and start a fresh one in `Playing`.
    ///
    /// From a terminal phase this is the retry path; mid-mission it abandons
    /// the attempt.
    pub fn reset(&mut self) {
        if self.state.phase.is_terminal() {
            log::info!("Retrying after {}", self.state.phase.as_str());
        } else {
            log::info!("Abandoning attempt in {}", self.state.phase.as_str());
        }
        self.state = MissionState::launched();
    }

    /// Docking sequence reported unsuccessful: fall back to stabilization
    pub fn report_docking_failed(&mut self) -> Result<(), TransitionError> {
        self.transition(MissionPhase::Stabilizing)
    }

    /// Advance one frame and answer the engine's notifications.
    ///
    /// Events are appended to `events` in the order they were raised.
    pub fn advance(&mut self, input: &TickInput, events: &mut Vec<SimEvent>) {
        let start = events.len();
        tick(&mut self.state, input, events);

        for i in start..events.len() {
            let result = match events[i] {
                SimEvent::DockingInitiated => self.transition(MissionPhase::Docking),
                SimEvent::DockingStalled => self.report_docking_failed(),
                SimEvent::Finished { success } => {
                    self.attempts += 1;
                    log::info!(
                        "Mission finished: {} ({})",
                        if success { "success" } else { "failure" },
                        self.state.failure_reason.as_str()
                    );
                    Ok(())
                }
                _ => Ok(()),
            };
            if let Err(err) = result {
                log::warn!("Ignoring engine notification: {err}");
            }
        }
    }

    /// Validated phase reassignment
    fn transition(&mut self, next: MissionPhase) -> Result<(), TransitionError> {
        let current = self.state.phase;
        if !current.can_transition_to(next) || next.is_terminal() || next == MissionPhase::Playing
        {
            return Err(TransitionError::Illegal {
                from: current.as_str(),
                to: next.as_str(),
            });
        }
        log::info!("Phase {} -> {}", current.as_str(), next.as_str());
        self.state.phase = next;
        Ok(())
    }
}
