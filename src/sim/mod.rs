//! Deterministic mission simulation
//!
//! All gameplay logic lives here. This module must stay pure:
//! - One tick per frame, no wall-clock time
//! - Input folded in arrival order at the start of each tick
//! - No rendering, audio or platform dependencies

pub mod input;
pub mod mission;
pub mod state;
pub mod tick;

pub use input::{
    InputGains, InputNormalizer, InputSource, Modality, RawInput, TickInput, TiltOrigin,
    TiltWrite, control_sign, pointer_tilt,
};
pub use mission::{MissionController, TransitionError};
pub use state::{FailureReason, MissionPhase, MissionState, SimEvent, Tilt};
pub use tick::tick;
