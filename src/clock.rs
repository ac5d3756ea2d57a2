//! Tick scheduling
//!
//! The host calls `FrameClock::ticks_for` from its refresh callback with a
//! millisecond timestamp; the clock answers how many simulation ticks to run.
//! Tests drive ticks directly and never need a clock.

use serde::{Deserialize, Serialize};

use crate::consts::{FIXED_STEP_MS, MAX_SUBSTEPS};

/// How refresh callbacks map to simulation ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FramePacing {
    /// One tick per callback. Game speed follows the display refresh rate.
    #[default]
    PerRefresh,
    /// Fixed 60 Hz ticks from an accumulator, independent of refresh rate
    Fixed60,
}

impl FramePacing {
    pub fn as_str(&self) -> &'static str {
        match self {
            FramePacing::PerRefresh => "per-refresh",
            FramePacing::Fixed60 => "fixed-60",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "per-refresh" | "refresh" => Some(FramePacing::PerRefresh),
            "fixed-60" | "fixed" | "60" => Some(FramePacing::Fixed60),
            _ => None,
        }
    }
}

/// Converts refresh callbacks into tick counts
#[derive(Debug, Clone)]
pub struct FrameClock {
    pacing: FramePacing,
    accumulator: f64,
    last_time: Option<f64>,
    /// Total ticks handed out
    ticks: u64,
}

impl FrameClock {
    pub fn new(pacing: FramePacing) -> Self {
        Self {
            pacing,
            accumulator: 0.0,
            last_time: None,
            ticks: 0,
        }
    }

    pub fn pacing(&self) -> FramePacing {
        self.pacing
    }

    pub fn total_ticks(&self) -> u64 {
        self.ticks
    }

    /// Number of ticks to run for a callback at `now_ms`
    pub fn ticks_for(&mut self, now_ms: f64) -> u32 {
        let n = match self.pacing {
            FramePacing::PerRefresh => 1,
            FramePacing::Fixed60 => {
                // First callback runs a single step; later ones follow elapsed time
                let dt = match self.last_time {
                    Some(last) => (now_ms - last).clamp(0.0, 100.0),
                    None => FIXED_STEP_MS,
                };
                self.accumulator += dt;

                let mut substeps = 0;
                while self.accumulator >= FIXED_STEP_MS && substeps < MAX_SUBSTEPS {
                    self.accumulator -= FIXED_STEP_MS;
                    substeps += 1;
                }
                // Drop backlog we could not run
                if substeps == MAX_SUBSTEPS {
                    self.accumulator = self.accumulator.min(FIXED_STEP_MS);
                }
                substeps
            }
        };
        self.last_time = Some(now_ms);
        self.ticks += n as u64;
        n
    }

    /// Forget timing history (new attempt)
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_time = None;
        self.ticks = 0;
    }
}
