//! Circular-gesture tracking
//!
//! Turns hand landmarks into rotation deltas. The fingertip's angle around
//! the wrist is compared frame to frame; a full circle of the finger is a
//! full turn of control input.

use glam::Vec2;

use crate::consts::CIRCULAR_GESTURE_SENSITIVITY;
use crate::normalize_angle;

/// Scale from wrapped angle change (radians) to rotation delta
const GESTURE_SCALE: f32 = CIRCULAR_GESTURE_SENSITIVITY * 10.0;

/// Landmarks the gesture needs from one camera frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    pub wrist: Vec2,
    pub index_tip: Vec2,
}

impl HandLandmarks {
    pub fn new(wrist: Vec2, index_tip: Vec2) -> Self {
        Self { wrist, index_tip }
    }

    /// Fingertip angle around the wrist, `None` if they coincide
    fn angle(&self) -> Option<f32> {
        let offset = self.index_tip - self.wrist;
        if offset.length_squared() <= f32::EPSILON {
            return None;
        }
        Some(offset.y.atan2(offset.x))
    }
}

/// Stateful landmark-to-delta converter
#[derive(Debug, Clone, Default)]
pub struct RotationTracker {
    last_angle: Option<f32>,
}

impl RotationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delta for this camera frame.
    ///
    /// `None` (no hand) resets continuity and yields 0, which downstream
    /// reads as "tracking lost". The first frame after a loss also yields 0.
    pub fn update(&mut self, hand: Option<HandLandmarks>) -> f32 {
        let Some(angle) = hand.and_then(|h| h.angle()) else {
            if self.last_angle.take().is_some() {
                log::debug!("Hand lost, gesture continuity reset");
            }
            return 0.0;
        };
        let delta = match self.last_angle {
            Some(last) => normalize_angle(angle - last) * GESTURE_SCALE,
            None => 0.0,
        };
        self.last_angle = Some(angle);
        delta
    }

    pub fn is_tracking(&self) -> bool {
        self.last_angle.is_some()
    }

    pub fn reset(&mut self) {
        self.last_angle = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn hand_at(angle: f32) -> Option<HandLandmarks> {
        let wrist = Vec2::new(0.5, 0.5);
        Some(HandLandmarks::new(
            wrist,
            wrist + Vec2::new(angle.cos(), angle.sin()) * 0.2,
        ))
    }

    #[test]
    fn test_first_sample_is_zero() {
        let mut tracker = RotationTracker::new();
        assert_eq!(tracker.update(hand_at(1.0)), 0.0);
        assert!(tracker.is_tracking());
    }

    #[test]
    fn test_quarter_turn() {
        let mut tracker = RotationTracker::new();
        tracker.update(hand_at(0.0));
        let delta = tracker.update(hand_at(FRAC_PI_2));
        assert!((delta - FRAC_PI_2 * GESTURE_SCALE).abs() < 1e-4);
        let delta = tracker.update(hand_at(0.0));
        assert!((delta + FRAC_PI_2 * GESTURE_SCALE).abs() < 1e-4);
    }

    #[test]
    fn test_wraps_across_pi() {
        let mut tracker = RotationTracker::new();
        tracker.update(hand_at(PI - 0.1));
        // Crossing the seam is a small positive step, not a near-full turn back
        let delta = tracker.update(hand_at(-PI + 0.1));
        assert!((delta - 0.2 * GESTURE_SCALE).abs() < 1e-3, "got {delta}");
    }

    #[test]
    fn test_loss_resets_continuity() {
        let mut tracker = RotationTracker::new();
        tracker.update(hand_at(0.0));
        assert_eq!(tracker.update(None), 0.0);
        assert!(!tracker.is_tracking());
        // Reacquired far away: no jump
        assert_eq!(tracker.update(hand_at(2.0)), 0.0);
    }

    #[test]
    fn test_degenerate_hand_counts_as_lost() {
        let mut tracker = RotationTracker::new();
        tracker.update(hand_at(0.0));
        let p = Vec2::new(0.3, 0.3);
        assert_eq!(tracker.update(Some(HandLandmarks::new(p, p))), 0.0);
        assert!(!tracker.is_tracking());
    }
}
