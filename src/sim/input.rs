//! Input normalization
//!
//! Every device produces the same two signals: a spin adjustment (added to the
//! controlled spin) and an absolute tilt write. Raw events may arrive at any
//! rate; signals queue up in arrival order and are folded into one `TickInput`
//! per frame.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::{MissionPhase, Tilt};
use crate::consts::*;

/// Physical input modality behind a spin adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modality {
    Drag,
    Wheel,
    Touch,
    Optical,
}

/// Spin gain per raw unit for each modality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputGains {
    pub drag: f32,
    pub wheel: f32,
    pub touch: f32,
    pub optical: f32,
}

impl Default for InputGains {
    fn default() -> Self {
        Self {
            drag: DRAG_GAIN,
            wheel: WHEEL_GAIN,
            touch: TOUCH_GAIN,
            optical: 1.0,
        }
    }
}

impl InputGains {
    pub fn gain(&self, modality: Modality) -> f32 {
        match modality {
            Modality::Drag => self.drag,
            Modality::Wheel => self.wheel,
            Modality::Touch => self.touch,
            Modality::Optical => self.optical,
        }
    }
}

/// Sign of the control law in a phase.
///
/// Stabilizing inverts the controls: an input that spins the ship up during
/// approach spins the station down once docked. Other phases ignore spin input.
#[inline]
pub fn control_sign(phase: MissionPhase) -> f32 {
    match phase {
        MissionPhase::Playing => 1.0,
        MissionPhase::Stabilizing => -1.0,
        _ => 0.0,
    }
}

/// Raw platform events, already reduced to plain numbers
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawInput {
    PointerDown { x: f32, y: f32 },
    PointerMove { x: f32, y: f32 },
    PointerUp,
    Wheel { delta_y: f32 },
    TouchStart { x: f32 },
    TouchMove { x: f32 },
    TouchEnd,
    /// Device orientation sensor (degrees)
    Orientation { beta: f32, gamma: f32 },
    /// Optical tracker output; exactly 0 means tracking lost
    RotationDelta(f32),
    Resize { width: f32, height: f32 },
}

/// Where a tilt write came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiltOrigin {
    /// Derived from pointer position; only steers during approach
    Pointer,
    /// Physical sensor or direct `set_tilt` call
    Sensor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TiltWrite {
    pub tilt: Tilt,
    pub origin: TiltOrigin,
}

/// Normalized signal queued for the next frame
#[derive(Debug, Clone, Copy, PartialEq)]
enum Signal {
    Spin(f32),
    Tilt(TiltWrite),
}

/// Everything the engine needs from input for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickInput {
    /// Sum of spin adjustments since the last frame, before the control law
    pub spin_delta: f32,
    /// Last tilt written since the last frame
    pub tilt: Option<TiltWrite>,
    /// Raw thruster demand (clamped by the engine)
    pub thrust_demand: f32,
}

/// Pointer (mouse) source: drag and wheel adjust spin, position drives tilt
#[derive(Debug, Clone, Default)]
pub struct PointerSource {
    held: bool,
    last_x: f32,
}

/// Touch source: horizontal swipes adjust spin
#[derive(Debug, Clone, Default)]
pub struct TouchSource {
    active: bool,
    last_x: f32,
}

/// Optical tracking source: rotation deltas adjust spin directly
#[derive(Debug, Clone, Default)]
pub struct OpticalSource {
    /// Last delta received; 0 after tracking loss
    level: f32,
}

/// Input capability, selected once at startup
#[derive(Debug, Clone)]
pub enum InputSource {
    Pointer(PointerSource),
    Touch(TouchSource),
    Orientation,
    OpticalTracking(OpticalSource),
}

impl InputSource {
    pub fn pointer() -> Self {
        InputSource::Pointer(PointerSource::default())
    }

    pub fn touch() -> Self {
        InputSource::Touch(TouchSource::default())
    }

    pub fn optical() -> Self {
        InputSource::OpticalTracking(OpticalSource::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            InputSource::Pointer(_) => "pointer",
            InputSource::Touch(_) => "touch",
            InputSource::Orientation => "orientation",
            InputSource::OpticalTracking(_) => "optical",
        }
    }

    /// Translate a raw event into zero or more signals
    fn translate(
        &mut self,
        raw: RawInput,
        viewport: Vec2,
        gains: &InputGains,
        out: &mut VecDeque<Signal>,
    ) {
        match (self, raw) {
            (InputSource::Pointer(p), RawInput::PointerDown { x, .. }) => {
                p.held = true;
                p.last_x = x;
            }
            (InputSource::Pointer(p), RawInput::PointerMove { x, y }) => {
                out.push_back(Signal::Tilt(TiltWrite {
                    tilt: pointer_tilt(x, y, viewport),
                    origin: TiltOrigin::Pointer,
                }));
                if p.held {
                    out.push_back(Signal::Spin((x - p.last_x) * gains.gain(Modality::Drag)));
                    p.last_x = x;
                }
            }
            (InputSource::Pointer(p), RawInput::PointerUp) => p.held = false,
            (InputSource::Pointer(_), RawInput::Wheel { delta_y }) => {
                out.push_back(Signal::Spin(delta_y * gains.gain(Modality::Wheel)));
            }
            (InputSource::Touch(t), RawInput::TouchStart { x }) => {
                t.active = true;
                t.last_x = x;
            }
            (InputSource::Touch(t), RawInput::TouchMove { x }) => {
                if t.active {
                    out.push_back(Signal::Spin((x - t.last_x) * gains.gain(Modality::Touch)));
                }
                t.active = true;
                t.last_x = x;
            }
            (InputSource::Touch(t), RawInput::TouchEnd) => t.active = false,
            (InputSource::Orientation, RawInput::Orientation { beta, gamma }) => {
                out.push_back(Signal::Tilt(TiltWrite {
                    tilt: Tilt::new(beta, gamma),
                    origin: TiltOrigin::Sensor,
                }));
            }
            (InputSource::OpticalTracking(o), RawInput::RotationDelta(delta)) => {
                o.level = delta;
                if delta != 0.0 {
                    out.push_back(Signal::Spin(delta * gains.gain(Modality::Optical)));
                }
            }
            _ => {}
        }
    }

    fn thrust_demand(&self) -> f32 {
        match self {
            InputSource::Pointer(p) if p.held => 0.5,
            InputSource::Touch(t) if t.active => 0.5,
            InputSource::OpticalTracking(o) => o.level.abs() * 50.0,
            _ => 0.0,
        }
    }

    fn reset(&mut self) {
        match self {
            InputSource::Pointer(p) => *p = PointerSource::default(),
            InputSource::Touch(t) => *t = TouchSource::default(),
            InputSource::Orientation => {}
            InputSource::OpticalTracking(o) => *o = OpticalSource::default(),
        }
    }
}

/// Tilt derived from a pointer position: the viewport centre is level and the
/// edges read `POINTER_TILT_RANGE` degrees.
pub fn pointer_tilt(x: f32, y: f32, viewport: Vec2) -> Tilt {
    let size = viewport.max(Vec2::ONE);
    let nx = x / size.x * 2.0 - 1.0;
    let ny = y / size.y * 2.0 - 1.0;
    Tilt::new(ny * POINTER_TILT_RANGE, nx * POINTER_TILT_RANGE)
}

/// Converts raw input from the active sources into per-frame signals
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    sources: Vec<InputSource>,
    gains: InputGains,
    viewport: Vec2,
    queue: VecDeque<Signal>,
}

impl InputNormalizer {
    pub fn new(sources: Vec<InputSource>, gains: InputGains) -> Self {
        Self {
            sources,
            gains,
            viewport: Vec2::ONE,
            queue: VecDeque::new(),
        }
    }

    /// Route a raw event through every source that understands it
    pub fn handle(&mut self, raw: RawInput) {
        if let RawInput::Resize { width, height } = raw {
            self.viewport = Vec2::new(width, height);
            return;
        }
        for source in &mut self.sources {
            source.translate(raw, self.viewport, &self.gains, &mut self.queue);
        }
    }

    /// Queue a spin adjustment (pre-control-law, already scaled)
    pub fn apply_spin_adjustment(&mut self, delta: f32) {
        self.queue.push_back(Signal::Spin(delta));
    }

    /// Queue an absolute tilt write
    pub fn set_tilt(&mut self, beta: f32, gamma: f32) {
        self.queue.push_back(Signal::Tilt(TiltWrite {
            tilt: Tilt::new(beta, gamma),
            origin: TiltOrigin::Sensor,
        }));
    }

    /// Signals waiting for the next frame
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Fold every queued signal, in arrival order, into one frame's input
    pub fn drain(&mut self) -> TickInput {
        let mut input = TickInput::default();
        for signal in self.queue.drain(..) {
            match signal {
                Signal::Spin(delta) => input.spin_delta += delta,
                Signal::Tilt(write) => input.tilt = Some(write),
            }
        }
        input.thrust_demand = self.sources.iter().map(InputSource::thrust_demand).sum();
        input
    }

    /// Drop pending signals and per-source continuity (new attempt)
    pub fn reset(&mut self) {
        self.queue.clear();
        for source in &mut self.sources {
            source.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn desktop() -> InputNormalizer {
        let mut input = InputNormalizer::new(
            vec![InputSource::pointer(), InputSource::optical()],
            InputGains::default(),
        );
        input.handle(RawInput::Resize { width: 800.0, height: 600.0 });
        input
    }

    fn mobile() -> InputNormalizer {
        InputNormalizer::new(
            vec![InputSource::touch(), InputSource::Orientation],
            InputGains::default(),
        )
    }

    #[test]
    fn test_drag_only_counts_while_held() {
        let mut input = desktop();
        input.handle(RawInput::PointerMove { x: 400.0, y: 300.0 });
        input.handle(RawInput::PointerMove { x: 500.0, y: 300.0 });
        assert_eq!(input.drain().spin_delta, 0.0);

        input.handle(RawInput::PointerDown { x: 500.0, y: 300.0 });
        input.handle(RawInput::PointerMove { x: 510.0, y: 300.0 });
        input.handle(RawInput::PointerMove { x: 530.0, y: 300.0 });
        input.handle(RawInput::PointerUp);
        input.handle(RawInput::PointerMove { x: 600.0, y: 300.0 });
        let frame = input.drain();
        assert!((frame.spin_delta - 30.0 * DRAG_GAIN).abs() < 1e-6);
    }

    #[test]
    fn test_pointer_position_writes_tilt() {
        let mut input = desktop();
        input.handle(RawInput::PointerMove { x: 800.0, y: 300.0 });
        let write = input.drain().tilt.unwrap();
        assert_eq!(write.origin, TiltOrigin::Pointer);
        assert!((write.tilt.gamma - POINTER_TILT_RANGE).abs() < 1e-4);
        assert!(write.tilt.beta.abs() < 1e-4);
    }

    #[test]
    fn test_wheel_up_spins_up() {
        let mut input = desktop();
        input.handle(RawInput::Wheel { delta_y: -100.0 });
        let frame = input.drain();
        assert!(frame.spin_delta > 0.0);
        assert!((frame.spin_delta - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_touch_swipe_uses_touch_gain() {
        let mut input = mobile();
        input.handle(RawInput::TouchStart { x: 100.0 });
        input.handle(RawInput::TouchMove { x: 140.0 });
        input.handle(RawInput::TouchMove { x: 120.0 });
        let frame = input.drain();
        assert!((frame.spin_delta - 20.0 * TOUCH_GAIN).abs() < 1e-6);
        assert_eq!(frame.thrust_demand, 0.5);

        input.handle(RawInput::TouchEnd);
        assert_eq!(input.drain().thrust_demand, 0.0);
    }

    #[test]
    fn test_sources_ignore_foreign_events() {
        let mut input = mobile();
        input.handle(RawInput::Wheel { delta_y: 500.0 });
        input.handle(RawInput::RotationDelta(0.3));
        assert_eq!(input.pending(), 0);
    }

    #[test]
    fn test_tilt_last_writer_wins() {
        let mut input = mobile();
        input.handle(RawInput::Orientation { beta: 10.0, gamma: 5.0 });
        input.handle(RawInput::Orientation { beta: 1.0, gamma: -2.0 });
        let write = input.drain().tilt.unwrap();
        assert_eq!(write.tilt, Tilt::new(1.0, -2.0));
        assert_eq!(write.origin, TiltOrigin::Sensor);
        assert!(input.drain().tilt.is_none());
    }

    #[test]
    fn test_many_events_accumulate_once() {
        let mut input = desktop();
        for _ in 0..25 {
            input.apply_spin_adjustment(0.001);
        }
        let frame = input.drain();
        assert!((frame.spin_delta - 0.025).abs() < 1e-6);
        // Drained signals are never replayed
        assert_eq!(input.drain().spin_delta, 0.0);
    }

    #[test]
    fn test_optical_zero_resets_level() {
        let mut input = desktop();
        input.handle(RawInput::RotationDelta(0.01));
        let frame = input.drain();
        assert!((frame.spin_delta - 0.01).abs() < 1e-6);
        assert!((frame.thrust_demand - 0.5).abs() < 1e-5);

        input.handle(RawInput::RotationDelta(0.0));
        let frame = input.drain();
        assert_eq!(frame.spin_delta, 0.0);
        assert_eq!(frame.thrust_demand, 0.0);
    }

    #[test]
    fn test_reset_clears_queue_and_continuity() {
        let mut input = desktop();
        input.handle(RawInput::PointerDown { x: 10.0, y: 10.0 });
        input.apply_spin_adjustment(1.0);
        input.reset();
        assert_eq!(input.pending(), 0);
        // Pointer no longer held: moves only write tilt
        input.handle(RawInput::PointerMove { x: 50.0, y: 10.0 });
        assert_eq!(input.drain().spin_delta, 0.0);
    }

    #[test]
    fn test_control_sign() {
        assert_eq!(control_sign(MissionPhase::Playing), 1.0);
        assert_eq!(control_sign(MissionPhase::Stabilizing), -1.0);
        assert_eq!(control_sign(MissionPhase::Docking), 0.0);
        assert_eq!(control_sign(MissionPhase::Failed), 0.0);
    }
}
