//! Mission session
//!
//! Owns everything one player's mission needs: the phase controller, the
//! input queue, the tick scheduler, the HUD bridge and the audio sink. Hosts
//! push raw input whenever it arrives and call `frame` once per refresh.

use crate::audio::{AudioCue, AudioSink};
use crate::bridge::{HudSnapshot, PresentationBridge};
use crate::clock::FrameClock;
use crate::consts::INITIAL_DISTANCE;
use crate::settings::Settings;
use crate::tracking::{HandLandmarks, RotationTracker};
use crate::sim::{
    InputNormalizer, InputSource, MissionController, MissionPhase, MissionState, RawInput,
    SimEvent, TransitionError,
};

pub struct Session<A: AudioSink> {
    controller: MissionController,
    input: InputNormalizer,
    clock: FrameClock,
    bridge: PresentationBridge,
    tracker: RotationTracker,
    audio: A,
    /// Events raised during the last `frame`
    events: Vec<SimEvent>,
    last_phase: MissionPhase,
}

impl<A: AudioSink> Session<A> {
    pub fn new(settings: &Settings, sources: Vec<InputSource>, mut audio: A) -> Self {
        audio.init();
        Self {
            controller: MissionController::new(),
            input: InputNormalizer::new(sources, settings.gains),
            clock: FrameClock::new(settings.pacing),
            bridge: PresentationBridge::new(settings.hud_interval_ms),
            tracker: RotationTracker::new(),
            audio,
            events: Vec::new(),
            last_phase: MissionPhase::Start,
        }
    }

    pub fn state(&self) -> &MissionState {
        self.controller.state()
    }

    pub fn phase(&self) -> MissionPhase {
        self.controller.phase()
    }

    pub fn attempts(&self) -> u32 {
        self.controller.attempts()
    }

    /// Latest HUD snapshot
    pub fn snapshot(&self) -> Option<&HudSnapshot> {
        self.bridge.latest()
    }

    /// Events raised during the last frame, in order
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    /// Leave the start screen
    pub fn launch(&mut self) -> Result<(), TransitionError> {
        self.audio.resume();
        self.controller.launch()?;
        self.bridge.reset();
        self.sync_phase();
        Ok(())
    }

    /// Start a fresh attempt. Nothing from the previous one survives.
    pub fn reset(&mut self) {
        self.controller.reset();
        self.input.reset();
        self.clock.reset();
        self.bridge.reset();
        self.tracker.reset();
        self.events.clear();
        self.sync_phase();
    }

    /// Queue raw device input for the next frame
    pub fn input(&mut self, raw: RawInput) {
        // Browsers only unlock audio from a user gesture
        if matches!(
            raw,
            RawInput::PointerDown { .. }
                | RawInput::PointerMove { .. }
                | RawInput::TouchStart { .. }
                | RawInput::Wheel { .. }
        ) {
            self.audio.resume();
        }
        self.input.handle(raw);
    }

    /// Optical tracker callback; 0 means tracking lost
    pub fn on_rotation_delta(&mut self, delta: f32) {
        self.input.handle(RawInput::RotationDelta(delta));
    }

    /// Hand landmarks from one camera frame, `None` when no hand is seen
    pub fn on_hand_landmarks(&mut self, hand: Option<HandLandmarks>) {
        let delta = self.tracker.update(hand);
        self.on_rotation_delta(delta);
    }

    /// Absolute tilt from a sensor
    pub fn set_tilt(&mut self, beta: f32, gamma: f32) {
        self.input.set_tilt(beta, gamma);
    }

    /// Refresh callback at `now_ms`. Returns a new HUD snapshot when one is due.
    pub fn frame(&mut self, now_ms: f64) -> Option<&HudSnapshot> {
        self.events.clear();
        let before = self.controller.phase();
        let ticks = self.clock.ticks_for(now_ms);
        for _ in 0..ticks {
            self.step();
        }

        if self.controller.phase() != before {
            Some(self.bridge.force(self.controller.state(), now_ms))
        } else {
            self.bridge.sample(self.controller.state(), now_ms)
        }
    }

    /// One simulation tick
    fn step(&mut self) {
        let input = self.input.drain();
        let start = self.events.len();
        self.controller.advance(&input, &mut self.events);

        for event in &self.events[start..] {
            let cue = match *event {
                SimEvent::SyncAchieved => Some(AudioCue::SyncAchieved),
                SimEvent::AlignmentAchieved => Some(AudioCue::AlignmentAchieved),
                SimEvent::ProximityAlert { intensity } => {
                    Some(AudioCue::ProximityAlert { intensity })
                }
                SimEvent::Finished { success: true } => Some(AudioCue::Success),
                SimEvent::Finished { success: false } => Some(AudioCue::Failure),
                SimEvent::DockingInitiated | SimEvent::DockingStalled => None,
            };
            if let Some(cue) = cue {
                self.audio.cue(cue);
            }
        }

        let state = self.controller.state();
        if state.phase == MissionPhase::Playing {
            self.audio.update_buzz(state.ship_spin);
            self.audio.update_tension(state.distance / INITIAL_DISTANCE);
        }
        self.sync_phase();
    }

    /// Tell the audio sink about a phase change
    fn sync_phase(&mut self) {
        let phase = self.controller.phase();
        if phase != self.last_phase {
            self.last_phase = phase;
            self.audio.phase_changed(phase);
        }
    }

    /// Release the audio sink
    pub fn teardown(&mut self) {
        self.audio.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::test_support::RecordingAudio;
    use crate::consts::*;
    use crate::sim::FailureReason;

    const FRAME_MS: f64 = 1000.0 / 60.0;

    struct Driver {
        session: Session<RecordingAudio>,
        now: f64,
    }

    impl Driver {
        fn desktop() -> Self {
            Self::with_sources(vec![InputSource::pointer()])
        }

        /// Touch, tilt sensor and camera
        fn mobile() -> Self {
            Self::with_sources(vec![
                InputSource::touch(),
                InputSource::Orientation,
                InputSource::optical(),
            ])
        }

        fn with_sources(sources: Vec<InputSource>) -> Self {
            let mut session = Session::new(&Settings::default(), sources, RecordingAudio::default());
            session.input(RawInput::Resize {
                width: 800.0,
                height: 600.0,
            });
            Self { session, now: 0.0 }
        }

        fn frame(&mut self) {
            self.now += FRAME_MS;
            self.session.frame(self.now);
        }

        fn run_while(&mut self, phase: MissionPhase, limit: u32) {
            let mut frames = 0;
            while self.session.phase() == phase {
                self.frame();
                frames += 1;
                assert!(frames < limit, "stuck in {phase:?}");
            }
        }

        /// Wheel notches that bring the ship onto the station spin
        fn match_ship_spin(&mut self) {
            let state = self.session.state();
            let delta_y = (state.station_spin - state.ship_spin) / WHEEL_GAIN;
            self.session.input(RawInput::Wheel { delta_y });
        }

        /// Fly a matched, level approach with the optical source and dock
        fn dock_with_optical(&mut self) {
            self.session.launch().unwrap();
            let state = self.session.state();
            let delta = state.station_spin - state.ship_spin;
            self.session.on_rotation_delta(delta);
            self.run_while(MissionPhase::Playing, 4000);
            self.run_while(MissionPhase::Docking, 500);
            assert_eq!(self.session.phase(), MissionPhase::Stabilizing);
        }
    }

    #[test]
    fn test_idle_until_launch() {
        let mut driver = Driver::desktop();
        for _ in 0..10 {
            driver.frame();
        }
        assert_eq!(driver.session.state(), &MissionState::new());
        assert_eq!(driver.session.snapshot().map(|h| h.phase), Some(MissionPhase::Start));
        assert!(driver.session.audio().initialized);
        assert!(driver.session.audio().cues.is_empty());
    }

    #[test]
    fn test_full_mission_succeeds() {
        let mut driver = Driver::desktop();
        driver.session.launch().unwrap();
        driver.match_ship_spin();
        driver.run_while(MissionPhase::Playing, 4000);
        assert_eq!(driver.session.phase(), MissionPhase::Docking);

        driver.run_while(MissionPhase::Docking, 500);
        assert_eq!(driver.session.phase(), MissionPhase::Stabilizing);
        assert_eq!(driver.session.state().distance, 0.0);

        // Controls are inverted now: the same wheel direction slows the station
        let state = driver.session.state();
        let delta_y = (state.station_spin - STABILIZATION_TARGET_SPIN) / WHEEL_GAIN;
        driver.session.input(RawInput::Wheel { delta_y });
        driver.run_while(MissionPhase::Stabilizing, 500);

        let session = &driver.session;
        assert_eq!(session.phase(), MissionPhase::Success);
        assert_eq!(session.attempts(), 1);
        assert_eq!(session.events(), &[SimEvent::Finished { success: true }]);

        let audio = session.audio();
        assert_eq!(audio.cues.first(), Some(&AudioCue::SyncAchieved));
        assert!(audio.cues.contains(&AudioCue::AlignmentAchieved));
        assert!(
            audio
                .cues
                .iter()
                .any(|c| matches!(c, AudioCue::ProximityAlert { .. }))
        );
        assert_eq!(audio.cues.last(), Some(&AudioCue::Success));
        assert_eq!(
            audio.phases,
            [
                MissionPhase::Playing,
                MissionPhase::Docking,
                MissionPhase::Stabilizing,
                MissionPhase::Success
            ]
        );
        // Continuous parameters only while approaching
        assert_eq!(audio.buzz.len(), 2949);
        assert!(audio.tension.windows(2).all(|w| w[1] <= w[0]));

        let hud = session.snapshot().unwrap();
        assert!(hud.is_finished);
        assert!(hud.outcome.is_some());
    }

    #[test]
    fn test_tilted_approach_collides() {
        let mut driver = Driver::desktop();
        driver.session.launch().unwrap();
        driver.match_ship_spin();
        // Off-centre pointer: 3 degrees of roll, inside the corridor but misaligned
        driver.session.input(RawInput::PointerMove { x: 420.0, y: 300.0 });
        driver.run_while(MissionPhase::Playing, 4000);

        let session = &driver.session;
        assert_eq!(session.phase(), MissionPhase::Failed);
        assert_eq!(session.state().failure_reason, FailureReason::Collision);
        assert_eq!(session.audio().cues.last(), Some(&AudioCue::Failure));
        assert_eq!(
            session.snapshot().map(|h| h.failure_reason),
            Some(FailureReason::Collision)
        );
    }

    #[test]
    fn test_reset_discards_everything() {
        let mut driver = Driver::desktop();
        driver.session.launch().unwrap();
        driver.session.input(RawInput::PointerMove { x: 800.0, y: 600.0 });
        driver.run_while(MissionPhase::Playing, 100);
        assert_eq!(driver.session.state().failure_reason, FailureReason::Boundary);

        // Queued before the reset, must not leak into the new attempt
        driver.session.input(RawInput::Wheel { delta_y: 500.0 });
        driver.session.reset();
        assert_eq!(driver.session.state(), &MissionState::launched());
        assert!(driver.session.snapshot().is_none());
        assert!(driver.session.events().is_empty());

        driver.frame();
        assert_eq!(driver.session.state().ship_spin, INITIAL_SHIP_SPIN);
        assert_eq!(driver.session.state().distance, INITIAL_DISTANCE - APPROACH_SPEED);
    }

    #[test]
    fn test_gestures_resume_audio() {
        let mut driver = Driver::desktop();
        driver.session.input(RawInput::PointerUp);
        driver.session.input(RawInput::Resize {
            width: 10.0,
            height: 10.0,
        });
        assert_eq!(driver.session.audio().resumes, 0);
        // Steering by hovering alone must unlock audio too
        driver.session.input(RawInput::PointerMove { x: 1.0, y: 1.0 });
        assert_eq!(driver.session.audio().resumes, 1);
        driver.session.input(RawInput::PointerDown { x: 1.0, y: 1.0 });
        driver.session.input(RawInput::Wheel { delta_y: 1.0 });
        assert_eq!(driver.session.audio().resumes, 3);
    }

    #[test]
    fn test_hud_is_throttled() {
        let mut driver = Driver::desktop();
        driver.session.launch().unwrap();
        let mut sampled = 0;
        for i in 0..=10 {
            if driver.session.frame(i as f64 * 10.0).is_some() {
                sampled += 1;
            }
        }
        // 0, 50 and 100 ms
        assert_eq!(sampled, 3);
    }

    #[test]
    fn test_optical_delta_steers_ship() {
        let mut session = Session::new(
            &Settings::default(),
            vec![InputSource::pointer(), InputSource::optical()],
            RecordingAudio::default(),
        );
        session.launch().unwrap();
        session.on_rotation_delta(0.01);
        session.frame(0.0);
        assert!((session.state().ship_spin - (INITIAL_SHIP_SPIN + 0.01)).abs() < 1e-6);
        assert!(session.state().active_thrust > 0.0);

        session.on_rotation_delta(0.0);
        session.frame(FRAME_MS);
        assert!((session.state().ship_spin - (INITIAL_SHIP_SPIN + 0.01)).abs() < 1e-6);
    }

    #[test]
    fn test_teardown_releases_audio() {
        let mut driver = Driver::desktop();
        driver.session.teardown();
        assert!(driver.session.audio().torn_down);
    }

    #[test]
    fn test_optical_delta_slows_station_when_docked() {
        let mut driver = Driver::mobile();
        driver.dock_with_optical();
        let before = driver.session.state().station_spin;

        driver.session.on_rotation_delta(0.01);
        driver.frame();
        let state = driver.session.state();
        assert!((state.station_spin - (before - 0.01)).abs() < 1e-6);
        assert_eq!(state.ship_spin, state.station_spin);
    }

    #[test]
    fn test_touch_swipe_slows_station_when_docked() {
        let mut driver = Driver::mobile();
        driver.dock_with_optical();
        let before = driver.session.state().station_spin;

        driver.session.input(RawInput::TouchStart { x: 100.0 });
        driver.session.input(RawInput::TouchMove { x: 110.0 });
        driver.session.input(RawInput::TouchEnd);
        driver.frame();
        let expected = before - 10.0 * TOUCH_GAIN;
        assert!((driver.session.state().station_spin - expected).abs() < 1e-6);
    }

    #[test]
    fn test_hand_gesture_steers_ship() {
        use crate::tracking::HandLandmarks;
        use glam::Vec2;
        use std::f32::consts::FRAC_PI_2;

        let mut driver = Driver::mobile();
        driver.session.launch().unwrap();
        let wrist = Vec2::new(0.5, 0.5);
        let hand = |angle: f32| {
            Some(HandLandmarks::new(
                wrist,
                wrist + Vec2::new(angle.cos(), angle.sin()) * 0.2,
            ))
        };

        // First sighting only anchors the gesture
        driver.session.on_hand_landmarks(hand(0.0));
        driver.frame();
        assert_eq!(driver.session.state().ship_spin, INITIAL_SHIP_SPIN);

        // Quarter turn of the fingertip around the wrist
        driver.session.on_hand_landmarks(hand(FRAC_PI_2));
        driver.frame();
        let expected = INITIAL_SHIP_SPIN + FRAC_PI_2 * CIRCULAR_GESTURE_SENSITIVITY * 10.0;
        let spin = driver.session.state().ship_spin;
        assert!((spin - expected).abs() < 1e-5, "got {spin}");
        assert!(driver.session.state().active_thrust > 0.0);

        // Losing the hand sends a zero delta: spin holds, thrust demand drops
        driver.session.on_hand_landmarks(None);
        driver.frame();
        assert_eq!(driver.session.state().ship_spin, spin);
        let thrust = driver.session.state().active_thrust;
        driver.frame();
        assert!(driver.session.state().active_thrust < thrust);

        // Reacquired elsewhere: no jump
        driver.session.on_hand_landmarks(hand(2.5));
        driver.frame();
        assert_eq!(driver.session.state().ship_spin, spin);
    }
}
