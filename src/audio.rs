//! Audio collaborator
//!
//! The simulation only ever fires cues and pushes parameters; it never waits
//! on audio. A sink that cannot play (no context, autoplay blocked) stays
//! silent instead of failing the mission.

use crate::sim::MissionPhase;

/// Discrete feedback cues
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCue {
    /// Spin match entered
    SyncAchieved,
    /// Tilt alignment entered
    AlignmentAchieved,
    /// Closing-in beep, intensity in (0, 1]
    ProximityAlert { intensity: f32 },
    /// Station stabilized
    Success,
    /// Boundary or collision failure
    Failure,
}

/// Anything that can voice mission feedback.
///
/// Lifecycle: `init` before the first mission, `teardown` when the session
/// ends. Every method must be cheap and must not fail.
pub trait AudioSink {
    fn init(&mut self);
    fn teardown(&mut self);
    /// Unlock playback after a user gesture
    fn resume(&mut self) {}
    fn cue(&mut self, cue: AudioCue);
    /// Continuous: current ship spin (rad/frame)
    fn update_buzz(&mut self, spin: f32);
    /// Continuous: remaining distance / initial distance
    fn update_tension(&mut self, distance_ratio: f32);
    /// Mission phase changed (ambience on/off)
    fn phase_changed(&mut self, _phase: MissionPhase) {}
}

/// Buzz intensity for a spin value (0-1)
#[inline]
pub fn buzz_intensity(spin: f32) -> f32 {
    (spin.abs() * 15.0).min(1.0)
}

/// Tension level for a distance ratio (0 far, 1 at the port)
#[inline]
pub fn tension_level(distance_ratio: f32) -> f32 {
    (1.0 - distance_ratio).clamp(0.0, 1.0)
}

/// Sink that plays nothing (native builds, audio unavailable)
#[derive(Debug, Default)]
pub struct SilentAudio {
    initialized: bool,
}

impl AudioSink for SilentAudio {
    fn init(&mut self) {
        if !self.initialized {
            log::debug!("Audio disabled, using silent sink");
            self.initialized = true;
        }
    }

    fn teardown(&mut self) {
        self.initialized = false;
    }

    fn cue(&mut self, cue: AudioCue) {
        log::trace!("cue {:?}", cue);
    }

    fn update_buzz(&mut self, _spin: f32) {}

    fn update_tension(&mut self, _distance_ratio: f32) {}
}

#[cfg(target_arch = "wasm32")]
pub use web::WebAudio;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{AudioCue, AudioSink, buzz_intensity, tension_level};
    use crate::sim::MissionPhase;

    /// Procedural Web Audio sink - no external files needed
    pub struct WebAudio {
        ctx: Option<AudioContext>,
        master: Option<GainNode>,
        ambience_gain: Option<GainNode>,
        drone: Option<OscillatorNode>,
        master_volume: f32,
        sfx_volume: f32,
        music_volume: f32,
        muted: bool,
    }

    impl Default for WebAudio {
        fn default() -> Self {
            Self::new()
        }
    }

    impl WebAudio {
        pub fn new() -> Self {
            Self {
                ctx: None,
                master: None,
                ambience_gain: None,
                drone: None,
                master_volume: 0.8,
                sfx_volume: 1.0,
                music_volume: 0.7,
                muted: false,
            }
        }

        /// Set master volume (0.0 - 1.0)
        pub fn set_master_volume(&mut self, vol: f32) {
            self.master_volume = vol.clamp(0.0, 1.0);
        }

        /// Set SFX volume (0.0 - 1.0)
        pub fn set_sfx_volume(&mut self, vol: f32) {
            self.sfx_volume = vol.clamp(0.0, 1.0);
        }

        /// Set ambience volume (0.0 - 1.0)
        pub fn set_music_volume(&mut self, vol: f32) {
            self.music_volume = vol.clamp(0.0, 1.0);
        }

        /// Mute/unmute all audio
        pub fn set_muted(&mut self, muted: bool) {
            self.muted = muted;
            if let (Some(ctx), Some(master)) = (&self.ctx, &self.master) {
                let level = if muted { 0.0 } else { 0.45 * self.master_volume };
                master
                    .gain()
                    .set_target_at_time(level, ctx.current_time(), 0.05)
                    .ok();
            }
        }

        fn effective_volume(&self) -> f32 {
            if self.muted {
                0.0
            } else {
                self.sfx_volume
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let master = self.master.as_ref()?;
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(master).ok()?;

            Some((osc, gain))
        }

        /// Short enveloped tone starting `delay` seconds from now
        fn play_beep(&self, freq: f32, duration: f64, osc_type: OscillatorType, volume: f32, delay: f64) {
            let vol = self.effective_volume() * volume;
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            let Some((osc, gain)) = self.create_osc(ctx, freq, osc_type) else {
                return;
            };
            let t = ctx.current_time() + delay;

            gain.gain().set_value_at_time(vol, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.001, t + duration)
                .ok();

            osc.start_with_when(t).ok();
            osc.stop_with_when(t + duration).ok();
        }

        /// Sub-bass drone whose level follows approach tension
        fn start_ambience(&mut self) {
            if self.drone.is_some() {
                return;
            }
            let Some(ctx) = &self.ctx else { return };
            let Some(master) = &self.master else { return };
            let (Ok(osc), Ok(gain)) = (ctx.create_oscillator(), ctx.create_gain()) else {
                return;
            };
            let t = ctx.current_time();

            osc.set_type(OscillatorType::Triangle);
            osc.frequency().set_value_at_time(40.0, t).ok();
            gain.gain().set_value_at_time(0.0, t).ok();
            gain.gain()
                .linear_ramp_to_value_at_time(0.2 * self.music_volume, t + 4.0)
                .ok();
            if osc.connect_with_audio_node(&gain).is_err()
                || gain.connect_with_audio_node(master).is_err()
            {
                log::warn!("Failed to wire ambience drone");
                return;
            }
            osc.start().ok();

            self.drone = Some(osc);
            self.ambience_gain = Some(gain);
        }

        fn stop_ambience(&mut self) {
            if let Some(osc) = self.drone.take() {
                osc.stop().ok();
            }
            self.ambience_gain = None;
        }

        /// Fade the drone out over `duration` seconds
        fn fade_ambience(&mut self, duration: f64) {
            let Some(ctx) = &self.ctx else { return };
            let t = ctx.current_time();
            if let Some(gain) = &self.ambience_gain {
                gain.gain().set_target_at_time(0.0, t, duration / 5.0).ok();
            }
            if let Some(osc) = self.drone.take() {
                osc.stop_with_when(t + duration).ok();
            }
            self.ambience_gain = None;
        }
    }

    impl AudioSink for WebAudio {
        fn init(&mut self) {
            if self.ctx.is_some() {
                return;
            }
            // May fail outside a secure context
            let Some(ctx) = AudioContext::new().ok() else {
                log::warn!("Failed to create AudioContext - audio disabled");
                return;
            };
            match ctx.create_gain() {
                Ok(master) => {
                    let level = if self.muted { 0.0 } else { 0.45 * self.master_volume };
                    master.gain().set_value(level);
                    if master.connect_with_audio_node(&ctx.destination()).is_ok() {
                        self.master = Some(master);
                    }
                }
                Err(_) => log::warn!("Failed to create master gain - audio disabled"),
            }
            self.ctx = Some(ctx);
        }

        fn teardown(&mut self) {
            self.stop_ambience();
            if let Some(ctx) = self.ctx.take() {
                let _ = ctx.close();
            }
            self.master = None;
        }

        fn resume(&mut self) {
            if let Some(ctx) = &self.ctx {
                if ctx.state() == web_sys::AudioContextState::Suspended {
                    let _ = ctx.resume();
                }
            }
        }

        fn cue(&mut self, cue: AudioCue) {
            match cue {
                AudioCue::SyncAchieved => self.play_beep(880.0, 0.08, OscillatorType::Triangle, 0.2, 0.0),
                AudioCue::AlignmentAchieved => self.play_beep(660.0, 0.1, OscillatorType::Sine, 0.2, 0.0),
                AudioCue::ProximityAlert { intensity } => self.play_beep(
                    400.0 + intensity * 600.0,
                    0.04,
                    OscillatorType::Square,
                    0.1 * intensity,
                    0.0,
                ),
                AudioCue::Success => {
                    self.fade_ambience(5.0);
                    self.play_beep(523.0, 0.5, OscillatorType::Sine, 0.4, 0.0);
                    self.play_beep(659.0, 0.5, OscillatorType::Sine, 0.3, 0.15);
                }
                AudioCue::Failure => {
                    self.stop_ambience();
                    self.play_beep(40.0, 1.5, OscillatorType::Sawtooth, 0.9, 0.0);
                }
            }
        }

        fn update_buzz(&mut self, spin: f32) {
            if self.muted || self.drone.is_none() {
                return;
            }
            let (Some(ctx), Some(master)) = (&self.ctx, &self.master) else {
                return;
            };
            let level = (0.4 + buzz_intensity(spin) * 0.15) * self.master_volume;
            master
                .gain()
                .set_target_at_time(level, ctx.current_time(), 0.1)
                .ok();
        }

        fn update_tension(&mut self, distance_ratio: f32) {
            let (Some(ctx), Some(gain)) = (&self.ctx, &self.ambience_gain) else {
                return;
            };
            let level = (0.5 + tension_level(distance_ratio) * 0.5) * 0.4 * self.music_volume;
            gain.gain()
                .set_target_at_time(level, ctx.current_time(), 0.5)
                .ok();
        }

        fn phase_changed(&mut self, phase: MissionPhase) {
            match phase {
                MissionPhase::Playing | MissionPhase::Stabilizing => self.start_ambience(),
                MissionPhase::Docking | MissionPhase::Start => self.stop_ambience(),
                // Terminal cues handle their own fade
                MissionPhase::Success | MissionPhase::Failed => {}
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buzz_intensity_saturates() {
        assert_eq!(buzz_intensity(0.0), 0.0);
        assert!((buzz_intensity(-0.02) - 0.3).abs() < 1e-6);
        assert_eq!(buzz_intensity(0.5), 1.0);
    }

    #[test]
    fn test_tension_rises_as_range_closes() {
        assert_eq!(tension_level(1.0), 0.0);
        assert!((tension_level(0.25) - 0.75).abs() < 1e-6);
        assert_eq!(tension_level(-0.5), 1.0);
    }

    #[test]
    fn test_silent_sink_lifecycle() {
        let mut audio = SilentAudio::default();
        audio.init();
        audio.cue(AudioCue::Failure);
        audio.teardown();
        assert!(!audio.initialized);
    }
}
