//! Orbital Dock entry point
//!
//! Web builds wire DOM events into a `Session` and drive it from
//! `requestAnimationFrame`. Native builds fly a scripted mission headless.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::convert::FromWasmAbi;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        DeviceOrientationEvent, Document, EventTarget, KeyboardEvent, MouseEvent, TouchEvent,
        WheelEvent,
    };

    use orbital_dock::audio::WebAudio;
    use orbital_dock::bridge::HudSnapshot;
    use orbital_dock::sim::{MissionPhase, RawInput};
    use orbital_dock::tracking::HandLandmarks;
    use orbital_dock::{Session, Settings, platform};

    thread_local! {
        /// Reachable from the exported tracker hook
        static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
    }

    struct App {
        session: Session<WebAudio>,
        settings: Settings,
        document: Document,
    }

    impl App {
        fn frame(&mut self, time: f64) {
            if let Some(hud) = self.session.frame(time) {
                update_hud(&self.document, hud);
            }
            self.render();
        }

        /// Spin the station and ship sprites from the current state
        fn render(&self) {
            let state = self.session.state();
            let drift = state.tilt.drift();
            if let Some(el) = self.document.get_element_by_id("station") {
                let _ = el.set_attribute(
                    "style",
                    &format!(
                        "transform: translate({:.1}px, {:.1}px) rotate({:.4}rad) scale({:.3})",
                        drift.x,
                        drift.y,
                        state.station_rotation,
                        state.approach_scale()
                    ),
                );
            }
            if let Some(el) = self.document.get_element_by_id("ship") {
                let _ = el.set_attribute(
                    "style",
                    &format!("transform: rotate({:.4}rad)", state.ship_rotation),
                );
            }
            if let Some(el) = self.document.get_element_by_id("thrust") {
                let _ = el.set_attribute("style", &format!("opacity: {:.2}", state.active_thrust));
            }
        }

        fn launch_or_retry(&mut self) {
            let result = match self.session.phase() {
                MissionPhase::Start => self.session.launch(),
                MissionPhase::Success | MissionPhase::Failed => {
                    self.session.reset();
                    Ok(())
                }
                _ => return,
            };
            if let Err(e) = result {
                log::warn!("{e}");
            }
            set_visible(&self.document, "start-screen", false);
            set_visible(&self.document, "result-screen", false);
        }

        /// Flip mute and remember the choice
        fn toggle_mute(&mut self) {
            self.settings.muted = !self.settings.muted;
            let muted = self.settings.muted;
            self.session.audio_mut().set_muted(muted);
            self.settings.save();
            log::info!("Audio {}", if muted { "muted" } else { "unmuted" });
        }
    }

    fn set_visible(document: &Document, id: &str, visible: bool) {
        if let Some(el) = document.get_element_by_id(id) {
            let _ = el.set_attribute("class", if visible { "" } else { "hidden" });
        }
    }

    fn set_text(document: &Document, id: &str, text: &str) {
        if let Some(el) = document.get_element_by_id(id) {
            el.set_text_content(Some(text));
        }
    }

    /// Update HUD elements in DOM
    fn update_hud(document: &Document, hud: &HudSnapshot) {
        set_text(document, "hud-rpm", &format!("{:.1}", hud.current_rpm));
        set_text(document, "hud-target", &format!("{:.1}", hud.target_rpm));
        set_text(document, "hud-distance", &hud.distance.to_string());
        set_text(
            document,
            "hud-tilt",
            &format!("{:.1}° / {:.1}°", hud.tilt_x, hud.tilt_y),
        );
        set_text(document, "hud-sync", &format!("{:.0}%", hud.spin_match_percent));
        set_text(document, "hud-align", &format!("{:.0}%", hud.alignment_percent));
        if let Some(el) = document.get_element_by_id("hud-sync") {
            let _ = el.set_attribute("class", if hud.is_sync { "ok" } else { "" });
        }
        if let Some(el) = document.get_element_by_id("hud-align") {
            let _ = el.set_attribute("class", if hud.is_aligned { "ok" } else { "" });
        }
        set_visible(document, "drift-warning", hud.drift_warning);

        set_visible(document, "result-screen", hud.is_finished);
        if let Some(message) = hud.outcome {
            set_text(document, "result-message", message);
        }
    }

    /// Register an event listener that lives for the page lifetime
    fn listen<E>(target: &EventTarget, name: &str, handler: impl FnMut(E) + 'static)
    where
        E: FromWasmAbi + 'static,
    {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        let _ = target.add_event_listener_with_callback(name, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            return;
        }
        log::info!("Orbital Dock starting...");

        let Some(window) = web_sys::window() else {
            log::error!("no window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("no document");
            return;
        };

        let settings = Settings::load();
        let caps = platform::detect(settings.use_camera);
        log::info!("Device: {:?}, camera: {}", caps.device, caps.camera);

        let mut audio = WebAudio::new();
        audio.set_master_volume(settings.master_volume);
        audio.set_sfx_volume(settings.sfx_volume);
        audio.set_music_volume(settings.music_volume);
        audio.set_muted(settings.muted);

        let mut session = Session::new(&settings, caps.input_sources(), audio);
        let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
        let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(1.0);
        session.input(RawInput::Resize {
            width: width as f32,
            height: height as f32,
        });

        let app = Rc::new(RefCell::new(App {
            session,
            settings,
            document: document.clone(),
        }));
        APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }
        set_visible(&document, "start-screen", true);

        setup_input_handlers(&window, app.clone());
        setup_buttons(&document, app.clone());
        setup_focus_audio(&window, app.clone());

        request_animation_frame(app);
        log::info!("Orbital Dock running!");
    }

    fn setup_input_handlers(window: &web_sys::Window, app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            listen(window, "mousedown", move |event: MouseEvent| {
                app.borrow_mut().session.input(RawInput::PointerDown {
                    x: event.client_x() as f32,
                    y: event.client_y() as f32,
                });
            });
        }
        {
            let app = app.clone();
            listen(window, "mousemove", move |event: MouseEvent| {
                app.borrow_mut().session.input(RawInput::PointerMove {
                    x: event.client_x() as f32,
                    y: event.client_y() as f32,
                });
            });
        }
        {
            let app = app.clone();
            listen(window, "mouseup", move |_event: MouseEvent| {
                app.borrow_mut().session.input(RawInput::PointerUp);
            });
        }
        {
            let app = app.clone();
            listen(window, "wheel", move |event: WheelEvent| {
                app.borrow_mut().session.input(RawInput::Wheel {
                    delta_y: event.delta_y() as f32,
                });
            });
        }
        {
            let app = app.clone();
            listen(window, "touchstart", move |event: TouchEvent| {
                if let Some(touch) = event.touches().get(0) {
                    app.borrow_mut().session.input(RawInput::TouchStart {
                        x: touch.client_x() as f32,
                    });
                }
            });
        }
        {
            let app = app.clone();
            listen(window, "touchmove", move |event: TouchEvent| {
                event.prevent_default();
                if let Some(touch) = event.touches().get(0) {
                    app.borrow_mut().session.input(RawInput::TouchMove {
                        x: touch.client_x() as f32,
                    });
                }
            });
        }
        {
            let app = app.clone();
            listen(window, "touchend", move |_event: TouchEvent| {
                app.borrow_mut().session.input(RawInput::TouchEnd);
            });
        }
        {
            let app = app.clone();
            listen(window, "deviceorientation", move |event: DeviceOrientationEvent| {
                let (Some(beta), Some(gamma)) = (event.beta(), event.gamma()) else {
                    return;
                };
                app.borrow_mut().session.input(RawInput::Orientation {
                    beta: beta as f32,
                    gamma: gamma as f32,
                });
            });
        }
        {
            let app = app.clone();
            listen(window, "resize", move |_event: web_sys::Event| {
                let Some(window) = web_sys::window() else { return };
                let width = window.inner_width().ok().and_then(|v| v.as_f64());
                let height = window.inner_height().ok().and_then(|v| v.as_f64());
                if let (Some(width), Some(height)) = (width, height) {
                    app.borrow_mut().session.input(RawInput::Resize {
                        width: width as f32,
                        height: height as f32,
                    });
                }
            });
        }
        // Keyboard
        listen(window, "keydown", move |event: KeyboardEvent| {
            match event.key().as_str() {
                "Enter" => app.borrow_mut().launch_or_retry(),
                "m" | "M" => app.borrow_mut().toggle_mute(),
                _ => {}
            }
        });
    }

    fn setup_buttons(document: &Document, app: Rc<RefCell<App>>) {
        for id in ["launch-btn", "restart-btn"] {
            if let Some(btn) = document.get_element_by_id(id) {
                let app = app.clone();
                listen(&btn, "click", move |_event: MouseEvent| {
                    app.borrow_mut().launch_or_retry();
                });
            }
        }
    }

    /// Quiet the audio while the window is in the background
    fn setup_focus_audio(window: &web_sys::Window, app: Rc<RefCell<App>>) {
        {
            let app = app.clone();
            listen(window, "blur", move |_event: web_sys::FocusEvent| {
                let mut a = app.borrow_mut();
                if a.settings.mute_on_blur {
                    a.session.audio_mut().set_muted(true);
                    log::info!("Audio muted (window blur)");
                }
            });
        }
        listen(window, "focus", move |_event: web_sys::FocusEvent| {
            let mut a = app.borrow_mut();
            let muted = a.settings.muted;
            a.session.audio_mut().set_muted(muted);
        });
    }

    fn request_animation_frame(app: Rc<RefCell<App>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(app, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(app: Rc<RefCell<App>>, time: f64) {
        app.borrow_mut().frame(time);
        request_animation_frame(app);
    }

    fn with_app(f: impl FnOnce(&mut App)) {
        APP.with(|slot| {
            if let Some(app) = slot.borrow().as_ref() {
                f(&mut app.borrow_mut());
            }
        });
    }

    /// Hand-tracking hook: the JS tracker reports one delta per camera frame
    pub fn push_rotation_delta(delta: f32) {
        with_app(|app| app.session.on_rotation_delta(delta));
    }

    /// Hand-tracking hook: raw landmarks, converted to a delta here
    pub fn push_hand_landmarks(hand: Option<HandLandmarks>) {
        with_app(|app| app.session.on_hand_landmarks(hand));
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

/// Optical tracker entry point for the page script
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn push_rotation_delta(delta: f32) {
    wasm_game::push_rotation_delta(delta);
}

/// Wrist and index fingertip for one camera frame (normalized image coordinates)
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn push_hand_landmarks(wrist_x: f32, wrist_y: f32, tip_x: f32, tip_y: f32) {
    use orbital_dock::tracking::HandLandmarks;
    wasm_game::push_hand_landmarks(Some(HandLandmarks::new(
        glam::Vec2::new(wrist_x, wrist_y),
        glam::Vec2::new(tip_x, tip_y),
    )));
}

/// No hand in the current camera frame
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub fn hand_lost() {
    wasm_game::push_hand_landmarks(None);
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use orbital_dock::Settings;
    use orbital_dock::clock::FramePacing;
    use orbital_dock::pilot::{PilotProfile, fly_mission};

    const USAGE: &str = "usage: orbital-dock [seed] [per-refresh|fixed-60]";

    env_logger::init();
    log::info!("Orbital Dock (native) starting...");

    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => match arg.parse::<u64>() {
            Ok(seed) => seed,
            Err(e) => {
                eprintln!("{USAGE}  ({arg}: {e})");
                std::process::exit(2);
            }
        },
        None => 1,
    };

    let mut settings = Settings::load();
    if let Some(arg) = args.next() {
        match FramePacing::from_str(&arg) {
            Some(pacing) => settings.pacing = pacing,
            None => {
                eprintln!("{USAGE}  (unknown pacing {arg})");
                std::process::exit(2);
            }
        }
    }
    log::info!(
        "Flying scripted mission, seed {seed}, pacing {}",
        settings.pacing.as_str()
    );
    let flight = fly_mission(seed, PilotProfile::default(), &settings, 20_000);

    match serde_json::to_string(&flight) {
        Ok(json) => println!("{json}"),
        Err(e) => log::error!("{e}"),
    }
    if !flight.succeeded() {
        log::warn!(
            "Mission failed after {} ticks: {}",
            flight.ticks,
            flight.failure_reason.as_str()
        );
        std::process::exit(1);
    }
    log::info!("Mission complete in {} ticks", flight.ticks);
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
