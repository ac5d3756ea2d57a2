//! Platform abstraction layer
//!
//! Decides once at startup which input sources the session listens to.
//! Phones steer with touch and tilt with the orientation sensor; computers
//! steer with the pointer and tilt by moving it.

use crate::sim::InputSource;

/// Coarse device class from the user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Mobile,
    Computer,
}

impl DeviceClass {
    /// Classify a user agent string
    pub fn from_user_agent(ua: &str) -> Self {
        const MOBILE_MARKERS: [&str; 4] = ["iPhone", "iPad", "iPod", "Android"];
        if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
            DeviceClass::Mobile
        } else {
            DeviceClass::Computer
        }
    }
}

/// What the host can offer as input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputCapabilities {
    pub device: DeviceClass,
    /// Hand tracking available and enabled
    pub camera: bool,
}

impl InputCapabilities {
    pub fn new(device: DeviceClass, camera: bool) -> Self {
        Self { device, camera }
    }

    /// Input sources for this host, in routing order
    pub fn input_sources(&self) -> Vec<InputSource> {
        let mut sources = match self.device {
            DeviceClass::Mobile => vec![InputSource::touch(), InputSource::Orientation],
            DeviceClass::Computer => vec![InputSource::pointer()],
        };
        if self.camera {
            sources.push(InputSource::optical());
        }
        log::debug!(
            "Input sources: {}",
            sources
                .iter()
                .map(InputSource::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        sources
    }
}

/// Probe the browser (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn detect(use_camera: bool) -> InputCapabilities {
    let window = web_sys::window();
    let ua = window
        .as_ref()
        .and_then(|w| w.navigator().user_agent().ok())
        .unwrap_or_default();
    let camera = use_camera
        && window
            .map(|w| w.navigator().media_devices().is_ok())
            .unwrap_or(false);
    InputCapabilities::new(DeviceClass::from_user_agent(&ua), camera)
}

/// Native hosts are treated as a computer without a camera
#[cfg(not(target_arch = "wasm32"))]
pub fn detect(_use_camera: bool) -> InputCapabilities {
    InputCapabilities::new(DeviceClass::Computer, false)
}
