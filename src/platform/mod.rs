//! Browser platform layer
//!
//! Everything that touches a browser API lives here:
//! - Camera stream acquisition and release
//! - Face landmark detector binding
//! - Web Audio sound effects and pronunciation playback
//! - HTTP transport for the advice and pronunciation services

pub mod audio;
pub mod camera;
pub mod detector;
pub mod net;

pub use audio::{AudioManager, SoundEffect};
pub use camera::Camera;

use wasm_bindgen::JsValue;

/// Best-effort human readable text for a thrown JS value
pub(crate) fn describe_js_error(err: &JsValue) -> String {
    js_sys::Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{:?}", err))
}
