//! Rendering module
//!
//! `scene` builds a backend-independent draw list from game state; `canvas`
//! replays it onto a 2D canvas in the browser.

#[cfg(target_arch = "wasm32")]
pub mod canvas;
pub mod scene;

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasRenderer;
pub use scene::{Align, DrawCmd, HudView, Scene, build_scene};
