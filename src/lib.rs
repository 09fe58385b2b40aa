//! Munch Quiz - a camera-driven mouth muncher arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity store, spawner, collisions, per-frame tick)
//! - `tracker`: Face landmarks to mouth open/closed state
//! - `advice`: Rate-limited hint requests to an external advice service
//! - `speech`: Pronunciation playback state
//! - `session`: Owns the game state and the inbox of async completions
//! - `renderer`: Scene building (draw list) and the 2D canvas backend
//! - `platform`: Browser glue (camera, detector, audio, network)

pub mod advice;
pub mod config;
pub mod error;
#[cfg(target_arch = "wasm32")]
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;
pub mod speech;
pub mod tracker;

pub use config::{GameConfig, GameVariant, TimingMode};
pub use error::{AdviceError, ConfigError, InitError, SpeechError};
pub use session::{Inbox, Session};
pub use settings::{QualityPreset, Settings};

/// Game configuration constants
pub mod consts {
    /// Frame rate the per-frame tuning values are expressed against
    pub const REFERENCE_FPS: f32 = 60.0;
    /// Largest frame delta honored in normalized timing (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Default viewport (used by the headless runner and tests)
    pub const DEFAULT_WIDTH: f32 = 1280.0;
    pub const DEFAULT_HEIGHT: f32 = 720.0;

    /// Rendered glyph size of a treat (pixels)
    pub const TREAT_SIZE: f32 = 48.0;

    /// Particle gravity (pixels/frame²)
    pub const PARTICLE_GRAVITY: f32 = 0.15;
    /// Particle launch speed range (pixels/frame)
    pub const PARTICLE_SPEED_MIN: f32 = 2.0;
    pub const PARTICLE_SPEED_MAX: f32 = 6.0;
    /// Particle size range (pixels)
    pub const PARTICLE_SIZE_MIN: f32 = 3.0;
    pub const PARTICLE_SIZE_MAX: f32 = 7.0;

    /// Combo multiplier growth per consecutive catch, and its ceiling
    pub const COMBO_STEP: f32 = 0.1;
    pub const COMBO_MAX_MULTIPLIER: f32 = 3.0;
}
