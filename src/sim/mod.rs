//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (store order, ascending entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod quiz;
pub mod spawn;
pub mod state;
pub mod store;
pub mod tick;

pub use collision::{find_catches, mouth_catches, within_capture};
pub use quiz::{Quiz, QuizItem};
pub use spawn::{CategoryTable, maybe_spawn, spawn_probability, spawn_treat};
pub use state::{
    Color, GameState, MouthState, Particle, Payload, Point, Stats, Treat, TreatKind, Viewport,
    combo_multiplier,
};
pub use store::EntityStore;
pub use tick::{GameEvent, TickInput, apply_penalty, frame_scale, resolve_catch, tick};
