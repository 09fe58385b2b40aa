//! Game state and core simulation types
//!
//! Everything the simulation tick mutates lives in `GameState`, owned by the
//! session and passed by reference to each phase.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::quiz::Quiz;
use super::store::EntityStore;
use crate::config::{GameConfig, GameVariant};
use crate::consts::*;

/// Screen-space position in pixels, origin top-left
pub type Point = Vec2;

/// Treat categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreatKind {
    Cupcake,
    Cookie,
    Donut,
    IceCream,
    Cake,
    Cherry,
}

impl TreatKind {
    pub const ALL: [TreatKind; 6] = [
        TreatKind::Cupcake,
        TreatKind::Cookie,
        TreatKind::Donut,
        TreatKind::IceCream,
        TreatKind::Cake,
        TreatKind::Cherry,
    ];

    /// Emoji drawn for this treat
    pub fn glyph(self) -> &'static str {
        match self {
            TreatKind::Cupcake => "🧁",
            TreatKind::Cookie => "🍪",
            TreatKind::Donut => "🍩",
            TreatKind::IceCream => "🍦",
            TreatKind::Cake => "🎂",
            TreatKind::Cherry => "🍒",
        }
    }

    /// Base points in the point-based variant (rarer is worth more)
    pub fn points(self) -> u32 {
        match self {
            TreatKind::Cupcake => 10,
            TreatKind::Cookie => 15,
            TreatKind::Donut => 25,
            TreatKind::IceCream => 40,
            TreatKind::Cake => 60,
            TreatKind::Cherry => 100,
        }
    }

    /// Default spawn weight (all weights sum to 100)
    pub fn default_weight(self) -> u32 {
        match self {
            TreatKind::Cupcake => 40,
            TreatKind::Cookie => 30,
            TreatKind::Donut => 15,
            TreatKind::IceCream => 8,
            TreatKind::Cake => 5,
            TreatKind::Cherry => 2,
        }
    }

    /// Particle color for bursts
    pub fn color(self) -> Color {
        match self {
            TreatKind::Cupcake => Color::rgb(1.0, 0.55, 0.75),
            TreatKind::Cookie => Color::rgb(0.8, 0.55, 0.3),
            TreatKind::Donut => Color::rgb(1.0, 0.7, 0.4),
            TreatKind::IceCream => Color::rgb(0.95, 0.95, 0.85),
            TreatKind::Cake => Color::rgb(1.0, 0.85, 0.3),
            TreatKind::Cherry => Color::rgb(0.9, 0.1, 0.2),
        }
    }
}

/// RGBA color, components in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const CORRECT: Color = Color::rgb(0.3, 0.9, 0.4);
    pub const WRONG: Color = Color::rgb(0.95, 0.25, 0.25);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// CSS `rgba(...)` string
    pub fn to_css(self) -> String {
        format!(
            "rgba({},{},{},{:.3})",
            (self.r.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.g.clamp(0.0, 1.0) * 255.0).round() as u8,
            (self.b.clamp(0.0, 1.0) * 255.0).round() as u8,
            self.a.clamp(0.0, 1.0)
        )
    }
}

/// What eating a treat is worth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Fixed point value (point-based variant)
    Points(u32),
    /// Vocabulary word; `correct` is relative to the target at spawn time
    Word { word: String, correct: bool },
}

impl Payload {
    pub fn word(&self) -> Option<&str> {
        match self {
            Payload::Word { word, .. } => Some(word),
            Payload::Points(_) => None,
        }
    }
}

/// A falling treat
#[derive(Debug, Clone, PartialEq)]
pub struct Treat {
    pub id: u32,
    pub pos: Point,
    pub kind: TreatKind,
    pub payload: Payload,
    pub active: bool,
    /// Fall speed (pixels per reference frame, always positive)
    pub velocity: f32,
}

/// A cosmetic particle
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Point,
    pub vel: Vec2,
    /// 1.0 at spawn, removed at <= 0
    pub life: f32,
    pub color: Color,
    pub size: f32,
}

/// Mouth state derived from the latest detection
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MouthState {
    pub pos: Point,
    pub open: bool,
    /// Normalized lip gap (basis-dependent)
    pub openness: f32,
    /// Whether a face was found on the latest detection
    pub detected: bool,
}

impl MouthState {
    pub fn open_at(pos: Point) -> Self {
        Self {
            pos,
            open: true,
            openness: 1.0,
            detected: true,
        }
    }

    pub fn closed_at(pos: Point) -> Self {
        Self {
            pos,
            open: false,
            openness: 0.0,
            detected: true,
        }
    }
}

/// Visible play area in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

/// Session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub spawned: u32,
    pub eaten: u32,
    pub missed: u32,
    pub correct_words: u32,
    pub wrong_words: u32,
}

/// Complete game state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub viewport: Viewport,
    pub store: EntityStore,
    /// Never negative; penalties floor at zero
    pub score: u64,
    /// Consecutive catches without a miss (point-based variant)
    pub combo: u32,
    /// Active vocabulary target (word-matching variant only)
    pub quiz: Option<Quiz>,
    pub stats: Stats,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulation skipped while set (hidden tab)
    pub paused: bool,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64, config: &GameConfig, viewport: Viewport, max_particles: usize) -> Self {
        let quiz = match config.variant {
            GameVariant::Words => Some(Quiz::default_vocabulary()),
            GameVariant::Points => None,
        };
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            viewport,
            store: EntityStore::new(max_particles),
            score: 0,
            combo: 0,
            quiz,
            stats: Stats::default(),
            time_ticks: 0,
            paused: false,
        }
    }

    /// Current score multiplier from the combo counter
    pub fn multiplier(&self) -> f32 {
        combo_multiplier(self.combo)
    }

    /// Vertical position past which a treat counts as missed
    pub fn miss_line(&self, config: &GameConfig) -> f32 {
        self.viewport.height + config.prune_margin
    }
}

/// Multiplier for a combo count: 1.0 until two catches in a row, then +0.1 per
/// catch up to 3.0
pub fn combo_multiplier(combo: u32) -> f32 {
    if combo < 2 {
        1.0
    } else {
        (1.0 + (combo - 1) as f32 * COMBO_STEP).min(COMBO_MAX_MULTIPLIER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combo_multiplier() {
        assert_eq!(combo_multiplier(0), 1.0);
        assert_eq!(combo_multiplier(1), 1.0);
        assert!((combo_multiplier(2) - 1.1).abs() < 1e-6);
        assert_eq!(combo_multiplier(500), COMBO_MAX_MULTIPLIER);
    }

    #[test]
    fn test_color_css() {
        assert_eq!(Color::rgb(1.0, 0.0, 0.0).to_css(), "rgba(255,0,0,1.000)");
        assert_eq!(Color::WHITE.with_alpha(0.5).to_css(), "rgba(255,255,255,0.500)");
    }

    #[test]
    fn test_new_state_per_variant() {
        let points = GameState::new(1, &GameConfig::points(), Viewport::default(), 256);
        assert!(points.quiz.is_none());
        let words = GameState::new(1, &GameConfig::words(), Viewport::default(), 256);
        assert!(words.quiz.is_some());
        assert_eq!(words.score, 0);
        assert!(words.store.treats().is_empty());
    }
}
