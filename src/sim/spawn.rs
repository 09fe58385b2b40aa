//! Treat spawner
//!
//! Rolls once per tick for a new treat. Category comes from a weighted table
//! sampled by cumulative sum; word treats flip an independent coin for
//! carrying the target word.

use glam::Vec2;
use rand::Rng;

use super::state::{GameState, Payload, TreatKind};
use crate::config::{CategoryWeight, GameConfig, GameVariant};

/// Cumulative weight table over treat kinds
#[derive(Debug, Clone)]
pub struct CategoryTable {
    /// (kind, cumulative weight up to and including this kind)
    cumulative: Vec<(TreatKind, u32)>,
    total: u32,
}

impl CategoryTable {
    /// `None` when every weight is zero
    pub fn new(weights: &[CategoryWeight]) -> Option<Self> {
        let mut total = 0u32;
        let cumulative: Vec<(TreatKind, u32)> = weights
            .iter()
            .filter(|w| w.weight > 0)
            .map(|w| {
                total += w.weight;
                (w.kind, total)
            })
            .collect();
        if total == 0 {
            return None;
        }
        Some(Self { cumulative, total })
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// First kind whose cumulative weight exceeds `draw` (`draw < total`)
    pub fn sample(&self, draw: u32) -> TreatKind {
        self.cumulative
            .iter()
            .find(|&&(_, cum)| cum > draw)
            .or(self.cumulative.last())
            .map(|&(kind, _)| kind)
            .unwrap_or(TreatKind::Cupcake)
    }

    /// Sample with a uniform draw from `rng`
    pub fn pick(&self, rng: &mut impl Rng) -> TreatKind {
        self.sample(rng.random_range(0..self.total))
    }
}

/// Chance of spawning this tick given the frame scale (1.0 = one reference frame)
pub fn spawn_probability(chance_per_frame: f32, scale: f32) -> f32 {
    let chance = chance_per_frame.clamp(0.0, 1.0);
    if scale == 1.0 {
        chance
    } else {
        // Same expected rate per second at any frame delta
        1.0 - (1.0 - chance).powf(scale.max(0.0))
    }
}

/// Roll for a spawn this tick. Returns the new treat's id on success.
pub fn maybe_spawn(state: &mut GameState, config: &GameConfig, table: &CategoryTable, scale: f32) -> Option<u32> {
    let p = spawn_probability(config.spawn_chance, scale);
    if !state.rng.random_bool(p as f64) {
        return None;
    }
    Some(spawn_treat(state, config, table))
}

/// Spawn a treat unconditionally
pub fn spawn_treat(state: &mut GameState, config: &GameConfig, table: &CategoryTable) -> u32 {
    let kind = table.pick(&mut state.rng);

    let payload = match (config.variant, &state.quiz) {
        (GameVariant::Words, Some(quiz)) => {
            let (word, correct) = quiz.sample_word(&mut state.rng, config.correct_chance);
            Payload::Word { word, correct }
        }
        _ => Payload::Points(kind.points()),
    };

    // Keep the treat fully visible; collapse to center on a too-narrow viewport
    let width = state.viewport.width;
    let lo = config.spawn_margin.min(width / 2.0);
    let hi = (width - config.spawn_margin).max(lo);
    let x = if hi > lo {
        state.rng.random_range(lo..=hi)
    } else {
        lo
    };

    let velocity = if config.fall_speed_max > config.fall_speed_min {
        state
            .rng
            .random_range(config.fall_speed_min..=config.fall_speed_max)
    } else {
        config.fall_speed_min
    };

    let treat = state
        .store
        .spawn_treat(kind, payload, Vec2::new(x, -config.spawn_offset), velocity);
    let id = treat.id;
    state.stats.spawned += 1;
    log::debug!("Spawned treat {} ({:?}) at x={:.0} v={:.2}", id, kind, x, velocity);
    id
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Viewport;

    fn table() -> CategoryTable {
        CategoryTable::new(&GameConfig::points().category_weights).unwrap()
    }

    #[test]
    fn test_cumulative_boundaries() {
        // Weights 40, 30, 15, 8, 5, 2
        let t = table();
        assert_eq!(t.total(), 100);
        assert_eq!(t.sample(0), TreatKind::Cupcake);
        assert_eq!(t.sample(39), TreatKind::Cupcake);
        assert_eq!(t.sample(40), TreatKind::Cookie);
        assert_eq!(t.sample(69), TreatKind::Cookie);
        assert_eq!(t.sample(70), TreatKind::Donut);
        assert_eq!(t.sample(85), TreatKind::IceCream);
        assert_eq!(t.sample(93), TreatKind::Cake);
        assert_eq!(t.sample(98), TreatKind::Cherry);
        assert_eq!(t.sample(99), TreatKind::Cherry);
    }

    #[test]
    fn test_zero_weights_skipped() {
        let weights = [
            CategoryWeight { kind: TreatKind::Cupcake, weight: 0 },
            CategoryWeight { kind: TreatKind::Cake, weight: 3 },
        ];
        let t = CategoryTable::new(&weights).unwrap();
        assert_eq!(t.sample(0), TreatKind::Cake);
        assert!(CategoryTable::new(&weights[..1]).is_none());
    }

    #[test]
    fn test_spawn_probability_scaling() {
        assert_eq!(spawn_probability(0.02, 1.0), 0.02);
        assert_eq!(spawn_probability(0.02, 0.0), 0.0);
        // Two half-frames compound to one frame's chance
        let half = spawn_probability(0.02, 0.5);
        assert!(((1.0 - (1.0 - half).powi(2)) - 0.02).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_placement() {
        let config = GameConfig::points();
        let mut state = GameState::new(42, &config, Viewport::default(), 256);
        let t = table();
        for _ in 0..500 {
            spawn_treat(&mut state, &config, &t);
        }
        for treat in state.store.treats() {
            assert!(treat.pos.x >= config.spawn_margin);
            assert!(treat.pos.x <= state.viewport.width - config.spawn_margin);
            assert_eq!(treat.pos.y, -config.spawn_offset);
            assert!(treat.velocity >= config.fall_speed_min && treat.velocity <= config.fall_speed_max);
            assert_eq!(treat.payload, Payload::Points(treat.kind.points()));
        }
        assert_eq!(state.stats.spawned, 500);
    }

    #[test]
    fn test_word_spawn_follows_target() {
        let config = GameConfig::words();
        let mut state = GameState::new(9, &config, Viewport::default(), 256);
        let t = table();
        for _ in 0..300 {
            spawn_treat(&mut state, &config, &t);
        }
        let target = state.quiz.as_ref().unwrap().current().word.clone();
        let mut correct = 0;
        for treat in state.store.treats() {
            match &treat.payload {
                Payload::Word { word, correct: true } => {
                    assert_eq!(word, &target);
                    correct += 1;
                }
                Payload::Word { word, correct: false } => assert_ne!(word, &target),
                other => panic!("unexpected payload {:?}", other),
            }
        }
        // 30% nominal; loose bounds
        assert!(correct > 50 && correct < 140, "correct = {}", correct);
    }

    #[test]
    fn test_narrow_viewport_centers() {
        let config = GameConfig::points();
        let viewport = Viewport { width: 60.0, height: 400.0 };
        let mut state = GameState::new(1, &config, viewport, 64);
        let id = spawn_treat(&mut state, &config, &table());
        assert_eq!(state.store.get(id).unwrap().pos.x, 30.0);
    }
}
