//! Long deterministic runs over seeded sessions

use std::collections::HashSet;

use rand::SeedableRng;
use rand_pcg::Pcg32;

use munch_quiz::sim::{CategoryTable, GameEvent, GameState, MouthState, TickInput, TreatKind, Viewport, spawn_treat, tick};
use munch_quiz::{GameConfig, TimingMode};

#[test]
fn weighted_sampling_converges() {
    let config = GameConfig::points();
    let table = CategoryTable::new(&config.category_weights).unwrap();
    let mut rng = Pcg32::seed_from_u64(0xC0FFEE);

    const DRAWS: usize = 100_000;
    let mut counts = [0usize; 6];
    for _ in 0..DRAWS {
        let kind = table.pick(&mut rng);
        let slot = TreatKind::ALL.iter().position(|k| *k == kind).unwrap();
        counts[slot] += 1;
    }

    for (kind, share) in config.weight_shares() {
        let slot = TreatKind::ALL.iter().position(|k| *k == kind).unwrap();
        let observed = counts[slot] as f64 / DRAWS as f64;
        assert!(
            (observed - share).abs() < 0.01,
            "{:?}: observed {:.4}, expected {:.4}",
            kind,
            observed,
            share
        );
    }
}

#[test]
fn thousand_treats_all_pruned() {
    let mut config = GameConfig::points();
    config.spawn_chance = 0.0;
    let table = CategoryTable::new(&config.category_weights).unwrap();
    let mut state = GameState::new(11, &config, Viewport::default(), 0);

    let first_id = state.store.peek_next_id();
    let spawned: HashSet<u32> = (0..1000).map(|_| spawn_treat(&mut state, &config, &table)).collect();
    assert_eq!(spawned.len(), 1000);

    let idle = TickInput {
        mouth: MouthState::default(),
        dt: 1.0 / 60.0,
    };
    let mut missed = HashSet::new();
    for _ in 0..1000 {
        for event in tick(&mut state, &config, &table, &idle) {
            if let GameEvent::Missed { id } = event {
                assert!(missed.insert(id), "treat {} missed twice", id);
            }
        }
        if state.store.treats().is_empty() {
            break;
        }
    }

    assert!(state.store.treats().is_empty());
    assert_eq!(missed, spawned);
    assert_eq!(state.stats.missed, 1000);
    assert_eq!(state.store.peek_next_id(), first_id + 1000);
    assert_eq!(state.score, 0);
}

#[test]
fn normalized_timing_is_refresh_rate_independent() {
    let mut config = GameConfig::points();
    config.timing = TimingMode::Normalized;
    config.spawn_chance = 0.0;
    let table = CategoryTable::new(&config.category_weights).unwrap();

    let fall = |fps: u32| {
        let mut state = GameState::new(1, &config, Viewport::default(), 0);
        let id = spawn_treat(&mut state, &config, &table);
        let start = state.store.get(id).unwrap().pos.y;
        let input = TickInput {
            mouth: MouthState::default(),
            dt: 1.0 / fps as f32,
        };
        // Half a second of wall-clock time
        for _ in 0..fps / 2 {
            tick(&mut state, &config, &table, &input);
        }
        state.store.get(id).unwrap().pos.y - start
    };

    let at_60 = fall(60);
    let at_120 = fall(120);
    assert!((at_60 - at_120).abs() < 0.01 * at_60, "{} vs {}", at_60, at_120);
}

#[test]
fn same_seed_same_session() {
    let config = GameConfig::words();
    let table = CategoryTable::new(&config.category_weights).unwrap();
    let run = || {
        let mut state = GameState::new(99, &config, Viewport::default(), 64);
        let mut log = Vec::new();
        for frame in 0..2000 {
            let x = 200.0 + (frame % 800) as f32;
            let input = TickInput {
                mouth: MouthState::open_at(glam::Vec2::new(x, 500.0)),
                dt: 1.0 / 60.0,
            };
            log.extend(tick(&mut state, &config, &table, &input));
        }
        (state.score, log)
    };
    assert_eq!(run(), run());
}
