//! Per-frame simulation tick
//!
//! Spawner, then physics (advance, prune), then collision resolution, then
//! particles. Rendering reads the result afterwards and never feeds back.

use super::collision::find_catches;
use super::spawn::{CategoryTable, maybe_spawn};
use super::state::{Color, GameState, MouthState, Payload, Treat, TreatKind};
use crate::config::{GameConfig, TimingMode};
use crate::consts::*;

/// Input for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// Latest mouth state (may be stale if the detector runs slower)
    pub mouth: MouthState,
    /// Measured frame delta in seconds
    pub dt: f32,
}

/// Something gameplay-relevant that happened during a tick
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Spawned { id: u32 },
    /// Fell past the bottom; no score effect
    Missed { id: u32 },
    /// Point treat eaten
    Eaten { id: u32, kind: TreatKind, awarded: u64 },
    /// Target word eaten
    CorrectWord { id: u32, word: String, awarded: u64 },
    /// Non-target word eaten
    WrongWord { id: u32, word: String, penalty: u64 },
    /// Quiz moved on; `cleared` treats were dropped from flight
    QuizAdvanced { word: String, cleared: usize },
    /// Play the pronunciation of this word
    Pronounce { word: String },
}

/// How many reference frames this tick represents
pub fn frame_scale(timing: TimingMode, dt: f32) -> f32 {
    match timing {
        TimingMode::FrameLocked => 1.0,
        TimingMode::Normalized => dt.clamp(0.0, MAX_FRAME_DT) * REFERENCE_FPS,
    }
}

/// Floor-at-zero penalty
#[inline]
pub fn apply_penalty(score: u64, penalty: u64) -> u64 {
    score.saturating_sub(penalty)
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, config: &GameConfig, table: &CategoryTable, input: &TickInput) -> Vec<GameEvent> {
    let mut events = Vec::new();
    if state.paused {
        return events;
    }

    state.time_ticks += 1;
    let scale = frame_scale(config.timing, input.dt);

    // --- SPAWN ---
    if let Some(id) = maybe_spawn(state, config, table, scale) {
        events.push(GameEvent::Spawned { id });
    }

    // --- PHYSICS ---
    let miss_line = state.miss_line(config);
    let missed = state.store.advance_and_prune(scale, miss_line);
    if !missed.is_empty() {
        state.combo = 0;
    }
    for treat in missed {
        state.stats.missed += 1;
        events.push(GameEvent::Missed { id: treat.id });
    }

    // --- COLLISIONS ---
    for id in find_catches(&input.mouth, state.store.treats(), config.capture_radius) {
        // An earlier catch this frame may have cleared the board
        let Some(treat) = state.store.consume(id) else {
            continue;
        };
        resolve_catch(state, config, treat, &mut events);
    }

    // --- PARTICLES ---
    state.store.advance_particles(scale, config.particle_decay);

    events
}

/// Apply the scoring outcome of one consumed treat and spawn its burst
pub fn resolve_catch(state: &mut GameState, config: &GameConfig, treat: Treat, events: &mut Vec<GameEvent>) {
    state.stats.eaten += 1;

    let burst_color = match &treat.payload {
        Payload::Points(points) => {
            state.combo += 1;
            let awarded = (*points as f32 * state.multiplier()).round() as u64;
            state.score += awarded;
            log::debug!("Ate {:?} for {} (combo {})", treat.kind, awarded, state.combo);
            events.push(GameEvent::Eaten {
                id: treat.id,
                kind: treat.kind,
                awarded,
            });
            treat.kind.color()
        }
        Payload::Word { word, .. } => {
            let is_target = state.quiz.as_ref().is_some_and(|q| q.is_target(word));
            if is_target {
                state.score += config.correct_reward;
                state.stats.correct_words += 1;
                events.push(GameEvent::CorrectWord {
                    id: treat.id,
                    word: word.clone(),
                    awarded: config.correct_reward,
                });
                events.push(GameEvent::Pronounce { word: word.clone() });

                // Stale words would all be wrong against the new target
                let cleared = state.store.clear_treats();
                if let Some(quiz) = state.quiz.as_mut() {
                    let next = quiz.advance().word.clone();
                    log::info!("Correct: {} -> next target {}", word, next);
                    events.push(GameEvent::QuizAdvanced { word: next, cleared });
                }
                Color::CORRECT
            } else {
                state.score = apply_penalty(state.score, config.wrong_penalty);
                state.stats.wrong_words += 1;
                log::debug!("Wrong word {} (score {})", word, state.score);
                events.push(GameEvent::WrongWord {
                    id: treat.id,
                    word: word.clone(),
                    penalty: config.wrong_penalty,
                });
                Color::WRONG
            }
        }
    };

    state
        .store
        .spawn_burst(treat.pos, burst_color, config.burst_count, &mut state.rng);
}
