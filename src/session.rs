//! Game session
//!
//! Owns the game state and everything the simulation tick writes. Async work
//! (advice requests, pronunciation playback) never touches the session
//! directly: completions are queued on the `Inbox` and applied at the start
//! of the next frame. Each message carries the generation it was issued
//! under, so results that arrive after a restart or teardown are dropped.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::advice::{AdviceContext, AdviceDispatcher, AdviceResponse, Hint};
use crate::config::GameConfig;
use crate::error::{AdviceError, ConfigError, SpeechError};
use crate::settings::Settings;
use crate::sim::{CategoryTable, GameEvent, GameState, TickInput, Viewport, tick};
use crate::speech::SpeechState;

/// Async completion payloads
#[derive(Debug)]
pub enum InboxKind {
    AdviceReady(AdviceResponse),
    AdviceFailed(AdviceError),
    SpeechStarted { word: String },
    SpeechFinished { word: String },
    SpeechFailed { word: String, error: SpeechError },
}

#[derive(Debug)]
pub struct InboxMessage {
    pub generation: u32,
    pub kind: InboxKind,
}

/// Single-threaded queue shared with async completions. It also carries the
/// session's current generation so async work can stop early once stale.
#[derive(Debug, Clone, Default)]
pub struct Inbox {
    queue: Rc<RefCell<VecDeque<InboxMessage>>>,
    generation: Rc<Cell<u32>>,
}

impl Inbox {
    fn new(generation: u32) -> Self {
        let inbox = Self::default();
        inbox.generation.set(generation);
        inbox
    }

    /// Current session generation
    pub fn generation(&self) -> u32 {
        self.generation.get()
    }

    /// Whether work issued under `generation` is still wanted
    pub fn is_current(&self, generation: u32) -> bool {
        self.generation.get() == generation
    }

    fn bump_generation(&self) -> u32 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    pub fn push(&self, generation: u32, kind: InboxKind) {
        self.queue.borrow_mut().push_back(InboxMessage { generation, kind });
    }

    pub fn drain(&self) -> Vec<InboxMessage> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

/// What the platform has to act on after a frame
#[derive(Debug, Default)]
pub struct FrameOutput {
    pub events: Vec<GameEvent>,
    /// Capture a screenshot and send it with this context
    pub advice: Option<AdviceContext>,
    /// Fetch and play the pronunciation of this word
    pub speak: Option<String>,
}

/// One play session
pub struct Session {
    config: GameConfig,
    table: CategoryTable,
    max_particles: usize,
    state: GameState,
    advice: AdviceDispatcher,
    advice_enabled: bool,
    speech: SpeechState,
    hint: Hint,
    inbox: Inbox,
    closed: bool,
}

impl Session {
    pub fn new(config: GameConfig, settings: &Settings, seed: u64, viewport: Viewport) -> Result<Self, ConfigError> {
        config.validate()?;
        let table = CategoryTable::new(&config.category_weights)
            .ok_or_else(|| ConfigError::invalid("category_weights", "total weight is zero"))?;

        let max_particles = settings.max_particles();
        let state = GameState::new(seed, &config, viewport, max_particles);

        log::info!("Session started: {:?} variant, seed {}", config.variant, seed);
        Ok(Self {
            advice: AdviceDispatcher::new(config.advice_interval_secs),
            advice_enabled: config.advice_endpoint.is_some(),
            speech: SpeechState::new(settings.pronunciation && config.speech_endpoint.is_some()),
            table,
            max_particles,
            state,
            config,
            hint: Hint::default(),
            inbox: Inbox::new(1),
            closed: false,
        })
    }

    /// Run one simulation frame at wall-clock time `now` (seconds)
    pub fn frame(&mut self, now: f64, input: &TickInput) -> FrameOutput {
        if self.closed {
            return FrameOutput::default();
        }
        self.process_inbox();

        let events = tick(&mut self.state, &self.config, &self.table, input);

        let speak = events
            .iter()
            .rev()
            .find_map(|e| match e {
                GameEvent::Pronounce { word } => Some(word.clone()),
                _ => None,
            })
            .and_then(|word| self.speech.request(&word));

        let advice = if self.advice_enabled
            && !self.state.paused
            && self.advice.poll(now, self.state.store.active_treats(), self.generation())
        {
            Some(AdviceContext::from_state(&self.state))
        } else {
            None
        };

        FrameOutput {
            events,
            advice,
            speak,
        }
    }

    /// Apply queued async completions from the current generation
    fn process_inbox(&mut self) {
        let current = self.generation();
        for message in self.inbox.drain() {
            if message.generation != current {
                log::debug!("Dropping stale completion from generation {}", message.generation);
                // A stale advice reply still frees the request slot
                if matches!(message.kind, InboxKind::AdviceReady(_) | InboxKind::AdviceFailed(_)) {
                    self.advice.complete(message.generation);
                }
                continue;
            }
            match message.kind {
                InboxKind::AdviceReady(response) => {
                    self.advice.complete(current);
                    self.hint = Hint::from(response);
                }
                InboxKind::AdviceFailed(err) => {
                    log::warn!("{}", err);
                    self.advice.complete(current);
                    self.hint = Hint::fallback();
                }
                InboxKind::SpeechStarted { word } => self.speech.started(&word),
                InboxKind::SpeechFinished { word } => self.speech.finished(&word),
                InboxKind::SpeechFailed { word, error } => self.speech.failed(&word, &error),
            }
        }
    }

    /// Start over with a fresh state; pending completions are discarded
    pub fn restart(&mut self, seed: u64) {
        self.inbox.bump_generation();
        let viewport = self.state.viewport;
        self.state = GameState::new(seed, &self.config, viewport, self.max_particles);
        self.advice.reset();
        self.speech = SpeechState::new(self.speech.enabled());
        self.hint = Hint::default();
        self.closed = false;
        log::info!("Session restarted with seed {}", seed);
    }

    /// Stop the session; nothing mutates state afterwards
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.inbox.bump_generation();
        self.closed = true;
        // Everything queued is stale now
        self.process_inbox();
        log::info!("Session torn down at score {}", self.state.score);
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.paused = paused;
    }

    pub fn set_advice_enabled(&mut self, enabled: bool) {
        self.advice_enabled = enabled;
    }

    /// Particle cap for the next restart
    pub fn set_max_particles(&mut self, max_particles: usize) {
        self.max_particles = max_particles;
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.state.viewport = viewport;
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn hint(&self) -> &Hint {
        &self.hint
    }

    pub fn speech(&self) -> &SpeechState {
        &self.speech
    }

    /// Handle for async completions
    pub fn inbox(&self) -> Inbox {
        self.inbox.clone()
    }

    pub fn generation(&self) -> u32 {
        self.inbox.generation()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{MouthState, Payload, TreatKind};
    use glam::Vec2;

    fn session(config: GameConfig) -> Session {
        let mut s = Session::new(config, &Settings::default(), 77, Viewport::default()).unwrap();
        s.set_advice_enabled(true);
        s
    }

    fn idle() -> TickInput {
        TickInput {
            mouth: MouthState::default(),
            dt: 1.0 / 60.0,
        }
    }

    fn quiet_points() -> GameConfig {
        let mut c = GameConfig::points();
        c.spawn_chance = 0.0;
        c
    }

    #[test]
    fn test_advice_gated_on_treats() {
        let mut s = session(quiet_points());
        s.frame(0.0, &idle());
        assert!(s.frame(6.0, &idle()).advice.is_none());

        s.state.store.spawn_treat(TreatKind::Cake, Payload::Points(60), Vec2::new(100.0, 0.0), 0.1);
        assert!(s.frame(12.0, &idle()).advice.is_some());
    }

    #[test]
    fn test_advice_response_updates_hint_next_frame() {
        let mut s = session(quiet_points());
        s.state.store.spawn_treat(TreatKind::Cake, Payload::Points(60), Vec2::new(100.0, 0.0), 0.1);
        s.frame(0.0, &idle());
        assert!(s.frame(6.0, &idle()).advice.is_some());

        s.inbox().push(
            s.generation(),
            InboxKind::AdviceReady(AdviceResponse {
                message: "Tilt right".into(),
                rationale: None,
                target: None,
            }),
        );
        // Not applied until the next frame
        assert_ne!(s.hint().message, "Tilt right");
        s.frame(6.1, &idle());
        assert_eq!(s.hint().message, "Tilt right");
        assert!(!s.advice.in_flight());
    }

    #[test]
    fn test_advice_failure_shows_fallback() {
        let mut s = session(quiet_points());
        s.inbox().push(s.generation(), InboxKind::AdviceFailed(AdviceError::Status(500)));
        s.frame(0.0, &idle());
        assert!(s.hint().is_error);
        assert_eq!(s.hint().message, crate::advice::FALLBACK_MESSAGE);
    }

    #[test]
    fn test_stale_generation_dropped_after_restart() {
        let mut s = session(quiet_points());
        let old = s.generation();
        s.restart(5);
        s.inbox().push(
            old,
            InboxKind::AdviceReady(AdviceResponse {
                message: "old news".into(),
                rationale: None,
                target: None,
            }),
        );
        s.frame(0.0, &idle());
        assert_ne!(s.hint().message, "old news");
    }

    #[test]
    fn test_restart_keeps_advice_slot_until_old_reply() {
        let mut s = session(quiet_points());
        s.state.store.spawn_treat(TreatKind::Cake, Payload::Points(60), Vec2::new(100.0, 0.0), 0.1);
        s.frame(0.0, &idle());
        let old = s.generation();
        assert!(s.frame(6.0, &idle()).advice.is_some());

        s.restart(9);
        s.state.store.spawn_treat(TreatKind::Cake, Payload::Points(60), Vec2::new(100.0, 0.0), 0.1);
        s.frame(7.0, &idle());
        assert!(s.frame(13.0, &idle()).advice.is_none());

        // The old reply frees the slot but its hint is discarded
        s.inbox().push(
            old,
            InboxKind::AdviceReady(AdviceResponse {
                message: "old news".into(),
                rationale: None,
                target: None,
            }),
        );
        s.frame(13.5, &idle());
        assert_ne!(s.hint().message, "old news");
        assert!(!s.advice.in_flight());
        assert!(s.frame(19.0, &idle()).advice.is_some());
    }

    #[test]
    fn test_inbox_tracks_current_generation() {
        let mut s = session(quiet_points());
        let inbox = s.inbox();
        let first = s.generation();
        assert!(inbox.is_current(first));

        s.restart(3);
        assert!(!inbox.is_current(first));
        assert!(inbox.is_current(s.generation()));

        let second = s.generation();
        s.teardown();
        assert!(!inbox.is_current(second));
    }

    #[test]
    fn test_teardown_stops_everything() {
        let mut s = session(GameConfig::points());
        let inbox = s.inbox();
        let generation = s.generation();
        s.teardown();
        inbox.push(generation, InboxKind::AdviceFailed(AdviceError::Transport("late".into())));

        let out = s.frame(100.0, &idle());
        assert!(out.events.is_empty());
        assert!(out.advice.is_none());
        assert_eq!(s.state().time_ticks, 0);
        assert!(!s.hint().is_error);
    }

    #[test]
    fn test_correct_word_requests_pronunciation() {
        let mut config = GameConfig::words();
        config.spawn_chance = 0.0;
        config.speech_endpoint = Some("/speak".into());
        let mut s = session(config);
        let target = s.state().quiz.as_ref().unwrap().current().word.clone();
        s.state.store.spawn_treat(
            TreatKind::Cookie,
            Payload::Word { word: target.clone(), correct: true },
            Vec2::new(200.0, 200.0),
            1.0,
        );
        let out = s.frame(
            0.0,
            &TickInput {
                mouth: MouthState::open_at(Vec2::new(200.0, 201.0)),
                dt: 1.0 / 60.0,
            },
        );
        assert_eq!(out.speak.as_deref(), Some(target.as_str()));

        s.inbox().push(s.generation(), InboxKind::SpeechStarted { word: target.clone() });
        s.frame(0.1, &idle());
        assert!(s.speech().is_playing());
    }

    #[test]
    fn test_restart_keeps_speech_preference() {
        let mut config = quiet_points();
        config.speech_endpoint = Some("/speak".into());
        let mut settings = Settings::default();
        settings.pronunciation = false;
        let mut s = Session::new(config, &settings, 1, Viewport::default()).unwrap();
        assert!(!s.speech().enabled());
        s.set_max_particles(8);
        s.restart(2);
        assert!(!s.speech().enabled());
        assert_eq!(s.generation(), 2);
    }

    #[test]
    fn test_paused_session_skips_advice() {
        let mut s = session(quiet_points());
        s.state.store.spawn_treat(TreatKind::Cake, Payload::Points(60), Vec2::new(100.0, 0.0), 0.1);
        s.set_paused(true);
        s.frame(0.0, &idle());
        assert!(s.frame(6.0, &idle()).advice.is_none());
    }
}
