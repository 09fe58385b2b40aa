//! Munch Quiz entry point
//!
//! Handles platform-specific initialization and runs the game loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, HtmlVideoElement};

    use munch_quiz::advice::{AdviceContext, AdviceRequest};
    use munch_quiz::consts::REFERENCE_FPS;
    use munch_quiz::error::{AdviceError, SpeechError};
    use munch_quiz::platform::{AudioManager, Camera, SoundEffect, detector, net};
    use munch_quiz::renderer::{CanvasRenderer, HudView, build_scene};
    use munch_quiz::session::InboxKind;
    use munch_quiz::sim::{TickInput, Viewport};
    use munch_quiz::tracker::MouthTracker;
    use munch_quiz::{GameConfig, GameVariant, InitError, Session, Settings};

    /// How long to wait for the page to load the landmark model
    const DETECTOR_TIMEOUT_MS: u32 = 20_000;

    /// Game instance holding all state
    struct Game {
        session: Session,
        tracker: MouthTracker,
        renderer: CanvasRenderer,
        camera: Camera,
        audio: AudioManager,
        settings: Settings,
        last_time: f64,
        raf_handle: Option<i32>,
        detect_handle: Option<i32>,
    }

    impl Game {
        /// Detector tick: landmarks to mouth state
        fn detect(&mut self, now_ms: f64) {
            if self.session.is_closed() || self.session.state().paused {
                return;
            }
            let face = detector::detect(self.camera.video(), now_ms);
            self.tracker.update(face.as_ref(), self.session.state().viewport);
        }

        /// Render tick: simulate, draw, then hand off async work
        fn update(&mut self, time: f64) {
            self.fit_canvas();

            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                1.0 / REFERENCE_FPS
            };
            self.last_time = time;

            let input = TickInput {
                mouth: self.tracker.latest(),
                dt,
            };
            let out = self.session.frame(time / 1000.0, &input);

            for event in &out.events {
                if let Some(effect) = SoundEffect::for_event(event) {
                    self.audio.play(effect);
                }
            }

            let scene = build_scene(
                self.session.state(),
                &input.mouth,
                &HudView {
                    hint: self.session.hint(),
                    speaking: self.session.speech().is_playing(),
                    show_mouth: self.settings.show_mouth,
                    mirrored: self.session.config().mirror,
                    capture_radius: self.session.config().capture_radius,
                },
            );
            self.renderer.draw(&scene);

            // Screenshot is taken from the frame just drawn
            if let Some(context) = out.advice {
                self.send_advice(context);
            }
            if let Some(word) = out.speak {
                self.speak(word);
            }
        }

        fn send_advice(&self, context: AdviceContext) {
            let inbox = self.session.inbox();
            let generation = self.session.generation();
            let Some(endpoint) = self.session.config().advice_endpoint.clone() else {
                return;
            };
            match self.renderer.snapshot() {
                Some(image) => {
                    log::debug!("Requesting advice ({} treats)", context.treats.len());
                    net::request_advice(endpoint, AdviceRequest { image, context }, inbox, generation);
                }
                None => inbox.push(
                    generation,
                    InboxKind::AdviceFailed(AdviceError::Transport("screenshot unavailable".to_string())),
                ),
            }
        }

        fn speak(&self, word: String) {
            let inbox = self.session.inbox();
            let generation = self.session.generation();
            let endpoint = self.session.config().speech_endpoint.clone();
            match (endpoint, self.audio.context()) {
                (Some(endpoint), Some(ctx)) => {
                    net::pronounce(endpoint, word, ctx, self.audio.voice_volume(), inbox, generation)
                }
                _ => inbox.push(
                    generation,
                    InboxKind::SpeechFailed {
                        word,
                        error: SpeechError::Transport("audio output unavailable".to_string()),
                    },
                ),
            }
        }

        /// Keep the canvas backing store matched to its layout size
        fn fit_canvas(&mut self) {
            let Some((w, h)) = canvas_client_size() else { return };
            if (w, h) != self.renderer.size() && w > 0 && h > 0 {
                self.renderer.resize(w, h);
                self.session.resize(Viewport {
                    width: w as f32,
                    height: h as f32,
                });
            }
        }

        fn set_hidden(&mut self, hidden: bool) {
            self.session.set_paused(hidden);
            if self.settings.mute_on_blur {
                self.audio.set_muted(hidden);
            }
            // Avoid a huge delta on the first frame back
            self.last_time = 0.0;
            log::info!("{}", if hidden { "Paused (tab hidden)" } else { "Resumed" });
        }

        fn restart(&mut self, seed: u64) {
            self.session.restart(seed);
            self.last_time = 0.0;
        }

        /// Release everything; nothing runs afterwards
        fn teardown(&mut self) {
            let Some(window) = web_sys::window() else { return };
            if let Some(handle) = self.raf_handle.take() {
                let _ = window.cancel_animation_frame(handle);
            }
            if let Some(handle) = self.detect_handle.take() {
                window.clear_interval_with_handle(handle);
            }
            self.camera.stop();
            self.audio.close();
            self.session.teardown();
        }

        /// Update HUD elements in DOM
        fn update_hud(&self) {
            let Some(document) = web_sys::window().and_then(|w| w.document()) else {
                return;
            };
            let state = self.session.state();

            if let Some(el) = document.query_selector("#hud-score .hud-value").ok().flatten() {
                el.set_text_content(Some(&state.score.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-eaten .hud-value").ok().flatten() {
                el.set_text_content(Some(&state.stats.eaten.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-missed .hud-value").ok().flatten() {
                el.set_text_content(Some(&state.stats.missed.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-correct .hud-value").ok().flatten() {
                el.set_text_content(Some(&state.stats.correct_words.to_string()));
            }
            if let Some(el) = document.query_selector("#hud-wrong .hud-value").ok().flatten() {
                el.set_text_content(Some(&state.stats.wrong_words.to_string()));
            }
            if let Some(el) = document.get_element_by_id("pause-overlay") {
                let class = if state.paused { "" } else { "hidden" };
                let _ = el.set_attribute("class", class);
            }
        }
    }

    fn canvas_client_size() -> Option<(u32, u32)> {
        let canvas: HtmlCanvasElement = web_sys::window()?
            .document()?
            .get_element_by_id("canvas")?
            .dyn_into()
            .ok()?;
        Some((canvas.client_width().max(0) as u32, canvas.client_height().max(0) as u32))
    }

    /// Page config from `<script id="game-config">`, variant from the URL hash
    fn load_config(document: &web_sys::Document) -> Result<GameConfig, InitError> {
        let json = document
            .get_element_by_id("game-config")
            .and_then(|el| el.text_content());
        let variant = web_sys::window()
            .and_then(|w| w.location().hash().ok())
            .and_then(|hash| GameVariant::from_str(&hash));
        Ok(GameConfig::resolve(json.as_deref(), variant)?)
    }

    fn show_fatal(err: &InitError) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        if let Some(loading) = document.get_element_by_id("loading") {
            loading.set_text_content(Some(&err.to_string()));
            let _ = loading.set_attribute("class", "error");
        }
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("Munch Quiz starting...");

        if let Err(err) = start().await {
            log::error!("{}", err);
            show_fatal(&err);
        }
    }

    async fn start() -> Result<(), InitError> {
        let window = web_sys::window().ok_or(InitError::MissingElement("window"))?;
        let document = window.document().ok_or(InitError::MissingElement("document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .and_then(|el| el.dyn_into().ok())
            .ok_or(InitError::MissingElement("canvas"))?;
        let video: HtmlVideoElement = document
            .get_element_by_id("video")
            .and_then(|el| el.dyn_into().ok())
            .ok_or(InitError::MissingElement("video"))?;

        let config = load_config(&document)?;
        let settings = Settings::load();

        let camera = Camera::open(&video).await?;
        if let Err(err) = detector::ready(DETECTOR_TIMEOUT_MS).await {
            camera.stop();
            return Err(err);
        }

        let renderer = CanvasRenderer::new(canvas.clone(), video)?;
        let width = canvas.client_width().max(1) as u32;
        let height = canvas.client_height().max(1) as u32;
        renderer.resize(width, height);
        let viewport = Viewport {
            width: width as f32,
            height: height as f32,
        };

        let seed = js_sys::Date::now() as u64;
        let tracker = MouthTracker::new(config.tracker());
        let detect_interval_ms = config.detect_interval_ms;
        let session = Session::new(config, &settings, seed, viewport)?;

        if let Some(loading) = document.get_element_by_id("loading") {
            let _ = loading.set_attribute("class", "hidden");
        }

        let game = Rc::new(RefCell::new(Game {
            session,
            tracker,
            renderer,
            camera,
            audio: AudioManager::new(&settings),
            settings,
            last_time: 0.0,
            raf_handle: None,
            detect_handle: None,
        }));

        log::info!("Game initialized with seed: {}", seed);

        setup_detection(game.clone(), detect_interval_ms)?;
        setup_input_handlers(game.clone());
        setup_auto_pause(game.clone());
        setup_teardown(game.clone());

        request_animation_frame(game);

        log::info!("Munch Quiz running!");
        Ok(())
    }

    /// Detector tick on its own interval, decoupled from rendering
    fn setup_detection(game: Rc<RefCell<Game>>, interval_ms: u32) -> Result<(), InitError> {
        let window = web_sys::window().ok_or(InitError::MissingElement("window"))?;
        let performance = window.performance();
        let tick_game = game.clone();
        let closure = Closure::<dyn FnMut()>::new(move || {
            let now = performance.as_ref().map(|p| p.now()).unwrap_or_else(js_sys::Date::now);
            tick_game.borrow_mut().detect(now);
        });
        let handle = window
            .set_interval_with_callback_and_timeout_and_arguments_0(
                closure.as_ref().unchecked_ref(),
                interval_ms as i32,
            )
            .map_err(|_| InitError::DetectorUnavailable("could not schedule detection".to_string()))?;
        closure.forget();
        game.borrow_mut().detect_handle = Some(handle);
        Ok(())
    }

    fn setup_input_handlers(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };

        // Any click unlocks audio
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow().audio.resume();
            });
            let _ = window.add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: web_sys::KeyboardEvent| {
                let mut g = game.borrow_mut();
                g.audio.resume();
                match event.key().as_str() {
                    "r" | "R" => {
                        let seed = js_sys::Date::now() as u64;
                        g.restart(seed);
                    }
                    "m" | "M" => {
                        g.settings.show_mouth = !g.settings.show_mouth;
                        g.settings.save();
                    }
                    "q" | "Q" => {
                        g.settings.quality = g.settings.quality.next();
                        g.settings.save();
                        let cap = g.settings.max_particles();
                        g.session.set_max_particles(cap);
                        log::info!("Quality {} (applies on restart)", g.settings.quality.as_str());
                    }
                    _ => {}
                }
            });
            let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Restart button
        if let Some(btn) = window
            .document()
            .and_then(|d| d.get_element_by_id("restart-btn"))
        {
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                let seed = js_sys::Date::now() as u64;
                game.borrow_mut().restart(seed);
            });
            let _ = btn.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_auto_pause(game: Rc<RefCell<Game>>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            let hidden = document_clone.visibility_state() == web_sys::VisibilityState::Hidden;
            game.borrow_mut().set_hidden(hidden);
        });
        let _ = document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_teardown(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            game.borrow_mut().teardown();
        });
        let _ = window.add_event_listener_with_callback("pagehide", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let handle_game = game.clone();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let handle = window
            .request_animation_frame(closure.as_ref().unchecked_ref())
            .ok();
        closure.forget();
        handle_game.borrow_mut().raf_handle = handle;
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();
            if g.session.is_closed() {
                return;
            }
            g.update(time);
            g.update_hud();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_game::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Munch Quiz (native) starting...");
    log::info!("No camera natively - running a scripted headless session");

    for variant in [munch_quiz::GameVariant::Points, munch_quiz::GameVariant::Words] {
        if let Err(err) = headless::run(variant, 7, 60 * 60) {
            log::error!("{}", err);
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// Scripted session driven by a synthetic mouth path
#[cfg(not(target_arch = "wasm32"))]
mod headless {
    use glam::Vec2;
    use munch_quiz::sim::{MouthState, TickInput, Viewport};
    use munch_quiz::{ConfigError, GameConfig, GameVariant, Session, Settings};

    pub fn run(variant: GameVariant, seed: u64, frames: u32) -> Result<(), ConfigError> {
        let config = GameConfig::for_variant(variant);
        let viewport = Viewport::default();
        let mut session = Session::new(config, &Settings::default(), seed, viewport)?;

        let dt = 1.0 / 60.0;
        for frame in 0..frames {
            let t = frame as f32 * dt;
            // Sweep side to side, mouth open for half of every second
            let x = viewport.width * (0.5 + 0.4 * (t * 0.7).sin());
            let pos = Vec2::new(x, viewport.height * 0.7);
            let mouth = if t.fract() < 0.5 {
                MouthState::open_at(pos)
            } else {
                MouthState::closed_at(pos)
            };

            session.frame(t as f64, &TickInput { mouth, dt });
        }

        let state = session.state();
        log::info!(
            "{:?}: score {} after {} frames (spawned {}, eaten {}, missed {}, words {}/{})",
            variant,
            state.score,
            frames,
            state.stats.spawned,
            state.stats.eaten,
            state.stats.missed,
            state.stats.correct_words,
            state.stats.correct_words + state.stats.wrong_words
        );
        session.teardown();
        Ok(())
    }
}
