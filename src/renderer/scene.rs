//! Scene building
//!
//! Turns the current game state into a flat draw list. Pure: reads state,
//! writes nothing back.

use crate::advice::Hint;
use crate::consts::TREAT_SIZE;
use crate::sim::{Color, GameState, MouthState, Payload, Point, Treat};

/// Horizontal text anchor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    pub fn as_css(self) -> &'static str {
        match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        }
    }
}

/// One drawing primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCmd {
    /// Current camera frame stretched over the viewport
    Video { mirrored: bool },
    Rect {
        pos: Point,
        w: f32,
        h: f32,
        color: Color,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Color,
        /// `None` = filled, otherwise stroke width
        stroke: Option<f32>,
    },
    Text {
        pos: Point,
        text: String,
        size: f32,
        color: Color,
        align: Align,
    },
}

/// Draw list for one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCmd>,
}

/// HUD inputs that don't live in `GameState`
#[derive(Debug, Clone, Copy)]
pub struct HudView<'a> {
    pub hint: &'a Hint,
    pub speaking: bool,
    pub show_mouth: bool,
    pub mirrored: bool,
    pub capture_radius: f32,
}

const OVERLAY: Color = Color::rgba(0.0, 0.0, 0.0, 0.25);
const PANEL: Color = Color::rgba(0.0, 0.0, 0.0, 0.55);
const MOUTH_OPEN: Color = Color::rgba(0.3, 0.95, 0.4, 0.9);
const MOUTH_CLOSED: Color = Color::rgba(1.0, 0.35, 0.35, 0.7);
const MOUTH_LOST: Color = Color::rgba(0.7, 0.7, 0.7, 0.5);
const HINT_ERROR: Color = Color::rgb(1.0, 0.8, 0.5);

/// Build the draw list for the current frame
pub fn build_scene(state: &GameState, mouth: &MouthState, hud: &HudView) -> Scene {
    let width = state.viewport.width;
    let height = state.viewport.height;
    let mut commands = Vec::with_capacity(8 + state.store.treats().len() * 2 + state.store.particles().len());

    commands.push(DrawCmd::Video { mirrored: hud.mirrored });
    commands.push(DrawCmd::Rect {
        pos: Point::ZERO,
        w: width,
        h: height,
        color: OVERLAY,
    });

    if hud.show_mouth {
        let color = match (mouth.detected, mouth.open) {
            (false, _) => MOUTH_LOST,
            (true, true) => MOUTH_OPEN,
            (true, false) => MOUTH_CLOSED,
        };
        commands.push(DrawCmd::Circle {
            center: mouth.pos,
            radius: hud.capture_radius,
            color,
            stroke: Some(if mouth.open { 4.0 } else { 2.0 }),
        });
    }

    for treat in state.store.treats().iter().filter(|t| t.active) {
        push_treat(&mut commands, treat);
    }

    for particle in state.store.particles() {
        commands.push(DrawCmd::Circle {
            center: particle.pos,
            radius: particle.size * particle.life.max(0.2),
            color: particle.color.with_alpha(particle.life.clamp(0.0, 1.0)),
            stroke: None,
        });
    }

    push_hud(&mut commands, state, hud, width, height);

    Scene {
        width,
        height,
        commands,
    }
}

fn push_treat(commands: &mut Vec<DrawCmd>, treat: &Treat) {
    commands.push(DrawCmd::Text {
        pos: treat.pos,
        text: treat.kind.glyph().to_string(),
        size: TREAT_SIZE,
        color: Color::WHITE,
        align: Align::Center,
    });
    let label = match &treat.payload {
        Payload::Word { word, .. } => word.clone(),
        Payload::Points(points) => format!("+{}", points),
    };
    commands.push(DrawCmd::Text {
        pos: treat.pos + Point::new(0.0, TREAT_SIZE * 0.8),
        text: label,
        size: 18.0,
        color: Color::WHITE,
        align: Align::Center,
    });
}

fn push_hud(commands: &mut Vec<DrawCmd>, state: &GameState, hud: &HudView, width: f32, height: f32) {
    // Score
    commands.push(DrawCmd::Text {
        pos: Point::new(20.0, 40.0),
        text: format!("Score: {}", state.score),
        size: 28.0,
        color: Color::WHITE,
        align: Align::Left,
    });
    if state.combo > 1 {
        commands.push(DrawCmd::Text {
            pos: Point::new(20.0, 72.0),
            text: format!("Combo {}  x{:.1}", state.combo, state.multiplier()),
            size: 20.0,
            color: Color::rgb(1.0, 0.85, 0.3),
            align: Align::Left,
        });
    }

    // Quiz target
    if let Some(quiz) = &state.quiz {
        let item = quiz.current();
        commands.push(DrawCmd::Rect {
            pos: Point::new(width / 2.0 - 110.0, 10.0),
            w: 220.0,
            h: 100.0,
            color: PANEL,
        });
        commands.push(DrawCmd::Text {
            pos: Point::new(width / 2.0, 60.0),
            text: item.glyph.clone(),
            size: 48.0,
            color: Color::WHITE,
            align: Align::Center,
        });
        commands.push(DrawCmd::Text {
            pos: Point::new(width / 2.0, 98.0),
            text: item.hint.clone(),
            size: 18.0,
            color: Color::rgb(0.8, 0.9, 1.0),
            align: Align::Center,
        });
        commands.push(DrawCmd::Text {
            pos: Point::new(width / 2.0, 134.0),
            text: format!("✔ {}  ✘ {}", state.stats.correct_words, state.stats.wrong_words),
            size: 20.0,
            color: Color::WHITE,
            align: Align::Center,
        });
    }

    if hud.speaking {
        commands.push(DrawCmd::Text {
            pos: Point::new(width - 20.0, 40.0),
            text: "🔊".to_string(),
            size: 28.0,
            color: Color::WHITE,
            align: Align::Right,
        });
    }

    // Advice hint
    commands.push(DrawCmd::Rect {
        pos: Point::new(0.0, height - 70.0),
        w: width,
        h: 70.0,
        color: PANEL,
    });
    commands.push(DrawCmd::Text {
        pos: Point::new(width / 2.0, height - 42.0),
        text: hud.hint.message.clone(),
        size: 20.0,
        color: if hud.hint.is_error { HINT_ERROR } else { Color::WHITE },
        align: Align::Center,
    });
    if let Some(rationale) = &hud.hint.rationale {
        commands.push(DrawCmd::Text {
            pos: Point::new(width / 2.0, height - 16.0),
            text: rationale.clone(),
            size: 14.0,
            color: Color::rgb(0.75, 0.75, 0.75),
            align: Align::Center,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::{TreatKind, Viewport};
    use glam::Vec2;

    fn hud(hint: &Hint) -> HudView<'_> {
        HudView {
            hint,
            speaking: false,
            show_mouth: true,
            mirrored: true,
            capture_radius: 70.0,
        }
    }

    fn texts(scene: &Scene) -> Vec<&str> {
        scene
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCmd::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_scene_reflects_store() {
        let config = GameConfig::points();
        let mut state = GameState::new(1, &config, Viewport::default(), 64);
        state
            .store
            .spawn_treat(TreatKind::Cherry, Payload::Points(100), Vec2::new(100.0, 100.0), 1.0);
        state.score = 42;

        let hint = Hint::default();
        let scene = build_scene(&state, &MouthState::open_at(Vec2::new(50.0, 50.0)), &hud(&hint));
        assert!(matches!(scene.commands[0], DrawCmd::Video { mirrored: true }));
        let t = texts(&scene);
        assert!(t.contains(&"🍒"));
        assert!(t.contains(&"+100"));
        assert!(t.contains(&"Score: 42"));
        assert!(t.contains(&hint.message.as_str()));
    }

    #[test]
    fn test_scene_shows_quiz_target() {
        let config = GameConfig::words();
        let state = GameState::new(1, &config, Viewport::default(), 64);
        let hint = Hint::default();
        let scene = build_scene(&state, &MouthState::default(), &hud(&hint));
        let t = texts(&scene);
        assert!(t.contains(&"🍎"));
        assert!(t.contains(&"manzana"));
        assert!(t.contains(&"✔ 0  ✘ 0"));
    }

    #[test]
    fn test_scene_shows_word_tally() {
        let config = GameConfig::words();
        let mut state = GameState::new(1, &config, Viewport::default(), 64);
        state.stats.correct_words = 4;
        state.stats.wrong_words = 2;
        let hint = Hint::default();
        let scene = build_scene(&state, &MouthState::default(), &hud(&hint));
        assert!(texts(&scene).contains(&"✔ 4  ✘ 2"));
    }

    #[test]
    fn test_build_scene_does_not_mutate() {
        let config = GameConfig::points();
        let state = GameState::new(3, &config, Viewport::default(), 64);
        let before = state.store.treats().to_vec();
        let hint = Hint::fallback();
        let _ = build_scene(&state, &MouthState::default(), &hud(&hint));
        assert_eq!(state.store.treats(), before.as_slice());
    }
}
