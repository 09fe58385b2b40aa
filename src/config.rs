//! Game tuning configuration
//!
//! Two presets cover the two game variants: point-based treats and
//! word-matching treats. Per-frame values are expressed against a 60 fps
//! reference frame; `TimingMode` decides whether they are applied per rendered
//! frame or scaled by the measured frame delta.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::TreatKind;
use crate::tracker::{NormalizationBasis, TrackerConfig};

/// Which scoring rules apply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GameVariant {
    /// Every treat carries a fixed point value
    #[default]
    Points,
    /// Treats carry vocabulary words; only the quiz target scores
    Words,
}

impl GameVariant {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim_start_matches('#').to_lowercase().as_str() {
            "points" | "treats" => Some(GameVariant::Points),
            "words" | "quiz" => Some(GameVariant::Words),
            _ => None,
        }
    }
}

/// How simulation steps relate to rendered frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimingMode {
    /// One tick advances one reference frame regardless of refresh rate
    #[default]
    FrameLocked,
    /// Velocities, spawn chance and particle decay scale with frame delta
    Normalized,
}

/// Spawn weight for one treat category
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeight {
    pub kind: TreatKind,
    pub weight: u32,
}

/// Complete game tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub variant: GameVariant,
    pub timing: TimingMode,

    // === Collision ===
    /// Mouth-to-treat distance that counts as a catch (pixels, exclusive)
    pub capture_radius: f32,

    // === Spawner ===
    /// Chance of spawning a treat per reference frame
    pub spawn_chance: f32,
    /// Fall speed range (pixels per reference frame)
    pub fall_speed_min: f32,
    pub fall_speed_max: f32,
    /// Horizontal inset from both viewport edges
    pub spawn_margin: f32,
    /// Distance above the viewport where treats appear
    pub spawn_offset: f32,
    /// Distance below the viewport before a treat counts as missed
    pub prune_margin: f32,
    pub category_weights: Vec<CategoryWeight>,

    // === Word matching ===
    /// Chance a spawned word treat carries the target word
    pub correct_chance: f32,
    pub correct_reward: u64,
    pub wrong_penalty: u64,

    // === Particles ===
    pub burst_count: usize,
    /// Life lost per reference frame (life starts at 1.0)
    pub particle_decay: f32,

    // === Gesture tracking ===
    pub open_threshold: f32,
    pub basis: NormalizationBasis,
    /// Mirror landmark x coordinates (selfie camera)
    pub mirror: bool,
    /// Detector cadence, decoupled from rendering
    pub detect_interval_ms: u32,

    // === External services ===
    pub advice_interval_secs: f64,
    pub advice_endpoint: Option<String>,
    pub speech_endpoint: Option<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::points()
    }
}

impl GameConfig {
    /// Point-based treats preset
    pub fn points() -> Self {
        Self {
            variant: GameVariant::Points,
            timing: TimingMode::FrameLocked,
            capture_radius: 70.0,
            spawn_chance: 0.02,
            fall_speed_min: 2.0,
            fall_speed_max: 5.0,
            spawn_margin: 50.0,
            spawn_offset: 50.0,
            prune_margin: 50.0,
            category_weights: TreatKind::ALL
                .iter()
                .map(|&kind| CategoryWeight {
                    kind,
                    weight: kind.default_weight(),
                })
                .collect(),
            correct_chance: 0.35,
            correct_reward: 10,
            wrong_penalty: 5,
            burst_count: 15,
            particle_decay: 0.02,
            open_threshold: 0.06,
            basis: NormalizationBasis::FaceHeight,
            mirror: true,
            detect_interval_ms: 100,
            advice_interval_secs: 6.0,
            advice_endpoint: None,
            speech_endpoint: None,
        }
    }

    /// Word-matching preset
    pub fn words() -> Self {
        Self {
            variant: GameVariant::Words,
            capture_radius: 60.0,
            spawn_chance: 0.015,
            fall_speed_min: 1.5,
            fall_speed_max: 3.5,
            correct_chance: 0.3,
            open_threshold: 0.045,
            basis: NormalizationBasis::FrameHeight,
            advice_interval_secs: 5.0,
            ..Self::points()
        }
    }

    /// Preset for a variant
    pub fn for_variant(variant: GameVariant) -> Self {
        match variant {
            GameVariant::Points => Self::points(),
            GameVariant::Words => Self::words(),
        }
    }

    /// Parse and validate a JSON config. Missing fields take the defaults of
    /// the preset named by `variant` (points if absent).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut value: serde_json::Value = serde_json::from_str(json)?;
        let named = value
            .get("variant")
            .and_then(|v| v.as_str())
            .and_then(GameVariant::from_str);
        // Hash-style spellings ("quiz", "#Words") are stored as the canonical name
        if let (Some(variant), Some(obj)) = (named, value.as_object_mut()) {
            obj.insert("variant".to_string(), serde_json::to_value(variant)?);
        }
        let variant = named.unwrap_or_default();

        // Overlay the supplied fields onto the variant's preset
        let mut merged = serde_json::to_value(Self::for_variant(variant))?;
        if let (Some(base), Some(overrides)) = (merged.as_object_mut(), value.as_object_mut()) {
            for (key, v) in std::mem::take(overrides) {
                base.insert(key, v);
            }
        }

        let config: Self = serde_json::from_value(merged)?;
        config.validate()?;
        Ok(config)
    }

    /// Page config (optional JSON) with an optional variant override from the
    /// URL hash. The override picks the preset the JSON is layered over.
    pub fn resolve(json: Option<&str>, variant: Option<GameVariant>) -> Result<Self, ConfigError> {
        let json = json.map(str::trim).filter(|j| !j.is_empty());
        match (json, variant) {
            (None, variant) => Ok(Self::for_variant(variant.unwrap_or_default())),
            (Some(json), None) => Self::from_json(json),
            (Some(json), Some(variant)) => {
                let mut value: serde_json::Value = serde_json::from_str(json)?;
                if let Some(obj) = value.as_object_mut() {
                    obj.insert("variant".to_string(), serde_json::to_value(variant)?);
                }
                Self::from_json(&value.to_string())
            }
        }
    }

    /// Check ranges that would otherwise break the simulation
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.capture_radius > 0.0) {
            return Err(ConfigError::invalid("capture_radius", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.spawn_chance) {
            return Err(ConfigError::invalid("spawn_chance", "must be within [0, 1]"));
        }
        if !(self.fall_speed_min > 0.0) {
            return Err(ConfigError::invalid("fall_speed_min", "must be positive"));
        }
        if self.fall_speed_max < self.fall_speed_min {
            return Err(ConfigError::invalid(
                "fall_speed_max",
                format!("{} is below fall_speed_min {}", self.fall_speed_max, self.fall_speed_min),
            ));
        }
        if self.spawn_margin < 0.0 {
            return Err(ConfigError::invalid("spawn_margin", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.correct_chance) {
            return Err(ConfigError::invalid("correct_chance", "must be within [0, 1]"));
        }
        if self.category_weights.iter().map(|c| c.weight).sum::<u32>() == 0 {
            return Err(ConfigError::invalid("category_weights", "total weight is zero"));
        }
        if !(self.particle_decay > 0.0) {
            return Err(ConfigError::invalid("particle_decay", "must be positive"));
        }
        if !(self.open_threshold > 0.0) {
            return Err(ConfigError::invalid("open_threshold", "must be positive"));
        }
        if self.detect_interval_ms == 0 {
            return Err(ConfigError::invalid("detect_interval_ms", "must be non-zero"));
        }
        if !(self.advice_interval_secs > 0.0) {
            return Err(ConfigError::invalid("advice_interval_secs", "must be positive"));
        }
        Ok(())
    }

    /// Gesture tracker settings derived from this config
    pub fn tracker(&self) -> TrackerConfig {
        TrackerConfig {
            open_threshold: self.open_threshold,
            basis: self.basis,
            mirror: self.mirror,
        }
    }

    /// Normalized weights as (kind, share) pairs
    pub fn weight_shares(&self) -> Vec<(TreatKind, f64)> {
        let total: u32 = self.category_weights.iter().map(|c| c.weight).sum();
        self.category_weights
            .iter()
            .map(|c| (c.kind, c.weight as f64 / total.max(1) as f64))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(GameConfig::points().validate().is_ok());
        assert!(GameConfig::words().validate().is_ok());
    }

    #[test]
    fn test_default_weights_sum_to_100() {
        let total: u32 = GameConfig::points()
            .category_weights
            .iter()
            .map(|c| c.weight)
            .sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_from_json_uses_variant_preset() {
        let config = GameConfig::from_json(r#"{ "variant": "words", "capture_radius": 65.0 }"#)
            .expect("valid config");
        assert_eq!(config.variant, GameVariant::Words);
        assert_eq!(config.capture_radius, 65.0);
        // Untouched fields come from the words preset
        assert_eq!(config.basis, NormalizationBasis::FrameHeight);
        assert_eq!(config.spawn_chance, 0.015);
    }

    #[test]
    fn test_resolve_hash_override() {
        let config = GameConfig::resolve(None, Some(GameVariant::Words)).unwrap();
        assert_eq!(config.variant, GameVariant::Words);

        let config = GameConfig::resolve(Some(r#"{ "mirror": false }"#), Some(GameVariant::Words)).unwrap();
        assert_eq!(config.variant, GameVariant::Words);
        assert!(!config.mirror);
        assert_eq!(config.correct_chance, GameConfig::words().correct_chance);

        let config = GameConfig::resolve(Some("  "), None).unwrap();
        assert_eq!(config.variant, GameVariant::Points);
    }

    #[test]
    fn test_from_json_accepts_variant_aliases() {
        let quiz = GameConfig::from_json(r#"{ "variant": "quiz" }"#).expect("quiz alias");
        assert_eq!(quiz.variant, GameVariant::Words);
        assert_eq!(quiz.capture_radius, GameConfig::words().capture_radius);

        let treats = GameConfig::from_json(r##"{ "variant": "#Treats", "capture_radius": 62.0 }"##)
            .expect("treats alias");
        assert_eq!(treats.variant, GameVariant::Points);
        assert_eq!(treats.capture_radius, 62.0);
    }

    #[test]
    fn test_from_json_rejects_bad_ranges() {
        let err = GameConfig::from_json(r#"{ "fall_speed_min": 4.0, "fall_speed_max": 1.0 }"#)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "fall_speed_max", .. }));

        let err = GameConfig::from_json(r#"{ "spawn_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "spawn_chance", .. }));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            GameConfig::from_json("not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_variant_from_hash() {
        assert_eq!(GameVariant::from_str("#words"), Some(GameVariant::Words));
        assert_eq!(GameVariant::from_str("Points"), Some(GameVariant::Points));
        assert_eq!(GameVariant::from_str("#nope"), None);
    }
}
