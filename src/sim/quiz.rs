//! Vocabulary quiz for the word-matching variant
//!
//! The target walks a fixed ordered list and wraps around at the end.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// One vocabulary entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizItem {
    /// Picture shown as the prompt
    pub glyph: String,
    /// Word the player must eat
    pub word: String,
    /// Localized hint shown under the picture
    pub hint: String,
    pub category: String,
}

impl QuizItem {
    pub fn new(glyph: &str, word: &str, hint: &str, category: &str) -> Self {
        Self {
            glyph: glyph.to_string(),
            word: word.to_string(),
            hint: hint.to_string(),
            category: category.to_string(),
        }
    }
}

/// Ordered vocabulary with the active target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    items: Vec<QuizItem>,
    index: usize,
}

impl Quiz {
    /// Build a quiz; `None` for an empty list
    pub fn new(items: Vec<QuizItem>) -> Option<Self> {
        if items.is_empty() {
            return None;
        }
        Some(Self { items, index: 0 })
    }

    /// Built-in food and animal vocabulary (hints in Spanish)
    pub fn default_vocabulary() -> Self {
        let items = vec![
            QuizItem::new("🍎", "Apple", "manzana", "fruit"),
            QuizItem::new("🍌", "Banana", "plátano", "fruit"),
            QuizItem::new("🍇", "Grapes", "uvas", "fruit"),
            QuizItem::new("🍓", "Strawberry", "fresa", "fruit"),
            QuizItem::new("🥕", "Carrot", "zanahoria", "vegetable"),
            QuizItem::new("🌽", "Corn", "maíz", "vegetable"),
            QuizItem::new("🧀", "Cheese", "queso", "food"),
            QuizItem::new("🍞", "Bread", "pan", "food"),
            QuizItem::new("🐱", "Cat", "gato", "animal"),
            QuizItem::new("🐶", "Dog", "perro", "animal"),
            QuizItem::new("🐟", "Fish", "pez", "animal"),
            QuizItem::new("🐦", "Bird", "pájaro", "animal"),
        ];
        Self { items, index: 0 }
    }

    /// The active target
    pub fn current(&self) -> &QuizItem {
        &self.items[self.index]
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Move to the next target, wrapping at the end of the list
    pub fn advance(&mut self) -> &QuizItem {
        self.index = (self.index + 1) % self.items.len();
        self.current()
    }

    /// Does `word` match the active target
    pub fn is_target(&self, word: &str) -> bool {
        self.current().word == word
    }

    /// A word uniformly drawn from every entry except the target. `None` when
    /// the vocabulary has no other word.
    pub fn pick_wrong_word(&self, rng: &mut impl Rng) -> Option<&str> {
        let target = &self.current().word;
        let others: Vec<&QuizItem> = self.items.iter().filter(|i| &i.word != target).collect();
        if others.is_empty() {
            return None;
        }
        Some(&others[rng.random_range(0..others.len())].word)
    }

    /// Draw a word for a new treat: the target with probability
    /// `correct_chance`, otherwise a different word. Returns (word, correct).
    pub fn sample_word(&self, rng: &mut impl Rng, correct_chance: f32) -> (String, bool) {
        let want_correct = rng.random_bool(correct_chance.clamp(0.0, 1.0) as f64);
        if !want_correct {
            if let Some(word) = self.pick_wrong_word(rng) {
                return (word.to_string(), false);
            }
        }
        (self.current().word.clone(), true)
    }
}
