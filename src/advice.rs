//! Advice dispatcher
//!
//! Every interval tick, if a treat is on screen and no request is already in
//! flight, the platform captures a screenshot and posts it with a short game
//! summary to the advice service. Responses land in the session inbox; a
//! failure shows the fallback message and waits for the next interval tick.

use serde::{Deserialize, Serialize};

use crate::error::AdviceError;
use crate::sim::{GameState, Payload, Stats, TreatKind};

/// Shown whenever the advice service cannot be reached or understood
pub const FALLBACK_MESSAGE: &str = "Keep munching! Hints are taking a snack break.";

/// Shown before the first response arrives
pub const WELCOME_MESSAGE: &str = "Open your mouth wide to eat the falling treats!";

/// Summary of one treat for the advice request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreatSummary {
    pub kind: TreatKind,
    pub x: f32,
    pub y: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<u32>,
}

/// Active quiz target for the advice request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetSummary {
    pub word: String,
    pub hint: String,
    pub category: String,
}

/// Serializable game context sent alongside the screenshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdviceContext {
    pub score: u64,
    pub combo: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<TargetSummary>,
    pub treats: Vec<TreatSummary>,
    pub stats: Stats,
}

impl AdviceContext {
    pub fn from_state(state: &GameState) -> Self {
        let treats = state
            .store
            .treats()
            .iter()
            .filter(|t| t.active)
            .map(|t| TreatSummary {
                kind: t.kind,
                x: t.pos.x.round(),
                y: t.pos.y.round(),
                word: t.payload.word().map(str::to_string),
                points: match t.payload {
                    Payload::Points(p) => Some(p),
                    Payload::Word { .. } => None,
                },
            })
            .collect();
        let target = state.quiz.as_ref().map(|q| {
            let item = q.current();
            TargetSummary {
                word: item.word.clone(),
                hint: item.hint.clone(),
                category: item.category.clone(),
            }
        });
        Self {
            score: state.score,
            combo: state.combo,
            target,
            treats,
            stats: state.stats,
        }
    }
}

/// Request body posted to the advice service
#[derive(Debug, Clone, Serialize)]
pub struct AdviceRequest {
    /// Screenshot as a `data:image/...;base64,` URL
    pub image: String,
    pub context: AdviceContext,
}

/// Optional structured target suggested by the service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdviceTarget {
    #[serde(default)]
    pub word: Option<String>,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
}

/// Response from the advice service
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdviceResponse {
    pub message: String,
    #[serde(default, alias = "explanation")]
    pub rationale: Option<String>,
    #[serde(default)]
    pub target: Option<AdviceTarget>,
}

/// Parse a response body. Generated replies sometimes wrap the JSON object in
/// prose or code fences, so the outermost `{...}` is tried as well.
pub fn parse_response(body: &str) -> Result<AdviceResponse, AdviceError> {
    let trimmed = body.trim();
    let parsed = serde_json::from_str::<AdviceResponse>(trimmed).or_else(|first| {
        match (trimmed.find('{'), trimmed.rfind('}')) {
            (Some(start), Some(end)) if end > start => {
                serde_json::from_str::<AdviceResponse>(&trimmed[start..=end])
            }
            _ => Err(first),
        }
    });
    let response = parsed.map_err(|e| AdviceError::Parse(e.to_string()))?;
    if response.message.trim().is_empty() {
        return Err(AdviceError::Parse("empty message".to_string()));
    }
    Ok(response)
}

/// Hint currently displayed to the player
#[derive(Debug, Clone, PartialEq)]
pub struct Hint {
    pub message: String,
    pub rationale: Option<String>,
    /// Set when this is the fallback after a failure
    pub is_error: bool,
}

impl Default for Hint {
    fn default() -> Self {
        Self {
            message: WELCOME_MESSAGE.to_string(),
            rationale: None,
            is_error: false,
        }
    }
}

impl Hint {
    pub fn fallback() -> Self {
        Self {
            message: FALLBACK_MESSAGE.to_string(),
            rationale: None,
            is_error: true,
        }
    }
}

impl From<AdviceResponse> for Hint {
    fn from(response: AdviceResponse) -> Self {
        Self {
            message: response.message.trim().to_string(),
            rationale: response.rationale.filter(|r| !r.trim().is_empty()),
            is_error: false,
        }
    }
}

/// Interval-, presence- and in-flight-gated request timer
#[derive(Debug, Clone)]
pub struct AdviceDispatcher {
    interval_secs: f64,
    /// Time of the next interval tick
    next_due: Option<f64>,
    /// Generation the outstanding request was issued under
    pending: Option<u32>,
}

impl AdviceDispatcher {
    pub fn new(interval_secs: f64) -> Self {
        Self {
            interval_secs,
            next_due: None,
            pending: None,
        }
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Check the timer at `now` (seconds). Returns true when a request should
    /// be sent under `generation`; the dispatcher is then in flight until
    /// that generation's `complete`.
    pub fn poll(&mut self, now: f64, active_treats: usize, generation: u32) -> bool {
        let due = *self.next_due.get_or_insert(now + self.interval_secs);
        if now < due {
            return false;
        }

        // Consume this interval tick whether or not it fires
        let mut next = due + self.interval_secs;
        if next <= now {
            // Fell behind (hidden tab); realign instead of bursting
            next = now + self.interval_secs;
        }
        self.next_due = Some(next);

        if self.pending.is_some() || active_treats == 0 {
            return false;
        }
        self.pending = Some(generation);
        true
    }

    /// A request issued under `generation` finished (either way)
    pub fn complete(&mut self, generation: u32) {
        if self.pending == Some(generation) {
            self.pending = None;
        }
    }

    /// Restart the interval. An outstanding request keeps the dispatcher
    /// busy until its completion arrives.
    pub fn reset(&mut self) {
        self.next_due = None;
    }
}
