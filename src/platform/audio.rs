//! Audio system using Web Audio API
//!
//! Sound effects are procedurally generated. Pronunciation clips arrive as
//! encoded audio from the pronunciation service and are decoded here.

use js_sys::ArrayBuffer;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{AudioBuffer, AudioBufferSourceNode, AudioContext, GainNode, OscillatorNode, OscillatorType};

use super::describe_js_error;
use crate::error::SpeechError;
use crate::settings::Settings;
use crate::sim::GameEvent;

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Point treat eaten
    Munch,
    /// Target word eaten
    Correct,
    /// Wrong word eaten
    Wrong,
    /// Treat fell off screen
    Miss,
}

impl SoundEffect {
    /// Sound for a game event, if any
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::Eaten { .. } => Some(SoundEffect::Munch),
            GameEvent::CorrectWord { .. } => Some(SoundEffect::Correct),
            GameEvent::WrongWord { .. } => Some(SoundEffect::Wrong),
            GameEvent::Missed { .. } => Some(SoundEffect::Miss),
            _ => None,
        }
    }
}

/// Audio manager for the game
pub struct AudioManager {
    ctx: Option<AudioContext>,
    master_volume: f32,
    /// Master and effects volume combined
    sfx_volume: f32,
    muted: bool,
}

impl AudioManager {
    pub fn new(settings: &Settings) -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: settings.master_volume.clamp(0.0, 1.0),
            sfx_volume: settings.effective_sfx_volume(),
            muted: false,
        }
    }

    /// Resume audio context (required after user gesture)
    pub fn resume(&self) {
        if let Some(ctx) = &self.ctx {
            let _ = ctx.resume();
        }
    }

    /// Close the context; clips still loading will not start and playing
    /// ones stop
    pub fn close(&mut self) {
        if let Some(ctx) = self.ctx.take() {
            if let Err(e) = ctx.close() {
                log::warn!("Failed to close AudioContext: {}", describe_js_error(&e));
            }
        }
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.sfx_volume }
    }

    /// Handle to the context for async playback
    pub fn context(&self) -> Option<AudioContext> {
        self.ctx.clone()
    }

    /// Volume for pronunciation clips
    pub fn voice_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Play a sound effect
    pub fn play(&self, effect: SoundEffect) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }

        let Some(ctx) = &self.ctx else { return };

        // Browsers keep the context suspended until a user gesture
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }

        match effect {
            SoundEffect::Munch => self.play_munch(ctx, vol),
            SoundEffect::Correct => self.play_correct(ctx, vol),
            SoundEffect::Wrong => self.play_wrong(ctx, vol),
            SoundEffect::Miss => self.play_miss(ctx, vol),
        }
    }

    // === Sound generators ===

    /// Create an oscillator with gain envelope
    fn create_osc(&self, ctx: &AudioContext, freq: f32, osc_type: OscillatorType) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }

    /// Munch - short crunchy chomp
    fn play_munch(&self, ctx: &AudioContext, vol: f32) {
        let t = ctx.current_time();

        if let Some((osc, gain)) = self.create_osc(ctx, 220.0, OscillatorType::Square) {
            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.08).ok();
            osc.frequency().set_value_at_time(220.0, t).ok();
            osc.frequency().exponential_ramp_to_value_at_time(90.0, t + 0.08).ok();
            osc.start().ok();
            osc.stop_with_when(t + 0.1).ok();
        }

        // Second bite
        if let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Square) {
            let t2 = t + 0.09;
            gain.gain().set_value_at_time(vol * 0.2, t2).ok();
            gain.gain().exponential_ramp_to_value_at_time(0.01, t2 + 0.07).ok();
            osc.start_with_when(t2).ok();
            osc.stop_with_when(t2 + 0.09).ok();
        }
    }

    /// Correct word - rising chime
    fn play_correct(&self, ctx: &AudioContext, vol: f32) {
        for (i, freq) in [523.0, 659.0, 784.0].iter().enumerate() {
            let delay = i as f64 * 0.08;
            if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                let t = ctx.current_time() + delay;
                gain.gain().set_value_at_time(vol * 0.25, t).ok();
                gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.2).ok();
                osc.start_with_when(t).ok();
                osc.stop_with_when(t + 0.25).ok();
            }
        }
    }

    /// Wrong word - low buzz
    fn play_wrong(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 160.0, OscillatorType::Sawtooth) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.3, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.3).ok();
        osc.frequency().set_value_at_time(160.0, t).ok();
        osc.frequency().set_value_at_time(120.0, t + 0.12).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.35).ok();
    }

    /// Miss - soft descending blip
    fn play_miss(&self, ctx: &AudioContext, vol: f32) {
        let Some((osc, gain)) = self.create_osc(ctx, 400.0, OscillatorType::Triangle) else {
            return;
        };
        let t = ctx.current_time();

        gain.gain().set_value_at_time(vol * 0.12, t).ok();
        gain.gain().exponential_ramp_to_value_at_time(0.01, t + 0.15).ok();
        osc.frequency().set_value_at_time(400.0, t).ok();
        osc.frequency().exponential_ramp_to_value_at_time(200.0, t + 0.15).ok();

        osc.start().ok();
        osc.stop_with_when(t + 0.2).ok();
    }
}

/// Decode an encoded clip
pub async fn decode_clip(ctx: &AudioContext, data: &ArrayBuffer) -> Result<AudioBuffer, SpeechError> {
    if data.byte_length() == 0 {
        return Err(SpeechError::Empty);
    }
    let promise = ctx
        .decode_audio_data(data)
        .map_err(|e| SpeechError::Decode(describe_js_error(&e)))?;
    JsFuture::from(promise)
        .await
        .map_err(|e| SpeechError::Decode(describe_js_error(&e)))?
        .dyn_into::<AudioBuffer>()
        .map_err(|_| SpeechError::Decode("not an AudioBuffer".to_string()))
}

/// Start playing a decoded clip; returns the source node so the caller can
/// hook `onended`
pub fn play_clip(ctx: &AudioContext, buffer: &AudioBuffer, volume: f32) -> Result<AudioBufferSourceNode, SpeechError> {
    let source = ctx
        .create_buffer_source()
        .map_err(|e| SpeechError::Decode(describe_js_error(&e)))?;
    let gain = ctx
        .create_gain()
        .map_err(|e| SpeechError::Decode(describe_js_error(&e)))?;
    source.set_buffer(Some(buffer));
    gain.gain().set_value(volume.clamp(0.0, 1.0));
    source
        .connect_with_audio_node(&gain)
        .and_then(|_| gain.connect_with_audio_node(&ctx.destination()))
        .map_err(|e| SpeechError::Decode(describe_js_error(&e)))?;
    if ctx.state() == web_sys::AudioContextState::Suspended {
        let _ = ctx.resume();
    }
    source
        .start()
        .map_err(|e| SpeechError::Decode(describe_js_error(&e)))?;
    Ok(source)
}
