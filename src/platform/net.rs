//! HTTP transport for the advice and pronunciation services
//!
//! Both calls are fire-and-forget from the frame loop: they run on the local
//! executor and report back through the session inbox, tagged with the
//! generation they were issued under.

use js_sys::ArrayBuffer;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{AudioContext, AudioContextState, Request, RequestInit, Response};

use super::audio::{decode_clip, play_clip};
use super::describe_js_error;
use crate::advice::{AdviceRequest, AdviceResponse, parse_response};
use crate::error::{AdviceError, SpeechError};
use crate::session::{Inbox, InboxKind};

/// Body posted to the pronunciation service
#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
}

async fn post_json(endpoint: &str, body: &str) -> Result<Response, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(body));
    let request = Request::new_with_str_and_init(endpoint, &init)?;
    request.headers().set("Content-Type", "application/json")?;
    JsFuture::from(window.fetch_with_request(&request))
        .await?
        .dyn_into::<Response>()
}

async fn fetch_advice(endpoint: &str, request: &AdviceRequest) -> Result<AdviceResponse, AdviceError> {
    let body = serde_json::to_string(request).map_err(|e| AdviceError::Transport(e.to_string()))?;
    let response = post_json(endpoint, &body)
        .await
        .map_err(|e| AdviceError::Transport(describe_js_error(&e)))?;
    if !response.ok() {
        return Err(AdviceError::Status(response.status()));
    }
    let text = response
        .text()
        .map_err(|e| AdviceError::Transport(describe_js_error(&e)))?;
    let text = JsFuture::from(text)
        .await
        .map_err(|e| AdviceError::Transport(describe_js_error(&e)))?
        .as_string()
        .unwrap_or_default();
    parse_response(&text)
}

/// Send an advice request; the result lands in `inbox`
pub fn request_advice(endpoint: String, request: AdviceRequest, inbox: Inbox, generation: u32) {
    spawn_local(async move {
        let kind = match fetch_advice(&endpoint, &request).await {
            Ok(response) => InboxKind::AdviceReady(response),
            Err(err) => InboxKind::AdviceFailed(err),
        };
        inbox.push(generation, kind);
    });
}

async fn fetch_speech(endpoint: &str, word: &str) -> Result<ArrayBuffer, SpeechError> {
    let body = serde_json::to_string(&SpeechRequest { text: word })
        .map_err(|e| SpeechError::Transport(e.to_string()))?;
    let response = post_json(endpoint, &body)
        .await
        .map_err(|e| SpeechError::Transport(describe_js_error(&e)))?;
    if !response.ok() {
        return Err(SpeechError::Transport(format!("HTTP {}", response.status())));
    }
    if response.status() == 204 {
        return Err(SpeechError::Empty);
    }
    let buffer = response
        .array_buffer()
        .map_err(|e| SpeechError::Transport(describe_js_error(&e)))?;
    JsFuture::from(buffer)
        .await
        .map_err(|e| SpeechError::Transport(describe_js_error(&e)))?
        .dyn_into::<ArrayBuffer>()
        .map_err(|_| SpeechError::Decode("response is not binary".to_string()))
}

/// Fetch, decode and play the pronunciation of `word`. Start, end and failure
/// are all reported through `inbox`. Nothing plays once `generation` is stale.
pub fn pronounce(endpoint: String, word: String, ctx: AudioContext, volume: f32, inbox: Inbox, generation: u32) {
    spawn_local(async move {
        let played = async {
            let data = fetch_speech(&endpoint, &word).await?;
            let clip = decode_clip(&ctx, &data).await?;
            // Restarted or torn down while the clip was loading
            if !inbox.is_current(generation) || ctx.state() == AudioContextState::Closed {
                return Ok(None);
            }
            play_clip(&ctx, &clip, volume).map(Some)
        }
        .await;

        match played {
            Ok(None) => log::debug!("Dropping pronunciation of {:?} from generation {}", word, generation),
            Ok(Some(source)) => {
                inbox.push(generation, InboxKind::SpeechStarted { word: word.clone() });
                let done = inbox.clone();
                let on_ended = wasm_bindgen::closure::Closure::once_into_js(move || {
                    done.push(generation, InboxKind::SpeechFinished { word });
                });
                source.set_onended(Some(on_ended.unchecked_ref()));
            }
            Err(error) => inbox.push(generation, InboxKind::SpeechFailed { word, error }),
        }
    });
}
