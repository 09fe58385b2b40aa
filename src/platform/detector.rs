//! Face landmark detector binding
//!
//! The page loads a MediaPipe `FaceLandmarker` and publishes it as
//! `window.faceLandmarker`. Landmarks cross the JS boundary as one flat
//! `Float32Array` of `x, y, z` triples (normalized to the video frame).

use js_sys::Float32Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlVideoElement;

use super::describe_js_error;
use crate::error::InitError;
use crate::tracker::FaceLandmarks;

#[wasm_bindgen(inline_js = "
    export function wait_for_detector(timeout_ms) {
        return new Promise((resolve, reject) => {
            const start = performance.now();
            (function poll() {
                if (window.faceLandmarker) {
                    resolve();
                } else if (window.faceLandmarkerError) {
                    reject(new Error(String(window.faceLandmarkerError)));
                } else if (performance.now() - start > timeout_ms) {
                    reject(new Error('face landmarker did not load'));
                } else {
                    setTimeout(poll, 100);
                }
            })();
        });
    }

    export function detect_face_landmarks(video, timestamp) {
        const detector = window.faceLandmarker;
        if (!detector || video.readyState < 2) {
            return undefined;
        }
        const result = detector.detectForVideo(video, timestamp);
        if (!result || !result.faceLandmarks || result.faceLandmarks.length === 0) {
            return undefined;
        }
        const face = result.faceLandmarks[0];
        const out = new Float32Array(face.length * 3);
        for (let i = 0; i < face.length; i++) {
            out[i * 3] = face[i].x;
            out[i * 3 + 1] = face[i].y;
            out[i * 3 + 2] = face[i].z || 0;
        }
        return out;
    }
")]
extern "C" {
    fn wait_for_detector(timeout_ms: u32) -> js_sys::Promise;

    #[wasm_bindgen(catch)]
    fn detect_face_landmarks(video: &HtmlVideoElement, timestamp: f64) -> Result<JsValue, JsValue>;
}

/// Wait until the page has finished loading the detector
pub async fn ready(timeout_ms: u32) -> Result<(), InitError> {
    JsFuture::from(wait_for_detector(timeout_ms))
        .await
        .map(|_| ())
        .map_err(|e| InitError::DetectorUnavailable(describe_js_error(&e)))
}

/// Run detection on the current video frame. `None` when no face is found.
pub fn detect(video: &HtmlVideoElement, timestamp: f64) -> Option<FaceLandmarks> {
    let value = match detect_face_landmarks(video, timestamp) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Detection failed: {}", describe_js_error(&e));
            return None;
        }
    };
    let flat = value.dyn_into::<Float32Array>().ok()?;
    FaceLandmarks::from_flat(&flat.to_vec())
}
