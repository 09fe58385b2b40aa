//! Camera stream
//!
//! Acquired once at session start and released on teardown.

use js_sys::{Object, Reflect};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlVideoElement, MediaStream, MediaStreamConstraints, MediaStreamTrack};

use super::describe_js_error;
use crate::error::InitError;

pub struct Camera {
    video: HtmlVideoElement,
    stream: MediaStream,
}

impl Camera {
    /// Ask for the front camera and start playing it into `video`
    pub async fn open(video: &HtmlVideoElement) -> Result<Self, InitError> {
        let window = web_sys::window().ok_or(InitError::MissingElement("window"))?;
        let devices = window
            .navigator()
            .media_devices()
            .map_err(|e| InitError::CameraUnavailable(describe_js_error(&e)))?;

        let video_constraints = Object::new();
        Reflect::set(&video_constraints, &"facingMode".into(), &"user".into()).ok();
        let ideal_width = Object::new();
        Reflect::set(&ideal_width, &"ideal".into(), &JsValue::from(1280)).ok();
        Reflect::set(&video_constraints, &"width".into(), &ideal_width).ok();

        let constraints = MediaStreamConstraints::new();
        constraints.set_video(&video_constraints);
        constraints.set_audio(&JsValue::FALSE);

        let promise = devices
            .get_user_media_with_constraints(&constraints)
            .map_err(|e| InitError::CameraUnavailable(describe_js_error(&e)))?;
        let stream: MediaStream = JsFuture::from(promise)
            .await
            .map_err(|e| InitError::CameraUnavailable(describe_js_error(&e)))?
            .dyn_into()
            .map_err(|_| InitError::CameraUnavailable("not a MediaStream".to_string()))?;

        video.set_muted(true);
        video.set_attribute("playsinline", "").ok();
        video.set_src_object(Some(&stream));
        if let Ok(play) = video.play() {
            JsFuture::from(play)
                .await
                .map_err(|e| InitError::CameraUnavailable(describe_js_error(&e)))?;
        }

        log::info!(
            "Camera started ({}x{})",
            video.video_width(),
            video.video_height()
        );
        Ok(Self {
            video: video.clone(),
            stream,
        })
    }

    pub fn video(&self) -> &HtmlVideoElement {
        &self.video
    }

    /// Stop every track and detach the stream
    pub fn stop(&self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<MediaStreamTrack>() {
                track.stop();
            }
        }
        self.video.set_src_object(None);
        log::info!("Camera released");
    }
}
