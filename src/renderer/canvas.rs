//! 2D canvas backend
//!
//! Replays a `Scene` onto a `CanvasRenderingContext2d`. Emoji and labels are
//! plain `fill_text` calls, so the browser's font stack handles the glyphs.

use std::f64::consts::TAU;

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlVideoElement};

use super::scene::{DrawCmd, Scene};
use crate::error::InitError;

/// `HTMLMediaElement.HAVE_CURRENT_DATA`
const HAVE_CURRENT_DATA: u16 = 2;

pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    video: HtmlVideoElement,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement, video: HtmlVideoElement) -> Result<Self, InitError> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
            .ok_or(InitError::CanvasContext)?;
        Ok(Self { canvas, ctx, video })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    pub fn resize(&self, width: u32, height: u32) {
        if self.canvas.width() != width || self.canvas.height() != height {
            self.canvas.set_width(width);
            self.canvas.set_height(height);
            log::debug!("Canvas resized to {}x{}", width, height);
        }
    }

    /// Draw one frame
    pub fn draw(&self, scene: &Scene) {
        let ctx = &self.ctx;
        ctx.clear_rect(0.0, 0.0, scene.width as f64, scene.height as f64);
        ctx.set_text_baseline("middle");

        for cmd in &scene.commands {
            match cmd {
                DrawCmd::Video { mirrored } => self.draw_video(scene, *mirrored),
                DrawCmd::Rect { pos, w, h, color } => {
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.fill_rect(pos.x as f64, pos.y as f64, *w as f64, *h as f64);
                }
                DrawCmd::Circle {
                    center,
                    radius,
                    color,
                    stroke,
                } => {
                    ctx.begin_path();
                    if ctx
                        .arc(center.x as f64, center.y as f64, radius.max(0.0) as f64, 0.0, TAU)
                        .is_err()
                    {
                        continue;
                    }
                    match stroke {
                        Some(width) => {
                            ctx.set_line_width(*width as f64);
                            ctx.set_stroke_style_str(&color.to_css());
                            ctx.stroke();
                        }
                        None => {
                            ctx.set_fill_style_str(&color.to_css());
                            ctx.fill();
                        }
                    }
                }
                DrawCmd::Text {
                    pos,
                    text,
                    size,
                    color,
                    align,
                } => {
                    ctx.set_font(&format!("{}px sans-serif", size.round()));
                    ctx.set_text_align(align.as_css());
                    ctx.set_fill_style_str(&color.to_css());
                    ctx.fill_text(text, pos.x as f64, pos.y as f64).ok();
                }
            }
        }
    }

    fn draw_video(&self, scene: &Scene, mirrored: bool) {
        if self.video.ready_state() < HAVE_CURRENT_DATA {
            self.ctx.set_fill_style_str("#111");
            self.ctx
                .fill_rect(0.0, 0.0, scene.width as f64, scene.height as f64);
            return;
        }
        let (w, h) = (scene.width as f64, scene.height as f64);
        self.ctx.save();
        if mirrored {
            self.ctx.translate(w, 0.0).ok();
            self.ctx.scale(-1.0, 1.0).ok();
        }
        self.ctx
            .draw_image_with_html_video_element_and_dw_and_dh(&self.video, 0.0, 0.0, w, h)
            .ok();
        self.ctx.restore();
    }

    /// Current frame as a JPEG data URL for the advice request
    pub fn snapshot(&self) -> Option<String> {
        self.canvas
            .to_data_url_with_type("image/jpeg")
            .map_err(|e| log::warn!("Canvas snapshot failed: {:?}", e))
            .ok()
    }
}
