//! Full-screen image viewer overlay
//!
//! Shows one URL at full decode size with wheel zoom and drag pan.
//! Dismissed by dragging down past a threshold, Escape, or the close
//! button. Bytes go through the shared cache, so an image already shown
//! in the grid opens without another network fetch.

use crate::cache::{fetch_image_cached, ImageCache};
use eframe::egui;
use log::error;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

/// Cumulative downward drag (in points) that dismisses the viewer
const DISMISS_DRAG_THRESHOLD: f32 = 120.0;

const MIN_ZOOM: f32 = 1.0;
const MAX_ZOOM: f32 = 8.0;

pub struct ViewerState {
    pub url: String,
    texture: Option<egui::TextureHandle>,
    failed: bool,
    requested: bool,
    zoom: f32,
    pan: egui::Vec2,
    /// Downward drag accumulated while not zoomed in
    dismiss_drag: f32,
    bytes_sender: UnboundedSender<Option<Arc<Vec<u8>>>>,
    bytes_receiver: UnboundedReceiver<Option<Arc<Vec<u8>>>>,
}

impl ViewerState {
    pub fn new(url: String) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            url,
            texture: None,
            failed: false,
            requested: false,
            zoom: 1.0,
            pan: egui::Vec2::ZERO,
            dismiss_drag: 0.0,
            bytes_sender: tx,
            bytes_receiver: rx,
        }
    }

    /// Kick off the cache-backed byte fetch once
    fn request_bytes(&mut self, runtime: &Handle, cache: &Arc<ImageCache>, ctx: &egui::Context) {
        if self.requested {
            return;
        }
        self.requested = true;

        let sender = self.bytes_sender.clone();
        let cache = Arc::clone(cache);
        let url = self.url.clone();
        let ctx = ctx.clone();

        runtime.spawn(async move {
            let bytes = match fetch_image_cached(&cache, &url).await {
                Ok(bytes) => Some(bytes),
                Err(e) => {
                    error!("Viewer failed to fetch {}: {}", url, e);
                    None
                }
            };
            let _ = sender.send(bytes);
            ctx.request_repaint();
        });
    }

    /// Drain the channel; decode at full size (no thumbnail constraint)
    fn poll(&mut self, ctx: &egui::Context) {
        while let Ok(bytes) = self.bytes_receiver.try_recv() {
            match bytes {
                Some(bytes) => match image::load_from_memory(&bytes) {
                    Ok(img) => {
                        let rgba = img.to_rgba8();
                        let size = [rgba.width() as usize, rgba.height() as usize];
                        let pixels = rgba.into_raw();
                        let color_image =
                            egui::ColorImage::from_rgba_unmultiplied(size, &pixels);
                        self.texture = Some(ctx.load_texture(
                            format!("viewer_{}", self.url),
                            color_image,
                            egui::TextureOptions::LINEAR,
                        ));
                    }
                    Err(e) => {
                        error!("Viewer failed to decode {}: {}", self.url, e);
                        self.failed = true;
                    }
                },
                None => self.failed = true,
            }
        }
    }
}

pub struct ViewerScreen;

impl ViewerScreen {
    /// Render the overlay. Returns false once the viewer should close.
    pub fn show(
        ctx: &egui::Context,
        state: &mut ViewerState,
        runtime: &Handle,
        cache: &Arc<ImageCache>,
    ) -> bool {
        state.request_bytes(runtime, cache, ctx);
        state.poll(ctx);

        let mut open = true;
        let screen = ctx.screen_rect();

        egui::Area::new(egui::Id::new("fullscreen_viewer"))
            .fixed_pos(screen.min)
            .order(egui::Order::Foreground)
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(screen.size(), egui::Sense::click_and_drag());

                ui.painter()
                    .rect_filled(rect, 0.0, egui::Color32::from_black_alpha(230));

                match (&state.texture, state.failed) {
                    (Some(texture), _) => {
                        Self::draw_image(ui, state, texture.clone(), rect, &response)
                    }
                    (None, true) => {
                        ui.painter().text(
                            rect.center(),
                            egui::Align2::CENTER_CENTER,
                            "🖼",
                            egui::FontId::proportional(64.0),
                            egui::Color32::GRAY,
                        );
                    }
                    (None, false) => {
                        ui.put(
                            egui::Rect::from_center_size(rect.center(), egui::vec2(32.0, 32.0)),
                            egui::Spinner::new(),
                        );
                    }
                }

                // Close button in the top-right corner
                let close_rect =
                    egui::Rect::from_center_size(rect.right_top() + egui::vec2(-32.0, 32.0), egui::vec2(32.0, 32.0));
                if ui.put(close_rect, egui::Button::new("✕")).clicked() {
                    open = false;
                }

                if Self::handle_input(ctx, state, &response) {
                    open = false;
                }
            });

        open
    }

    fn draw_image(
        ui: &egui::Ui,
        state: &ViewerState,
        texture: egui::TextureHandle,
        rect: egui::Rect,
        _response: &egui::Response,
    ) {
        let tex_size = texture.size_vec2();

        // Fit to screen, then apply zoom and pan
        let fit = (rect.width() / tex_size.x)
            .min(rect.height() / tex_size.y)
            .min(1.0);
        let size = tex_size * fit * state.zoom;

        // Dragging down toward dismissal slides the image with the finger
        let center =
            rect.center() + state.pan + egui::vec2(0.0, state.dismiss_drag.max(0.0));
        let image_rect = egui::Rect::from_center_size(center, size);

        let uv = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));
        ui.painter()
            .image(texture.id(), image_rect, uv, egui::Color32::WHITE);
    }

    /// Zoom, pan, and dismissal. Returns true when the viewer should close.
    fn handle_input(
        ctx: &egui::Context,
        state: &mut ViewerState,
        response: &egui::Response,
    ) -> bool {
        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            return true;
        }

        let scroll = ctx.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            state.zoom = (state.zoom * (1.0 + scroll * 0.002)).clamp(MIN_ZOOM, MAX_ZOOM);
            if state.zoom <= MIN_ZOOM {
                state.pan = egui::Vec2::ZERO;
            }
        }

        if response.double_clicked() {
            state.zoom = 1.0;
            state.pan = egui::Vec2::ZERO;
        }

        if response.dragged() {
            let delta = response.drag_delta();
            if state.zoom > MIN_ZOOM {
                state.pan += delta;
            } else {
                // Not zoomed in: a downward drag is the dismissal gesture
                state.dismiss_drag += delta.y;
            }
        }

        if response.drag_stopped() {
            let dismissed = state.dismiss_drag > DISMISS_DRAG_THRESHOLD;
            state.dismiss_drag = 0.0;
            return dismissed;
        }

        false
    }
}
