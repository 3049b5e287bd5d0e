//! Scrollable 5-column image grid
//!
//! Pure rendering over a [`GridScreenState`]: each cell asks the shared
//! cache for its image and draws placeholder / thumbnail / error glyph.
//! The scroll position feeds the near-bottom trigger every frame; the
//! controller's loading flag guards against duplicates and its stall
//! flag keeps a failed or exhausted feed from retrying every frame.

use crate::cache::ImageCache;
use crate::ui::state::GridScreenState;
use eframe::egui;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Fixed column count of the image grid
pub const GRID_COLUMNS: usize = 5;

pub struct GridScreen;

impl GridScreen {
    /// Render one grid screen. Returns the URL of a clicked cell, if any.
    pub fn show(
        ui: &mut egui::Ui,
        state: &mut GridScreenState,
        runtime: &Handle,
        cache: &Arc<ImageCache>,
    ) -> Option<String> {
        let ctx = ui.ctx().clone();
        let mut clicked = None;

        ui.horizontal(|ui| {
            if ui.button("⟳ Refresh").clicked() {
                let ticket = state.controller.refresh();
                state.spawn_page_fetch(ticket, runtime, &ctx);
            }

            ui.label(format!("{} images", state.controller.urls().len()));

            if state.controller.is_loading() {
                ui.spinner();
            }
        });

        ui.separator();

        let output = egui::ScrollArea::vertical()
            .id_salt(state.name)
            .auto_shrink([false, false])
            .show(ui, |ui| {
                clicked = Self::show_grid(ui, state, runtime, cache);
            });

        // Near-bottom check; also true while the content does not yet
        // fill the viewport (initial mount). After a failed or empty
        // fetch the state only re-arms it on actual scroll movement.
        let offset = output.state.offset.y;
        let viewport = output.inner_rect.height();
        let content = output.content_size.y;
        if state.should_start_fetch(offset, viewport, content) {
            if let Some(ticket) = state.controller.start_fetch() {
                state.spawn_page_fetch(ticket, runtime, &ctx);
            }
        }

        clicked
    }

    fn show_grid(
        ui: &mut egui::Ui,
        state: &mut GridScreenState,
        runtime: &Handle,
        cache: &Arc<ImageCache>,
    ) -> Option<String> {
        let ctx = ui.ctx().clone();
        let spacing = ui.spacing().item_spacing.x;
        let cell_size = ((ui.available_width() - spacing * (GRID_COLUMNS - 1) as f32)
            / GRID_COLUMNS as f32)
            .floor();

        let urls = state.controller.urls().to_vec();
        // One trailing placeholder cell while a page fetch is outstanding
        let cell_count = urls.len() + usize::from(state.controller.is_loading());

        let mut clicked = None;

        for row in (0..cell_count).collect::<Vec<_>>().chunks(GRID_COLUMNS) {
            ui.horizontal(|ui| {
                for &i in row {
                    match urls.get(i) {
                        Some(url) => {
                            if Self::show_cell(ui, state, url, cell_size, runtime, cache, &ctx) {
                                clicked = Some(url.clone());
                            }
                        }
                        None => Self::show_loading_cell(ui, cell_size),
                    }
                }
            });
        }

        clicked
    }

    /// Render one image cell. Returns true when clicked.
    fn show_cell(
        ui: &mut egui::Ui,
        state: &mut GridScreenState,
        url: &str,
        cell_size: f32,
        runtime: &Handle,
        cache: &Arc<ImageCache>,
        ctx: &egui::Context,
    ) -> bool {
        state.request_image(url, runtime, cache, ctx);

        let (rect, response) =
            ui.allocate_exact_size(egui::vec2(cell_size, cell_size), egui::Sense::click());

        if let Some(texture) = state.thumbnails.get(url) {
            let uv = center_crop_uv(texture.size());
            ui.painter()
                .image(texture.id(), rect, uv, egui::Color32::WHITE);
        } else if state.failed_images.contains(url) {
            ui.painter()
                .rect_filled(rect, 2.0, ui.visuals().extreme_bg_color);
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "🖼",
                egui::FontId::proportional(cell_size * 0.3),
                ui.visuals().weak_text_color(),
            );
        } else {
            ui.painter().rect_filled(rect, 2.0, ui.visuals().faint_bg_color);
        }

        if response.hovered() {
            ui.painter().rect_stroke(
                rect,
                2.0,
                ui.visuals().widgets.hovered.fg_stroke,
                egui::StrokeKind::Inside,
            );
        }

        response.clicked()
    }

    /// The trailing cell shown while the next page is being fetched
    fn show_loading_cell(ui: &mut egui::Ui, cell_size: f32) {
        let (rect, _) =
            ui.allocate_exact_size(egui::vec2(cell_size, cell_size), egui::Sense::hover());
        ui.painter().rect_filled(rect, 2.0, ui.visuals().faint_bg_color);
        ui.put(
            egui::Rect::from_center_size(rect.center(), egui::vec2(24.0, 24.0)),
            egui::Spinner::new(),
        );
    }
}

/// UV rectangle that center-crops a texture to a square cell
fn center_crop_uv(size: [usize; 2]) -> egui::Rect {
    let (w, h) = (size[0] as f32, size[1] as f32);
    if w > h {
        let margin = (1.0 - h / w) / 2.0;
        egui::Rect::from_min_max(egui::pos2(margin, 0.0), egui::pos2(1.0 - margin, 1.0))
    } else if h > w {
        let margin = (1.0 - w / h) / 2.0;
        egui::Rect::from_min_max(egui::pos2(0.0, margin), egui::pos2(1.0, 1.0 - margin))
    } else {
        egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::center_crop_uv;
    use eframe::egui;

    #[test]
    fn wide_texture_crops_horizontally() {
        let uv = center_crop_uv([400, 200]);
        assert!((uv.min.x - 0.25).abs() < 1e-6);
        assert!((uv.max.x - 0.75).abs() < 1e-6);
        assert_eq!(uv.min.y, 0.0);
        assert_eq!(uv.max.y, 1.0);
    }

    #[test]
    fn tall_texture_crops_vertically() {
        let uv = center_crop_uv([200, 400]);
        assert_eq!(uv.min.x, 0.0);
        assert_eq!(uv.max.x, 1.0);
        assert!((uv.min.y - 0.25).abs() < 1e-6);
        assert!((uv.max.y - 0.75).abs() < 1e-6);
    }

    #[test]
    fn square_texture_is_uncropped() {
        let uv = center_crop_uv([300, 300]);
        assert_eq!(uv.min, egui::pos2(0.0, 0.0));
        assert_eq!(uv.max, egui::pos2(1.0, 1.0));
    }
}
