use eframe::{self, egui};
use egui::ViewportBuilder;
use std::sync::Arc;
use tokio::runtime::Runtime;

use super::{
    screens::{GridScreen, ViewerScreen, ViewerState},
    state::{GridScreenState, Tab},
};
use crate::cache::ImageCache;

/// Application shell: the two-tab switcher plus the shared runtime and
/// image cache injected into both screens.
///
/// Both screen states live for the whole process; switching tabs only
/// changes which one is rendered, so fetched URLs, textures, and scroll
/// positions survive. A fetch in flight for the hidden tab completes and
/// updates its state invisibly.
pub struct GridApp {
    active_tab: Tab,
    home: GridScreenState,
    gallery: GridScreenState,
    viewer: Option<ViewerState>,
    runtime: Runtime,
    cache: Arc<ImageCache>,
}

impl Default for GridApp {
    fn default() -> Self {
        Self {
            active_tab: Tab::Home,
            home: GridScreenState::new("home"),
            gallery: GridScreenState::new("gallery"),
            viewer: None,
            runtime: Runtime::new().expect("Failed to create Tokio runtime"),
            cache: Arc::new(ImageCache::new()),
        }
    }
}

impl eframe::App for GridApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Both screens poll every frame so the hidden tab keeps absorbing
        // its fetch results.
        self.home.poll(ctx);
        self.gallery.poll(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.horizontal(|ui| {
                for tab in [Tab::Home, Tab::Gallery] {
                    if ui
                        .selectable_label(self.active_tab == tab, tab.title())
                        .clicked()
                    {
                        self.active_tab = tab;
                    }
                }
            });
            ui.separator();

            let screen = match self.active_tab {
                Tab::Home => &mut self.home,
                Tab::Gallery => &mut self.gallery,
            };

            let clicked = GridScreen::show(ui, screen, self.runtime.handle(), &self.cache);
            if let Some(url) = clicked {
                log::info!("Opening viewer for {}", url);
                self.viewer = Some(ViewerState::new(url));
            }
        });

        if let Some(viewer) = &mut self.viewer {
            let keep_open = ViewerScreen::show(ctx, viewer, self.runtime.handle(), &self.cache);
            if !keep_open {
                self.viewer = None;
            }
        }
    }
}

pub fn launch_gui() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: ViewportBuilder::default().with_inner_size([1000.0, 750.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Picsum Grid",
        options,
        Box::new(|_cc| Ok(Box::new(GridApp::default()))),
    )
}
