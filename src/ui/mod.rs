mod app;
mod screens;
mod state;

pub use app::{launch_gui, GridApp};
pub use state::{GridScreenState, Tab, THUMBNAIL_WIDTH};
