mod grid;
mod viewer;

pub use grid::GridScreen;
pub use viewer::{ViewerScreen, ViewerState};
