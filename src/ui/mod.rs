//! Ratatui front-end split across logical submodules: central state and
//! drawing in `app`, text-input state in `forms`, layout and formatting
//! helpers in `helpers`, and the raw-mode event loop in `terminal`.

mod app;
mod forms;
mod helpers;
mod terminal;

pub use app::App;
pub use terminal::run_app;
