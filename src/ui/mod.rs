//! Ratatui front-end: the collection screen with its read and unread
//! sections, plus popups for adding, updating, and removing books.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
