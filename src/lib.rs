//! Core library surface for the personal library manager.
//!
//! The record store is usable on its own; the `ui` module layers the terminal
//! front-end on top and the binary wires both to configuration and logging.
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod store;
pub mod ui;

pub use error::StoreError;
pub use models::{BookField, BookRecord};
pub use store::RecordStore;
pub use ui::{run_app, App};
