#![warn(clippy::all, missing_docs)]

//! Core logic for the Pulver-Rechner.
//!
//! This crate hosts the settings model, the key-value persistence layer,
//! the ratio formula, number parsing/formatting, the debounced editing
//! flow and the view model consumed by the terminal UI.

pub mod calc;
pub mod config;
pub mod debounce;
pub mod editing;
pub mod models;
pub mod number;
pub mod store;
pub mod view;

pub use calc::DerivedResults;
pub use config::AppConfig;
pub use editing::{Editor, FieldCommit};
pub use models::{NumericField, Settings};
pub use store::{FileStorage, KeyValueStorage, MemoryStorage, SettingsStore};
pub use view::CalculatorView;
