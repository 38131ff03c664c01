//! # Salah Common Library
//!
//! Shared code for the guided-prayer player including:
//! - Prayer catalog model (prayers, steps) and the bundled catalog
//! - Language selection
//! - Event types (SalahEvent enum) and the EventBus
//! - Configuration file and asset root resolution

pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod language;

pub use catalog::{Catalog, Prayer, Step};
pub use error::{Error, Result};
pub use language::Language;
