// src/config/mod.rs

//! Configuration loading and validation for the scheduler.
//!
//! - `model.rs` holds the TOML-backed data model.
//! - `loader.rs` reads a config file from disk.
//! - `validate.rs` turns a raw file into a checked `ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ArrebolSection, CatalogSection, ConfigFile, RawConfigFile, SchedulerSection, ScriptTag,
    TagsSection,
};
