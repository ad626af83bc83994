//! Configuration loading and management for the work-time accounting engine.
//!
//! This module provides functionality to load engine configuration from YAML
//! files, including metadata, the holiday store and effective-dated
//! employment rules.
//!
//! # Example
//!
//! ```no_run
//! use timebank_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/default").unwrap();
//! println!("Loaded configuration: {}", config.metadata().name);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{EmploymentConfig, EngineConfig, EngineMetadata, HolidayEntry, HolidaysConfig};
