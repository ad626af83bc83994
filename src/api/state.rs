//! Application state for the work-time accounting API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::calculation::LedgerRegistry;
use crate::config::ConfigLoader;

/// Shared application state.
///
/// Contains resources that are shared across all request handlers: the
/// loaded configuration and the per-employment time-bank ledgers.
#[derive(Clone)]
pub struct AppState {
    /// The loaded configuration.
    config: Arc<ConfigLoader>,
    /// Time-bank ledgers, one per employment.
    ledgers: Arc<LedgerRegistry>,
}

impl AppState {
    /// Creates a new application state with the given configuration loader
    /// and no open ledgers.
    pub fn new(config: ConfigLoader) -> Self {
        Self {
            config: Arc::new(config),
            ledgers: Arc::new(LedgerRegistry::new()),
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the ledger registry.
    pub fn ledgers(&self) -> &LedgerRegistry {
        &self.ledgers
    }
}
