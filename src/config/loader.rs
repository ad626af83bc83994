//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine
//! configuration from YAML files.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{EngineError, EngineResult};
use crate::models::{Employment, EmploymentRules, Holiday};

use super::types::{EmploymentConfig, EngineConfig, EngineMetadata, HolidaysConfig};

/// Loads and provides access to engine configuration.
///
/// The `ConfigLoader` reads YAML configuration files from a directory
/// and provides methods to query employments, their effective rules and
/// the holiday store.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── engine.yaml        # Metadata
/// ├── holidays.yaml      # Holiday store
/// └── employments/
///     └── emp_001.yaml   # One employment per file
/// ```
///
/// # Example
///
/// ```no_run
/// use timebank_engine::config::ConfigLoader;
/// use chrono::NaiveDate;
///
/// let loader = ConfigLoader::load("./config/default").unwrap();
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// let rules = loader.rules_for("emp_001", date).unwrap();
/// println!("Daily target: {} minutes", rules.daily_target_minutes);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: EngineConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if a required file or the employments
    /// directory is missing, `ConfigParseError` for invalid YAML or a
    /// duplicated employment id, and `InvalidRules` or `InvalidHoliday`
    /// for out-of-range values.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use timebank_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// # Ok::<(), timebank_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let metadata = Self::load_yaml::<EngineMetadata>(&path.join("engine.yaml"))?;

        let holidays = Self::load_yaml::<HolidaysConfig>(&path.join("holidays.yaml"))?
            .holidays
            .into_iter()
            .map(Holiday::try_from)
            .collect::<EngineResult<Vec<_>>>()?;

        let employments = Self::load_employments(&path.join("employments"))?;

        Ok(Self {
            config: EngineConfig::new(metadata, holidays, employments),
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Loads every employment file from the employments directory.
    fn load_employments(dir: &Path) -> EngineResult<HashMap<String, Employment>> {
        let dir_str = dir.display().to_string();

        let entries = fs::read_dir(dir).map_err(|_| EngineError::ConfigNotFound {
            path: dir_str.clone(),
        })?;

        let mut employments = HashMap::new();

        for entry in entries {
            let entry = entry.map_err(|_| EngineError::ConfigNotFound {
                path: dir_str.clone(),
            })?;

            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "yaml") {
                let employment = Employment::try_from(Self::load_yaml::<EmploymentConfig>(&path)?)?;
                if employments.contains_key(&employment.id) {
                    return Err(EngineError::ConfigParseError {
                        path: path.display().to_string(),
                        message: format!("duplicate employment id '{}'", employment.id),
                    });
                }
                employments.insert(employment.id.clone(), employment);
            }
        }

        if employments.is_empty() {
            return Err(EngineError::ConfigNotFound {
                path: format!("{} (no employment files found)", dir_str),
            });
        }

        Ok(employments)
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the configuration metadata.
    pub fn metadata(&self) -> &EngineMetadata {
        self.config.metadata()
    }

    /// Returns the holiday store.
    pub fn holidays(&self) -> &[Holiday] {
        self.config.holidays()
    }

    /// Gets an employment by its id.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use timebank_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config/default")?;
    /// let employment = loader.employment("emp_001")?;
    /// println!("Employment: {}", employment.name);
    /// # Ok::<(), timebank_engine::error::EngineError>(())
    /// ```
    pub fn employment(&self, employment_id: &str) -> EngineResult<&Employment> {
        self.config
            .employments()
            .get(employment_id)
            .ok_or_else(|| EngineError::EmploymentNotFound {
                employment_id: employment_id.to_string(),
            })
    }

    /// Gets the rules version effective for an employment on a date.
    ///
    /// Finds the most recent version whose `effective_from` is on or before
    /// `date`.
    pub fn rules_for(&self, employment_id: &str, date: NaiveDate) -> EngineResult<&EmploymentRules> {
        self.employment(employment_id)?.rules.effective_on(date)
    }
}
