//! Registry settings loaded at startup.

use registry_identity::DEFAULT_MAX_DEADLINE_WINDOW;
use registry_types::{AdminConfig, Identity, Timestamp, DEFAULT_MAX_RESPONDERS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Startup configuration for a [`crate::Registry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySettings {
    /// Administrative principal, hex encoded.
    pub admin: Identity,

    /// Distinct responders admitted per feedback entry
    #[serde(default = "default_max_responders")]
    pub max_responders: usize,

    /// Feedback opens once the clock passes this value (0 = always open)
    #[serde(default)]
    pub min_feedback_clock: u64,

    /// Furthest a wallet-binding deadline may lie ahead of the clock
    #[serde(default = "default_max_deadline_window")]
    pub max_deadline_window: u64,

    /// Validators trusted from the start
    #[serde(default)]
    pub trusted_validators: Vec<Identity>,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            admin: Identity::ZERO,
            max_responders: DEFAULT_MAX_RESPONDERS,
            min_feedback_clock: 0,
            max_deadline_window: DEFAULT_MAX_DEADLINE_WINDOW,
            trusted_validators: Vec::new(),
        }
    }
}

impl RegistrySettings {
    /// Default settings administered by `admin`.
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            ..Self::default()
        }
    }

    /// Tight limits: few responders per entry and a short wallet deadline window.
    pub fn strict(admin: Identity) -> Self {
        Self {
            admin,
            max_responders: 10,
            min_feedback_clock: 0,
            max_deadline_window: 60,
            trusted_validators: Vec::new(),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(contents)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn with_trusted_validator(mut self, validator: Identity) -> Self {
        self.trusted_validators.push(validator);
        self
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.admin.is_zero() {
            return Err(SettingsError::Invalid(
                "admin must not be the zero identity".to_string(),
            ));
        }
        if self.max_responders == 0 {
            return Err(SettingsError::Invalid(
                "max_responders must be at least 1".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for validator in &self.trusted_validators {
            if validator.is_zero() || !seen.insert(*validator) {
                return Err(SettingsError::Invalid(format!(
                    "trusted validator {} is zero or listed twice",
                    validator.short_id()
                )));
            }
        }
        Ok(())
    }

    /// Build the administrator-owned configuration these settings describe.
    pub fn admin_config(&self) -> Result<AdminConfig, SettingsError> {
        self.validate()?;
        let invalid = |err: registry_types::RegistryError| SettingsError::Invalid(err.to_string());

        let mut config = AdminConfig::new(self.admin);
        config
            .set_max_responders(&self.admin, self.max_responders)
            .map_err(invalid)?;
        config
            .set_min_feedback_clock(&self.admin, Timestamp(self.min_feedback_clock))
            .map_err(invalid)?;
        for validator in &self.trusted_validators {
            config
                .add_trusted_validator(&self.admin, *validator)
                .map_err(invalid)?;
        }
        Ok(config)
    }
}

fn default_max_responders() -> usize {
    DEFAULT_MAX_RESPONDERS
}

fn default_max_deadline_window() -> u64 {
    DEFAULT_MAX_DEADLINE_WINDOW
}
