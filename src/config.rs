use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;
use crate::{DEFAULT_ERROR_DISPLAY_MS, DEFAULT_PHONE_PREFIX, PROFILE_ROUTE, SAVE_EVENT_NAME};

/// Tunables for a [`crate::ProfileEditController`].
///
/// Every key is optional when deserializing; missing keys take the
/// defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// How long a save error stays visible before it clears itself.
    pub error_display_ms: u64,
    /// Country code the phone field starts with.
    pub default_phone_prefix: u32,
    pub save_event_name: String,
    /// Screen the navigator is sent to after a successful save.
    pub success_route: String,
    /// Refuse a second `save()` while one is still running.
    pub reject_concurrent_saves: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            error_display_ms: DEFAULT_ERROR_DISPLAY_MS,
            default_phone_prefix: DEFAULT_PHONE_PREFIX,
            save_event_name: SAVE_EVENT_NAME.to_string(),
            success_route: PROFILE_ROUTE.to_string(),
            reject_concurrent_saves: true,
        }
    }
}

impl ControllerConfig {
    /// Parse a JSON document and validate it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Validation`] for out-of-range values.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.error_display_ms == 0 {
            return Err(ConfigError::Validation("error_display_ms must be > 0".into()));
        }
        if self.save_event_name.trim().is_empty() {
            return Err(ConfigError::Validation("save_event_name must not be empty".into()));
        }
        if self.success_route.trim().is_empty() {
            return Err(ConfigError::Validation("success_route must not be empty".into()));
        }
        Ok(())
    }

    #[must_use]
    pub fn error_display(&self) -> Duration {
        Duration::from_millis(self.error_display_ms)
    }
}
