//! Feature flags configuration

use serde::Deserialize;

/// Feature flags for enabling/disabling functionality
#[derive(Debug, Clone, Deserialize, Default)]
pub struct FeatureFlags {
    /// Include provider error details in 500 responses outside development
    #[serde(default)]
    pub verbose_errors: bool,

    /// Emit JSON log lines even outside production
    #[serde(default)]
    pub json_logs: bool,
}
