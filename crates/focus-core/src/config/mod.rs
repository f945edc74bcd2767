//! Client configuration.
//!
//! `RemoteConfig` carries the public Supabase endpoint and anon key used by
//! the remote store and the identity provider. `SyncSettings` tunes the
//! auto-sync trigger and the local history window.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::util::{is_http_url, normalize_text_option};

pub const DEFAULT_AUTO_SYNC_DELAY_MS: u64 = 2_500;
pub const MAX_AUTO_SYNC_DELAY_MS: u64 = 60_000;
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Public remote endpoint. Secret credentials never belong here.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    #[serde(default)]
    pub supabase_url: Option<String>,
    #[serde(default)]
    pub supabase_anon_key: Option<String>,
}

impl RemoteConfig {
    /// Both values, trimmed, or `None` when the remote is not configured.
    pub fn resolve(&self) -> Result<Option<(String, String)>> {
        let url = normalize_text_option(self.supabase_url.clone());
        let anon_key = normalize_text_option(self.supabase_anon_key.clone());

        match (url, anon_key) {
            (None, None) => Ok(None),
            (Some(url), Some(anon_key)) => {
                if !is_http_url(&url) {
                    return Err(Error::InvalidInput(format!(
                        "Supabase URL must include http:// or https://: {url}"
                    )));
                }
                Ok(Some((url, anon_key)))
            }
            (Some(_), None) => Err(Error::InvalidInput(
                "Supabase anon key is missing for the configured URL".to_string(),
            )),
            (None, Some(_)) => Err(Error::InvalidInput(
                "Supabase URL is missing for the configured anon key".to_string(),
            )),
        }
    }
}

/// Auto-sync and history tuning
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SyncSettings {
    #[serde(default = "default_auto_sync_delay_ms")]
    pub auto_sync_delay_ms: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            auto_sync_delay_ms: DEFAULT_AUTO_SYNC_DELAY_MS,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl SyncSettings {
    pub fn validate(&self) -> Result<()> {
        if self.auto_sync_delay_ms == 0 || self.auto_sync_delay_ms > MAX_AUTO_SYNC_DELAY_MS {
            return Err(Error::InvalidInput(format!(
                "auto_sync_delay_ms must be between 1 and {MAX_AUTO_SYNC_DELAY_MS}"
            )));
        }
        if self.history_limit == 0 {
            return Err(Error::InvalidInput(
                "history_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub const fn auto_sync_delay(&self) -> Duration {
        Duration::from_millis(self.auto_sync_delay_ms)
    }
}

const fn default_auto_sync_delay_ms() -> u64 {
    DEFAULT_AUTO_SYNC_DELAY_MS
}

const fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_use_defaults() {
        let settings: SyncSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, SyncSettings::default());
        assert_eq!(settings.auto_sync_delay(), Duration::from_millis(2_500));
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let zero_delay = SyncSettings {
            auto_sync_delay_ms: 0,
            ..SyncSettings::default()
        };
        assert!(zero_delay.validate().is_err());

        let long_delay = SyncSettings {
            auto_sync_delay_ms: MAX_AUTO_SYNC_DELAY_MS + 1,
            ..SyncSettings::default()
        };
        assert!(long_delay.validate().is_err());

        let no_history = SyncSettings {
            history_limit: 0,
            ..SyncSettings::default()
        };
        assert!(no_history.validate().is_err());
        assert!(SyncSettings::default().validate().is_ok());
    }

    #[test]
    fn unknown_settings_are_rejected() {
        assert!(serde_json::from_str::<SyncSettings>(r#"{"retries": 3}"#).is_err());
    }

    #[test]
    fn remote_config_requires_both_values() {
        assert!(RemoteConfig::default().resolve().unwrap().is_none());

        let half = RemoteConfig {
            supabase_url: Some("https://demo.supabase.co".to_string()),
            supabase_anon_key: Some("  ".to_string()),
        };
        assert!(half.resolve().is_err());

        let full = RemoteConfig {
            supabase_url: Some(" https://demo.supabase.co ".to_string()),
            supabase_anon_key: Some("anon".to_string()),
        };
        assert_eq!(
            full.resolve().unwrap(),
            Some(("https://demo.supabase.co".to_string(), "anon".to_string()))
        );
    }
}
