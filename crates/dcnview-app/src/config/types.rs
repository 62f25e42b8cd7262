//! Configuration types for dcnview
//!
//! Defines:
//! - `Settings` - user settings read from `config.toml`
//! - `AppConfig` - the start-up record handed to the engine

use std::time::Duration;

use serde::{Deserialize, Serialize};

use dcnview_core::SubscriptionPattern;

/// Application settings (`<config dir>/dcnview/config.toml`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub ui: UiSettings,

    #[serde(default)]
    pub discovery: DiscoverySettings,

    #[serde(default)]
    pub commands: SubscriptionSettings,

    #[serde(default)]
    pub info: SubscriptionSettings,
}

/// UI settings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UiSettings {
    #[serde(default)]
    pub layout: LayoutOrientation,
}

/// Which tree levels are laid out side by side instead of stacked
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct LayoutOrientation {
    #[serde(default)]
    pub device_horizontal: bool,

    #[serde(default)]
    pub category_horizontal: bool,

    #[serde(default)]
    pub object_horizontal: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DiscoverySettings {
    /// Upper bound on each add/update lookup
    #[serde(default = "default_lookup_timeout_ms")]
    pub lookup_timeout_ms: u64,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            lookup_timeout_ms: default_lookup_timeout_ms(),
        }
    }
}

fn default_lookup_timeout_ms() -> u64 {
    5000
}

/// Transport subscription for one entity kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubscriptionSettings {
    /// Skip subscribing altogether
    #[serde(default)]
    pub ignore: bool,

    #[serde(default)]
    pub mac: String,

    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub category: String,

    #[serde(default)]
    pub name: String,
}

impl SubscriptionSettings {
    pub fn pattern(&self) -> SubscriptionPattern {
        SubscriptionPattern::new(&self.mac, &self.service, &self.category, &self.name)
    }
}

/// Start-up configuration, built once and passed to the engine
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub version: String,
    pub lookup_timeout: Duration,
    pub layout: LayoutOrientation,
}

impl AppConfig {
    pub fn from_settings(version: impl Into<String>, settings: &Settings) -> Self {
        Self {
            version: version.into(),
            lookup_timeout: Duration::from_millis(settings.discovery.lookup_timeout_ms),
            layout: settings.ui.layout,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_settings(env!("CARGO_PKG_VERSION"), &Settings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.discovery.lookup_timeout_ms, 5000);
        assert!(!settings.commands.ignore);
        assert!(!settings.ui.layout.device_horizontal);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
[ui.layout]
object_horizontal = true

[info]
mac = "aa:bb"
name = "level|voltage"
"#,
        )
        .unwrap();

        assert!(settings.ui.layout.object_horizontal);
        assert!(!settings.ui.layout.category_horizontal);
        assert_eq!(settings.discovery.lookup_timeout_ms, 5000);
        assert_eq!(
            settings.info.pattern(),
            SubscriptionPattern::new("aa:bb", "", "", "level|voltage")
        );
    }

    #[test]
    fn test_app_config_from_settings() {
        let mut settings = Settings::default();
        settings.discovery.lookup_timeout_ms = 250;
        settings.ui.layout.device_horizontal = true;

        let config = AppConfig::from_settings("1.2.3", &settings);
        assert_eq!(config.version, "1.2.3");
        assert_eq!(config.lookup_timeout, Duration::from_millis(250));
        assert!(config.layout.device_horizontal);
    }
}
