//! Application settings.
//!
//! Settings are read from a JSON file when one is present and fall back to
//! built-in defaults otherwise. Every field is optional in the file.

use super::camera::CameraConfig;
use crate::geo::DEFAULT_SCREEN_BIAS_Y;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming an explicit settings file.
pub const SETTINGS_PATH_ENV: &str = "FLIGHT_GLOBE_SETTINGS";
/// Environment variable overriding [`GlobeSettings::feed_url`].
pub const FEED_URL_ENV: &str = "FR24_SERVER_URL";
/// Settings file looked up in the working directory.
const DEFAULT_SETTINGS_FILE: &str = "flight-globe.json";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed settings: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobeSettings {
    /// Projected map width in world units.
    pub map_width: f64,
    /// Projected map height in world units.
    pub map_height: f64,
    pub offset_x: f64,
    pub offset_y: f64,
    /// Vertical bias added by the projection's screen mapping.
    pub screen_bias_y: f64,

    /// Flight feed URL template; `%d` is replaced with the Unix time.
    /// No polling happens when unset.
    pub feed_url: Option<String>,
    pub poll_interval_ms: u64,

    /// Map file to load instead of the embedded one.
    pub map_path: Option<PathBuf>,
    /// Test point file to load instead of the embedded one.
    pub test_points_path: Option<PathBuf>,

    /// Start with empty outlines and reveal them vertex by vertex on Enter.
    pub progressive_reveal: bool,
    /// Reveal scheduler sleep when there is nothing to do.
    pub reveal_idle_ms: u64,

    pub camera: CameraConfig,
}

impl Default for GlobeSettings {
    fn default() -> Self {
        Self {
            map_width: 20450.0,
            map_height: 10350.0,
            offset_x: 0.0,
            offset_y: 0.0,
            screen_bias_y: DEFAULT_SCREEN_BIAS_Y,
            feed_url: None,
            poll_interval_ms: 1000,
            map_path: None,
            test_points_path: None,
            progressive_reveal: false,
            reveal_idle_ms: 5,
            camera: CameraConfig::default(),
        }
    }
}

impl GlobeSettings {
    /// Loads settings from the configured file and environment.
    ///
    /// A missing file means defaults; an unreadable or malformed one is
    /// logged and also yields defaults.
    pub fn load() -> Self {
        let explicit = std::env::var_os(SETTINGS_PATH_ENV).map(PathBuf::from);
        let path = explicit
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE));

        let mut settings = if explicit.is_some() || path.exists() {
            match Self::from_file(&path) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Using default settings: {}", e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };

        settings.apply_feed_override(std::env::var(FEED_URL_ENV).ok());
        settings
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let json = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Replaces the feed URL with a non-empty override.
    pub fn apply_feed_override(&mut self, url: Option<String>) {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            log::info!("Feed URL taken from ${}", FEED_URL_ENV);
            self.feed_url = Some(url);
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn reveal_idle(&self) -> Duration {
        Duration::from_millis(self.reveal_idle_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        assert_eq!(GlobeSettings::from_json("{}").unwrap(), GlobeSettings::default());
    }

    #[test]
    fn test_partial_json() {
        let settings = GlobeSettings::from_json(
            r#"{
                "feed_url": "https://feed.example/?t=%d",
                "progressive_reveal": true,
                "camera": { "max_zoom": 4.0 }
            }"#,
        )
        .unwrap();

        assert_eq!(settings.feed_url.as_deref(), Some("https://feed.example/?t=%d"));
        assert!(settings.progressive_reveal);
        assert_eq!(settings.camera.max_zoom, 4.0);
        assert_eq!(settings.camera.zoom_step, 1.025);
        assert_eq!(settings.map_width, 20450.0);
        assert_eq!(settings.poll_interval(), Duration::from_secs(1));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            GlobeSettings::from_json(r#"{ "map_width": "wide" }"#),
            Err(SettingsError::Json(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = GlobeSettings::from_file(Path::new("/nonexistent/flight-globe.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn test_feed_override() {
        let mut settings = GlobeSettings::default();
        settings.apply_feed_override(Some("  ".to_string()));
        assert_eq!(settings.feed_url, None);

        settings.apply_feed_override(Some("https://feed.example/%d".to_string()));
        assert_eq!(settings.feed_url.as_deref(), Some("https://feed.example/%d"));

        settings.apply_feed_override(None);
        assert_eq!(settings.feed_url.as_deref(), Some("https://feed.example/%d"));
    }
}
