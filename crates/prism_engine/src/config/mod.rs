//! Configuration system
//!
//! File-backed configuration with the format chosen by extension (TOML or
//! RON). All sections carry serde defaults so a partial file is valid.

use serde::{Deserialize, Serialize};

/// Configuration trait for file-backed settings types
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file.
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::Io)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file.
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, Default::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents).map_err(ConfigError::Io)
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Window settings
    pub window: WindowConfig,
    /// Renderer settings
    pub renderer: RendererConfig,
    /// Profiler settings
    pub profiler: ProfilerConfig,
}

impl Config for ApplicationConfig {}

/// Window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window title
    pub title: String,
    /// Initial client width in screen coordinates
    pub width: u32,
    /// Initial client height in screen coordinates
    pub height: u32,
    /// Whether the window may be resized by the user
    pub resizable: bool,
    /// Block on the OS event queue instead of polling every frame
    pub wait_for_events: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Prism Viewer".to_string(),
            width: 1280,
            height: 720,
            resizable: true,
            wait_for_events: false,
        }
    }
}

/// Renderer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Application name reported to the driver
    pub app_name: String,
    /// Enable the Khronos validation layer and debug messenger
    pub enable_validation: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            app_name: "Prism Viewer".to_string(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

/// Profiler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Number of frames kept in the rolling history
    pub history_frames: usize,
    /// Render the summary every this many frames
    pub report_interval: u64,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            history_frames: 120,
            report_interval: 60,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ApplicationConfig::default();

        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert!(config.window.resizable);
        assert_eq!(config.profiler.history_frames, 120);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let parsed: ApplicationConfig = toml::from_str(
            r#"
            [window]
            width = 800
            height = 600
            "#,
        )
        .unwrap();

        assert_eq!(parsed.window.width, 800);
        assert_eq!(parsed.window.height, 600);
        // Unspecified sections and fields keep their defaults.
        assert_eq!(parsed.window.title, "Prism Viewer");
        assert_eq!(parsed.profiler.report_interval, 60);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ApplicationConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: ApplicationConfig = toml::from_str(&text).unwrap();

        assert_eq!(parsed.window.width, config.window.width);
        assert_eq!(parsed.renderer.app_name, config.renderer.app_name);
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let result = ApplicationConfig::default().save_to_file("settings.yaml");
        assert!(matches!(result, Err(ConfigError::UnsupportedFormat(_))));
    }
}
