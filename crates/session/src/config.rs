use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tilehop_kernel::DEFAULT_BOUNCE_RATE;

/// Errors from loading or validating a [`SessionConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for one session. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Board seed. `None` seeds from the clock.
    pub seed: Option<u64>,
    /// Minimum seconds between obstacle layouts.
    pub obstacle_interval_secs: f64,
    /// Moving-tile speed in height units per second.
    pub bounce_rate: f32,
    /// Upper bound on the animation step of a single tick.
    pub max_frame_delta_secs: f64,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            seed: None,
            obstacle_interval_secs: 6.0,
            bounce_rate: DEFAULT_BOUNCE_RATE,
            max_frame_delta_secs: 0.1,
            window_width: 1000,
            window_height: 1000,
        }
    }
}

impl SessionConfig {
    /// Read and validate a YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&text)?;
        tracing::debug!(path = %path.display(), ?config, "session config loaded");
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("obstacle_interval_secs", self.obstacle_interval_secs)?;
        positive("bounce_rate", f64::from(self.bounce_rate))?;
        positive("max_frame_delta_secs", self.max_frame_delta_secs)?;
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window_width, self.window_height
            )));
        }
        Ok(())
    }

    pub fn obstacle_interval(&self) -> Duration {
        Duration::from_secs_f64(self.obstacle_interval_secs)
    }

    pub fn max_frame_delta(&self) -> Duration {
        Duration::from_secs_f64(self.max_frame_delta_secs)
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{field} must be positive, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(config.obstacle_interval(), Duration::from_secs(6));
        assert_eq!(config.bounce_rate, 30.0);
        assert_eq!(config.max_frame_delta(), Duration::from_millis(100));
        assert_eq!((config.window_width, config.window_height), (1000, 1000));
        config.validate().unwrap();
    }

    #[test]
    fn yaml_round_trips_defaults() {
        let config = SessionConfig::default();
        let text = config.to_yaml().unwrap();
        assert_eq!(SessionConfig::from_yaml(&text).unwrap(), config);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let config = SessionConfig::from_yaml("seed: 7\nbounce_rate: 12.5\n").unwrap();
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.bounce_rate, 12.5);
        assert_eq!(config.obstacle_interval_secs, 6.0);
    }

    #[test]
    fn rejects_non_positive_values() {
        let err = SessionConfig::from_yaml("obstacle_interval_secs: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref m) if m.contains("obstacle_interval_secs")));

        let err = SessionConfig::from_yaml("bounce_rate: -1").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = SessionConfig::from_yaml("window_width: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = SessionConfig::from_yaml("seed: [not a number").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = SessionConfig::load(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
