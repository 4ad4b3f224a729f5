use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::VisibilityPolicy;

pub const DEFAULT_REACH_DISTANCE: f32 = 1200.0;
pub const DEFAULT_TIMED_DURATION_SECONDS: f32 = 10.0;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: f32 = 1.0;
pub const DEFAULT_FIXED_DT_SECONDS: f32 = 0.1;
pub const DEFAULT_DELIVERY_DELAY_TICKS: u32 = 1;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config json at {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config value at {path}: {message}")]
    Invalid { path: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractorConfig {
    pub reach_distance: f32,
    pub state_visibility: VisibilityPolicy,
    pub request_timeout_seconds: f32,
}

impl Default for InteractorConfig {
    fn default() -> Self {
        Self {
            reach_distance: DEFAULT_REACH_DISTANCE,
            state_visibility: VisibilityPolicy::OwnerOnly,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PointBehaviorConfig {
    Instant,
    Timed {
        #[serde(default = "default_timed_duration")]
        duration_seconds: f32,
    },
}

fn default_timed_duration() -> f32 {
    DEFAULT_TIMED_DURATION_SECONDS
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointConfig {
    pub behavior: PointBehaviorConfig,
    pub allow_concurrent_interactors: bool,
    pub visibility: VisibilityPolicy,
}

impl Default for PointConfig {
    fn default() -> Self {
        Self {
            behavior: PointBehaviorConfig::Instant,
            allow_concurrent_interactors: true,
            visibility: VisibilityPolicy::All,
        }
    }
}

impl PointConfig {
    pub fn timed(duration_seconds: f32) -> Self {
        Self {
            behavior: PointBehaviorConfig::Timed { duration_seconds },
            ..Self::default()
        }
    }

    pub fn instant() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub fixed_dt_seconds: f32,
    pub delivery_delay_ticks: u32,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            fixed_dt_seconds: DEFAULT_FIXED_DT_SECONDS,
            delivery_delay_ticks: DEFAULT_DELIVERY_DELAY_TICKS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    pub network: NetworkConfig,
    pub interactor: InteractorConfig,
    pub hold_point: PointConfig,
    pub pickup_point: PointConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            interactor: InteractorConfig::default(),
            hold_point: PointConfig::timed(DEFAULT_TIMED_DURATION_SECONDS),
            pickup_point: PointConfig::instant(),
        }
    }
}

impl SandboxConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        let config = serde_path_to_error::deserialize::<_, SandboxConfig>(&mut deserializer)
            .map_err(|error| {
                let path = error.path().to_string();
                ConfigError::Parse {
                    path,
                    source: error.into_inner(),
                }
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_positive_finite(self.network.fixed_dt_seconds) {
            return Err(invalid(
                "network.fixed_dt_seconds",
                self.network.fixed_dt_seconds,
            ));
        }
        validate_interactor(&self.interactor)?;
        validate_point("hold_point.behavior.duration_seconds", &self.hold_point)?;
        validate_point("pickup_point.behavior.duration_seconds", &self.pickup_point)?;
        if !matches!(self.hold_point.behavior, PointBehaviorConfig::Timed { .. }) {
            return Err(ConfigError::Invalid {
                path: "hold_point.behavior.kind",
                message: "hold point must be timed".to_string(),
            });
        }
        if self.pickup_point.behavior != PointBehaviorConfig::Instant {
            return Err(ConfigError::Invalid {
                path: "pickup_point.behavior.kind",
                message: "pickup point must be instant".to_string(),
            });
        }
        Ok(())
    }
}

pub fn validate_interactor(config: &InteractorConfig) -> Result<(), ConfigError> {
    if !is_positive_finite(config.reach_distance) {
        return Err(invalid("interactor.reach_distance", config.reach_distance));
    }
    if !is_positive_finite(config.request_timeout_seconds) {
        return Err(invalid(
            "interactor.request_timeout_seconds",
            config.request_timeout_seconds,
        ));
    }
    Ok(())
}

pub fn validate_point(path: &'static str, config: &PointConfig) -> Result<(), ConfigError> {
    match config.behavior {
        PointBehaviorConfig::Instant => Ok(()),
        PointBehaviorConfig::Timed { duration_seconds } if is_positive_finite(duration_seconds) => {
            Ok(())
        }
        PointBehaviorConfig::Timed { duration_seconds } => Err(invalid(path, duration_seconds)),
    }
}

pub(crate) fn is_positive_finite(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

fn invalid(path: &'static str, value: f32) -> ConfigError {
    ConfigError::Invalid {
        path,
        message: format!("expected a finite value > 0, got {value}"),
    }
}
