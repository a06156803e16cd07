//! Persisted kiosk configuration.
//!
//! Stored in the preferences partition as a postcard blob. A blob that fails
//! to decode is replaced by the defaults at boot.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

use crate::menu::DisplayParams;
use crate::sampling::WEIGHT_FILTER_WINDOW;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub display: DisplayConfig,
    pub sensors: SensorConfig,
    pub sync: SyncConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub params: DisplayParams,
    /// Minimum time between unforced menu redraws.
    pub redraw_interval_ms: u64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SensorConfig {
    /// Distance from the ultrasonic sensor to the floor.
    pub pole_height_cm: f32,
    /// Load cell readings averaged before a weight counts as stable, at most
    /// [`WEIGHT_FILTER_WINDOW`].
    pub weight_filter_window: u8,
    /// Largest spread across the filter window still treated as a still child.
    pub stable_tolerance_kg: f32,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SyncConfig {
    /// How often the worker polls the remote session document.
    pub poll_interval_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            params: DisplayParams::kiosk(),
            redraw_interval_ms: 250,
        }
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            pole_height_cm: 199.0,
            weight_filter_window: WEIGHT_FILTER_WINDOW as u8,
            stable_tolerance_kg: 0.1,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config blob could not be decoded: {0}")]
    Decode(postcard::Error),
    #[error("Config could not be encoded: {0}")]
    Encode(postcard::Error),
    #[error("Invalid display geometry: {reason}")]
    InvalidDisplay { reason: &'static str },
    #[error("Invalid sensor settings: {reason}")]
    InvalidSensors { reason: &'static str },
}

impl Config {
    /// Decode and validate a stored blob.
    pub fn decode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Config = postcard::from_bytes(bytes).map_err(ConfigError::Decode)?;
        config.validate()?;
        Ok(config)
    }

    /// Decode a stored blob, falling back to defaults when it is unusable.
    pub fn decode_or_default(bytes: &[u8]) -> Self {
        match Self::decode(bytes) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}; using default config", e);
                Self::default()
            }
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(ConfigError::Encode)
    }

    /// Reject geometry the menu engine cannot lay out and filter windows the
    /// scale cannot hold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let params = &self.display.params;
        if params.visible_rows == 0 {
            return Err(ConfigError::InvalidDisplay {
                reason: "visible_rows must be at least 1",
            });
        }
        if params.row_height == 0 {
            return Err(ConfigError::InvalidDisplay {
                reason: "row_height must be at least 1",
            });
        }
        let needed = u32::try_from(params.visible_rows)
            .ok()
            .and_then(|rows| params.row_height.checked_mul(rows))
            .and_then(|rows_px| rows_px.checked_add(params.top_margin));
        match needed {
            Some(px) if px <= params.height => {}
            _ => {
                return Err(ConfigError::InvalidDisplay {
                    reason: "rows do not fit on the panel",
                });
            }
        }
        let window = usize::from(self.sensors.weight_filter_window);
        if window == 0 || window > WEIGHT_FILTER_WINDOW {
            return Err(ConfigError::InvalidSensors {
                reason: "weight_filter_window must be between 1 and 10",
            });
        }
        Ok(())
    }
}
