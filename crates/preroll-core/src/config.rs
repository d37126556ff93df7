//! Controller configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default length of the forced-view period
pub const DEFAULT_MANDATORY_VIEW_SECONDS: u32 = 15;

/// The single video resource played by the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAsset {
    /// Resource locator, relative to the host origin
    pub src: String,
    /// MIME type announced to the media element
    pub mime_type: String,
}

impl Default for MediaAsset {
    fn default() -> Self {
        Self {
            src: "/video/ad.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
        }
    }
}

/// Ad controller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdConfig {
    /// Length of the forced-view period before skip is permitted (seconds)
    pub mandatory_view_seconds: u32,
    /// Video played full-screen
    pub asset: MediaAsset,
}

impl Default for AdConfig {
    fn default() -> Self {
        Self {
            mandatory_view_seconds: DEFAULT_MANDATORY_VIEW_SECONDS,
            asset: MediaAsset::default(),
        }
    }
}

impl AdConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: AdConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.mandatory_view_seconds == 0 {
            return Err(Error::InvalidConfig(
                "mandatory_view_seconds must be greater than zero".to_string(),
            ));
        }
        if self.asset.src.trim().is_empty() {
            return Err(Error::InvalidConfig("asset.src must not be empty".to_string()));
        }
        if !self.asset.mime_type.starts_with("video/") {
            return Err(Error::InvalidConfig(format!(
                "asset.mime_type must be a video type, got '{}'",
                self.asset.mime_type
            )));
        }
        Ok(())
    }
}
