//! Configuration module.
//!
//! Handles loading, validating, and merging the capture `config.toml`.
//! Stock defaults are the base layer; a user file only needs the keys it
//! wants to override.
//!
//! ## Config File Location
//!
//! `fen-capture.toml` in the working directory, or any file passed with
//! `--config`. A missing file means stock defaults.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [service]
//! endpoint = "http://127.0.0.1:8000/predict"   # Prediction endpoint (http/https)
//!
//! [camera]
//! facing = "environment"    # "environment" (rear) or "user" (front)
//!
//! [crop]
//! aspect_ratio = 1.0        # Selection width / height
//! view_mode = 1             # 0 = unrestricted, 1-3 = keep selection inside image
//! drag_mode = "move"        # "move", "crop" or "none"
//! background = false        # Draw the grid background behind the image
//! auto_crop_area = 0.9      # Share of the image the first selection covers
//! movable = true
//! zoomable = true
//! scalable = true
//! rotatable = true
//!
//! [output]
//! size = 512                # Edge of the square upload image, pixels (1-4096)
//! quality = 90              # JPEG quality (1-100)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::camera::Facing;
use crate::crop::{CropOptions, OutputSpec, Quality};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config file looked up in the working directory when none is given.
pub const DEFAULT_CONFIG_FILE: &str = "fen-capture.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Capture configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    pub service: ServiceConfig,
    pub camera: CameraConfig,
    /// Crop surface options, passed to the engine as-is.
    pub crop: CropOptions,
    pub output: OutputConfig,
}

impl CaptureConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.service.endpoint_url()?;
        if !(self.crop.aspect_ratio.is_finite() && self.crop.aspect_ratio > 0.0) {
            return Err(ConfigError::Validation(
                "crop.aspect_ratio must be positive".into(),
            ));
        }
        if !(self.crop.auto_crop_area > 0.0 && self.crop.auto_crop_area <= 1.0) {
            return Err(ConfigError::Validation(
                "crop.auto_crop_area must be in (0, 1]".into(),
            ));
        }
        if self.crop.view_mode > 3 {
            return Err(ConfigError::Validation("crop.view_mode must be 0-3".into()));
        }
        if !(1..=MAX_OUTPUT_SIZE).contains(&self.output.size) {
            return Err(ConfigError::Validation(format!(
                "output.size must be 1-{MAX_OUTPUT_SIZE}"
            )));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::Validation(
                "output.quality must be 1-100".into(),
            ));
        }
        Ok(())
    }

    pub fn output_spec(&self) -> OutputSpec {
        OutputSpec {
            size: self.output.size,
            quality: Quality::new(self.output.quality),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// Full URL the board image is POSTed to.
    pub endpoint: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8000/predict".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Parse the endpoint, accepting only absolute http(s) URLs.
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        parse_endpoint(&self.endpoint)
    }
}

/// Parse a prediction endpoint, accepting only absolute http(s) URLs.
pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::Validation(format!("service.endpoint {raw:?} is not a URL: {e}"))
    })?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        _ => Err(ConfigError::Validation(format!(
            "service.endpoint {raw:?} must be an http or https URL"
        ))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CameraConfig {
    pub facing: Facing,
}

/// Largest upload edge accepted, well inside the JPEG encoder's 65535 px limit.
pub const MAX_OUTPUT_SIZE: u32 = 4096;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub size: u32,
    pub quality: u32,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let spec = OutputSpec::default();
        Self {
            size: spec.size,
            quality: spec.quality.value(),
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(CaptureConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist, `Err` if it exists but is
/// not valid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<CaptureConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: CaptureConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<CaptureConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fen-capture Configuration
# =========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Prediction service
# ---------------------------------------------------------------------------
[service]
# Absolute http(s) URL the cropped board image is POSTed to.
endpoint = "http://127.0.0.1:8000/predict"

# ---------------------------------------------------------------------------
# Camera
# ---------------------------------------------------------------------------
[camera]
# "environment" for the rear camera, "user" for the front camera.
facing = "environment"

# ---------------------------------------------------------------------------
# Crop surface
# ---------------------------------------------------------------------------
[crop]
# Selection width / height. Boards are square.
aspect_ratio = 1.0

# 0 leaves the selection unrestricted; 1-3 keep it inside the image.
view_mode = 1

# What dragging does: "move" the image, "crop" the selection, or "none".
drag_mode = "move"

# Draw a grid background behind the image.
background = false

# Share of the image the initial selection covers, in (0, 1].
auto_crop_area = 0.9

# Which adjustments are allowed.
movable = true
zoomable = true
scalable = true
rotatable = true

# ---------------------------------------------------------------------------
# Upload image
# ---------------------------------------------------------------------------
[output]
# Edge length of the square image sent to the service, in pixels (1-4096).
size = 512

# JPEG quality (1 = worst, 100 = best).
quality = 90
"##
}
