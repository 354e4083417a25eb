use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{StudioError, StudioResult};

const DEFAULT_API_URL: &str = "https://dev.api.cre8.local";

/// Runtime configuration for an editor session.
///
/// Every field has a default, so an empty JSON object (or no file at all) is a valid config.
/// Environment variables override file values, see [`StudioConfig::apply_env`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct StudioConfig {
    /// Base URL of the studio API (`/api/...` paths are appended).
    pub api_url: String,
    /// Surface width used when the container reports no width.
    pub default_width: u32,
    /// Fixed surface height.
    pub surface_height: u32,
    /// Clear color painted under the background in composite snapshots.
    pub clear_color: String,
    /// Directory scanned for `.ttf`/`.otf`/`.ttc` font files.
    pub fonts_dir: Option<PathBuf>,
    /// Fall back to installed system fonts for families `fonts_dir` does not provide.
    pub system_fonts: bool,
    /// JSON file backing the persisted client state.
    pub store_path: Option<PathBuf>,
    /// Directory receiving downloaded export files.
    pub download_dir: PathBuf,
    /// Upper bound for waiting on a background image before a capture.
    pub background_timeout_ms: u64,
    /// Raster multiplier for per-layer exports.
    pub export_multiplier: f64,
    /// Font families offered for text layers.
    pub fonts: Vec<String>,
    /// Garment sizes offered in the confirm form (value, label). Other sizes are rejected.
    pub size_options: Vec<(String, String)>,
    /// Garment colors offered in the confirm form (value, label). Other colors are rejected.
    pub color_options: Vec<(String, String)>,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_owned(),
            default_width: 960,
            surface_height: 640,
            clear_color: "#0b0d17".to_owned(),
            fonts_dir: None,
            system_fonts: true,
            store_path: None,
            download_dir: PathBuf::from("exports"),
            background_timeout_ms: 5_000,
            export_multiplier: 2.0,
            fonts: ["Space Grotesk", "Inter", "Poppins", "Roboto Mono"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            size_options: [("s", "Small"), ("m", "Medium"), ("l", "Large"), ("xl", "XL")]
                .into_iter()
                .map(|(v, l)| (v.to_owned(), l.to_owned()))
                .collect(),
            color_options: [("black", "Black"), ("white", "White")]
                .into_iter()
                .map(|(v, l)| (v.to_owned(), l.to_owned()))
                .collect(),
        }
    }
}

impl StudioConfig {
    /// Load a JSON config file and apply environment overrides.
    pub fn from_path(path: impl AsRef<Path>) -> StudioResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        let mut cfg: Self = serde_json::from_str(&raw)
            .map_err(|e| StudioError::serde(format!("config '{}': {e}", path.display())))?;
        cfg.apply_env();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.apply_env();
        cfg
    }

    /// Apply `CRE8_*` environment overrides in place.
    ///
    /// `NG_APP_API_URL` is honoured as a secondary source for the API base URL.
    pub fn apply_env(&mut self) {
        if let Some(url) = env_string("CRE8_API_URL").or_else(|| env_string("NG_APP_API_URL")) {
            self.api_url = url;
        }
        if let Some(dir) = env_string("CRE8_FONTS_DIR") {
            self.fonts_dir = Some(PathBuf::from(dir));
        }
        if let Some(flag) = env_string("CRE8_SYSTEM_FONTS") {
            self.system_fonts = !matches!(
                flag.to_ascii_lowercase().as_str(),
                "0" | "false" | "no" | "off"
            );
        }
        if let Some(p) = env_string("CRE8_STORE_PATH") {
            self.store_path = Some(PathBuf::from(p));
        }
        if let Some(dir) = env_string("CRE8_DOWNLOAD_DIR") {
            self.download_dir = PathBuf::from(dir);
        }
        if let Some(ms) = std::env::var("CRE8_BACKGROUND_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            self.background_timeout_ms = ms;
        }
    }

    pub fn validate(&self) -> StudioResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(StudioError::validation("api_url must be non-empty"));
        }
        if self.surface_height == 0 || self.default_width == 0 {
            return Err(StudioError::validation("surface dimensions must be > 0"));
        }
        if self.surface_height > u32::from(u16::MAX) || self.default_width > u32::from(u16::MAX) {
            return Err(StudioError::validation("surface dimensions must fit in u16"));
        }
        if !self.export_multiplier.is_finite() || self.export_multiplier <= 0.0 {
            return Err(StudioError::validation(
                "export_multiplier must be finite and > 0",
            ));
        }
        Rgba8::parse_hex(&self.clear_color)?;
        Ok(())
    }

    /// API base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn background_timeout(&self) -> Duration {
        Duration::from_millis(self.background_timeout_ms)
    }

    pub fn clear_rgba(&self) -> Rgba8 {
        Rgba8::parse_or(&self.clear_color, Rgba8::rgb(0x0b, 0x0d, 0x17))
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
