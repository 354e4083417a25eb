use serde::Serialize;

use crate::foundation::config::StudioConfig;
use crate::foundation::error::{StudioError, StudioResult};

/// Phase of the confirm flow.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorState {
    #[default]
    Idle,
    Exporting,
    Submitting,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// User-visible message raised by an editor action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Order details collected by the confirm dialog.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmForm {
    pub open: bool,
    pub phone_number: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl Default for ConfirmForm {
    fn default() -> Self {
        Self {
            open: false,
            phone_number: String::new(),
            size: None,
            color: Some("white".to_owned()),
        }
    }
}

impl ConfirmForm {
    /// Check the picked size and color against the options the config offers. Unset values
    /// pass.
    pub fn validate(&self, config: &StudioConfig) -> StudioResult<()> {
        check_option("size", self.size.as_deref(), &config.size_options)?;
        check_option("color", self.color.as_deref(), &config.color_options)
    }
}

fn check_option(
    what: &str,
    picked: Option<&str>,
    options: &[(String, String)],
) -> StudioResult<()> {
    match picked {
        Some(v) if !options.iter().any(|(value, _)| value == v) => {
            let offered: Vec<&str> = options.iter().map(|(value, _)| value.as_str()).collect();
            Err(StudioError::validation(format!(
                "unknown {what} '{v}' (offered: {})",
                offered.join(", ")
            )))
        }
        _ => Ok(()),
    }
}

/// Result of a successful confirmation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfirmOutcome {
    /// Where the user goes next.
    pub route: String,
    /// Names of the files the download sink saved, in save order.
    pub downloads: Vec<String>,
}
