/// Convenience result type used across the studio engine.
pub type StudioResult<T> = Result<T, StudioError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Soft failures (image fetches, tainted exports, malformed persisted state) are reported through
/// this type as well; callers in the editor swallow them and continue.
#[derive(thiserror::Error, Debug)]
pub enum StudioError {
    /// Invalid user-provided or persisted data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Image fetch or decode failures.
    #[error("asset error: {0}")]
    Asset(String),

    /// Raster surface failures (target too large, pixel buffer mismatch).
    #[error("render error: {0}")]
    Render(String),

    /// The surface holds cross-origin image data and refuses to be exported.
    #[error("export refused: surface is tainted by cross-origin image data")]
    Tainted,

    /// A collaborator answered with an unexpected status or payload.
    #[error("api error: {0}")]
    Api(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Transport-level HTTP failure.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StudioError {
    /// Build a [`StudioError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StudioError::Asset`] value.
    pub fn asset(msg: impl Into<String>) -> Self {
        Self::Asset(msg.into())
    }

    /// Build a [`StudioError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`StudioError::Api`] value.
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Build a [`StudioError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for failures the editor only logs.
    ///
    /// Design loads and full-side captures check this: soft failures are logged as warnings,
    /// anything else is logged as an error and a design load also raises a notice.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::Asset(_) | Self::Tainted | Self::Render(_))
    }
}

impl From<serde_json::Error> for StudioError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
