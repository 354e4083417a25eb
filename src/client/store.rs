use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde_json::{Map, Value};

use crate::client::api::Product;
use crate::export::identity::identity_slug;
use crate::foundation::error::StudioResult;

const ACCESS_TOKEN: &str = "accessToken";
const REFRESH_TOKEN: &str = "refreshToken";
const USER_EMAIL: &str = "userEmail";
const USER: &str = "user";
const SELECTED_PRODUCT: &str = "selectedProduct";

/// Persisted client state: a flat JSON object on disk.
///
/// Reads never fail. A missing file, malformed JSON or a wrongly typed entry reads as absent.
#[derive(Clone, Debug, Default)]
pub struct ClientStore {
    path: Option<PathBuf>,
    entries: Map<String, Value>,
}

impl ClientStore {
    /// Store that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load `path`, falling back to an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Value>(&raw) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    tracing::warn!(path = %path.display(), "ignoring malformed client store");
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "client store unreadable");
                Map::new()
            }
        };
        Self {
            path: Some(path),
            entries,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn string(&self, key: &str) -> Option<String> {
        self.entries
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
    }

    pub fn access_token(&self) -> Option<String> {
        self.string(ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.string(REFRESH_TOKEN)
    }

    pub fn user_email(&self) -> Option<String> {
        self.string(USER_EMAIL)
    }

    /// Raw stored user record (an object, or a JSON-encoded string).
    pub fn user(&self) -> Option<&Value> {
        self.entries.get(USER)
    }

    /// Last loaded product, if it still parses.
    pub fn selected_product(&self) -> Option<Product> {
        let value = self.entries.get(SELECTED_PRODUCT)?;
        let parsed = match value {
            Value::String(raw) => serde_json::from_str::<Product>(raw),
            other => serde_json::from_value::<Product>(other.clone()),
        };
        match parsed {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed selected product");
                None
            }
        }
    }

    pub fn identity_slug(&self) -> String {
        identity_slug(self.user(), self.user_email().as_deref())
    }

    /// Remember a signed-in session.
    pub fn set_session(&mut self, access_token: &str, refresh_token: &str, email: &str) {
        self.entries.insert(ACCESS_TOKEN.into(), Value::from(access_token));
        self.entries.insert(REFRESH_TOKEN.into(), Value::from(refresh_token));
        self.entries.insert(USER_EMAIL.into(), Value::from(email));
    }

    pub fn set_user(&mut self, user: Value) {
        self.entries.insert(USER.into(), user);
    }

    pub fn set_selected_product(&mut self, product: &Product) -> StudioResult<()> {
        self.entries
            .insert(SELECTED_PRODUCT.into(), serde_json::to_value(product)?);
        Ok(())
    }

    pub fn clear_session(&mut self) {
        for key in [ACCESS_TOKEN, REFRESH_TOKEN, USER_EMAIL, USER] {
            self.entries.remove(key);
        }
    }

    /// Write the store back to its file. In-memory stores do nothing.
    pub fn save(&self) -> StudioResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create store dir '{}'", dir.display()))?;
        }
        let raw = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(path, raw).with_context(|| format!("write store '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/client/store.rs"]
mod tests;
