use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::export::pipeline::ExportedFile;
use crate::foundation::core::Side;
use crate::foundation::error::StudioResult;

/// Apparel product with optional per-side artwork.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub base_price: f64,
    #[serde(default)]
    pub front_image_url: Option<String>,
    #[serde(default)]
    pub back_image_url: Option<String>,
}

impl Product {
    /// Background URL for `side`; blank URLs count as missing.
    pub fn image_url(&self, side: Side) -> Option<&str> {
        let url = match side {
            Side::Front => self.front_image_url.as_deref(),
            Side::Back => self.back_image_url.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }
}

/// A generated or uploaded design attached to an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDesign {
    pub id: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
}

/// Multipart payload of an order confirmation. Absent fields are not sent.
#[derive(Clone, Debug, Default)]
pub struct OrderConfirmation {
    pub phone_number: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub front_snapshot: Option<ExportedFile>,
    pub back_snapshot: Option<ExportedFile>,
    pub design_files: Vec<ExportedFile>,
    pub text_files: Vec<ExportedFile>,
}

/// Attached file of a design-generation request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Design-generation request: a prompt, an uploaded file, or both.
#[derive(Clone, Debug, Default)]
pub struct CreateOrderRequest {
    pub product_id: String,
    pub prompt: Option<String>,
    pub file: Option<UploadFile>,
    pub size: Option<String>,
}

/// The studio backend as seen by the editor.
#[async_trait]
pub trait StudioApi: Send + Sync {
    async fn get_product(&self, id: &str) -> StudioResult<Product>;

    async fn list_products(&self) -> StudioResult<Vec<Product>>;

    async fn order_designs(&self, order_id: &str) -> StudioResult<Vec<OrderDesign>>;

    /// Only success or failure matters; the response body is returned as-is.
    async fn confirm_order(
        &self,
        order_id: &str,
        payload: OrderConfirmation,
    ) -> StudioResult<serde_json::Value>;

    async fn create_order(&self, request: CreateOrderRequest) -> StudioResult<serde_json::Value>;
}

#[cfg(test)]
#[path = "../../tests/unit/client/api.rs"]
mod tests;
