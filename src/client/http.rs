use async_trait::async_trait;
use reqwest::multipart;
use serde::de::DeserializeOwned;

use crate::client::api::{CreateOrderRequest, OrderConfirmation, OrderDesign, Product, StudioApi};
use crate::export::pipeline::ExportedFile;
use crate::foundation::error::{StudioError, StudioResult};

/// [`StudioApi`] over HTTP.
///
/// Every request carries `Authorization: Bearer <token>` when a token is set.
#[derive(Clone, Debug)]
pub struct HttpApi {
    client: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl HttpApi {
    pub fn new(base_url: &str, token: Option<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, token)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str, token: Option<String>) -> Self {
        Self {
            client,
            base: base_url.trim_end_matches('/').to_owned(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base, path.trim_start_matches('/'))
    }

    fn authed(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(t) => req.bearer_auth(t),
            None => req,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> StudioResult<T> {
        let url = self.url(path);
        let resp = self.authed(self.client.get(&url)).send().await?;
        let resp = check_status("GET", &url, resp).await?;
        Ok(resp.json::<T>().await?)
    }

    async fn post_form(&self, path: &str, form: multipart::Form) -> StudioResult<serde_json::Value> {
        let url = self.url(path);
        let resp = self
            .authed(self.client.post(&url))
            .multipart(form)
            .send()
            .await?;
        let resp = check_status("POST", &url, resp).await?;
        let body = resp.text().await?;
        Ok(parse_body(&body))
    }
}

async fn check_status(
    method: &str,
    url: &str,
    resp: reqwest::Response,
) -> StudioResult<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(StudioError::api(format!(
        "{method} {url} returned {status}: {}",
        body.chars().take(200).collect::<String>()
    )))
}

/// Opaque response bodies: JSON when it parses, the raw text otherwise, `null` when empty.
fn parse_body(body: &str) -> serde_json::Value {
    if body.trim().is_empty() {
        return serde_json::Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| serde_json::Value::String(body.to_owned()))
}

fn file_part(file: &ExportedFile) -> StudioResult<multipart::Part> {
    Ok(multipart::Part::bytes(file.bytes.clone())
        .file_name(file.name.clone())
        .mime_str(ExportedFile::MIME)?)
}

pub(crate) fn confirmation_form(payload: &OrderConfirmation) -> StudioResult<multipart::Form> {
    let mut form = multipart::Form::new();
    let texts = [
        ("phoneNumber", &payload.phone_number),
        ("size", &payload.size),
        ("color", &payload.color),
    ];
    for (name, value) in texts {
        if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
            form = form.text(name, v.clone());
        }
    }
    if let Some(f) = &payload.front_snapshot {
        form = form.part("frontSnapshot", file_part(f)?);
    }
    if let Some(f) = &payload.back_snapshot {
        form = form.part("backSnapshot", file_part(f)?);
    }
    for f in &payload.design_files {
        form = form.part("designFiles", file_part(f)?);
    }
    for f in &payload.text_files {
        form = form.part("textFiles", file_part(f)?);
    }
    Ok(form)
}

#[async_trait]
impl StudioApi for HttpApi {
    async fn get_product(&self, id: &str) -> StudioResult<Product> {
        self.get_json(&format!("products/{id}")).await
    }

    async fn list_products(&self) -> StudioResult<Vec<Product>> {
        self.get_json("products").await
    }

    async fn order_designs(&self, order_id: &str) -> StudioResult<Vec<OrderDesign>> {
        self.get_json(&format!("orders/{order_id}/designs")).await
    }

    #[tracing::instrument(skip(self, payload), fields(
        designs = payload.design_files.len(),
        texts = payload.text_files.len(),
    ))]
    async fn confirm_order(
        &self,
        order_id: &str,
        payload: OrderConfirmation,
    ) -> StudioResult<serde_json::Value> {
        let form = confirmation_form(&payload)?;
        self.post_form(&format!("orders/{order_id}/confirm"), form).await
    }

    async fn create_order(&self, request: CreateOrderRequest) -> StudioResult<serde_json::Value> {
        if request.product_id.trim().is_empty() {
            return Err(StudioError::validation("create-order needs a product id"));
        }
        let mut form = multipart::Form::new().text("productId", request.product_id);
        if let Some(p) = request.prompt.filter(|p| !p.is_empty()) {
            form = form.text("prompt", p);
        }
        if let Some(f) = request.file {
            form = form.part(
                "file",
                multipart::Part::bytes(f.bytes)
                    .file_name(f.name)
                    .mime_str(&f.mime)?,
            );
        }
        if let Some(s) = request.size.filter(|s| !s.is_empty()) {
            form = form.text("size", s);
        }
        self.post_form("orders/create-order", form).await
    }
}

#[cfg(test)]
#[path = "../../tests/unit/client/http.rs"]
mod tests;
