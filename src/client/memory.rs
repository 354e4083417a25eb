use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use crate::client::api::{CreateOrderRequest, OrderConfirmation, OrderDesign, Product, StudioApi};
use crate::foundation::error::{StudioError, StudioResult};

/// In-process [`StudioApi`] for tests and offline sessions.
///
/// Confirmations and create-order requests are recorded instead of sent.
#[derive(Debug, Default)]
pub struct MemoryApi {
    products: HashMap<String, Product>,
    designs: HashMap<String, Vec<OrderDesign>>,
    fail_confirm: AtomicBool,
    confirmations: Mutex<Vec<(String, OrderConfirmation)>>,
    created: Mutex<Vec<CreateOrderRequest>>,
}

impl MemoryApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product.id.clone(), product);
        self
    }

    pub fn with_designs(mut self, order_id: impl Into<String>, designs: Vec<OrderDesign>) -> Self {
        self.designs.insert(order_id.into(), designs);
        self
    }

    /// Make every following confirmation fail (or succeed again).
    pub fn set_fail_confirm(&self, fail: bool) {
        self.fail_confirm.store(fail, Ordering::SeqCst);
    }

    pub fn confirmations(&self) -> Vec<(String, OrderConfirmation)> {
        self.confirmations
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn created_orders(&self) -> Vec<CreateOrderRequest> {
        self.created.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StudioApi for MemoryApi {
    async fn get_product(&self, id: &str) -> StudioResult<Product> {
        self.products
            .get(id)
            .cloned()
            .ok_or_else(|| StudioError::api(format!("product '{id}' not found")))
    }

    async fn list_products(&self) -> StudioResult<Vec<Product>> {
        let mut all: Vec<Product> = self.products.values().cloned().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(all)
    }

    async fn order_designs(&self, order_id: &str) -> StudioResult<Vec<OrderDesign>> {
        self.designs
            .get(order_id)
            .cloned()
            .ok_or_else(|| StudioError::api(format!("order '{order_id}' not found")))
    }

    async fn confirm_order(
        &self,
        order_id: &str,
        payload: OrderConfirmation,
    ) -> StudioResult<serde_json::Value> {
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err(StudioError::api(format!("confirm '{order_id}' rejected")));
        }
        let mut log = self
            .confirmations
            .lock()
            .map_err(|_| StudioError::api("confirmation log poisoned"))?;
        log.push((order_id.to_owned(), payload));
        Ok(serde_json::json!({ "ok": true }))
    }

    async fn create_order(&self, request: CreateOrderRequest) -> StudioResult<serde_json::Value> {
        let mut log = self
            .created
            .lock()
            .map_err(|_| StudioError::api("create-order log poisoned"))?;
        let id = format!("order-{}", log.len() + 1);
        log.push(request);
        Ok(serde_json::json!({ "id": id }))
    }
}
