//! Typed client for the product-finder backend.

use std::sync::Arc;

use product_finder_core::{InventoryDetail, SearchQuery, SearchResult};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{ApiError, Reply, Transport};

/// Request target for a search: endpoint plus URL-encoded `q` and `type`.
pub fn search_target(query: &SearchQuery) -> String {
    format!(
        "{}?q={}&type={}",
        query.endpoint(),
        urlencoding::encode(query.text()),
        query.mode.as_str()
    )
}

pub fn inventory_target(product_id: i64) -> String {
    format!("/api/product/{product_id}/inventory")
}

/// Client for `/api/search`, `/api/ai_search` and `/api/product/{id}/inventory`.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
}

impl ApiClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Run one search against the endpoint matching `query.ai_enabled`.
    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResult, ApiError> {
        let target = search_target(query);
        info!(target = %target, ai = query.ai_enabled, "searching products");
        let result: SearchResult = self.get_json(&target).await?;
        info!(
            total = result.total_count,
            returned = result.products.len(),
            "search complete"
        );
        Ok(result)
    }

    /// Fetch stock and sales detail for one product.
    pub async fn inventory(&self, product_id: i64) -> Result<InventoryDetail, ApiError> {
        let target = inventory_target(product_id);
        info!(target = %target, "fetching inventory");
        self.get_json(&target).await
    }

    async fn get_json<T: DeserializeOwned>(&self, target: &str) -> Result<T, ApiError> {
        let reply = self.transport.get(target).await?;
        let reply = ensure_success(reply)?;
        Ok(serde_json::from_str(&reply.body)?)
    }
}

fn ensure_success(reply: Reply) -> Result<Reply, ApiError> {
    if reply.is_success() {
        Ok(reply)
    } else {
        Err(ApiError::Server {
            status: reply.status,
            body: reply.body,
        })
    }
}
