//! Per-product stock detail shown in the inventory modal.

use std::sync::Arc;

use product_finder_client::ApiClient;
use product_finder_core::ErrorKind;
use tracing::error;

use crate::page::SharedPage;
use crate::render::{INVENTORY_ERROR_TEXT, Renderer, or_fallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InventoryOutcome {
    Shown,
    Failed(ErrorKind),
}

/// Opens the modal for one product at a time.
///
/// Each open is independent: nothing is cached between clicks, and a
/// response that lands after the modal was closed still fills the hidden
/// modal.
pub struct InventoryFetcher {
    client: ApiClient,
    renderer: Arc<Renderer>,
    page: SharedPage,
}

impl InventoryFetcher {
    pub fn new(client: ApiClient, renderer: Arc<Renderer>, page: SharedPage) -> Self {
        Self {
            client,
            renderer,
            page,
        }
    }

    pub async fn open(&self, product_id: i64) -> InventoryOutcome {
        self.page.lock().await.modal.open_loading();

        let (html, outcome) = match self.client.inventory(product_id).await {
            Ok(detail) => (
                or_fallback(self.renderer.inventory(&detail)),
                InventoryOutcome::Shown,
            ),
            Err(e) => {
                error!(error = %e, kind = %e.kind(), product_id, "inventory fetch failed");
                (
                    or_fallback(self.renderer.error(INVENTORY_ERROR_TEXT)),
                    InventoryOutcome::Failed(e.kind()),
                )
            }
        };

        self.page.lock().await.modal.show_content(html);
        outcome
    }

    pub async fn close(&self) {
        self.page.lock().await.modal.close();
    }
}
