//! Event wiring: the handlers the page's controls dispatch to.

use std::sync::Arc;

use product_finder_cache::manifest::{APP_JS, BARCODE_JS, BOOTSTRAP_CSS, BOOTSTRAP_JS, QUAGGA_JS};
use product_finder_client::ApiClient;
use product_finder_core::{FinderConfig, SearchMode};
use tokio::sync::Mutex;
use tracing::debug;

use crate::inventory::{InventoryFetcher, InventoryOutcome};
use crate::page::{Page, SharedPage};
use crate::render::{RenderError, Renderer, SCANNER_ERROR_TEXT, or_fallback};
use crate::scanner::{BarcodeDecoder, ScannerSession, ToggleOutcome};
use crate::search::{SearchOrchestrator, SearchOutcome};

const PAGE_SCRIPTS: &[&str] = &[BOOTSTRAP_JS, QUAGGA_JS, APP_JS, BARCODE_JS];

/// One product-finder page and the components acting on it.
pub struct App {
    page: SharedPage,
    renderer: Arc<Renderer>,
    search: SearchOrchestrator,
    inventory: InventoryFetcher,
    scanner: Mutex<ScannerSession>,
}

impl App {
    pub fn new(
        client: ApiClient,
        decoder: Box<dyn BarcodeDecoder>,
        config: &FinderConfig,
    ) -> Result<Self, RenderError> {
        let page = Page::shared();
        let renderer = Arc::new(Renderer::new()?);
        let search = SearchOrchestrator::new(
            client.clone(),
            renderer.clone(),
            page.clone(),
            config.overflow_threshold,
        );
        let inventory = InventoryFetcher::new(client, renderer.clone(), page.clone());
        Ok(Self {
            page,
            renderer,
            search,
            inventory,
            scanner: Mutex::new(ScannerSession::new(decoder)),
        })
    }

    pub fn page(&self) -> &SharedPage {
        &self.page
    }

    pub async fn set_query(&self, text: &str) {
        self.page.lock().await.query_input = text.to_string();
    }

    pub async fn set_ai_enabled(&self, enabled: bool) {
        self.page.lock().await.ai_enabled = enabled;
    }

    /// Search button. Typed queries search by name.
    pub async fn on_search_click(&self) -> SearchOutcome {
        self.submit(SearchMode::Name).await
    }

    /// Search the current input with an explicit mode.
    pub async fn submit(&self, mode: SearchMode) -> SearchOutcome {
        let (text, ai_enabled) = {
            let page = self.page.lock().await;
            (page.query_input.clone(), page.ai_enabled)
        };
        self.search.perform_search(&text, mode, ai_enabled).await
    }

    /// Key press in the search input; only Enter submits.
    pub async fn on_key_press(&self, key: &str) -> Option<SearchOutcome> {
        if key != "Enter" {
            return None;
        }
        Some(self.on_search_click().await)
    }

    /// Card click. Cards from responses without ids carry no binding.
    pub async fn on_card_click(&self, product_id: Option<i64>) -> Option<InventoryOutcome> {
        let Some(id) = product_id else {
            debug!("card without product id clicked");
            return None;
        };
        Some(self.inventory.open(id).await)
    }

    pub async fn on_modal_close(&self) {
        self.inventory.close().await;
    }

    /// Scan button. A camera that fails to start leaves an error panel in
    /// the results container.
    pub async fn on_scan_toggle(&self) -> ToggleOutcome {
        let outcome = self.scanner.lock().await.toggle(&self.page).await;
        if let ToggleOutcome::Failed(_) = outcome {
            let html = or_fallback(self.renderer.error(SCANNER_ERROR_TEXT));
            self.page.lock().await.results_html = html;
        }
        outcome
    }

    /// Decoder detection: fill the input, stop scanning, search by JAN.
    pub async fn on_detected(&self, raw_code: &str) -> Option<SearchOutcome> {
        let code = self
            .scanner
            .lock()
            .await
            .on_detected(raw_code, &self.page)
            .await?;
        let ai_enabled = self.page.lock().await.ai_enabled;
        Some(
            self.search
                .perform_search(&code, SearchMode::Jan, ai_enabled)
                .await,
        )
    }

    /// Full HTML document for the current page state.
    pub async fn render_document(&self) -> String {
        let page = self.page.lock().await.clone();
        or_fallback(self.renderer.document(&page, BOOTSTRAP_CSS, PAGE_SCRIPTS))
    }
}
