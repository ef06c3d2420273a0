//! Search orchestration: loading state, one request, then results or an error panel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use product_finder_client::ApiClient;
use product_finder_core::{AiAnalysis, ErrorKind, SearchMode, SearchQuery, SearchResult};
use tracing::{debug, error, info, warn};

use crate::page::SharedPage;
use crate::render::{AiBlock, Renderer, SEARCH_ERROR_TEXT, or_fallback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// Results replaced the container.
    Rendered { count: usize },
    /// The error panel replaced the container.
    Failed(ErrorKind),
    /// A newer search was issued while this one was in flight.
    Stale,
    /// Blank query; nothing was sent.
    Skipped,
}

/// Drives the results container.
///
/// Every call takes a fresh sequence number. A response is applied only if
/// no newer search was issued meanwhile; older responses are dropped.
pub struct SearchOrchestrator {
    client: ApiClient,
    renderer: Arc<Renderer>,
    page: SharedPage,
    overflow_threshold: u64,
    latest: AtomicU64,
}

impl SearchOrchestrator {
    pub fn new(
        client: ApiClient,
        renderer: Arc<Renderer>,
        page: SharedPage,
        overflow_threshold: u64,
    ) -> Self {
        Self {
            client,
            renderer,
            page,
            overflow_threshold,
            latest: AtomicU64::new(0),
        }
    }

    /// Search for `text`, skipping blank input.
    pub async fn perform_search(
        &self,
        text: &str,
        mode: SearchMode,
        ai_enabled: bool,
    ) -> SearchOutcome {
        match SearchQuery::new(text, mode, ai_enabled) {
            Some(query) => self.search(&query).await,
            None => {
                debug!("ignoring blank query");
                SearchOutcome::Skipped
            }
        }
    }

    pub async fn search(&self, query: &SearchQuery) -> SearchOutcome {
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        let loading = or_fallback(self.renderer.loading(query.ai_enabled));
        self.page.lock().await.results_html = loading;

        let response = self.client.search(query).await;

        if self.latest.load(Ordering::SeqCst) != seq {
            debug!(seq, query = query.text(), "dropping stale search response");
            return SearchOutcome::Stale;
        }

        let (html, outcome) = match response {
            Ok(result) => {
                let count = result.products.len();
                let html = self.render_result(query, &result);
                (html, SearchOutcome::Rendered { count })
            }
            Err(e) => {
                error!(error = %e, kind = %e.kind(), query = query.text(), "search failed");
                let html = or_fallback(self.renderer.error(SEARCH_ERROR_TEXT));
                (html, SearchOutcome::Failed(e.kind()))
            }
        };

        // Recheck under the lock: a newer search may have started while rendering.
        let mut page = self.page.lock().await;
        if self.latest.load(Ordering::SeqCst) != seq {
            debug!(seq, "dropping stale search response");
            return SearchOutcome::Stale;
        }
        page.results_html = html;
        outcome
    }

    fn render_result(&self, query: &SearchQuery, result: &SearchResult) -> String {
        let ai = if query.ai_enabled {
            ai_block(result)
        } else {
            None
        };
        if result.total_count > self.overflow_threshold {
            info!(
                total = result.total_count,
                threshold = self.overflow_threshold,
                "result count over threshold, showing advisory"
            );
        }
        or_fallback(
            self.renderer
                .results(result, ai.as_ref(), self.overflow_threshold),
        )
    }
}

/// Decode the first product's AI analysis, if it has one.
fn ai_block(result: &SearchResult) -> Option<AiBlock> {
    let raw = result.products.first()?.ai_analysis.as_ref()?;
    match AiAnalysis::decode(raw) {
        Ok(analysis) => {
            debug!(schema = analysis.schema_name(), "decoded AI analysis");
            Some(AiBlock::Panel(analysis))
        }
        Err(e) => {
            warn!(
                error = %e,
                kind = %ErrorKind::MalformedPayload,
                "AI analysis did not parse, showing warning"
            );
            Some(AiBlock::Warning)
        }
    }
}
