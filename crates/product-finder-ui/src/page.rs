//! Headless model of the product-finder page.
//!
//! Each field stands for one DOM region the handlers mutate. Handlers share
//! the page through [`SharedPage`] and never hold the lock across a network
//! await; every write is a whole-region replacement.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;

pub type SharedPage = Arc<Mutex<Page>>;

pub const SCAN_LABEL: &str = "バーコードスキャン";
pub const SCAN_STOP_LABEL: &str = "スキャン停止";

/// The inventory modal and its loading/content sub-regions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Modal {
    pub open: bool,
    pub loading: bool,
    pub content_visible: bool,
    pub content_html: String,
}

impl Modal {
    /// Show the modal with only the spinner visible.
    pub fn open_loading(&mut self) {
        self.open = true;
        self.loading = true;
        self.content_visible = false;
    }

    /// Hide the spinner and show `html` as the only content.
    pub fn show_content(&mut self, html: String) {
        self.loading = false;
        self.content_visible = true;
        self.content_html = html;
    }

    pub fn close(&mut self) {
        self.open = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page {
    pub query_input: String,
    pub ai_enabled: bool,
    pub results_html: String,
    pub modal: Modal,
    pub viewport_visible: bool,
    pub scan_button_label: String,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            query_input: String::new(),
            ai_enabled: false,
            results_html: String::new(),
            modal: Modal::default(),
            viewport_visible: false,
            scan_button_label: SCAN_LABEL.to_string(),
        }
    }
}

impl Page {
    pub fn shared() -> SharedPage {
        Arc::new(Mutex::new(Self::default()))
    }

    pub fn show_scanner(&mut self) {
        self.viewport_visible = true;
        self.scan_button_label = SCAN_STOP_LABEL.to_string();
    }

    pub fn hide_scanner(&mut self) {
        self.viewport_visible = false;
        self.scan_button_label = SCAN_LABEL.to_string();
    }
}
