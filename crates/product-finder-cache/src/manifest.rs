//! Static assets pre-cached at install time.

pub const BOOTSTRAP_CSS: &str = "https://cdn.replit.com/agent/bootstrap-agent-dark-theme.min.css";
pub const BOOTSTRAP_JS: &str =
    "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/js/bootstrap.bundle.min.js";
pub const QUAGGA_JS: &str = "https://cdn.jsdelivr.net/npm/quagga@0.12.1/dist/quagga.min.js";

pub const APP_JS: &str = "/static/js/app.js";
pub const BARCODE_JS: &str = "/static/js/barcode.js";

/// Same-origin paths first, then pinned third-party URLs.
pub const ASSET_MANIFEST: &[&str] = &["/", APP_JS, BARCODE_JS, BOOTSTRAP_CSS, BOOTSTRAP_JS, QUAGGA_JS];
