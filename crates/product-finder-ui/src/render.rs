//! HTML rendering for the results container, inventory modal and page shell.
//!
//! Templates are compiled into the binary and auto-escaped, so product
//! fields from the backend can never inject markup.

use std::collections::BTreeSet;

use minijinja::{Environment, context};
use product_finder_core::{AiAnalysis, InventoryDetail, Product, SearchResult};
use serde::Serialize;
use thiserror::Error;

use crate::page::Page;

const PLACEHOLDER: &str = "情報なし";

pub const LOADING_TEXT: &str = "検索中...";
pub const AI_LOADING_TEXT: &str = "AI分析中...";
pub const SEARCH_ERROR_TEXT: &str = "検索中にエラーが発生しました。もう一度お試しください。";
pub const INVENTORY_ERROR_TEXT: &str = "在庫情報の取得に失敗しました。";
pub const SCANNER_ERROR_TEXT: &str = "カメラを起動できませんでした。カメラへのアクセスを許可してください。";

/// Shown if a template itself fails, which only happens on a template bug.
pub const FALLBACK_ERROR_HTML: &str =
    r#"<div class="alert alert-danger error-panel" role="alert">表示中にエラーが発生しました</div>"#;

const TEMPLATES: &[(&str, &str)] = &[
    ("loading.html", include_str!("../templates/loading.html")),
    ("error.html", include_str!("../templates/error.html")),
    ("results.html", include_str!("../templates/results.html")),
    ("product_card.html", include_str!("../templates/product_card.html")),
    ("advisory.html", include_str!("../templates/advisory.html")),
    ("ai_panel.html", include_str!("../templates/ai_panel.html")),
    ("inventory.html", include_str!("../templates/inventory.html")),
    ("page.html", include_str!("../templates/page.html")),
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),
}

/// What to show above the product list in AI mode.
#[derive(Debug, Clone, PartialEq)]
pub enum AiBlock {
    Panel(AiAnalysis),
    /// The payload was present but did not decode.
    Warning,
}

// ── View models ──

#[derive(Debug, Serialize)]
struct CardView<'a> {
    id: Option<i64>,
    name: &'a str,
    location: &'a str,
    department: Option<&'a str>,
    category: Option<&'a str>,
    /// Only set when non-empty.
    subcategory: Option<&'a str>,
    jan_code: &'a str,
}

impl<'a> From<&'a Product> for CardView<'a> {
    fn from(p: &'a Product) -> Self {
        Self {
            id: p.id,
            name: &p.name,
            location: &p.location,
            department: non_empty(&p.department),
            category: non_empty(&p.category),
            subcategory: non_empty(&p.subcategory),
            jan_code: p.jan_code.as_deref().unwrap_or(""),
        }
    }
}

/// Distinct facets of the returned page, for the refine-your-search panel.
#[derive(Debug, Serialize, PartialEq)]
pub struct Advisory {
    pub total_count: u64,
    pub shown: usize,
    pub departments: Vec<String>,
    pub categories: Vec<String>,
    pub subcategories: Vec<String>,
}

impl Advisory {
    /// Facets come from the returned products only, not the full result set.
    pub fn from_page(result: &SearchResult) -> Self {
        let mut departments = BTreeSet::new();
        let mut categories = BTreeSet::new();
        let mut subcategories = BTreeSet::new();
        for p in &result.products {
            if let Some(d) = non_empty(&p.department) {
                departments.insert(d.to_string());
            }
            if let Some(c) = non_empty(&p.category) {
                categories.insert(c.to_string());
            }
            if let Some(s) = non_empty(&p.subcategory) {
                subcategories.insert(s.to_string());
            }
        }
        Self {
            total_count: result.total_count,
            shown: result.products.len(),
            departments: departments.into_iter().collect(),
            categories: categories.into_iter().collect(),
            subcategories: subcategories.into_iter().collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct InventoryView<'a> {
    name: &'a str,
    stock_quantity: String,
    recent_sales: String,
    revenue: String,
    next_shipment: String,
    last_updated: &'a str,
    promotion: bool,
    sales_copy: Option<&'a str>,
    coupon_info: Option<&'a str>,
    special_offer: Option<&'a str>,
}

impl<'a> From<&'a InventoryDetail> for InventoryView<'a> {
    fn from(d: &'a InventoryDetail) -> Self {
        Self {
            name: &d.name,
            stock_quantity: format_thousands(d.stock_quantity),
            recent_sales: format_thousands(d.recent_sales),
            revenue: format_amount(d.revenue),
            next_shipment: format_thousands(d.next_shipment),
            last_updated: &d.last_updated,
            promotion: d.has_promotion(),
            sales_copy: non_empty(&d.sales_copy),
            coupon_info: non_empty(&d.coupon_info),
            special_offer: non_empty(&d.special_offer),
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut env = Environment::new();
        for &(name, source) in TEMPLATES {
            env.add_template(name, source)?;
        }
        Ok(Self { env })
    }

    pub fn loading(&self, ai_enabled: bool) -> Result<String, RenderError> {
        let message = if ai_enabled {
            AI_LOADING_TEXT
        } else {
            LOADING_TEXT
        };
        self.render("loading.html", context! { message })
    }

    pub fn error(&self, message: &str) -> Result<String, RenderError> {
        self.render("error.html", context! { message })
    }

    /// Render a successful search: AI block, advisory panel (when
    /// `total_count` exceeds `threshold`), then one card per product.
    pub fn results(
        &self,
        result: &SearchResult,
        ai: Option<&AiBlock>,
        threshold: u64,
    ) -> Result<String, RenderError> {
        let products: Vec<CardView<'_>> = result.products.iter().map(CardView::from).collect();
        let advisory = (result.total_count > threshold).then(|| Advisory::from_page(result));
        let (ai, ai_warning) = match ai {
            Some(AiBlock::Panel(analysis)) => (Some(analysis), false),
            Some(AiBlock::Warning) => (None, true),
            None => (None, false),
        };
        self.render(
            "results.html",
            context! {
                products,
                advisory,
                ai,
                ai_warning,
                placeholder => PLACEHOLDER,
            },
        )
    }

    pub fn inventory(&self, detail: &InventoryDetail) -> Result<String, RenderError> {
        let detail = InventoryView::from(detail);
        self.render("inventory.html", context! { detail })
    }

    /// Full HTML document for the current page state.
    pub fn document(
        &self,
        page: &Page,
        stylesheet: &str,
        scripts: &[&str],
    ) -> Result<String, RenderError> {
        self.render("page.html", context! { page, stylesheet, scripts })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String, RenderError> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }
}

/// Use the rendered HTML, or log and substitute the static error panel.
pub fn or_fallback(rendered: Result<String, RenderError>) -> String {
    rendered.unwrap_or_else(|e| {
        tracing::error!(error = %e, "template render failed");
        FALLBACK_ERROR_HTML.to_string()
    })
}

/// Group digits in threes: `1234567` -> `"1,234,567"`.
pub fn format_thousands(n: i64) -> String {
    let grouped = group_digits(&n.unsigned_abs().to_string());
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Money amount with grouped integer part and at most two decimals:
/// `1234567.5` -> `"1,234,567.5"`, `1234.0` -> `"1,234"`.
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac.trim_end_matches('0');
    let mut out = String::new();
    if amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    out.push_str(&group_digits(int_part));
    if !frac.is_empty() {
        out.push('.');
        out.push_str(frac);
    }
    out
}

fn group_digits(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

fn non_empty(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
