//! Shared product types exchanged with the product-finder backend.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which product field a query is matched against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Free-text match on name, description and JAN code.
    #[default]
    Name,
    /// Partial match on the JAN code only.
    Jan,
}

impl SearchMode {
    /// Value of the `type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Jan => "jan",
        }
    }
}

impl fmt::Display for SearchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submitted search. The text is always non-empty and trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    text: String,
    pub mode: SearchMode,
    pub ai_enabled: bool,
}

impl SearchQuery {
    /// Build a query, returning `None` when `text` is blank after trimming.
    pub fn new(text: &str, mode: SearchMode, ai_enabled: bool) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
            mode,
            ai_enabled,
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Backend path for this query: `/api/search` or `/api/ai_search`.
    pub fn endpoint(&self) -> &'static str {
        if self.ai_enabled {
            "/api/ai_search"
        } else {
            "/api/search"
        }
    }
}

/// A product row as returned by the search endpoints.
///
/// `id` is absent in responses from the earliest backend revision; such
/// products cannot open the inventory modal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub jan_code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// String-encoded JSON or an object; decoded by [`crate::AiAnalysis::decode`].
    #[serde(default)]
    pub ai_analysis: Option<serde_json::Value>,
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SearchResponse")]
pub struct SearchResult {
    pub total_count: u64,
    pub products: Vec<Product>,
}

/// Wire shapes accepted for search responses.
///
/// Current backends wrap the page with a total; the first revision
/// returned a bare array.
#[derive(Deserialize)]
#[serde(untagged)]
enum SearchResponse {
    Paged {
        total_count: u64,
        products: Vec<Product>,
    },
    Bare(Vec<Product>),
}

impl From<SearchResponse> for SearchResult {
    fn from(resp: SearchResponse) -> Self {
        match resp {
            SearchResponse::Paged {
                total_count,
                products,
            } => Self {
                total_count,
                products,
            },
            SearchResponse::Bare(products) => Self {
                total_count: products.len() as u64,
                products,
            },
        }
    }
}

/// Stock and sales detail for a single product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryDetail {
    pub name: String,
    pub stock_quantity: i64,
    pub recent_sales: i64,
    /// Money amount; the backend may send a decimal.
    pub revenue: f64,
    pub next_shipment: i64,
    /// Timestamp string as formatted by the backend.
    pub last_updated: String,
    #[serde(default)]
    pub sales_copy: Option<String>,
    #[serde(default)]
    pub coupon_info: Option<String>,
    #[serde(default)]
    pub special_offer: Option<String>,
}

impl InventoryDetail {
    /// Whether any promotional field carries text.
    pub fn has_promotion(&self) -> bool {
        [&self.sales_copy, &self.coupon_info, &self.special_offer]
            .iter()
            .any(|f| f.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_query_rejected() {
        assert!(SearchQuery::new("   ", SearchMode::Name, false).is_none());
        assert!(SearchQuery::new("", SearchMode::Jan, true).is_none());
    }

    #[test]
    fn query_is_trimmed() {
        let q = SearchQuery::new("  chocolate ", SearchMode::Name, false).unwrap();
        assert_eq!(q.text(), "chocolate");
        assert_eq!(q.endpoint(), "/api/search");
    }

    #[test]
    fn ai_query_uses_ai_endpoint() {
        let q = SearchQuery::new("tea", SearchMode::Name, true).unwrap();
        assert_eq!(q.endpoint(), "/api/ai_search");
    }

    #[test]
    fn paged_response_parses() {
        let json = r#"{
            "total_count": 75,
            "products": [{
                "id": 42,
                "name": "Dark Chocolate",
                "location": "通路 7",
                "department": "Confectionery",
                "category": "Chocolate",
                "subcategory": null,
                "jan_code": "4901234567894"
            }]
        }"#;
        let parsed: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.total_count, 75);
        assert_eq!(parsed.products[0].id, Some(42));
        assert!(parsed.products[0].subcategory.is_none());
        assert!(parsed.products[0].ai_analysis.is_none());
    }

    #[test]
    fn bare_array_response_counts_products() {
        let json = r#"[
            {"name": "Green Tea", "location": "通路 3", "jan_code": "4901234567894"},
            {"name": "Black Tea", "location": "通路 3", "jan_code": "96385074"}
        ]"#;
        let parsed: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.total_count, 2);
        assert_eq!(parsed.products[1].name, "Black Tea");
        assert!(parsed.products[0].id.is_none());
    }

    #[test]
    fn inventory_promotion_detection() {
        let json = r#"{
            "name": "Dark Chocolate",
            "stock_quantity": 12,
            "recent_sales": 30,
            "revenue": 1234567,
            "next_shipment": 48,
            "last_updated": "2026-10-01 09:00"
        }"#;
        let mut detail: InventoryDetail = serde_json::from_str(json).unwrap();
        assert!(!detail.has_promotion());
        detail.coupon_info = Some("   ".into());
        assert!(!detail.has_promotion());
        detail.special_offer = Some("2 for 1".into());
        assert!(detail.has_promotion());
    }
}
