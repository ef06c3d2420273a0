//! AI-analysis payloads attached to the first product of an AI search.
//!
//! The backend has shipped two shapes over time: an accordion layout
//! (intent, recommendations, features, trends) and a flatter
//! keyword/feature/suggestion panel. Both decode into [`AiAnalysis`]; any
//! other JSON object is kept as [`AiAnalysis::Legacy`] so it can still be
//! shown.
//!
//! Decoding is lenient below the top level: a sub-field with the wrong type
//! or missing entirely becomes `None` / an empty list, and the renderer
//! substitutes a placeholder for it.

use serde::Serialize;
use serde::de::Error as _;
use serde_json::{Map, Value};

/// Keys that identify the accordion schema.
const ACCORDION_KEYS: &[&str] = &["search_intent", "recommendations", "trends"];

/// Keys that identify the flat schema.
const FLAT_KEYS: &[&str] = &["keywords", "suggestions"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "schema", rename_all = "snake_case")]
pub enum AiAnalysis {
    Accordion(AccordionAnalysis),
    Flat(FlatAnalysis),
    Legacy(LegacyAnalysis),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AccordionAnalysis {
    pub search_intent: Option<String>,
    pub recommendations: Vec<String>,
    pub features: Vec<String>,
    pub trends: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlatAnalysis {
    pub keywords: Vec<String>,
    pub features: Vec<String>,
    pub suggestions: Vec<String>,
}

/// Unrecognised object, flattened to `(key, text)` pairs in key order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LegacyAnalysis {
    pub entries: Vec<(String, String)>,
}

impl AiAnalysis {
    /// Decode a raw `ai_analysis` value.
    ///
    /// Accepts either an object or a string holding JSON text. Fails only
    /// when the string is not valid JSON or the payload is not an object.
    pub fn decode(raw: &Value) -> Result<Self, serde_json::Error> {
        let parsed;
        let value = match raw {
            Value::String(text) => {
                parsed = serde_json::from_str::<Value>(text)?;
                &parsed
            }
            other => other,
        };

        let Value::Object(map) = value else {
            return Err(serde_json::Error::custom(
                "ai_analysis is not a JSON object",
            ));
        };

        if has_any(map, ACCORDION_KEYS) {
            Ok(Self::Accordion(AccordionAnalysis {
                search_intent: text_field(map, "search_intent"),
                recommendations: list_field(map, "recommendations"),
                features: list_field(map, "features"),
                trends: text_field(map, "trends"),
            }))
        } else if has_any(map, FLAT_KEYS) {
            Ok(Self::Flat(FlatAnalysis {
                keywords: list_field(map, "keywords"),
                features: list_field(map, "features"),
                suggestions: list_field(map, "suggestions"),
            }))
        } else {
            let entries = map
                .iter()
                .filter_map(|(k, v)| value_text(v).map(|t| (k.clone(), t)))
                .collect();
            Ok(Self::Legacy(LegacyAnalysis { entries }))
        }
    }

    pub fn schema_name(&self) -> &'static str {
        match self {
            Self::Accordion(_) => "accordion",
            Self::Flat(_) => "flat",
            Self::Legacy(_) => "legacy",
        }
    }
}

// ── Lenient field access ──

fn has_any(map: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().any(|k| map.contains_key(*k))
}

fn text_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(value_text)
}

/// A list field; a lone scalar is treated as a one-item list.
fn list_field(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
        Some(other) => value_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

/// Render a JSON value as display text. Objects join their scalar members.
fn value_text(v: &Value) -> Option<String> {
    let text = match v {
        Value::Null => return None,
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(map) => map
            .values()
            .filter_map(value_text)
            .collect::<Vec<_>>()
            .join(" - "),
    };
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accordion_from_object() {
        let raw = json!({
            "search_intent": "Looking for a gift",
            "recommendations": ["Assorted box", "Truffles"],
            "features": ["70% cacao"],
            "trends": "Premium chocolate is up this season"
        });
        let AiAnalysis::Accordion(a) = AiAnalysis::decode(&raw).unwrap() else {
            panic!("expected accordion");
        };
        assert_eq!(a.search_intent.as_deref(), Some("Looking for a gift"));
        assert_eq!(a.recommendations, vec!["Assorted box", "Truffles"]);
        assert_eq!(a.features, vec!["70% cacao"]);
    }

    #[test]
    fn flat_from_string_encoded_json() {
        let raw = Value::String(
            r#"{"keywords":["tea","green"],"features":"Low caffeine","suggestions":[]}"#.into(),
        );
        let AiAnalysis::Flat(f) = AiAnalysis::decode(&raw).unwrap() else {
            panic!("expected flat");
        };
        assert_eq!(f.keywords, vec!["tea", "green"]);
        assert_eq!(f.features, vec!["Low caffeine"]);
        assert!(f.suggestions.is_empty());
    }

    #[test]
    fn missing_and_mistyped_subfields_are_tolerated() {
        let raw = json!({ "recommendations": 3, "trends": null });
        let AiAnalysis::Accordion(a) = AiAnalysis::decode(&raw).unwrap() else {
            panic!("expected accordion");
        };
        assert!(a.search_intent.is_none());
        assert!(a.trends.is_none());
        assert_eq!(a.recommendations, vec!["3"]);
        assert!(a.features.is_empty());
    }

    #[test]
    fn object_recommendations_are_joined() {
        let raw = json!({
            "recommendations": [{"name": "Truffles", "reason": "best seller"}]
        });
        let AiAnalysis::Accordion(a) = AiAnalysis::decode(&raw).unwrap() else {
            panic!("expected accordion");
        };
        assert_eq!(a.recommendations, vec!["Truffles - best seller"]);
    }

    #[test]
    fn unknown_shape_is_legacy() {
        let raw = json!({ "summary": "Popular item", "score": 4 });
        let AiAnalysis::Legacy(l) = AiAnalysis::decode(&raw).unwrap() else {
            panic!("expected legacy");
        };
        assert_eq!(
            l.entries,
            vec![
                ("score".to_string(), "4".to_string()),
                ("summary".to_string(), "Popular item".to_string()),
            ]
        );
    }

    #[test]
    fn invalid_json_string_fails() {
        let raw = Value::String("{invalid json".into());
        assert!(AiAnalysis::decode(&raw).is_err());
    }

    #[test]
    fn non_object_fails() {
        assert!(AiAnalysis::decode(&json!(["a", "b"])).is_err());
        assert!(AiAnalysis::decode(&Value::String("42".into())).is_err());
    }
}
