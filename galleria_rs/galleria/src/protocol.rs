//! Wire types exchanged with the plotting backend.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::GalleriaError;

pub const PLOT_ENDPOINT: &str = "/api/plot";
pub const JSON_CONTENT_TYPE: &str = "application/json";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    /// The theme sent with a request follows the checkbox, not the page classes.
    pub fn from_checkbox(checked: bool) -> Self {
        if checked {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Theme::Light
    }
}

/// Request body for `POST /api/plot`.
///
/// Field values are forwarded as the raw strings typed by the user; numeric
/// parsing and range checks belong to the server.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlotRequest {
    pub mode: String,
    pub preset: String,
    pub theme: Theme,
    pub linewidth: String,
    pub markers: bool,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl PlotRequest {
    pub fn to_json(&self) -> Result<String, GalleriaError> {
        serde_json::to_string(self).map_err(|e| GalleriaError::Encode(e.to_string()))
    }

    pub fn to_json_pretty(&self) -> Result<String, GalleriaError> {
        serde_json::to_string_pretty(self).map_err(|e| GalleriaError::Encode(e.to_string()))
    }
}

/// Response body. `traces` and `layout` belong to the chart library and are
/// passed through untouched.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PlotResponse {
    #[serde(default)]
    pub message: Option<String>,
    pub traces: Vec<JsonValue>,
    pub layout: JsonValue,
    pub trivia: Vec<String>,
}

pub fn decode_response(body: &str) -> Result<PlotResponse, GalleriaError> {
    serde_json::from_str(body).map_err(|e| GalleriaError::Decode(e.to_string()))
}

/// Interaction options handed to the chart library with every render.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChartOptions {
    pub display_mode_bar: bool,
    pub responsive: bool,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            display_mode_bar: true,
            responsive: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serializes_flat() {
        let mut fields = BTreeMap::new();
        fields.insert("k".to_string(), "5".to_string());
        let request = PlotRequest {
            mode: "polar".into(),
            preset: "rose".into(),
            theme: Theme::Dark,
            linewidth: "2".into(),
            markers: true,
            fields,
        };
        let value: JsonValue = serde_json::from_str(&request.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "mode": "polar",
                "preset": "rose",
                "theme": "dark",
                "linewidth": "2",
                "markers": true,
                "k": "5"
            })
        );
    }

    #[test]
    fn response_accepts_null_or_missing_message() {
        let with_null = decode_response(
            r#"{"traces": [], "layout": {}, "trivia": [], "message": null}"#,
        )
        .unwrap();
        assert_eq!(with_null.message, None);
        let without = decode_response(r#"{"traces": [{"x": [1]}], "layout": {"a": 1}, "trivia": ["t"]}"#)
            .unwrap();
        assert_eq!(without.message, None);
        assert_eq!(without.traces, vec![json!({"x": [1]})]);
        assert_eq!(without.trivia, vec!["t".to_string()]);
    }

    #[test]
    fn incomplete_response_is_a_decode_error() {
        let err = decode_response(r#"{"traces": [], "layout": {}}"#).unwrap_err();
        assert!(matches!(err, GalleriaError::Decode(msg) if msg.contains("trivia")));
        assert!(matches!(decode_response("<html>"), Err(GalleriaError::Decode(_))));
    }

    #[test]
    fn chart_options_use_library_names() {
        assert_eq!(
            serde_json::to_value(ChartOptions::default()).unwrap(),
            json!({"displayModeBar": true, "responsive": true})
        );
    }

    #[test]
    fn theme_follows_checkbox() {
        assert_eq!(Theme::from_checkbox(true), Theme::Dark);
        assert_eq!(Theme::from_checkbox(false).as_str(), "light");
    }
}
