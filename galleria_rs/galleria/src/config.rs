use serde::{Deserialize, Serialize};

use crate::protocol::PLOT_ENDPOINT;
use crate::GalleriaError;

/// Page-level settings. Every field has a default so partial JSON files work.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GalleriaConfig {
    pub endpoint: String,
    pub graph_id: String,
    pub default_linewidth: String,
    pub default_markers: bool,
    pub default_dark: bool,
}

impl Default for GalleriaConfig {
    fn default() -> Self {
        Self {
            endpoint: PLOT_ENDPOINT.to_string(),
            graph_id: "graph".to_string(),
            default_linewidth: "2".to_string(),
            default_markers: false,
            default_dark: false,
        }
    }
}

impl GalleriaConfig {
    pub fn from_json(text: &str) -> Result<Self, GalleriaError> {
        serde_json::from_str(text).map_err(|e| GalleriaError::Config(e.to_string()))
    }

    pub fn load(path: &std::path::Path) -> Result<Self, GalleriaError> {
        #[cfg(feature = "wasm")]
        {
            let _ = path;
            Err(GalleriaError::Config(
                "file configuration is not available in the browser".into(),
            ))
        }
        #[cfg(not(feature = "wasm"))]
        {
            let text = std::fs::read_to_string(path)
                .map_err(|e| GalleriaError::Config(format!("{}: {e}", path.display())))?;
            Self::from_json(&text)
        }
    }
}
