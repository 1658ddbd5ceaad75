use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::GalleriaConfig;
use crate::protocol::{PlotRequest, Theme};
use crate::registry::{mode_template, preset_template, CurveMode, FieldTemplate, Preset};
use crate::GalleriaError;

/// The two selector values: a curve family, optionally overridden by a preset.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Selection {
    pub mode: CurveMode,
    pub preset: Option<Preset>,
}

impl Selection {
    pub fn new(mode: CurveMode, preset: Option<Preset>) -> Self {
        Self { mode, preset }
    }

    /// Parse raw `<select>` values. An empty preset means none is chosen.
    pub fn parse(mode: &str, preset: &str) -> Result<Self, GalleriaError> {
        Ok(Self {
            mode: mode.parse()?,
            preset: Preset::parse_optional(preset)?,
        })
    }

    pub fn template(&self) -> &'static FieldTemplate {
        match self.preset {
            Some(preset) => preset_template(preset),
            None => mode_template(self.mode),
        }
    }

    pub fn preset_str(&self) -> &'static str {
        self.preset.map(|p| p.as_str()).unwrap_or("")
    }
}

/// Everything the submit button reads, without a document behind it.
///
/// `fields` mirrors the inputs currently mounted in the `fields` container, in
/// document order. It is replaced wholesale whenever the template changes.
#[derive(Clone, Debug, PartialEq)]
pub struct FormState {
    pub selection: Selection,
    pub dark: bool,
    pub linewidth: String,
    pub markers: bool,
    fields: Vec<(String, String)>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::with_config(&GalleriaConfig::default())
    }
}

impl FormState {
    pub fn with_config(config: &GalleriaConfig) -> Self {
        let selection = Selection::default();
        Self {
            selection,
            dark: config.default_dark,
            linewidth: config.default_linewidth.clone(),
            markers: config.default_markers,
            fields: selection.template().defaults(),
        }
    }

    /// Mount the template for `selection`, discarding any edited values.
    pub fn render_fields(&mut self, selection: Selection) -> &'static FieldTemplate {
        let template = selection.template();
        self.selection = selection;
        self.fields = template.defaults();
        template
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    pub fn field(&self, id: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field_id, _)| field_id == id)
            .map(|(_, value)| value.as_str())
    }

    /// Edit a mounted field. Ids that are not mounted are rejected.
    pub fn set_field(&mut self, id: &str, value: impl Into<String>) -> Result<(), GalleriaError> {
        match self.fields.iter_mut().find(|(field_id, _)| field_id == id) {
            Some((_, slot)) => {
                *slot = value.into();
                Ok(())
            }
            None => Err(GalleriaError::UnknownField(id.to_string())),
        }
    }

    /// Replace the field model with what the live document actually holds.
    pub fn sync_fields<I, K, V>(&mut self, collected: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.fields = collected
            .into_iter()
            .map(|(id, value)| (id.into(), value.into()))
            .collect();
    }

    pub fn theme(&self) -> Theme {
        Theme::from_checkbox(self.dark)
    }

    /// Snapshot the form into a request body. Values are copied verbatim.
    pub fn build_request(&self) -> PlotRequest {
        let fields: BTreeMap<String, String> = self.fields.iter().cloned().collect();
        PlotRequest {
            mode: self.selection.mode.as_str().to_string(),
            preset: self.selection.preset_str().to_string(),
            theme: self.theme(),
            linewidth: self.linewidth.clone(),
            markers: self.markers,
            fields,
        }
    }
}
