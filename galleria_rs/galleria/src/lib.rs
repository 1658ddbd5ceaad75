//! Form controller for the Math Galleria curve plotter.
//!
//! The page lets a user pick a curve family or a preset, edit the generated
//! parameter fields and post them to `/api/plot`. Everything here is plain
//! state so the web front end and the CLI share one implementation and the
//! behavior can be tested without a live document.

use thiserror::Error;

pub mod config;
pub mod controller;
pub mod form;
pub mod lifecycle;
pub mod preview;
pub mod protocol;
pub mod registry;
pub mod view;

pub use config::GalleriaConfig;
pub use controller::{Controller, Outcome, Submission};
pub use form::{FormState, Selection};
pub use lifecycle::{PlotStatus, RequestToken, RequestTracker};
pub use preview::preview_preset;
pub use protocol::{
    decode_response, ChartOptions, PlotRequest, PlotResponse, Theme, PLOT_ENDPOINT,
};
pub use registry::{mode_template, preset_template, CurveMode, FieldTemplate, Preset};
pub use view::{PlotView, ThemeClasses, TriviaBlock};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GalleriaError {
    #[error("unknown curve mode: {0:?}")]
    UnknownMode(String),
    #[error("unknown preset: {0:?}")]
    UnknownPreset(String),
    #[error("field {0:?} is not present in the current form")]
    UnknownField(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with HTTP {0}")]
    HttpStatus(u16),
    #[error("could not decode plot response: {0}")]
    Decode(String),
    #[error("could not encode plot request: {0}")]
    Encode(String),
    #[error("could not draw the chart: {0}")]
    Render(String),
    #[error("{0} is only available from the server")]
    PreviewUnsupported(String),
    #[error("could not read configuration: {0}")]
    Config(String),
}
