//! What the page shows: status line, chart inputs, trivia panel and the
//! class list of the root container.

use std::collections::BTreeSet;

use serde_json::Value as JsonValue;

use crate::protocol::{ChartOptions, PlotResponse};

pub const TRIVIA_CLASS: &str = "pill bg-slate-100";
pub const DARK_BACKGROUND_CLASS: &str = "bg-slate-900";
pub const LIGHT_TEXT_CLASS: &str = "text-white";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriviaBlock {
    pub class: &'static str,
    pub text: String,
}

/// A decoded response, ready to hand to the chart and the side panels.
#[derive(Clone, Debug, PartialEq)]
pub struct PlotView {
    pub status: String,
    pub traces: Vec<JsonValue>,
    pub layout: JsonValue,
    pub options: ChartOptions,
    pub trivia: Vec<TriviaBlock>,
}

impl PlotView {
    pub fn from_response(response: PlotResponse) -> Self {
        let status = match response.message {
            Some(message) if !message.is_empty() => message,
            _ => String::new(),
        };
        let trivia = response
            .trivia
            .into_iter()
            .map(|text| TriviaBlock {
                class: TRIVIA_CLASS,
                text,
            })
            .collect();
        Self {
            status,
            traces: response.traces,
            layout: response.layout,
            options: ChartOptions::default(),
            trivia,
        }
    }
}

/// Class membership of the root content element.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThemeClasses {
    classes: BTreeSet<String>,
}

impl ThemeClasses {
    pub fn new<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            classes: classes.into_iter().map(Into::into).collect(),
        }
    }

    /// Flip the dark background and light text classes independently.
    pub fn toggle(&mut self) {
        for class in [DARK_BACKGROUND_CLASS, LIGHT_TEXT_CLASS] {
            if !self.classes.remove(class) {
                self.classes.insert(class.to_string());
            }
        }
    }

    pub fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn is_dark(&self) -> bool {
        self.contains(DARK_BACKGROUND_CLASS)
    }

    pub fn class_attr(&self) -> String {
        self.classes.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }
}
