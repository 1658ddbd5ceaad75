//! Field templates for each curve family and preset.
//!
//! A template is static data: a short list of blocks that render to the HTML
//! fragment mounted inside the `fields` container. Every input in a template
//! carries a unique id and a default value; ids may repeat across templates
//! because only one template is mounted at a time.

use std::f64::consts::PI;
use std::fmt::Write as _;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::GalleriaError;

const INPUT_CLASS: &str = "w-full border rounded-lg p-2";

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CurveMode {
    Cartesian,
    Parametric,
    Polar,
}

impl CurveMode {
    pub const ALL: &'static [CurveMode] =
        &[CurveMode::Cartesian, CurveMode::Parametric, CurveMode::Polar];

    pub fn as_str(&self) -> &'static str {
        match self {
            CurveMode::Cartesian => "cartesian",
            CurveMode::Parametric => "parametric",
            CurveMode::Polar => "polar",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CurveMode::Cartesian => "Cartesian y = f(x)",
            CurveMode::Parametric => "Parametric x(t), y(t)",
            CurveMode::Polar => "Polar r(θ)",
        }
    }
}

impl Default for CurveMode {
    fn default() -> Self {
        CurveMode::Cartesian
    }
}

impl FromStr for CurveMode {
    type Err = GalleriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CurveMode::ALL
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| GalleriaError::UnknownMode(s.to_string()))
    }
}

/// Named curve shortcut. When selected it replaces the mode's fields entirely.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Lissajous,
    Rose,
    Hypotrochoid,
    // The backend spells it this way; keep the wire name.
    Harmanograph,
}

impl Preset {
    pub const ALL: &'static [Preset] = &[
        Preset::Lissajous,
        Preset::Rose,
        Preset::Hypotrochoid,
        Preset::Harmanograph,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Lissajous => "lissajous",
            Preset::Rose => "rose",
            Preset::Hypotrochoid => "hypotrochoid",
            Preset::Harmanograph => "harmanograph",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Preset::Lissajous => "Lissajous",
            Preset::Rose => "Rose",
            Preset::Hypotrochoid => "Hypotrochoid",
            Preset::Harmanograph => "Harmonograph",
        }
    }

    /// Parse a preset selector value. The empty string means "no preset".
    pub fn parse_optional(s: &str) -> Result<Option<Preset>, GalleriaError> {
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }
}

impl FromStr for Preset {
    type Err = GalleriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Preset::ALL
            .iter()
            .copied()
            .find(|preset| preset.as_str() == s)
            .ok_or_else(|| GalleriaError::UnknownPreset(s.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec {
    pub id: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub default: String,
    pub step: Option<&'static str>,
}

impl FieldSpec {
    fn text(id: &'static str, label: &'static str, default: &str) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Text,
            default: default.to_string(),
            step: None,
        }
    }

    fn number(id: &'static str, label: &'static str, default: &str) -> Self {
        Self {
            id,
            label,
            kind: FieldKind::Number,
            default: default.to_string(),
            step: None,
        }
    }

    fn computed(id: &'static str, label: &'static str, value: f64) -> Self {
        Self::number(id, label, &format_default(value))
    }

    fn with_step(mut self, step: &'static str) -> Self {
        self.step = Some(step);
        self
    }

    fn write_input(&self, out: &mut String, class: &str) {
        let _ = write!(out, "<input id=\"{}\"", escape_attr(self.id));
        if self.kind == FieldKind::Number {
            out.push_str(" type=\"number\"");
        }
        let _ = write!(out, " value=\"{}\"", escape_attr(&self.default));
        if let Some(step) = self.step {
            let _ = write!(out, " step=\"{}\"", escape_attr(step));
        }
        let _ = write!(out, " class=\"{class}\">");
    }

    fn write_cell(&self, out: &mut String) {
        let _ = write!(
            out,
            "<div><label class=\"text-sm block\">{}</label>",
            escape_text(self.label)
        );
        self.write_input(out, INPUT_CLASS);
        out.push_str("</div>");
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    /// Explanatory paragraph with no inputs.
    Note(&'static str),
    /// Full-width labelled expression input.
    Expression(FieldSpec),
    /// Numeric cells laid out in a fixed column grid.
    Grid { columns: u8, fields: Vec<FieldSpec> },
    /// One numeric cell outside a grid.
    Single(FieldSpec),
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldTemplate {
    pub name: &'static str,
    pub blocks: Vec<Block>,
}

impl FieldTemplate {
    pub fn fields(&self) -> impl Iterator<Item = &FieldSpec> + '_ {
        self.blocks.iter().flat_map(|block| {
            let fields: &[FieldSpec] = match block {
                Block::Note(_) => &[],
                Block::Expression(field) | Block::Single(field) => std::slice::from_ref(field),
                Block::Grid { fields, .. } => fields,
            };
            fields.iter()
        })
    }

    pub fn field_ids(&self) -> Vec<&'static str> {
        self.fields().map(|f| f.id).collect()
    }

    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields().find(|f| f.id == id)
    }

    /// Field ids paired with their default values, in document order.
    pub fn defaults(&self) -> Vec<(String, String)> {
        self.fields()
            .map(|f| (f.id.to_string(), f.default.clone()))
            .collect()
    }

    /// Render the HTML fragment for the `fields` container.
    pub fn markup(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            match block {
                Block::Note(text) => {
                    let _ = writeln!(
                        out,
                        "<p class=\"text-sm text-slate-600\">{}</p>",
                        escape_text(text)
                    );
                }
                Block::Expression(field) => {
                    let _ = writeln!(
                        out,
                        "<label class=\"block text-sm font-medium\">{}</label>",
                        escape_text(field.label)
                    );
                    field.write_input(&mut out, INPUT_CLASS);
                    out.push('\n');
                }
                Block::Grid { columns, fields } => {
                    let _ = writeln!(out, "<div class=\"grid grid-cols-{columns} gap-3\">");
                    for field in fields {
                        out.push_str("  ");
                        field.write_cell(&mut out);
                        out.push('\n');
                    }
                    out.push_str("</div>\n");
                }
                Block::Single(field) => {
                    field.write_cell(&mut out);
                    out.push('\n');
                }
            }
        }
        out
    }
}

/// Shortest round-trip decimal, the same text a browser prints for the value.
pub fn format_default(value: f64) -> String {
    format!("{value}")
}

fn escape_attr(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

struct Registry {
    cartesian: FieldTemplate,
    parametric: FieldTemplate,
    polar: FieldTemplate,
    lissajous: FieldTemplate,
    rose: FieldTemplate,
    hypotrochoid: FieldTemplate,
    harmanograph: FieldTemplate,
}

// Built once; defaults derived from π are fixed from then on.
static REGISTRY: Lazy<Registry> = Lazy::new(|| Registry {
    cartesian: FieldTemplate {
        name: "cartesian",
        blocks: vec![
            Block::Expression(FieldSpec::text("y_expr", "y = ", "sin(x)")),
            Block::Grid {
                columns: 3,
                fields: vec![
                    FieldSpec::number("xmin", "xmin", "-10"),
                    FieldSpec::number("xmax", "xmax", "10"),
                    FieldSpec::number("n", "points", "2000"),
                ],
            },
        ],
    },
    parametric: FieldTemplate {
        name: "parametric",
        blocks: vec![
            Block::Expression(FieldSpec::text("x_expr", "x(t) = ", "sin(3*t+pi/2)")),
            Block::Expression(FieldSpec::text("y_expr", "y(t) = ", "sin(5*t)")),
            Block::Grid {
                columns: 3,
                fields: vec![
                    FieldSpec::number("tmin", "tmin", "0"),
                    FieldSpec::computed("tmax", "tmax", 2.0 * PI),
                    FieldSpec::number("n", "points", "6000"),
                ],
            },
        ],
    },
    polar: FieldTemplate {
        name: "polar",
        blocks: vec![
            Block::Expression(FieldSpec::text("r_expr", "r(θ) = ", "cos(3*theta)")),
            Block::Grid {
                columns: 3,
                fields: vec![
                    FieldSpec::number("thmin", "θmin", "0"),
                    FieldSpec::computed("thmax", "θmax", 2.0 * PI * 4.0),
                    FieldSpec::number("n", "points", "6000"),
                ],
            },
        ],
    },
    lissajous: FieldTemplate {
        name: "lissajous",
        blocks: vec![Block::Grid {
            columns: 3,
            fields: vec![
                FieldSpec::number("a", "a", "3"),
                FieldSpec::number("b", "b", "5"),
                FieldSpec::computed("delta", "δ (rad)", PI / 2.0).with_step("0.01"),
            ],
        }],
    },
    rose: FieldTemplate {
        name: "rose",
        blocks: vec![Block::Single(
            FieldSpec::number("k", "k", "5").with_step("0.1"),
        )],
    },
    hypotrochoid: FieldTemplate {
        name: "hypotrochoid",
        blocks: vec![Block::Grid {
            columns: 3,
            fields: vec![
                FieldSpec::number("R", "R", "6"),
                FieldSpec::number("r", "r", "5"),
                FieldSpec::number("d", "d", "3"),
            ],
        }],
    },
    harmanograph: FieldTemplate {
        name: "harmanograph",
        blocks: vec![
            Block::Note("Four damped pendulums. Tweak them for mesmerizing patterns."),
            Block::Grid {
                columns: 2,
                fields: pendulum_fields(),
            },
        ],
    },
});

fn pendulum_fields() -> Vec<FieldSpec> {
    // (amplitude, frequency, phase, damping) per pendulum
    let pendulums = [
        ("A1", "f1", "p1", "d1", "2", format_default(0.0), "0.004"),
        ("A2", "f2", "p2", "d2", "3", format_default(PI / 2.0), "0.006"),
        ("A3", "f3", "p3", "d3", "2.5", format_default(PI / 4.0), "0.005"),
        ("A4", "f4", "p4", "d4", "3.5", format_default(PI / 3.0), "0.007"),
    ];
    let mut fields = Vec::with_capacity(16);
    for (amp, freq, phase, damp, freq_default, phase_default, damp_default) in pendulums {
        fields.push(FieldSpec::number(amp, amp, "1").with_step("0.1"));
        fields.push(FieldSpec::number(freq, freq, freq_default).with_step("0.1"));
        fields.push(FieldSpec::number(phase, phase, &phase_default).with_step("0.01"));
        fields.push(FieldSpec::number(damp, damp, damp_default).with_step("0.001"));
    }
    fields
}

pub fn mode_template(mode: CurveMode) -> &'static FieldTemplate {
    let registry = &*REGISTRY;
    match mode {
        CurveMode::Cartesian => &registry.cartesian,
        CurveMode::Parametric => &registry.parametric,
        CurveMode::Polar => &registry.polar,
    }
}

pub fn preset_template(preset: Preset) -> &'static FieldTemplate {
    let registry = &*REGISTRY;
    match preset {
        Preset::Lissajous => &registry.lissajous,
        Preset::Rose => &registry.rose,
        Preset::Hypotrochoid => &registry.hypotrochoid,
        Preset::Harmanograph => &registry.harmanograph,
    }
}

/// Look a template up by its selector value (mode or preset name).
pub fn template_by_name(name: &str) -> Result<&'static FieldTemplate, GalleriaError> {
    if let Ok(mode) = name.parse::<CurveMode>() {
        return Ok(mode_template(mode));
    }
    name.parse::<Preset>().map(preset_template)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(template: &FieldTemplate) -> Vec<&'static str> {
        template.field_ids()
    }

    #[test]
    fn mode_templates_expose_documented_ids() {
        assert_eq!(ids(mode_template(CurveMode::Cartesian)), ["y_expr", "xmin", "xmax", "n"]);
        assert_eq!(
            ids(mode_template(CurveMode::Parametric)),
            ["x_expr", "y_expr", "tmin", "tmax", "n"]
        );
        assert_eq!(ids(mode_template(CurveMode::Polar)), ["r_expr", "thmin", "thmax", "n"]);
    }

    #[test]
    fn pi_defaults_use_shortest_decimal() {
        let parametric = mode_template(CurveMode::Parametric);
        assert_eq!(parametric.field("tmax").unwrap().default, "6.283185307179586");
        let polar = mode_template(CurveMode::Polar);
        assert_eq!(polar.field("thmax").unwrap().default, "25.132741228718345");
        let lissajous = preset_template(Preset::Lissajous);
        assert_eq!(lissajous.field("delta").unwrap().default, "1.5707963267948966");
    }

    #[test]
    fn harmanograph_has_four_pendulums() {
        let template = preset_template(Preset::Harmanograph);
        assert_eq!(template.field_ids().len(), 16);
        assert_eq!(template.field("p1").unwrap().default, "0");
        assert_eq!(template.field("p3").unwrap().default, "0.7853981633974483");
        assert_eq!(template.field("p4").unwrap().default, "1.0471975511965976");
        assert_eq!(template.field("f3").unwrap().default, "2.5");
        assert_eq!(template.field("d4").unwrap().default, "0.007");
    }

    #[test]
    fn ids_are_unique_within_each_template() {
        let all = CurveMode::ALL
            .iter()
            .map(|m| mode_template(*m))
            .chain(Preset::ALL.iter().map(|p| preset_template(*p)));
        for template in all {
            let mut seen = std::collections::HashSet::new();
            for id in template.field_ids() {
                assert!(seen.insert(id), "duplicate id {id} in {}", template.name);
            }
        }
    }

    #[test]
    fn markup_contains_inputs_with_defaults() {
        let html = mode_template(CurveMode::Cartesian).markup();
        assert!(html.contains(
            "<input id=\"y_expr\" value=\"sin(x)\" class=\"w-full border rounded-lg p-2\">"
        ));
        assert!(html.contains("<input id=\"xmin\" type=\"number\" value=\"-10\""));
        assert!(html.contains("grid-cols-3"));
        assert_eq!(html.matches("<input").count(), 4);

        let rose = preset_template(Preset::Rose).markup();
        assert!(rose.contains("<input id=\"k\" type=\"number\" value=\"5\" step=\"0.1\""));
        assert_eq!(rose.matches("<input").count(), 1);
    }

    #[test]
    fn markup_escapes_text() {
        assert_eq!(escape_attr("a\"<b>&"), "a&quot;&lt;b&gt;&amp;");
        assert_eq!(escape_text("1 < 2 & \"ok\""), "1 &lt; 2 &amp; \"ok\"");
    }

    #[test]
    fn selector_names_round_trip_and_reject_unknowns() {
        for mode in CurveMode::ALL {
            assert_eq!(mode.as_str().parse::<CurveMode>().unwrap(), *mode);
        }
        assert_eq!(Preset::parse_optional("").unwrap(), None);
        assert_eq!(Preset::parse_optional("rose").unwrap(), Some(Preset::Rose));
        assert!(matches!(
            "spiral".parse::<CurveMode>(),
            Err(GalleriaError::UnknownMode(name)) if name == "spiral"
        ));
        assert!(matches!(
            Preset::parse_optional("harmonograph"),
            Err(GalleriaError::UnknownPreset(_))
        ));
        assert_eq!(template_by_name("polar").unwrap().name, "polar");
        assert_eq!(template_by_name("hypotrochoid").unwrap().name, "hypotrochoid");
        assert!(template_by_name("nope").is_err());
    }
}
