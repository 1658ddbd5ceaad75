//! Offline sampling of the preset curves.
//!
//! Produces the same response shape the plotting backend returns, for the four
//! presets only. Expression modes need the server's expression evaluator.

use std::f64::consts::PI;

use serde_json::{json, Value as JsonValue};

use crate::protocol::{PlotRequest, PlotResponse, Theme};
use crate::registry::Preset;
use crate::GalleriaError;

const PRESET_SAMPLES: usize = 6000;
const HARMANOGRAPH_SAMPLES: usize = 80_000;
const HARMANOGRAPH_SPAN: f64 = 100.0;
const DARK_BACKGROUND: &str = "#0b1220";
const DEFAULT_TITLE: &str = "Math Galleria";

struct Params<'a> {
    request: &'a PlotRequest,
}

impl<'a> Params<'a> {
    /// Parse a field as a float, falling back to `default` when it is missing
    /// or malformed.
    fn get(&self, id: &str, default: f64) -> f64 {
        self.request
            .fields
            .get(id)
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .unwrap_or(default)
    }
}

struct Sampled {
    title: String,
    x: Vec<f64>,
    y: Vec<f64>,
    trivia: String,
    width: f64,
    markers: bool,
}

pub fn preview_preset(request: &PlotRequest) -> Result<PlotResponse, GalleriaError> {
    let preset = Preset::parse_optional(&request.preset)?.ok_or_else(|| {
        GalleriaError::PreviewUnsupported(format!("{} mode", request.mode))
    })?;
    let params = Params { request };
    let width = request.linewidth.trim().parse::<f64>().unwrap_or(2.0);
    let sampled = match preset {
        Preset::Lissajous => Ok(lissajous(&params, width, request.markers)),
        Preset::Rose => Ok(rose(&params, width, request.markers)),
        Preset::Hypotrochoid => hypotrochoid(&params, width, request.markers),
        Preset::Harmanograph => Ok(harmanograph(&params, width)),
    };
    // Sampling failures travel in `message` with an empty chart, like the server's.
    let sampled = match sampled {
        Ok(sampled) => sampled,
        Err(reason) => {
            return Ok(PlotResponse {
                message: Some(format!("Error while generating plot: {reason}")),
                traces: Vec::new(),
                layout: layout(DEFAULT_TITLE, request.theme),
                trivia: Vec::new(),
            })
        }
    };
    let stats = numeric_stats(&sampled.x, &sampled.y);
    let trace = json!({
        "type": "scatter",
        "mode": if sampled.markers { "lines+markers" } else { "lines" },
        "x": sampled.x,
        "y": sampled.y,
        "line": { "width": sampled.width },
    });
    Ok(PlotResponse {
        message: None,
        traces: vec![trace],
        layout: layout(&sampled.title, request.theme),
        trivia: vec![sampled.trivia, stats],
    })
}

fn layout(title: &str, theme: Theme) -> JsonValue {
    let dark = theme == Theme::Dark;
    let background = if dark { DARK_BACKGROUND } else { "white" };
    json!({
        "title": { "text": title, "x": 0.5 },
        "xaxis": { "title": "x" },
        "yaxis": { "title": "y", "scaleanchor": "x", "scaleratio": 1 },
        "paper_bgcolor": background,
        "plot_bgcolor": background,
        "font": { "color": if dark { "white" } else { "black" } },
        "showlegend": false
    })
}

fn lissajous(params: &Params, width: f64, markers: bool) -> Sampled {
    let a = params.get("a", 3.0);
    let b = params.get("b", 5.0);
    let delta = params.get("delta", PI / 2.0);
    let t = linspace(0.0, 2.0 * PI, PRESET_SAMPLES);
    let x = t.iter().map(|t| (a * t + delta).sin()).collect();
    let y = t.iter().map(|t| (b * t).sin()).collect();
    Sampled {
        title: format!(
            "Lissajous (a={}, b={}, δ={delta:.2})",
            format_float(a),
            format_float(b)
        ),
        x,
        y,
        trivia: trivia_lissajous(a, b),
        width,
        markers,
    }
}

fn rose(params: &Params, width: f64, markers: bool) -> Sampled {
    let k = params.get("k", 3.0);
    let turns = 6.0_f64.max(k.abs().trunc() + 2.0);
    let theta = linspace(0.0, 2.0 * PI * turns, PRESET_SAMPLES);
    let (x, y) = theta
        .iter()
        .map(|th| {
            let r = (k * th).cos();
            (r * th.cos(), r * th.sin())
        })
        .unzip();
    Sampled {
        title: format!("Rose curve r = cos({}·θ)", format_float(k)),
        x,
        y,
        trivia: trivia_rose(k),
        width,
        markers,
    }
}

fn hypotrochoid(params: &Params, width: f64, markers: bool) -> Result<Sampled, String> {
    let big_r = params.get("R", 5.0);
    let r = params.get("r", 3.0);
    let d = params.get("d", 0.6 * r.abs());
    if r == 0.0 {
        return Err("float division by zero".to_string());
    }
    let loops = lcm(magnitude(big_r).max(1), magnitude(r).max(1));
    let turns = if loops > 0 { loops as f64 } else { 20.0 };
    let theta = linspace(0.0, 2.0 * PI * turns, PRESET_SAMPLES);
    let diff = big_r - r;
    let ratio = diff / r;
    let (x, y) = theta
        .iter()
        .map(|th| {
            (
                diff * th.cos() + d * (ratio * th).cos(),
                diff * th.sin() - d * (ratio * th).sin(),
            )
        })
        .unzip();
    Ok(Sampled {
        title: format!(
            "Hypotrochoid (R={}, r={}, d={})",
            format_float(big_r),
            format_float(r),
            format_float(d)
        ),
        x,
        y,
        trivia: trivia_hypotrochoid(big_r, r),
        width,
        markers,
    })
}

fn harmanograph(params: &Params, width: f64) -> Sampled {
    // (A, f, p, d) per pendulum; x sums pendulums 1 and 2, y sums 3 and 4.
    let defaults = [
        (1.0, 2.0, 0.0, 0.004),
        (1.0, 3.0, PI / 2.0, 0.006),
        (1.0, 2.5, PI / 4.0, 0.005),
        (1.0, 3.5, PI / 3.0, 0.007),
    ];
    let mut pendulums = [(0.0, 0.0, 0.0, 0.0); 4];
    for (i, (amp, freq, phase, damp)) in defaults.into_iter().enumerate() {
        let n = i + 1;
        pendulums[i] = (
            params.get(&format!("A{n}"), amp),
            params.get(&format!("f{n}"), freq),
            params.get(&format!("p{n}"), phase),
            params.get(&format!("d{n}"), damp),
        );
    }
    let swing = |(amp, freq, phase, damp): (f64, f64, f64, f64), t: f64| {
        amp * (freq * t + phase).sin() * (-damp * t).exp()
    };
    let t = linspace(0.0, HARMANOGRAPH_SPAN, HARMANOGRAPH_SAMPLES);
    let (x, y) = t
        .iter()
        .map(|&t| {
            (
                swing(pendulums[0], t) + swing(pendulums[1], t),
                swing(pendulums[2], t) + swing(pendulums[3], t),
            )
        })
        .unzip();
    Sampled {
        title: "Harmanograph".to_string(),
        x,
        y,
        trivia: "Harmanographs simulate coupled damped pendulums; small frequency differences \
                 create striking beats and envelopes."
            .to_string(),
        width: if width < 1.0 { 1.0 } else { width },
        // Always drawn as plain lines; 80k markers swamp the chart.
        markers: false,
    }
}

/// Evenly spaced samples over `[start, end]`, both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            let mut out: Vec<f64> = (0..n).map(|i| start + step * i as f64).collect();
            out[n - 1] = end;
            out
        }
    }
}

/// Integer part of `|v|`; NaN maps to 0 and huge values saturate.
fn magnitude(v: f64) -> u128 {
    v.abs().trunc() as u128
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

fn lcm(a: u128, b: u128) -> u128 {
    if a == 0 || b == 0 {
        0
    } else {
        (a / gcd(a, b)).saturating_mul(b)
    }
}

/// Best rational approximation `p/q` of `x` with `q <= max_den`, via
/// continued-fraction convergents.
pub fn approximate_ratio(x: f64, max_den: u64) -> Option<(i64, u64)> {
    if !x.is_finite() || max_den == 0 {
        return None;
    }
    let sign = if x < 0.0 { -1 } else { 1 };
    let target = x.abs();
    let (mut p0, mut q0, mut p1, mut q1) = (0_i64, 1_u64, 1_i64, 0_u64);
    let mut rem = target;
    for _ in 0..64 {
        let a = rem.floor();
        if a > i64::MAX as f64 {
            break;
        }
        let ai = a as i64;
        let q2 = (ai as u64).checked_mul(q1)?.checked_add(q0)?;
        if q2 > max_den {
            break;
        }
        let p2 = ai.checked_mul(p1)?.checked_add(p0)?;
        (p0, q0, p1, q1) = (p1, q1, p2, q2);
        let err = (p1 as f64 / q1 as f64 - target).abs();
        let frac = rem - a;
        if err <= 1e-9 * target.max(1.0) || frac == 0.0 {
            break;
        }
        rem = 1.0 / frac;
    }
    if q1 == 0 {
        None
    } else {
        Some((sign * p1, q1))
    }
}

fn is_integral(v: f64) -> bool {
    v.is_finite() && v.fract() == 0.0
}

fn trivia_lissajous(a: f64, b: f64) -> String {
    let Some((p, q)) = approximate_ratio(a / b, 1_000_000) else {
        return format!(
            "Lissajous with frequency ratio a:b = {}:{}.",
            format_float(a),
            format_float(b)
        );
    };
    let (p, q) = (p.unsigned_abs(), q);
    let closed = if is_integral(a) && is_integral(b) {
        "closes after one full path"
    } else {
        "often appears quasi-periodic unless a/b is rational"
    };
    let mut text = format!(
        "Lissajous with frequency ratio a:b = {}:{} ≈ {p}:{q}. The curve {closed}.",
        format_float(a),
        format_float(b)
    );
    if p > 0 && q > 0 {
        text.push_str(&format!(
            " Horizontal lobes: {q}, Vertical lobes: {p} (for δ=π/2)."
        ));
    }
    text
}

fn trivia_rose(k: f64) -> String {
    let petals = approximate_ratio(k, 1_000_000).and_then(|(num, den)| {
        let num = num.unsigned_abs();
        match den {
            1 if num % 2 == 1 => Some(num),
            1 if num > 0 => Some(2 * num),
            _ => None,
        }
    });
    let mut text = format!("Rose curve r = cos({}·θ).", format_float(k));
    if let Some(petals) = petals {
        text.push_str(&format!(" Number of petals: {petals}."));
    }
    text.push_str(
        " Roses close neatly when k is rational; for integer k, odd k gives k petals, \
         even k gives 2k petals.",
    );
    text
}

fn trivia_hypotrochoid(big_r: f64, r: f64) -> String {
    let loops = lcm(
        magnitude(big_r.round_ties_even()),
        magnitude(r.round_ties_even()),
    );
    format!(
        "Hypotrochoid with R≈{big_r:.2}, r≈{r:.2}. When R/r is rational the path closes; \
         approximate loop count ~ LCM(⌊R⌉,⌊r⌉) = {loops}."
    )
}

fn numeric_stats(x: &[f64], y: &[f64]) -> String {
    let finite: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect();
    if finite.is_empty() {
        return "No finite points to summarize.".to_string();
    }
    let fold = |pick: fn(&(f64, f64)) -> f64| {
        finite.iter().map(pick).fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        })
    };
    let (xmin, xmax) = fold(|p| p.0);
    let (ymin, ymax) = fold(|p| p.1);
    format!(
        "Approximate extents — x∈[{}, {}], y∈[{}, {}]. Points plotted: {}.",
        format_g(xmin, 3),
        format_g(xmax, 3),
        format_g(ymin, 3),
        format_g(ymax, 3),
        finite.len()
    )
}

/// Float text as the plotting backend prints it: `5.0`, `0.25`, `1e+16`.
pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let abs = value.abs();
    if abs != 0.0 && !(1e-4..1e16).contains(&abs) {
        let sci = format!("{value:e}");
        if let Some((mantissa, exp)) = sci.split_once('e') {
            let exp = exp.parse::<i32>().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            return format!("{mantissa}e{sign}{:02}", exp.abs());
        }
    }
    let text = value.to_string();
    if text.contains('.') {
        text
    } else {
        format!("{text}.0")
    }
}

/// `%g`-style formatting with `sig` significant digits.
pub fn format_g(value: f64, sig: usize) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return value.to_string();
    }
    let sig = sig.max(1);
    let sci = format!("{:.*e}", sig - 1, value);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => return sci,
    };
    if exp < -4 || exp >= sig as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", strip_zeros(&mantissa), exp.abs())
    } else {
        let decimals = (sig as i32 - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{value:.decimals$}"))
    }
}

fn strip_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}
