use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use galleria::registry::Block;
use galleria::{
    decode_response, preview_preset, Controller, CurveMode, GalleriaConfig, PlotView, Preset,
    Selection,
};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Math Galleria form controller CLI", long_about = None)]
struct Cli {
    /// Optional JSON configuration (endpoint, default line width, ...)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the fields a mode or preset mounts
    Fields(FieldsArgs),
    /// Print the JSON body the page would post to the plot endpoint
    Request(RequestArgs),
    /// Decode a saved plot response and print what the page would show
    Inspect(InspectArgs),
    /// Sample a preset locally and write a plot response
    Preview(PreviewArgs),
}

#[derive(Args, Debug)]
struct SelectionArgs {
    /// Curve family
    #[arg(long, value_enum, default_value_t = ModeOpt::Cartesian)]
    mode: ModeOpt,

    /// Preset overriding the mode's fields
    #[arg(long, value_enum)]
    preset: Option<PresetOpt>,
}

#[derive(Args, Debug)]
struct FormArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Field overrides as id=value (repeatable)
    #[arg(long = "set", value_name = "ID=VALUE")]
    set: Vec<String>,

    /// Request the dark theme
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "light")]
    dark: bool,

    /// Request the light theme even when the config defaults to dark
    #[arg(long, action = ArgAction::SetTrue)]
    light: bool,

    /// Line width, sent verbatim
    #[arg(long)]
    linewidth: Option<String>,

    /// Draw markers on the trace
    #[arg(long, action = ArgAction::SetTrue, conflicts_with = "no_markers")]
    markers: bool,

    /// Plain lines even when the config enables markers
    #[arg(long, action = ArgAction::SetTrue)]
    no_markers: bool,
}

impl FormArgs {
    /// `None` when neither flag was given, so the config default stands.
    fn dark(&self) -> Option<bool> {
        flag_pair(self.dark, self.light)
    }

    fn markers(&self) -> Option<bool> {
        flag_pair(self.markers, self.no_markers)
    }
}

fn flag_pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

#[derive(Args, Debug)]
struct FieldsArgs {
    #[command(flatten)]
    selection: SelectionArgs,

    /// Print the HTML fragment instead of the field table
    #[arg(long, action = ArgAction::SetTrue)]
    html: bool,
}

#[derive(Args, Debug)]
struct RequestArgs {
    #[command(flatten)]
    form: FormArgs,

    /// Single-line JSON instead of pretty output
    #[arg(long, action = ArgAction::SetTrue)]
    compact: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Saved response JSON (`-` for stdin)
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

#[derive(Args, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    form: FormArgs,

    /// Output path for the response JSON (`-` for stdout)
    #[arg(short, long, default_value = "-", value_hint = ValueHint::FilePath)]
    output: PathBuf,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ModeOpt {
    Cartesian,
    Parametric,
    Polar,
}

impl From<ModeOpt> for CurveMode {
    fn from(value: ModeOpt) -> Self {
        match value {
            ModeOpt::Cartesian => CurveMode::Cartesian,
            ModeOpt::Parametric => CurveMode::Parametric,
            ModeOpt::Polar => CurveMode::Polar,
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum PresetOpt {
    Lissajous,
    Rose,
    Hypotrochoid,
    Harmanograph,
}

impl From<PresetOpt> for Preset {
    fn from(value: PresetOpt) -> Self {
        match value {
            PresetOpt::Lissajous => Preset::Lissajous,
            PresetOpt::Rose => Preset::Rose,
            PresetOpt::Hypotrochoid => Preset::Hypotrochoid,
            PresetOpt::Harmanograph => Preset::Harmanograph,
        }
    }
}

impl From<&SelectionArgs> for Selection {
    fn from(args: &SelectionArgs) -> Self {
        Selection::new(args.mode.into(), args.preset.map(Into::into))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let config = match &cli.config {
        Some(path) => GalleriaConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => GalleriaConfig::default(),
    };
    debug!("using endpoint {}", config.endpoint);

    match cli.command {
        Command::Fields(args) => handle_fields(args),
        Command::Request(args) => handle_request(args, config),
        Command::Inspect(args) => handle_inspect(args),
        Command::Preview(args) => handle_preview(args, config),
    }
}

fn handle_fields(args: FieldsArgs) -> Result<()> {
    let selection = Selection::from(&args.selection);
    let template = selection.template();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.html {
        write!(out, "{}", template.markup())?;
        return Ok(());
    }
    for block in &template.blocks {
        if let Block::Note(text) = block {
            writeln!(out, "# {text}")?;
        }
    }
    for field in template.fields() {
        match field.step {
            Some(step) => writeln!(out, "{}\t{}\t(step {step})", field.id, field.default)?,
            None => writeln!(out, "{}\t{}", field.id, field.default)?,
        }
    }
    Ok(())
}

/// Mount the selection, apply overrides and return the controller.
fn prepare_form(args: &FormArgs, config: GalleriaConfig) -> Result<Controller> {
    let mut controller = Controller::new(config);
    controller.render_fields(Selection::from(&args.selection));
    if let Some(dark) = args.dark() {
        if dark != controller.form().dark {
            controller.set_theme_checked(dark);
        }
    }
    if let Some(width) = &args.linewidth {
        controller.form_mut().linewidth = width.clone();
    }
    if let Some(markers) = args.markers() {
        controller.form_mut().markers = markers;
    }
    for assignment in &args.set {
        let (id, value) = parse_assignment(assignment)?;
        controller
            .form_mut()
            .set_field(id, value)
            .with_context(|| format!("applying --set {assignment}"))?;
    }
    Ok(controller)
}

fn parse_assignment(token: &str) -> Result<(&str, &str)> {
    let (id, value) = token
        .split_once('=')
        .ok_or_else(|| anyhow!("expected ID=VALUE, got {token:?}"))?;
    let id = id.trim();
    if id.is_empty() {
        return Err(anyhow!("empty field id in {token:?}"));
    }
    Ok((id, value))
}

fn handle_request(args: RequestArgs, config: GalleriaConfig) -> Result<()> {
    let controller = prepare_form(&args.form, config)?;
    let request = controller.form().build_request();
    let body = if args.compact {
        request.to_json()?
    } else {
        request.to_json_pretty()?
    };
    info!(
        "POST {} with {} field(s)",
        controller.config().endpoint,
        request.fields.len()
    );
    println!("{body}");
    Ok(())
}

fn read_input(path: &PathBuf) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        io::Read::read_to_string(&mut io::stdin(), &mut text).context("reading stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
    }
}

fn handle_inspect(args: InspectArgs) -> Result<()> {
    let text = read_input(&args.input)?;
    let response = decode_response(&text)?;
    let view = PlotView::from_response(response);
    print_view(&view)
}

fn print_view(view: &PlotView) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if view.status.is_empty() {
        writeln!(out, "status: (none)")?;
    } else {
        writeln!(out, "status: {}", view.status)?;
    }
    if let Some(title) = view.layout["title"]["text"].as_str() {
        writeln!(out, "title: {title}")?;
    }
    writeln!(out, "traces: {}", view.traces.len())?;
    for block in &view.trivia {
        writeln!(out, "- {}", block.text)?;
    }
    Ok(())
}

fn handle_preview(args: PreviewArgs, config: GalleriaConfig) -> Result<()> {
    let controller = prepare_form(&args.form, config)?;
    let request = controller.form().build_request();
    let response = preview_preset(&request)?;
    let json = serde_json::to_string(&response).context("serializing preview")?;
    if args.output.as_os_str() == "-" {
        println!("{json}");
    } else {
        fs::write(&args.output, json)
            .with_context(|| format!("writing {}", args.output.display()))?;
        info!("Wrote preview: {}", args.output.display());
    }
    let view = PlotView::from_response(response);
    if view.trivia.is_empty() {
        warn!("preview produced no trivia");
    }
    for block in &view.trivia {
        info!("{}", block.text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_splits_on_first_equals() {
        assert_eq!(parse_assignment("y_expr=x==1").unwrap(), ("y_expr", "x==1"));
        assert_eq!(parse_assignment("n=").unwrap(), ("n", ""));
        assert!(parse_assignment("novalue").is_err());
        assert!(parse_assignment("=3").is_err());
    }

    #[test]
    fn prepared_form_applies_overrides() {
        let cli = Cli::parse_from([
            "galleria", "request", "--preset", "rose", "--set", "k=7", "--dark", "--linewidth",
            "3",
        ]);
        let Command::Request(args) = cli.command else {
            panic!("expected request command");
        };
        let controller = prepare_form(&args.form, GalleriaConfig::default()).unwrap();
        let request = controller.form().build_request();
        assert_eq!(request.preset, "rose");
        assert_eq!(request.fields["k"], "7");
        assert_eq!(request.theme.as_str(), "dark");
        assert_eq!(request.linewidth, "3");
    }

    fn request_args(argv: &[&str]) -> RequestArgs {
        let cli = Cli::parse_from(argv.iter().copied());
        let Command::Request(args) = cli.command else {
            panic!("expected request command");
        };
        args
    }

    #[test]
    fn config_defaults_hold_unless_flags_override() {
        let path = std::env::temp_dir().join(format!("galleria-cli-{}.json", std::process::id()));
        fs::write(&path, r#"{"default_markers": true, "default_dark": true}"#).unwrap();
        let config = GalleriaConfig::load(&path).unwrap();
        fs::remove_file(&path).ok();

        let args = request_args(&["galleria", "request"]);
        let controller = prepare_form(&args.form, config.clone()).unwrap();
        let body: serde_json::Value =
            serde_json::from_str(&controller.form().build_request().to_json().unwrap()).unwrap();
        assert_eq!(body["markers"], true);
        assert_eq!(body["theme"], "dark");
        assert!(controller.root_classes().is_dark());

        let args = request_args(&["galleria", "request", "--no-markers", "--light"]);
        let controller = prepare_form(&args.form, config).unwrap();
        let request = controller.form().build_request();
        assert!(!request.markers);
        assert_eq!(request.theme.as_str(), "light");
        assert!(!controller.root_classes().is_dark());
    }

    #[test]
    fn contradictory_flags_are_rejected() {
        assert!(Cli::try_parse_from(["galleria", "request", "--markers", "--no-markers"]).is_err());
        assert!(Cli::try_parse_from(["galleria", "request", "--dark", "--light"]).is_err());
    }

    #[test]
    fn unmounted_override_is_an_error() {
        let cli = Cli::parse_from(["galleria", "request", "--mode", "polar", "--set", "xmin=1"]);
        let Command::Request(args) = cli.command else {
            panic!("expected request command");
        };
        assert!(prepare_form(&args.form, GalleriaConfig::default()).is_err());
    }
}
