//! The page's form controller as explicit state.
//!
//! The browser front end forwards DOM events here and applies what comes back;
//! the CLI drives the same type directly.

use tracing::{debug, warn};

use crate::config::GalleriaConfig;
use crate::form::{FormState, Selection};
use crate::lifecycle::{PlotStatus, RequestToken, RequestTracker};
use crate::protocol::{PlotRequest, PlotResponse};
use crate::view::{PlotView, ThemeClasses};
use crate::GalleriaError;

/// A submit that has been started but not yet answered.
#[derive(Clone, Debug, PartialEq)]
pub struct Submission {
    pub token: RequestToken,
    /// The earlier in-flight request this one replaces; its transport should
    /// be aborted.
    pub superseded: Option<RequestToken>,
    pub request: PlotRequest,
    pub body: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The response was current and is now the displayed view.
    Applied,
    /// A newer submit was started; the response was dropped.
    Stale,
    /// The request was current but failed; the previous view stays.
    Failed(GalleriaError),
}

#[derive(Clone, Debug)]
pub struct Controller {
    config: GalleriaConfig,
    form: FormState,
    root: ThemeClasses,
    tracker: RequestTracker,
    status: PlotStatus,
    view: Option<PlotView>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(GalleriaConfig::default())
    }
}

impl Controller {
    pub fn new(config: GalleriaConfig) -> Self {
        let form = FormState::with_config(&config);
        let mut root = ThemeClasses::default();
        if form.dark {
            root.toggle();
        }
        Self {
            config,
            form,
            root,
            tracker: RequestTracker::new(),
            status: PlotStatus::Idle,
            view: None,
        }
    }

    pub fn config(&self) -> &GalleriaConfig {
        &self.config
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut FormState {
        &mut self.form
    }

    pub fn root_classes(&self) -> &ThemeClasses {
        &self.root
    }

    pub fn status(&self) -> &PlotStatus {
        &self.status
    }

    pub fn view(&self) -> Option<&PlotView> {
        self.view.as_ref()
    }

    /// Markup for the currently mounted template.
    pub fn markup(&self) -> String {
        self.form.selection.template().markup()
    }

    /// Handle a change of either selector. Unknown values leave the mounted
    /// fields alone and put the error on the status line.
    pub fn select(&mut self, mode: &str, preset: &str) -> Result<String, GalleriaError> {
        match Selection::parse(mode, preset) {
            Ok(selection) => Ok(self.render_fields(selection)),
            Err(err) => {
                warn!("rejected selection mode={mode:?} preset={preset:?}: {err}");
                self.status = PlotStatus::Failed(err.to_string());
                Err(err)
            }
        }
    }

    pub fn render_fields(&mut self, selection: Selection) -> String {
        let template = self.form.render_fields(selection);
        debug!(
            "mounted {} fields for template {}",
            self.form.fields().len(),
            template.name
        );
        if self.status.error().is_some() {
            self.status = PlotStatus::Idle;
        }
        template.markup()
    }

    /// The theme checkbox changed. Classes flip; the request theme follows
    /// the checkbox state.
    pub fn set_theme_checked(&mut self, checked: bool) {
        self.form.dark = checked;
        self.toggle_theme();
    }

    /// Flip the dark classes on the page root without touching the checkbox.
    pub fn toggle_theme(&mut self) {
        self.root.toggle();
        debug!("root classes now {:?}", self.root.class_attr());
    }

    pub fn begin_submit(&mut self) -> Result<Submission, GalleriaError> {
        let request = self.form.build_request();
        let body = request.to_json()?;
        let (token, superseded) = self.tracker.begin();
        if let Some(old) = superseded {
            debug!("submit {} supersedes {}", token.id(), old.id());
        }
        debug!(
            "submit {} mode={} preset={:?} fields={}",
            token.id(),
            request.mode,
            request.preset,
            request.fields.len()
        );
        self.status = PlotStatus::Pending(token);
        Ok(Submission {
            token,
            superseded,
            request,
            body,
        })
    }

    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<PlotResponse, GalleriaError>,
    ) -> Outcome {
        if !self.tracker.finish(token) {
            debug!("dropping stale response for submit {}", token.id());
            return Outcome::Stale;
        }
        match result {
            Ok(response) => {
                let view = PlotView::from_response(response);
                debug!(
                    "submit {} rendered {} traces, {} trivia",
                    token.id(),
                    view.traces.len(),
                    view.trivia.len()
                );
                self.view = Some(view);
                self.status = PlotStatus::Ready;
                Outcome::Applied
            }
            Err(err) => {
                warn!("submit {} failed: {err}", token.id());
                self.status = PlotStatus::Failed(err.to_string());
                Outcome::Failed(err)
            }
        }
    }

    /// The chart library rejected an applied view. The view is kept so a
    /// later render can retry it; the status line shows the failure.
    pub fn fail_render(&mut self, err: GalleriaError) {
        warn!("chart render failed: {err}");
        self.status = PlotStatus::Failed(err.to_string());
    }

    /// Abort whatever is in flight; its response will be ignored.
    pub fn cancel(&mut self) -> Option<RequestToken> {
        let cancelled = self.tracker.cancel();
        if cancelled.is_some() && self.status.is_pending() {
            self.status = PlotStatus::Idle;
        }
        cancelled
    }

    /// Text for the `messages` element.
    pub fn status_text(&self) -> String {
        match &self.status {
            PlotStatus::Failed(msg) => msg.clone(),
            _ => self
                .view
                .as_ref()
                .map(|view| view.status.clone())
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{CurveMode, Preset};
    use serde_json::json;

    fn ok_response(message: Option<&str>, trivia: &[&str]) -> Result<PlotResponse, GalleriaError> {
        Ok(PlotResponse {
            message: message.map(str::to_string),
            traces: vec![json!({"type": "scatter"})],
            layout: json!({}),
            trivia: trivia.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn starts_with_cartesian_defaults() {
        let controller = Controller::default();
        assert_eq!(controller.form().selection.mode, CurveMode::Cartesian);
        assert_eq!(controller.form().field("n"), Some("2000"));
        assert!(controller.markup().contains("id=\"y_expr\""));
        assert_eq!(controller.status(), &PlotStatus::Idle);
    }

    #[test]
    fn select_mounts_preset_over_mode() {
        let mut controller = Controller::default();
        let markup = controller.select("polar", "rose").unwrap();
        assert!(markup.contains("id=\"k\""));
        assert_eq!(controller.form().selection.preset, Some(Preset::Rose));
        let markup = controller.select("polar", "").unwrap();
        assert!(markup.contains("id=\"r_expr\""));
    }

    #[test]
    fn unknown_selection_is_reported_and_keeps_fields() {
        let mut controller = Controller::default();
        let err = controller.select("spiral", "").unwrap_err();
        assert_eq!(err, GalleriaError::UnknownMode("spiral".into()));
        assert_eq!(controller.form().field("y_expr"), Some("sin(x)"));
        assert!(controller.status_text().contains("spiral"));
        controller.select("cartesian", "").unwrap();
        assert_eq!(controller.status(), &PlotStatus::Idle);
    }

    #[test]
    fn successful_submit_updates_view() {
        let mut controller = Controller::default();
        let submission = controller.begin_submit().unwrap();
        assert!(controller.status().is_pending());
        assert_eq!(submission.request.mode, "cartesian");
        assert!(submission.body.contains("\"y_expr\":\"sin(x)\""));
        let outcome = controller.complete(submission.token, ok_response(None, &["fact A", "fact B"]));
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(controller.status_text(), "");
        let texts: Vec<&str> = controller
            .view()
            .unwrap()
            .trivia
            .iter()
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(texts, ["fact A", "fact B"]);
    }

    #[test]
    fn message_reaches_status_line() {
        let mut controller = Controller::default();
        let submission = controller.begin_submit().unwrap();
        controller.complete(submission.token, ok_response(Some("clipped to domain"), &[]));
        assert_eq!(controller.status_text(), "clipped to domain");
    }

    #[test]
    fn stale_response_never_overwrites_newer_one() {
        let mut controller = Controller::default();
        let first = controller.begin_submit().unwrap();
        let second = controller.begin_submit().unwrap();
        assert_eq!(second.superseded, Some(first.token));

        let outcome = controller.complete(second.token, ok_response(Some("second"), &[]));
        assert_eq!(outcome, Outcome::Applied);
        let outcome = controller.complete(first.token, ok_response(Some("first"), &[]));
        assert_eq!(outcome, Outcome::Stale);
        assert_eq!(controller.status_text(), "second");
    }

    #[test]
    fn failure_keeps_last_good_view() {
        let mut controller = Controller::default();
        let ok = controller.begin_submit().unwrap();
        controller.complete(ok.token, ok_response(None, &["kept"]));

        let failing = controller.begin_submit().unwrap();
        let outcome = controller.complete(failing.token, Err(GalleriaError::HttpStatus(500)));
        assert_eq!(outcome, Outcome::Failed(GalleriaError::HttpStatus(500)));
        assert_eq!(controller.status().error(), Some("server responded with HTTP 500"));
        assert_eq!(controller.status_text(), "server responded with HTTP 500");
        assert_eq!(controller.view().unwrap().trivia[0].text, "kept");
    }

    #[test]
    fn render_failure_reaches_status_line() {
        let mut controller = Controller::default();
        let submission = controller.begin_submit().unwrap();
        controller.complete(submission.token, ok_response(Some("fine"), &["kept"]));
        controller.fail_render(GalleriaError::Render("Plotly is not loaded".into()));
        assert_eq!(
            controller.status_text(),
            "could not draw the chart: Plotly is not loaded"
        );
        assert_eq!(controller.view().unwrap().trivia[0].text, "kept");
    }

    #[test]
    fn cancel_drops_in_flight_response() {
        let mut controller = Controller::default();
        let submission = controller.begin_submit().unwrap();
        assert_eq!(controller.cancel(), Some(submission.token));
        assert_eq!(controller.status(), &PlotStatus::Idle);
        assert_eq!(
            controller.complete(submission.token, ok_response(None, &[])),
            Outcome::Stale
        );
        assert!(controller.view().is_none());
    }

    #[test]
    fn theme_checkbox_drives_classes_and_request() {
        let mut controller = Controller::default();
        let before = controller.root_classes().clone();
        controller.set_theme_checked(true);
        assert!(controller.root_classes().is_dark());
        assert_eq!(controller.begin_submit().unwrap().request.theme.as_str(), "dark");
        controller.set_theme_checked(false);
        assert_eq!(controller.root_classes(), &before);
        assert_eq!(controller.begin_submit().unwrap().request.theme.as_str(), "light");
    }

    #[test]
    fn toggle_twice_restores_root_classes() {
        let mut controller = Controller::default();
        let before = controller.root_classes().clone();
        controller.toggle_theme();
        assert!(controller.root_classes().contains("bg-slate-900"));
        assert!(controller.root_classes().contains("text-white"));
        controller.toggle_theme();
        assert_eq!(controller.root_classes(), &before);
        assert!(!controller.form().dark);
    }

    #[test]
    fn dark_default_starts_toggled() {
        let config = GalleriaConfig {
            default_dark: true,
            ..GalleriaConfig::default()
        };
        let controller = Controller::new(config);
        assert!(controller.root_classes().is_dark());
        assert!(controller.form().dark);
    }
}
