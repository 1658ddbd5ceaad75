use leptos::*;

use galleria::protocol::JSON_CONTENT_TYPE;
use galleria::{
    decode_response, Controller, CurveMode, GalleriaConfig, GalleriaError, Outcome, PlotResponse,
    PlotView, Preset, RequestToken, TriviaBlock,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{AbortController, AbortSignal, Headers, HtmlInputElement, HtmlSelectElement, RequestInit, Response};

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");
const APP_COMMIT: &str = env!("GIT_COMMIT_HASH");

const MODE_ID: &str = "mode";
const PRESET_ID: &str = "preset";
const FIELDS_ID: &str = "fields";
const THEME_ID: &str = "theme";
const LINEWIDTH_ID: &str = "linewidth";
const MARKERS_ID: &str = "markers";

fn document() -> Option<web_sys::Document> {
    web_sys::window().and_then(|w| w.document())
}

fn input_by_id(id: &str) -> Option<HtmlInputElement> {
    document()?
        .get_element_by_id(id)?
        .dyn_into::<HtmlInputElement>()
        .ok()
}

fn select_value(id: &str) -> String {
    document()
        .and_then(|d| d.get_element_by_id(id))
        .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
        .map(|sel| sel.value())
        .unwrap_or_default()
}

fn event_checked(ev: &leptos::ev::Event) -> bool {
    ev.target()
        .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
        .map(|inp| inp.checked())
        .unwrap_or(false)
}

/// Every `<input>` currently mounted in the fields container, in document order.
fn collect_fields(container_id: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    let Some(document) = document() else {
        return out;
    };
    if let Ok(list) = document.query_selector_all(&format!("#{container_id} input")) {
        for i in 0..list.length() {
            if let Some(node) = list.item(i) {
                if let Ok(input) = node.dyn_into::<HtmlInputElement>() {
                    out.push((input.id(), input.value()));
                }
            }
        }
    }
    out
}

fn console_warn(msg: &str) {
    web_sys::console::warn_1(&JsValue::from_str(msg));
}

fn js_text(err: &JsValue) -> String {
    err.as_string()
        .or_else(|| {
            js_sys::Reflect::get(err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| "unknown error".to_string())
}

fn js_error(err: JsValue) -> GalleriaError {
    GalleriaError::Transport(js_text(&err))
}

async fn post_plot(
    endpoint: &str,
    body: &str,
    signal: Option<&AbortSignal>,
) -> Result<PlotResponse, GalleriaError> {
    let window =
        web_sys::window().ok_or_else(|| GalleriaError::Transport("no window".to_string()))?;
    let headers = Headers::new().map_err(js_error)?;
    headers
        .set("Content-Type", JSON_CONTENT_TYPE)
        .map_err(js_error)?;
    let init = RequestInit::new();
    init.set_method("POST");
    init.set_headers(&headers);
    init.set_body(&JsValue::from_str(body));
    init.set_signal(signal);

    let response = JsFuture::from(window.fetch_with_str_and_init(endpoint, &init))
        .await
        .map_err(js_error)?;
    let response: Response = response.dyn_into().map_err(js_error)?;
    if !response.ok() {
        return Err(GalleriaError::HttpStatus(response.status()));
    }
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .ok_or_else(|| GalleriaError::Decode("response body is not text".to_string()))?;
    decode_response(&text)
}

#[cfg(feature = "chart_plotly")]
fn plot_view(div_id: &str, view: &PlotView) -> Result<(), GalleriaError> {
    use serde::Serialize;

    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    let convert = |e: serde_wasm_bindgen::Error| GalleriaError::Render(e.to_string());
    let traces = view.traces.serialize(&serializer).map_err(convert)?;
    let layout = view.layout.serialize(&serializer).map_err(convert)?;
    let options = view.options.serialize(&serializer).map_err(convert)?;
    let plotly = js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("Plotly"))
        .unwrap_or(JsValue::UNDEFINED);
    let func = js_sys::Reflect::get(&plotly, &JsValue::from_str("newPlot"))
        .and_then(|v| v.dyn_into::<js_sys::Function>())
        .map_err(|_| GalleriaError::Render("Plotly is not loaded".to_string()))?;
    let args = js_sys::Array::of4(&JsValue::from_str(div_id), &traces, &layout, &options);
    func.apply(&plotly, &args)
        .map(|_| ())
        .map_err(|err| GalleriaError::Render(format!("Plotly.newPlot failed: {}", js_text(&err))))
}

#[cfg(not(feature = "chart_plotly"))]
fn plot_view(_div_id: &str, _view: &PlotView) -> Result<(), GalleriaError> {
    Ok(())
}

#[component]
pub fn App() -> impl IntoView {
    let config = GalleriaConfig::default();
    let default_linewidth = config.default_linewidth.clone();
    let default_markers = config.default_markers;
    let default_dark = config.default_dark;
    let controller = store_value(Controller::new(config));
    let in_flight = store_value(Option::<(RequestToken, AbortController)>::None);
    let fields_ref = create_node_ref::<html::Div>();

    let (status, set_status) = create_signal(String::new());
    let (status_is_error, set_status_is_error) = create_signal(false);
    let (busy, set_busy) = create_signal(false);
    let (root_class, set_root_class) =
        create_signal(controller.with_value(|c| c.root_classes().class_attr()));
    let (trivia, set_trivia) = create_signal(Vec::<TriviaBlock>::new());
    let initial_markup = controller.with_value(|c| c.markup());

    let sync_status = move || {
        let (text, failed, pending) = controller.with_value(|c| {
            (
                c.status_text(),
                c.status().error().is_some(),
                c.status().is_pending(),
            )
        });
        set_status.set(text);
        set_status_is_error.set(failed);
        set_busy.set(pending);
    };

    // Remount the template for the current selector values. Edits are lost.
    let render_fields = move || {
        let mode = select_value(MODE_ID);
        let preset = select_value(PRESET_ID);
        let mut result = None;
        controller.update_value(|c| result = Some(c.select(&mode, &preset)));
        match result {
            Some(Ok(markup)) => {
                if let Some(el) = fields_ref.get_untracked() {
                    el.set_inner_html(&markup);
                }
            }
            Some(Err(err)) => console_warn(&err.to_string()),
            None => {}
        }
        sync_status();
    };

    let on_theme = move |ev: leptos::ev::Event| {
        let checked = event_checked(&ev);
        controller.update_value(|c| c.set_theme_checked(checked));
        set_root_class.set(controller.with_value(|c| c.root_classes().class_attr()));
    };

    let on_plot = move |_ev: leptos::ev::MouseEvent| {
        let collected = collect_fields(FIELDS_ID);
        let dark = input_by_id(THEME_ID).map(|i| i.checked()).unwrap_or(false);
        let linewidth = input_by_id(LINEWIDTH_ID).map(|i| i.value()).unwrap_or_default();
        let markers = input_by_id(MARKERS_ID).map(|i| i.checked()).unwrap_or(false);

        let mut started = None;
        controller.update_value(|c| {
            let form = c.form_mut();
            form.dark = dark;
            form.linewidth = linewidth;
            form.markers = markers;
            form.sync_fields(collected);
            started = Some(c.begin_submit());
        });
        let submission = match started {
            Some(Ok(submission)) => submission,
            Some(Err(err)) => {
                console_warn(&err.to_string());
                sync_status();
                return;
            }
            None => return,
        };

        if submission.superseded.is_some() {
            if let Some((_, previous)) = in_flight.get_value() {
                previous.abort();
            }
        }
        let abort = AbortController::new().ok();
        in_flight.set_value(abort.clone().map(|a| (submission.token, a)));
        sync_status();

        let (endpoint, graph_id) =
            controller.with_value(|c| (c.config().endpoint.clone(), c.config().graph_id.clone()));
        spawn_local(async move {
            let signal = abort.as_ref().map(|a| a.signal());
            let result = post_plot(&endpoint, &submission.body, signal.as_ref()).await;
            let mut outcome = Outcome::Stale;
            controller.update_value(|c| outcome = c.complete(submission.token, result));
            match outcome {
                Outcome::Applied => {
                    in_flight.set_value(None);
                    if let Some(view) = controller.with_value(|c| c.view().cloned()) {
                        if let Err(err) = plot_view(&graph_id, &view) {
                            console_warn(&err.to_string());
                            controller.update_value(|c| c.fail_render(err));
                        }
                        set_trivia.set(view.trivia);
                    }
                }
                Outcome::Failed(err) => {
                    in_flight.set_value(None);
                    console_warn(&err.to_string());
                }
                Outcome::Stale => {}
            }
            sync_status();
        });
    };

    let mode_options = CurveMode::ALL
        .iter()
        .map(|m| view! { <option value=m.as_str()>{m.label()}</option> })
        .collect_view();
    let preset_options = Preset::ALL
        .iter()
        .map(|p| view! { <option value=p.as_str()>{p.label()}</option> })
        .collect_view();

    view! {
        <div id="body" class=move || format!("min-h-screen transition-colors {}", root_class.get())>
            <main class="max-w-6xl mx-auto p-6 space-y-6">
                <header>
                    <h1 class="text-3xl font-semibold">"Math Galleria"</h1>
                    <p class="text-sm">"Pick a curve family or a preset, tune the parameters and plot."</p>
                </header>
                <section class="grid md:grid-cols-3 gap-6">
                    <div class="space-y-4">
                        <div>
                            <label class="block text-sm font-medium" for=MODE_ID>"Mode"</label>
                            <select id=MODE_ID class="w-full border rounded-lg p-2" on:change=move |_| render_fields()>
                                {mode_options}
                            </select>
                        </div>
                        <div>
                            <label class="block text-sm font-medium" for=PRESET_ID>"Preset"</label>
                            <select id=PRESET_ID class="w-full border rounded-lg p-2" on:change=move |_| render_fields()>
                                <option value="">"None"</option>
                                {preset_options}
                            </select>
                        </div>
                        <div id=FIELDS_ID class="space-y-3" node_ref=fields_ref inner_html=initial_markup></div>
                        <div class="grid grid-cols-2 gap-3">
                            <div>
                                <label class="text-sm block" for=LINEWIDTH_ID>"line width"</label>
                                <input id=LINEWIDTH_ID type="number" step="0.5" min="0.5" value=default_linewidth class="w-full border rounded-lg p-2"/>
                            </div>
                            <label class="text-sm flex items-center gap-2">
                                <input id=MARKERS_ID type="checkbox" prop:checked=default_markers/>
                                "markers"
                            </label>
                        </div>
                        <label class="text-sm flex items-center gap-2">
                            <input id=THEME_ID type="checkbox" prop:checked=default_dark on:change=on_theme/>
                            "dark theme"
                        </label>
                        <button id="plotBtn" class="w-full rounded-lg p-2 bg-indigo-600 text-white" on:click=on_plot>
                            "Plot"
                        </button>
                        <span class="text-xs" style=move || if busy.get() { "" } else { "display:none;" }>"Plotting…"</span>
                        <div
                            id="messages"
                            class=move || if status_is_error.get() { "text-sm text-red-600" } else { "text-sm" }
                        >
                            {move || status.get()}
                        </div>
                    </div>
                    <div class="md:col-span-2 space-y-4">
                        <div id="graph" class="w-full h-[600px]"></div>
                        <div id="trivia" class="flex flex-col gap-2">
                            {move || {
                                trivia
                                    .get()
                                    .into_iter()
                                    .map(|block| view! { <div class=block.class>{block.text}</div> })
                                    .collect_view()
                            }}
                        </div>
                    </div>
                </section>
                <footer>
                    <p class="text-xs">{"Web version "}{APP_VERSION}{" ("}{APP_COMMIT}{")"}</p>
                </footer>
            </main>
        </div>
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    leptos::mount_to_body(|| view! { <App/> });
}
