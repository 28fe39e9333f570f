use console_error_panic_hook::set_once;
use gloo_net::http::Request;
use std::cell::RefCell;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use catalog::{CatalogError, FetchedCatalog, Scene};
use compare::{CompareError, ComparisonView, Slot, ViewerConfig};
use foundation::time::Millis;
use layers::layer::LayerId;
use layers::symbology::FilterParams;
use runtime::event_bus::{Notice, NoticeLevel};
use serde::Serialize;
use tracing::{info, warn};

mod prefs;
mod surface;

pub use prefs::BrowserPrefs;
pub use surface::{OverlayStack, WebSurface};

type View = ComparisonView<WebSurface, BrowserPrefs>;

thread_local! {
    static STATE: RefCell<Option<View>> = const { RefCell::new(None) };
}

/// Runs `f` against the live view.
///
/// The map widget must report load events asynchronously: a callback that
/// re-enters while a handler is running would find the state borrowed.
fn with_view<R>(f: impl FnOnce(&mut View) -> Result<R, CompareError>) -> Result<R, JsValue> {
    STATE.with(|state| {
        let mut s = state.borrow_mut();
        let view = s
            .as_mut()
            .ok_or_else(|| JsValue::from_str("viewer not initialised, call init() first"))?;
        f(view).map_err(|e| JsValue::from_str(&e.to_string()))
    })
}

fn slot_of(secondary: bool) -> Slot {
    Slot::from_is_secondary(secondary)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    set_once();
    tracing_wasm::set_as_global_default();
    Ok(())
}

/// Builds the view from a JSON [`ViewerConfig`] (empty for defaults).
#[wasm_bindgen]
pub fn init(config_json: &str) -> Result<(), JsValue> {
    let config = if config_json.trim().is_empty() {
        ViewerConfig::default()
    } else {
        ViewerConfig::from_json(config_json).map_err(|e| JsValue::from_str(&e.to_string()))?
    };
    let view = ComparisonView::new(config, WebSurface::new(), BrowserPrefs::open())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    info!(background = view.background_color(), "viewer ready");
    STATE.with(|state| *state.borrow_mut() = Some(view));
    Ok(())
}

// Catalog

#[derive(Serialize)]
struct ResultRow<'a> {
    #[serde(flatten)]
    scene: &'a Scene,
    primary: bool,
    secondary: bool,
}

/// Fetches the catalog and runs a search; resolves to the result rows as
/// JSON. The previous result list is replaced.
#[wasm_bindgen]
pub async fn search(
    date_from: String,
    date_to: String,
    max_cloud_coverage: Option<u8>,
) -> Result<String, JsValue> {
    let url = with_view(|v| Ok(v.config().catalog_url.clone()))?;
    let catalog = fetch_catalog(&url).await;
    if let Some(err) = catalog.error() {
        warn!(%err, url = %url, "catalog unavailable");
    }
    with_view(|v| {
        v.search(&catalog, &date_from, &date_to, max_cloud_coverage)?;
        let results = v.results();
        let rows: Vec<ResultRow<'_>> = results
            .scenes()
            .iter()
            .map(|scene| ResultRow {
                scene,
                primary: results.is_primary(&scene.id),
                secondary: results.is_secondary(&scene.id),
            })
            .collect();
        serde_json::to_string(&rows).map_err(|e| CompareError::Config(e.to_string()))
    })
}

async fn fetch_catalog(url: &str) -> FetchedCatalog {
    let resp = match Request::get(url).send().await {
        Ok(resp) => resp,
        Err(e) => return FetchedCatalog::unavailable(CatalogError::Io(e.to_string())),
    };
    let status = resp.status();
    let body = resp.text().await.map_err(|e| e.to_string());
    FetchedCatalog::from_response(status, body)
}

// Slots

#[wasm_bindgen]
pub fn select_scene(secondary: bool, scene_id: &str) -> Result<(), JsValue> {
    with_view(|v| v.select_scene(slot_of(secondary), scene_id).map(|_| ()))
}

#[wasm_bindgen]
pub fn clear_slot(secondary: bool) -> Result<(), JsValue> {
    with_view(|v| {
        v.clear_slot(slot_of(secondary));
        Ok(())
    })
}

/// Reported by the map widget once a layer's source finished loading.
#[wasm_bindgen]
pub fn layer_loaded(layer_id: f64) -> Result<Option<String>, JsValue> {
    with_view(|v| Ok(v.layer_loaded(LayerId(layer_id as u64)).map(|s| s.to_string())))
}

/// Reported by the map widget when a layer's source failed. The slot is
/// rolled back and the user alerted through [`drain_notices`]; only a call
/// before [`init`] is an error.
#[wasm_bindgen]
pub fn layer_failed(layer_id: f64, reason: &str) -> Result<(), JsValue> {
    with_view(|v| {
        if let Err(err) = v.layer_failed(LayerId(layer_id as u64), reason) {
            warn!(%err, "layer load failed");
        }
        Ok(())
    })
}

// Grading

fn slider_params(brightness: f64, contrast: f64, saturation: f64) -> FilterParams {
    FilterParams::new(brightness, contrast, saturation)
}

/// "Apply" button: grades the slot immediately. Returns the clamped values.
#[wasm_bindgen]
pub fn apply_filters(
    secondary: bool,
    brightness: f64,
    contrast: f64,
    saturation: f64,
) -> Result<String, JsValue> {
    let params = with_view(|v| {
        Ok(v.apply_filters(
            slot_of(secondary),
            slider_params(brightness, contrast, saturation),
        ))
    })?;
    to_json(&params)
}

/// Slider input: applies once the sliders have been still for the
/// configured debounce interval.
#[wasm_bindgen]
pub fn schedule_filters(
    secondary: bool,
    brightness: f64,
    contrast: f64,
    saturation: f64,
) -> Result<(), JsValue> {
    let now = Millis(js_sys::Date::now());
    let deadline = with_view(|v| {
        Ok(v.schedule_filters(
            slot_of(secondary),
            slider_params(brightness, contrast, saturation),
            now,
        ))
    })?;
    flush_filters_at(deadline.since(now))
}

fn flush_filters_at(delay_ms: f64) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let callback = Closure::once_into_js(flush_filters);
    window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay_ms.max(0.0).ceil() as i32,
    )?;
    Ok(())
}

fn flush_filters() {
    let applied = with_view(|v| Ok(v.poll_filters(Millis(js_sys::Date::now()))));
    match applied {
        Ok(applied) => {
            for (slot, params) in applied {
                tracing::debug!(%slot, ?params, "debounced filters applied");
            }
        }
        Err(err) => web_sys::console::log_1(&err),
    }
}

#[wasm_bindgen]
pub fn apply_preset(secondary: bool, preset_id: &str) -> Result<String, JsValue> {
    let params = with_view(|v| v.apply_preset(slot_of(secondary), preset_id))?;
    to_json(&params)
}

#[wasm_bindgen]
pub fn reset_filters(secondary: bool) -> Result<(), JsValue> {
    with_view(|v| {
        v.reset_filters(slot_of(secondary));
        Ok(())
    })
}

// Composition

/// Returns the mode actually entered, which is `single` when the request
/// needs a primary scene that is not there.
#[wasm_bindgen]
pub fn set_mode(mode: &str) -> Result<String, JsValue> {
    with_view(|v| v.set_mode_str(mode).map(|m| m.to_string()))
}

#[wasm_bindgen]
pub fn drag_divider(percent: f64) -> Result<f64, JsValue> {
    with_view(|v| Ok(v.drag_divider(percent)))
}

#[wasm_bindgen]
pub fn set_blend(value: f64) -> Result<f64, JsValue> {
    with_view(|v| Ok(v.set_blend(value)))
}

// Base map

#[wasm_bindgen]
pub fn set_base_layer(id: &str) -> Result<(), JsValue> {
    with_view(|v| v.set_base_layer(id))
}

#[wasm_bindgen]
pub fn apply_background_color(color: &str, switch_to_empty: bool) -> Result<(), JsValue> {
    with_view(|v| v.apply_background_color(color, switch_to_empty))
}

/// Back to the configured background colour (white by default).
#[wasm_bindgen]
pub fn reset_background_color() -> Result<(), JsValue> {
    with_view(|v| v.reset_background_color())
}

#[wasm_bindgen]
pub fn zoom_in() -> Result<f64, JsValue> {
    with_view(|v| Ok(v.zoom_by(1.0)))
}

#[wasm_bindgen]
pub fn zoom_out() -> Result<f64, JsValue> {
    with_view(|v| Ok(v.zoom_by(-1.0)))
}

#[wasm_bindgen]
pub fn reset_view() -> Result<(), JsValue> {
    with_view(|v| {
        v.reset_view();
        Ok(())
    })
}

// UI sync

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UiState {
    mode: &'static str,
    divider_percent: f64,
    blend: f64,
    curtain_active: bool,
    blend_slider_active: bool,
    primary: Option<String>,
    secondary: Option<String>,
    primary_loading: bool,
    secondary_loading: bool,
    primary_filters: Option<FilterParams>,
    secondary_filters: Option<FilterParams>,
    base_layer: Option<String>,
    background_color: String,
}

fn ui_state(v: &View) -> UiState {
    let slots = v.slots();
    let modes = v.modes();
    let scene_id = |slot: Slot| slots.scene(slot).map(|s: &Scene| s.id.clone());
    UiState {
        mode: v.mode().as_str(),
        divider_percent: modes.divider_percent(),
        blend: modes.blend(),
        curtain_active: modes.curtain_active(slots),
        blend_slider_active: modes.blend_slider_active(slots),
        primary: scene_id(Slot::Primary),
        secondary: scene_id(Slot::Secondary),
        primary_loading: slots.is_loading(Slot::Primary),
        secondary_loading: slots.is_loading(Slot::Secondary),
        primary_filters: v.grading().params(Slot::Primary),
        secondary_filters: v.grading().params(Slot::Secondary),
        base_layer: v.active_base_layer(),
        background_color: v.background_color().to_string(),
    }
}

/// Snapshot of everything the controls mirror, as JSON.
#[wasm_bindgen]
pub fn state() -> Result<String, JsValue> {
    let snapshot = with_view(|v| Ok(ui_state(v)))?;
    to_json(&snapshot)
}

#[derive(Debug, Serialize, PartialEq)]
struct NoticeRow {
    seq: u64,
    level: &'static str,
    kind: &'static str,
    message: String,
}

impl From<Notice> for NoticeRow {
    fn from(n: Notice) -> Self {
        let level = match n.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Alert => "alert",
        };
        Self {
            seq: n.seq,
            level,
            kind: n.kind,
            message: n.message,
        }
    }
}

/// Notices raised since the last call, oldest first, as JSON. `alert`
/// entries are meant to block (`window.alert`).
#[wasm_bindgen]
pub fn drain_notices() -> Result<String, JsValue> {
    let rows: Vec<NoticeRow> = with_view(|v| {
        Ok(v.drain_notices().into_iter().map(NoticeRow::from).collect())
    })?;
    to_json(&rows)
}
