//! [`BaseSurface`] over the page's map widget.
//!
//! The widget itself lives in JavaScript under the global
//! `geoportalSurface` object; this side keeps the overlay order and the
//! element handles so stack positions never need a round trip.

use compare::{BaseSurface, ElementHandle, SurfaceError};
use foundation::bounds::Aabb2;
use foundation::handles::HandlePool;
use layers::css::ClipInset;
use layers::layer::Layer;
use layers::raster::RasterLayer;
use wasm_bindgen::prelude::*;

#[wasm_bindgen(js_namespace = geoportalSurface)]
extern "C" {
    #[wasm_bindgen(catch, js_name = attachLayer)]
    fn js_attach_layer(
        element: u32,
        layer_id: f64,
        tiled: bool,
        url: &str,
        extent: &[f64],
        visible: bool,
        opacity: f64,
        tile_style: Option<String>,
        position: u32,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = detachLayer)]
    fn js_detach_layer(element: u32) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = setVisible)]
    fn js_set_visible(element: u32, visible: bool) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = setOpacity)]
    fn js_set_opacity(element: u32, opacity: f64) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = setClip)]
    fn js_set_clip(element: u32, clip_path: Option<String>) -> Result<(), JsValue>;

    #[wasm_bindgen(catch, js_name = setFilter)]
    fn js_set_filter(element: u32, filter: Option<String>) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = fitExtent)]
    fn js_fit_extent(min_x: f64, min_y: f64, max_x: f64, max_y: f64, padding_px: f64);

    #[wasm_bindgen(js_name = activeBaseLayer)]
    fn js_active_base_layer() -> Option<String>;

    #[wasm_bindgen(catch, js_name = showBaseLayer)]
    fn js_show_base_layer(id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = setBoundaryVisible)]
    fn js_set_boundary_visible(visible: bool);

    #[wasm_bindgen(catch, js_name = setBackgroundColor)]
    fn js_set_background_color(color: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(js_name = getZoom)]
    fn js_zoom() -> f64;

    #[wasm_bindgen(js_name = setZoom)]
    fn js_set_zoom(zoom: f64);

    #[wasm_bindgen(js_name = setView)]
    fn js_set_view(x: f64, y: f64, zoom: f64);

    #[wasm_bindgen(js_name = setLoading)]
    fn js_set_loading(loading: bool);
}

/// Overlay order as last told to the widget, bottom first.
#[derive(Debug, Default)]
pub struct OverlayStack {
    pool: HandlePool,
    order: Vec<ElementHandle>,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a handle and records it at `position` (clamped), or on top.
    pub fn insert(&mut self, position: Option<usize>) -> (ElementHandle, usize) {
        let handle = ElementHandle(self.pool.allocate());
        let at = position.unwrap_or(self.order.len()).min(self.order.len());
        self.order.insert(at, handle);
        (handle, at)
    }

    /// Undoes an [`OverlayStack::insert`] the widget rejected.
    pub fn discard(&mut self, handle: ElementHandle) {
        if let Some(at) = self.position(handle) {
            self.order.remove(at);
            self.pool.release(handle.0);
        }
    }

    pub fn remove(&mut self, handle: ElementHandle) -> Result<usize, SurfaceError> {
        let at = self
            .position(handle)
            .ok_or(SurfaceError::MissingElement(handle))?;
        self.order.remove(at);
        self.pool.release(handle.0);
        Ok(at)
    }

    pub fn position(&self, handle: ElementHandle) -> Option<usize> {
        self.order.iter().position(|h| *h == handle)
    }

    /// Key the widget knows the element by. Unique among live elements.
    pub fn key(&self, handle: ElementHandle) -> Result<u32, SurfaceError> {
        self.position(handle)
            .map(|_| handle.0.index())
            .ok_or(SurfaceError::MissingElement(handle))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct WebSurface {
    overlays: OverlayStack,
}

impl WebSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

fn js_error_text(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn widget_call(result: Result<(), JsValue>) -> Result<(), SurfaceError> {
    result.map_err(|e| SurfaceError::LoadFailed(js_error_text(&e)))
}

impl BaseSurface for WebSurface {
    fn attach_layer(
        &mut self,
        layer: &RasterLayer,
        position: Option<usize>,
    ) -> Result<ElementHandle, SurfaceError> {
        let tile_style = match layer.tile_style {
            Some(style) => Some(
                serde_json::to_string(&style)
                    .map_err(|e| SurfaceError::LoadFailed(e.to_string()))?,
            ),
            None => None,
        };
        let (handle, at) = self.overlays.insert(position);
        let p = layer.projected;
        let attached = js_attach_layer(
            handle.0.index(),
            layer.id().0 as f64,
            layer.kind.is_tiled(),
            &layer.url,
            &[p.min[0], p.min[1], p.max[0], p.max[1]],
            layer.style.visible,
            layer.style.opacity,
            tile_style,
            at as u32,
        );
        if let Err(e) = attached {
            self.overlays.discard(handle);
            return Err(SurfaceError::LoadFailed(js_error_text(&e)));
        }
        Ok(handle)
    }

    fn detach_layer(&mut self, element: ElementHandle) -> Result<usize, SurfaceError> {
        let key = self.overlays.key(element)?;
        widget_call(js_detach_layer(key))?;
        self.overlays.remove(element)
    }

    fn layer_position(&self, element: ElementHandle) -> Option<usize> {
        self.overlays.position(element)
    }

    fn set_visible(&mut self, element: ElementHandle, visible: bool) -> Result<(), SurfaceError> {
        widget_call(js_set_visible(self.overlays.key(element)?, visible))
    }

    fn set_opacity(&mut self, element: ElementHandle, opacity: f64) -> Result<(), SurfaceError> {
        widget_call(js_set_opacity(self.overlays.key(element)?, opacity))
    }

    fn set_clip(
        &mut self,
        element: ElementHandle,
        clip: Option<ClipInset>,
    ) -> Result<(), SurfaceError> {
        widget_call(js_set_clip(
            self.overlays.key(element)?,
            clip.map(|c| c.to_css()),
        ))
    }

    fn set_filter(
        &mut self,
        element: ElementHandle,
        filter: Option<&str>,
    ) -> Result<(), SurfaceError> {
        widget_call(js_set_filter(
            self.overlays.key(element)?,
            filter.map(str::to_string),
        ))
    }

    fn fit_extent(&mut self, extent: Aabb2, padding_px: f64) {
        js_fit_extent(
            extent.min[0],
            extent.min[1],
            extent.max[0],
            extent.max[1],
            padding_px,
        );
    }

    fn active_base_layer(&self) -> Option<String> {
        js_active_base_layer()
    }

    fn show_base_layer(&mut self, id: &str) -> Result<(), SurfaceError> {
        widget_call(js_show_base_layer(id))
    }

    fn set_boundary_visible(&mut self, visible: bool) {
        js_set_boundary_visible(visible);
    }

    fn set_background_color(&mut self, color: &str) -> Result<(), SurfaceError> {
        widget_call(js_set_background_color(color))
    }

    fn zoom(&self) -> f64 {
        js_zoom()
    }

    fn set_zoom(&mut self, zoom: f64) {
        js_set_zoom(zoom);
    }

    fn set_view(&mut self, center: [f64; 2], zoom: f64) {
        js_set_view(center[0], center[1], zoom);
    }

    fn set_loading(&mut self, loading: bool) {
        js_set_loading(loading);
    }
}
