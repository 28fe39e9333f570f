use catalog::{
    BACKGROUND_COLOR_KEY, CatalogError, CatalogProvider, PreferenceStore, Scene, SearchQuery,
    SearchResults,
};
use foundation::time::Millis;
use layers::layer::LayerId;
use layers::raster::RasterKind;
use layers::symbology::{FilterParams, render_preset};
use runtime::event_bus::{EventBus, Notice, NoticeLevel};
use tracing::{debug, info, warn};

use crate::config::{EMPTY_BASE_LAYER, ViewerConfig};
use crate::error::CompareError;
use crate::grading::GradingUnit;
use crate::mode::{CompositionMode, ModeController};
use crate::slots::{LayerHandle, Slot, SlotManager};
use crate::surface::{BaseSurface, skip_on_error};

/// Lower-cases a `#RRGGBB` colour; anything else is rejected.
pub fn normalize_hex_color(color: &str) -> Option<String> {
    let hex = color.trim().strip_prefix('#')?;
    (hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()))
        .then(|| format!("#{}", hex.to_ascii_lowercase()))
}

/// One comparison viewer: slots, grading, composition mode, base surface and
/// the search result list, with user-facing notices collected on an
/// [`EventBus`].
///
/// Everything runs on the caller's event loop; asynchronous outcomes (layer
/// loads, timers) come back in through [`ComparisonView::layer_loaded`],
/// [`ComparisonView::layer_failed`] and [`ComparisonView::poll_filters`].
#[derive(Debug)]
pub struct ComparisonView<S, P> {
    config: ViewerConfig,
    surface: S,
    prefs: P,
    slots: SlotManager,
    grading: GradingUnit,
    modes: ModeController,
    results: SearchResults,
    notices: EventBus,
    background_color: String,
}

impl<S: BaseSurface, P: PreferenceStore> ComparisonView<S, P> {
    /// Shows the default base layer and restores the persisted background
    /// colour of the empty layer.
    pub fn new(config: ViewerConfig, mut surface: S, prefs: P) -> Result<Self, CompareError> {
        config.validate()?;
        let base = config
            .default_base_layer()
            .ok_or_else(|| CompareError::Config("no base layers".into()))?
            .to_string();
        surface.show_base_layer(&base)?;
        surface.set_boundary_visible(base != EMPTY_BASE_LAYER);

        let background_color = match prefs.get(BACKGROUND_COLOR_KEY) {
            Ok(Some(stored)) => normalize_hex_color(&stored).unwrap_or_else(|| {
                warn!(stored = %stored, "ignoring malformed stored background colour");
                config.default_background_color.clone()
            }),
            Ok(None) => config.default_background_color.clone(),
            Err(e) => {
                warn!(error = %e, "preferences unavailable");
                config.default_background_color.clone()
            }
        };
        skip_on_error(
            surface.set_background_color(&background_color),
            "background colour",
        );

        Ok(Self {
            slots: SlotManager::from_config(&config),
            grading: GradingUnit::new(config.debounce_ms),
            modes: ModeController::from_config(&config),
            results: SearchResults::new(),
            notices: EventBus::new(),
            background_color,
            config,
            surface,
            prefs,
        })
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn prefs(&self) -> &P {
        &self.prefs
    }

    pub fn slots(&self) -> &SlotManager {
        &self.slots
    }

    pub fn grading(&self) -> &GradingUnit {
        &self.grading
    }

    pub fn mode(&self) -> CompositionMode {
        self.modes.mode()
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    pub fn results(&self) -> &SearchResults {
        &self.results
    }

    pub fn notices(&self) -> &[Notice] {
        self.notices.events()
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain()
    }

    pub fn background_color(&self) -> &str {
        &self.background_color
    }

    // Catalog

    /// Runs a search and keeps the result list for selection.
    ///
    /// A missing date bound is reported to the user and returned as an
    /// error. A failing catalog just yields no results.
    pub fn search(
        &mut self,
        catalog: &impl CatalogProvider,
        date_from: &str,
        date_to: &str,
        max_cloud_coverage_percent: Option<u8>,
    ) -> Result<&[Scene], CompareError> {
        let query = match SearchQuery::parse(date_from, date_to, max_cloud_coverage_percent) {
            Ok(q) => q,
            Err(e) => {
                self.notices.alert("search", e.to_string());
                return Err(e.into());
            }
        };
        let scenes = catalog.search(&query);
        info!(found = scenes.len(), "search");
        if scenes.is_empty() {
            self.notices
                .emit(NoticeLevel::Info, "search", "no scenes match the search");
        }
        self.results.replace(scenes);
        self.sync_selection();
        Ok(self.results.scenes())
    }

    /// Shows the result with `scene_id` in `slot`.
    pub fn select_scene(&mut self, slot: Slot, scene_id: &str) -> Result<LayerHandle, CompareError> {
        let Some(scene) = self.results.find(scene_id).cloned() else {
            let err = CompareError::InvalidScene {
                id: scene_id.to_string(),
                reason: "not in the current results".into(),
            };
            self.notices.alert("scene", err.to_string());
            return Err(err);
        };
        self.show_scene(slot, &scene)
    }

    // Slots

    pub fn show_scene(&mut self, slot: Slot, scene: &Scene) -> Result<LayerHandle, CompareError> {
        let result = self.try_show_scene(slot, scene);
        if let Err(e) = &result {
            self.notices.alert("scene", e.to_string());
        }
        result
    }

    fn try_show_scene(&mut self, slot: Slot, scene: &Scene) -> Result<LayerHandle, CompareError> {
        let kind = self.slots.validate(scene)?;
        if kind == RasterKind::Tiled && !self.empty_base_active() {
            return Err(CompareError::TiffRequiresEmptyBase);
        }
        let style = self.grading.tile_style(slot);
        let handle = self.slots.set_slot(slot, scene, style, &mut self.surface)?;
        self.grading.slot_changed(slot, &mut self.slots, &mut self.surface);
        self.sync_selection();
        self.rearrange();
        // Grading may have rebuilt the layer.
        Ok(self.slots.get_slot(slot).unwrap_or(handle))
    }

    pub fn clear_slot(&mut self, slot: Slot) -> Option<Scene> {
        let cleared = self.slots.clear_slot(slot, &mut self.surface);
        self.sync_selection();
        self.rearrange();
        cleared
    }

    /// The surface finished loading `layer`.
    pub fn layer_loaded(&mut self, layer: LayerId) -> Option<Slot> {
        self.slots.load_finished(layer, &mut self.surface)
    }

    /// The surface failed to load `layer`: the slot goes back to what it
    /// showed before and the user is told.
    pub fn layer_failed(&mut self, layer: LayerId, reason: &str) -> Result<(), CompareError> {
        let Err(e) = self.slots.load_failed(layer, reason, &mut self.surface) else {
            return Ok(());
        };
        if let CompareError::LayerLoad { slot, .. } = &e {
            self.grading.slot_changed(*slot, &mut self.slots, &mut self.surface);
        }
        self.notices.alert("scene", e.to_string());
        self.sync_selection();
        self.rearrange();
        Err(e)
    }

    // Grading

    pub fn apply_filters(&mut self, slot: Slot, params: FilterParams) -> FilterParams {
        self.regrade(|grading, slots, surface| grading.apply(slot, params, slots, surface))
    }

    /// Debounced variant of [`ComparisonView::apply_filters`] for slider
    /// drags. Returns when [`ComparisonView::poll_filters`] should be called.
    pub fn schedule_filters(&mut self, slot: Slot, params: FilterParams, now: Millis) -> Millis {
        self.grading.schedule(slot, params, now)
    }

    pub fn poll_filters(&mut self, now: Millis) -> Vec<(Slot, FilterParams)> {
        self.regrade(|grading, slots, surface| grading.poll(now, slots, surface))
    }

    pub fn apply_preset(&mut self, slot: Slot, preset_id: &str) -> Result<FilterParams, CompareError> {
        let preset = render_preset(preset_id)
            .ok_or_else(|| CompareError::UnknownPreset(preset_id.to_string()))?;
        debug!(%slot, preset = preset.id, "render preset");
        Ok(self.apply_filters(slot, preset.params))
    }

    pub fn reset_filters(&mut self, slot: Slot) {
        self.regrade(|grading, slots, surface| grading.reset(slot, slots, surface));
    }

    /// Restores the configured background colour of the empty layer and
    /// persists it.
    pub fn reset_background_color(&mut self) -> Result<(), CompareError> {
        let color = self.config.default_background_color.clone();
        self.surface.set_background_color(&color)?;
        self.persist_background_color(&color);
        self.background_color = color;
        Ok(())
    }

    // Composition

    pub fn set_mode(&mut self, mode: CompositionMode) -> CompositionMode {
        let entered = self.modes.set_mode(mode, &self.slots, &mut self.surface);
        if entered != mode {
            self.notices
                .warn("mode", "select a primary scene before comparing");
        }
        entered
    }

    pub fn set_mode_str(&mut self, mode: &str) -> Result<CompositionMode, CompareError> {
        Ok(self.set_mode(mode.parse()?))
    }

    pub fn drag_divider(&mut self, percent: f64) -> f64 {
        self.modes.drag_divider(percent, &self.slots, &mut self.surface)
    }

    pub fn set_blend(&mut self, value: f64) -> f64 {
        self.modes.set_blend(value, &self.slots, &mut self.surface)
    }

    // Base surface

    /// Makes `id` the visible base layer.
    ///
    /// Any base other than the empty one clears both slots, drops back to
    /// Single mode and resets the camera.
    pub fn set_base_layer(&mut self, id: &str) -> Result<(), CompareError> {
        if !self.config.has_base_layer(id) {
            return Err(CompareError::UnknownBaseLayer(id.to_string()));
        }
        self.surface.show_base_layer(id)?;
        let empty = id == EMPTY_BASE_LAYER;
        self.surface.set_boundary_visible(!empty);
        if !empty {
            self.slots.clear_all(&mut self.surface);
            self.modes.force_single(&self.slots, &mut self.surface);
            self.sync_selection();
            self.reset_view();
        }
        debug!(base = id, "base layer");
        Ok(())
    }

    pub fn active_base_layer(&self) -> Option<String> {
        self.surface.active_base_layer()
    }

    /// Sets and persists the empty layer's background colour.
    ///
    /// While another base is active this fails with
    /// [`CompareError::EmptyBaseInactive`] unless `switch_to_empty` is set,
    /// in which case the empty base is activated first.
    pub fn apply_background_color(
        &mut self,
        color: &str,
        switch_to_empty: bool,
    ) -> Result<(), CompareError> {
        let color = normalize_hex_color(color)
            .ok_or_else(|| CompareError::InvalidColor(color.to_string()))?;
        if !self.empty_base_active() {
            if !switch_to_empty {
                return Err(CompareError::EmptyBaseInactive);
            }
            self.set_base_layer(EMPTY_BASE_LAYER)?;
        }
        self.surface.set_background_color(&color)?;
        self.persist_background_color(&color);
        self.background_color = color;
        Ok(())
    }

    fn persist_background_color(&mut self, color: &str) {
        if let Err(e) = self.prefs.set(BACKGROUND_COLOR_KEY, color) {
            warn!(error = %e, "background colour not persisted");
            if e != CatalogError::StorageUnavailable {
                self.notices.warn("preferences", e.to_string());
            }
        }
    }

    pub fn zoom_by(&mut self, delta: f64) -> f64 {
        let zoom = self.config.map.clamp_zoom(self.surface.zoom() + delta);
        self.surface.set_zoom(zoom);
        zoom
    }

    pub fn reset_view(&mut self) {
        let map = &self.config.map;
        self.surface.set_view(map.center_projected(), map.zoom);
    }

    fn empty_base_active(&self) -> bool {
        self.surface.active_base_layer().as_deref() == Some(EMPTY_BASE_LAYER)
    }

    /// Runs a grading pass. A tiled slot restyled by swapping in a new
    /// element comes up opaque and unclipped, so the current mode is laid
    /// out again whenever a slot's element changed.
    fn regrade<R>(
        &mut self,
        pass: impl FnOnce(&mut GradingUnit, &mut SlotManager, &mut S) -> R,
    ) -> R {
        let before = Slot::ALL.map(|slot| self.slots.get_slot(slot));
        let out = pass(&mut self.grading, &mut self.slots, &mut self.surface);
        if Slot::ALL.map(|slot| self.slots.get_slot(slot)) != before {
            self.rearrange();
        }
        out
    }

    fn rearrange(&mut self) {
        if !self.modes.arrange(&self.slots, &mut self.surface) {
            self.notices
                .warn("mode", "primary scene removed, back to single view");
        }
    }

    fn sync_selection(&mut self) {
        self.results
            .mark_primary(self.slots.scene(Slot::Primary).map(|s| s.id.as_str()));
        self.results
            .mark_secondary(self.slots.scene(Slot::Secondary).map(|s| s.id.as_str()));
    }
}
