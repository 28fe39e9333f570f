use foundation::time::Millis;
use layers::css::css_filter;
use layers::symbology::{FilterParams, TileStyle};
use runtime::debounce::Debounced;
use tracing::{debug, warn};

use crate::slots::{Slot, SlotManager};
use crate::surface::{BaseSurface, skip_on_error};

#[derive(Debug)]
struct SlotGrading {
    /// Last applied params; `None` until the user grades the slot.
    params: Option<FilterParams>,
    pending: Debounced<FilterParams>,
    /// The tiled layer could not be rebuilt with a new style; CSS filters
    /// are used for it instead.
    css_fallback: bool,
}

impl SlotGrading {
    fn new(debounce_ms: f64) -> Self {
        Self {
            params: None,
            pending: Debounced::new(debounce_ms),
            css_fallback: false,
        }
    }
}

/// Per-slot colour grading.
///
/// Static images get a CSS filter on their rendered element. Tiled layers
/// get a native [`TileStyle`], which means rebuilding the layer in place.
#[derive(Debug)]
pub struct GradingUnit {
    slots: [SlotGrading; 2],
}

impl GradingUnit {
    pub fn new(debounce_ms: f64) -> Self {
        Self {
            slots: [SlotGrading::new(debounce_ms), SlotGrading::new(debounce_ms)],
        }
    }

    pub fn params(&self, slot: Slot) -> Option<FilterParams> {
        self.slots[slot.index()].params
    }

    /// Style a freshly created tiled layer in `slot` should start with.
    pub fn tile_style(&self, slot: Slot) -> TileStyle {
        self.params(slot)
            .map(|p| TileStyle::from_params(&p))
            .unwrap_or_default()
    }

    pub fn uses_css_fallback(&self, slot: Slot) -> bool {
        self.slots[slot.index()].css_fallback
    }

    pub fn is_pending(&self, slot: Slot) -> bool {
        self.slots[slot.index()].pending.is_pending()
    }

    /// Clamps, stores and renders `params` for `slot` right away, dropping
    /// any pending debounced value. Returns what was stored.
    ///
    /// An empty slot just keeps the params for its next scene.
    pub fn apply(
        &mut self,
        slot: Slot,
        params: FilterParams,
        slots: &mut SlotManager,
        surface: &mut impl BaseSurface,
    ) -> FilterParams {
        let clamped = params.clamped();
        let g = &mut self.slots[slot.index()];
        g.pending.cancel();
        g.params = Some(clamped);
        debug!(%slot, ?clamped, "filters applied");
        self.render(slot, slots, surface);
        clamped
    }

    /// Queues `params` for `slot`, replacing anything already queued.
    /// Returns the deadline at which [`GradingUnit::poll`] will apply it.
    pub fn schedule(&mut self, slot: Slot, params: FilterParams, now: Millis) -> Millis {
        self.slots[slot.index()].pending.push(params.clamped(), now)
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.slots
            .iter()
            .filter_map(|g| g.pending.deadline())
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }

    /// Applies every queued value whose deadline has passed.
    pub fn poll(
        &mut self,
        now: Millis,
        slots: &mut SlotManager,
        surface: &mut impl BaseSurface,
    ) -> Vec<(Slot, FilterParams)> {
        let mut applied = Vec::new();
        for slot in Slot::ALL {
            if let Some(params) = self.slots[slot.index()].pending.poll(now) {
                applied.push((slot, self.apply(slot, params, slots, surface)));
            }
        }
        applied
    }

    /// Back to the untouched look: queued values are dropped, the CSS
    /// filter removed and tiled layers rebuilt with the default style.
    pub fn reset(&mut self, slot: Slot, slots: &mut SlotManager, surface: &mut impl BaseSurface) {
        let g = &mut self.slots[slot.index()];
        g.pending.cancel();
        g.params = None;
        let css = g.css_fallback;
        let Some(entry) = slots.entry(slot) else {
            return;
        };
        if entry.kind().is_tiled() && !css {
            let default = TileStyle::default();
            if entry.layer.tile_style != Some(default) {
                self.rebuild(slot, default, slots, surface);
            }
        } else {
            skip_on_error(surface.set_filter(entry.element, None), "filter reset");
        }
    }

    /// Re-renders `slot` after it got a new layer (new scene or rollback).
    pub fn slot_changed(
        &mut self,
        slot: Slot,
        slots: &mut SlotManager,
        surface: &mut impl BaseSurface,
    ) {
        self.slots[slot.index()].css_fallback = false;
        self.render(slot, slots, surface);
    }

    fn render(&mut self, slot: Slot, slots: &mut SlotManager, surface: &mut impl BaseSurface) {
        let Some(params) = self.params(slot) else {
            return;
        };
        let Some(entry) = slots.entry(slot) else {
            return;
        };
        if entry.kind().is_tiled() && !self.uses_css_fallback(slot) {
            let style = TileStyle::from_params(&params);
            if entry.layer.tile_style == Some(style) || self.rebuild(slot, style, slots, surface) {
                return;
            }
        }
        if let Some(handle) = slots.get_slot(slot) {
            let filter = css_filter(&params);
            skip_on_error(surface.set_filter(handle.element, Some(&filter)), "filter");
        }
    }

    /// Swaps the tiled layer for one styled with `style`. On failure the slot
    /// falls back to CSS filters; returns whether the rebuild happened.
    fn rebuild(
        &mut self,
        slot: Slot,
        style: TileStyle,
        slots: &mut SlotManager,
        surface: &mut impl BaseSurface,
    ) -> bool {
        let id = slots.allocate_id();
        let Some(entry) = slots.entry(slot) else {
            return false;
        };
        let rebuilt = entry.layer.rebuilt(id, style);
        match slots.replace(slot, rebuilt, surface) {
            Ok(_) => true,
            Err(e) => {
                warn!(%slot, error = %e, "tiled style rebuild failed, using CSS filters");
                self.slots[slot.index()].css_fallback = true;
                false
            }
        }
    }
}
