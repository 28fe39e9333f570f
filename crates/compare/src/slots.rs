use std::fmt;

use catalog::Scene;
use layers::layer::{Layer, LayerId, LayerIds};
use layers::raster::{RasterKind, RasterLayer};
use layers::symbology::TileStyle;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::error::CompareError;
use crate::surface::{BaseSurface, ElementHandle};

/// One of the two comparison positions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    Primary,
    Secondary,
}

impl Slot {
    pub const ALL: [Slot; 2] = [Slot::Primary, Slot::Secondary];

    pub fn index(self) -> usize {
        match self {
            Slot::Primary => 0,
            Slot::Secondary => 1,
        }
    }

    pub fn from_is_secondary(secondary: bool) -> Self {
        if secondary { Slot::Secondary } else { Slot::Primary }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Slot::Primary => "primary",
            Slot::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`SlotManager::set_slot`] hands back: the logical layer and the
/// rendered element that grading and clipping target.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayerHandle {
    pub layer: LayerId,
    pub element: ElementHandle,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotEntry {
    pub scene: Scene,
    pub layer: RasterLayer,
    pub element: ElementHandle,
}

impl SlotEntry {
    pub fn handle(&self) -> LayerHandle {
        LayerHandle {
            layer: self.layer.id(),
            element: self.element,
        }
    }

    pub fn kind(&self) -> RasterKind {
        self.layer.kind
    }
}

/// An attached layer that has not reported back yet, and what the slot held
/// before it.
#[derive(Debug, Clone)]
struct PendingLoad {
    layer: LayerId,
    previous: Option<(Scene, RasterLayer)>,
    position: Option<usize>,
}

/// Owns at most one layer per slot.
///
/// A slot's old layer is always detached before its replacement is
/// attached, so a slot never has two layers on the surface.
#[derive(Debug)]
pub struct SlotManager {
    entries: [Option<SlotEntry>; 2],
    pending: [Option<PendingLoad>; 2],
    ids: LayerIds,
    valid_extensions: Vec<String>,
    fit_padding_px: f64,
}

impl SlotManager {
    pub fn new(valid_extensions: Vec<String>, fit_padding_px: f64) -> Self {
        Self {
            entries: [None, None],
            pending: [None, None],
            ids: LayerIds::new(),
            valid_extensions,
            fit_padding_px,
        }
    }

    pub fn from_config(cfg: &ViewerConfig) -> Self {
        Self::new(cfg.valid_extensions.clone(), cfg.fit_padding_px)
    }

    pub fn get_slot(&self, slot: Slot) -> Option<LayerHandle> {
        self.entries[slot.index()].as_ref().map(SlotEntry::handle)
    }

    pub fn entry(&self, slot: Slot) -> Option<&SlotEntry> {
        self.entries[slot.index()].as_ref()
    }

    pub fn scene(&self, slot: Slot) -> Option<&Scene> {
        self.entry(slot).map(|e| &e.scene)
    }

    pub fn is_occupied(&self, slot: Slot) -> bool {
        self.entries[slot.index()].is_some()
    }

    pub fn is_loading(&self, slot: Slot) -> bool {
        self.pending[slot.index()].is_some()
    }

    pub fn allocate_id(&mut self) -> LayerId {
        self.ids.next_id()
    }

    /// Checks that `scene` can be shown and picks its backend.
    pub fn validate(&self, scene: &Scene) -> Result<RasterKind, CompareError> {
        let invalid = |reason: String| CompareError::InvalidScene {
            id: scene.id.clone(),
            reason,
        };
        if scene.url.trim().is_empty() {
            return Err(invalid("missing url".into()));
        }
        let ext = scene.file_extension().unwrap_or_default();
        if !self.valid_extensions.iter().any(|e| *e == ext) {
            let shown = if ext.is_empty() { "(none)" } else { ext.as_str() };
            return Err(invalid(format!("unsupported file type {shown}")));
        }
        if !scene.geo_extent().is_valid() {
            return Err(invalid("invalid extent".into()));
        }
        Ok(RasterKind::for_extension(&ext))
    }

    /// Shows `scene` in `slot`, replacing whatever was there.
    ///
    /// `tile_style` is used only when the scene routes to the tiled backend.
    /// The new layer counts as loading until [`SlotManager::load_finished`]
    /// or [`SlotManager::load_failed`] names it.
    pub fn set_slot(
        &mut self,
        slot: Slot,
        scene: &Scene,
        tile_style: TileStyle,
        surface: &mut impl BaseSurface,
    ) -> Result<LayerHandle, CompareError> {
        let kind = self.validate(scene)?;
        let mut layer = RasterLayer::new(
            self.ids.next_id(),
            kind,
            scene.name.clone(),
            scene.url.clone(),
            scene.geo_extent(),
        );
        if kind.is_tiled() {
            layer.tile_style = Some(tile_style);
        }

        let i = slot.index();
        let superseded = self.pending[i].take();
        let old = self.entries[i].take();
        let position = match &old {
            Some(old) => detach_logged(old.element, surface),
            None => self.insertion_point(slot, &*surface),
        };
        // Roll back to the last layer that actually loaded.
        let previous = match superseded {
            Some(p) => p.previous,
            None => old.map(|e| (e.scene, e.layer)),
        };

        match surface.attach_layer(&layer, position) {
            Ok(element) => {
                debug!(%slot, scene = %scene.id, layer = layer.id().0, "slot set");
                let handle = LayerHandle {
                    layer: layer.id(),
                    element,
                };
                self.entries[i] = Some(SlotEntry {
                    scene: scene.clone(),
                    layer,
                    element,
                });
                self.pending[i] = Some(PendingLoad {
                    layer: handle.layer,
                    previous,
                    position,
                });
                self.sync_loading(surface);
                Ok(handle)
            }
            Err(e) => {
                warn!(%slot, scene = %scene.id, error = %e, "attach failed, restoring slot");
                self.restore(slot, previous, position, surface);
                self.sync_loading(surface);
                Err(CompareError::LayerLoad {
                    slot,
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Marks `layer` loaded. Frames the primary scene when it is shown alone.
    ///
    /// Returns `None` for a layer that was already replaced or removed.
    pub fn load_finished(&mut self, layer: LayerId, surface: &mut impl BaseSurface) -> Option<Slot> {
        let Some(slot) = self.pending_slot(layer) else {
            debug!(layer = layer.0, "load callback for a layer no longer in a slot");
            return None;
        };
        self.pending[slot.index()] = None;
        if slot == Slot::Primary && !self.is_occupied(Slot::Secondary) {
            if let Some(entry) = self.entry(Slot::Primary) {
                surface.fit_extent(entry.layer.projected, self.fit_padding_px);
            }
        }
        self.sync_loading(surface);
        Some(slot)
    }

    /// Rolls the slot holding `layer` back to what it showed before.
    ///
    /// Stale layers are ignored (`Ok`); otherwise the rollback is done and
    /// the load error is returned for reporting.
    pub fn load_failed(
        &mut self,
        layer: LayerId,
        reason: &str,
        surface: &mut impl BaseSurface,
    ) -> Result<(), CompareError> {
        let Some(slot) = self.pending_slot(layer) else {
            debug!(layer = layer.0, "failure callback for a layer no longer in a slot");
            return Ok(());
        };
        let i = slot.index();
        let pending = self.pending[i].take();
        let failed = self.entries[i].take();
        let (previous, mut position) = match pending {
            Some(p) => (p.previous, p.position),
            None => (None, None),
        };
        if let Some(failed) = failed {
            if let Some(p) = detach_logged(failed.element, surface) {
                position = Some(p);
            }
        }
        warn!(%slot, layer = layer.0, reason, "layer load failed, rolling back");
        self.restore(slot, previous, position, surface);
        self.sync_loading(surface);
        Err(CompareError::LayerLoad {
            slot,
            reason: reason.to_string(),
        })
    }

    /// Empties `slot`. Returns the scene it held.
    pub fn clear_slot(&mut self, slot: Slot, surface: &mut impl BaseSurface) -> Option<Scene> {
        let i = slot.index();
        self.pending[i] = None;
        let entry = self.entries[i].take()?;
        detach_logged(entry.element, surface);
        self.sync_loading(surface);
        debug!(%slot, scene = %entry.scene.id, "slot cleared");
        Some(entry.scene)
    }

    pub fn clear_all(&mut self, surface: &mut impl BaseSurface) {
        for slot in Slot::ALL {
            self.clear_slot(slot, surface);
        }
    }

    /// Swaps the slot's layer object for `layer` at the same stack position,
    /// keeping the slot's scene.
    ///
    /// Used when the backend cannot restyle a live layer. On failure the old
    /// layer is put back.
    pub fn replace(
        &mut self,
        slot: Slot,
        layer: RasterLayer,
        surface: &mut impl BaseSurface,
    ) -> Result<LayerHandle, CompareError> {
        let i = slot.index();
        let Some(mut entry) = self.entries[i].take() else {
            return Err(CompareError::EmptySlot(slot));
        };
        let position = match surface.detach_layer(entry.element) {
            Ok(p) => p,
            Err(e) => {
                self.entries[i] = Some(entry);
                return Err(e.into());
            }
        };

        match surface.attach_layer(&layer, Some(position)) {
            Ok(element) => {
                let old_id = entry.layer.id();
                if let Some(p) = self.pending[i].as_mut().filter(|p| p.layer == old_id) {
                    p.layer = layer.id();
                }
                debug!(%slot, old = old_id.0, new = layer.id().0, "layer replaced");
                entry.layer = layer;
                entry.element = element;
                let handle = entry.handle();
                self.entries[i] = Some(entry);
                Ok(handle)
            }
            Err(e) => {
                match surface.attach_layer(&entry.layer, Some(position)) {
                    Ok(element) => {
                        entry.element = element;
                        self.entries[i] = Some(entry);
                    }
                    Err(e2) => {
                        warn!(%slot, error = %e2, "could not restore layer after failed replace");
                        self.pending[i] = None;
                        self.sync_loading(surface);
                    }
                }
                Err(CompareError::LayerLoad {
                    slot,
                    reason: e.to_string(),
                })
            }
        }
    }

    fn pending_slot(&self, layer: LayerId) -> Option<Slot> {
        Slot::ALL.into_iter().find(|s| {
            self.pending[s.index()]
                .as_ref()
                .is_some_and(|p| p.layer == layer)
        })
    }

    /// Where a layer goes in an empty slot: primary below secondary,
    /// secondary on top.
    fn insertion_point(&self, slot: Slot, surface: &impl BaseSurface) -> Option<usize> {
        match slot {
            Slot::Primary => self
                .entry(Slot::Secondary)
                .and_then(|e| surface.layer_position(e.element)),
            Slot::Secondary => None,
        }
    }

    fn restore(
        &mut self,
        slot: Slot,
        previous: Option<(Scene, RasterLayer)>,
        position: Option<usize>,
        surface: &mut impl BaseSurface,
    ) {
        let i = slot.index();
        self.entries[i] = None;
        let Some((scene, layer)) = previous else {
            return;
        };
        match surface.attach_layer(&layer, position) {
            Ok(element) => {
                debug!(%slot, scene = %scene.id, "slot restored");
                self.entries[i] = Some(SlotEntry {
                    scene,
                    layer,
                    element,
                });
            }
            Err(e) => warn!(%slot, scene = %scene.id, error = %e, "could not restore previous layer"),
        }
    }

    fn sync_loading(&self, surface: &mut impl BaseSurface) {
        surface.set_loading(self.pending.iter().any(Option::is_some));
    }
}

fn detach_logged(element: ElementHandle, surface: &mut impl BaseSurface) -> Option<usize> {
    match surface.detach_layer(element) {
        Ok(position) => Some(position),
        Err(e) => {
            warn!(error = %e, "detach failed");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use catalog::StaticCatalog;
    use layers::raster::RasterKind;
    use layers::symbology::{FilterParams, TileStyle};
    use pretty_assertions::assert_eq;

    use super::{Slot, SlotManager};
    use crate::config::ViewerConfig;
    use crate::error::CompareError;
    use crate::testing::{RecordingSurface, scene, tiff_scene};

    fn manager() -> SlotManager {
        SlotManager::from_config(&ViewerConfig::default())
    }

    #[test]
    fn rejects_missing_url_and_bad_extension() {
        let m = manager();
        let mut s = scene("a");
        s.url = String::new();
        assert!(matches!(m.validate(&s), Err(CompareError::InvalidScene { .. })));
        s.url = "data/a.bmp".into();
        assert!(matches!(m.validate(&s), Err(CompareError::InvalidScene { .. })));
        s.url = "data/noext".into();
        assert!(matches!(m.validate(&s), Err(CompareError::InvalidScene { .. })));
        assert_eq!(m.validate(&tiff_scene("t")).unwrap(), RasterKind::Tiled);
        assert_eq!(m.validate(&scene("j")).unwrap(), RasterKind::StaticImage);
    }

    #[test]
    fn replacing_a_slot_never_holds_two_layers() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        let first = m.set_slot(Slot::Primary, &scene("a"), TileStyle::default(), &mut surface).unwrap();
        let second = m.set_slot(Slot::Primary, &scene("b"), TileStyle::default(), &mut surface).unwrap();
        assert_ne!(first.layer, second.layer);
        assert_eq!(surface.urls(), vec!["data/b.jpg"]);
        assert!(surface.element(first.element).is_none());
        assert_eq!(m.get_slot(Slot::Primary), Some(second));
        assert!(surface.log.iter().position(|l| l == "detach data/a.jpg")
            < surface.log.iter().position(|l| l == "attach data/b.jpg"));
    }

    #[test]
    fn primary_goes_below_secondary() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        m.set_slot(Slot::Secondary, &scene("s"), TileStyle::default(), &mut surface).unwrap();
        m.set_slot(Slot::Primary, &scene("p"), TileStyle::default(), &mut surface).unwrap();
        assert_eq!(surface.urls(), vec!["data/p.jpg", "data/s.jpg"]);
        m.set_slot(Slot::Secondary, &scene("t"), TileStyle::default(), &mut surface).unwrap();
        assert_eq!(surface.urls(), vec!["data/p.jpg", "data/t.jpg"]);
    }

    #[test]
    fn primary_alone_is_framed_once_loaded() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        let h = m.set_slot(Slot::Primary, &scene("a"), TileStyle::default(), &mut surface).unwrap();
        assert!(surface.loading);
        assert!(surface.fits.is_empty());
        assert_eq!(m.load_finished(h.layer, &mut surface), Some(Slot::Primary));
        assert!(!surface.loading);
        assert_eq!(surface.fits.len(), 1);
        assert_eq!(surface.fits[0].1, 50.0);
    }

    #[test]
    fn no_framing_when_both_slots_are_set() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        let s = m.set_slot(Slot::Secondary, &scene("s"), TileStyle::default(), &mut surface).unwrap();
        m.load_finished(s.layer, &mut surface);
        let p = m.set_slot(Slot::Primary, &scene("p"), TileStyle::default(), &mut surface).unwrap();
        m.load_finished(p.layer, &mut surface);
        assert!(surface.fits.is_empty());
    }

    #[test]
    fn failed_load_rolls_back_to_previous_scene() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        let a = m.set_slot(Slot::Primary, &scene("a"), TileStyle::default(), &mut surface).unwrap();
        m.load_finished(a.layer, &mut surface);
        let b = m.set_slot(Slot::Primary, &scene("b"), TileStyle::default(), &mut surface).unwrap();
        assert!(surface.loading);

        let err = m.load_failed(b.layer, "404", &mut surface).unwrap_err();
        assert!(matches!(err, CompareError::LayerLoad { slot: Slot::Primary, .. }));
        assert_eq!(m.scene(Slot::Primary).map(|s| s.id.as_str()), Some("a"));
        assert_eq!(surface.urls(), vec!["data/a.jpg"]);
        assert!(!surface.loading);
        // The callback for the rolled-back layer is now stale.
        assert!(m.load_failed(b.layer, "again", &mut surface).is_ok());
    }

    #[test]
    fn failed_first_load_leaves_slot_empty() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        let a = m.set_slot(Slot::Secondary, &scene("a"), TileStyle::default(), &mut surface).unwrap();
        assert!(m.load_failed(a.layer, "network", &mut surface).is_err());
        assert!(!m.is_occupied(Slot::Secondary));
        assert!(surface.urls().is_empty());
    }

    #[test]
    fn superseded_load_rolls_back_to_last_loaded() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        let a = m.set_slot(Slot::Primary, &scene("a"), TileStyle::default(), &mut surface).unwrap();
        m.load_finished(a.layer, &mut surface);
        let b = m.set_slot(Slot::Primary, &scene("b"), TileStyle::default(), &mut surface).unwrap();
        let c = m.set_slot(Slot::Primary, &scene("c"), TileStyle::default(), &mut surface).unwrap();
        assert_eq!(m.load_finished(b.layer, &mut surface), None);
        assert!(m.load_failed(c.layer, "timeout", &mut surface).is_err());
        assert_eq!(m.scene(Slot::Primary).map(|s| s.id.as_str()), Some("a"));
    }

    #[test]
    fn synchronous_attach_failure_restores_old_layer_in_place() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        m.set_slot(Slot::Primary, &scene("p"), TileStyle::default(), &mut surface).unwrap();
        m.set_slot(Slot::Secondary, &scene("s"), TileStyle::default(), &mut surface).unwrap();
        surface.fail_urls.push("data/x.jpg".into());
        let err = m
            .set_slot(Slot::Primary, &scene("x"), TileStyle::default(), &mut surface)
            .unwrap_err();
        assert!(matches!(err, CompareError::LayerLoad { .. }));
        assert_eq!(surface.urls(), vec!["data/p.jpg", "data/s.jpg"]);
        assert_eq!(m.scene(Slot::Primary).map(|s| s.id.as_str()), Some("p"));
    }

    #[test]
    fn replace_keeps_stack_position() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        m.set_slot(Slot::Primary, &tiff_scene("p"), TileStyle::default(), &mut surface).unwrap();
        m.set_slot(Slot::Secondary, &scene("s"), TileStyle::default(), &mut surface).unwrap();
        let style = TileStyle::from_params(&FilterParams::new(0.3, 1.0, 1.0));
        let id = m.allocate_id();
        let rebuilt = m.entry(Slot::Primary).unwrap().layer.rebuilt(id, style);
        let h = m.replace(Slot::Primary, rebuilt, &mut surface).unwrap();
        assert_eq!(surface.position_of(h.element), Some(0));
        assert_eq!(surface.element(h.element).unwrap().tile_style, Some(style));
        assert_eq!(surface.urls().len(), 2);
    }

    #[test]
    fn replace_on_empty_slot_is_an_error() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        let layer = layers::raster::RasterLayer::new(
            m.allocate_id(),
            RasterKind::Tiled,
            "t",
            "t.tif",
            foundation::bounds::GeoExtent::new(0.0, 0.0, 1.0, 1.0),
        );
        assert_eq!(
            m.replace(Slot::Secondary, layer, &mut surface),
            Err(CompareError::EmptySlot(Slot::Secondary))
        );
    }

    #[test]
    fn clear_detaches_and_forgets() {
        let mut m = manager();
        let mut surface = RecordingSurface::new();
        let fixture = StaticCatalog::fixture();
        let s = &fixture.scenes_ref()[0];
        m.set_slot(Slot::Primary, s, TileStyle::default(), &mut surface).unwrap();
        assert_eq!(m.clear_slot(Slot::Primary, &mut surface).map(|s| s.id), Some(s.id.clone()));
        assert!(m.get_slot(Slot::Primary).is_none());
        assert!(surface.urls().is_empty());
        assert!(!surface.loading);
        assert_eq!(m.clear_slot(Slot::Primary, &mut surface), None);
    }
}
