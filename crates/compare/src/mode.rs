use std::fmt;
use std::str::FromStr;

use layers::css::{clamp_percent, swipe_clips};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ViewerConfig;
use crate::error::CompareError;
use crate::slots::{Slot, SlotManager};
use crate::surface::{BaseSurface, ElementHandle, skip_on_error};

/// How the primary and secondary slots are combined on screen.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompositionMode {
    #[default]
    Single,
    /// Vertical curtain: primary left of the divider, secondary right.
    Swipe,
    /// Secondary blended over primary.
    Opacity,
}

impl CompositionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            CompositionMode::Single => "single",
            CompositionMode::Swipe => "swipe",
            CompositionMode::Opacity => "opacity",
        }
    }

    pub fn needs_primary(self) -> bool {
        !matches!(self, CompositionMode::Single)
    }
}

impl fmt::Display for CompositionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompositionMode {
    type Err = CompareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(CompositionMode::Single),
            "swipe" => Ok(CompositionMode::Swipe),
            "opacity" => Ok(CompositionMode::Opacity),
            other => Err(CompareError::UnknownMode(other.to_string())),
        }
    }
}

/// The composition state machine.
///
/// Every (re)entry first clears clips and restores full opacity on both
/// slots, then runs the target mode's entry actions.
#[derive(Debug, Clone)]
pub struct ModeController {
    mode: CompositionMode,
    divider_percent: f64,
    blend: f64,
    default_divider_percent: f64,
    default_blend: f64,
}

impl ModeController {
    pub fn new(default_divider_percent: f64, default_blend: f64) -> Self {
        Self {
            mode: CompositionMode::Single,
            divider_percent: default_divider_percent,
            blend: default_blend,
            default_divider_percent,
            default_blend,
        }
    }

    pub fn from_config(cfg: &ViewerConfig) -> Self {
        Self::new(cfg.default_divider_percent, cfg.default_blend)
    }

    pub fn mode(&self) -> CompositionMode {
        self.mode
    }

    pub fn divider_percent(&self) -> f64 {
        self.divider_percent
    }

    pub fn blend(&self) -> f64 {
        self.blend
    }

    /// The draggable divider is shown.
    pub fn curtain_active(&self, slots: &SlotManager) -> bool {
        self.mode == CompositionMode::Swipe && both_occupied(slots)
    }

    /// The blend slider is shown.
    pub fn blend_slider_active(&self, slots: &SlotManager) -> bool {
        self.mode == CompositionMode::Opacity && both_occupied(slots)
    }

    /// Switches to `target` and returns the mode actually entered.
    ///
    /// Swipe and Opacity need a primary scene; without one the controller
    /// lands in Single instead. Divider and blend restart from their
    /// defaults.
    pub fn set_mode(
        &mut self,
        target: CompositionMode,
        slots: &SlotManager,
        surface: &mut impl BaseSurface,
    ) -> CompositionMode {
        self.mode = target;
        self.divider_percent = self.default_divider_percent;
        self.blend = self.default_blend;
        if !self.arrange(slots, surface) {
            warn!(requested = %target, "no primary scene, falling back to single mode");
        }
        debug!(mode = %self.mode, "display mode");
        self.mode
    }

    /// Re-runs the current mode's entry actions, e.g. after a slot changed.
    ///
    /// Returns `false` if the mode could not be kept and fell back to Single.
    pub fn arrange(&mut self, slots: &SlotManager, surface: &mut impl BaseSurface) -> bool {
        let kept = !(self.mode.needs_primary() && !slots.is_occupied(Slot::Primary));
        if !kept {
            self.mode = CompositionMode::Single;
        }
        let primary = element(slots, Slot::Primary);
        let secondary = element(slots, Slot::Secondary);

        for el in [primary, secondary].into_iter().flatten() {
            skip_on_error(surface.set_clip(el, None), "clip reset");
            skip_on_error(surface.set_opacity(el, 1.0), "opacity reset");
            skip_on_error(surface.set_visible(el, true), "visibility");
        }

        match (self.mode, primary, secondary) {
            (CompositionMode::Swipe, Some(p), Some(s)) => {
                self.apply_curtain(p, s, surface);
            }
            (CompositionMode::Opacity, Some(_), Some(s)) => {
                skip_on_error(surface.set_opacity(s, self.blend), "blend");
            }
            _ => {}
        }
        kept
    }

    /// Back to Single unconditionally.
    pub fn force_single(&mut self, slots: &SlotManager, surface: &mut impl BaseSurface) {
        self.mode = CompositionMode::Single;
        self.arrange(slots, surface);
    }

    /// Moves the divider to `percent` of the viewport width (clamped to
    /// `0..=100`) and re-clips both slots when the curtain is shown.
    pub fn drag_divider(
        &mut self,
        percent: f64,
        slots: &SlotManager,
        surface: &mut impl BaseSurface,
    ) -> f64 {
        self.divider_percent = if percent.is_nan() {
            self.default_divider_percent
        } else {
            clamp_percent(percent)
        };
        if self.curtain_active(slots) {
            if let (Some(p), Some(s)) = (element(slots, Slot::Primary), element(slots, Slot::Secondary)) {
                self.apply_curtain(p, s, surface);
            }
        }
        self.divider_percent
    }

    /// Sets the secondary's opacity in Opacity mode. The slider value maps
    /// straight to opacity.
    pub fn set_blend(
        &mut self,
        value: f64,
        slots: &SlotManager,
        surface: &mut impl BaseSurface,
    ) -> f64 {
        self.blend = if value.is_nan() {
            self.default_blend
        } else {
            value.clamp(0.0, 1.0)
        };
        if self.blend_slider_active(slots) {
            if let Some(s) = element(slots, Slot::Secondary) {
                skip_on_error(surface.set_opacity(s, self.blend), "blend");
            }
        }
        self.blend
    }

    fn apply_curtain(
        &self,
        primary: ElementHandle,
        secondary: ElementHandle,
        surface: &mut impl BaseSurface,
    ) {
        let (left, right) = swipe_clips(self.divider_percent);
        skip_on_error(surface.set_clip(primary, Some(left)), "curtain clip");
        skip_on_error(surface.set_clip(secondary, Some(right)), "curtain clip");
    }
}

fn element(slots: &SlotManager, slot: Slot) -> Option<ElementHandle> {
    slots.get_slot(slot).map(|h| h.element)
}

fn both_occupied(slots: &SlotManager) -> bool {
    slots.is_occupied(Slot::Primary) && slots.is_occupied(Slot::Secondary)
}
