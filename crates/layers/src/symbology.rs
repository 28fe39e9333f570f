use serde::{Deserialize, Serialize};

/// Per-layer presentation on the map surface.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerStyle {
    pub visible: bool,
    /// `0.0..=1.0`.
    pub opacity: f64,
}

impl LayerStyle {
    pub const fn new(visible: bool, opacity: f64) -> Self {
        Self { visible, opacity }
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 1.0,
        }
    }
}

pub const BRIGHTNESS_RANGE: (f64, f64) = (-1.5, 0.7);
pub const CONTRAST_RANGE: (f64, f64) = (-4.0, 4.0);
pub const SATURATION_RANGE: (f64, f64) = (-4.0, 4.0);
pub const HUE_RANGE: (f64, f64) = (-180.0, 180.0);
pub const SEPIA_RANGE: (f64, f64) = (0.0, 1.0);

/// Normalized colour adjustments for one slot.
///
/// The all-zero default is the "untouched" value. Note that contrast and
/// saturation feed two backends with different neutral points (0 for the
/// tiled style, 1 for the CSS multiplier), see [`crate::css::css_filter`].
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterParams {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sepia: Option<f64>,
}

impl FilterParams {
    pub const NEUTRAL: FilterParams = FilterParams {
        brightness: 0.0,
        contrast: 0.0,
        saturation: 0.0,
        hue: None,
        sepia: None,
    };

    pub fn new(brightness: f64, contrast: f64, saturation: f64) -> Self {
        Self {
            brightness,
            contrast,
            saturation,
            hue: None,
            sepia: None,
        }
    }

    pub fn with_hue(mut self, hue: f64) -> Self {
        self.hue = Some(hue);
        self
    }

    pub fn with_sepia(mut self, sepia: f64) -> Self {
        self.sepia = Some(sepia);
        self
    }

    /// Clamps every field into its declared range. NaN becomes 0.
    ///
    /// Idempotent: clamping already-clamped params returns them unchanged.
    pub fn clamped(self) -> Self {
        Self {
            brightness: clamp_field(self.brightness, BRIGHTNESS_RANGE),
            contrast: clamp_field(self.contrast, CONTRAST_RANGE),
            saturation: clamp_field(self.saturation, SATURATION_RANGE),
            hue: self.hue.map(|h| clamp_field(h, HUE_RANGE)),
            sepia: self.sepia.map(|s| clamp_field(s, SEPIA_RANGE)),
        }
    }

    pub fn is_clamped(&self) -> bool {
        *self == self.clamped()
    }
}

fn clamp_field(v: f64, (lo, hi): (f64, f64)) -> f64 {
    if v.is_nan() { 0.0_f64.clamp(lo, hi) } else { v.clamp(lo, hi) }
}

/// Channel operation of the tiled raster style. Only the identity is used.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOperation {
    #[default]
    None,
}

/// Declarative style handed to the tiled (GPU) raster backend.
///
/// The backend cannot restyle a live layer; a new style means a new layer.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileStyle {
    pub brightness: f64,
    pub contrast: f64,
    pub saturation: f64,
    pub gamma: f64,
    pub operation: ChannelOperation,
}

impl TileStyle {
    pub fn from_params(params: &FilterParams) -> Self {
        let p = params.clamped();
        Self {
            brightness: p.brightness,
            contrast: p.contrast,
            saturation: p.saturation,
            gamma: 1.0,
            operation: ChannelOperation::None,
        }
    }
}

impl Default for TileStyle {
    fn default() -> Self {
        Self::from_params(&FilterParams::NEUTRAL)
    }
}

/// Named filter recipe (false colour, vegetation, ...).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderPreset {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub params: FilterParams,
}

pub const RENDER_PRESETS: [RenderPreset; 7] = [
    RenderPreset {
        id: "natural",
        name: "Natural colour",
        description: "True colour RGB composite",
        params: FilterParams {
            brightness: 0.0,
            contrast: 1.0,
            saturation: 1.0,
            hue: None,
            sepia: None,
        },
    },
    RenderPreset {
        id: "color_ir",
        name: "Colour infrared",
        description: "Highlights vegetation",
        params: FilterParams {
            brightness: 0.0,
            contrast: 1.1,
            saturation: 1.5,
            hue: Some(30.0),
            sepia: None,
        },
    },
    RenderPreset {
        id: "short_wave_ir",
        name: "Short-wave infrared",
        description: "Useful for geology",
        params: FilterParams {
            brightness: 0.1,
            contrast: 1.2,
            saturation: 0.8,
            hue: Some(-30.0),
            sepia: None,
        },
    },
    RenderPreset {
        id: "agriculture",
        name: "Agriculture",
        description: "Separates crop types",
        params: FilterParams {
            brightness: 0.2,
            contrast: 1.3,
            saturation: 1.6,
            hue: Some(60.0),
            sepia: None,
        },
    },
    RenderPreset {
        id: "urban",
        name: "Urban",
        description: "Emphasises built-up areas",
        params: FilterParams {
            brightness: 0.1,
            contrast: 1.1,
            saturation: 1.2,
            hue: Some(-10.0),
            sepia: None,
        },
    },
    RenderPreset {
        id: "ndvi",
        name: "Vegetation index (NDVI)",
        description: "Normalized difference vegetation index look",
        params: FilterParams {
            brightness: 0.2,
            contrast: 1.4,
            saturation: 1.8,
            hue: Some(120.0),
            sepia: Some(0.3),
        },
    },
    RenderPreset {
        id: "temp",
        name: "Surface temperature",
        description: "Land surface temperature look",
        params: FilterParams {
            brightness: 0.1,
            contrast: 1.2,
            saturation: 1.5,
            hue: Some(-120.0),
            sepia: Some(0.4),
        },
    },
];

pub fn render_preset(id: &str) -> Option<&'static RenderPreset> {
    RENDER_PRESETS.iter().find(|p| p.id == id)
}
