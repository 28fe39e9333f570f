use foundation::bounds::GeoExtent;
use foundation::math::{LonLat, lon_lat_to_web_mercator};
use serde::{Deserialize, Serialize};

use crate::error::CompareError;

/// Id of the plain-colour base layer. Only this base can carry GeoTIFF
/// scenes and a custom background colour.
pub const EMPTY_BASE_LAYER: &str = "empty";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// `[lon, lat]` in degrees.
    pub center: [f64; 2],
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Region outline, `[min_lon, min_lat, max_lon, max_lat]`.
    pub extent: [f64; 4],
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [134.0, 44.6],
            zoom: 7.0,
            min_zoom: 5.0,
            max_zoom: 18.0,
            extent: [130.4, 42.3, 139.0, 48.5],
        }
    }
}

impl MapConfig {
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.zoom;
        }
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Centre in Web Mercator metres.
    pub fn center_projected(&self) -> [f64; 2] {
        lon_lat_to_web_mercator(LonLat::new(self.center[0], self.center[1]))
    }

    pub fn region(&self) -> GeoExtent {
        GeoExtent::from_array(self.extent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseLayerConfig {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub visible: bool,
}

impl BaseLayerConfig {
    fn new(id: &str, name: &str, visible: bool) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            visible,
        }
    }
}

/// Everything the viewer needs to know up front. `Default` is the stock
/// Primorye demo; the web front end may pass a JSON override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewerConfig {
    pub map: MapConfig,
    pub base_layers: Vec<BaseLayerConfig>,
    /// Lower-case, with leading dot.
    pub valid_extensions: Vec<String>,
    pub catalog_url: String,
    pub debounce_ms: f64,
    pub default_divider_percent: f64,
    pub default_blend: f64,
    pub fit_padding_px: f64,
    pub default_background_color: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            base_layers: vec![
                BaseLayerConfig::new("osm", "OpenStreetMap", false),
                BaseLayerConfig::new("satellite", "Satellite", true),
                BaseLayerConfig::new(EMPTY_BASE_LAYER, "Empty", false),
            ],
            valid_extensions: [".jpg", ".jpeg", ".png", ".tif", ".tiff", ".jp2"]
                .into_iter()
                .map(String::from)
                .collect(),
            catalog_url: "data/images.json".to_string(),
            debounce_ms: 30.0,
            default_divider_percent: 50.0,
            default_blend: 0.5,
            fit_padding_px: 50.0,
            default_background_color: "#ffffff".to_string(),
        }
    }
}

impl ViewerConfig {
    /// Parses a (possibly partial) JSON override; missing fields keep their
    /// defaults.
    pub fn from_json(raw: &str) -> Result<Self, CompareError> {
        let mut cfg: ViewerConfig =
            serde_json::from_str(raw).map_err(|e| CompareError::Config(e.to_string()))?;
        for ext in &mut cfg.valid_extensions {
            *ext = ext.to_ascii_lowercase();
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), CompareError> {
        let m = &self.map;
        if !(m.min_zoom <= m.zoom && m.zoom <= m.max_zoom) {
            return Err(CompareError::Config(format!(
                "zoom {} outside [{}, {}]",
                m.zoom, m.min_zoom, m.max_zoom
            )));
        }
        if !m.region().is_valid() {
            return Err(CompareError::Config("map extent is not a valid box".into()));
        }
        if self.base_layers.is_empty() {
            return Err(CompareError::Config("no base layers".into()));
        }
        if let Some(ext) = self.valid_extensions.iter().find(|e| !e.starts_with('.')) {
            return Err(CompareError::Config(format!(
                "extension {ext:?} must start with '.'"
            )));
        }
        if self.debounce_ms.is_nan() || self.debounce_ms < 0.0 {
            return Err(CompareError::Config("debounce must be non-negative".into()));
        }
        if !(0.0..=100.0).contains(&self.default_divider_percent) {
            return Err(CompareError::Config("divider must be within 0..=100".into()));
        }
        if !(0.0..=1.0).contains(&self.default_blend) {
            return Err(CompareError::Config("blend must be within 0..=1".into()));
        }
        Ok(())
    }

    pub fn has_base_layer(&self, id: &str) -> bool {
        self.base_layers.iter().any(|l| l.id == id)
    }

    /// First base layer flagged visible, else the first one listed.
    pub fn default_base_layer(&self) -> Option<&str> {
        self.base_layers
            .iter()
            .find(|l| l.visible)
            .or_else(|| self.base_layers.first())
            .map(|l| l.id.as_str())
    }

    pub fn is_valid_extension(&self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.valid_extensions.iter().any(|e| *e == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::{EMPTY_BASE_LAYER, ViewerConfig};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_demo() {
        let cfg = ViewerConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.default_base_layer(), Some("satellite"));
        assert!(cfg.has_base_layer(EMPTY_BASE_LAYER));
        assert_eq!(cfg.debounce_ms, 30.0);
        assert!(cfg.is_valid_extension(".TIF"));
        assert!(!cfg.is_valid_extension(".bmp"));
    }

    #[test]
    fn partial_override_keeps_defaults() {
        let cfg = ViewerConfig::from_json(
            r#"{"catalogUrl": "other.json", "map": {"zoom": 9}, "validExtensions": [".PNG"]}"#,
        )
        .unwrap();
        assert_eq!(cfg.catalog_url, "other.json");
        assert_eq!(cfg.map.zoom, 9.0);
        assert_eq!(cfg.map.max_zoom, 18.0);
        assert_eq!(cfg.valid_extensions, vec![".png".to_string()]);
        assert_eq!(cfg.fit_padding_px, 50.0);
    }

    #[test]
    fn invalid_overrides_are_rejected() {
        assert!(ViewerConfig::from_json(r#"{"map": {"zoom": 30}}"#).is_err());
        assert!(ViewerConfig::from_json(r#"{"validExtensions": ["jpg"]}"#).is_err());
        assert!(ViewerConfig::from_json(r#"{"defaultBlend": 2}"#).is_err());
        assert!(ViewerConfig::from_json("not json").is_err());
    }

    #[test]
    fn zoom_is_clamped() {
        let m = ViewerConfig::default().map;
        assert_eq!(m.clamp_zoom(30.0), 18.0);
        assert_eq!(m.clamp_zoom(1.0), 5.0);
        assert_eq!(m.clamp_zoom(f64::NAN), 7.0);
    }
}
