use chrono::NaiveDate;
use foundation::bounds::GeoExtent;
use serde::{Deserialize, Serialize};

/// One catalog entry: a single satellite image over a known extent.
///
/// Scenes are immutable once loaded and identified by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    pub name: String,
    /// Acquisition date, `YYYY-MM-DD` on the wire.
    pub date: NaiveDate,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Percent of the frame covered by cloud, `0..=100`.
    #[serde(rename = "cloudCoverage")]
    pub cloud_coverage_percent: u8,
    /// `[min_lon, min_lat, max_lon, max_lat]` in degrees.
    pub extent: [f64; 4],
    pub sensor: String,
}

impl Scene {
    pub fn geo_extent(&self) -> GeoExtent {
        GeoExtent::from_array(self.extent)
    }

    /// Lower-cased extension including the dot (`".tif"`), if the url has one.
    ///
    /// Query strings and fragments are ignored.
    pub fn file_extension(&self) -> Option<String> {
        url_extension(&self.url)
    }
}

pub fn url_extension(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    let dot = file.rfind('.')?;
    let ext = &file[dot..];
    (ext.len() > 1).then(|| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{Scene, url_extension};
    use chrono::NaiveDate;

    #[test]
    fn extension_is_lowercased_and_ignores_query() {
        assert_eq!(url_extension("data/a.JPG").as_deref(), Some(".jpg"));
        assert_eq!(url_extension("data/a.tif?v=2").as_deref(), Some(".tif"));
        assert_eq!(url_extension("data/a.tiff#x").as_deref(), Some(".tiff"));
        assert_eq!(url_extension("data.d/noext"), None);
        assert_eq!(url_extension("data/trailing."), None);
        assert_eq!(url_extension(""), None);
    }

    #[test]
    fn deserializes_catalog_field_names() {
        let raw = r#"{
            "id": "img_2023_09_15",
            "name": "Scene 15.09.2023",
            "date": "2023-09-15",
            "url": "data/sample_image_1.jpg",
            "thumbnail": "data/thumbnails/sample_image_1_thumb.jpg",
            "cloudCoverage": 5,
            "extent": [131.5, 42.8, 132.5, 43.8],
            "sensor": "Landsat 8"
        }"#;
        let scene: Scene = serde_json::from_str(raw).unwrap();
        assert_eq!(scene.date, NaiveDate::from_ymd_opt(2023, 9, 15).unwrap());
        assert_eq!(scene.cloud_coverage_percent, 5);
        assert_eq!(scene.geo_extent().min_lon, 131.5);
        assert_eq!(scene.file_extension().as_deref(), Some(".jpg"));
    }
}
