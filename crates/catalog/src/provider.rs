use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::CatalogError;
use crate::scene::Scene;
use crate::search::{SearchQuery, filter_scenes};

/// Wire format of the catalog document: `{ "images": [Scene, ...] }`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub images: Vec<Scene>,
}

impl CatalogDocument {
    /// Parses a document, dropping entries that cannot be displayed: ones
    /// that do not read as a [`Scene`] at all, cloud coverage above 100% or
    /// an unusable extent. Only a document that is not `{ "images": [...] }`
    /// is an error.
    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let doc: RawDocument =
            serde_json::from_str(raw).map_err(|e| CatalogError::Corrupt(e.to_string()))?;
        let images = doc
            .images
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<Scene>(entry) {
                Ok(s) if s.cloud_coverage_percent <= 100 && s.geo_extent().is_valid() => Some(s),
                Ok(s) => {
                    warn!(scene = %s.id, "dropping catalog entry with invalid metadata");
                    None
                }
                Err(e) => {
                    warn!(index, error = %e, "dropping unreadable catalog entry");
                    None
                }
            })
            .collect();
        Ok(Self { images })
    }
}

/// Entries are read one by one so a single bad entry only costs itself.
#[derive(Deserialize)]
struct RawDocument {
    #[serde(default)]
    images: Vec<serde_json::Value>,
}

/// Source of scenes for search.
///
/// `search` never fails: a provider that cannot produce its scene list
/// yields an empty result, so callers have no hard failure to handle.
pub trait CatalogProvider {
    fn scenes(&self) -> Result<Vec<Scene>, CatalogError>;

    fn search(&self, query: &SearchQuery) -> Vec<Scene> {
        match self.scenes() {
            Ok(scenes) => filter_scenes(&scenes, query),
            Err(err) => {
                warn!(%err, "catalog unavailable, returning no scenes");
                Vec::new()
            }
        }
    }
}

/// In-memory scene list.
#[derive(Debug, Default, Clone)]
pub struct StaticCatalog {
    scenes: Vec<Scene>,
}

impl StaticCatalog {
    pub fn new(scenes: Vec<Scene>) -> Self {
        Self { scenes }
    }

    pub fn from_document(doc: CatalogDocument) -> Self {
        Self::new(doc.images)
    }

    pub fn scenes_ref(&self) -> &[Scene] {
        &self.scenes
    }

    /// The eight Landsat demo scenes around Primorye.
    pub fn fixture() -> Self {
        let rows: [(&str, &str, u8, [f64; 4], &str); 8] = [
            ("2023-09-15", "sample_image_1", 5, [131.5, 42.8, 132.5, 43.8], "Landsat 8"),
            ("2023-08-20", "sample_image_2", 22, [131.9, 43.6, 132.6, 44.3], "Landsat 8"),
            ("2023-07-12", "sample_image_3", 45, [132.7, 42.6, 133.2, 43.0], "Landsat 8"),
            ("2023-06-30", "sample_image_4", 0, [132.0, 43.2, 132.5, 43.7], "Landsat 8"),
            ("2023-05-15", "sample_image_5", 78, [132.3, 43.0, 132.8, 43.5], "Landsat 8"),
            ("2024-01-20", "sample_image_6", 15, [135.0, 44.3, 135.5, 44.8], "Landsat 9"),
            ("2024-02-15", "sample_image_7", 85, [135.2, 43.7, 135.7, 44.2], "Landsat 9"),
            ("2024-03-05", "sample_image_8", 30, [132.9, 43.0, 133.4, 43.5], "Landsat 9"),
        ];

        let scenes = rows
            .into_iter()
            .filter_map(|(date, file, cloud, extent, sensor)| {
                let date = NaiveDate::parse_from_str(date, crate::search::DATE_FORMAT).ok()?;
                Some(Scene {
                    id: format!("img_{}", date.format("%Y_%m_%d")),
                    name: format!("Scene {}", date.format("%d.%m.%Y")),
                    date,
                    url: format!("data/{file}.jpg"),
                    thumbnail: Some(format!("data/thumbnails/{file}_thumb.jpg")),
                    cloud_coverage_percent: cloud,
                    extent,
                    sensor: sensor.to_string(),
                })
            })
            .collect();
        Self::new(scenes)
    }
}

impl CatalogProvider for StaticCatalog {
    fn scenes(&self) -> Result<Vec<Scene>, CatalogError> {
        Ok(self.scenes.clone())
    }

    fn search(&self, query: &SearchQuery) -> Vec<Scene> {
        filter_scenes(&self.scenes, query)
    }
}

/// Catalog backed by a fetched JSON document.
///
/// Holds either the parsed document or the error that prevented loading it;
/// the error is kept so it can be reported, but search still resolves to an
/// empty list.
#[derive(Debug, Clone)]
pub struct FetchedCatalog {
    loaded: Result<CatalogDocument, CatalogError>,
}

impl FetchedCatalog {
    pub fn from_response(status: u16, body: Result<String, String>) -> Self {
        let loaded = if !(200..300).contains(&status) {
            Err(CatalogError::Http(status))
        } else {
            body.map_err(CatalogError::Io)
                .and_then(|raw| CatalogDocument::from_json(&raw))
        };
        Self { loaded }
    }

    pub fn unavailable(err: CatalogError) -> Self {
        Self { loaded: Err(err) }
    }

    pub fn error(&self) -> Option<&CatalogError> {
        self.loaded.as_ref().err()
    }
}

impl CatalogProvider for FetchedCatalog {
    fn scenes(&self) -> Result<Vec<Scene>, CatalogError> {
        self.loaded
            .as_ref()
            .map(|d| d.images.clone())
            .map_err(|e| e.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogDocument, CatalogProvider, FetchedCatalog, StaticCatalog};
    use crate::CatalogError;
    use crate::search::SearchQuery;
    use pretty_assertions::assert_eq;

    fn summer() -> SearchQuery {
        SearchQuery::parse("2023-06-01", "2023-09-30", Some(30)).unwrap()
    }

    #[test]
    fn fixture_has_eight_unique_scenes() {
        let c = StaticCatalog::fixture();
        let mut ids: Vec<&str> = c.scenes_ref().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), 8);
        assert_eq!(ids[0], "img_2023_09_15");
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn document_round_trips_through_json() {
        let doc = CatalogDocument {
            images: StaticCatalog::fixture().scenes_ref().to_vec(),
        };
        let raw = serde_json::to_string(&doc).unwrap();
        assert!(raw.contains("\"cloudCoverage\":5"));
        let back = CatalogDocument::from_json(&raw).unwrap();
        assert_eq!(back, doc);
    }

    #[test]
    fn invalid_entries_are_dropped() {
        let raw = r#"{"images": [
            {"id":"ok","name":"ok","date":"2023-07-01","url":"a.png","cloudCoverage":10,
             "extent":[131.0,43.0,132.0,44.0],"sensor":"S2"},
            {"id":"cloudy","name":"c","date":"2023-07-01","url":"b.png","cloudCoverage":140,
             "extent":[131.0,43.0,132.0,44.0],"sensor":"S2"},
            {"id":"flipped","name":"f","date":"2023-07-01","url":"c.png","cloudCoverage":10,
             "extent":[132.0,43.0,131.0,44.0],"sensor":"S2"}
        ]}"#;
        let doc = CatalogDocument::from_json(raw).unwrap();
        assert_eq!(doc.images.len(), 1);
        assert_eq!(doc.images[0].id, "ok");
    }

    #[test]
    fn unreadable_entries_do_not_sink_the_document() {
        let raw = r#"{"images": [
            {"id":"ok","name":"ok","date":"2023-07-01","url":"a.png","cloudCoverage":10,
             "extent":[131.0,43.0,132.0,44.0],"sensor":"S2"},
            {"id":"huge","name":"h","date":"2023-07-01","url":"b.png","cloudCoverage":300,
             "extent":[131.0,43.0,132.0,44.0],"sensor":"S2"},
            {"id":"negative","name":"n","date":"2023-07-01","url":"c.png","cloudCoverage":-5,
             "extent":[131.0,43.0,132.0,44.0],"sensor":"S2"},
            {"id":"fraction","name":"f","date":"2023-07-01","url":"d.png","cloudCoverage":12.5,
             "extent":[131.0,43.0,132.0,44.0],"sensor":"S2"},
            {"id":"nosensor","name":"s","date":"2023-07-01","url":"e.png","cloudCoverage":10,
             "extent":[131.0,43.0,132.0,44.0]},
            "not an object"
        ]}"#;
        let doc = CatalogDocument::from_json(raw).unwrap();
        let ids: Vec<&str> = doc.images.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["ok"]);

        let fetched = FetchedCatalog::from_response(200, Ok(raw.to_string()));
        assert!(fetched.error().is_none());
        let all = SearchQuery::parse("2023-01-01", "2023-12-31", None).unwrap();
        assert_eq!(fetched.search(&all).len(), 1);
    }

    #[test]
    fn images_must_be_a_list() {
        assert!(matches!(
            CatalogDocument::from_json(r#"{"images": {"id": "x"}}"#),
            Err(CatalogError::Corrupt(_))
        ));
    }

    #[test]
    fn missing_images_key_is_an_empty_catalog() {
        let doc = CatalogDocument::from_json("{}").unwrap();
        assert!(doc.images.is_empty());
    }

    #[test]
    fn fetched_catalog_searches_like_static() {
        let raw = serde_json::to_string(&CatalogDocument {
            images: StaticCatalog::fixture().scenes_ref().to_vec(),
        })
        .unwrap();
        let fetched = FetchedCatalog::from_response(200, Ok(raw));
        assert!(fetched.error().is_none());
        assert_eq!(fetched.search(&summer()), StaticCatalog::fixture().search(&summer()));
    }

    #[test]
    fn fetch_failures_resolve_to_empty_results() {
        let not_found = FetchedCatalog::from_response(404, Ok("nope".into()));
        assert_eq!(not_found.error(), Some(&CatalogError::Http(404)));
        assert!(not_found.search(&summer()).is_empty());

        let garbage = FetchedCatalog::from_response(200, Ok("{not json".into()));
        assert!(matches!(garbage.error(), Some(CatalogError::Corrupt(_))));
        assert!(garbage.search(&summer()).is_empty());

        let network = FetchedCatalog::unavailable(CatalogError::Io("offline".into()));
        assert!(network.search(&summer()).is_empty());
    }
}
