use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::CatalogError;
use crate::scene::Scene;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const MAX_CLOUD_COVERAGE_PERCENT: u8 = 100;

/// Inclusive date range plus an inclusive cloud-coverage ceiling.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub max_cloud_coverage_percent: u8,
}

impl SearchQuery {
    pub fn new(date_from: NaiveDate, date_to: NaiveDate, max_cloud_coverage_percent: u8) -> Self {
        Self {
            date_from,
            date_to,
            max_cloud_coverage_percent: max_cloud_coverage_percent.min(MAX_CLOUD_COVERAGE_PERCENT),
        }
    }

    /// Builds a query from form input.
    ///
    /// Both dates are required; a blank one is an input-validation error the
    /// caller shows to the user. A missing cloud ceiling means 100%.
    pub fn parse(
        date_from: &str,
        date_to: &str,
        max_cloud_coverage_percent: Option<u8>,
    ) -> Result<Self, CatalogError> {
        let (from, to) = (date_from.trim(), date_to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(CatalogError::MissingDateRange);
        }
        Ok(Self::new(
            parse_date(from)?,
            parse_date(to)?,
            max_cloud_coverage_percent.unwrap_or(MAX_CLOUD_COVERAGE_PERCENT),
        ))
    }

    pub fn matches(&self, scene: &Scene) -> bool {
        scene.date >= self.date_from
            && scene.date <= self.date_to
            && scene.cloud_coverage_percent <= self.max_cloud_coverage_percent
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, CatalogError> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).map_err(|_| CatalogError::InvalidDate(s.to_string()))
}

/// Applies `query` to `scenes`, newest first.
///
/// Scenes sharing a date keep their catalog order.
pub fn filter_scenes<'a>(scenes: impl IntoIterator<Item = &'a Scene>, query: &SearchQuery) -> Vec<Scene> {
    let mut out: Vec<Scene> = scenes
        .into_iter()
        .filter(|s| query.matches(s))
        .cloned()
        .collect();
    out.sort_by(|a, b| b.date.cmp(&a.date));
    out
}

/// The last result list shown to the user plus which entries sit in the
/// comparison slots, for list highlighting.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SearchResults {
    scenes: Vec<Scene>,
    primary_id: Option<String>,
    secondary_id: Option<String>,
}

impl SearchResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace(&mut self, scenes: Vec<Scene>) {
        self.scenes = scenes;
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    pub fn mark_primary(&mut self, id: Option<&str>) {
        self.primary_id = id.map(str::to_string);
    }

    pub fn mark_secondary(&mut self, id: Option<&str>) {
        self.secondary_id = id.map(str::to_string);
    }

    pub fn is_primary(&self, id: &str) -> bool {
        self.primary_id.as_deref() == Some(id)
    }

    pub fn is_secondary(&self, id: &str) -> bool {
        self.secondary_id.as_deref() == Some(id)
    }
}
