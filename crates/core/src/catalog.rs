use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::CatalogConfig;
use crate::domain::tour::{Tour, TourId};

const BUILTIN_TOURS: &str = include_str!("../../../data/tours.json");

/// Label used by list filters to mean "no filter".
pub const ALL_FILTER: &str = "All";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse tour catalog: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tour id {0} appears more than once in the catalog")]
    DuplicateTourId(TourId),
}

/// Immutable tour list shared by every request.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    tours: Arc<Vec<Tour>>,
}

impl Catalog {
    pub fn new(tours: Vec<Tour>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::with_capacity(tours.len());
        for tour in &tours {
            if !seen.insert(tour.id) {
                return Err(CatalogError::DuplicateTourId(tour.id));
            }
        }
        Ok(Self { tours: Arc::new(tours) })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_TOURS)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        Self::new(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_json(&raw)
    }

    pub fn load(config: &CatalogConfig) -> Result<Self, CatalogError> {
        match &config.path {
            Some(path) => Self::from_path(path),
            None => Self::builtin(),
        }
    }

    pub fn tours(&self) -> &[Tour] {
        &self.tours
    }

    pub fn len(&self) -> usize {
        self.tours.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }

    pub fn find(&self, id: TourId) -> Option<&Tour> {
        self.tours.iter().find(|tour| tour.id == id)
    }

    /// Looks a tour up from a raw path segment; non-numeric input finds nothing.
    pub fn find_by_raw_id(&self, raw: &str) -> Option<&Tour> {
        raw.trim().parse::<u32>().ok().and_then(|id| self.find(TourId(id)))
    }

    pub fn query(&self, query: &TourQuery) -> Vec<Tour> {
        self.tours.iter().filter(|tour| query.matches(tour)).cloned().collect()
    }

    pub fn metadata(&self) -> CatalogMetadata {
        CatalogMetadata {
            categories: with_all(self.tours.iter().map(|tour| tour.category.as_str())),
            locations: with_all(self.tours.iter().map(|tour| tour.location.as_str())),
            price_ranges: price_ranges(),
            durations: durations(),
        }
    }
}

fn with_all<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = vec![ALL_FILTER.to_owned()];
    for value in values {
        if seen.insert(value) {
            out.push(value.to_owned());
        }
    }
    out
}

/// List filters from the `/api/tours` query string. Every field is optional and
/// numeric bounds that fail to parse are ignored rather than rejected.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TourQuery {
    pub category: Option<String>,
    pub location: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub min_duration: Option<String>,
    pub max_duration: Option<String>,
    pub search: Option<String>,
}

impl TourQuery {
    pub fn matches(&self, tour: &Tour) -> bool {
        if let Some(category) = label_filter(&self.category) {
            if !tour.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }

        if let Some(location) = label_filter(&self.location) {
            if !tour.location.eq_ignore_ascii_case(location) {
                return false;
            }
        }

        let price = tour.price as f64;
        if numeric_bound(&self.min_price).is_some_and(|min| price < min) {
            return false;
        }
        if numeric_bound(&self.max_price).is_some_and(|max| price > max) {
            return false;
        }

        let duration = f64::from(tour.duration);
        if numeric_bound(&self.min_duration).is_some_and(|min| duration < min) {
            return false;
        }
        if numeric_bound(&self.max_duration).is_some_and(|max| duration > max) {
            return false;
        }

        if let Some(term) = self.search.as_deref().filter(|term| !term.is_empty()) {
            let term = term.to_lowercase();
            let hit = [&tour.title, &tour.description, &tour.location]
                .iter()
                .any(|field| field.to_lowercase().contains(&term));
            if !hit {
                return false;
            }
        }

        true
    }
}

fn label_filter(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|value| !value.is_empty() && *value != ALL_FILTER)
}

fn numeric_bound(value: &Option<String>) -> Option<f64> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RangeBand {
    pub label: &'static str,
    pub min: u32,
    /// `None` for open-ended bands.
    pub max: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMetadata {
    pub categories: Vec<String>,
    pub locations: Vec<String>,
    pub price_ranges: Vec<RangeBand>,
    pub durations: Vec<RangeBand>,
}

fn price_ranges() -> Vec<RangeBand> {
    vec![
        RangeBand { label: "All Prices", min: 0, max: None },
        RangeBand { label: "Under $2000", min: 0, max: Some(2000) },
        RangeBand { label: "$2000 - $3000", min: 2000, max: Some(3000) },
        RangeBand { label: "$3000 - $4000", min: 3000, max: Some(4000) },
        RangeBand { label: "Over $4000", min: 4000, max: None },
    ]
}

fn durations() -> Vec<RangeBand> {
    vec![
        RangeBand { label: "All Durations", min: 0, max: None },
        RangeBand { label: "5-7 days", min: 5, max: Some(7) },
        RangeBand { label: "8-10 days", min: 8, max: Some(10) },
        RangeBand { label: "11-14 days", min: 11, max: Some(14) },
    ]
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::{Catalog, CatalogError, TourQuery};
    use crate::config::CatalogConfig;
    use crate::domain::tour::TourId;

    fn builtin() -> Catalog {
        Catalog::builtin().expect("built-in catalog should parse")
    }

    fn ids(tours: &[crate::domain::tour::Tour]) -> Vec<u32> {
        tours.iter().map(|tour| tour.id.0).collect()
    }

    #[test]
    fn builtin_catalog_has_ten_tours() {
        let catalog = builtin();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.find(TourId(4)).map(|tour| tour.title.as_str()), Some("Japan Cherry Blossom Tour"));
    }

    #[test]
    fn raw_id_lookup_rejects_non_numeric_input() {
        let catalog = builtin();
        assert!(catalog.find_by_raw_id("abc").is_none());
        assert!(catalog.find_by_raw_id("999").is_none());
        assert!(catalog.find_by_raw_id("6").is_some());
    }

    #[test]
    fn empty_query_returns_everything_in_order() {
        let catalog = builtin();
        assert_eq!(ids(&catalog.query(&TourQuery::default())), (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn category_filter_is_case_insensitive_and_all_means_no_filter() {
        let catalog = builtin();
        let adventure = TourQuery { category: Some("adventure".to_owned()), ..TourQuery::default() };
        assert_eq!(ids(&catalog.query(&adventure)), vec![1, 3, 6, 8]);

        let all = TourQuery { category: Some("All".to_owned()), ..TourQuery::default() };
        assert_eq!(catalog.query(&all).len(), 10);
    }

    #[test]
    fn unknown_category_yields_empty_list() {
        let catalog = builtin();
        let query = TourQuery { category: Some("Space Tourism".to_owned()), ..TourQuery::default() };
        assert!(catalog.query(&query).is_empty());
    }

    #[test]
    fn numeric_bounds_apply_and_garbage_is_ignored() {
        let catalog = builtin();
        let query = TourQuery {
            min_price: Some("3000".to_owned()),
            max_price: Some("4000".to_owned()),
            min_duration: Some("not-a-number".to_owned()),
            ..TourQuery::default()
        };
        assert_eq!(ids(&catalog.query(&query)), vec![3, 5, 7, 10]);

        let short = TourQuery { max_duration: Some("7".to_owned()), ..TourQuery::default() };
        assert_eq!(ids(&catalog.query(&short)), vec![1, 3]);
    }

    #[test]
    fn search_matches_title_description_or_location() {
        let catalog = builtin();
        let query = TourQuery { search: Some("INDONESIA".to_owned()), ..TourQuery::default() };
        assert_eq!(ids(&catalog.query(&query)), vec![2]);
    }

    #[test]
    fn empty_catalog_answers_queries_with_nothing() {
        let catalog = Catalog::empty();
        assert!(catalog.query(&TourQuery::default()).is_empty());
        assert_eq!(catalog.metadata().categories, vec!["All".to_owned()]);
    }

    #[test]
    fn metadata_lists_distinct_values_after_all() {
        let metadata = builtin().metadata();
        assert_eq!(
            metadata.categories,
            vec!["All", "Adventure", "Cultural", "Wildlife", "Beach & Culture", "Nature & Cruise"]
        );
        assert_eq!(metadata.locations.len(), 11);
        assert_eq!(metadata.price_ranges.first().and_then(|band| band.max), None);

        let json = serde_json::to_value(&metadata).expect("metadata should serialize");
        assert!(json.get("priceRanges").is_some());
        assert!(json["durations"][0]["max"].is_null());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let raw = r#"[
            {"id": 1, "title": "A", "description": "", "price": 1, "duration": 1,
             "location": "X", "category": "Y", "maxGroupSize": 1},
            {"id": 1, "title": "B", "description": "", "price": 1, "duration": 1,
             "location": "X", "category": "Y", "maxGroupSize": 1}
        ]"#;
        assert!(matches!(Catalog::from_json(raw), Err(CatalogError::DuplicateTourId(TourId(1)))));
    }

    #[test]
    fn configured_path_replaces_builtin_list() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("tours.json");
        fs::write(&path, "[]").expect("write catalog");

        let catalog = Catalog::load(&CatalogConfig { path: Some(path) }).expect("load catalog");
        assert!(catalog.is_empty());
    }

    #[test]
    fn missing_catalog_file_is_reported() {
        let config = CatalogConfig { path: Some("/nonexistent/tours.json".into()) };
        assert!(matches!(Catalog::load(&config), Err(CatalogError::ReadFile { .. })));
    }
}
