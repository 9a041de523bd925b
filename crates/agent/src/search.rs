use tourbook_core::domain::preferences::Preferences;
use tourbook_core::domain::tour::Tour;

/// Tours offered when nothing matches every preference.
pub const FALLBACK_COUNT: usize = 3;
/// Upper bound on tours returned by one search.
pub const MAX_RESULTS: usize = 5;

#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    pub tours: Vec<Tour>,
    /// True when no tour matched and the leading catalog entries were used instead.
    pub fallback: bool,
}

/// Strict AND over country, category, and budget. Total: any input yields a
/// result, and an empty catalog yields an empty list.
pub fn search_tours(tours: &[Tour], preferences: &Preferences) -> SearchOutcome {
    let matched: Vec<Tour> =
        tours.iter().filter(|tour| matches_preferences(tour, preferences)).cloned().collect();

    if matched.is_empty() {
        return SearchOutcome {
            tours: tours.iter().take(FALLBACK_COUNT).cloned().collect(),
            fallback: !tours.is_empty(),
        };
    }

    SearchOutcome { tours: matched.into_iter().take(MAX_RESULTS).collect(), fallback: false }
}

pub fn matches_preferences(tour: &Tour, preferences: &Preferences) -> bool {
    if let Some(country) = &preferences.country {
        if !tour.location.to_lowercase().contains(&country.to_lowercase()) {
            return false;
        }
    }

    if let Some(category) = &preferences.category {
        if tour.category.to_lowercase() != category.to_lowercase() {
            return false;
        }
    }

    if let Some(budget) = preferences.budget {
        if tour.price > budget {
            return false;
        }
    }

    true
}
