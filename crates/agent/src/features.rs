use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use tourbook_core::domain::preferences::Preferences;
use tourbook_core::domain::tour::{Tour, TourId};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FeatureError {
    #[error("at least two tours are needed for a comparison")]
    NotEnoughTours,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedNotes {
    pub why_suitable: Vec<String>,
    pub considerations: Vec<String>,
    pub tips: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TourDetails {
    #[serde(flatten)]
    pub tour: Tour,
    pub personalized: PersonalizedNotes,
}

/// Full tour record with notes tailored to the traveller's preferences.
pub fn tour_details(tour: &Tour, preferences: &Preferences) -> TourDetails {
    let mut notes = PersonalizedNotes::default();

    if let Some(budget) = preferences.budget {
        if tour.price <= budget {
            notes
                .why_suitable
                .push(format!("Fits your budget (${} of ${budget})", tour.price));
        } else {
            notes
                .considerations
                .push(format!("Costs ${} more than your budget", tour.price - budget));
        }
    }

    if let Some(category) = &preferences.category {
        if tour.category.to_lowercase() == category.to_lowercase() {
            notes.why_suitable.push(format!("Matches your preferred style ({})", tour.category));
        }
    }

    if let Some(country) = &preferences.country {
        if tour.location.to_lowercase().contains(&country.to_lowercase()) {
            notes.why_suitable.push(format!("Takes place where you want to go: {}", tour.location));
        }
    }

    if tour.duration >= 10 {
        notes.tips.push("Long itinerary, so pack for the full trip".to_owned());
    }
    if tour.is_challenging() {
        notes.tips.push("Good physical fitness is required".to_owned());
    }
    if tour.max_group_size > 0 && tour.max_group_size <= 8 {
        notes.tips.push("Small group for a more personal experience".to_owned());
    }

    let mut tour = tour.clone();
    if tour.full_description.trim().is_empty() {
        tour.full_description = tour.description.clone();
    }

    TourDetails { tour, personalized: notes }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedTour {
    pub id: TourId,
    pub title: String,
    pub country: String,
    pub price: i64,
    pub duration: u32,
    pub category: String,
    pub rating: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PriceSpread {
    pub min: i64,
    pub max: i64,
    pub difference: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DurationSpan {
    pub min: u32,
    pub max: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Differences {
    pub price: PriceSpread,
    pub duration: DurationSpan,
    pub categories: Vec<String>,
    pub countries: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PickKind {
    Cheapest,
    Longest,
    HighestRated,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ComparisonPick {
    #[serde(rename = "type")]
    pub kind: PickKind,
    pub tour: String,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comparison {
    pub tours: Vec<ComparedTour>,
    pub differences: Differences,
    pub recommendations: Vec<ComparisonPick>,
}

pub fn compare_tours(tours: &[Tour]) -> Result<Comparison, FeatureError> {
    let (Some(first), true) = (tours.first(), tours.len() >= 2) else {
        return Err(FeatureError::NotEnoughTours);
    };

    let mut cheapest = first;
    let mut longest = first;
    let mut highest_rated = first;
    for tour in &tours[1..] {
        if tour.price < cheapest.price {
            cheapest = tour;
        }
        if tour.duration > longest.duration {
            longest = tour;
        }
        if tour.rating > highest_rated.rating {
            highest_rated = tour;
        }
    }

    let min_price = tours.iter().map(|tour| tour.price).min().unwrap_or(first.price);
    let max_price = tours.iter().map(|tour| tour.price).max().unwrap_or(first.price);
    let min_duration = tours.iter().map(|tour| tour.duration).min().unwrap_or(first.duration);
    let max_duration = tours.iter().map(|tour| tour.duration).max().unwrap_or(first.duration);

    let mut recommendations = vec![ComparisonPick {
        kind: PickKind::Cheapest,
        tour: cheapest.title.clone(),
        reason: format!("Most affordable option: ${}", cheapest.price),
    }];
    if longest.duration != cheapest.duration {
        recommendations.push(ComparisonPick {
            kind: PickKind::Longest,
            tour: longest.title.clone(),
            reason: format!("Longest itinerary: {} days", longest.duration),
        });
    }
    if highest_rated.rating > 0.0 {
        recommendations.push(ComparisonPick {
            kind: PickKind::HighestRated,
            tour: highest_rated.title.clone(),
            reason: format!("Best rated: {}/5", highest_rated.rating),
        });
    }

    Ok(Comparison {
        tours: tours
            .iter()
            .map(|tour| ComparedTour {
                id: tour.id,
                title: tour.title.clone(),
                country: tour.location.clone(),
                price: tour.price,
                duration: tour.duration,
                category: tour.category.clone(),
                rating: tour.rating,
            })
            .collect(),
        differences: Differences {
            price: PriceSpread { min: min_price, max: max_price, difference: max_price - min_price },
            duration: DurationSpan { min: min_duration, max: max_duration },
            categories: distinct(tours.iter().map(|tour| tour.category.as_str())),
            countries: distinct(tours.iter().map(|tour| tour.location.as_str())),
        },
        recommendations,
    })
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values.filter(|value| seen.insert(*value)).map(str::to_owned).collect()
}
