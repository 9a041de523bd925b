use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;
use tourbook_core::catalog::{Catalog, ALL_FILTER};
use tourbook_core::domain::preferences::Preferences;
use tourbook_core::domain::tour::{Tour, TourId};

use crate::features::Comparison;
use crate::search::SearchOutcome;

const NO_RESULTS: &str = "chat/no_results.txt";
const SINGLE: &str = "chat/single.txt";
const MULTIPLE: &str = "chat/multiple.txt";
const COMPARISON: &str = "chat/comparison.txt";
const SYSTEM_PROMPT: &str = "chat/system_prompt.txt";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// A tour surfaced to the traveller with a short explanation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub id: TourId,
    pub title: String,
    pub reason: String,
}

pub fn recommendations_for(
    tours: &[Tour],
    preferences: &Preferences,
    fallback: bool,
) -> Vec<Recommendation> {
    let reason = recommendation_reason(preferences, fallback);
    tours
        .iter()
        .map(|tour| Recommendation { id: tour.id, title: tour.title.clone(), reason: reason.clone() })
        .collect()
}

fn recommendation_reason(preferences: &Preferences, fallback: bool) -> String {
    if fallback {
        return "Popular pick; nothing matched all of your criteria".to_owned();
    }

    let criteria: Vec<&str> = [
        preferences.country.as_ref().map(|_| "country"),
        preferences.category.as_ref().map(|_| "category"),
        preferences.budget.map(|_| "budget"),
    ]
    .into_iter()
    .flatten()
    .collect();

    if criteria.is_empty() {
        "Popular choice in our catalog".to_owned()
    } else {
        format!("Matches your criteria: {}", criteria.join(", "))
    }
}

/// Chat reply templates, embedded at build time.
pub struct ReplyRenderer {
    tera: Tera,
}

impl ReplyRenderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (NO_RESULTS, include_str!("../../../templates/chat/no_results.txt")),
            (SINGLE, include_str!("../../../templates/chat/single.txt")),
            (MULTIPLE, include_str!("../../../templates/chat/multiple.txt")),
            (COMPARISON, include_str!("../../../templates/chat/comparison.txt")),
            (SYSTEM_PROMPT, include_str!("../../../templates/chat/system_prompt.txt")),
        ])?;
        Ok(Self { tera })
    }

    pub fn search_reply(&self, outcome: &SearchOutcome) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("fallback", &outcome.fallback);

        let template = match outcome.tours.as_slice() {
            [] => NO_RESULTS,
            [tour] => {
                context.insert("tour", tour);
                SINGLE
            }
            tours => {
                context.insert("tours", tours);
                context.insert("count", &tours.len());
                MULTIPLE
            }
        };

        self.render(template, &context)
    }

    pub fn comparison_reply(&self, comparison: &Comparison) -> Result<String, RenderError> {
        let mut context = Context::new();
        context.insert("comparison", comparison);
        self.render(COMPARISON, &context)
    }

    pub fn system_prompt(
        &self,
        catalog: &Catalog,
        preferences: &Preferences,
    ) -> Result<String, RenderError> {
        let metadata = catalog.metadata();
        let without_all = |values: Vec<String>| -> Vec<String> {
            values.into_iter().filter(|value| value != ALL_FILTER).collect()
        };

        let mut context = Context::new();
        context.insert("categories", &without_all(metadata.categories));
        context.insert("locations", &without_all(metadata.locations));
        context.insert("known_preferences", &describe_preferences(preferences));
        self.render(SYSTEM_PROMPT, &context)
    }

    fn render(&self, template: &str, context: &Context) -> Result<String, RenderError> {
        Ok(self.tera.render(template, context)?.trim().to_owned())
    }
}

fn describe_preferences(preferences: &Preferences) -> String {
    let mut parts = Vec::new();
    if let Some(country) = &preferences.country {
        parts.push(format!("country {country}"));
    }
    if let Some(category) = &preferences.category {
        parts.push(format!("category {category}"));
    }
    if let Some(budget) = preferences.budget {
        parts.push(format!("budget up to ${budget}"));
    }
    parts.join(", ")
}
