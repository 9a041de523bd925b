use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tourbook_core::catalog::Catalog;
use tourbook_core::domain::booking::LooseInteger;
use tourbook_core::domain::preferences::Preferences;
use tourbook_core::domain::tour::{Tour, TourId};
use tourbook_db::{ChatSessionRepository, RepositoryError};

use crate::conversation::{canonical_category, canonical_country};
use crate::features::{compare_tours, tour_details, FeatureError};
use crate::llm::ToolDefinition;
use crate::search::search_tours;

pub const SEARCH_TOURS: &str = "search_tours";
pub const GET_TOUR_DETAILS: &str = "get_tour_details";
pub const COMPARE_TOURS: &str = "compare_tours";
pub const SAVE_USER_PREFERENCES: &str = "save_user_preferences";
pub const GET_USER_HISTORY: &str = "get_user_history";

const DEFAULT_HISTORY_LIMIT: u32 = 10;
const MAX_HISTORY_LIMIT: u32 = 50;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool `{0}`")]
    UnknownTool(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("tour {0} not found")]
    TourNotFound(String),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error("session store failed: {0}")]
    Repository(#[from] RepositoryError),
}

impl ToolError {
    /// Errors the model can act on are returned to it as a tool result; the rest
    /// abort the completion loop.
    pub fn is_reportable(&self) -> bool {
        !matches!(self, Self::Repository(_))
    }
}

/// Per-request state handed to every tool call.
#[derive(Clone, Debug)]
pub struct ToolContext {
    pub session_id: String,
    /// Stored session preferences merged with the ones in the current message.
    pub preferences: Preferences,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ToolOutput {
    pub payload: Value,
    /// Tours this call surfaced to the traveller.
    pub tours: Vec<Tour>,
    /// Set when `tours` are default picks rather than matches.
    pub fallback: bool,
}

impl ToolOutput {
    fn payload(payload: Value) -> Self {
        Self { payload, tours: Vec::new(), fallback: false }
    }

    fn surfaced(payload: Value, tours: Vec<Tour>) -> Self {
        Self { payload, tours, fallback: false }
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn definition(&self) -> ToolDefinition;
    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolOutput, ToolError>;
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    /// Registry with the five travel tools wired to the catalog and session store.
    pub fn travel(catalog: Catalog, sessions: Arc<dyn ChatSessionRepository>) -> Self {
        let mut registry = Self::default();
        registry.register(SearchToursTool { catalog: catalog.clone() });
        registry.register(TourDetailsTool { catalog: catalog.clone() });
        registry.register(CompareToursTool { catalog });
        registry.register(SavePreferencesTool { sessions: Arc::clone(&sessions) });
        registry.register(UserHistoryTool { sessions });
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let name = tool.name();
        if self.tools.insert(name.to_string(), Box::new(tool)).is_none() {
            self.order.push(name);
        }
    }

    /// Definitions in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order.iter().filter_map(|name| self.tools.get(*name)).map(|tool| tool.definition()).collect()
    }

    pub async fn execute(
        &self,
        name: &str,
        input: Value,
        context: &ToolContext,
    ) -> Result<ToolOutput, ToolError> {
        let tool = self.tools.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_owned()))?;
        tool.execute(input, context).await
    }

}

fn parse_args<T: for<'de> Deserialize<'de>>(input: Value) -> Result<T, ToolError> {
    // Models send `null` or nothing at all for argument-less calls.
    let input = if input.is_null() { json!({}) } else { input };
    serde_json::from_value(input).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

#[derive(Debug, Default, Deserialize)]
struct PreferenceArgs {
    country: Option<String>,
    category: Option<String>,
    budget: Option<LooseInteger>,
}

impl PreferenceArgs {
    fn into_preferences(self) -> Preferences {
        let non_blank = |value: Option<String>| value.filter(|value| !value.trim().is_empty());
        Preferences {
            country: non_blank(self.country).map(|country| canonical_country(&country)),
            category: non_blank(self.category).map(|category| canonical_category(&category)),
            budget: self.budget.and_then(|budget| budget.as_i64()).filter(|budget| *budget > 0),
        }
    }
}

fn preference_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "country": { "type": "string", "description": "Destination country, e.g. Japan" },
            "category": {
                "type": "string",
                "description": "Tour style: Adventure, Cultural, Wildlife, Beach & Culture, Nature & Cruise"
            },
            "budget": { "type": "number", "description": "Maximum price per person" }
        }
    })
}

fn resolve_tour<'a>(catalog: &'a Catalog, raw: &LooseInteger) -> Result<&'a Tour, ToolError> {
    raw.as_i64()
        .and_then(|id| u32::try_from(id).ok())
        .and_then(|id| catalog.find(TourId(id)))
        .ok_or_else(|| ToolError::TourNotFound(describe_id(raw)))
}

fn describe_id(raw: &LooseInteger) -> String {
    match raw {
        LooseInteger::Number(number) => number.to_string(),
        LooseInteger::Text(text) => text.clone(),
    }
}

struct SearchToursTool {
    catalog: Catalog,
}

#[async_trait]
impl Tool for SearchToursTool {
    fn name(&self) -> &'static str {
        SEARCH_TOURS
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            SEARCH_TOURS,
            "Search the tour catalog by country, category and maximum budget.",
            preference_schema(),
        )
    }

    async fn execute(&self, input: Value, _context: &ToolContext) -> Result<ToolOutput, ToolError> {
        let preferences = parse_args::<PreferenceArgs>(input)?.into_preferences();
        let outcome = search_tours(self.catalog.tours(), &preferences);

        Ok(ToolOutput {
            payload: json!({
                "tours": outcome.tours,
                "total": outcome.tours.len(),
                "fallback": outcome.fallback,
            }),
            tours: outcome.tours,
            fallback: outcome.fallback,
        })
    }
}

#[derive(Deserialize)]
struct TourDetailsArgs {
    tour_id: LooseInteger,
}

struct TourDetailsTool {
    catalog: Catalog,
}

#[async_trait]
impl Tool for TourDetailsTool {
    fn name(&self) -> &'static str {
        GET_TOUR_DETAILS
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            GET_TOUR_DETAILS,
            "Full details for one tour, with notes tailored to the traveller.",
            json!({
                "type": "object",
                "properties": { "tour_id": { "type": "integer" } },
                "required": ["tour_id"]
            }),
        )
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolOutput, ToolError> {
        let args: TourDetailsArgs = parse_args(input)?;
        let tour = resolve_tour(&self.catalog, &args.tour_id)?;
        let details = tour_details(tour, &context.preferences);

        Ok(ToolOutput::surfaced(json!({ "tour": details }), vec![tour.clone()]))
    }
}

#[derive(Deserialize)]
struct CompareToursArgs {
    tour_ids: Vec<LooseInteger>,
}

struct CompareToursTool {
    catalog: Catalog,
}

#[async_trait]
impl Tool for CompareToursTool {
    fn name(&self) -> &'static str {
        COMPARE_TOURS
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            COMPARE_TOURS,
            "Compare two or more tours on price, duration, category and rating.",
            json!({
                "type": "object",
                "properties": {
                    "tour_ids": { "type": "array", "items": { "type": "integer" }, "minItems": 2 }
                },
                "required": ["tour_ids"]
            }),
        )
    }

    async fn execute(&self, input: Value, _context: &ToolContext) -> Result<ToolOutput, ToolError> {
        let args: CompareToursArgs = parse_args(input)?;
        let tours = args
            .tour_ids
            .iter()
            .map(|raw| resolve_tour(&self.catalog, raw).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        let comparison = compare_tours(&tours)?;

        Ok(ToolOutput::surfaced(json!({ "comparison": comparison }), tours))
    }
}

struct SavePreferencesTool {
    sessions: Arc<dyn ChatSessionRepository>,
}

#[async_trait]
impl Tool for SavePreferencesTool {
    fn name(&self) -> &'static str {
        SAVE_USER_PREFERENCES
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            SAVE_USER_PREFERENCES,
            "Remember the traveller's destination, style or budget for later messages.",
            preference_schema(),
        )
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolOutput, ToolError> {
        let preferences = parse_args::<PreferenceArgs>(input)?.into_preferences();
        let merged = self.sessions.save_preferences(&context.session_id, &preferences).await?;

        Ok(ToolOutput::payload(json!({ "saved": true, "preferences": merged })))
    }
}

#[derive(Default, Deserialize)]
struct HistoryArgs {
    limit: Option<u32>,
}

struct UserHistoryTool {
    sessions: Arc<dyn ChatSessionRepository>,
}

#[async_trait]
impl Tool for UserHistoryTool {
    fn name(&self) -> &'static str {
        GET_USER_HISTORY
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::function(
            GET_USER_HISTORY,
            "Earlier messages and saved preferences for this conversation.",
            json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "minimum": 1, "maximum": MAX_HISTORY_LIMIT }
                }
            }),
        )
    }

    async fn execute(&self, input: Value, context: &ToolContext) -> Result<ToolOutput, ToolError> {
        let args: HistoryArgs = parse_args(input)?;
        let limit = args.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, MAX_HISTORY_LIMIT);

        let history = self.sessions.history(&context.session_id, limit).await?;
        let preferences = self
            .sessions
            .load(&context.session_id)
            .await?
            .map(|session| session.preferences)
            .unwrap_or_default();

        Ok(ToolOutput::payload(json!({ "history": history, "preferences": preferences })))
    }
}
