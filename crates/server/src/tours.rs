use axum::{
    extract::{Path, Query, State},
    Json,
};
use tourbook_core::catalog::{CatalogMetadata, TourQuery};
use tourbook_core::domain::tour::Tour;
use tourbook_core::errors::ApplicationError;

use crate::error::ApiError;
use crate::routes::AppState;

pub const TOUR_NOT_FOUND: &str = "Tour not found.";

pub async fn list_tours(
    State(state): State<AppState>,
    Query(query): Query<TourQuery>,
) -> Json<Vec<Tour>> {
    Json(state.catalog.query(&query))
}

pub async fn get_tour(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Tour>, ApiError> {
    state
        .catalog
        .find_by_raw_id(&raw_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApplicationError::NotFound(TOUR_NOT_FOUND.to_owned()).into())
}

pub async fn metadata(State(state): State<AppState>) -> Json<CatalogMetadata> {
    Json(state.catalog.metadata())
}
