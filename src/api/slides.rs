//! Slide API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::{
    parse_tag_input, CreateSlideRequest, SlideInsertion, SlideRecord, UpdateSlideRequest,
};
use crate::AppState;

/// Filters for the slide list.
#[derive(Debug, Default, Deserialize)]
pub struct SlideQuery {
    /// Case-insensitive title substring.
    #[serde(default)]
    pub title: Option<String>,
    /// Comma-separated tags or a tag widget JSON array.
    #[serde(default)]
    pub tags: Option<String>,
}

/// GET /api/slides - List slides, optionally filtered by title and tags.
pub async fn list_slides(
    State(state): State<AppState>,
    Query(params): Query<SlideQuery>,
) -> ApiResult<Vec<SlideRecord>> {
    let tags = params
        .tags
        .as_deref()
        .map(parse_tag_input)
        .unwrap_or_default();

    let slides = state
        .library
        .search(params.title.as_deref(), &tags)
        .await?;
    success(slides)
}

/// GET /api/slides/:id - Get a single slide.
pub async fn get_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SlideRecord> {
    success(state.library.get_slide(&id).await?)
}

/// POST /api/slides - Save an exported slide.
pub async fn create_slide(
    State(state): State<AppState>,
    Json(request): Json<CreateSlideRequest>,
) -> ApiResult<SlideRecord> {
    success(state.library.add_slide(request).await?)
}

/// PUT /api/slides/:id - Edit title and tags.
pub async fn update_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateSlideRequest>,
) -> ApiResult<SlideRecord> {
    success(state.library.edit_slide(&id, request).await?)
}

/// DELETE /api/slides/:id - Delete a slide.
pub async fn delete_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SlideRecord> {
    success(state.library.delete_slide(&id).await?)
}

/// POST /api/slides/:id/select - Pick a slide for editing.
pub async fn select_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SlideRecord> {
    success(state.library.select(&id).await?)
}

/// GET /api/selection - The slide picked for editing, or null.
pub async fn get_selection(State(state): State<AppState>) -> ApiResult<Option<SlideRecord>> {
    success(state.library.selected().await)
}

/// PUT /api/selection - Edit the slide picked for editing, then forget it.
pub async fn update_selection(
    State(state): State<AppState>,
    Json(request): Json<UpdateSlideRequest>,
) -> ApiResult<SlideRecord> {
    success(state.library.edit_selected(request).await?)
}

/// DELETE /api/selection - Forget the slide picked for editing.
pub async fn clear_selection(State(state): State<AppState>) -> ApiResult<()> {
    state.library.clear_selection().await;
    success(())
}

/// GET /api/slides/:id/insertion - Payload for inserting a saved slide.
pub async fn insert_slide(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SlideInsertion> {
    success(state.library.insert_payload(&id).await?)
}
