//! Tag API endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::models::{ReconcileReport, TagSuggestion};
use crate::AppState;

/// GET /api/tags - The raw tag index, one entry per tag occurrence.
pub async fn list_tags(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    success(state.library.tag_index().await?)
}

/// GET /api/tags/suggestions - Distinct tags, most used first.
pub async fn tag_suggestions(State(state): State<AppState>) -> ApiResult<Vec<TagSuggestion>> {
    success(state.library.tag_suggestions().await?)
}

/// POST /api/tags/reconcile - Rebuild the tag index from the slide list.
pub async fn reconcile_tags(State(state): State<AppState>) -> ApiResult<ReconcileReport> {
    let report = state.library.reconcile_tags().await?;
    success(report)
}
