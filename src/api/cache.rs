//! Cache API endpoints.

use axum::extract::State;

use super::{success, ApiResult};
use crate::AppState;

/// POST /api/cache/clear - Drop the cached slide list and selection.
pub async fn clear_cache(State(state): State<AppState>) -> ApiResult<()> {
    state.library.clear_cache().await;
    success(())
}
