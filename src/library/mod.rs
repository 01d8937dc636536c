//! Session-scoped slide library.
//!
//! Owns the drive, the document layout and the [`SlideCache`], and runs every
//! user command through them. Mutating commands are serialized so only one
//! read-modify-write cycle is in flight at a time, and each one empties the
//! list cache when it succeeds.

mod protocol;
mod tag_index;

pub use protocol::*;
pub use tag_index::*;

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::cache::SlideCache;
use crate::errors::AppError;
use crate::models::{
    CreateSlideRequest, InsertFormatting, ReconcileReport, SlideInsertion, SlideListDocument,
    SlideRecord, TagSuggestion, UpdateSlideRequest,
};
use crate::search;
use crate::store::{RemoteStore, StoreLayout};

/// Upper bound on tags per slide, matching the tag widget.
pub const MAX_TAGS_PER_SLIDE: usize = 10;

pub struct SlideLibrary<S> {
    store: S,
    layout: StoreLayout,
    cache: SlideCache,
    write_lock: Mutex<()>,
    sort_tags: bool,
}

impl<S: RemoteStore> SlideLibrary<S> {
    pub fn new(store: S, layout: StoreLayout, sort_tags: bool) -> Self {
        Self {
            store,
            layout,
            cache: SlideCache::new(),
            write_lock: Mutex::new(()),
            sort_tags,
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Make sure the app folder and both documents exist.
    pub async fn initialize(&self) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let created = initialize_store(&self.store, &self.layout).await?;
        if created {
            self.cache.invalidate().await;
        }
        Ok(created)
    }

    pub async fn list(&self) -> Result<Arc<SlideListDocument>, AppError> {
        self.cache.get(&self.store, &self.layout).await
    }

    pub async fn get_slide(&self, id: &str) -> Result<SlideRecord, AppError> {
        self.list()
            .await?
            .find(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Slide {} not found", id)))
    }

    /// Filter the cached list by title and tags. Absent filters match everything.
    pub async fn search(
        &self,
        title: Option<&str>,
        tags: &[String],
    ) -> Result<Vec<SlideRecord>, AppError> {
        let document = self.list().await?;
        let by_title = search::filter_by_title(&document.slides, title.unwrap_or(""));
        Ok(search::filter_by_tags(by_title, tags)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn add_slide(&self, request: CreateSlideRequest) -> Result<SlideRecord, AppError> {
        let title = validate_title(&request.title)?;
        let tags = normalize_tags(request.tags)?;
        if request.exported.slide.trim().is_empty() {
            return Err(AppError::Validation(
                "Exported slide content is required".to_string(),
            ));
        }

        let _guard = self.write_lock.lock().await;
        let new_slide = NewSlide {
            title,
            tags,
            exported: request.exported,
        };
        let result = add_slide(&self.store, &self.layout, new_slide, self.sort_tags).await;
        // The slide list may have changed even when the tag write failed
        self.cache.invalidate().await;
        result
    }

    /// Keep `id` as the slide being edited.
    pub async fn select(&self, id: &str) -> Result<SlideRecord, AppError> {
        self.cache.select(&self.store, &self.layout, id).await
    }

    pub async fn selected(&self) -> Option<SlideRecord> {
        self.cache.selected().await
    }

    pub async fn clear_selection(&self) {
        self.cache.clear_selected().await;
    }

    pub async fn edit_slide(
        &self,
        id: &str,
        request: UpdateSlideRequest,
    ) -> Result<SlideRecord, AppError> {
        let title = validate_title(&request.title)?;
        let tags = normalize_tags(request.tags)?;

        let _guard = self.write_lock.lock().await;
        let result = edit_slide(&self.store, &self.layout, id, title, tags, self.sort_tags).await;
        if !matches!(result, Err(AppError::NotFound(_))) {
            self.cache.invalidate().await;
        }
        if result.is_ok() {
            self.cache.clear_selected_if(id).await;
        }
        result
    }

    /// Edit the slide picked with [`select`](Self::select).
    pub async fn edit_selected(&self, request: UpdateSlideRequest) -> Result<SlideRecord, AppError> {
        let selected = self
            .cache
            .selected()
            .await
            .ok_or_else(|| AppError::NotFound("No slide selected for editing".to_string()))?;
        self.edit_slide(&selected.id, request).await
    }

    /// Delete a slide, removing it from the cached list first.
    ///
    /// If `slides.json` could not be rewritten the cached list gets the slide
    /// back. Once it has been rewritten the cache is emptied, even when the
    /// tag index update fails afterwards.
    pub async fn delete_slide(&self, id: &str) -> Result<SlideRecord, AppError> {
        let removal = self.cache.remove_locally(id).await;

        let _guard = self.write_lock.lock().await;
        let removed = match remove_slide_record(&self.store, &self.layout, id).await {
            Ok(removed) => removed,
            Err(e) => {
                tracing::warn!(
                    id,
                    error = %e,
                    cached = removal.record().is_some(),
                    "Delete failed, restoring cached slide"
                );
                self.cache.compensate(removal).await;
                return Err(e);
            }
        };

        self.cache.invalidate().await;
        self.cache.clear_selected_if(id).await;
        remove_slide_tags(&self.store, &self.layout, &removed).await?;

        tracing::info!(id, "Slide deleted");
        Ok(removed)
    }

    /// The payload the host needs to insert `id` after the current selection.
    pub async fn insert_payload(&self, id: &str) -> Result<SlideInsertion, AppError> {
        let record = self.get_slide(id).await?;
        Ok(SlideInsertion {
            source_id: record.id,
            slide: record.slide,
            formatting: InsertFormatting::KeepSourceFormatting,
        })
    }

    /// The raw tag index, duplicates included.
    pub async fn tag_index(&self) -> Result<Vec<String>, AppError> {
        Ok(read_tag_index(&self.store, &self.layout).await?.tags)
    }

    pub async fn tag_suggestions(&self) -> Result<Vec<TagSuggestion>, AppError> {
        Ok(suggestions(&self.tag_index().await?))
    }

    pub async fn reconcile_tags(&self) -> Result<ReconcileReport, AppError> {
        let _guard = self.write_lock.lock().await;
        reconcile_tag_index(&self.store, &self.layout).await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}

/// Trimmed, non-empty title.
pub fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Trim tags, drop empty ones and enforce [`MAX_TAGS_PER_SLIDE`].
pub fn normalize_tags(tags: Vec<String>) -> Result<Vec<String>, AppError> {
    let tags: Vec<String> = tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if tags.len() > MAX_TAGS_PER_SLIDE {
        return Err(AppError::Validation(format!(
            "At most {} tags per slide",
            MAX_TAGS_PER_SLIDE
        )));
    }
    Ok(tags)
}
