//! Session cache for the slide list and the slide selected for editing.
//!
//! The list slot is either empty or holds the last document read from the
//! drive. Its async mutex is held across the fetch, so callers arriving while
//! the first read is in flight wait for it instead of issuing their own.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::{SlideListDocument, SlideRecord};
use crate::store::{read_json, RemoteStore, StoreLayout};

/// A record taken out of the cached list ahead of the remote delete.
#[derive(Debug, Clone)]
pub struct LocalRemoval {
    id: String,
    removed: Option<(usize, SlideRecord)>,
}

impl LocalRemoval {
    /// The removed record, if the list was cached and contained it.
    pub fn record(&self) -> Option<&SlideRecord> {
        self.removed.as_ref().map(|(_, record)| record)
    }
}

#[derive(Debug, Default)]
pub struct SlideCache {
    list: Mutex<Option<Arc<SlideListDocument>>>,
    selected: Mutex<Option<SlideRecord>>,
}

impl SlideCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached list, reading it from the drive when empty.
    ///
    /// A failed read leaves the cache empty.
    pub async fn get<S: RemoteStore>(
        &self,
        store: &S,
        layout: &StoreLayout,
    ) -> Result<Arc<SlideListDocument>, AppError> {
        let mut slot = self.list.lock().await;
        if let Some(document) = slot.as_ref() {
            tracing::debug!(slides = document.slides.len(), "Slide list cache hit");
            return Ok(Arc::clone(document));
        }

        tracing::debug!(path = %layout.slides_path, "Slide list cache miss, reading drive");
        let document: SlideListDocument = read_json(store, &layout.slides_path).await?;
        let document = Arc::new(document);
        *slot = Some(Arc::clone(&document));
        Ok(document)
    }

    #[cfg(test)]
    pub async fn is_populated(&self) -> bool {
        self.list.lock().await.is_some()
    }

    pub async fn invalidate(&self) {
        if self.list.lock().await.take().is_some() {
            tracing::debug!("Slide list cache invalidated");
        }
    }

    /// Drop `id` from the cached list without touching the drive.
    pub async fn remove_locally(&self, id: &str) -> LocalRemoval {
        let mut slot = self.list.lock().await;
        let removed = slot.as_mut().and_then(|document| {
            let position = document.position(id)?;
            let record = Arc::make_mut(document).slides.remove(position);
            Some((position, record))
        });

        LocalRemoval {
            id: id.to_string(),
            removed,
        }
    }

    /// Undo a [`LocalRemoval`] after the remote delete failed.
    ///
    /// Skipped when the cache has been emptied meanwhile or the record is
    /// already back in the list.
    pub async fn compensate(&self, removal: LocalRemoval) {
        let Some((position, record)) = removal.removed else {
            return;
        };

        let mut slot = self.list.lock().await;
        let Some(document) = slot.as_mut() else {
            tracing::debug!(id = %removal.id, "Cache emptied before compensation, nothing to restore");
            return;
        };
        if document.position(&record.id).is_some() {
            return;
        }

        let slides = &mut Arc::make_mut(document).slides;
        let position = position.min(slides.len());
        slides.insert(position, record);
        tracing::warn!(id = %removal.id, position, "Restored slide after failed delete");
    }

    /// Look `id` up in the list (fetching it if needed) and keep it as the selected slide.
    pub async fn select<S: RemoteStore>(
        &self,
        store: &S,
        layout: &StoreLayout,
        id: &str,
    ) -> Result<SlideRecord, AppError> {
        let document = self.get(store, layout).await?;
        let record = document
            .find(id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Slide {} not found", id)))?;

        *self.selected.lock().await = Some(record.clone());
        Ok(record)
    }

    pub async fn selected(&self) -> Option<SlideRecord> {
        self.selected.lock().await.clone()
    }

    pub async fn clear_selected(&self) {
        self.selected.lock().await.take();
    }

    /// Clear the selection only if it is the slide `id`.
    pub async fn clear_selected_if(&self, id: &str) {
        let mut selected = self.selected.lock().await;
        if selected.as_ref().is_some_and(|record| record.id == id) {
            selected.take();
        }
    }

    /// Empty both slots.
    pub async fn clear(&self) {
        self.invalidate().await;
        self.clear_selected().await;
        tracing::info!("Slide caches cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;
    use std::time::Duration;

    fn layout() -> StoreLayout {
        StoreLayout::new("myapp")
    }

    fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(
            "myapp/slides.json",
            json!({"slides": [
                {"id": "s1", "title": "One", "tags": ["a"], "saved_at": "t1", "thumbnail": "th1", "slide": "b1"},
                {"id": "s2", "title": "Two", "tags": ["b"], "saved_at": "t2", "thumbnail": "th2", "slide": "b2"},
                {"id": "s3", "title": "Three", "tags": [], "saved_at": "t3", "thumbnail": "th3", "slide": "b3"}
            ]}),
        );
        store
    }

    fn ids(document: &SlideListDocument) -> Vec<&str> {
        document.slides.iter().map(|s| s.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_second_get_is_served_from_cache() {
        let store = seeded_store();
        let cache = SlideCache::new();

        let first = cache.get(&store, &layout()).await.unwrap();
        let second = cache.get(&store, &layout()).await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_a_fresh_read() {
        let store = seeded_store();
        let cache = SlideCache::new();

        cache.get(&store, &layout()).await.unwrap();
        cache.invalidate().await;
        assert!(!cache.is_populated().await);

        store.insert("myapp/slides.json", json!({"slides": []}));
        let fresh = cache.get(&store, &layout()).await.unwrap();
        assert!(fresh.slides.is_empty());
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_failed_read_leaves_cache_empty() {
        let store = seeded_store();
        store.fail_reads_of("myapp/slides.json");
        let cache = SlideCache::new();

        let err = cache.get(&store, &layout()).await.unwrap_err();
        assert!(matches!(err, AppError::Network(_)));
        assert!(!cache.is_populated().await);

        store.heal();
        assert_eq!(cache.get(&store, &layout()).await.unwrap().slides.len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_initial_gets_share_one_read() {
        let store = seeded_store();
        store.delay_reads(Duration::from_millis(50));
        let cache = SlideCache::new();
        let layout = layout();

        let (a, b, c) = tokio::join!(
            cache.get(&store, &layout),
            cache.get(&store, &layout),
            cache.get(&store, &layout)
        );

        assert_eq!(store.reads(), 1);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(c.unwrap().slides.len(), 3);
    }

    #[tokio::test]
    async fn test_remove_locally_then_compensate_restores_position() {
        let store = seeded_store();
        let cache = SlideCache::new();
        let before = cache.get(&store, &layout()).await.unwrap();

        let removal = cache.remove_locally("s2").await;
        assert_eq!(removal.record().map(|r| r.title.as_str()), Some("Two"));

        let after = cache.get(&store, &layout()).await.unwrap();
        assert_eq!(ids(&after), vec!["s1", "s3"]);
        // Readers holding the old snapshot are unaffected
        assert_eq!(ids(&before), vec!["s1", "s2", "s3"]);

        cache.compensate(removal).await;
        let restored = cache.get(&store, &layout()).await.unwrap();
        assert_eq!(ids(&restored), vec!["s1", "s2", "s3"]);
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_remove_locally_on_empty_cache_is_a_no_op() {
        let store = seeded_store();
        let cache = SlideCache::new();

        let removal = cache.remove_locally("s1").await;
        assert!(removal.record().is_none());
        assert!(!cache.is_populated().await);
        cache.compensate(removal).await;
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn test_compensate_after_invalidate_is_skipped() {
        let store = seeded_store();
        let cache = SlideCache::new();
        cache.get(&store, &layout()).await.unwrap();

        let removal = cache.remove_locally("s1").await;
        cache.invalidate().await;
        cache.compensate(removal).await;

        assert!(!cache.is_populated().await);
    }

    #[tokio::test]
    async fn test_select_and_clear() {
        let store = seeded_store();
        let cache = SlideCache::new();

        let record = cache.select(&store, &layout(), "s3").await.unwrap();
        assert_eq!(record.title, "Three");
        assert_eq!(cache.selected().await, Some(record));

        cache.clear_selected_if("s1").await;
        assert!(cache.selected().await.is_some());
        cache.clear_selected_if("s3").await;
        assert!(cache.selected().await.is_none());
    }

    #[tokio::test]
    async fn test_select_unknown_id_is_not_found() {
        let store = seeded_store();
        let cache = SlideCache::new();

        let err = cache.select(&store, &layout(), "nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(cache.selected().await.is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_both_slots() {
        let store = seeded_store();
        let cache = SlideCache::new();
        cache.select(&store, &layout(), "s1").await.unwrap();

        cache.clear().await;

        assert!(!cache.is_populated().await);
        assert!(cache.selected().await.is_none());
    }
}
