//! Read-modify-write protocols over `slides.json` and `tags.json`.
//!
//! Each step re-reads the document right before writing it back. The two
//! documents are written independently; a failure between the writes leaves
//! the tag index out of step until [`reconcile_tag_index`] runs.

use chrono::{SecondsFormat, Utc};

use super::tag_index;
use crate::errors::AppError;
use crate::models::{
    ExportedSlide, ReconcileReport, SlideListDocument, SlideRecord, TagIndexDocument,
};
use crate::store::{read_json, write_json, RemoteStore, StoreLayout};

/// Inputs of the add protocol, already validated.
#[derive(Debug, Clone)]
pub struct NewSlide {
    pub title: String,
    pub tags: Vec<String>,
    pub exported: ExportedSlide,
}

/// Create the app folder and any missing document.
///
/// Returns `true` when something had to be created.
pub async fn initialize_store<S: RemoteStore>(
    store: &S,
    layout: &StoreLayout,
) -> Result<bool, AppError> {
    store.ensure_folder(&layout.folder).await?;
    let mut created = false;

    if !store.document_exists(&layout.slides_path).await? {
        write_json(store, &layout.slides_path, &SlideListDocument::default()).await?;
        tracing::info!(path = %layout.slides_path, "Created empty slide list");
        created = true;
    }

    if !store.document_exists(&layout.tags_path).await? {
        // Seed from the slides that already exist so the index starts consistent
        let slides: SlideListDocument = read_json(store, &layout.slides_path).await?;
        let index = TagIndexDocument {
            tags: tag_index::rebuild_index(&slides.slides),
        };
        write_json(store, &layout.tags_path, &index).await?;
        tracing::info!(path = %layout.tags_path, entries = index.tags.len(), "Created tag index");
        created = true;
    }

    Ok(created)
}

/// Read `tags.json`, treating a missing document as an empty index.
pub async fn read_tag_index<S: RemoteStore>(
    store: &S,
    layout: &StoreLayout,
) -> Result<TagIndexDocument, AppError> {
    match read_json(store, &layout.tags_path).await {
        Err(AppError::NotFound(_)) => {
            tracing::warn!(path = %layout.tags_path, "Tag index missing, starting empty");
            Ok(TagIndexDocument::default())
        }
        other => other,
    }
}

async fn update_tag_index<S, F>(
    store: &S,
    layout: &StoreLayout,
    sort: bool,
    apply: F,
) -> Result<(), AppError>
where
    S: RemoteStore,
    F: FnOnce(&mut Vec<String>),
{
    let mut index = read_tag_index(store, layout).await?;
    apply(&mut index.tags);
    if sort {
        index.tags.sort();
    }
    write_json(store, &layout.tags_path, &index).await
}

/// Save a new slide at the front of the list, then append its tags to the index.
pub async fn add_slide<S: RemoteStore>(
    store: &S,
    layout: &StoreLayout,
    new_slide: NewSlide,
    sort_tags: bool,
) -> Result<SlideRecord, AppError> {
    let record = SlideRecord {
        id: uuid::Uuid::new_v4().to_string(),
        title: new_slide.title,
        tags: new_slide.tags,
        saved_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        thumbnail: new_slide.exported.thumbnail,
        slide: new_slide.exported.slide,
    };

    let mut slides: SlideListDocument = read_json(store, &layout.slides_path).await?;
    slides.slides.insert(0, record.clone());
    write_json(store, &layout.slides_path, &slides).await?;

    update_tag_index(store, layout, sort_tags, |index| {
        tag_index::append_tags(index, &record.tags)
    })
    .await
    .inspect_err(|e| {
        tracing::warn!(id = %record.id, error = %e, "Slide saved but tag index update failed");
    })?;

    tracing::info!(id = %record.id, title = %record.title, "Slide added");
    Ok(record)
}

/// Change the title and tags of a saved slide.
///
/// The slide's previous tags are taken out of the index and the new ones
/// appended, so the index keeps one entry per tag occurrence.
pub async fn edit_slide<S: RemoteStore>(
    store: &S,
    layout: &StoreLayout,
    id: &str,
    title: String,
    tags: Vec<String>,
    sort_tags: bool,
) -> Result<SlideRecord, AppError> {
    let mut slides: SlideListDocument = read_json(store, &layout.slides_path).await?;
    let record = slides
        .slides
        .iter_mut()
        .find(|slide| slide.id == id)
        .ok_or_else(|| AppError::NotFound(format!("Slide {} not found", id)))?;

    let previous_tags = std::mem::replace(&mut record.tags, tags);
    record.title = title;
    let updated = record.clone();
    write_json(store, &layout.slides_path, &slides).await?;

    update_tag_index(store, layout, sort_tags, |index| {
        tag_index::replace_tags(index, &previous_tags, &updated.tags)
    })
    .await
    .inspect_err(|e| {
        tracing::warn!(id, error = %e, "Slide edited but tag index update failed");
    })?;

    tracing::info!(id, title = %updated.title, "Slide edited");
    Ok(updated)
}

/// Remove a slide from `slides.json` and return the removed record.
///
/// This is the first half of a delete; [`remove_slide_tags`] finishes it.
pub async fn remove_slide_record<S: RemoteStore>(
    store: &S,
    layout: &StoreLayout,
    id: &str,
) -> Result<SlideRecord, AppError> {
    let mut slides: SlideListDocument = read_json(store, &layout.slides_path).await?;
    let position = slides
        .position(id)
        .ok_or_else(|| AppError::NotFound(format!("Slide {} not found", id)))?;
    let removed = slides.slides.remove(position);
    write_json(store, &layout.slides_path, &slides).await?;
    Ok(removed)
}

/// Take a removed slide's tags out of the index, one occurrence each.
pub async fn remove_slide_tags<S: RemoteStore>(
    store: &S,
    layout: &StoreLayout,
    removed: &SlideRecord,
) -> Result<(), AppError> {
    update_tag_index(store, layout, false, |index| {
        tag_index::subtract_tags(index, &removed.tags)
    })
    .await
    .inspect_err(|e| {
        tracing::warn!(id = %removed.id, error = %e, "Slide deleted but tag index update failed");
    })
}

/// Rebuild `tags.json` from the slide list and report what changed.
pub async fn reconcile_tag_index<S: RemoteStore>(
    store: &S,
    layout: &StoreLayout,
) -> Result<ReconcileReport, AppError> {
    let slides: SlideListDocument = read_json(store, &layout.slides_path).await?;
    let current = read_tag_index(store, layout).await?;
    let rebuilt = tag_index::rebuild_index(&slides.slides);

    let report = ReconcileReport {
        added: tag_index::difference(&rebuilt, &current.tags),
        removed: tag_index::difference(&current.tags, &rebuilt),
        total: rebuilt.len(),
    };

    if report.is_clean() {
        tracing::debug!("Tag index already consistent");
        return Ok(report);
    }

    write_json(store, &layout.tags_path, &TagIndexDocument { tags: rebuilt }).await?;
    tracing::info!(
        added = report.added.len(),
        removed = report.removed.len(),
        "Tag index reconciled"
    );
    Ok(report)
}
