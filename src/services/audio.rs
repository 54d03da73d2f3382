use crate::api::error::AppError;
use crate::entities::{audio_files, prelude::*, user_audio, users};
use crate::services::storage::AudioStorage;
use crate::utils::validation::file_extension;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use std::sync::Arc;
use tokio::io::AsyncRead;
use uuid::Uuid;

/// Validated upload intent; no side effects have happened yet when this
/// exists.
#[derive(Debug)]
pub struct UploadPlan {
    pub content_type: audio_files::ContentType,
    pub storage_name: String,
}

/// Validate the declared content type and filename extension and pick the
/// storage name. Fails before any byte is written.
pub fn plan_upload(
    declared_content_type: Option<&str>,
    declared_filename: &str,
) -> Result<UploadPlan, AppError> {
    let mime = declared_content_type
        .ok_or_else(|| AppError::BadRequest("Only audio files allowed".to_string()))?;

    let content_type = audio_files::ContentType::from_mime(mime)
        .ok_or_else(|| AppError::BadRequest("Only audio files allowed".to_string()))?;

    let ext = file_extension(declared_filename).ok_or_else(|| {
        AppError::BadRequest("Supported formats: MP3, WAV, OGG, FLAC, AAC, MP4_AUDIO".to_string())
    })?;
    if audio_files::ContentType::from_extension(&ext).is_none() {
        return Err(AppError::BadRequest(
            "Supported formats: MP3, WAV, OGG, FLAC, AAC, MP4_AUDIO".to_string(),
        ));
    }

    // Never derived from user-supplied filename text
    let storage_name = format!("{}{}", Uuid::new_v4(), ext);

    Ok(UploadPlan {
        content_type,
        storage_name,
    })
}

/// Compensation handle for a storage object that is not yet covered by a
/// committed database row. If the ingest future is dropped mid-copy (client
/// disconnect), `Drop` schedules the deletion that the error paths perform
/// inline.
struct PartialUploadGuard {
    storage: Arc<dyn AudioStorage>,
    name: Option<String>,
}

impl PartialUploadGuard {
    fn new(storage: Arc<dyn AudioStorage>, name: String) -> Self {
        Self {
            storage,
            name: Some(name),
        }
    }

    /// The record committed; the object is now owned by the database row.
    fn disarm(&mut self) {
        self.name = None;
    }

    /// Delete the object now, awaiting completion.
    async fn discard(&mut self) {
        if let Some(name) = self.name.take() {
            if let Err(e) = self.storage.delete(&name).await {
                tracing::error!(storage_name = %name, "Failed to remove storage object: {:?}", e);
            }
        }
    }
}

impl Drop for PartialUploadGuard {
    fn drop(&mut self) {
        if let Some(name) = self.name.take() {
            let storage = self.storage.clone();
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = storage.delete(&name).await {
                        tracing::error!(
                            storage_name = %name,
                            "Failed to remove orphaned storage object: {:?}",
                            e
                        );
                    }
                });
            }
        }
    }
}

/// Persist the upload stream and record ownership.
///
/// The on-disk object and the database row must either both exist or
/// neither: every failure after the byte-write step deletes the object
/// before the error propagates, and cancellation mid-copy cleans up too.
pub async fn ingest<'a>(
    db: &DatabaseConnection,
    storage: &Arc<dyn AudioStorage>,
    owner: &users::Model,
    plan: UploadPlan,
    genre: Option<audio_files::Genre>,
    reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
) -> Result<audio_files::Model, AppError> {
    let mut guard = PartialUploadGuard::new(storage.clone(), plan.storage_name.clone());

    if let Err(e) = storage.save_stream(&plan.storage_name, reader).await {
        tracing::error!(
            storage_name = %plan.storage_name,
            "Failed to save upload stream: {:?}",
            e
        );
        guard.discard().await;
        return Err(AppError::Internal("File save failed".to_string()));
    }

    // Never trust the client-declared size
    let size = match storage.stat(&plan.storage_name).await {
        Ok(size) => size as i64,
        Err(e) => {
            tracing::error!(
                storage_name = %plan.storage_name,
                "Failed to stat uploaded object: {:?}",
                e
            );
            guard.discard().await;
            return Err(AppError::Internal("Failed to get file details".to_string()));
        }
    };

    if size == 0 {
        guard.discard().await;
        return Err(AppError::BadRequest("Empty file upload".to_string()));
    }

    match persist_record(db, owner, &plan, genre, size).await {
        Ok(record) => {
            guard.disarm();
            Ok(record)
        }
        Err(e) => {
            // The row did not commit; the object must not outlive it
            guard.discard().await;
            Err(e)
        }
    }
}

async fn persist_record(
    db: &DatabaseConnection,
    owner: &users::Model,
    plan: &UploadPlan,
    genre: Option<audio_files::Genre>,
    size: i64,
) -> Result<audio_files::Model, AppError> {
    let txn = db.begin().await?;

    let record = audio_files::ActiveModel {
        filename: Set(plan.storage_name.clone()),
        content_type: Set(plan.content_type),
        genre: Set(genre),
        size: Set(size),
        path: Set(plan.storage_name.clone()),
        owner_id: Set(owner.id),
        created_at: Set(Some(Utc::now())),
        ..Default::default()
    };
    let record = record.insert(&txn).await?;

    // Owner is always a member of the authorized-readers set
    let membership = user_audio::ActiveModel {
        user_id: Set(owner.id),
        audio_file_id: Set(record.id),
    };
    membership.insert(&txn).await?;

    txn.commit().await?;

    tracing::info!(
        audio_id = record.id,
        owner_id = owner.id,
        size = record.size,
        "Audio file ingested"
    );

    Ok(record)
}

/// Access-Control Evaluator: a principal may read a file iff they own it or
/// are a member of its authorized-readers set. File existence is the
/// caller's concern, decided before this check.
pub async fn can_read(
    db: &DatabaseConnection,
    principal_id: i64,
    file: &audio_files::Model,
) -> Result<bool, AppError> {
    if file.owner_id == principal_id {
        return Ok(true);
    }

    let membership = UserAudio::find_by_id((principal_id, file.id)).one(db).await?;
    Ok(membership.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_rejects_non_audio_mime() {
        let err = plan_upload(Some("text/plain"), "song.mp3").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_plan_rejects_missing_content_type() {
        assert!(plan_upload(None, "song.mp3").is_err());
    }

    #[test]
    fn test_plan_rejects_unsupported_extension() {
        let err = plan_upload(Some("audio/mpeg"), "song.txt").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(plan_upload(Some("audio/mpeg"), "noext").is_err());
    }

    #[test]
    fn test_plan_generates_fresh_storage_name() {
        let a = plan_upload(Some("audio/mpeg"), "song.mp3").unwrap();
        let b = plan_upload(Some("audio/mpeg"), "song.mp3").unwrap();
        assert_ne!(a.storage_name, b.storage_name);
        assert!(a.storage_name.ends_with(".mp3"));
        assert!(!a.storage_name.contains("song"));
    }

    #[test]
    fn test_plan_lowercases_extension() {
        let plan = plan_upload(Some("audio/flac"), "TRACK.FLAC").unwrap();
        assert!(plan.storage_name.ends_with(".flac"));
    }
}
