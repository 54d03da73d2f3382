use crate::api::error::AppError;
use crate::api::middleware::auth::AuthUser;
use crate::entities::{audio_files, prelude::*};
use crate::services::audio::{can_read, ingest, plan_upload};
use axum::{
    Extension, Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::Response,
};
use futures::TryStreamExt;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use tokio_util::io::{ReaderStream, StreamReader};
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    pub id: i64,
    pub filename: String,
    pub content_type: audio_files::ContentType,
    pub genre: Option<audio_files::Genre>,
    pub download_url: String,
    /// Rounded display figure; the exact byte size stays authoritative in
    /// storage
    pub size_mb: f64,
}

#[derive(Deserialize)]
pub struct UploadQuery {
    pub genre: Option<audio_files::Genre>,
}

#[utoipa::path(
    post,
    path = "/audio/upload",
    params(
        ("genre" = Option<String>, Query, description = "Optional genre classification")
    ),
    request_body(content = Multipart, description = "Audio file upload"),
    responses(
        (status = 201, description = "Audio file uploaded", body = UploadResponse),
        (status = 400, description = "Unsupported file type"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let declared_filename = field
            .file_name()
            .ok_or_else(|| AppError::BadRequest("Missing filename".to_string()))?
            .to_string();
        let declared_content_type = field.content_type().map(|s| s.to_string());

        // Rejects before any storage write
        let plan = plan_upload(declared_content_type.as_deref(), &declared_filename)?;

        tracing::info!(
            user_id = auth.user.id,
            filename = %declared_filename,
            storage_name = %plan.storage_name,
            "Starting audio upload"
        );

        let body_with_io_error = field.map_err(std::io::Error::other);
        let reader = StreamReader::new(body_with_io_error);

        let record = ingest(
            &state.db,
            &state.storage,
            &auth.user,
            plan,
            query.genre,
            Box::new(reader),
        )
        .await?;

        let size_mb = (record.size as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0;
        let download_url = format!("/audio/{}/file", record.id);

        return Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                id: record.id,
                filename: record.filename,
                content_type: record.content_type,
                genre: record.genre,
                download_url,
                size_mb,
            }),
        ));
    }

    Err(AppError::BadRequest(
        "Missing 'file' field in multipart request".to_string(),
    ))
}

#[utoipa::path(
    get,
    path = "/audio/{id}/file",
    params(
        ("id" = i64, Path, description = "Audio file ID")
    ),
    responses(
        (status = 200, description = "Audio byte stream"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not authorized for this file"),
        (status = 404, description = "Audio file not found")
    ),
    security(
        ("jwt" = [])
    )
)]
pub async fn stream_file(
    State(state): State<crate::AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(audio_id): Path<i64>,
) -> Result<Response, AppError> {
    let audio = AudioFiles::find_by_id(audio_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Audio file not found".to_string()))?;

    if !can_read(&state.db, auth.user.id, &audio).await? {
        tracing::warn!(
            audio_id,
            user_id = auth.user.id,
            "Denied audio read for unauthorized principal"
        );
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    let file = state
        .storage
        .open_stream(&audio.path)
        .await
        .map_err(|_| AppError::NotFound("File missing on server".to_string()))?;

    let body = Body::from_stream(ReaderStream::new(file));

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, audio.content_type.as_mime())
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename={}", audio.filename),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .body(body)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}
