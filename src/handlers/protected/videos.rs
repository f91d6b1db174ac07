use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{pagination, parse_id, total_pages};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::video::{Video, VideoWithOwner};
use crate::database::owned::{Assignment, OwnedRepository};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::ApiResponse;

const FORBIDDEN_VIDEO: &str =
    "You do not have permission to modify this video or it does not exist";

#[derive(Debug, Deserialize)]
pub struct ListVideosQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// case-insensitive title filter
    pub query: Option<String>,
    /// restrict to a single uploader
    pub owner: Option<String>,
    pub sort_by: Option<String>,
    pub sort_type: Option<String>,
}

/// GET /api/videos - published videos, filtered, sorted and paginated
pub async fn videos_list(Query(params): Query<ListVideosQuery>) -> Result<ApiResponse<Value>, ApiError> {
    let paging = pagination(params.page, params.limit);
    let owner_id = params
        .owner
        .as_deref()
        .map(|raw| parse_id(raw, "owner"))
        .transpose()?;
    let title_pattern = params.query.as_ref().map(|q| format!("%{}%", q));

    let sort_column = match params.sort_by.as_deref() {
        None | Some("created_at") => "created_at",
        Some("title") => "title",
        Some("views") => "views",
        Some("duration") => "duration",
        Some(other) => {
            return Err(ApiError::bad_request(format!("Cannot sort by '{}'", other)));
        }
    };
    let sort_direction = match params.sort_type.as_deref() {
        Some("asc") => "ASC",
        _ => "DESC",
    };

    let pool = DatabaseManager::pool().await?;

    let filter = "v.is_published = TRUE \
                  AND ($1::text IS NULL OR v.title ILIKE $1) \
                  AND ($2::uuid IS NULL OR v.owner_id = $2)";

    let list_sql = format!(
        "SELECT v.*, u.username AS owner_username, u.avatar AS owner_avatar \
         FROM videos v JOIN users u ON u.id = v.owner_id \
         WHERE {} ORDER BY v.{} {} LIMIT $3 OFFSET $4",
        filter, sort_column, sort_direction
    );
    let videos = sqlx::query_as::<_, VideoWithOwner>(&list_sql)
        .bind(&title_pattern)
        .bind(owner_id)
        .bind(paging.limit)
        .bind(paging.offset)
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let count_sql = format!("SELECT COUNT(*) FROM videos v WHERE {}", filter);
    let total: i64 = sqlx::query_scalar(&count_sql)
        .bind(&title_pattern)
        .bind(owner_id)
        .fetch_one(&pool)
        .await
        .map_err(DatabaseError::from)?;

    Ok(ApiResponse::success(json!({
        "videos": videos,
        "total_videos": total,
        "total_pages": total_pages(total, paging.limit),
        "current_page": paging.page,
    }))
    .with_message("Videos fetched successfully"))
}

#[derive(Debug, Deserialize)]
pub struct PublishVideoRequest {
    pub title: String,
    pub description: String,
    pub video_file: String,
    pub thumbnail: String,
    pub duration: Option<f64>,
}

/// POST /api/videos - publish a video owned by the caller
pub async fn videos_create(
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<PublishVideoRequest>,
) -> Result<ApiResponse<Video>, ApiError> {
    for (field, value) in [
        ("title", &payload.title),
        ("description", &payload.description),
        ("video_file", &payload.video_file),
        ("thumbnail", &payload.thumbnail),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::bad_request(format!("{} is required", field)));
        }
    }

    let pool = DatabaseManager::pool().await?;
    let video = sqlx::query_as::<_, Video>(
        "INSERT INTO videos (owner_id, title, description, video_file, thumbnail, duration) \
         VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
    )
    .bind(user.id)
    .bind(payload.title.trim())
    .bind(payload.description.trim())
    .bind(&payload.video_file)
    .bind(&payload.thumbnail)
    .bind(payload.duration.unwrap_or(0.0))
    .fetch_one(&pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(ApiResponse::created(video).with_message("Video published successfully"))
}

/// GET /api/videos/:video_id
pub async fn videos_get(Path(video_id): Path<String>) -> Result<ApiResponse<VideoWithOwner>, ApiError> {
    let video_id = parse_id(&video_id, "video")?;
    let pool = DatabaseManager::pool().await?;

    let video = sqlx::query_as::<_, VideoWithOwner>(
        "SELECT v.*, u.username AS owner_username, u.avatar AS owner_avatar \
         FROM videos v JOIN users u ON u.id = v.owner_id WHERE v.id = $1",
    )
    .bind(video_id)
    .fetch_optional(&pool)
    .await
    .map_err(DatabaseError::from)?
    .ok_or_else(|| ApiError::not_found("Video not found"))?;

    Ok(ApiResponse::success(video).with_message("Video fetched successfully"))
}

#[derive(Debug, Deserialize)]
pub struct UpdateVideoRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
}

/// PATCH /api/videos/:video_id - owner-only metadata update
pub async fn videos_update(
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(payload): Json<UpdateVideoRequest>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id(&video_id, "video")?;

    let mut assignments = Vec::new();
    if let Some(title) = payload.title.as_deref() {
        if title.trim().is_empty() {
            return Err(ApiError::bad_request("title cannot be empty"));
        }
        assignments.push(Assignment::Set("title", json!(title.trim())));
    }
    if let Some(description) = payload.description.as_deref() {
        if description.trim().is_empty() {
            return Err(ApiError::bad_request("description cannot be empty"));
        }
        assignments.push(Assignment::Set("description", json!(description.trim())));
    }
    if let Some(thumbnail) = payload.thumbnail.as_deref() {
        assignments.push(Assignment::Set("thumbnail", json!(thumbnail)));
    }
    if assignments.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let pool = DatabaseManager::pool().await?;
    let updated = OwnedRepository::<Video>::new("videos", pool)
        .update_if_owned(video_id, user.id, &assignments)
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_VIDEO))?;

    Ok(ApiResponse::success(updated).with_message("Video details updated successfully"))
}

/// DELETE /api/videos/:video_id - owner-only delete
pub async fn videos_delete(
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id(&video_id, "video")?;

    let pool = DatabaseManager::pool().await?;
    let deleted = OwnedRepository::<Video>::new("videos", pool)
        .delete_if_owned(video_id, user.id)
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_VIDEO))?;

    Ok(ApiResponse::success(deleted).with_message("Video deleted successfully"))
}

/// PATCH /api/videos/:video_id/toggle-publish - owner-only visibility flip
pub async fn videos_toggle_publish(
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Video>, ApiError> {
    let video_id = parse_id(&video_id, "video")?;

    let pool = DatabaseManager::pool().await?;
    let updated = OwnedRepository::<Video>::new("videos", pool)
        .update_if_owned(video_id, user.id, &[Assignment::Toggle("is_published")])
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_VIDEO))?;

    Ok(ApiResponse::success(updated).with_message("Publish status updated successfully"))
}
