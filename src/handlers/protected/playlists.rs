use axum::{extract::Path, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use super::parse_id;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::playlist::Playlist;
use crate::database::owned::{Assignment, OwnedRepository};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::ApiResponse;

const FORBIDDEN_PLAYLIST: &str =
    "You do not have permission to modify this playlist or it does not exist";

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
    pub description: String,
}

/// POST /api/playlists
pub async fn playlists_create(
    Extension(user): Extension<CurrentUser>,
    Json(payload): Json<CreatePlaylistRequest>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    if payload.name.trim().is_empty() {
        return Err(ApiError::bad_request("name is required"));
    }
    if payload.description.trim().is_empty() {
        return Err(ApiError::bad_request("description is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let playlist = sqlx::query_as::<_, Playlist>(
        "INSERT INTO playlists (owner_id, name, description) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(user.id)
    .bind(payload.name.trim())
    .bind(payload.description.trim())
    .fetch_one(&pool)
    .await
    .map_err(DatabaseError::from)?;

    Ok(ApiResponse::created(playlist).with_message("Playlist created successfully"))
}

/// GET /api/playlists/user/:user_id - playlists created by a user
pub async fn playlists_for_user(
    Path(user_id): Path<String>,
) -> Result<ApiResponse<Vec<Playlist>>, ApiError> {
    let user_id = parse_id(&user_id, "user")?;

    let pool = DatabaseManager::pool().await?;
    let playlists = sqlx::query_as::<_, Playlist>(
        "SELECT * FROM playlists WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .map_err(DatabaseError::from)?;

    let message = if playlists.is_empty() {
        "User has not created any playlist yet"
    } else {
        "Playlists fetched successfully"
    };

    Ok(ApiResponse::success(playlists).with_message(message))
}

/// GET /api/playlists/:playlist_id
pub async fn playlists_get(Path(playlist_id): Path<String>) -> Result<ApiResponse<Playlist>, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let pool = DatabaseManager::pool().await?;
    let playlist = sqlx::query_as::<_, Playlist>("SELECT * FROM playlists WHERE id = $1")
        .bind(playlist_id)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::from)?
        .ok_or_else(|| ApiError::not_found("Playlist not found"))?;

    Ok(ApiResponse::success(playlist).with_message("Playlist fetched successfully"))
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// PATCH /api/playlists/:playlist_id - owner-only rename/describe
pub async fn playlists_update(
    Extension(user): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
    Json(payload): Json<UpdatePlaylistRequest>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let mut assignments = Vec::new();
    if let Some(name) = payload.name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("name cannot be empty"));
        }
        assignments.push(Assignment::Set("name", json!(name.trim())));
    }
    if let Some(description) = payload.description.as_deref() {
        if description.trim().is_empty() {
            return Err(ApiError::bad_request("description cannot be empty"));
        }
        assignments.push(Assignment::Set("description", json!(description.trim())));
    }
    if assignments.is_empty() {
        return Err(ApiError::bad_request("Nothing to update"));
    }

    let pool = DatabaseManager::pool().await?;
    let updated = OwnedRepository::<Playlist>::new("playlists", pool)
        .update_if_owned(playlist_id, user.id, &assignments)
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_PLAYLIST))?;

    Ok(ApiResponse::success(updated).with_message("Playlist updated successfully"))
}

/// DELETE /api/playlists/:playlist_id - owner-only delete
pub async fn playlists_delete(
    Extension(user): Extension<CurrentUser>,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;

    let pool = DatabaseManager::pool().await?;
    let deleted = OwnedRepository::<Playlist>::new("playlists", pool)
        .delete_if_owned(playlist_id, user.id)
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_PLAYLIST))?;

    Ok(ApiResponse::success(deleted).with_message("Playlist deleted successfully"))
}

/// PATCH /api/playlists/:playlist_id/videos/:video_id - owner-only add
pub async fn playlists_add_video(
    Extension(user): Extension<CurrentUser>,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let video_id = parse_id(&video_id, "video")?;

    let pool = DatabaseManager::pool().await?;

    // Reads don't race the mutation; a video deleted between this check and
    // the update leaves a dangling playlist entry, same as any later delete
    let video_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM videos WHERE id = $1)")
        .bind(video_id)
        .fetch_one(&pool)
        .await
        .map_err(DatabaseError::from)?;
    if !video_exists {
        return Err(ApiError::not_found("Video not found"));
    }

    let updated = OwnedRepository::<Playlist>::new("playlists", pool)
        .update_if_owned(
            playlist_id,
            user.id,
            &[Assignment::ArrayAdd("video_ids", video_id)],
        )
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_PLAYLIST))?;

    Ok(ApiResponse::success(updated).with_message("Video added to playlist successfully"))
}

/// DELETE /api/playlists/:playlist_id/videos/:video_id - owner-only remove
pub async fn playlists_remove_video(
    Extension(user): Extension<CurrentUser>,
    Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<ApiResponse<Playlist>, ApiError> {
    let playlist_id = parse_id(&playlist_id, "playlist")?;
    let video_id = parse_id(&video_id, "video")?;

    let pool = DatabaseManager::pool().await?;
    let updated = OwnedRepository::<Playlist>::new("playlists", pool)
        .update_if_owned(
            playlist_id,
            user.id,
            &[Assignment::ArrayRemove("video_ids", video_id)],
        )
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_PLAYLIST))?;

    Ok(ApiResponse::success(updated).with_message("Video removed from playlist successfully"))
}
