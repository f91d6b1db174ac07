use axum::{extract::Path, Extension};
use serde_json::{json, Value};
use uuid::Uuid;

use super::parse_id;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::like::{Like, LikedVideo};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::ApiResponse;

/// POST /api/likes/toggle/video/:video_id
pub async fn toggle_video_like(
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let video_id = parse_id(&video_id, "video")?;
    toggle_like(user.id, "video_id", video_id, "Video").await
}

/// POST /api/likes/toggle/comment/:comment_id
pub async fn toggle_comment_like(
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let comment_id = parse_id(&comment_id, "comment")?;
    toggle_like(user.id, "comment_id", comment_id, "Comment").await
}

/// Remove the caller's like if present, otherwise create it. The delete
/// filters on liked_by so one user can never clear another user's like.
async fn toggle_like(
    user_id: Uuid,
    target_column: &'static str,
    target_id: Uuid,
    target_label: &'static str,
) -> Result<ApiResponse<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let delete_sql = format!("DELETE FROM likes WHERE liked_by = $1 AND {} = $2", target_column);
    let removed = sqlx::query(&delete_sql)
        .bind(user_id)
        .bind(target_id)
        .execute(&pool)
        .await
        .map_err(DatabaseError::from)?;

    if removed.rows_affected() > 0 {
        return Ok(ApiResponse::success(json!({ "liked": false }))
            .with_message(format!("{} unliked successfully", target_label)));
    }

    let insert_sql = format!(
        "INSERT INTO likes (liked_by, {}) VALUES ($1, $2) RETURNING *",
        target_column
    );
    let created = sqlx::query_as::<_, Like>(&insert_sql)
        .bind(user_id)
        .bind(target_id)
        .fetch_one(&pool)
        .await;

    match created {
        Ok(like) => Ok(ApiResponse::success(json!({ "liked": true, "like": like }))
            .with_message(format!("{} liked successfully", target_label))),
        // Lost a race against a concurrent like from the same user; it exists now
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Ok(ApiResponse::success(json!({ "liked": true }))
                .with_message(format!("{} liked successfully", target_label)))
        }
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            Err(ApiError::not_found(format!("{} not found", target_label)))
        }
        Err(e) => Err(DatabaseError::from(e).into()),
    }
}

/// GET /api/likes/videos - videos the caller has liked, newest like first
pub async fn liked_videos(
    Extension(user): Extension<CurrentUser>,
) -> Result<ApiResponse<Value>, ApiError> {
    let pool = DatabaseManager::pool().await?;

    let videos = sqlx::query_as::<_, LikedVideo>(
        "SELECT v.id AS video_id, v.title, v.thumbnail, v.duration, l.created_at AS liked_at \
         FROM likes l JOIN videos v ON v.id = l.video_id \
         WHERE l.liked_by = $1 AND l.video_id IS NOT NULL \
         ORDER BY l.created_at DESC",
    )
    .bind(user.id)
    .fetch_all(&pool)
    .await
    .map_err(DatabaseError::from)?;

    let message = if videos.is_empty() {
        "No liked videos found"
    } else {
        "Liked videos fetched successfully"
    };

    Ok(ApiResponse::success(json!({ "videos": videos })).with_message(message))
}
