use axum::{
    extract::{Path, Query},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{pagination, parse_id, total_pages};
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::comment::{Comment, CommentWithAuthor};
use crate::database::owned::{Assignment, OwnedRepository};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::ApiResponse;

const FORBIDDEN_COMMENT: &str =
    "You do not have permission to modify this comment or it does not exist";

#[derive(Debug, Deserialize)]
pub struct ListCommentsQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// GET /api/videos/:video_id/comments - newest first, paginated
pub async fn comments_list(
    Path(video_id): Path<String>,
    Query(params): Query<ListCommentsQuery>,
) -> Result<ApiResponse<Value>, ApiError> {
    let video_id = parse_id(&video_id, "video")?;
    let paging = pagination(params.page, params.limit);

    let pool = DatabaseManager::pool().await?;
    let comments = sqlx::query_as::<_, CommentWithAuthor>(
        "SELECT c.*, u.username AS author_username, u.avatar AS author_avatar \
         FROM comments c JOIN users u ON u.id = c.owner_id \
         WHERE c.video_id = $1 ORDER BY c.created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(video_id)
    .bind(paging.limit)
    .bind(paging.offset)
    .fetch_all(&pool)
    .await
    .map_err(DatabaseError::from)?;

    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM comments WHERE video_id = $1")
        .bind(video_id)
        .fetch_one(&pool)
        .await
        .map_err(DatabaseError::from)?;

    let message = if comments.is_empty() {
        "No comments found for this video"
    } else {
        "Comments fetched successfully"
    };

    Ok(ApiResponse::success(json!({
        "comments": comments,
        "total_comments": total,
        "total_pages": total_pages(total, paging.limit),
        "current_page": paging.page,
    }))
    .with_message(message))
}

#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    pub content: String,
}

/// POST /api/videos/:video_id/comments
pub async fn comments_create(
    Extension(user): Extension<CurrentUser>,
    Path(video_id): Path<String>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let video_id = parse_id(&video_id, "video")?;
    if payload.content.trim().is_empty() {
        return Err(ApiError::bad_request("content is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let created = sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (video_id, owner_id, content) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(video_id)
    .bind(user.id)
    .bind(payload.content.trim())
    .fetch_one(&pool)
    .await;

    match created {
        Ok(comment) => Ok(ApiResponse::created(comment).with_message("Comment created successfully")),
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            Err(ApiError::not_found("Video not found"))
        }
        Err(e) => Err(DatabaseError::from(e).into()),
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentRequest {
    pub content: String,
}

/// PATCH /api/comments/:comment_id - owner-only edit
pub async fn comments_update(
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let comment_id = parse_id(&comment_id, "comment")?;
    if payload.content.trim().is_empty() {
        return Err(ApiError::bad_request("content is required"));
    }

    let pool = DatabaseManager::pool().await?;
    let updated = OwnedRepository::<Comment>::new("comments", pool)
        .update_if_owned(
            comment_id,
            user.id,
            &[Assignment::Set("content", json!(payload.content.trim()))],
        )
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_COMMENT))?;

    Ok(ApiResponse::success(updated).with_message("Comment updated successfully"))
}

/// DELETE /api/comments/:comment_id - owner-only delete
pub async fn comments_delete(
    Extension(user): Extension<CurrentUser>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Comment>, ApiError> {
    let comment_id = parse_id(&comment_id, "comment")?;

    let pool = DatabaseManager::pool().await?;
    let deleted = OwnedRepository::<Comment>::new("comments", pool)
        .delete_if_owned(comment_id, user.id)
        .await?
        .ok_or_else(|| ApiError::forbidden(FORBIDDEN_COMMENT))?;

    Ok(ApiResponse::success(deleted).with_message("Comment deleted successfully"))
}
