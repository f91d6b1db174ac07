use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A like row targets exactly one of `video_id` or `comment_id`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Like {
    pub id: Uuid,
    pub liked_by: Uuid,
    pub video_id: Option<Uuid>,
    pub comment_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Liked-videos listing entry: the like plus the video's display fields
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LikedVideo {
    pub video_id: Uuid,
    pub title: String,
    pub thumbnail: String,
    pub duration: f64,
    pub liked_at: DateTime<Utc>,
}
