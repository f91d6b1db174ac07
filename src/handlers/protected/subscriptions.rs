use axum::{extract::Path, Extension};
use serde_json::{json, Value};

use super::parse_id;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::subscription::{Subscription, SubscriptionProfile};
use crate::error::ApiError;
use crate::middleware::auth::CurrentUser;
use crate::middleware::response::ApiResponse;

/// POST /api/subscriptions/channel/:channel_id - subscribe or unsubscribe
pub async fn toggle_subscription(
    Extension(user): Extension<CurrentUser>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let channel_id = parse_id(&channel_id, "channel")?;
    if channel_id == user.id {
        return Err(ApiError::bad_request("You cannot subscribe to your own channel"));
    }

    let pool = DatabaseManager::pool().await?;

    let removed = sqlx::query(
        "DELETE FROM subscriptions WHERE subscriber_id = $1 AND channel_id = $2",
    )
    .bind(user.id)
    .bind(channel_id)
    .execute(&pool)
    .await
    .map_err(DatabaseError::from)?;

    if removed.rows_affected() > 0 {
        return Ok(ApiResponse::success(json!({ "subscribed": false }))
            .with_message("Unsubscribed successfully"));
    }

    let created = sqlx::query_as::<_, Subscription>(
        "INSERT INTO subscriptions (subscriber_id, channel_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(user.id)
    .bind(channel_id)
    .fetch_one(&pool)
    .await;

    match created {
        Ok(subscription) => Ok(ApiResponse::success(
            json!({ "subscribed": true, "subscription": subscription }),
        )
        .with_message("Subscribed successfully")),
        // Lost a race against a concurrent subscribe from the same user
        Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
            Ok(ApiResponse::success(json!({ "subscribed": true }))
                .with_message("Subscribed successfully"))
        }
        Err(sqlx::Error::Database(db)) if db.is_foreign_key_violation() => {
            Err(ApiError::not_found("Channel not found"))
        }
        Err(e) => Err(DatabaseError::from(e).into()),
    }
}

/// GET /api/subscriptions/channel/:channel_id - who subscribes to a channel
pub async fn channel_subscribers(
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let channel_id = parse_id(&channel_id, "channel")?;

    let pool = DatabaseManager::pool().await?;
    let subscribers = sqlx::query_as::<_, SubscriptionProfile>(
        "SELECT u.id, u.username, u.avatar, s.created_at AS subscribed_at \
         FROM subscriptions s JOIN users u ON u.id = s.subscriber_id \
         WHERE s.channel_id = $1 ORDER BY s.created_at DESC",
    )
    .bind(channel_id)
    .fetch_all(&pool)
    .await
    .map_err(DatabaseError::from)?;

    let message = if subscribers.is_empty() {
        "No subscribers found"
    } else {
        "Subscribers fetched successfully"
    };

    Ok(ApiResponse::success(json!({ "subscribers": subscribers })).with_message(message))
}

/// GET /api/subscriptions/user/:subscriber_id - channels a user follows
pub async fn subscribed_channels(
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Value>, ApiError> {
    let subscriber_id = parse_id(&subscriber_id, "subscriber")?;

    let pool = DatabaseManager::pool().await?;
    let channels = sqlx::query_as::<_, SubscriptionProfile>(
        "SELECT u.id, u.username, u.avatar, s.created_at AS subscribed_at \
         FROM subscriptions s JOIN users u ON u.id = s.channel_id \
         WHERE s.subscriber_id = $1 ORDER BY s.created_at DESC",
    )
    .bind(subscriber_id)
    .fetch_all(&pool)
    .await
    .map_err(DatabaseError::from)?;

    let message = if channels.is_empty() {
        "User has not subscribed to any channel yet"
    } else {
        "Channel list fetched successfully"
    };

    Ok(ApiResponse::success(json!({ "channels": channels })).with_message(message))
}
