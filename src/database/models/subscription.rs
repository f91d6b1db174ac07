use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub subscriber_id: Uuid,
    pub channel_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Display fields of a user on either side of a subscription
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SubscriptionProfile {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
    pub subscribed_at: DateTime<Utc>,
}
