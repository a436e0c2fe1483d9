use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

/// A directional friend request. At most one row exists per ordered
/// (from, to) pair; acceptance flips `accepted` once, rejection deletes
/// the row.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FriendRequestEntity {
    pub id: Uuid,
    pub from_user_id: Uuid,
    pub to_user_id: Uuid,
    pub accepted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
