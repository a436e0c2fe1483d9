use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::modules::user::schema::UserEntity;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FriendResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserEntity> for FriendResponse {
    fn from(user: UserEntity) -> Self {
        FriendResponse {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
        }
    }
}

#[derive(FromRow)]
pub struct PendingRequestRow {
    pub req_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub accepted: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A pending request as seen by its recipient, carrying the sender's
/// public fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRequestResponse {
    pub id: Uuid,
    pub from_user: FriendResponse,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub accepted: bool,
}

impl From<PendingRequestRow> for PendingRequestResponse {
    fn from(row: PendingRequestRow) -> Self {
        PendingRequestResponse {
            id: row.req_id,
            from_user: FriendResponse {
                id: row.user_id,
                username: row.username,
                email: row.email,
                first_name: row.first_name,
                last_name: row.last_name,
            },
            timestamp: row.created_at,
            accepted: row.accepted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SendRequestBody {
    pub user_id: Uuid,
}

#[derive(Serialize)]
pub struct SendRequestResponse {
    pub friend_request_id: Uuid,
}

/// Action is validated in the service, after the not-found, permission and
/// already-accepted checks.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RespondRequestBody {
    pub action: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespondAction {
    Accept,
    Reject,
}
