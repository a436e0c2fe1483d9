use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::api::error;
use crate::modules::friend::model::{FriendResponse, PendingRequestResponse};
use crate::modules::friend::schema::FriendRequestEntity;

/// The friend-request ledger. Rows are directional; the uniqueness of an
/// ordered (from, to) pair is an invariant the service enforces and the
/// store backs.
#[async_trait::async_trait]
pub trait FriendRequestRepository {
    async fn find_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    /// The lookup is directional on purpose: a request in the opposite
    /// direction does not match.
    async fn find_directional(
        &self,
        from_user_id: &Uuid,
        to_user_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError>;

    /// Count of requests this account created at or after `since`, used as
    /// the sliding-window rate limit read.
    async fn count_sent_since(
        &self,
        from_user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, error::SystemError>;

    async fn create(
        &self,
        from_user_id: &Uuid,
        to_user_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError>;

    /// Flips `accepted` to true. Returns false when the request was already
    /// accepted, so a concurrent double-accept surfaces as a conflict.
    async fn mark_accepted(&self, request_id: &Uuid) -> Result<bool, error::SystemError>;

    async fn delete(&self, request_id: &Uuid) -> Result<(), error::SystemError>;

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<PendingRequestResponse>, error::SystemError>;
}

/// Friendships are derived, never stored: the symmetric relation is
/// recomputed by scanning accepted requests where the account appears as
/// either party.
#[async_trait::async_trait]
pub trait FriendshipRepository {
    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError>;
}

pub trait FriendRepo: FriendRequestRepository + FriendshipRepository + Send + Sync {}
