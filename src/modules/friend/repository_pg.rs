use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::friend::{
        model::{FriendResponse, PendingRequestResponse, PendingRequestRow},
        repository::{FriendRepo, FriendRequestRepository, FriendshipRepository},
        schema::FriendRequestEntity,
    },
};

#[derive(Clone)]
pub struct FriendRepositoryPg {
    pool: sqlx::PgPool,
}

impl FriendRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl FriendRequestRepository for FriendRepositoryPg {
    async fn find_by_id(
        &self,
        request_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request =
            sqlx::query_as::<_, FriendRequestEntity>("SELECT * FROM friend_requests WHERE id = $1")
                .bind(request_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(request)
    }

    async fn find_directional(
        &self,
        from_user_id: &Uuid,
        to_user_id: &Uuid,
    ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            "SELECT * FROM friend_requests WHERE from_user_id = $1 AND to_user_id = $2",
        )
        .bind(from_user_id)
        .bind(to_user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn count_sent_since(
        &self,
        from_user_id: &Uuid,
        since: DateTime<Utc>,
    ) -> Result<i64, error::SystemError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT count(*) FROM friend_requests WHERE from_user_id = $1 AND created_at >= $2",
        )
        .bind(from_user_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn create(
        &self,
        from_user_id: &Uuid,
        to_user_id: &Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        let request = sqlx::query_as::<_, FriendRequestEntity>(
            r#"
            INSERT INTO friend_requests (from_user_id, to_user_id)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(from_user_id)
        .bind(to_user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(request)
    }

    async fn mark_accepted(&self, request_id: &Uuid) -> Result<bool, error::SystemError> {
        // Conditional update keeps a racing double-accept from looking like
        // a second success.
        let rows = sqlx::query(
            "UPDATE friend_requests SET accepted = true WHERE id = $1 AND accepted = false",
        )
        .bind(request_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows > 0)
    }

    async fn delete(&self, request_id: &Uuid) -> Result<(), error::SystemError> {
        sqlx::query("DELETE FROM friend_requests WHERE id = $1")
            .bind(request_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn find_pending_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<PendingRequestResponse>, error::SystemError> {
        let rows = sqlx::query_as::<_, PendingRequestRow>(
            r#"
            SELECT
                fr.id AS req_id,
                u.id AS user_id,
                u.username,
                u.email,
                u.first_name,
                u.last_name,
                fr.accepted,
                fr.created_at
            FROM friend_requests fr
            JOIN users u
                ON fr.from_user_id = u.id
            WHERE fr.to_user_id = $1
              AND fr.accepted = false
            ORDER BY fr.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PendingRequestResponse::from).collect())
    }
}

#[async_trait::async_trait]
impl FriendshipRepository for FriendRepositoryPg {
    async fn find_friends(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friends = sqlx::query_as::<_, FriendResponse>(
            r#"
        SELECT DISTINCT
            u.id,
            u.username,
            u.email,
            u.first_name,
            u.last_name
        FROM friend_requests fr
        JOIN users u
            ON u.id = CASE
                WHEN fr.from_user_id = $1 THEN fr.to_user_id
                ELSE fr.from_user_id
            END
        WHERE fr.accepted = true
          AND (fr.from_user_id = $1 OR fr.to_user_id = $1)
          AND u.id <> $1
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(friends)
    }
}

impl FriendRepo for FriendRepositoryPg {}
