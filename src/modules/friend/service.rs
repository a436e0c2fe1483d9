use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        friend::{
            model::{FriendResponse, PendingRequestResponse, RespondAction},
            repository::FriendRepo,
            schema::FriendRequestEntity,
        },
        user::repository::UserRepository,
    },
};

/// At most this many requests may be created per sender inside the trailing
/// window. The 4th within 60 seconds is rejected.
pub const RATE_LIMIT_MAX_REQUESTS: i64 = 3;
pub const RATE_LIMIT_WINDOW_SECS: i64 = 60;

#[derive(Clone)]
pub struct FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    friend_repo: Arc<R>,
    user_repo: Arc<U>,
}

impl<R, U> FriendService<R, U>
where
    R: FriendRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(friend_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        FriendService { friend_repo, user_repo }
    }

    /// Creates a pending request after the target-exists, rate-limit and
    /// uniqueness checks, in that order. The uniqueness check is directional:
    /// an opposite-direction request does not block a new one.
    pub async fn send_friend_request(
        &self,
        sender_id: Uuid,
        receiver_id: Uuid,
    ) -> Result<FriendRequestEntity, error::SystemError> {
        if self.user_repo.find_by_id(&receiver_id).await?.is_none() {
            return Err(error::SystemError::not_found("User not found"));
        }

        let window_start = Utc::now() - Duration::seconds(RATE_LIMIT_WINDOW_SECS);
        let recent = self.friend_repo.count_sent_since(&sender_id, window_start).await?;
        if recent >= RATE_LIMIT_MAX_REQUESTS {
            return Err(error::SystemError::too_many_requests(
                "You can only send 3 friend requests per minute",
            ));
        }

        if self.friend_repo.find_directional(&sender_id, &receiver_id).await?.is_some() {
            return Err(error::SystemError::conflict("Friend request already sent"));
        }

        let request = self.friend_repo.create(&sender_id, &receiver_id).await?;

        Ok(request)
    }

    /// Accept flips the request to its terminal accepted state, which is what
    /// materializes the symmetric friendship (friend lists are derived from
    /// accepted requests). Reject deletes the row permanently; the pair may
    /// request again afterward. The action string is only validated after the
    /// not-found, permission and already-accepted checks.
    pub async fn respond_friend_request(
        &self,
        user_id: Uuid,
        request_id: Uuid,
        action: &str,
    ) -> Result<RespondAction, error::SystemError> {
        let request = self
            .friend_repo
            .find_by_id(&request_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Friend request not found"))?;

        if request.to_user_id != user_id {
            return Err(error::SystemError::forbidden("Permission denied"));
        }

        if request.accepted {
            return Err(error::SystemError::conflict(
                "Friend request has already been accepted",
            ));
        }

        match action {
            "accept" => {
                if !self.friend_repo.mark_accepted(&request_id).await? {
                    return Err(error::SystemError::conflict(
                        "Friend request has already been accepted",
                    ));
                }
                Ok(RespondAction::Accept)
            }
            "reject" => {
                self.friend_repo.delete(&request_id).await?;
                Ok(RespondAction::Reject)
            }
            _ => Err(error::SystemError::bad_request("Invalid action")),
        }
    }

    pub async fn get_pending_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PendingRequestResponse>, error::SystemError> {
        let requests = self.friend_repo.find_pending_to_user(&user_id).await?;
        Ok(requests)
    }

    pub async fn get_friends(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FriendResponse>, error::SystemError> {
        let friends = self.friend_repo.find_friends(&user_id).await?;
        Ok(friends)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::friend::repository::{FriendRequestRepository, FriendshipRepository};
    use crate::modules::user::model::InsertUser;
    use crate::modules::user::schema::UserEntity;
    use chrono::DateTime;
    use std::sync::Mutex;

    /// Users and the request ledger behind both repository interfaces, so a
    /// single store drives the whole workflow.
    struct InMemoryStore {
        users: Mutex<Vec<UserEntity>>,
        requests: Mutex<Vec<FriendRequestEntity>>,
    }

    impl InMemoryStore {
        fn new() -> Self {
            Self { users: Mutex::new(Vec::new()), requests: Mutex::new(Vec::new()) }
        }

        fn add_user(&self, name: &str) -> Uuid {
            let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
            self.users.lock().unwrap().push(UserEntity {
                id,
                username: format!("{name}@example.com"),
                email: format!("{name}@example.com"),
                hash_password: String::new(),
                first_name: name.to_string(),
                last_name: String::new(),
                created_at: Utc::now(),
            });
            id
        }

        fn add_request_at(&self, from: Uuid, to: Uuid, created_at: DateTime<Utc>) {
            self.requests.lock().unwrap().push(FriendRequestEntity {
                id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
                from_user_id: from,
                to_user_id: to,
                accepted: false,
                created_at,
            });
        }
    }

    #[async_trait::async_trait]
    impl UserRepository for InMemoryStore {
        async fn find_by_id(
            &self,
            id: &Uuid,
        ) -> Result<Option<UserEntity>, error::SystemError> {
            Ok(self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned())
        }

        async fn find_by_email(
            &self,
            _email: &str,
        ) -> Result<Option<UserEntity>, error::SystemError> {
            unimplemented!()
        }

        async fn create(&self, _user: &InsertUser) -> Result<Uuid, error::SystemError> {
            unimplemented!()
        }

        async fn search(&self, _query: &str) -> Result<Vec<UserEntity>, error::SystemError> {
            unimplemented!()
        }
    }

    #[async_trait::async_trait]
    impl FriendRequestRepository for InMemoryStore {
        async fn find_by_id(
            &self,
            request_id: &Uuid,
        ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
            Ok(self.requests.lock().unwrap().iter().find(|r| r.id == *request_id).cloned())
        }

        async fn find_directional(
            &self,
            from_user_id: &Uuid,
            to_user_id: &Uuid,
        ) -> Result<Option<FriendRequestEntity>, error::SystemError> {
            Ok(self
                .requests
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.from_user_id == *from_user_id && r.to_user_id == *to_user_id)
                .cloned())
        }

        async fn count_sent_since(
            &self,
            from_user_id: &Uuid,
            since: DateTime<Utc>,
        ) -> Result<i64, error::SystemError> {
            Ok(self
                .requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.from_user_id == *from_user_id && r.created_at >= since)
                .count() as i64)
        }

        async fn create(
            &self,
            from_user_id: &Uuid,
            to_user_id: &Uuid,
        ) -> Result<FriendRequestEntity, error::SystemError> {
            let request = FriendRequestEntity {
                id: Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext)),
                from_user_id: *from_user_id,
                to_user_id: *to_user_id,
                accepted: false,
                created_at: Utc::now(),
            };
            self.requests.lock().unwrap().push(request.clone());
            Ok(request)
        }

        async fn mark_accepted(&self, request_id: &Uuid) -> Result<bool, error::SystemError> {
            let mut requests = self.requests.lock().unwrap();
            match requests.iter_mut().find(|r| r.id == *request_id && !r.accepted) {
                Some(r) => {
                    r.accepted = true;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete(&self, request_id: &Uuid) -> Result<(), error::SystemError> {
            self.requests.lock().unwrap().retain(|r| r.id != *request_id);
            Ok(())
        }

        async fn find_pending_to_user(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<PendingRequestResponse>, error::SystemError> {
            let users = self.users.lock().unwrap();
            Ok(self
                .requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.to_user_id == *user_id && !r.accepted)
                .map(|r| {
                    let sender = users.iter().find(|u| u.id == r.from_user_id).unwrap();
                    PendingRequestResponse {
                        id: r.id,
                        from_user: FriendResponse::from(sender.clone()),
                        timestamp: r.created_at,
                        accepted: r.accepted,
                    }
                })
                .collect())
        }
    }

    #[async_trait::async_trait]
    impl FriendshipRepository for InMemoryStore {
        async fn find_friends(
            &self,
            user_id: &Uuid,
        ) -> Result<Vec<FriendResponse>, error::SystemError> {
            let users = self.users.lock().unwrap();
            let mut seen: Vec<Uuid> = Vec::new();
            let mut friends = Vec::new();
            for r in self.requests.lock().unwrap().iter() {
                if !r.accepted || (r.from_user_id != *user_id && r.to_user_id != *user_id) {
                    continue;
                }
                let other =
                    if r.from_user_id == *user_id { r.to_user_id } else { r.from_user_id };
                if other == *user_id || seen.contains(&other) {
                    continue;
                }
                seen.push(other);
                let user = users.iter().find(|u| u.id == other).unwrap();
                friends.push(FriendResponse::from(user.clone()));
            }
            Ok(friends)
        }
    }

    impl FriendRepo for InMemoryStore {}

    fn service(store: Arc<InMemoryStore>) -> FriendService<InMemoryStore, InMemoryStore> {
        FriendService::with_dependencies(store.clone(), store)
    }

    #[actix_web::test]
    async fn send_to_unknown_user_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let svc = service(store);

        let ghost = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        let err = svc.send_friend_request(a, ghost).await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
    }

    #[actix_web::test]
    async fn fourth_request_in_window_is_rate_limited() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let targets: Vec<Uuid> = ["b", "c", "d", "e"].iter().map(|n| store.add_user(n)).collect();
        let svc = service(store);

        for target in &targets[..3] {
            svc.send_friend_request(a, *target).await.unwrap();
        }
        let err = svc.send_friend_request(a, targets[3]).await.unwrap_err();
        assert!(matches!(err, error::SystemError::TooManyRequests(_)));
    }

    #[actix_web::test]
    async fn requests_outside_window_do_not_count() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let b = store.add_user("b");
        let old = Utc::now() - Duration::seconds(RATE_LIMIT_WINDOW_SECS + 30);
        for n in ["x", "y", "z"] {
            let other = store.add_user(n);
            store.add_request_at(a, other, old);
        }
        let svc = service(store);

        svc.send_friend_request(a, b).await.unwrap();
    }

    #[actix_web::test]
    async fn duplicate_direction_conflicts_but_reverse_succeeds() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let b = store.add_user("b");
        let svc = service(store);

        svc.send_friend_request(a, b).await.unwrap();
        let err = svc.send_friend_request(a, b).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));

        // The uniqueness check is directional: b -> a is a new pair.
        svc.send_friend_request(b, a).await.unwrap();
    }

    #[actix_web::test]
    async fn accept_materializes_symmetric_friendship() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let b = store.add_user("b");
        let svc = service(store);

        let request = svc.send_friend_request(a, b).await.unwrap();
        let action = svc.respond_friend_request(b, request.id, "accept").await.unwrap();
        assert_eq!(action, RespondAction::Accept);

        let friends_of_a = svc.get_friends(a).await.unwrap();
        let friends_of_b = svc.get_friends(b).await.unwrap();
        assert!(friends_of_a.iter().any(|f| f.id == b));
        assert!(friends_of_b.iter().any(|f| f.id == a));
        assert!(svc.get_pending_requests(b).await.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn reject_deletes_the_request() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let b = store.add_user("b");
        let svc = service(store);

        let request = svc.send_friend_request(a, b).await.unwrap();
        let action = svc.respond_friend_request(b, request.id, "reject").await.unwrap();
        assert_eq!(action, RespondAction::Reject);

        assert!(svc.get_pending_requests(b).await.unwrap().is_empty());
        assert!(svc.get_friends(a).await.unwrap().is_empty());
        assert!(svc.get_friends(b).await.unwrap().is_empty());

        // The record is gone, so responding again is not-found and the pair
        // may request again.
        let err = svc.respond_friend_request(b, request.id, "accept").await.unwrap_err();
        assert!(matches!(err, error::SystemError::NotFound(_)));
        svc.send_friend_request(a, b).await.unwrap();
    }

    #[actix_web::test]
    async fn non_recipient_cannot_respond() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let b = store.add_user("b");
        let c = store.add_user("c");
        let svc = service(store);

        let request = svc.send_friend_request(a, b).await.unwrap();

        // Permission is checked before the action value, so even a valid
        // action fails and so does an invalid one.
        let err = svc.respond_friend_request(c, request.id, "accept").await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
        let err = svc.respond_friend_request(a, request.id, "bogus").await.unwrap_err();
        assert!(matches!(err, error::SystemError::Forbidden(_)));
    }

    #[actix_web::test]
    async fn responding_to_accepted_request_conflicts() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let b = store.add_user("b");
        let svc = service(store);

        let request = svc.send_friend_request(a, b).await.unwrap();
        svc.respond_friend_request(b, request.id, "accept").await.unwrap();

        let err = svc.respond_friend_request(b, request.id, "reject").await.unwrap_err();
        assert!(matches!(err, error::SystemError::Conflict(_)));
    }

    #[actix_web::test]
    async fn invalid_action_is_bad_request() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let b = store.add_user("b");
        let svc = service(store);

        let request = svc.send_friend_request(a, b).await.unwrap();
        let err = svc.respond_friend_request(b, request.id, "block").await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
    }

    #[actix_web::test]
    async fn pending_lists_only_unaccepted_requests_to_caller() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let b = store.add_user("b");
        let c = store.add_user("c");
        let svc = service(store);

        let from_a = svc.send_friend_request(a, b).await.unwrap();
        let from_c = svc.send_friend_request(c, b).await.unwrap();
        svc.send_friend_request(a, c).await.unwrap();

        svc.respond_friend_request(b, from_a.id, "accept").await.unwrap();

        let pending = svc.get_pending_requests(b).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, from_c.id);
        assert_eq!(pending[0].from_user.id, c);
        assert!(!pending[0].accepted);
    }

    #[actix_web::test]
    async fn self_request_never_appears_in_friend_list() {
        let store = Arc::new(InMemoryStore::new());
        let a = store.add_user("a");
        let svc = service(store);

        // Self-requests are not blocked on send; the friend list excludes
        // the caller's own id defensively.
        let request = svc.send_friend_request(a, a).await.unwrap();
        svc.respond_friend_request(a, request.id, "accept").await.unwrap();

        assert!(svc.get_friends(a).await.unwrap().is_empty());
    }
}
