use uuid::Uuid;

use crate::{
    api::error, modules::user::model::InsertUser, modules::user::schema::UserEntity,
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;

    /// Email lookup is case-insensitive.
    async fn find_by_email(&self, email: &str)
    -> Result<Option<UserEntity>, error::SystemError>;

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError>;

    /// Accounts whose email equals the query (case-insensitive, exact) or
    /// whose username/first name/last name contains it as a
    /// case-insensitive substring.
    async fn search(&self, query: &str) -> Result<Vec<UserEntity>, error::SystemError>;
}
