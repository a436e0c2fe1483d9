use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::user::schema::UserEntity;

/// Signup input. Field checks run in the service so that the error kinds
/// keep their documented order: email format, then email uniqueness, then
/// password length.
#[derive(Deserialize)]
pub struct SignUpModel {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Deserialize, Validate)]
pub struct SignInModel {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct SearchUsersQuery {
    #[serde(default)]
    pub query: String,
}

pub struct InsertUser {
    pub username: String,
    pub email: String,
    pub hash_password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub access_token: String,
}

/// Public account fields, the only ones that ever leave the service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserResponse {
    pub id: uuid::Uuid,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            username: entity.username,
            email: entity.email,
            first_name: entity.first_name,
            last_name: entity.last_name,
        }
    }
}
