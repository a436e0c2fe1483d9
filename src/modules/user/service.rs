use log::info;
use std::sync::Arc;
use validator::ValidateEmail;

use crate::api::error;
use crate::modules::user::model::{InsertUser, SignInModel, SignUpModel, UserResponse};
use crate::modules::user::repository::UserRepository;
use crate::utils::{hash_password, verify_password, Claims};
use crate::ENV;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
}

impl UserService {
    pub fn with_dependencies(repo: Arc<dyn UserRepository + Send + Sync>) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo }
    }

    /// Creates an account with `username` set to the email. Checks run in a
    /// fixed order: email format, email uniqueness (case-insensitive),
    /// password length. Nothing is persisted on a failed check.
    pub async fn sign_up(&self, user: SignUpModel) -> Result<UserResponse, error::SystemError> {
        if !user.email.validate_email() {
            return Err(error::SystemError::bad_request("Invalid email format"));
        }

        if self.repo.find_by_email(&user.email).await?.is_some() {
            return Err(error::SystemError::conflict("Email already exists"));
        }

        if user.password.len() < MIN_PASSWORD_LEN {
            return Err(error::SystemError::bad_request(
                "Password must be at least 6 characters long",
            ));
        }

        let hash_password = hash_password(&user.password)?;

        let new_user = InsertUser {
            username: user.email.clone(),
            email: user.email,
            hash_password,
            first_name: user.first_name.unwrap_or_default(),
            last_name: user.last_name.unwrap_or_default(),
        };

        let user_id = self.repo.create(&new_user).await?;

        Ok(UserResponse {
            id: user_id,
            username: new_user.username,
            email: new_user.email,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
        })
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<String, error::SystemError> {
        let user_entity = self
            .repo
            .find_by_email(&user.email)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid email or password"))?;

        let valid = verify_password(&user_entity.hash_password, &user.password)?;
        if !valid {
            return Err(error::SystemError::unauthorized("Invalid email or password"));
        }

        let access_token = Claims::new(&user_entity.id, ENV.access_token_expiration)
            .encode(ENV.jwt_secret.as_ref())?;

        Ok(access_token)
    }

    /// Empty query short-circuits to an empty set without touching the store.
    pub async fn search(&self, query: &str) -> Result<Vec<UserResponse>, error::SystemError> {
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let users = self.repo.search(query).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }
}
