use actix_web::{get, post, web};

use crate::modules::user::{model, service::UserService};
use crate::utils::{ValidatedJson, ValidatedQuery};
use crate::api::{error, success};

#[post("/signup")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: web::Json<model::SignUpModel>,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let user = user_service.sign_up(user_data.into_inner()).await?;
    Ok(success::Success::created(Some(user)).message("User created successfully"))
}

#[post("/signin")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let access_token = user_service.sign_in(user_data.0).await?;
    Ok(success::Success::ok(Some(model::SignInResponse { access_token }))
        .message("Signin successful"))
}

#[get("/search")]
pub async fn search_users(
    user_service: web::Data<UserService>,
    query: ValidatedQuery<model::SearchUsersQuery>,
) -> Result<success::Success<Vec<model::UserResponse>>, error::Error> {
    let users = user_service.search(&query.0.query).await?;
    Ok(success::Success::ok(Some(users)).message("Users retrieved successfully"))
}
