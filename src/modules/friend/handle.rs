use actix_web::{get, post, put, web, HttpRequest};
use uuid::Uuid;

use crate::{
    api::{error, success},
    middlewares::get_claims,
    modules::{
        friend::{
            model::{
                FriendResponse, PendingRequestResponse, RespondAction, RespondRequestBody,
                SendRequestBody, SendRequestResponse,
            },
            repository_pg::FriendRepositoryPg,
            service::FriendService,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::ValidatedJson,
};

pub type FriendSvc = FriendService<FriendRepositoryPg, UserRepositoryPg>;

#[post("/requests")]
pub async fn send_friend_request(
    friend_service: web::Data<FriendSvc>,
    body: ValidatedJson<SendRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<SendRequestResponse>, error::Error> {
    let sender_id = get_claims(&req)?.sub;
    let request = friend_service.send_friend_request(sender_id, body.0.user_id).await?;

    Ok(success::Success::created(Some(SendRequestResponse { friend_request_id: request.id }))
        .message("Friend request sent"))
}

#[put("/requests/{request_id}")]
pub async fn respond_friend_request(
    friend_service: web::Data<FriendSvc>,
    request_id: web::Path<Uuid>,
    body: ValidatedJson<RespondRequestBody>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let receiver_id = get_claims(&req)?.sub;
    let action =
        friend_service.respond_friend_request(receiver_id, *request_id, &body.0.action).await?;

    let message = match action {
        RespondAction::Accept => "Friend request accepted",
        RespondAction::Reject => "Friend request rejected",
    };
    Ok(success::Success::ok(None).message(message))
}

#[get("/requests/pending")]
pub async fn list_pending_requests(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<PendingRequestResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let requests = friend_service.get_pending_requests(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Pending friend requests retrieved"))
}

#[get("")]
pub async fn list_friends(
    friend_service: web::Data<FriendSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FriendResponse>>, error::Error> {
    let user_id = get_claims(&req)?.sub;
    let friends = friend_service.get_friends(user_id).await?;

    Ok(success::Success::ok(Some(friends)).message("Friends retrieved successfully"))
}
