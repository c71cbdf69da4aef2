use crate::auth::CurrentUser;
use crate::database::Store;
use crate::database::user::UserRepository;
use crate::error::app_error::AppError;
use crate::models::user::UserResponse;
use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

/// People a ticket can be assigned to
#[openapi(tag = "Users")]
#[get("/users")]
pub async fn list_users(store: &State<Store>, _current_user: CurrentUser) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = store.list_users().await?;
    Ok(Json(users.iter().map(UserResponse::from).collect()))
}

/// The signed-in user
#[openapi(tag = "Users")]
#[get("/users/me")]
pub async fn get_me(store: &State<Store>, current_user: CurrentUser) -> Result<Json<UserResponse>, AppError> {
    let user = store
        .get_user_by_id(current_user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    Ok(Json(UserResponse::from(&user)))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![list_users, get_me]
}
