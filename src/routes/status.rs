use crate::auth::CurrentUser;
use crate::config::Config;
use crate::models::status::SystemStatus;
use crate::service::status::fetch_system_status;
use rocket::serde::json::Json;
use rocket::{State, get};
use rocket_okapi::openapi;

/// Gateway reachability; degrades to `live: false` instead of failing
#[openapi(tag = "Status")]
#[get("/status")]
pub async fn get_status(config: &State<Config>, http: &State<reqwest::Client>, _current_user: CurrentUser) -> Json<SystemStatus> {
    Json(fetch_system_status(http, &config.gateway).await)
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![get_status]
}
