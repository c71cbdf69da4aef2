use crate::auth::CurrentUser;
use crate::database::Store;
use crate::database::settings::SettingsRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::settings::{BotEnabledRequest, BotEnabledResponse};
use rocket::serde::json::Json;
use rocket::{State, get, patch};
use rocket_okapi::openapi;
use tracing::info;

/// Whether the customer-facing bot is switched on
#[openapi(tag = "Settings")]
#[get("/settings/bot_enabled")]
pub async fn get_bot_enabled(store: &State<Store>, _current_user: CurrentUser) -> Result<Json<BotEnabledResponse>, AppError> {
    let enabled = store.is_bot_enabled().await?;
    Ok(Json(BotEnabledResponse { enabled }))
}

/// Kill switch for the bot
#[openapi(tag = "Settings")]
#[patch("/settings/bot_enabled", data = "<payload>")]
pub async fn patch_bot_enabled(
    store: &State<Store>,
    current_user: CurrentUser,
    payload: JsonBody<BotEnabledRequest>,
) -> Result<Json<BotEnabledResponse>, AppError> {
    let enabled = payload.enabled.ok_or_else(|| AppError::BadRequest("enabled must be true or false".to_string()))?;

    store.set_bot_enabled(enabled).await?;

    info!(user_id = current_user.id, enabled, "bot switched");
    Ok(Json(BotEnabledResponse { enabled }))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![get_bot_enabled, patch_bot_enabled]
}
