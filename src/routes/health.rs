use crate::models::health::HealthResponse;
use rocket::get;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

/// Liveness probe; does not touch the database or the gateway.
#[openapi(tag = "Health")]
#[get("/health")]
pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![healthcheck]
}
