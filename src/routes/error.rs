use rocket::serde::Serialize;
use rocket::serde::json::Json;
use rocket::{Request, catch};

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ErrorBody {
    pub error: String,
}

fn error_body(message: &str) -> Json<ErrorBody> {
    Json(ErrorBody { error: message.to_string() })
}

#[catch(400)]
pub fn bad_request(_: &Request) -> Json<ErrorBody> {
    error_body("invalid request body")
}

#[catch(401)]
pub fn unauthorized(_: &Request) -> Json<ErrorBody> {
    error_body("unauthorized")
}

#[catch(404)]
pub fn not_found(_: &Request) -> Json<ErrorBody> {
    error_body("not found")
}

#[catch(409)]
pub fn conflict(_: &Request) -> Json<ErrorBody> {
    error_body("conflict")
}

#[catch(413)]
pub fn payload_too_large(_: &Request) -> Json<ErrorBody> {
    error_body("request body too large")
}

#[catch(422)]
pub fn unprocessable_entity(_: &Request) -> Json<ErrorBody> {
    error_body("invalid request body")
}

#[catch(500)]
pub fn internal_error(_: &Request) -> Json<ErrorBody> {
    error_body("Internal server error")
}

pub fn catchers() -> Vec<rocket::Catcher> {
    rocket::catchers![bad_request, unauthorized, not_found, conflict, payload_too_large, unprocessable_entity, internal_error]
}
