use rocket::data::{ByteUnit, Data, FromData, Outcome};
use rocket::http::Status;
use rocket::request::Request;
use rocket::serde::json::Json;
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::RequestBody;
use rocket_okapi::request::OpenApiFromData;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use std::ops::Deref;
use tracing::warn;

const DEFAULT_JSON_LIMIT: ByteUnit = ByteUnit::Mebibyte(1);

/// A custom JSON wrapper that logs why a body was rejected.
///
/// Unlike Rocket's built-in `Json`, unreadable or malformed bodies are answered
/// with `400 Bad Request` (the API catcher turns that into `{"error": ...}`),
/// and the parse failure is logged with its line, column and category. An
/// empty body is read as an empty object.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

impl<T> JsonBody<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for JsonBody<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[rocket::async_trait]
impl<'r, T: DeserializeOwned> FromData<'r> for JsonBody<T> {
    type Error = serde_json::Error;

    async fn from_data(req: &'r Request<'_>, data: Data<'r>) -> Outcome<'r, Self> {
        let limit = req.limits().get("json").unwrap_or(DEFAULT_JSON_LIMIT);

        let bytes = match data.open(limit).into_bytes().await {
            Ok(bytes) if bytes.is_complete() => bytes.into_inner(),
            Ok(_) => {
                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    "JSON payload exceeded size limit"
                );
                return Outcome::Error((
                    Status::PayloadTooLarge,
                    serde_json::Error::io(std::io::Error::other("payload too large")),
                ));
            }
            Err(e) => {
                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    error = %e,
                    "Failed to read request body"
                );
                return Outcome::Error((Status::BadRequest, serde_json::Error::io(e)));
            }
        };

        // An empty body reads as `{}` so handlers report the missing fields themselves.
        let bytes = if bytes.iter().all(u8::is_ascii_whitespace) { b"{}".to_vec() } else { bytes };

        match serde_json::from_slice::<T>(&bytes) {
            Ok(value) => Outcome::Success(JsonBody(value)),
            Err(e) => {
                let body_preview = String::from_utf8_lossy(&bytes);
                let body_preview: String = body_preview.chars().take(500).collect();

                warn!(
                    method = %req.method(),
                    uri = %req.uri(),
                    error_message = %e,
                    error_line = e.line(),
                    error_column = e.column(),
                    error_category = ?e.classify(),
                    request_body = %body_preview,
                    "Failed to parse JSON request body"
                );

                Outcome::Error((Status::BadRequest, e))
            }
        }
    }
}

impl<'r, T: JsonSchema + DeserializeOwned> OpenApiFromData<'r> for JsonBody<T> {
    fn request_body(generator: &mut OpenApiGenerator) -> rocket_okapi::Result<RequestBody> {
        <Json<T> as OpenApiFromData<'r>>::request_body(generator)
    }
}
