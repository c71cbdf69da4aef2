mod auth;
mod config;
mod database;
mod db;
mod error;
mod maintenance;
mod middleware;
mod models;
mod routes;
mod service;
mod views;

#[cfg(test)]
pub mod test_utils;

pub use config::Config;
pub use maintenance::{SweepResult, sweep_expired_sessions};

use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::routes as app_routes;
use rocket::fairing::AdHoc;
use rocket::figment::{Figment, Profile};
use rocket::{Build, Rocket};
use rocket_okapi::okapi::openapi3::{OpenApi, Server};
use rocket_okapi::settings::OpenApiSettings;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};
use rocket_okapi::{get_openapi_route, okapi::merge::marge_spec_list};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const API_BASE_PATH: &str = "/api";

fn init_tracing(log_level: &str, json_format: bool) {
    // RUST_LOG takes precedence over logging.level, e.g.
    //   RUST_LOG=team_dashboard::routes=debug,info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    // A subscriber may already be installed when several rockets are built in one process.
    let _ = if json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
}

fn rocket_figment(config: &Config) -> Figment {
    let figment = rocket::Config::figment()
        .merge(("port", config.server.port))
        .merge(("address", config.server.address.clone()));

    match config.session.rocket_secret_key() {
        Some(secret_key) => figment.merge(("secret_key", secret_key)),
        None => figment,
    }
}

fn stage_http_client() -> AdHoc {
    AdHoc::try_on_ignite("HTTP client (reqwest)", |rocket| async move {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .build();

        match client {
            Ok(client) => Ok(rocket.manage(client)),
            Err(e) => {
                tracing::error!("Failed to build HTTP client: {}", e);
                Err(rocket)
            }
        }
    })
}

/// Rocket only derives a throwaway cookie key in the debug profile.
fn secret_is_required(profile: &Profile) -> bool {
    *profile != rocket::Config::DEBUG_PROFILE
}

fn stage_secret_check() -> AdHoc {
    AdHoc::try_on_ignite("Session secret", |rocket| async move {
        let secret_missing = rocket.state::<Config>().is_none_or(|config| config.session.secret.is_empty());
        if !secret_missing {
            return Ok(rocket);
        }

        let profile = rocket.figment().profile().clone();
        if secret_is_required(&profile) {
            tracing::error!(profile = %profile, "session.secret (SESSION_SECRET) must be set outside the debug profile");
            return Err(rocket);
        }

        tracing::warn!("session.secret is not set; using a throwaway debug key, session cookies will not survive a restart");
        Ok(rocket)
    })
}

fn collect_route_specs() -> Vec<(Vec<rocket::Route>, OpenApi)> {
    vec![
        app_routes::health::routes(),
        app_routes::status::routes(),
        app_routes::ticket::routes(),
        app_routes::user::routes(),
        app_routes::settings::routes(),
    ]
}

fn get_swagger_config(openapi_url: &str) -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: openapi_url.to_string(),
        ..Default::default()
    }
}

fn mount_api_routes(mut rocket: Rocket<Build>, enable_swagger: bool) -> Rocket<Build> {
    let mut openapi_list = Vec::new();
    for (routes, openapi) in collect_route_specs() {
        rocket = rocket.mount(API_BASE_PATH, routes);
        openapi_list.push(("", openapi));
    }

    if !enable_swagger {
        return rocket;
    }

    let mut openapi_docs = match marge_spec_list(&openapi_list) {
        Ok(docs) => docs,
        Err(err) => {
            tracing::error!("Could not merge OpenAPI spec, API docs disabled: {}", err);
            return rocket;
        }
    };
    openapi_docs.servers = vec![Server {
        url: API_BASE_PATH.to_string(),
        ..Default::default()
    }];

    let settings = OpenApiSettings::default();
    rocket = rocket.mount(API_BASE_PATH, vec![get_openapi_route(openapi_docs, &settings)]);

    let openapi_url = format!("{API_BASE_PATH}/openapi.json");
    rocket.mount(format!("{API_BASE_PATH}/docs"), make_swagger_ui(&get_swagger_config(&openapi_url)))
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    init_tracing(&config.logging.level, config.logging.json_format);

    let enable_swagger = config.api.enable_swagger;

    let rocket = rocket::custom(rocket_figment(&config))
        .attach(RequestLogger)
        .attach(stage_secret_check())
        .attach(stage_db(config.database.clone()))
        .attach(stage_http_client())
        .manage(config)
        .mount("/", app_routes::page::routes())
        .mount("/", app_routes::auth::routes());

    mount_api_routes(rocket, enable_swagger).register(API_BASE_PATH, app_routes::error::catchers())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{test_client, test_client_with, test_config};
    use rocket::http::Status;
    use serde_json::Value;

    #[test]
    fn secret_key_is_passed_to_rocket() {
        let mut config = test_config();
        config.server.port = 4321;

        let figment = rocket_figment(&config);
        assert_eq!(figment.extract_inner::<u16>("port").unwrap(), 4321);
        assert_eq!(figment.extract_inner::<String>("secret_key").unwrap().len(), 44);
    }

    #[test]
    fn only_debug_profile_may_run_without_secret() {
        assert!(!secret_is_required(&rocket::Config::DEBUG_PROFILE));
        assert!(secret_is_required(&rocket::Config::RELEASE_PROFILE));
        assert!(secret_is_required(&Profile::new("staging")));
    }

    #[rocket::async_test]
    async fn release_profile_refuses_to_start_without_secret() {
        let secret_key = test_config().session.rocket_secret_key().expect("derived key");
        let mut config = test_config();
        config.session.secret = String::new();

        let release = rocket::Config::figment()
            .select(rocket::Config::RELEASE_PROFILE)
            .merge(("secret_key", secret_key));
        let rocket = rocket::custom(release).manage(config.clone()).attach(stage_secret_check());
        let ignited = rocket.ignite().await;
        assert!(ignited.is_err());
        // rocket::Error panics on drop unless inspected; mark it handled.
        if let Err(error) = ignited {
            let _ = error.kind();
        }

        let debug = rocket::Config::figment().select(rocket::Config::DEBUG_PROFILE);
        let rocket = rocket::custom(debug).manage(config).attach(stage_secret_check());
        assert!(rocket.ignite().await.is_ok());
    }

    #[rocket::async_test]
    async fn openapi_document_lists_api_routes() {
        let client = test_client().await;
        let response = client.get("/api/openapi.json").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.expect("json body");
        let paths = body["paths"].as_object().expect("paths object");
        for path in ["/health", "/status", "/tickets", "/tickets/{id}/assign", "/tickets/{id}/status", "/users", "/settings/bot_enabled"] {
            assert!(paths.contains_key(path), "missing {path}");
        }
        assert_eq!(body["servers"][0]["url"], "/api");
    }

    #[rocket::async_test]
    async fn swagger_can_be_disabled() {
        let mut config = test_config();
        config.api.enable_swagger = false;
        let client = test_client_with(config).await;

        let response = client.get("/api/openapi.json").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn responses_carry_request_id_and_security_headers() {
        let client = test_client().await;
        let response = client.get("/api/health").header(rocket::http::Header::new("X-Request-Id", "probe-1")).dispatch().await;

        assert_eq!(response.headers().get_one("X-Request-Id"), Some("probe-1"));
        assert_eq!(response.headers().get_one("X-Content-Type-Options"), Some("nosniff"));
    }
}
