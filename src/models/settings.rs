use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;

pub const BOT_ENABLED_KEY: &str = "bot_enabled";

#[derive(Serialize, Debug, JsonSchema)]
pub struct BotEnabledResponse {
    pub enabled: bool,
}

#[derive(Deserialize, Debug, JsonSchema)]
pub struct BotEnabledRequest {
    #[serde(default)]
    pub enabled: Option<bool>,
}

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}
