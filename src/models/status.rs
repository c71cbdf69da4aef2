use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use serde_json::Value;

/// Reachability of the gateway as shown on the dashboard.
#[derive(Serialize, Debug, Clone, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub live: bool,
    pub sessions_count: Option<i64>,
    pub message: String,
}

impl SystemStatus {
    pub fn down(message: impl Into<String>) -> Self {
        Self {
            live: false,
            sessions_count: None,
            message: message.into(),
        }
    }
}

/// Body of the gateway's own `/api/status` endpoint. Fields are read loosely:
/// a value of an unexpected type counts as absent.
#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct GatewayStatusBody {
    #[serde(default)]
    pub gateway: Option<Value>,
    #[serde(default)]
    pub sessions_count: Option<Value>,
}

impl GatewayStatusBody {
    pub fn reachable(&self) -> bool {
        self.gateway
            .as_ref()
            .and_then(|gateway| gateway.get("reachable"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn sessions_count(&self) -> Option<i64> {
        match self.sessions_count.as_ref()? {
            Value::Number(number) => number
                .as_i64()
                .or_else(|| number.as_f64().filter(|n| n.fract() == 0.0 && n.abs() < 9.0e15).map(|n| n as i64)),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<GatewayStatusBody> for SystemStatus {
    fn from(body: GatewayStatusBody) -> Self {
        let live = body.reachable();
        let message = if live { "Gateway reachable" } else { "Gateway not reachable" };

        Self {
            live,
            sessions_count: body.sessions_count(),
            message: message.to_string(),
        }
    }
}
