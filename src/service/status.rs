use crate::config::GatewayConfig;
use crate::models::status::{GatewayStatusBody, SystemStatus};
use std::time::Duration;
use tracing::{debug, warn};

/// Asks the gateway how it is doing. Never fails: any problem is reported as a
/// "down" status carrying a human-readable message.
pub async fn fetch_system_status(http: &reqwest::Client, gateway: &GatewayConfig) -> SystemStatus {
    let base = gateway.url.trim().trim_end_matches('/');
    if base.is_empty() {
        return SystemStatus::down("Gateway URL not configured");
    }

    let url = format!("{}/api/status", base);
    let response = match http.get(&url).timeout(Duration::from_secs(gateway.timeout_secs)).send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            warn!(url = %url, "gateway status request timed out");
            return SystemStatus::down("Gateway status request timed out");
        }
        Err(e) => {
            warn!(url = %url, error = %e, "gateway status request failed");
            return SystemStatus::down("Could not reach gateway");
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!(url = %url, status = %status, "gateway status returned an error");
        return SystemStatus::down(format!("Gateway returned HTTP {}", status.as_u16()));
    }

    match response.json::<GatewayStatusBody>().await {
        Ok(body) => {
            let status = SystemStatus::from(body);
            debug!(live = status.live, sessions = ?status.sessions_count, "gateway status fetched");
            status
        }
        Err(e) if e.is_timeout() => SystemStatus::down("Gateway status request timed out"),
        Err(e) => {
            warn!(url = %url, error = %e, "gateway status body unreadable");
            SystemStatus::down("Gateway returned an unreadable status")
        }
    }
}
