use crate::Config;
use crate::database::session::SessionStore;
use crate::db::connect_store;

#[derive(Debug, Clone, Copy)]
pub struct SweepResult {
    pub sessions_deleted: u64,
}

/// Deletes sessions whose expiry has passed. Readers already ignore them, so
/// this only reclaims space and can run at any time.
pub async fn sweep_expired_sessions(config: &Config) -> Result<SweepResult, String> {
    let store = connect_store(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let sessions_deleted = store
        .purge_expired_sessions()
        .await
        .map_err(|err| format!("Failed to purge expired sessions: {err:?}"))?;

    Ok(SweepResult { sessions_deleted })
}
