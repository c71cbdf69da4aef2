use team_dashboard::{Config, sweep_expired_sessions};
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    if json_format {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let mut args = std::env::args();
    let bin_name = args.next().unwrap_or_else(|| "session-sweep".to_string());
    if args.next().is_some() {
        eprintln!("Usage: {bin_name}");
        std::process::exit(2);
    }

    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Failed to load configuration: {err}");
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level, config.logging.json_format);

    match sweep_expired_sessions(&config).await {
        Ok(result) => {
            tracing::info!(sessions_deleted = result.sessions_deleted, "expired session sweep completed");
            println!("Expired session sweep completed: sessions_deleted={}", result.sessions_deleted);
        }
        Err(err) => {
            eprintln!("Session sweep failed: {err}");
            std::process::exit(1);
        }
    }
}
