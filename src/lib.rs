pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod shell;
pub mod state;
pub mod users;

pub use config::AppConfig;
pub use state::AppState;

/// Install the global subscriber. `RUST_LOG` sets the filter and
/// `LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "adminboard=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}
