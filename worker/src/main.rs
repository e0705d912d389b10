mod dispatch;
mod metrics;
mod routes;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use sender::config::{parse_instant, Config};
use sender::send::ApiClient;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let http_addr = env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let api_url = env::var("EMS_API_URL")
        .unwrap_or_else(|_| "https://technode.co.in/TECHNODE_IOT/apis/ems_api.php".to_string());
    let device_id =
        env::var("EMS_DEVICE_ID").unwrap_or_else(|_| "TN-862360078628612".to_string());
    let location = env::var("EMS_LOCATION").unwrap_or_else(|_| "TECHNODE OFFICE".to_string());
    let start = parse_env_instant("EMS_START", "2025-10-20T00:00:00");
    let end = parse_env_instant("EMS_END", "2025-10-26T23:59:00");
    let interval_minutes: u32 = env::var("EMS_INTERVAL_MINUTES")
        .unwrap_or_else(|_| "2".to_string())
        .parse()
        .unwrap_or(2);
    let utc_offset_minutes: i32 = env::var("EMS_UTC_OFFSET_MINUTES")
        .unwrap_or_else(|_| "0".to_string())
        .parse()
        .unwrap_or(0);
    let batch_size: usize = env::var("BATCH_SIZE")
        .unwrap_or_else(|_| "50".to_string())
        .parse()
        .unwrap_or(50);
    let batch_pause_ms: u64 = env::var("BATCH_PAUSE_MS")
        .unwrap_or_else(|_| "100".to_string())
        .parse()
        .unwrap_or(100);
    let timeout_secs: u64 = env::var("EMS_TIMEOUT_SECS")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    info!("Starting EMS worker");
    info!("HTTP server: {}", http_addr);
    info!("Target endpoint: {}", api_url);
    info!(
        "Range: {} to {}, every {} minutes, batches of {}",
        start, end, interval_minutes, batch_size
    );

    metrics::init_metrics();

    let config = Config {
        api_url,
        device_id,
        location,
        start,
        end,
        interval_minutes,
        pause_ms: 0,
        utc_offset_minutes,
    };
    if let Err(e) = config.validate() {
        error!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    let client = match ApiClient::new(&config.api_url, Duration::from_secs(timeout_secs)) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let state = routes::AppState {
        config: Arc::new(config),
        client,
        batch_size,
        batch_pause_ms,
    };
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .unwrap_or_else(|e| {
            error!("Failed to bind to {}: {}", http_addr, e);
            std::process::exit(1);
        });

    info!("HTTP server listening on {}", http_addr);

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap_or_else(|e| {
            error!("HTTP server error: {}", e);
        });
    });

    tokio::select! {
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
}

fn parse_env_instant(key: &str, default: &str) -> NaiveDateTime {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    match parse_instant(&raw) {
        Ok(instant) => instant,
        Err(e) => {
            error!("Invalid {} '{}': {}", key, raw, e);
            std::process::exit(1);
        }
    }
}
