use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use sender::config::{parse_instant, Config};
use sender::generate::ReadingGenerator;
use sender::schedule::Schedule;
use sender::send::{ApiClient, SendStats};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "sender")]
#[command(about = "Synthetic EMS telemetry sender")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    config: ConfigArgs,

    /// Random seed; omitted means OS entropy
    #[arg(long, env = "EMS_SEED")]
    seed: Option<u64>,

    /// Request timeout in seconds
    #[arg(long, env = "EMS_TIMEOUT_SECS", default_value_t = 30)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ConfigArgs {
    /// Target API endpoint
    #[arg(
        long,
        env = "EMS_API_URL",
        default_value = "https://technode.co.in/TECHNODE_IOT/apis/ems_api.php"
    )]
    api_url: String,

    /// Unit identifier embedded in every envelope
    #[arg(long, env = "EMS_DEVICE_ID", default_value = "TN-862360078628612")]
    device_id: String,

    /// Location label embedded in every envelope
    #[arg(long, env = "EMS_LOCATION", default_value = "TECHNODE OFFICE")]
    location: String,

    /// First instant to send, local time
    #[arg(
        long,
        env = "EMS_START",
        value_parser = parse_instant,
        default_value = "2025-10-01T00:00:00"
    )]
    start: NaiveDateTime,

    /// Last instant to send, local time
    #[arg(
        long,
        env = "EMS_END",
        value_parser = parse_instant,
        default_value = "2025-10-26T23:59:00"
    )]
    end: NaiveDateTime,

    /// Minutes between data points
    #[arg(long, env = "EMS_INTERVAL_MINUTES", default_value_t = 2)]
    interval_minutes: u32,

    /// Pause between requests in milliseconds
    #[arg(long, env = "EMS_PAUSE_MS", default_value_t = 50)]
    pause_ms: u64,

    /// Local-time offset from UTC in minutes (330 for IST)
    #[arg(long, env = "EMS_UTC_OFFSET_MINUTES", default_value_t = 0)]
    utc_offset_minutes: i32,
}

impl From<ConfigArgs> for Config {
    fn from(args: ConfigArgs) -> Self {
        Config {
            api_url: args.api_url,
            device_id: args.device_id,
            location: args.location,
            start: args.start,
            end: args.end,
            interval_minutes: args.interval_minutes,
            pause_ms: args.pause_ms,
            utc_offset_minutes: args.utc_offset_minutes,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Send the full start..end range sequentially
    Run,
    /// Send one envelope for the current time to verify the endpoint
    Probe,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let config: Config = cli.config.into();
    config.validate()?;

    let client = ApiClient::new(&config.api_url, Duration::from_secs(cli.timeout_secs))?;
    let mut generator = match cli.seed {
        Some(seed) => ReadingGenerator::new(seed),
        None => ReadingGenerator::from_entropy(),
    };

    match cli.command {
        Commands::Run => run_range(&config, &client, &mut generator).await,
        Commands::Probe => probe(&config, &client, &mut generator).await,
    }
}

async fn run_range(
    config: &Config,
    client: &ApiClient,
    generator: &mut ReadingGenerator,
) -> Result<()> {
    let schedule = Schedule::new(config.start, config.end, config.interval_minutes)?;
    let total = schedule.len();

    info!("Starting EMS data sender");
    info!("Unit: {} at {}", config.device_id, config.location);
    info!(
        "Range: {} to {}, every {} minutes",
        config.start, config.end, config.interval_minutes
    );
    info!(
        "Total data points to send: {} ({} meter readings)",
        total,
        total * 2
    );

    let stats = SendStats::new();
    let pause = Duration::from_millis(config.pause_ms);

    for (i, instant) in schedule.iter().enumerate() {
        let envelope = generator.envelope(config, instant);
        let outcome = client.send(&envelope).await;
        stats.record(&outcome);

        if outcome.success {
            info!("[{}/{}] {} - success", i + 1, total, outcome.timestamp);
        } else {
            warn!(
                "[{}/{}] {} - failed: {}",
                i + 1,
                total,
                outcome.timestamp,
                outcome.error.as_deref().unwrap_or("unknown")
            );
        }

        if (i + 1) % 100 == 0 {
            info!(
                "Progress: {}/{} ({:.1}%), success: {}, failed: {}",
                i + 1,
                total,
                (i + 1) as f64 / total as f64 * 100.0,
                stats.successful.load(Ordering::Relaxed),
                stats.failed.load(Ordering::Relaxed)
            );
        }

        if i + 1 < total {
            tokio::time::sleep(pause).await;
        }
    }

    info!("Transmission complete");
    info!(
        "Total: {}, successful: {}, failed: {}",
        total,
        stats.successful.load(Ordering::Relaxed),
        stats.failed.load(Ordering::Relaxed)
    );
    info!("Success rate: {:.2}%", stats.success_rate());

    Ok(())
}

async fn probe(
    config: &Config,
    client: &ApiClient,
    generator: &mut ReadingGenerator,
) -> Result<()> {
    let now = config.local_now();
    info!("Probing {} with one envelope at {}", client.api_url(), now);

    let envelope = generator.envelope(config, now);
    let outcome = client.send(&envelope).await;

    if outcome.success {
        info!("Endpoint accepted the probe");
        if let Some(response) = &outcome.response {
            info!("Response: {}", response);
        }
        Ok(())
    } else {
        anyhow::bail!(
            "Probe failed: {}",
            outcome.error.as_deref().unwrap_or("unknown")
        )
    }
}
