use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use sender::config::Config;
use sender::generate::ReadingGenerator;
use sender::model::Envelope;
use sender::schedule::Schedule;
use sender::send::{ApiClient, SendOutcome, SendStats};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::metrics::{
    BATCH_IN_FLIGHT, ENVELOPES_FAILED_TOTAL, ENVELOPES_SENT_TOTAL, SEND_LATENCY_SECONDS,
};

/// How many outcomes the send-all response echoes back.
const SAMPLE_SIZE: usize = 5;

/// Summary returned by the send-all route.
#[derive(Debug, Serialize)]
pub struct DispatchSummary {
    pub success: bool,
    pub total: usize,
    pub successful: u64,
    pub failed: u64,
    #[serde(rename = "successRate")]
    pub success_rate: String,
    pub sample: Vec<SendOutcome>,
}

/// Sends every scheduled envelope in bounded concurrent batches with a
/// short pause between batches.
pub async fn send_all(
    config: &Config,
    client: &ApiClient,
    batch_size: usize,
    batch_pause: Duration,
) -> Result<DispatchSummary, sender::errors::Error> {
    let schedule = Schedule::new(config.start, config.end, config.interval_minutes)?;
    let total = schedule.len();
    info!("Dispatching {} envelopes in batches of {}", total, batch_size);

    // One generator driven sequentially keeps the draw order well defined
    // even though the sends fan out.
    let mut generator = ReadingGenerator::from_entropy();
    let envelopes: Vec<Envelope> = schedule
        .iter()
        .map(|t| generator.envelope(config, t))
        .collect();

    let stats = Arc::new(SendStats::new());
    let mut sample = Vec::with_capacity(SAMPLE_SIZE);

    for batch in envelopes.chunks(batch_size.max(1)) {
        let outcomes = send_batch(client, batch, &stats).await;
        for outcome in outcomes {
            if sample.len() < SAMPLE_SIZE {
                sample.push(outcome);
            }
        }
        tokio::time::sleep(batch_pause).await;
    }

    let successful = stats.successful.load(Ordering::Relaxed);
    let failed = stats.failed.load(Ordering::Relaxed);
    info!("Dispatch complete: {}/{} successful", successful, total);

    Ok(DispatchSummary {
        success: true,
        total,
        successful,
        failed,
        success_rate: format!("{:.2}%", stats.success_rate()),
        sample,
    })
}

/// Fans one batch out concurrently, tallying outcomes as they land.
async fn send_batch(
    client: &ApiClient,
    batch: &[Envelope],
    stats: &Arc<SendStats>,
) -> Vec<SendOutcome> {
    BATCH_IN_FLIGHT.set(batch.len() as f64);

    let mut in_flight = JoinSet::new();
    for envelope in batch {
        let client = client.clone();
        let envelope = envelope.clone();
        let stats = stats.clone();

        in_flight.spawn(async move {
            let started = Instant::now();
            let outcome = client.send(&envelope).await;
            SEND_LATENCY_SECONDS.observe(started.elapsed().as_secs_f64());
            stats.record(&outcome);

            if outcome.success {
                ENVELOPES_SENT_TOTAL.inc();
                debug!("{} - success", outcome.timestamp);
            } else {
                ENVELOPES_FAILED_TOTAL.inc();
                warn!(
                    "{} - failed: {}",
                    outcome.timestamp,
                    outcome.error.as_deref().unwrap_or("unknown")
                );
            }
            outcome
        });
    }

    let mut outcomes = Vec::with_capacity(batch.len());
    while let Some(joined) = in_flight.join_next().await {
        match joined {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => warn!("Send task failed: {}", e),
        }
    }

    BATCH_IN_FLIGHT.set(0.0);

    // Completion order is arbitrary; report the sample in schedule order.
    outcomes.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    outcomes
}
