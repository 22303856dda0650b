use crate::client::ReadingsClient;
use crate::metrics::{
    POLLS_TOTAL, POLL_FAILURES_TOTAL, POLL_LATENCY_SECONDS, POLL_OVERLAPS_TOTAL,
    POLL_SUCCESSES_TOTAL, READINGS_IN_SNAPSHOT,
};
use crate::state::Snapshot;
use chrono::Local;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Drives the fetch cycle until `shutdown` resolves.
///
/// Every tick spawns its own fetch. A new fetch is started even when the
/// previous one has not finished, so slow responses can overlap and the
/// last one to complete wins. Overlaps are counted and logged, not
/// prevented. Shutdown stops the timer only; fetches already in flight run
/// to completion on their own.
pub async fn run_poller<F>(
    client: ReadingsClient,
    poll_interval: Duration,
    tx: watch::Sender<Snapshot>,
    shutdown: F,
) where
    F: Future<Output = ()>,
{
    info!(
        "Starting poller for {} every {:?}",
        client.endpoint(),
        poll_interval
    );

    let in_flight = Arc::new(AtomicUsize::new(0));
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let pending = in_flight.fetch_add(1, Ordering::SeqCst);
                if pending > 0 {
                    POLL_OVERLAPS_TOTAL.inc();
                    warn!(
                        "Starting fetch while {} earlier fetch(es) still in flight",
                        pending
                    );
                }

                let client = client.clone();
                let tx = tx.clone();
                let in_flight = Arc::clone(&in_flight);
                tokio::spawn(async move {
                    poll_once(&client, &tx).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                });
            }

            _ = &mut shutdown => {
                info!("Shutdown requested, stopping poll timer");
                break;
            }
        }
    }

    let pending = in_flight.load(Ordering::SeqCst);
    if pending > 0 {
        debug!("{} fetch(es) still in flight at shutdown", pending);
    }
    info!("Poller stopped");
}

/// Runs one fetch and publishes the resulting snapshot.
///
/// Returns `true` when the fetch succeeded.
pub async fn poll_once(client: &ReadingsClient, tx: &watch::Sender<Snapshot>) -> bool {
    POLLS_TOTAL.inc();
    let start = Instant::now();

    match client.fetch().await {
        Ok(readings) => {
            let elapsed = start.elapsed().as_secs_f64();
            POLL_LATENCY_SECONDS.observe(elapsed);
            POLL_SUCCESSES_TOTAL.inc();
            READINGS_IN_SNAPSHOT.set(readings.len() as f64);
            debug!("Fetched {} readings in {:.3}s", readings.len(), elapsed);

            tx.send_replace(Snapshot::succeeded(readings, Local::now()));
            true
        }
        Err(e) => {
            POLL_FAILURES_TOTAL.inc();
            warn!("Failed to load readings from {}: {}", client.endpoint(), e);

            tx.send_modify(|snapshot| *snapshot = snapshot.failed());
            false
        }
    }
}
