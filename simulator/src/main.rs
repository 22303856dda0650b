mod reading;

use axum::{extract::State, routing::get, Json, Router};
use chrono::Local;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use reading::{Reading, ReadingBuffer, TankModel};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

/// Serves generated water-tank readings for the dashboard to poll
#[derive(Debug, Parser)]
#[command(name = "simulator", version)]
struct Args {
    #[arg(long, env = "SIM_ADDR", default_value = "127.0.0.1:3000")]
    addr: SocketAddr,

    /// Milliseconds between generated readings
    #[arg(
        long,
        env = "SIM_INTERVAL_MS",
        default_value_t = 2000,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    interval_ms: u64,

    /// Readings kept and served
    #[arg(long, env = "SIM_CAPACITY", default_value_t = 50)]
    capacity: usize,

    /// Seed for reproducible readings
    #[arg(long, env = "SIM_SEED")]
    seed: Option<u64>,

    #[arg(long, env = "SIM_INITIAL_LEVEL", default_value_t = 60.0)]
    initial_level: f64,
}

type SharedBuffer = Arc<RwLock<ReadingBuffer>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting water-tank simulator");
    info!(
        "Address: {}, Interval: {}ms, Capacity: {}",
        args.addr, args.interval_ms, args.capacity
    );

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let buffer: SharedBuffer = Arc::new(RwLock::new(ReadingBuffer::new(args.capacity)));

    let generator_handle = tokio::spawn(run_generator(
        TankModel::new(args.initial_level),
        rng,
        Arc::clone(&buffer),
        Duration::from_millis(args.interval_ms),
    ));

    let app = Router::new()
        .route("/leituras", get(list_readings))
        .with_state(buffer);

    let listener = tokio::net::TcpListener::bind(args.addr).await?;
    info!("Serving readings on http://{}/leituras", args.addr);

    let server_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("HTTP server error: {}", e);
        }
    });

    tokio::select! {
        _ = generator_handle => {
            error!("Generator task terminated");
        }
        _ = server_handle => {
            error!("HTTP server terminated");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
    }

    info!("Shutting down");
    Ok(())
}

async fn run_generator(
    mut tank: TankModel,
    mut rng: StdRng,
    buffer: SharedBuffer,
    every: Duration,
) {
    let mut ticker = tokio::time::interval(every);
    let mut generated = 0u64;

    loop {
        ticker.tick().await;

        let reading = tank.next_reading(&mut rng, Local::now());
        debug!(
            "Generated reading {} (leitura={}, bomba={})",
            reading.id, reading.leitura, reading.bomba_ligada
        );
        let buffered = {
            let mut guard = buffer.write().await;
            guard.push(reading);
            guard.len()
        };

        generated += 1;
        if generated % 100 == 0 {
            info!("Generated {} readings, serving {}", generated, buffered);
        }
    }
}

async fn list_readings(State(buffer): State<SharedBuffer>) -> Json<Vec<Reading>> {
    Json(buffer.read().await.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_readings_returns_buffer_in_order() {
        tokio_test::block_on(async {
            let buffer: SharedBuffer = Arc::new(RwLock::new(ReadingBuffer::new(10)));
            let mut tank = TankModel::new(50.0);
            let mut rng = StdRng::seed_from_u64(11);
            for _ in 0..3 {
                let reading = tank.next_reading(&mut rng, Local::now());
                buffer.write().await.push(reading);
            }

            let Json(readings) = list_readings(State(buffer)).await;
            let ids: Vec<u64> = readings.iter().map(|r| r.id).collect();
            assert_eq!(ids, vec![1, 2, 3]);
        });
    }

    #[test]
    fn test_generator_fills_buffer() {
        tokio_test::block_on(async {
            let buffer: SharedBuffer = Arc::new(RwLock::new(ReadingBuffer::new(5)));
            let handle = tokio::spawn(run_generator(
                TankModel::new(50.0),
                StdRng::seed_from_u64(2),
                Arc::clone(&buffer),
                Duration::from_millis(5),
            ));

            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.abort();

            assert_eq!(buffer.read().await.len(), 5);
        });
    }

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["simulator"]).unwrap();
        assert_eq!(args.capacity, 50);
        assert!(args.interval_ms > 0);
    }
}
