use anyhow::Context;
use clap::Parser;
use dashboard::client::ReadingsClient;
use dashboard::config::Config;
use dashboard::projection::DashboardView;
use dashboard::render::OutputFormat;
use dashboard::{metrics, poller, render, rest, state};
use std::io::IsTerminal;
use tokio::sync::oneshot;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Logs go to stderr so the dashboard owns stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting water-monitoring dashboard");
    info!("Endpoint: {}", config.endpoint);
    info!("Poll interval: {:?}", config.poll_interval());

    metrics::init_metrics().context("failed to register metrics")?;

    let client = ReadingsClient::new(&config.endpoint, config.request_timeout())
        .context("failed to build HTTP client")?;
    let (tx, rx) = state::channel();

    if config.once {
        poller::poll_once(&client, &tx).await;
        let view = DashboardView::project(&tx.borrow());
        println!("{}", render::render(&view, config.format)?);
        return Ok(());
    }

    if let Some(addr) = config.listen {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .with_context(|| format!("failed to bind status server to {}", addr))?;
        info!("Status server listening on {}", addr);

        let app = rest::create_router(rx.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Status server error: {}", e);
            }
        });
    }

    // Only redraw in place on an interactive terminal; piped output stays append-only
    let clear = config.format == OutputFormat::Text && std::io::stdout().is_terminal();
    let renderer_handle = tokio::spawn(render::run_renderer(
        rx,
        config.format,
        std::io::stdout(),
        clear,
    ));

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let poll_interval = config.poll_interval();
    let mut poller_handle = tokio::spawn(poller::run_poller(client, poll_interval, tx, async {
        let _ = stop_rx.await;
    }));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            let _ = stop_tx.send(());
            if let Err(e) = (&mut poller_handle).await {
                error!("Poller task failed: {}", e);
            }
        }
        result = &mut poller_handle => {
            if let Err(e) = result {
                error!("Poller task failed: {}", e);
            }
        }
    }

    renderer_handle.abort();
    info!("Shutting down");
    Ok(())
}
