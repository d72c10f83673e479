use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info};
use twinfed::Config;
use twinfed_server::run_server;
use twinfed_server::settings::{build_engine, load_config};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 3000)]
    port: u16,

    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Also serve the JSON HTTP API on this port
    #[arg(long)]
    http_port: Option<u16>,

    /// Engine configuration (.json or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Graph fixture (JSON nodes and edges)
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// Measurement fixture (JSON array of items)
    #[arg(short, long)]
    measurements: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "twinfed_server=info,twinfed=info,info".into()),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let engine = Arc::new(build_engine(
        config,
        args.graph.as_deref(),
        args.measurements.as_deref(),
    )?);

    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received"),
            Err(e) => error!("Failed to listen for ctrl_c signal: {}", e),
        }
        let _ = stop_tx.send(true);
    });

    #[cfg(feature = "http")]
    let http = match args.http_port {
        Some(port) => {
            let listener = TcpListener::bind((args.host.as_str(), port)).await?;
            let engine = Arc::clone(&engine);
            let stop = stopped(stop_rx.clone());
            Some(tokio::spawn(async move {
                twinfed_server::run_http_server(listener, engine, stop).await
            }))
        }
        None => None,
    };
    #[cfg(not(feature = "http"))]
    if args.http_port.is_some() {
        tracing::warn!("--http-port ignored: built without the `http` feature");
    }

    let listener = TcpListener::bind((args.host.as_str(), args.port)).await?;
    run_server(listener, engine, Box::pin(stopped(stop_rx))).await?;

    #[cfg(feature = "http")]
    if let Some(http) = http {
        http.await??;
    }

    Ok(())
}

async fn stopped(mut rx: watch::Receiver<bool>) {
    while !*rx.borrow() {
        if rx.changed().await.is_err() {
            break;
        }
    }
}
