use log::{error, info, warn};
use std::sync::Arc;
use tcsim_feed::{BookFeed, RetryOutcome, Watchdog, WsConnector};
use tcsim_runner::config::{load_config, load_default_config};
use tcsim_runner::{CostAggregator, CostSession};

fn print_help() {
    eprintln!(
        r#"tcsim - real-time trade cost simulator

USAGE:
    tcsim [OPTIONS]

OPTIONS:
    --config <PATH>     Load configuration from JSON file
    --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG            Log level filter (default: info)

EXAMPLES:
    # Cost the default order against the default stream
    tcsim

    # Run with config file
    tcsim --config tcsim.json
"#
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();
    let mut config_path: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                i += 1;
                if i >= args.len() {
                    eprintln!("Error: --config requires a path argument");
                    std::process::exit(1);
                }
                config_path = Some(args[i].clone());
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            load_config(&path)?
        }
        None => {
            info!("Using default configuration");
            load_default_config()?
        }
    };

    let order = &config.order;
    info!(
        "Costing {} {} {} on {} ({}, volatility {})",
        order.order_type, order.quantity, order.symbol, order.exchange, order.fee_tier, order.volatility
    );

    let aggregator = Arc::new(CostAggregator::from_config(&config)?);
    let session = Arc::new(CostSession::new(Arc::clone(&aggregator), config.order.clone())?);

    let feed = Arc::new(BookFeed::new(
        WsConnector::new(config.feed.url.clone()),
        config.feed.clone(),
    ));
    feed.register(session.clone());

    let mut reports = session.subscribe();
    let reporter = tokio::spawn(async move {
        while reports.changed().await.is_ok() {
            let report = *reports.borrow_and_update();
            if let Some(report) = report {
                info!("{}", report.summary());
            }
        }
    });

    let connect = {
        let feed = Arc::clone(&feed);
        let interval = config.feed.reconnect_interval();
        tokio::spawn(async move {
            match feed.connect_with_retry(interval).await {
                RetryOutcome::Connected { attempts } => {
                    info!("Book feed connected after {} attempt(s)", attempts)
                }
                RetryOutcome::AlreadyConnecting => {}
                RetryOutcome::Stopped => warn!("Book feed never connected"),
            }
        })
    };
    let watchdog = Watchdog::spawn(Arc::clone(&feed), config.feed.watchdog_interval());

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");

    feed.stop_reconnecting();
    watchdog.abort();
    connect.abort();
    feed.close().await;
    reporter.abort();

    let stats = feed.stats();
    info!(
        "Frames received: {}, dropped: {}, connections: {}",
        stats.frames_received, stats.frames_dropped, stats.connections
    );
    info!("Model metrics: {}", serde_json::to_string(&aggregator.metrics())?);

    Ok(())
}
