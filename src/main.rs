use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::{self, TraceLayer};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use instances_collector::build_app;
use instances_collector::collector::{collection_job, Collector};
use instances_collector::config::{Config, COLLECTION_INTERVAL};
use instances_collector::fetcher::Fetcher;
use instances_collector::sink::InfluxSink;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let http = reqwest::Client::builder()
        .timeout(config.fetch_timeout)
        .connect_timeout(Duration::from_secs(10))
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .expect("Failed to build HTTP client");

    let fetcher = Fetcher::new(http.clone(), &config);
    let sink = Arc::new(InfluxSink::new(http, &config));

    tracing::info!(
        source = %config.instances_url,
        sink = %sink.write_url(),
        database = %config.influxdb_database,
        "Collector configured"
    );

    let collector = Arc::new(Collector::new(fetcher, sink, config.influxdb_database.clone()));

    // First tick fires immediately, then hourly
    tokio::spawn(collection_job(collector, COLLECTION_INTERVAL));

    let app = build_app().layer(
        TraceLayer::new_for_http()
            .make_span_with(trace::DefaultMakeSpan::new().level(Level::DEBUG))
            .on_request(trace::DefaultOnRequest::new().level(Level::DEBUG))
            .on_response(
                trace::DefaultOnResponse::new()
                    .level(Level::DEBUG)
                    .latency_unit(tower_http::LatencyUnit::Millis),
            ),
    );

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting liveness server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutting down...");
}
