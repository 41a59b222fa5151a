use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use axum::Router;
use axum_server::{Handle, tls_rustls::RustlsConfig};
use clap::Parser;
use http::{HeaderValue, Method, header};
use tokio::net::TcpListener;
use tower_governor::{
    GovernorLayer, governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{info, warn};

use fourier_gateway::{
    ServerConfig,
    config::TlsConfig,
    middleware::SESSION_HEADER,
    routes,
    state::{AppState, SWEEP_INTERVAL},
};

/// Time in-flight requests get to finish once shutdown starts (TLS listener).
const TLS_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

/// Fourier Gateway - session-scoped text-to-speech server
#[derive(Parser, Debug)]
#[command(name = "fourier-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// YAML configuration file; values in it override the environment
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<ServerConfig> {
    let config = match path {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration file");
            ServerConfig::from_file(&path)
        }
        None => ServerConfig::from_env(),
    };
    config.map_err(|e| anyhow!("Invalid configuration: {e}"))
}

fn cors_layer(origins: Option<&str>) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, SESSION_HEADER]);

    match origins {
        Some("*") => base
            .allow_origin(Any)
            .expose_headers([SESSION_HEADER])
            .allow_credentials(false),
        Some(list) => {
            let allowed: Vec<HeaderValue> = list
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            base.allow_origin(allowed)
                .expose_headers([SESSION_HEADER])
                .allow_credentials(true)
        }
        None => {
            info!("CORS_ALLOWED_ORIGINS unset; only same-origin browser clients can call the API");
            base.allow_credentials(false)
        }
    }
}

/// Router with the outer layers: CORS, per-IP governor, response hardening.
fn build_app(state: std::sync::Arc<AppState>, config: &ServerConfig) -> anyhow::Result<Router> {
    let governor = GovernorConfigBuilder::default()
        .per_second(u64::from(config.ip_rate_limit_per_second))
        .burst_size(config.ip_rate_limit_burst)
        .key_extractor(SmartIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("Per-IP rate limit must be non-zero"))?;

    let hardening = tower::ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        ));

    Ok(routes::create_router(state)
        .layer(cors_layer(config.cors_allowed_origins.as_deref()))
        .layer(GovernorLayer::new(governor))
        .layer(hardening))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

async fn serve_tls(app: Router, addr: SocketAddr, tls: &TlsConfig) -> anyhow::Result<()> {
    let rustls = RustlsConfig::from_pem_file(&tls.cert_path, &tls.key_path)
        .await
        .with_context(|| {
            format!(
                "Loading TLS material from {} and {}",
                tls.cert_path.display(),
                tls.key_path.display()
            )
        })?;

    let handle = Handle::new();
    let signal_handle = handle.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_handle.graceful_shutdown(Some(TLS_SHUTDOWN_GRACE));
    });

    info!(%addr, "Listening (TLS)");
    axum_server::bind_rustls(addr, rustls)
        .handle(handle)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
        .context("TLS listener failed")
}

async fn serve_plain(app: Router, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Binding {addr}"))?;
    info!(%addr, "Listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP listener failed")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env has to be in the environment before the config reads it
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    // Outbound calls to Google and the TLS listener both need a process-wide provider
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow!("rustls crypto provider already installed"))?;

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    if config.allow_insecure_endpoints {
        warn!("ALLOW_INSECURE_ENDPOINTS is set; loopback HTTP token endpoints are accepted");
    }

    let addr: SocketAddr = config
        .address()
        .parse()
        .with_context(|| format!("Invalid listen address {}", config.address()))?;
    info!(
        quota = config.rate_limit_requests,
        window_seconds = config.rate_limit_window_seconds,
        max_text_length = config.max_text_length,
        upstream = %config.google_tts_base_url,
        "Starting Fourier gateway"
    );

    let state = AppState::new(config.clone())
        .map_err(|e| anyhow!("Cannot create speech provider: {e}"))?;
    let sweeper = state.spawn_sweeper(SWEEP_INTERVAL);
    let app = build_app(state.clone(), &config)?;

    let served = match &config.tls {
        Some(tls) => serve_tls(app, addr, tls).await,
        None => serve_plain(app, addr).await,
    };

    state.shutdown();
    let _ = sweeper.await;
    info!("Stopped");
    served
}
