use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loan_tracker::cli::{self, Commands, UserCommands};
use loan_tracker::config::{self, Config};
use loan_tracker::store::memory::MemoryStore;
use loan_tracker::store::postgres::PgStore;
use loan_tracker::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // OTLP export is opt-in: only wired up when an endpoint is configured.
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let otel_enabled = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok();
    let telemetry_layer = if otel_enabled {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "loan-tracker"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "loan_tracker=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(telemetry_layer)
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(Commands::Serve { port, in_memory }) => run_server(cfg, port, in_memory).await,
        Some(Commands::Migrate) => {
            let db = PgStore::connect(cfg.database_url()?).await?;
            db.migrate().await?;
            db.close().await;
            println!("Migrations applied.");
            Ok(())
        }
        Some(Commands::User { command }) => {
            let db = PgStore::connect(cfg.database_url()?).await?;
            let store = Arc::new(db.clone());
            let state = AppState::new(cfg, store.clone(), store);
            let outcome = handle_user_command(command, &state).await;
            db.close().await;
            outcome
        }
        None => run_server(cfg, None, false).await,
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    if otel_enabled {
        opentelemetry::global::shutdown_tracer_provider();
    }
    result
}

async fn run_server(cfg: Config, port: Option<u16>, in_memory: bool) -> anyhow::Result<()> {
    let port = port.unwrap_or(cfg.port);

    let (state, db) = if in_memory {
        tracing::warn!("Serving from the in-memory store; data is lost on exit");
        let store = Arc::new(MemoryStore::new());
        (AppState::new(cfg, store.clone(), store), None)
    } else {
        tracing::info!("Connecting to database...");
        let db = PgStore::connect(cfg.database_url()?).await?;

        tracing::info!("Running migrations...");
        db.migrate().await?;

        let store = Arc::new(db.clone());
        (AppState::new(cfg, store.clone(), store), Some(db))
    };

    let app = loan_tracker::app(Arc::new(state));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!("Loan tracker listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(db) = db {
        tracing::info!("Closing database pool...");
        db.close().await;
    }
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

async fn handle_user_command(cmd: UserCommands, state: &AppState) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { username, password } => {
            let user = state
                .credentials
                .register(&username, &password)
                .await?;
            println!(
                "User created:\n  Username: {}\n  ID:       {}",
                user.username, user.id
            );
        }
        UserCommands::Token { username, password } => {
            let outcome = state
                .credentials
                .login(&username, &password)
                .await?;
            println!("Authorization: Bearer {}", outcome.token);
        }
    }
    Ok(())
}
