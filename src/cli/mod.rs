use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

use crate::app::{app, AppState};
use crate::auth::{issue_token, Claims};
use crate::config::{AppConfig, LogFormat};
use crate::store::{InMemoryStore, ItemStore, PostgrestStore};

#[derive(Parser)]
#[command(name = "items-api")]
#[command(about = "Authenticated item CRUD over a hosted PostgREST backend")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP server (default)")]
    Serve {
        #[arg(long, help = "Bind address, overrides HOST")]
        host: Option<String>,

        #[arg(long, help = "Listen port, overrides PORT")]
        port: Option<u16>,

        #[arg(long, help = "Keep items in process memory instead of the hosted store")]
        in_memory: bool,
    },

    #[command(about = "Sign a bearer token with the configured JWT secret")]
    Token {
        #[arg(long, help = "User id to place in the sub claim")]
        sub: Uuid,

        #[arg(long)]
        email: Option<String>,

        #[arg(long, default_value_t = 60)]
        ttl_minutes: i64,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve {
        host: None,
        port: None,
        in_memory: false,
    }) {
        Commands::Serve {
            host,
            port,
            in_memory,
        } => {
            init_tracing(&config);
            serve(config, host, port, in_memory).await
        }
        Commands::Token {
            sub,
            email,
            ttl_minutes,
        } => {
            let claims = token_claims(sub, email, ttl_minutes)?;
            let token = issue_token(&config.security.jwt_secret, &claims)?;

            if cli.json {
                let body = json!({
                    "access_token": token,
                    "token_type": "bearer",
                    "expires_at": claims.exp,
                });
                println!("{}", body);
            } else {
                println!("{}", token);
            }
            Ok(())
        }
    }
}

fn token_claims(sub: Uuid, email: Option<String>, ttl_minutes: i64) -> anyhow::Result<Claims> {
    anyhow::ensure!(ttl_minutes > 0, "--ttl-minutes must be positive");

    let ttl = chrono::Duration::try_minutes(ttl_minutes)
        .context("--ttl-minutes is out of range")?;
    Claims::new(sub, email, ttl).context("--ttl-minutes is out of range")
}

async fn serve(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
    in_memory: bool,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.api.host = host;
    }
    if let Some(port) = port {
        config.api.port = port;
    }

    let store: Arc<dyn ItemStore> = if in_memory {
        tracing::warn!("Using in-memory item store; data is lost on exit");
        Arc::new(InMemoryStore::new())
    } else {
        Arc::new(PostgrestStore::new(&config.supabase).context("failed to build store client")?)
    };

    tracing::info!(
        "Starting {} in {:?} mode",
        config.api.project_name,
        config.environment
    );

    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", config.api.host, config.api.port))?;
    let prefix = config.api.prefix.clone();

    let router = app(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API docs at http://{}{}/docs", addr, prefix);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.default_filter))
        .unwrap_or_else(|_| EnvFilter::new("items_api=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    match config.logging.format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}
