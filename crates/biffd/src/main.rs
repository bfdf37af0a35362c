//! biffd — the biff daemon.
//!
//! Serves the osquery enrollment and configuration endpoints over HTTP,
//! backed by a redb enrollment store.
//!
//! # Usage
//!
//! ```text
//! biffd init --output biff.toml
//! biffd serve --config biff.toml --port 8080 --data-dir /var/lib/biff
//! biffd enrollments --config biff.toml
//! ```

use std::io::Write;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use biff_core::ServerConfig;
use biff_protocol::{NodeKeyGenerator, RandomNodeKeys};
use biff_state::EnrollmentStore;
use clap::{Parser, Subcommand};
use tracing::info;

/// File name of the enrollment database inside the data directory.
const DB_FILE: &str = "biff.redb";

#[derive(Parser)]
#[command(name = "biffd", about = "biff fleet enrollment daemon", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve /enroll and /configuration.
    Serve {
        /// Path to biff.toml.
        #[arg(short, long, default_value = "biff.toml")]
        config: PathBuf,

        /// Port to listen on (overrides [server].port).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for the enrollment store (overrides [server].data_dir).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Print every enrollment as one JSON object per line.
    ///
    /// redb holds an exclusive lock on the store file, so this fails with
    /// "database already open" while `biffd serve` is running on the same
    /// data directory. Stop the server first.
    Enrollments {
        /// Path to biff.toml; its [server].data_dir locates the store.
        #[arg(short, long, default_value = "biff.toml")]
        config: PathBuf,

        /// Data directory holding the enrollment store (overrides the config).
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Write a starter biff.toml.
    Init {
        #[arg(short, long, default_value = "biff.toml")]
        output: PathBuf,

        /// Enroll secret to embed. A random one is generated if omitted.
        #[arg(long)]
        secret: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,biffd=debug,biff=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            data_dir,
        } => run_serve(&config, port, data_dir).await,
        Command::Enrollments { config, data_dir } => {
            list_enrollments(&resolve_data_dir(&config, data_dir)?)
        }
        Command::Init { output, secret } => write_scaffold(&output, secret),
    }
}

async fn run_serve(
    config_path: &Path,
    port: Option<u16>,
    data_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let config = ServerConfig::from_file(config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    let port = port.unwrap_or(config.server.port);
    let data_dir = data_dir.unwrap_or_else(|| config.server.data_dir.clone());
    info!(
        config = %config_path.display(),
        queries = config.schedule.len(),
        "biff daemon starting"
    );

    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join(DB_FILE);
    let store = EnrollmentStore::open(&db_path)?;
    info!(path = ?db_path, enrollments = store.count()?, "enrollment store opened");

    let router = biff_api::build_router(store, &config);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            info!("shutdown signal received");
        })
        .await?;

    info!("biff daemon stopped");
    Ok(())
}

/// An explicit `--data-dir` wins; otherwise use the one `serve` would use.
fn resolve_data_dir(config_path: &Path, data_dir: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match data_dir {
        Some(dir) => Ok(dir),
        None => {
            let config = ServerConfig::from_file(config_path)
                .with_context(|| format!("loading {}", config_path.display()))?;
            Ok(config.server.data_dir)
        }
    }
}

fn list_enrollments(data_dir: &Path) -> anyhow::Result<()> {
    let db_path = data_dir.join(DB_FILE);
    if !db_path.exists() {
        bail!("no enrollment store at {}", db_path.display());
    }
    let store = EnrollmentStore::open(&db_path)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for enrollment in store.list_all()? {
        writeln!(out, "{}", serde_json::to_string(&enrollment)?)?;
    }
    Ok(())
}

fn write_scaffold(output: &Path, secret: Option<String>) -> anyhow::Result<()> {
    if output.exists() {
        bail!("{} already exists, refusing to overwrite", output.display());
    }
    let secret = secret.unwrap_or_else(|| RandomNodeKeys.generate());
    let config = ServerConfig::scaffold(&secret);
    config.validate()?;
    std::fs::write(output, config.to_toml_string()?)?;
    info!(path = %output.display(), "config written");
    Ok(())
}
