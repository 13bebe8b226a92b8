//! nodeconfd: settings service for a node daemon's configuration file.
//!
//! Serves the JSON-over-WebSocket IPC protocol described in
//! `nodeconf_service::domain::messages`, reading and atomically rewriting the
//! daemon's `node.conf` on behalf of a UI process.
//!
//! # Usage
//!
//! ```text
//! nodeconfd [OPTIONS]
//!
//! Options:
//!   --config <PATH>          Service config TOML file
//!   --data-dir <DIR>         Daemon data directory [default: platform dir]
//!   --conf-file <NAME>       Configuration file name [default: node.conf]
//!   --bind <ADDR>            IPC listen address [default: 127.0.0.1:51736]
//!   --allow-key <KEY>        Whitelisted key (repeatable; replaces the list)
//!   --cache-policy <POLICY>  invalidate_on_write | keep_until_restart
//!   --testnet                Merge the test section into the runtime config
//!   --test-section <NAME>    Name of the test-network section [default: test]
//!   --rpc-auth <USER:PASS>   RPC credentials reported as `auth`
//!   --set <KEY=VALUE>        Runtime override (repeatable)
//!   --log-level <LEVEL>      Used when RUST_LOG is unset [default: info]
//! ```
//!
//! Command-line flags win over the TOML file; the file wins over defaults.
//!
//! | Variable                | Flag             |
//! |-------------------------|------------------|
//! | `NODECONF_CONFIG`       | `--config`       |
//! | `NODECONF_DATA_DIR`     | `--data-dir`     |
//! | `NODECONF_BIND`         | `--bind`         |
//! | `NODECONF_CACHE_POLICY` | `--cache-policy` |
//! | `NODECONF_RPC_AUTH`     | `--rpc-auth`     |
//! | `NODECONF_LOG_LEVEL`    | `--log-level`    |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nodeconf_service::application::{CredentialProvider, SettingsService};
use nodeconf_service::domain::{CachePolicy, ServiceConfig};
use nodeconf_service::infrastructure::storage::{load_service_config, resolve_conf_path};
use nodeconf_service::infrastructure::{
    run_server, ConfFileStore, StaticCredentials,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Settings service for a node daemon's configuration file.
#[derive(Debug, Parser)]
#[command(
    name = "nodeconfd",
    about = "Reads and atomically rewrites a node daemon's configuration over WebSocket IPC",
    version
)]
struct Cli {
    /// Service configuration file (TOML).  A missing file means defaults.
    #[arg(long, env = "NODECONF_CONFIG")]
    config: Option<PathBuf>,

    /// Daemon data directory holding the configuration file.
    #[arg(long, env = "NODECONF_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Name of the configuration file inside the data directory.
    #[arg(long)]
    conf_file: Option<String>,

    /// Address the IPC WebSocket server binds to.
    #[arg(long, env = "NODECONF_BIND")]
    bind: Option<SocketAddr>,

    /// Key that SaveSettings may write.  Repeat to allow several keys.
    #[arg(long = "allow-key")]
    allow_keys: Vec<String>,

    /// When the cached runtime configuration is dropped.
    #[arg(long, env = "NODECONF_CACHE_POLICY")]
    cache_policy: Option<CachePolicy>,

    /// Run against the test network.
    #[arg(long)]
    testnet: bool,

    /// Section merged into the runtime configuration on the test network.
    #[arg(long)]
    test_section: Option<String>,

    /// RPC credentials reported as `auth`.
    #[arg(long, env = "NODECONF_RPC_AUTH", hide_env_values = true)]
    rpc_auth: Option<String>,

    /// Runtime override as KEY=VALUE.  VALUE is parsed as JSON when possible,
    /// otherwise taken as a string.
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Log level used when RUST_LOG is not set.
    #[arg(long, env = "NODECONF_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Layers the command-line flags on top of `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a `--set` argument has no `=` or an empty key.
    fn apply_to(self, mut config: ServiceConfig) -> anyhow::Result<ServiceConfig> {
        if let Some(dir) = self.data_dir {
            config.data_dir = Some(dir);
        }
        if let Some(name) = self.conf_file {
            config.conf_file_name = name;
        }
        if let Some(addr) = self.bind {
            config.bind_addr = addr;
        }
        if !self.allow_keys.is_empty() {
            config.allowed_keys = self.allow_keys;
        }
        if let Some(policy) = self.cache_policy {
            config.cache_policy = policy;
        }
        if self.testnet {
            config.testnet = true;
        }
        if let Some(section) = self.test_section {
            config.test_section = section;
        }
        if let Some(auth) = self.rpc_auth {
            config.rpc_auth = Some(auth);
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        for raw in &self.overrides {
            let (key, value) = parse_override(raw)?;
            config.overrides.insert(key, value);
        }
        Ok(config)
    }
}

/// Splits `KEY=VALUE`; the value is JSON if it parses, otherwise a string.
fn parse_override(raw: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("invalid override '{raw}': expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        anyhow::bail!("invalid override '{raw}': empty key");
    }
    let value = serde_json::from_str(value)
        .unwrap_or_else(|_| serde_json::Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let file_config =
        load_service_config(cli.config.as_deref()).context("failed to load service config")?;
    let config = cli.apply_to(file_config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let conf_path = resolve_conf_path(config.data_dir.as_deref(), &config.conf_file_name)?;

    let credentials: Arc<dyn CredentialProvider> =
        Arc::new(StaticCredentials::new(config.rpc_auth.clone()));

    info!(
        conf = %conf_path.display(),
        bind = %config.bind_addr,
        cache_policy = %config.cache_policy,
        allowed = ?config.allowed_keys,
        "nodeconfd starting"
    );

    let service = Arc::new(SettingsService::new(
        Arc::new(ConfFileStore::new(conf_path)),
        credentials,
        &config,
    ));

    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => {
                tracing::error!("failed to listen for Ctrl+C signal: {e}");
            }
        }
    });

    run_server(config.bind_addr, service, running).await?;

    info!("nodeconfd stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
