//! Service configuration types.
//!
//! [`ServiceConfig`] is built once at startup: `main.rs` loads the optional
//! TOML file (see `infrastructure::storage::service_config`) and then layers
//! command-line flags on top.  Every field has a serde default so a partial
//! or empty file is valid.
//!
//! # Example TOML
//!
//! ```toml
//! data_dir = "/var/lib/node"
//! conf_file_name = "node.conf"
//! bind_addr = "127.0.0.1:51736"
//! allowed_keys = ["addressindex"]
//! cache_policy = "invalidate_on_write"
//! testnet = false
//! test_section = "test"
//! log_level = "info"
//!
//! [overrides]
//! rpcport = 51935
//! ```

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use nodeconf_core::AllowedKeys;
use serde::{Deserialize, Serialize};

/// Name of the daemon configuration file inside the data directory.
pub const DEFAULT_CONF_FILE_NAME: &str = "node.conf";

/// Default IPC listen port.
pub const DEFAULT_IPC_PORT: u16 = 51736;

// ── Cache policy ──────────────────────────────────────────────────────────────

/// When the cached runtime configuration is thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Drop the cache after every save that changed the file.
    #[default]
    InvalidateOnWrite,
    /// Keep the first resolved configuration until the process exits or the
    /// cache is invalidated explicitly.
    KeepUntilRestart,
}

impl CachePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            CachePolicy::InvalidateOnWrite => "invalidate_on_write",
            CachePolicy::KeepUntilRestart => "keep_until_restart",
        }
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CachePolicy {
    type Err = String;

    /// Accepts both `snake_case` and `kebab-case` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().replace('-', "_").as_str() {
            "invalidate_on_write" => Ok(CachePolicy::InvalidateOnWrite),
            "keep_until_restart" => Ok(CachePolicy::KeepUntilRestart),
            other => Err(format!(
                "unknown cache policy '{other}' (expected invalidate_on_write or keep_until_restart)"
            )),
        }
    }
}

// ── Service configuration ─────────────────────────────────────────────────────

/// All runtime settings of the settings service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Daemon data directory.  `None` selects the platform default.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// File name of the daemon configuration inside `data_dir`.
    #[serde(default = "default_conf_file_name")]
    pub conf_file_name: String,

    /// Address the IPC WebSocket server binds to.
    ///
    /// The channel can rewrite the daemon configuration, so the default only
    /// accepts local connections.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,

    /// Keys that `SaveSettings` is permitted to write.
    #[serde(default = "default_allowed_keys")]
    pub allowed_keys: Vec<String>,

    #[serde(default)]
    pub cache_policy: CachePolicy,

    /// Forces the test-network section into the runtime configuration even
    /// when the file does not enable it.
    #[serde(default)]
    pub testnet: bool,

    /// Name of the section merged into the runtime configuration on the
    /// test network.
    #[serde(default = "default_test_section")]
    pub test_section: String,

    /// Log level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// RPC credentials reported as `auth` in the runtime configuration.
    #[serde(default, skip_serializing)]
    pub rpc_auth: Option<String>,

    /// Runtime options overlaid on top of the file's settings.
    #[serde(default)]
    pub overrides: serde_json::Map<String, serde_json::Value>,
}

impl ServiceConfig {
    /// Returns the write whitelist as an [`AllowedKeys`] set.
    pub fn allowed(&self) -> AllowedKeys {
        self.allowed_keys.iter().cloned().collect()
    }
}

fn default_conf_file_name() -> String {
    DEFAULT_CONF_FILE_NAME.to_string()
}
fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], DEFAULT_IPC_PORT))
}
fn default_allowed_keys() -> Vec<String> {
    vec!["addressindex".to_string()]
}
fn default_test_section() -> String {
    "test".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServiceConfig {
    /// | Field          | Default             |
    /// |----------------|---------------------|
    /// | data_dir       | platform default    |
    /// | conf_file_name | `node.conf`         |
    /// | bind_addr      | `127.0.0.1:51736`   |
    /// | allowed_keys   | `["addressindex"]`  |
    /// | cache_policy   | invalidate_on_write |
    /// | testnet        | `false`             |
    /// | test_section   | `test`              |
    /// | log_level      | `info`              |
    /// | rpc_auth       | none                |
    /// | overrides      | empty               |
    fn default() -> Self {
        Self {
            data_dir: None,
            conf_file_name: default_conf_file_name(),
            bind_addr: default_bind_addr(),
            allowed_keys: default_allowed_keys(),
            cache_policy: CachePolicy::default(),
            testnet: false,
            test_section: default_test_section(),
            log_level: default_log_level(),
            rpc_auth: None,
            overrides: serde_json::Map::new(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_binds_to_loopback() {
        let cfg = ServiceConfig::default();
        assert!(cfg.bind_addr.ip().is_loopback());
        assert_eq!(cfg.bind_addr.port(), DEFAULT_IPC_PORT);
    }

    #[test]
    fn test_default_whitelist_is_addressindex_only() {
        let allowed = ServiceConfig::default().allowed();
        assert!(allowed.contains("addressindex"));
        assert!(!allowed.contains("rpcpassword"));
    }

    #[test]
    fn test_empty_toml_yields_defaults() {
        let cfg: ServiceConfig = toml::from_str("").expect("empty toml");
        assert_eq!(cfg, ServiceConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() {
        // Arrange
        let text = r#"
            conf_file_name = "particl.conf"
            cache_policy = "keep_until_restart"

            [overrides]
            rpcport = 51935
        "#;

        // Act
        let cfg: ServiceConfig = toml::from_str(text).expect("valid toml");

        // Assert
        assert_eq!(cfg.conf_file_name, "particl.conf");
        assert_eq!(cfg.cache_policy, CachePolicy::KeepUntilRestart);
        assert_eq!(cfg.overrides["rpcport"], serde_json::json!(51935));
        assert_eq!(cfg.test_section, "test");
    }

    #[test]
    fn test_rpc_auth_is_never_serialized() {
        let cfg = ServiceConfig {
            rpc_auth: Some("user:pass".to_string()),
            ..ServiceConfig::default()
        };
        let text = serde_json::to_string(&cfg).expect("serialize");
        assert!(!text.contains("user:pass"));
    }

    #[test]
    fn test_cache_policy_from_str_accepts_both_spellings() {
        assert_eq!(
            "keep-until-restart".parse::<CachePolicy>(),
            Ok(CachePolicy::KeepUntilRestart)
        );
        assert_eq!(
            "invalidate_on_write".parse::<CachePolicy>(),
            Ok(CachePolicy::InvalidateOnWrite)
        );
        assert!("forever".parse::<CachePolicy>().is_err());
    }

    #[test]
    fn test_cache_policy_display_round_trips() {
        for policy in [CachePolicy::InvalidateOnWrite, CachePolicy::KeepUntilRestart] {
            assert_eq!(policy.to_string().parse::<CachePolicy>(), Ok(policy));
        }
    }
}
