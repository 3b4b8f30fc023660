//! Configuration for an Accord node

use crate::{RuntimeError, RuntimeResult};
use accord_broadcast::LoopbackConfig;
use accord_contracts::names::validate_name;
use accord_types::OperatingMode;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

/// Main node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccordConfig {
    /// Namespaces served by this node
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<NamespaceConfig>,

    /// Broadcast transport
    #[serde(default)]
    pub broadcast: BroadcastConfig,

    /// Content resolution
    #[serde(default)]
    pub contracts: ContractsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Per-request defaults
    #[serde(default)]
    pub requests: RequestConfig,
}

impl Default for AccordConfig {
    fn default() -> Self {
        Self {
            namespaces: default_namespaces(),
            broadcast: BroadcastConfig::default(),
            contracts: ContractsConfig::default(),
            logging: LoggingConfig::default(),
            requests: RequestConfig::default(),
        }
    }
}

/// One namespace and the mode it runs in
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    pub name: String,

    #[serde(default)]
    pub mode: OperatingMode,

    /// Signer for definitions that declare no author
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_author: Option<String>,
}

impl NamespaceConfig {
    pub fn new(name: impl Into<String>, mode: OperatingMode) -> Self {
        Self {
            name: name.into(),
            mode,
            default_author: None,
        }
    }
}

/// Broadcast configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    /// Payloads above this many bytes are staged as blobs
    #[serde(default = "default_inline_limit")]
    pub inline_limit: usize,

    /// Hard cap on payload size in bytes
    #[serde(default = "default_max_payload")]
    pub max_payload: usize,

    /// Confirm messages as soon as they are sent (single-node networks)
    #[serde(default)]
    pub auto_confirm: bool,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            inline_limit: default_inline_limit(),
            max_payload: default_max_payload(),
            auto_confirm: false,
        }
    }
}

impl From<&BroadcastConfig> for LoopbackConfig {
    fn from(config: &BroadcastConfig) -> Self {
        LoopbackConfig {
            inline_limit: config.inline_limit,
            max_payload: config.max_payload,
            auto_confirm: config.auto_confirm,
        }
    }
}

/// Content resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    /// Base URL API facade URLs are built from
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

impl Default for ContractsConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Request defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestConfig {
    /// Upper bound on waiting for a confirmation, in seconds. Zero disables it.
    #[serde(default = "default_confirm_timeout")]
    pub confirm_timeout_secs: u64,
}

impl RequestConfig {
    pub fn confirm_timeout(&self) -> Option<Duration> {
        (self.confirm_timeout_secs > 0).then(|| Duration::from_secs(self.confirm_timeout_secs))
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            confirm_timeout_secs: default_confirm_timeout(),
        }
    }
}

// Default value helpers
fn default_namespaces() -> Vec<NamespaceConfig> {
    vec![NamespaceConfig::new("default", OperatingMode::Multiparty)]
}

fn default_inline_limit() -> usize {
    64 * 1024
}

fn default_max_payload() -> usize {
    16 * 1024 * 1024
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_confirm_timeout() -> u64 {
    120
}

impl AccordConfig {
    /// Load configuration: defaults, then the optional file, then `ACCORD_`
    /// environment variables (`__` separates nested keys, e.g.
    /// `ACCORD_BROADCAST__AUTO_CONFIRM=true`).
    pub fn load(path: Option<&Path>) -> RuntimeResult<Self> {
        let mut builder = config::Config::builder();

        // Add default configuration
        builder = builder.add_source(config::Config::try_from(&AccordConfig::default())?);

        // Add file configuration if provided
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("ACCORD")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AccordConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RuntimeResult<()> {
        if self.namespaces.is_empty() {
            return Err(RuntimeError::InvalidConfig(
                "at least one namespace must be configured".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for namespace in &self.namespaces {
            validate_name("namespace", &namespace.name)
                .map_err(|e| RuntimeError::InvalidConfig(e.to_string()))?;
            if !seen.insert(namespace.name.as_str()) {
                return Err(RuntimeError::InvalidConfig(format!(
                    "namespace {} configured more than once",
                    namespace.name
                )));
            }
        }
        if self.broadcast.inline_limit > self.broadcast.max_payload {
            return Err(RuntimeError::InvalidConfig(
                "broadcast.inline_limit must not exceed broadcast.max_payload".to_string(),
            ));
        }
        Ok(())
    }
}
