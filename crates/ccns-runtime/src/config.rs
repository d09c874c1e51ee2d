//! # Runtime Configuration
//!
//! Loaded from an optional JSON file named by `CCNS_CONFIG`, then
//! overridden by environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `CCNS_DOMAIN_ID` | `network.domain_id` |
//! | `CCNS_GAS_LIMIT` | `gas_limit` |
//! | `CCNS_FEE_TOKEN` | `fee_token` (`native` or `link`) |
//! | `CCNS_NAME` | `name` |

use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use ccns::{
    Address, CcnsConfig, DeliveryOrdering, DomainId, FeeSchedule, FeeToken, NetworkConfig,
    DEFAULT_GAS_LIMIT,
};

/// Environment variable naming the JSON config file.
pub const CONFIG_PATH_ENV: &str = "CCNS_CONFIG";

/// Which token the registrar pays fees in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeTokenChoice {
    /// Native currency.
    #[default]
    Native,
    /// The network's fee token.
    Link,
}

impl FeeTokenChoice {
    /// Resolve against the network's published fee token.
    pub fn resolve(self, network: &NetworkConfig) -> FeeToken {
        match self {
            FeeTokenChoice::Native => FeeToken::Native,
            FeeTokenChoice::Link => network.link(),
        }
    }
}

impl FromStr for FeeTokenChoice {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "native" => Ok(FeeTokenChoice::Native),
            "link" => Ok(FeeTokenChoice::Link),
            other => bail!("unknown fee token `{}` (expected native or link)", other),
        }
    }
}

/// Complete runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Values published by the transport.
    pub network: NetworkConfig,
    /// Transport fee schedule.
    pub fees: FeeSchedule,
    /// Gas budget for the destination.
    pub gas_limit: u64,
    /// Fee payment token.
    pub fee_token: FeeTokenChoice,
    /// Amount deposited into the registrar before registering.
    pub deposit: u128,
    /// Receiver ordering policy.
    pub delivery_ordering: DeliveryOrdering,
    /// Deployer and owner of every component.
    pub deployer: Address,
    /// Account registering the name.
    pub registrant: Address,
    /// Name to register.
    pub name: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::local(),
            fees: FeeSchedule::free(),
            gas_limit: DEFAULT_GAS_LIMIT,
            fee_token: FeeTokenChoice::Native,
            deposit: 0,
            delivery_ordering: DeliveryOrdering::LastWriteWins,
            deployer: Address::repeat_byte(0xD0),
            registrant: Address::repeat_byte(0xAA),
            name: "alice.ccns".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load from `CCNS_CONFIG` (if set) and the process environment.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Parse a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse a JSON document.
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Apply overrides looked up through `var`.
    pub fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = var("CCNS_DOMAIN_ID") {
            let id: u64 = value
                .parse()
                .with_context(|| format!("CCNS_DOMAIN_ID must be a u64, got `{}`", value))?;
            self.network.domain_id = DomainId(id);
        }
        if let Some(value) = var("CCNS_GAS_LIMIT") {
            self.gas_limit = value
                .parse()
                .with_context(|| format!("CCNS_GAS_LIMIT must be a u64, got `{}`", value))?;
        }
        if let Some(value) = var("CCNS_FEE_TOKEN") {
            self.fee_token = value.parse()?;
        }
        if let Some(value) = var("CCNS_NAME") {
            if value.is_empty() {
                warn!("CCNS_NAME is empty, registering the empty name");
            }
            self.name = value;
        }
        Ok(())
    }

    /// Name service configuration derived from this runtime config.
    pub fn ccns_config(&self) -> CcnsConfig {
        CcnsConfig {
            fee_token: self.fee_token.resolve(&self.network),
            delivery_ordering: self.delivery_ordering,
            default_gas_limit: self.gas_limit,
            ..CcnsConfig::default()
        }
    }
}
