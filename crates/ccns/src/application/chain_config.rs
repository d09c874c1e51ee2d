//! # Chain Config Store
//!
//! Owner-managed, ordered collection of destination domains the registrar
//! fans out to. Entries are never removed.

use parking_lot::RwLock;
use tracing::info;

use crate::config::ReenablePolicy;
use crate::domain::{invariant_role_holder, Address, CcnsError, DomainConfig, DomainId};

/// Ordered registry of enabled destination domains.
pub struct ChainConfigStore {
    owner: Address,
    policy: ReenablePolicy,
    chains: RwLock<Vec<DomainConfig>>,
}

impl ChainConfigStore {
    /// Create an empty store owned by `owner`, overwriting on re-enable.
    pub fn new(owner: Address) -> Self {
        Self::with_policy(owner, ReenablePolicy::Overwrite)
    }

    /// Create an empty store with an explicit re-enable policy.
    pub fn with_policy(owner: Address, policy: ReenablePolicy) -> Self {
        Self {
            owner,
            policy,
            chains: RwLock::new(Vec::new()),
        }
    }

    /// Owner allowed to enable chains.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// Enable `config.domain_id` as a destination. Owner only.
    ///
    /// Returns the index the entry is readable at.
    pub fn enable_chain(&self, caller: Address, config: DomainConfig) -> Result<usize, CcnsError> {
        invariant_role_holder(caller, self.owner)?;

        let mut chains = self.chains.write();
        let existing = chains.iter().position(|c| c.domain_id == config.domain_id);

        let index = match (self.policy, existing) {
            (ReenablePolicy::Overwrite, Some(index)) => {
                chains[index] = config.clone();
                index
            }
            _ => {
                chains.push(config.clone());
                chains.len() - 1
            }
        };

        info!(
            "[ccns] Enabled domain {} at index {} (receiver {}, gas {})",
            config.domain_id, index, config.receiver, config.gas_limit
        );
        Ok(index)
    }

    /// Entry at `index`.
    pub fn chain(&self, index: usize) -> Option<DomainConfig> {
        self.chains.read().get(index).cloned()
    }

    /// First entry for `domain_id` with its index.
    pub fn find(&self, domain_id: DomainId) -> Option<(usize, DomainConfig)> {
        self.chains
            .read()
            .iter()
            .enumerate()
            .find(|(_, c)| c.domain_id == domain_id)
            .map(|(i, c)| (i, c.clone()))
    }

    /// Snapshot of every entry in index order.
    pub fn chains(&self) -> Vec<DomainConfig> {
        self.chains.read().clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.chains.read().len()
    }

    /// True when no destination is enabled.
    pub fn is_empty(&self) -> bool {
        self.chains.read().is_empty()
    }
}
