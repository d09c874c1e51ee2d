//! # Name Service Configuration
//!
//! Configuration for the registrar, receiver and local transport.

use serde::{Deserialize, Serialize};

use crate::domain::{Address, DomainId, FeeToken};

/// Gas budget used for a destination when none is given.
pub const DEFAULT_GAS_LIMIT: u64 = 1_000_000;

/// Largest gas budget a destination accepts.
pub const MAX_GAS_LIMIT: u64 = 3_000_000;

/// What `enable_chain` does with a domain that is already configured.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReenablePolicy {
    /// Replace the existing entry in place, keeping its index.
    #[default]
    Overwrite,
    /// Append a second entry; the domain then receives one message per entry.
    Append,
}

/// How a receiver treats deliveries that arrive out of order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryOrdering {
    /// Every authenticated delivery overwrites the stored owner.
    #[default]
    LastWriteWins,
    /// Reject deliveries whose lane sequence is below the one already
    /// applied for the same name.
    MonotonicSequence,
}

/// Name service configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CcnsConfig {
    /// Token the registrar pays transport fees in.
    pub fee_token: FeeToken,
    /// Repeated `enable_chain` handling.
    pub reenable_policy: ReenablePolicy,
    /// Receiver ordering policy.
    pub delivery_ordering: DeliveryOrdering,
    /// Gas budget suggested for new destinations.
    pub default_gas_limit: u64,
}

impl Default for CcnsConfig {
    fn default() -> Self {
        Self {
            fee_token: FeeToken::Native,
            reenable_policy: ReenablePolicy::Overwrite,
            delivery_ordering: DeliveryOrdering::LastWriteWins,
            default_gas_limit: DEFAULT_GAS_LIMIT,
        }
    }
}

impl CcnsConfig {
    /// Create a config for testing (strict ordering).
    pub fn for_testing() -> Self {
        Self {
            delivery_ordering: DeliveryOrdering::MonotonicSequence,
            ..Self::default()
        }
    }

    /// Pay fees in `token` instead of the native currency.
    pub fn with_fee_token(mut self, token: FeeToken) -> Self {
        self.fee_token = token;
        self
    }
}

/// Values a transport publishes for one domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Identifier of the domain.
    pub domain_id: DomainId,
    /// Router used to send from this domain.
    pub source_router: Address,
    /// Router that delivers into this domain.
    pub destination_router: Address,
    /// Wrapped native gas token.
    pub wrapped_native: Address,
    /// Token accepted for fee payment besides native currency.
    pub fee_token: Address,
}

impl NetworkConfig {
    /// Loopback values handed out by a local single-domain simulator:
    /// one domain, one router for both directions.
    pub fn local() -> Self {
        let router = Address::repeat_byte(0xC1);
        Self {
            domain_id: DomainId(16015286601757825753),
            source_router: router,
            destination_router: router,
            wrapped_native: Address::repeat_byte(0xE7),
            fee_token: Address::repeat_byte(0x11),
        }
    }

    /// The fee token as a [`FeeToken`].
    pub fn link(&self) -> FeeToken {
        FeeToken::Token(self.fee_token)
    }
}

/// Fee schedule of a local transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSchedule {
    /// Flat fee per message.
    pub base_fee: u128,
    /// Fee per unit of gas budget.
    pub fee_per_gas: u128,
    /// Fee per payload byte.
    pub fee_per_byte: u128,
    /// Largest accepted gas budget.
    pub max_gas_limit: u64,
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::free()
    }
}

impl FeeSchedule {
    /// Zero fees, as a local simulator charges.
    pub fn free() -> Self {
        Self {
            base_fee: 0,
            fee_per_gas: 0,
            fee_per_byte: 0,
            max_gas_limit: MAX_GAS_LIMIT,
        }
    }

    /// Fee for a message of `payload_len` bytes with `gas_limit` budget.
    pub fn quote(&self, gas_limit: u64, payload_len: usize) -> u128 {
        self.base_fee
            .saturating_add(self.fee_per_gas.saturating_mul(gas_limit as u128))
            .saturating_add(self.fee_per_byte.saturating_mul(payload_len as u128))
    }
}
