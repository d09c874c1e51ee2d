//! # Inbound Ports
//!
//! API traits defining what the name service offers: the client surface
//! (`RegistrarApi`, `LookupApi`) and the transport-facing delivery
//! capability (`MessageHandler`).

use crate::domain::{Address, CcnsError, DomainConfig, DomainId, InboundMessage, Registration};
use async_trait::async_trait;

/// Source-domain registration API - inbound port.
#[async_trait]
pub trait RegistrarApi: Send + Sync {
    /// Enable (or re-configure) a destination domain. Owner only.
    fn enable_chain(
        &self,
        caller: Address,
        domain_id: DomainId,
        receiver: Address,
        gas_limit: u64,
    ) -> Result<(), CcnsError>;

    /// Bind `name` to `caller` locally and fan the binding out to every
    /// enabled destination.
    async fn register(&self, caller: Address, name: &str) -> Result<Registration, CcnsError>;

    /// Enabled destinations in stable index order.
    fn chains(&self) -> Vec<DomainConfig>;
}

/// Read-only resolution API - inbound port.
pub trait LookupApi: Send + Sync {
    /// Owner of `name`, or [`Address::ZERO`] when unknown.
    fn lookup(&self, name: &str) -> Address;
}

/// Delivery capability invoked by the transport on a destination domain.
///
/// Not a client API: implementations authenticate `caller` against the
/// router they were bound to.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// Process one delivered message.
    async fn handle(&self, caller: Address, message: InboundMessage) -> Result<(), CcnsError>;
}
