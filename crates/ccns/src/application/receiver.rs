//! # Receiver
//!
//! Destination-domain entry point, invoked by the transport router.
//!
//! Both checks must pass before the payload is even decoded:
//!
//! 1. the call comes from the router bound at construction (`UntrustedCaller`),
//! 2. the message comes from the bound source domain and, when pinned, the
//!    bound registrar (`UntrustedOrigin`).
//!
//! A successful delivery performs exactly one lookup write. Nothing is sent
//! back to the source domain.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::lookup::LookupStore;
use crate::algorithms::decode_binding;
use crate::config::{CcnsConfig, DeliveryOrdering};
use crate::domain::{
    invariant_trusted_caller, invariant_trusted_origin, Address, CcnsError, DomainId,
    InboundMessage, MessageId, NameBinding,
};
use crate::ports::MessageHandler;

#[derive(Default)]
struct DeliveryStats {
    delivered: u64,
    last_message_id: Option<MessageId>,
}

/// Destination-domain receiver.
pub struct Receiver {
    /// Address of this receiver on its domain (the lookup writer).
    address: Address,
    /// Only router allowed to deliver.
    router: Address,
    /// Only source domain accepted.
    source_domain: DomainId,
    /// Registrar address on the source domain, when pinned.
    trusted_sender: Option<Address>,
    /// Out-of-order handling.
    ordering: DeliveryOrdering,
    /// Local lookup store; this receiver must be its writer.
    lookup: Arc<LookupStore>,
    /// Highest lane sequence applied per name.
    applied: RwLock<HashMap<String, u64>>,
    stats: Mutex<DeliveryStats>,
}

impl Receiver {
    /// Create a receiver at `address` trusting `router` and `source_domain`.
    pub fn new(
        address: Address,
        router: Address,
        lookup: Arc<LookupStore>,
        source_domain: DomainId,
    ) -> Self {
        Self {
            address,
            router,
            source_domain,
            trusted_sender: None,
            ordering: DeliveryOrdering::default(),
            lookup,
            applied: RwLock::new(HashMap::new()),
            stats: Mutex::new(DeliveryStats::default()),
        }
    }

    /// Also require messages to come from `sender` (the source registrar).
    pub fn with_trusted_sender(mut self, sender: Address) -> Self {
        self.trusted_sender = Some(sender);
        self
    }

    /// Use `ordering` for out-of-order deliveries.
    pub fn with_ordering(mut self, ordering: DeliveryOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Receiver using the delivery ordering from `config`.
    pub fn from_config(
        address: Address,
        router: Address,
        lookup: Arc<LookupStore>,
        source_domain: DomainId,
        config: &CcnsConfig,
    ) -> Self {
        Self::new(address, router, lookup, source_domain)
            .with_ordering(config.delivery_ordering)
    }

    /// Out-of-order handling in use.
    pub fn ordering(&self) -> DeliveryOrdering {
        self.ordering
    }

    /// Address of this receiver.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Router trusted for deliveries.
    pub fn router(&self) -> Address {
        self.router
    }

    /// Source domain trusted for deliveries.
    pub fn source_domain(&self) -> DomainId {
        self.source_domain
    }

    /// Local lookup store.
    pub fn lookup_store(&self) -> &Arc<LookupStore> {
        &self.lookup
    }

    /// Successful deliveries so far.
    pub fn delivered_count(&self) -> u64 {
        self.stats.lock().delivered
    }

    /// Id of the last applied message.
    pub fn last_message_id(&self) -> Option<MessageId> {
        self.stats.lock().last_message_id
    }

    /// Authenticate and apply one delivered message.
    pub fn deliver(
        &self,
        caller: Address,
        message: &InboundMessage,
    ) -> Result<NameBinding, CcnsError> {
        if let Err(e) = invariant_trusted_caller(caller, self.router) {
            warn!("[ccns] Rejected delivery {}: {}", message.message_id, e);
            return Err(e);
        }
        if let Err(e) = invariant_trusted_origin(
            message.source_domain,
            message.sender,
            self.source_domain,
            self.trusted_sender,
        ) {
            warn!("[ccns] Rejected delivery {}: {}", message.message_id, e);
            return Err(e);
        }

        let binding = decode_binding(&message.data)?;

        // Held across the write so the sequence check and the write are one step.
        let mut applied = self.applied.write();
        if self.ordering == DeliveryOrdering::MonotonicSequence {
            if let Some(&seen) = applied.get(&binding.name) {
                if message.sequence_number < seen {
                    return Err(CcnsError::StaleDelivery {
                        name: binding.name,
                        applied: seen,
                        received: message.sequence_number,
                    });
                }
            }
        }

        self.lookup.set(self.address, &binding.name, binding.owner)?;

        let seen = applied.entry(binding.name.clone()).or_insert(0);
        *seen = (*seen).max(message.sequence_number);
        drop(applied);

        let mut stats = self.stats.lock();
        stats.delivered += 1;
        stats.last_message_id = Some(message.message_id);

        info!(
            "[ccns] Applied `{}` -> {} from domain {} ({})",
            binding.name, binding.owner, message.source_domain, message.message_id
        );
        Ok(binding)
    }
}

#[async_trait]
impl MessageHandler for Receiver {
    async fn handle(&self, caller: Address, message: InboundMessage) -> Result<(), CcnsError> {
        self.deliver(caller, &message).map(|_| ())
    }
}
