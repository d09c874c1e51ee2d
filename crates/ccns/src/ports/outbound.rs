//! # Outbound Ports
//!
//! The messaging transport the registrar sends through.

use crate::algorithms::derive_message_id;
use crate::domain::{Address, DomainId, MessageId, OutboundMessage, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;

/// Messaging transport - outbound port.
///
/// `send` returns as soon as the transport accepts the message; delivery
/// to the destination happens later, on the destination's own timeline.
#[async_trait]
pub trait MessagingTransport: Send + Sync {
    /// Domain this transport endpoint lives on.
    fn domain_id(&self) -> DomainId;

    /// Whether `destination` is reachable.
    fn is_chain_supported(&self, destination: DomainId) -> bool;

    /// Quote the fee for sending `message` to `destination`.
    async fn get_fee(
        &self,
        destination: DomainId,
        message: &OutboundMessage,
    ) -> Result<u128, TransportError>;

    /// Accept `message` for delivery, paying `fee`.
    async fn send(
        &self,
        sender: Address,
        destination: DomainId,
        message: OutboundMessage,
        fee: u128,
    ) -> Result<MessageId, TransportError>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// A send recorded by [`MockTransport`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedSend {
    /// Sending endpoint.
    pub sender: Address,
    /// Destination domain.
    pub destination: DomainId,
    /// Message handed over.
    pub message: OutboundMessage,
    /// Fee paid.
    pub fee: u128,
    /// Id returned to the sender.
    pub message_id: MessageId,
}

/// Mock transport for testing: flat fee, records every send.
#[derive(Default)]
pub struct MockTransport {
    /// Flat fee per message.
    pub fee: u128,
    /// Domains reported as unsupported.
    pub unsupported: HashSet<DomainId>,
    /// Reject every send after this many accepted ones.
    pub accept_limit: Option<usize>,
    sends: Mutex<Vec<RecordedSend>>,
}

impl MockTransport {
    /// Mock charging a flat `fee`.
    pub fn with_fee(fee: u128) -> Self {
        Self {
            fee,
            ..Default::default()
        }
    }

    /// Report `domain` as unsupported.
    pub fn without_destination(mut self, domain: DomainId) -> Self {
        self.unsupported.insert(domain);
        self
    }

    /// Accept `limit` sends, reject the rest.
    pub fn accepting(mut self, limit: usize) -> Self {
        self.accept_limit = Some(limit);
        self
    }

    /// Every accepted send so far.
    pub fn sends(&self) -> Vec<RecordedSend> {
        self.sends.lock().clone()
    }
}

#[async_trait]
impl MessagingTransport for MockTransport {
    fn domain_id(&self) -> DomainId {
        DomainId(0)
    }

    fn is_chain_supported(&self, destination: DomainId) -> bool {
        !self.unsupported.contains(&destination)
    }

    async fn get_fee(
        &self,
        destination: DomainId,
        _message: &OutboundMessage,
    ) -> Result<u128, TransportError> {
        if !self.is_chain_supported(destination) {
            return Err(TransportError::UnsupportedDestination(destination));
        }
        Ok(self.fee)
    }

    async fn send(
        &self,
        sender: Address,
        destination: DomainId,
        message: OutboundMessage,
        fee: u128,
    ) -> Result<MessageId, TransportError> {
        if !self.is_chain_supported(destination) {
            return Err(TransportError::UnsupportedDestination(destination));
        }
        if fee < self.fee {
            return Err(TransportError::InsufficientFee {
                token: message.fee_token,
                required: self.fee,
                available: fee,
            });
        }

        let mut sends = self.sends.lock();
        if self.accept_limit.is_some_and(|limit| sends.len() >= limit) {
            return Err(TransportError::Rejected("mock limit reached".to_string()));
        }

        let sequence = sends.len() as u64 + 1;
        let message_id =
            derive_message_id(self.domain_id(), destination, sequence, sender, &message);
        sends.push(RecordedSend {
            sender,
            destination,
            message,
            fee,
            message_id,
        });
        Ok(message_id)
    }
}
