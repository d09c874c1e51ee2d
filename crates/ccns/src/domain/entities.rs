//! # Domain Entities
//!
//! Core entities for the Cross-Chain Name Service.

use super::errors::TransportError;
use super::value_objects::{Address, DomainId, FeeToken, MessageId};
use serde::{Deserialize, Serialize};

/// Routing and budget metadata for one destination domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainConfig {
    /// Destination domain identifier.
    pub domain_id: DomainId,
    /// Receiver endpoint deployed on the destination domain.
    pub receiver: Address,
    /// Gas reserved for executing the delivery on the destination.
    pub gas_limit: u64,
}

impl DomainConfig {
    /// Create a new domain config.
    pub fn new(domain_id: DomainId, receiver: Address, gas_limit: u64) -> Self {
        Self {
            domain_id,
            receiver,
            gas_limit,
        }
    }
}

/// A name → owner binding, the payload of every cross-domain message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameBinding {
    /// Registered name.
    pub name: String,
    /// Address the name resolves to.
    pub owner: Address,
}

impl NameBinding {
    /// Create a new binding.
    pub fn new(name: impl Into<String>, owner: Address) -> Self {
        Self {
            name: name.into(),
            owner,
        }
    }
}

/// Message handed to the transport on the source domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Receiver endpoint on the destination domain.
    pub receiver: Address,
    /// Encoded payload.
    pub data: Vec<u8>,
    /// Gas budget for the delivery.
    pub gas_limit: u64,
    /// Token the fee is paid in.
    pub fee_token: FeeToken,
}

/// Message as delivered to a receiver on the destination domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Transport-assigned message id.
    pub message_id: MessageId,
    /// Domain the message was sent from.
    pub source_domain: DomainId,
    /// Endpoint that sent the message on the source domain.
    pub sender: Address,
    /// Per-lane sequence number assigned by the transport.
    pub sequence_number: u64,
    /// Encoded payload.
    pub data: Vec<u8>,
}

/// A destination whose send was rejected after the binding was recorded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedSend {
    /// Destination domain.
    pub destination: DomainId,
    /// Why the transport rejected the send.
    pub reason: TransportError,
}

/// Receipt returned by a successful registration.
///
/// The binding stays recorded on the source domain unless every send was
/// rejected. Destinations the transport rejected are listed in `failed`
/// and do not receive the binding until the name is registered again.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Registration {
    /// Registered name.
    pub name: String,
    /// Owner recorded for the name.
    pub owner: Address,
    /// One message per accepted send, in enable order.
    pub message_ids: Vec<MessageId>,
    /// Rejected sends, in enable order.
    pub failed: Vec<FailedSend>,
}

impl Registration {
    /// Number of destinations the binding was sent to.
    pub fn fan_out(&self) -> usize {
        self.message_ids.len()
    }

    /// True when every enabled destination accepted the binding.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
