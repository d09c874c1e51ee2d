//! # Payload Codec
//!
//! Binary encoding of name bindings and derivation of message ids.

use bincode::Options;
use sha3::{Digest, Keccak256};

use crate::domain::{Address, CcnsError, DomainId, MessageId, NameBinding, OutboundMessage};

/// Upper bound on an encoded payload, enforced on encode and decode.
pub const MAX_PAYLOAD_BYTES: u64 = 4 * 1024;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_limit(MAX_PAYLOAD_BYTES)
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

/// Encode a binding into a message payload.
pub fn encode_binding(binding: &NameBinding) -> Result<Vec<u8>, CcnsError> {
    codec()
        .serialize(binding)
        .map_err(|e| CcnsError::InvalidPayload(e.to_string()))
}

/// Decode a message payload into a binding.
pub fn decode_binding(data: &[u8]) -> Result<NameBinding, CcnsError> {
    codec()
        .deserialize(data)
        .map_err(|e| CcnsError::InvalidPayload(e.to_string()))
}

/// Derive the Keccak-256 id of a message on a lane.
///
/// Covers the lane (source, destination, sequence), the sender and the
/// full outbound message, so two sends never share an id.
pub fn derive_message_id(
    source: DomainId,
    destination: DomainId,
    sequence_number: u64,
    sender: Address,
    message: &OutboundMessage,
) -> MessageId {
    let mut hasher = Keccak256::new();
    hasher.update(source.0.to_be_bytes());
    hasher.update(destination.0.to_be_bytes());
    hasher.update(sequence_number.to_be_bytes());
    hasher.update(sender.as_bytes());
    hasher.update(message.receiver.as_bytes());
    hasher.update(message.gas_limit.to_be_bytes());
    hasher.update((message.data.len() as u64).to_be_bytes());
    hasher.update(&message.data);

    let result = hasher.finalize();
    let mut id = [0u8; 32];
    id.copy_from_slice(&result);
    MessageId(id)
}
