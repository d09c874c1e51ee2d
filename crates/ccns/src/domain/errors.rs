//! # Domain Errors
//!
//! Error types for the Cross-Chain Name Service.
//!
//! Authorization and origin failures abort the single call that triggered
//! them. Nothing is retried inside the core.

use super::value_objects::{Address, DomainId, FeeToken, MessageId};
use thiserror::Error;

/// Errors raised synchronously by a messaging transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Destination domain is not reachable through this transport.
    #[error("Unsupported destination domain: {0}")]
    UnsupportedDestination(DomainId),

    /// Fee supplied (or available) is below the quoted fee.
    #[error("Insufficient fee in {token}: required {required}, available {available}")]
    InsufficientFee {
        /// Token the fee is paid in.
        token: FeeToken,
        /// Quoted fee.
        required: u128,
        /// Amount supplied or held.
        available: u128,
    },

    /// Requested gas budget exceeds what the destination accepts.
    #[error("Gas limit {requested} exceeds maximum {max}")]
    GasLimitExceeded {
        /// Gas budget carried by the message.
        requested: u64,
        /// Maximum the transport allows.
        max: u64,
    },

    /// Any other synchronous rejection.
    #[error("Send rejected: {0}")]
    Rejected(String),
}

/// Cross-Chain Name Service error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CcnsError {
    /// Caller lacks the role required by the operation.
    #[error("Unauthorized caller {caller}: requires {required}")]
    Unauthorized {
        /// The address that made the call.
        caller: Address,
        /// The address holding the role (zero if unassigned).
        required: Address,
    },

    /// Delivery did not come from the bound transport endpoint.
    #[error("Untrusted caller {caller}: deliveries accepted only from router {router}")]
    UntrustedCaller {
        /// The address that invoked the delivery.
        caller: Address,
        /// The trusted router.
        router: Address,
    },

    /// Delivery claims a source domain or sender other than the bound one.
    #[error("Untrusted origin: domain {source_domain}, sender {sender}")]
    UntrustedOrigin {
        /// Claimed source domain.
        source_domain: DomainId,
        /// Claimed sender endpoint.
        sender: Address,
    },

    /// Outbound send rejected by the transport.
    #[error("Send to domain {destination} failed: {reason}")]
    TransportSendFailed {
        /// Destination of the failed send.
        destination: DomainId,
        /// Transport-level cause.
        #[source]
        reason: TransportError,
    },

    /// Message payload could not be decoded into a name binding.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Delivery carries a lane sequence lower than the one already applied.
    #[error("Stale delivery for `{name}`: sequence {received} < applied {applied}")]
    StaleDelivery {
        /// Name the delivery targets.
        name: String,
        /// Highest sequence already applied for the name.
        applied: u64,
        /// Sequence carried by the delivery.
        received: u64,
    },

    /// Withdraw requested with an empty balance.
    #[error("Nothing to withdraw in {0}")]
    NothingToWithdraw(FeeToken),

    /// No handler is registered for a delivery target.
    #[error("No endpoint {endpoint} registered on domain {domain}")]
    UnknownEndpoint {
        /// Destination domain.
        domain: DomainId,
        /// Receiver endpoint address.
        endpoint: Address,
    },

    /// Message id not known to the transport.
    #[error("Unknown message {0}")]
    UnknownMessage(MessageId),
}

impl CcnsError {
    /// Wrap a transport error for a destination.
    pub fn send_failed(destination: DomainId, reason: TransportError) -> Self {
        CcnsError::TransportSendFailed {
            destination,
            reason,
        }
    }
}
