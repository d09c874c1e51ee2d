//! # CCNS - Cross-Chain Name Service
//!
//! Register a name once on a source domain and resolve it on every
//! enabled destination domain.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! - `ChainConfigStore` keeps the owner-managed list of destinations
//! - `Registrar` records a binding locally and fans it out, one message per destination
//! - `Receiver` authenticates deliveries and writes them into its domain's lookup
//! - `LookupStore` maps names to owners, written only by its designated writer
//!
//! ## Trust Checks
//!
//! | Check | Error |
//! |-------|-------|
//! | Owner-only configuration | `Unauthorized` |
//! | Writer-only lookup writes | `Unauthorized` |
//! | Deliveries from the bound router | `UntrustedCaller` |
//! | Messages from the bound source domain | `UntrustedOrigin` |
//!
//! ## Module Structure
//!
//! ```text
//! ccns/
//! ├── domain/          # Address, DomainId, messages, errors, invariants
//! ├── algorithms/      # Payload codec, message ids, fan-out planning
//! ├── application/     # ChainConfigStore, LookupStore, Registrar, Receiver
//! ├── ports/           # RegistrarApi, LookupApi, MessageHandler, MessagingTransport
//! └── adapters/        # LocalTransport
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

// Re-exports
pub use adapters::{DeliveryOutcome, FailedDelivery, LocalTransport, PendingDelivery};
pub use algorithms::{
    build_outbound, decode_binding, derive_message_id, encode_binding, plan_binding,
    plan_fan_out, FanOutPlan, PlannedSend, MAX_PAYLOAD_BYTES,
};
pub use application::{ChainConfigStore, LookupStore, Receiver, Registrar};
pub use config::{
    CcnsConfig, DeliveryOrdering, FeeSchedule, NetworkConfig, ReenablePolicy, DEFAULT_GAS_LIMIT,
    MAX_GAS_LIMIT,
};
pub use domain::{
    invariant_designated_writer, invariant_role_holder, invariant_sufficient_fee,
    invariant_trusted_caller, invariant_trusted_origin, Address, CcnsError, DomainConfig,
    DomainId, FailedSend, FeeToken, InboundMessage, MessageId, NameBinding, OutboundMessage,
    ParseAddressError, Registration, TransportError,
};
pub use ports::{
    LookupApi, MessageHandler, MessagingTransport, MockTransport, RecordedSend, RegistrarApi,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
