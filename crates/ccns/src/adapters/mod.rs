//! # Adapters Layer (Hexagonal Architecture)
//!
//! Implements the outbound transport port in-process.

mod local_transport;

pub use local_transport::{DeliveryOutcome, FailedDelivery, LocalTransport, PendingDelivery};
