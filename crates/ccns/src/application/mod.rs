//! # Application Layer
//!
//! The four name service components. Each one is a sequential state
//! machine on its own domain; they are wired together only through the
//! lookup store handle and the messaging transport.

mod chain_config;
mod lookup;
mod receiver;
mod registrar;

pub use chain_config::ChainConfigStore;
pub use lookup::LookupStore;
pub use receiver::Receiver;
pub use registrar::Registrar;
