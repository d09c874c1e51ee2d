//! # Deployment
//!
//! Wires one source domain and one destination domain over a
//! [`LocalTransport`]:
//!
//! 1. Source lookup store, writer = registrar
//! 2. Destination lookup store, writer = receiver
//! 3. Receiver bound to the destination router, the source domain and the registrar
//! 4. Receiver registered as the transport endpoint
//! 5. Destination enabled on the registrar
//!
//! With the default local network both sides share one domain id and one
//! router, as a single-process simulator hands out.

use std::sync::Arc;

use tracing::info;

use ccns::{
    Address, CcnsError, LocalTransport, LookupApi, LookupStore, MessagingTransport, Receiver,
    Registrar, Registration,
};

use crate::config::RuntimeConfig;

/// Address the registrar is deployed at.
pub const REGISTRAR_ADDRESS: Address = Address::repeat_byte(0x5A);

/// Address the receiver is deployed at.
pub const RECEIVER_ADDRESS: Address = Address::repeat_byte(0x6B);

/// Deployed components.
pub struct Deployment {
    /// Shared transport.
    pub transport: Arc<LocalTransport>,
    /// Source-domain registrar.
    pub registrar: Registrar<LocalTransport>,
    /// Destination-domain receiver.
    pub receiver: Arc<Receiver>,
    /// Source-domain lookup store.
    pub source_lookup: Arc<LookupStore>,
    /// Destination-domain lookup store.
    pub destination_lookup: Arc<LookupStore>,
}

/// What a scenario run observed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScenarioReport {
    /// Receipt from the source domain.
    pub registration: Registration,
    /// Messages delivered successfully.
    pub delivered: usize,
    /// Owner resolved on the source domain.
    pub source_owner: Address,
    /// Owner resolved on the destination domain.
    pub destination_owner: Address,
}

impl Deployment {
    /// Deploy every component as `config.deployer`.
    pub fn deploy(config: &RuntimeConfig) -> Result<Self, CcnsError> {
        let network = config.network.clone();
        let domain = network.domain_id;
        let deployer = config.deployer;

        let transport = Arc::new(LocalTransport::new(network.clone(), config.fees.clone()));
        transport.connect_domain(domain, network.destination_router);

        let ccns_config = config.ccns_config();
        let source_lookup = Arc::new(LookupStore::new(deployer));
        source_lookup.assign_writer(deployer, REGISTRAR_ADDRESS)?;
        let registrar = Registrar::new(
            REGISTRAR_ADDRESS,
            deployer,
            source_lookup.clone(),
            transport.clone(),
            ccns_config.clone(),
        );

        let destination_lookup = Arc::new(LookupStore::new(deployer));
        destination_lookup.assign_writer(deployer, RECEIVER_ADDRESS)?;
        let receiver = Arc::new(
            Receiver::from_config(
                RECEIVER_ADDRESS,
                network.destination_router,
                destination_lookup.clone(),
                domain,
                &ccns_config,
            )
            .with_trusted_sender(REGISTRAR_ADDRESS),
        );
        transport.register_endpoint(domain, RECEIVER_ADDRESS, receiver.clone());

        registrar.enable_chain_with_default_gas(deployer, domain, RECEIVER_ADDRESS)?;
        if config.deposit > 0 {
            registrar.deposit(registrar.config().fee_token, config.deposit);
        }

        info!(
            "Deployed registrar {} and receiver {} on domain {}",
            REGISTRAR_ADDRESS,
            RECEIVER_ADDRESS,
            transport.domain_id()
        );

        Ok(Self {
            transport,
            registrar,
            receiver,
            source_lookup,
            destination_lookup,
        })
    }

    /// Register `name` for `registrant`, relay every pending message and
    /// resolve the name on both domains.
    pub async fn run_scenario(
        &self,
        registrant: Address,
        name: &str,
    ) -> Result<ScenarioReport, CcnsError> {
        let registration = self.registrar.register(registrant, name).await?;

        let outcomes = self.transport.relay_all().await;
        let delivered = outcomes.iter().filter(|o| o.is_delivered()).count();

        Ok(ScenarioReport {
            registration,
            delivered,
            source_owner: self.source_lookup.lookup(name),
            destination_owner: self.destination_lookup.lookup(name),
        })
    }
}
