//! # Integration Test Flows
//!
//! Registration on the source domain, relay through the transport and
//! resolution on the destination domains.
//!
//! ## Flows Tested:
//!
//! 1. **Register → relay → lookup** on one and several destinations
//! 2. **Ordering**: redelivery, last-writer-wins and monotonic sequences
//! 3. **Configuration**: re-enabling a destination, append policy
//! 4. **Fees**: quoting, deposits, shortfall and withdrawal
//! 5. **Dead letters**: failed delivery and manual execution
//! 6. **Send outages**: a destination whose send is rejected

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::super::fixtures::{Network, ALICE, BOB, OWNER, REGISTRAR, SOURCE};
    use ccns::{
        Address, CcnsConfig, CcnsError, DomainConfig, DomainId, FeeSchedule, FeeToken,
        LocalTransport, LookupApi, LookupStore, MessageHandler, MessageId, MessagingTransport,
        NetworkConfig, OutboundMessage, Receiver, ReenablePolicy, Registrar, TransportError,
    };
    use ccns_runtime::{Deployment, RuntimeConfig, RECEIVER_ADDRESS};

    const NAME: &str = "alice.ccns";

    // =============================================================================
    // REGISTER → RELAY → LOOKUP
    // =============================================================================

    /// The deployment fixture: one simulator domain acting as both source
    /// and destination.
    #[tokio::test]
    async fn test_single_domain_deployment_resolves_name() {
        let config = RuntimeConfig::default();
        let deployment = Deployment::deploy(&config).unwrap();

        assert_eq!(
            deployment.registrar.chain(0),
            Some(DomainConfig::new(
                config.network.domain_id,
                RECEIVER_ADDRESS,
                1_000_000
            ))
        );

        let registration = deployment.registrar.register(ALICE, NAME).await.unwrap();
        assert_eq!(registration.fan_out(), 1);
        assert_eq!(deployment.destination_lookup.lookup(NAME), Address::ZERO);

        deployment.transport.relay_all().await;

        assert_eq!(deployment.destination_lookup.lookup(NAME), ALICE);
        assert_eq!(deployment.source_lookup.lookup(NAME), ALICE);
    }

    #[tokio::test]
    async fn test_register_reaches_every_destination() {
        let network = Network::new(3);

        let registration = network.registrar.register(ALICE, NAME).await.unwrap();

        assert_eq!(registration.fan_out(), 3);
        assert_eq!(network.source_lookup.lookup(NAME), ALICE);
        assert_eq!(network.transport.pending(), 3);
        for destination in &network.destinations {
            assert_eq!(destination.lookup(NAME), Address::ZERO, "not delivered yet");
        }

        let outcomes = network.transport.relay_all().await;

        assert!(outcomes.iter().all(|o| o.is_delivered()));
        for destination in &network.destinations {
            assert_eq!(destination.lookup(NAME), ALICE);
            assert_eq!(destination.receiver.delivered_count(), 1);
        }
    }

    #[tokio::test]
    async fn test_messages_follow_enable_order() {
        let network = Network::new(3);
        network.registrar.register(ALICE, NAME).await.unwrap();

        let destinations: Vec<_> = network
            .transport
            .pending_messages()
            .iter()
            .map(|p| p.destination)
            .collect();
        let expected: Vec<_> = network.destinations.iter().map(|d| d.domain).collect();
        assert_eq!(destinations, expected);
    }

    #[tokio::test]
    async fn test_no_destinations_registers_locally() {
        let network = Network::new(0);

        let registration = network.registrar.register(ALICE, NAME).await.unwrap();

        assert_eq!(registration.fan_out(), 0);
        assert_eq!(network.source_lookup.lookup(NAME), ALICE);
        assert_eq!(network.transport.pending(), 0);
    }

    #[tokio::test]
    async fn test_unknown_name_resolves_to_zero() {
        let network = Network::new(1);
        network.registrar.register(ALICE, NAME).await.unwrap();
        network.transport.relay_all().await;

        assert_eq!(network.destination(0).lookup("bob.ccns"), Address::ZERO);
        assert_eq!(network.source_lookup.lookup("bob.ccns"), Address::ZERO);
    }

    // =============================================================================
    // ORDERING
    // =============================================================================

    #[tokio::test]
    async fn test_redelivery_is_idempotent() {
        let network = Network::new(1);
        network.registrar.register(ALICE, NAME).await.unwrap();
        let destination = network.destination(0);
        let pending = network.transport.take_next().unwrap();

        for _ in 0..3 {
            destination
                .receiver
                .handle(destination.router, pending.message.clone())
                .await
                .unwrap();
        }

        assert_eq!(destination.lookup.len(), 1);
        assert_eq!(destination.lookup(NAME), ALICE);
    }

    #[tokio::test]
    async fn test_last_registration_wins() {
        let network = Network::new(2);
        network.registrar.register(ALICE, NAME).await.unwrap();
        network.registrar.register(BOB, NAME).await.unwrap();
        network.transport.relay_all().await;

        assert_eq!(network.source_lookup.lookup(NAME), BOB);
        for destination in &network.destinations {
            assert_eq!(destination.lookup(NAME), BOB);
        }
    }

    #[tokio::test]
    async fn test_reordered_delivery_applies_last_arrival() {
        let network = Network::new(1);
        network.registrar.register(ALICE, NAME).await.unwrap();
        network.registrar.register(BOB, NAME).await.unwrap();
        let destination = network.destination(0);

        let first = network.transport.take_next().unwrap();
        let second = network.transport.take_next().unwrap();
        destination
            .receiver
            .handle(destination.router, second.message)
            .await
            .unwrap();
        destination
            .receiver
            .handle(destination.router, first.message)
            .await
            .unwrap();

        // The stale binding wins on the destination.
        assert_eq!(destination.lookup(NAME), ALICE);
        assert_eq!(network.source_lookup.lookup(NAME), BOB);
    }

    #[tokio::test]
    async fn test_monotonic_ordering_rejects_stale_delivery() {
        let network = Network::build(1, FeeSchedule::free(), CcnsConfig::for_testing());
        network.registrar.register(ALICE, NAME).await.unwrap();
        network.registrar.register(BOB, NAME).await.unwrap();
        let destination = network.destination(0);

        let first = network.transport.take_next().unwrap();
        let second = network.transport.take_next().unwrap();
        destination
            .receiver
            .handle(destination.router, second.message)
            .await
            .unwrap();
        let err = destination
            .receiver
            .handle(destination.router, first.message)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CcnsError::StaleDelivery {
                applied: 2,
                received: 1,
                ..
            }
        ));
        assert_eq!(destination.lookup(NAME), BOB);
    }

    // =============================================================================
    // CONFIGURATION
    // =============================================================================

    #[tokio::test]
    async fn test_reenabling_destination_overwrites_entry() {
        let network = Network::new(1);
        let destination = network.destination(0);
        let endpoint = destination.receiver.address();
        network
            .registrar
            .enable_chain(OWNER, destination.domain, endpoint, 500_000)
            .unwrap();

        assert_eq!(network.registrar.chains().len(), 1);
        assert_eq!(
            network.registrar.chain(0).map(|c| c.gas_limit),
            Some(500_000)
        );

        network.registrar.register(ALICE, NAME).await.unwrap();
        let pending = network.transport.pending_messages();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn test_append_policy_sends_per_entry() {
        let config = CcnsConfig {
            reenable_policy: ReenablePolicy::Append,
            ..CcnsConfig::default()
        };
        let network = Network::build(1, FeeSchedule::free(), config);
        let destination = network.destination(0);
        let endpoint = destination.receiver.address();
        network
            .registrar
            .enable_chain_with_default_gas(OWNER, destination.domain, endpoint)
            .unwrap();

        let registration = network.registrar.register(ALICE, NAME).await.unwrap();
        network.transport.relay_all().await;

        assert_eq!(registration.fan_out(), 2);
        assert_eq!(destination.receiver.delivered_count(), 2);
        assert_eq!(destination.lookup(NAME), ALICE);
    }

    #[tokio::test]
    async fn test_destination_added_later_only_sees_new_registrations() {
        let network = Network::new(1);
        network
            .registrar
            .register(ALICE, "early.ccns")
            .await
            .unwrap();
        network.transport.relay_all().await;

        let other = Network::new(2);
        let late = other.destination(1);
        network.transport.connect_domain(late.domain, late.router);
        network
            .registrar
            .enable_chain_with_default_gas(OWNER, late.domain, late.receiver.address())
            .unwrap();
        network.registrar.register(BOB, "late.ccns").await.unwrap();

        assert_eq!(network.transport.pending(), 2);
        assert_eq!(network.registrar.chains().len(), 2);
    }

    // =============================================================================
    // FEES
    // =============================================================================

    fn paid_network(destinations: usize) -> Network {
        Network::build(
            destinations,
            FeeSchedule {
                base_fee: 100,
                ..FeeSchedule::free()
            },
            CcnsConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_fees_are_paid_from_deposit() {
        let network = paid_network(2);
        network.registrar.deposit(FeeToken::Native, 250);

        network.registrar.register(ALICE, NAME).await.unwrap();

        assert_eq!(network.registrar.balance(FeeToken::Native), 50);
        assert_eq!(network.transport.collected_fees(FeeToken::Native), 200);
    }

    #[tokio::test]
    async fn test_fee_shortfall_changes_nothing() {
        let network = paid_network(2);
        network.registrar.deposit(FeeToken::Native, 150);

        let err = network.registrar.register(ALICE, NAME).await.unwrap_err();

        match err {
            CcnsError::TransportSendFailed {
                destination,
                reason,
            } => {
                assert_eq!(destination, network.destination(1).domain);
                assert!(matches!(
                    reason,
                    TransportError::InsufficientFee {
                        required: 200,
                        available: 150,
                        ..
                    }
                ));
            }
            other => panic!("expected TransportSendFailed, got {:?}", other),
        }
        assert_eq!(network.source_lookup.lookup(NAME), Address::ZERO);
        assert_eq!(network.registrar.balance(FeeToken::Native), 150);
        assert_eq!(network.transport.pending(), 0);
    }

    #[tokio::test]
    async fn test_link_fees_use_link_balance() {
        let link = NetworkConfig::local().link();
        let network = Network::build(
            1,
            FeeSchedule {
                base_fee: 10,
                ..FeeSchedule::free()
            },
            CcnsConfig::default().with_fee_token(link),
        );
        network.registrar.deposit(FeeToken::Native, 1_000);

        assert!(network.registrar.register(ALICE, NAME).await.is_err());

        network.registrar.deposit(link, 10);
        network.registrar.register(ALICE, NAME).await.unwrap();
        assert_eq!(network.transport.collected_fees(link), 10);
        assert_eq!(network.registrar.balance(FeeToken::Native), 1_000);
    }

    #[tokio::test]
    async fn test_owner_withdraws_remaining_balance() {
        let network = paid_network(1);
        network.registrar.deposit(FeeToken::Native, 300);
        network.registrar.register(ALICE, NAME).await.unwrap();

        let amount = network
            .registrar
            .withdraw(OWNER, FeeToken::Native, OWNER)
            .unwrap();

        assert_eq!(amount, 200);
        assert_eq!(
            network.registrar.withdraw(OWNER, FeeToken::Native, OWNER),
            Err(CcnsError::NothingToWithdraw(FeeToken::Native))
        );
    }

    // =============================================================================
    // DEAD LETTERS
    // =============================================================================

    #[tokio::test]
    async fn test_failed_delivery_can_be_executed_manually() {
        let network = Network::new(1);
        let destination = network.destination(0);
        network
            .transport
            .register_endpoint(destination.domain, destination.receiver.address(), {
                // Stand-in endpoint that rejects everything.
                let lookup = Arc::new(LookupStore::new(OWNER));
                Arc::new(Receiver::new(
                    destination.receiver.address(),
                    destination.router,
                    lookup,
                    SOURCE,
                ))
            });

        let registration = network.registrar.register(ALICE, NAME).await.unwrap();
        let outcomes = network.transport.relay_all().await;
        assert!(!outcomes[0].is_delivered());
        assert_eq!(destination.lookup(NAME), Address::ZERO);

        network.transport.register_endpoint(
            destination.domain,
            destination.receiver.address(),
            destination.receiver.clone(),
        );
        network
            .transport
            .manually_execute(registration.message_ids[0])
            .await
            .unwrap();

        assert_eq!(destination.lookup(NAME), ALICE);
        assert!(network.transport.failed().is_empty());
    }

    // =============================================================================
    // SEND OUTAGES
    // =============================================================================

    /// Forwards to a `LocalTransport`, rejecting the send at `reject_at`.
    struct OutageTransport {
        inner: Arc<LocalTransport>,
        reject_at: usize,
        sends: AtomicUsize,
    }

    #[async_trait]
    impl MessagingTransport for OutageTransport {
        fn domain_id(&self) -> DomainId {
            self.inner.domain_id()
        }

        fn is_chain_supported(&self, destination: DomainId) -> bool {
            self.inner.is_chain_supported(destination)
        }

        async fn get_fee(
            &self,
            destination: DomainId,
            message: &OutboundMessage,
        ) -> Result<u128, TransportError> {
            self.inner.get_fee(destination, message).await
        }

        async fn send(
            &self,
            sender: Address,
            destination: DomainId,
            message: OutboundMessage,
            fee: u128,
        ) -> Result<MessageId, TransportError> {
            if self.sends.fetch_add(1, Ordering::SeqCst) == self.reject_at {
                return Err(TransportError::Rejected("outage".to_string()));
            }
            self.inner.send(sender, destination, message, fee).await
        }
    }

    fn registrar_with_outage(
        network: &Network,
        reject_at: usize,
    ) -> (Registrar<OutageTransport>, Arc<LookupStore>) {
        let transport = Arc::new(OutageTransport {
            inner: network.transport.clone(),
            reject_at,
            sends: AtomicUsize::new(0),
        });
        let source_lookup = Arc::new(LookupStore::with_writer(OWNER, REGISTRAR));
        let registrar = Registrar::new(
            REGISTRAR,
            OWNER,
            source_lookup.clone(),
            transport,
            CcnsConfig::default(),
        );
        for destination in &network.destinations {
            let endpoint = destination.receiver.address();
            registrar
                .enable_chain_with_default_gas(OWNER, destination.domain, endpoint)
                .unwrap();
        }
        (registrar, source_lookup)
    }

    #[tokio::test]
    async fn test_rejected_send_keeps_source_and_delivered_destinations_in_step() {
        let network = Network::new(2);
        let (registrar, source_lookup) = registrar_with_outage(&network, 1);

        let registration = registrar.register(ALICE, NAME).await.unwrap();
        network.transport.relay_all().await;

        let delivered = network.destination(0);
        let missed = network.destination(1);
        assert_eq!(registration.fan_out(), 1);
        assert_eq!(registration.failed.len(), 1);
        assert_eq!(registration.failed[0].destination, missed.domain);
        assert_eq!(
            registration.failed[0].reason,
            TransportError::Rejected("outage".to_string())
        );
        assert_eq!(source_lookup.lookup(NAME), ALICE);
        assert_eq!(delivered.lookup(NAME), source_lookup.lookup(NAME));
        assert_eq!(missed.lookup(NAME), Address::ZERO);
    }

    #[tokio::test]
    async fn test_every_send_rejected_leaves_no_binding_anywhere() {
        let network = Network::new(1);
        let (registrar, source_lookup) = registrar_with_outage(&network, 0);

        let err = registrar.register(ALICE, NAME).await.unwrap_err();
        network.transport.relay_all().await;

        assert_eq!(
            err,
            CcnsError::send_failed(
                network.destination(0).domain,
                TransportError::Rejected("outage".to_string()),
            )
        );
        assert_eq!(source_lookup.lookup(NAME), Address::ZERO);
        assert_eq!(network.destination(0).lookup(NAME), Address::ZERO);
    }
}
