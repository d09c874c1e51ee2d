//! Local Transport Adapter
//!
//! Implements `MessagingTransport` in-process for one source domain.
//! Accepted messages wait in a queue until `relay_next`/`relay_all` hands
//! them to the handler registered for the destination endpoint, with the
//! destination router as caller. Handler errors park the message in the
//! failed list, from where `manually_execute` can retry it.

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::algorithms::derive_message_id;
use crate::config::{FeeSchedule, NetworkConfig};
use crate::domain::{
    Address, CcnsError, DomainId, FeeToken, InboundMessage, MessageId, OutboundMessage,
    TransportError,
};
use crate::ports::{MessageHandler, MessagingTransport};

/// A message accepted by the transport and not yet delivered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingDelivery {
    /// Destination domain.
    pub destination: DomainId,
    /// Receiver endpoint on the destination.
    pub receiver: Address,
    /// Message as the receiver will see it.
    pub message: InboundMessage,
}

/// A delivery whose handler returned an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedDelivery {
    /// The delivery that failed.
    pub delivery: PendingDelivery,
    /// Error returned by the handler.
    pub error: CcnsError,
}

/// Result of relaying one message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Handler accepted the message.
    Delivered(MessageId),
    /// Handler rejected the message; it is now in the failed list.
    Failed(MessageId, CcnsError),
}

impl DeliveryOutcome {
    /// True for `Delivered`.
    pub fn is_delivered(&self) -> bool {
        matches!(self, DeliveryOutcome::Delivered(_))
    }
}

/// In-process transport for one source domain.
pub struct LocalTransport {
    /// Published values for the source domain.
    network: NetworkConfig,
    /// Fee schedule.
    fees: FeeSchedule,
    /// Reachable destinations and their delivering routers.
    routers: RwLock<HashMap<DomainId, Address>>,
    /// Handlers per (destination, endpoint).
    endpoints: RwLock<HashMap<(DomainId, Address), Arc<dyn MessageHandler>>>,
    /// Last sequence number used per destination lane.
    lanes: Mutex<HashMap<DomainId, u64>>,
    /// Accepted, undelivered messages in send order.
    queue: Mutex<VecDeque<PendingDelivery>>,
    /// Deliveries rejected by their handler.
    failed: Mutex<Vec<FailedDelivery>>,
    /// Fees collected per token.
    collected: Mutex<HashMap<FeeToken, u128>>,
}

impl LocalTransport {
    /// Create a transport for `network` with no destinations connected.
    pub fn new(network: NetworkConfig, fees: FeeSchedule) -> Self {
        Self {
            network,
            fees,
            routers: RwLock::new(HashMap::new()),
            endpoints: RwLock::new(HashMap::new()),
            lanes: Mutex::new(HashMap::new()),
            queue: Mutex::new(VecDeque::new()),
            failed: Mutex::new(Vec::new()),
            collected: Mutex::new(HashMap::new()),
        }
    }

    /// Free transport whose only destination is its own domain.
    pub fn loopback(network: NetworkConfig) -> Self {
        let transport = Self::new(network, FeeSchedule::free());
        transport.connect_domain(
            transport.network.domain_id,
            transport.network.destination_router,
        );
        transport
    }

    /// Published values for the source domain.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Fee schedule in use.
    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fees
    }

    /// Make `domain` reachable; its deliveries come from `router`.
    pub fn connect_domain(&self, domain: DomainId, router: Address) {
        self.routers.write().insert(domain, router);
        info!(
            "[ccns] Transport lane {} -> {} (router {})",
            self.network.domain_id, domain, router
        );
    }

    /// Route deliveries for `endpoint` on `domain` to `handler`.
    pub fn register_endpoint(
        &self,
        domain: DomainId,
        endpoint: Address,
        handler: Arc<dyn MessageHandler>,
    ) {
        self.endpoints.write().insert((domain, endpoint), handler);
    }

    /// Number of undelivered messages.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Snapshot of undelivered messages in send order.
    pub fn pending_messages(&self) -> Vec<PendingDelivery> {
        self.queue.lock().iter().cloned().collect()
    }

    /// Remove the oldest undelivered message without delivering it.
    pub fn take_next(&self) -> Option<PendingDelivery> {
        self.queue.lock().pop_front()
    }

    /// Deliveries rejected by their handler.
    pub fn failed(&self) -> Vec<FailedDelivery> {
        self.failed.lock().clone()
    }

    /// Fees collected in `token`.
    pub fn collected_fees(&self, token: FeeToken) -> u128 {
        self.collected.lock().get(&token).copied().unwrap_or(0)
    }

    /// Deliver the oldest pending message.
    pub async fn relay_next(&self) -> Option<DeliveryOutcome> {
        let delivery = self.take_next()?;
        Some(self.execute(delivery).await)
    }

    /// Deliver every pending message, including ones queued meanwhile.
    pub async fn relay_all(&self) -> Vec<DeliveryOutcome> {
        let mut outcomes = Vec::new();
        while let Some(outcome) = self.relay_next().await {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Retry a failed delivery. On another failure it goes back to the
    /// failed list and the error is returned.
    pub async fn manually_execute(&self, message_id: MessageId) -> Result<(), CcnsError> {
        let delivery = {
            let mut failed = self.failed.lock();
            let index = failed
                .iter()
                .position(|f| f.delivery.message.message_id == message_id)
                .ok_or(CcnsError::UnknownMessage(message_id))?;
            failed.remove(index).delivery
        };

        match self.execute(delivery).await {
            DeliveryOutcome::Delivered(_) => Ok(()),
            DeliveryOutcome::Failed(_, error) => Err(error),
        }
    }

    async fn execute(&self, delivery: PendingDelivery) -> DeliveryOutcome {
        let message_id = delivery.message.message_id;
        match self.dispatch(&delivery).await {
            Ok(()) => {
                debug!("[ccns] Delivered {} to {}", message_id, delivery.receiver);
                DeliveryOutcome::Delivered(message_id)
            }
            Err(error) => {
                warn!("[ccns] Delivery {} failed: {}", message_id, error);
                self.failed.lock().push(FailedDelivery {
                    delivery,
                    error: error.clone(),
                });
                DeliveryOutcome::Failed(message_id, error)
            }
        }
    }

    async fn dispatch(&self, delivery: &PendingDelivery) -> Result<(), CcnsError> {
        let unknown = || CcnsError::UnknownEndpoint {
            domain: delivery.destination,
            endpoint: delivery.receiver,
        };
        let router = self
            .routers
            .read()
            .get(&delivery.destination)
            .copied()
            .ok_or_else(unknown)?;
        let handler = self
            .endpoints
            .read()
            .get(&(delivery.destination, delivery.receiver))
            .cloned()
            .ok_or_else(unknown)?;

        handler.handle(router, delivery.message.clone()).await
    }

    fn check_route(
        &self,
        destination: DomainId,
        message: &OutboundMessage,
    ) -> Result<u128, TransportError> {
        if !self.is_chain_supported(destination) {
            return Err(TransportError::UnsupportedDestination(destination));
        }
        if message.gas_limit > self.fees.max_gas_limit {
            return Err(TransportError::GasLimitExceeded {
                requested: message.gas_limit,
                max: self.fees.max_gas_limit,
            });
        }
        match message.fee_token {
            FeeToken::Native => {}
            FeeToken::Token(token) if token == self.network.fee_token => {}
            FeeToken::Token(token) => {
                return Err(TransportError::Rejected(format!(
                    "fee token {} not accepted",
                    token
                )));
            }
        }
        Ok(self.fees.quote(message.gas_limit, message.data.len()))
    }
}

#[async_trait]
impl MessagingTransport for LocalTransport {
    fn domain_id(&self) -> DomainId {
        self.network.domain_id
    }

    fn is_chain_supported(&self, destination: DomainId) -> bool {
        self.routers.read().contains_key(&destination)
    }

    async fn get_fee(
        &self,
        destination: DomainId,
        message: &OutboundMessage,
    ) -> Result<u128, TransportError> {
        self.check_route(destination, message)
    }

    async fn send(
        &self,
        sender: Address,
        destination: DomainId,
        message: OutboundMessage,
        fee: u128,
    ) -> Result<MessageId, TransportError> {
        let required = self.check_route(destination, &message)?;
        if fee < required {
            return Err(TransportError::InsufficientFee {
                token: message.fee_token,
                required,
                available: fee,
            });
        }

        let sequence_number = {
            let mut lanes = self.lanes.lock();
            let lane = lanes.entry(destination).or_insert(0);
            *lane += 1;
            *lane
        };
        let message_id = derive_message_id(
            self.network.domain_id,
            destination,
            sequence_number,
            sender,
            &message,
        );

        {
            let mut collected = self.collected.lock();
            let total = collected.entry(message.fee_token).or_insert(0);
            *total = total.saturating_add(fee);
        }
        self.queue.lock().push_back(PendingDelivery {
            destination,
            receiver: message.receiver,
            message: InboundMessage {
                message_id,
                source_domain: self.network.domain_id,
                sender,
                sequence_number,
                data: message.data,
            },
        });

        info!(
            "[ccns] Accepted {} for domain {} (seq {}, fee {})",
            message_id, destination, sequence_number, fee
        );
        Ok(message_id)
    }
}
