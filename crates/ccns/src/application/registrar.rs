//! # Registrar
//!
//! Source-domain entry point. `register` binds a name to its caller in the
//! local lookup store, then sends the binding to every enabled destination.
//!
//! ## Registration steps
//!
//! 1. Encode the binding and quote every destination. An unsupported
//!    destination or a fee shortfall fails here, before any write.
//! 2. Write the binding into the local lookup store.
//! 3. Send one message per destination, paying each quoted fee from the
//!    registrar's balance. A rejected send refunds its fee and is listed
//!    in `Registration::failed`. Only when every send is rejected is the
//!    previous lookup value restored and `TransportSendFailed` returned.
//!
//! Delivery is not awaited: destinations apply the binding whenever the
//! transport delivers it.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::chain_config::ChainConfigStore;
use super::lookup::LookupStore;
use crate::algorithms::{encode_binding, plan_fan_out};
use crate::config::CcnsConfig;
use crate::domain::{
    invariant_role_holder, invariant_sufficient_fee, Address, CcnsError, DomainConfig, DomainId,
    FailedSend, FeeToken, NameBinding, Registration, TransportError,
};
use crate::ports::{MessagingTransport, RegistrarApi};

/// Source-domain registrar.
pub struct Registrar<T: MessagingTransport + ?Sized> {
    /// Address of this registrar on its domain (the message sender).
    address: Address,
    /// Configuration.
    config: CcnsConfig,
    /// Enabled destinations.
    chains: ChainConfigStore,
    /// Local lookup store; this registrar must be its writer.
    lookup: Arc<LookupStore>,
    /// Outbound transport.
    transport: Arc<T>,
    /// Fee balances held per token.
    balances: RwLock<HashMap<FeeToken, u128>>,
    /// Serialises registrations so the domain stays sequential across awaits.
    call_guard: tokio::sync::Mutex<()>,
}

impl<T: MessagingTransport + ?Sized> Registrar<T> {
    /// Create a registrar at `address`, owned by `owner`.
    pub fn new(
        address: Address,
        owner: Address,
        lookup: Arc<LookupStore>,
        transport: Arc<T>,
        config: CcnsConfig,
    ) -> Self {
        Self {
            address,
            chains: ChainConfigStore::with_policy(owner, config.reenable_policy),
            config,
            lookup,
            transport,
            balances: RwLock::new(HashMap::new()),
            call_guard: tokio::sync::Mutex::new(()),
        }
    }

    /// Address of this registrar.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Owner of the registrar.
    pub fn owner(&self) -> Address {
        self.chains.owner()
    }

    /// Domain the registrar sends from.
    pub fn domain_id(&self) -> DomainId {
        self.transport.domain_id()
    }

    /// Configuration in use.
    pub fn config(&self) -> &CcnsConfig {
        &self.config
    }

    /// Destination registry.
    pub fn chain_config(&self) -> &ChainConfigStore {
        &self.chains
    }

    /// Local lookup store.
    pub fn lookup_store(&self) -> &Arc<LookupStore> {
        &self.lookup
    }

    /// Enable `domain_id` as a destination. Owner only.
    pub fn enable_chain(
        &self,
        caller: Address,
        domain_id: DomainId,
        receiver: Address,
        gas_limit: u64,
    ) -> Result<(), CcnsError> {
        self.chains
            .enable_chain(caller, DomainConfig::new(domain_id, receiver, gas_limit))
            .map(|_| ())
    }

    /// Enable `domain_id` with the configured default gas budget. Owner only.
    pub fn enable_chain_with_default_gas(
        &self,
        caller: Address,
        domain_id: DomainId,
        receiver: Address,
    ) -> Result<(), CcnsError> {
        self.enable_chain(caller, domain_id, receiver, self.config.default_gas_limit)
    }

    /// Destination at `index`.
    pub fn chain(&self, index: usize) -> Option<DomainConfig> {
        self.chains.chain(index)
    }

    /// Every destination in index order.
    pub fn chains(&self) -> Vec<DomainConfig> {
        self.chains.chains()
    }

    /// Credit `amount` of `token` to the fee balance. Open to anyone.
    pub fn deposit(&self, token: FeeToken, amount: u128) {
        let mut balances = self.balances.write();
        let balance = balances.entry(token).or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    /// Fee balance held in `token`.
    pub fn balance(&self, token: FeeToken) -> u128 {
        self.balances.read().get(&token).copied().unwrap_or(0)
    }

    /// Move the whole `token` balance to `beneficiary`. Owner only.
    pub fn withdraw(
        &self,
        caller: Address,
        token: FeeToken,
        beneficiary: Address,
    ) -> Result<u128, CcnsError> {
        invariant_role_holder(caller, self.owner())?;

        let amount = self.balances.write().remove(&token).unwrap_or(0);
        if amount == 0 {
            return Err(CcnsError::NothingToWithdraw(token));
        }

        info!("[ccns] Withdrew {} {} to {}", amount, token, beneficiary);
        Ok(amount)
    }

    fn debit(&self, token: FeeToken, amount: u128) -> Result<(), TransportError> {
        let mut balances = self.balances.write();
        let balance = balances.entry(token).or_insert(0);
        invariant_sufficient_fee(token, amount, *balance)?;
        *balance -= amount;
        Ok(())
    }

    /// Register `name` for `caller` and send the binding to every enabled
    /// destination.
    pub async fn register(&self, caller: Address, name: &str) -> Result<Registration, CcnsError> {
        let _guard = self.call_guard.lock().await;

        let binding = NameBinding::new(name, caller);
        let data = encode_binding(&binding)?;
        let token = self.config.fee_token;

        let chains = self.chains.chains();
        let plan = plan_fan_out(self.transport.as_ref(), &chains, &data, token).await?;
        plan.ensure_affordable(token, self.balance(token))?;

        let previous = self.lookup.set(self.address, name, caller)?;

        let attempted = plan.sends.len();
        let mut message_ids = Vec::with_capacity(attempted);
        let mut failed = Vec::new();
        for send in plan.sends {
            let sent = match self.debit(token, send.fee) {
                Ok(()) => self
                    .transport
                    .send(self.address, send.destination, send.message, send.fee)
                    .await
                    .inspect_err(|_| self.deposit(token, send.fee)),
                Err(e) => Err(e),
            };

            match sent {
                Ok(message_id) => message_ids.push(message_id),
                Err(reason) => {
                    warn!(
                        "[ccns] Send of `{}` to domain {} failed: {}",
                        name, send.destination, reason
                    );
                    failed.push(FailedSend {
                        destination: send.destination,
                        reason,
                    });
                }
            }
        }

        // Nothing left the domain, so the local write can still be undone.
        if message_ids.is_empty() {
            if let Some(first) = failed.first() {
                self.lookup.restore(self.address, name, previous)?;
                return Err(CcnsError::send_failed(
                    first.destination,
                    first.reason.clone(),
                ));
            }
        }

        info!(
            "[ccns] Registered `{}` to {} ({} of {} destinations)",
            name,
            caller,
            message_ids.len(),
            attempted
        );

        Ok(Registration {
            name: binding.name,
            owner: caller,
            message_ids,
            failed,
        })
    }
}

#[async_trait]
impl<T: MessagingTransport + ?Sized> RegistrarApi for Registrar<T> {
    fn enable_chain(
        &self,
        caller: Address,
        domain_id: DomainId,
        receiver: Address,
        gas_limit: u64,
    ) -> Result<(), CcnsError> {
        Registrar::enable_chain(self, caller, domain_id, receiver, gas_limit)
    }

    async fn register(&self, caller: Address, name: &str) -> Result<Registration, CcnsError> {
        Registrar::register(self, caller, name).await
    }

    fn chains(&self) -> Vec<DomainConfig> {
        Registrar::chains(self)
    }
}
