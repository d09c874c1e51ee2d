//! # Fan-Out Planning
//!
//! Quotes every enabled destination before a registration touches state,
//! so an unreachable destination or a fee shortfall aborts the whole call.

use tracing::debug;

use crate::domain::{
    invariant_sufficient_fee, CcnsError, DomainConfig, DomainId, FeeToken, NameBinding,
    OutboundMessage, TransportError,
};
use crate::ports::MessagingTransport;

/// One quoted send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannedSend {
    /// Destination domain.
    pub destination: DomainId,
    /// Message to hand to the transport.
    pub message: OutboundMessage,
    /// Quoted fee.
    pub fee: u128,
}

/// Quoted sends for every enabled destination, in enable order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FanOutPlan {
    /// Individual sends.
    pub sends: Vec<PlannedSend>,
    /// Sum of all quoted fees.
    pub total_fee: u128,
}

impl FanOutPlan {
    /// Fail unless `available` covers the whole plan.
    pub fn ensure_affordable(&self, token: FeeToken, available: u128) -> Result<(), CcnsError> {
        invariant_sufficient_fee(token, self.total_fee, available).map_err(|reason| {
            // Attribute the shortfall to the first destination that can't be paid.
            let mut running = 0u128;
            let destination = self
                .sends
                .iter()
                .find(|send| {
                    running = running.saturating_add(send.fee);
                    running > available
                })
                .map(|send| send.destination)
                .unwrap_or_default();
            CcnsError::send_failed(destination, reason)
        })
    }
}

/// Build the outbound message for one destination.
pub fn build_outbound(
    config: &DomainConfig,
    data: Vec<u8>,
    fee_token: FeeToken,
) -> OutboundMessage {
    OutboundMessage {
        receiver: config.receiver,
        data,
        gas_limit: config.gas_limit,
        fee_token,
    }
}

/// Quote every destination in `chains` for the payload `data`.
pub async fn plan_fan_out<T>(
    transport: &T,
    chains: &[DomainConfig],
    data: &[u8],
    fee_token: FeeToken,
) -> Result<FanOutPlan, CcnsError>
where
    T: MessagingTransport + ?Sized,
{
    let mut plan = FanOutPlan::default();

    for config in chains {
        let message = build_outbound(config, data.to_vec(), fee_token);
        let fee = transport
            .get_fee(config.domain_id, &message)
            .await
            .map_err(|reason| CcnsError::send_failed(config.domain_id, reason))?;

        debug!(
            "[ccns] Quoted {} {} for domain {}",
            fee, fee_token, config.domain_id
        );

        plan.total_fee = plan.total_fee.checked_add(fee).ok_or_else(|| {
            CcnsError::send_failed(
                config.domain_id,
                TransportError::Rejected("fee total overflow".to_string()),
            )
        })?;
        plan.sends.push(PlannedSend {
            destination: config.domain_id,
            message,
            fee,
        });
    }

    Ok(plan)
}

/// Encode `binding` and quote every destination in `chains`.
pub async fn plan_binding<T>(
    transport: &T,
    chains: &[DomainConfig],
    binding: &NameBinding,
    fee_token: FeeToken,
) -> Result<FanOutPlan, CcnsError>
where
    T: MessagingTransport + ?Sized,
{
    let data = super::codec::encode_binding(binding)?;
    plan_fan_out(transport, chains, &data, fee_token).await
}
