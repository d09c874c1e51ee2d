//! # Domain Invariants
//!
//! Access-control and origin rules, checked at the top of every
//! privileged operation before any state is touched.

use super::errors::{CcnsError, TransportError};
use super::value_objects::{Address, DomainId, FeeToken};

/// Invariant: only the role holder may call.
pub fn invariant_role_holder(caller: Address, holder: Address) -> Result<(), CcnsError> {
    if caller != holder {
        return Err(CcnsError::Unauthorized {
            caller,
            required: holder,
        });
    }
    Ok(())
}

/// Invariant: only the designated writer may set a lookup entry.
///
/// An unassigned writer rejects every caller.
pub fn invariant_designated_writer(
    caller: Address,
    writer: Option<Address>,
) -> Result<(), CcnsError> {
    match writer {
        Some(writer) if writer == caller => Ok(()),
        Some(writer) => Err(CcnsError::Unauthorized {
            caller,
            required: writer,
        }),
        None => Err(CcnsError::Unauthorized {
            caller,
            required: Address::ZERO,
        }),
    }
}

/// Invariant: deliveries only come from the bound router.
pub fn invariant_trusted_caller(caller: Address, router: Address) -> Result<(), CcnsError> {
    if caller != router {
        return Err(CcnsError::UntrustedCaller { caller, router });
    }
    Ok(())
}

/// Invariant: deliveries only originate from the bound source domain and,
/// when pinned, the bound sender.
pub fn invariant_trusted_origin(
    source_domain: DomainId,
    sender: Address,
    expected_domain: DomainId,
    expected_sender: Option<Address>,
) -> Result<(), CcnsError> {
    let sender_ok = expected_sender.map_or(true, |expected| expected == sender);
    if source_domain != expected_domain || !sender_ok {
        return Err(CcnsError::UntrustedOrigin {
            source_domain,
            sender,
        });
    }
    Ok(())
}

/// Invariant: held balance covers the quoted fee.
pub fn invariant_sufficient_fee(
    token: FeeToken,
    required: u128,
    available: u128,
) -> Result<(), TransportError> {
    if available < required {
        return Err(TransportError::InsufficientFee {
            token,
            required,
            available,
        });
    }
    Ok(())
}
