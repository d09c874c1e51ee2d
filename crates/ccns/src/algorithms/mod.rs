//! # Algorithms Module
//!
//! Payload encoding, message ids and fan-out planning.

pub mod codec;
pub mod fan_out;

pub use codec::{decode_binding, derive_message_id, encode_binding, MAX_PAYLOAD_BYTES};
pub use fan_out::{build_outbound, plan_binding, plan_fan_out, FanOutPlan, PlannedSend};
