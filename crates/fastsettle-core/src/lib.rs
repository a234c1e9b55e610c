//! # fastsettle-core
//!
//! ABI schema and codec layer for the FastSettlement V3 contract.
//! Holds the embedded contract ABI, the typed argument structs
//! (`Intent`, `SwapCall`), the event record types, and the generic
//! log-decode and revert-decode machinery that `fastsettle-client`
//! builds its call/event proxy on.

pub mod abi;
pub mod decode;
pub mod error;
pub mod event;
pub mod revert;
pub mod types;

pub use abi::{SettlementAbi, SETTLEMENT_ABI_JSON};
pub use decode::EventDecoder;
pub use error::{AbiError, DecodeError};
pub use event::{
    ContractEvent, Decoded, ExecutorUpdated, IntentExecuted, RawLog, SwapTargetsUpdated,
    TreasuryUpdated,
};
pub use revert::{decode_revert, RevertReason};
pub use types::{ExecuteOutcome, Intent, SwapCall};
