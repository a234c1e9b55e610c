//! Raw log and decoded event record types.
//!
//! The four record structs mirror the contract's event shapes. Records are
//! created only by the decode machinery and are read-only afterwards; each
//! one is delivered inside [`Decoded`], which keeps the raw log it came
//! from.

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::decode::FieldReader;
use crate::error::DecodeError;

/// A raw, undecoded contract log as supplied by the chain backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLog {
    /// Contract address that emitted the log.
    pub address: Address,
    /// `topics[0]` is the event signature hash; the rest are indexed params.
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed parameters.
    pub data: Bytes,
    pub block_number: u64,
    pub block_hash: B256,
    pub tx_hash: B256,
    pub tx_index: u64,
    pub log_index: u64,
    /// Set when the log was dropped by a chain reorganization.
    pub removed: bool,
}

impl RawLog {
    /// The event signature hash, if the log carries any topics.
    pub fn signature(&self) -> Option<&B256> {
        self.topics.first()
    }
}

/// A decoded event record paired with the raw log it was decoded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoded<E> {
    pub event: E,
    pub log: RawLog,
}

/// An event shape declared in the contract ABI.
///
/// Implementations consume decoded values in declaration order (indexed
/// and non-indexed fields interleaved exactly as declared). The generic
/// decode, iteration, and watch machinery is parameterized over this
/// trait — there is one mechanism, not one copy per event.
pub trait ContractEvent: Sized + Send + Sync + 'static {
    /// Event name as declared in the ABI.
    const NAME: &'static str;

    /// Build the record from decoded field values in declaration order.
    fn from_values(values: Vec<DynSolValue>) -> Result<Self, DecodeError>;
}

/// Emitted when the authorized executor address changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorUpdated {
    pub old_executor: Address,
    pub new_executor: Address,
}

impl ContractEvent for ExecutorUpdated {
    const NAME: &'static str = "ExecutorUpdated";

    fn from_values(values: Vec<DynSolValue>) -> Result<Self, DecodeError> {
        let mut r = FieldReader::new(Self::NAME, values);
        Ok(Self {
            old_executor: r.address("oldExecutor")?,
            new_executor: r.address("newExecutor")?,
        })
    }
}

/// Emitted once per settled intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentExecuted {
    pub user: Address,
    pub input_token: Address,
    pub output_token: Address,
    pub input_amt: U256,
    pub user_amt_out: U256,
    /// Actual amount produced by the swap.
    pub received: U256,
    /// Amount retained above the user's minimum.
    pub surplus: U256,
}

impl ContractEvent for IntentExecuted {
    const NAME: &'static str = "IntentExecuted";

    fn from_values(values: Vec<DynSolValue>) -> Result<Self, DecodeError> {
        let mut r = FieldReader::new(Self::NAME, values);
        Ok(Self {
            user: r.address("user")?,
            input_token: r.address("inputToken")?,
            output_token: r.address("outputToken")?,
            input_amt: r.uint("inputAmt")?,
            user_amt_out: r.uint("userAmtOut")?,
            received: r.uint("received")?,
            surplus: r.uint("surplus")?,
        })
    }
}

/// Emitted when the swap-target allowlist changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTargetsUpdated {
    pub targets: Vec<Address>,
    pub allowed: Vec<bool>,
}

impl ContractEvent for SwapTargetsUpdated {
    const NAME: &'static str = "SwapTargetsUpdated";

    fn from_values(values: Vec<DynSolValue>) -> Result<Self, DecodeError> {
        let mut r = FieldReader::new(Self::NAME, values);
        Ok(Self {
            targets: r.address_array("targets")?,
            allowed: r.bool_array("allowed")?,
        })
    }
}

/// Emitted when the treasury address changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryUpdated {
    pub old_treasury: Address,
    pub new_treasury: Address,
}

impl ContractEvent for TreasuryUpdated {
    const NAME: &'static str = "TreasuryUpdated";

    fn from_values(values: Vec<DynSolValue>) -> Result<Self, DecodeError> {
        let mut r = FieldReader::new(Self::NAME, values);
        Ok(Self {
            old_treasury: r.address("oldTreasury")?,
            new_treasury: r.address("newTreasury")?,
        })
    }
}
