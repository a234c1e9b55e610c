//! Typed argument and return structs for the settlement methods.
//!
//! These mirror the contract's declared tuple shapes field-for-field.
//! They are immutable once constructed: callers build them, the proxy
//! consumes them unchanged as call arguments.

use alloy_core::dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize};

use crate::decode::FieldReader;
use crate::error::DecodeError;

/// An off-chain-signed settlement request.
///
/// Signature and permit verification, deadline and nonce checks are all
/// enforced by the remote contract; this struct only carries the values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub user: Address,
    pub input_token: Address,
    pub output_token: Address,
    pub input_amt: U256,
    /// Minimum amount the user must receive in `output_token`.
    pub user_amt_out: U256,
    pub recipient: Address,
    /// Expiry, seconds since the Unix epoch.
    pub deadline: U256,
    /// Replay-protection counter.
    pub nonce: U256,
}

impl Intent {
    /// The ABI tuple value, fields in declaration order.
    pub fn as_sol_value(&self) -> DynSolValue {
        DynSolValue::Tuple(vec![
            DynSolValue::Address(self.user),
            DynSolValue::Address(self.input_token),
            DynSolValue::Address(self.output_token),
            DynSolValue::Uint(self.input_amt, 256),
            DynSolValue::Uint(self.user_amt_out, 256),
            DynSolValue::Address(self.recipient),
            DynSolValue::Uint(self.deadline, 256),
            DynSolValue::Uint(self.nonce, 256),
        ])
    }
}

/// The external swap invocation the contract relays on the user's behalf.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapCall {
    pub to: Address,
    /// Native currency forwarded with the call.
    pub value: U256,
    /// Opaque calldata for the swap target.
    pub data: Bytes,
}

impl SwapCall {
    /// The ABI tuple value, fields in declaration order.
    pub fn as_sol_value(&self) -> DynSolValue {
        DynSolValue::Tuple(vec![
            DynSolValue::Address(self.to),
            DynSolValue::Uint(self.value, 256),
            DynSolValue::Bytes(self.data.to_vec()),
        ])
    }
}

/// Declared outputs of `executeWithETH` / `executeWithPermit`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecuteOutcome {
    /// Amount of `output_token` the swap produced.
    pub received: U256,
    /// Amount kept above the user's minimum.
    pub surplus: U256,
}

impl ExecuteOutcome {
    /// Build from decoded return values in declaration order.
    pub fn from_values(values: Vec<DynSolValue>) -> Result<Self, DecodeError> {
        let mut r = FieldReader::new("execute return data", values);
        Ok(Self {
            received: r.uint("received")?,
            surplus: r.uint("surplus")?,
        })
    }
}
