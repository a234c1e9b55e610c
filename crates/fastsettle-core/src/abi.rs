//! The parsed contract schema and calldata encoder.
//!
//! The ABI document is embedded verbatim and parsed exactly once into a
//! [`SettlementAbi`]; every proxy, decoder, and revert lookup shares that
//! immutable value read-only (usually behind an `Arc`).

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;
use alloy_json_abi::{Error as AbiErrorEntry, Event, Function, JsonAbi};

use crate::error::{AbiError, DecodeError};

/// The IFastSettlementV3 ABI, as emitted by the contract build.
pub const SETTLEMENT_ABI_JSON: &str = include_str!("../abi/IFastSettlementV3.json");

/// Parsed, immutable view of the contract schema.
pub struct SettlementAbi {
    abi: JsonAbi,
}

impl SettlementAbi {
    /// Parse the embedded ABI document.
    ///
    /// A malformed document is fatal and surfaced immediately; nothing else
    /// in this crate works without a valid schema.
    pub fn parse() -> Result<Self, AbiError> {
        Self::from_json(SETTLEMENT_ABI_JSON)
    }

    /// Parse a caller-supplied ABI JSON string.
    pub fn from_json(abi_json: &str) -> Result<Self, AbiError> {
        let abi: JsonAbi =
            serde_json::from_str(abi_json).map_err(|e| AbiError::InvalidJson {
                reason: e.to_string(),
            })?;
        Ok(Self { abi })
    }

    /// The underlying `JsonAbi`.
    pub fn raw(&self) -> &JsonAbi {
        &self.abi
    }

    /// Look up a function entry by name.
    pub fn function(&self, name: &str) -> Result<&Function, AbiError> {
        self.abi
            .functions()
            .find(|f| f.name == name)
            .ok_or_else(|| AbiError::UnknownFunction { name: name.into() })
    }

    /// Look up an event entry by name.
    pub fn event(&self, name: &str) -> Result<&Event, AbiError> {
        self.abi
            .events()
            .find(|e| e.name == name)
            .ok_or_else(|| AbiError::UnknownEvent { name: name.into() })
    }

    /// All declared custom error entries.
    pub fn errors(&self) -> impl Iterator<Item = &AbiErrorEntry> {
        self.abi.errors()
    }

    /// Encode a function call to calldata bytes.
    ///
    /// Returns `selector ++ abi_encode(args...)` — the standard calldata
    /// format. Arguments must be given in declaration order and must match
    /// the declared parameter count and types.
    pub fn encode_call(&self, name: &str, args: &[DynSolValue]) -> Result<Vec<u8>, AbiError> {
        let func = self.function(name)?;

        if args.len() != func.inputs.len() {
            return Err(AbiError::ArityMismatch {
                name: name.into(),
                expected: func.inputs.len(),
                got: args.len(),
            });
        }

        for (i, (param, arg)) in func.inputs.iter().zip(args.iter()).enumerate() {
            let sol_type = param.resolve().map_err(|e| AbiError::TypeResolution {
                name: name.into(),
                reason: format!("param {i}: {e}"),
            })?;
            if !sol_type.matches(arg) {
                return Err(AbiError::ArgumentType {
                    name: name.into(),
                    index: i,
                });
            }
        }

        let mut calldata = func.selector().to_vec();
        calldata.extend_from_slice(&DynSolValue::Tuple(args.to_vec()).abi_encode());
        Ok(calldata)
    }

    /// Decode a function's return data into its declared output values,
    /// in declaration order.
    pub fn decode_output(&self, name: &str, data: &[u8]) -> Result<Vec<DynSolValue>, DecodeError> {
        let func = self
            .function(name)
            .map_err(|e| DecodeError::ReturnData {
                function: name.into(),
                reason: e.to_string(),
            })?;

        if func.outputs.is_empty() {
            return Ok(vec![]);
        }

        let out_types: Result<Vec<DynSolType>, _> =
            func.outputs.iter().map(|p| p.resolve()).collect();
        let out_types = out_types.map_err(|e| DecodeError::ReturnData {
            function: name.into(),
            reason: format!("output type resolution: {e}"),
        })?;

        let decoded = DynSolType::Tuple(out_types)
            .abi_decode(data)
            .map_err(|e| DecodeError::ReturnData {
                function: name.into(),
                reason: e.to_string(),
            })?;

        match decoded {
            DynSolValue::Tuple(vals) => Ok(vals),
            other => Ok(vec![other]),
        }
    }
}

impl std::fmt::Debug for SettlementAbi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementAbi")
            .field("functions", &self.abi.functions().count())
            .field("events", &self.abi.events().count())
            .field("errors", &self.abi.errors().count())
            .finish()
    }
}
