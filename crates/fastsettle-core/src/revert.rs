//! Decode revert payloads into the contract's declared error shapes.
//!
//! Decode priority:
//! 1. empty data          → [`RevertReason::Empty`]
//! 2. `0x08c379a0` prefix → [`RevertReason::ErrorString`]   (`Error(string)`)
//! 3. `0x4e487b71` prefix → [`RevertReason::Panic`]         (`Panic(uint256)`)
//! 4. a selector declared in the contract ABI → [`RevertReason::Contract`]
//! 5. fallback            → [`RevertReason::Raw`]
//!
//! This is passthrough only: the decoded name and arguments are whatever the
//! contract declared (`BadNonce`, `IntentExpired`,
//! `InsufficientOut(received, userAmtOut)`, …). Nothing here interprets or
//! retries them.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;

use crate::abi::SettlementAbi;

/// The 4-byte selector for `Error(string)`.
pub const ERROR_STRING_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// The 4-byte selector for `Panic(uint256)`.
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// A decoded revert payload.
#[derive(Debug, Clone, PartialEq)]
pub enum RevertReason {
    /// `require(cond, "message")` — a user-readable revert string.
    ErrorString { message: String },

    /// A Solidity `assert`/checked-arithmetic failure.
    Panic { code: u64, meaning: &'static str },

    /// One of the contract's declared custom errors.
    Contract {
        /// Error name, e.g. `"BadNonce"`.
        name: String,
        /// Decoded arguments: (param name, value), declaration order.
        fields: Vec<(String, DynSolValue)>,
    },

    /// Revert data that matches none of the declared shapes.
    Raw { data: Vec<u8> },

    /// No revert data at all (bare `revert` or out-of-gas).
    Empty,
}

impl std::fmt::Display for RevertReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ErrorString { message } => write!(f, "reverted: {message}"),
            Self::Panic { code, meaning } => write!(f, "panic 0x{code:02x}: {meaning}"),
            Self::Contract { name, fields } => {
                write!(f, "{name}(")?;
                for (i, (param, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{param}={}", fmt_value(value))?;
                }
                write!(f, ")")
            }
            Self::Raw { data } => {
                if data.len() >= 4 {
                    write!(f, "unrecognized revert 0x{} ({} bytes)", hex::encode(&data[..4]), data.len())
                } else {
                    write!(f, "unrecognized revert ({} bytes)", data.len())
                }
            }
            Self::Empty => write!(f, "reverted with no data"),
        }
    }
}

fn fmt_value(v: &DynSolValue) -> String {
    match v {
        DynSolValue::Address(a) => format!("{a:#x}"),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::String(s) => s.clone(),
        DynSolValue::Bytes(b) => format!("0x{}", hex::encode(b)),
        DynSolValue::FixedBytes(w, n) => format!("0x{}", hex::encode(&w[..*n])),
        other => format!("{other:?}"),
    }
}

/// Decode a revert payload against the contract schema.
///
/// Total and infallible: anything that doesn't match a declared shape comes
/// back as `Raw` (or `Empty`), never an error.
pub fn decode_revert(abi: &SettlementAbi, data: &[u8]) -> RevertReason {
    if data.is_empty() {
        return RevertReason::Empty;
    }
    if data.len() < 4 {
        return RevertReason::Raw { data: data.to_vec() };
    }

    if data[..4] == ERROR_STRING_SELECTOR {
        if let Ok(DynSolValue::String(message)) = DynSolType::String.abi_decode(&data[4..]) {
            return RevertReason::ErrorString { message };
        }
    }

    if data[..4] == PANIC_SELECTOR {
        if let Ok(DynSolValue::Uint(v, _)) = DynSolType::Uint(256).abi_decode(&data[4..]) {
            let code = v.to::<u64>();
            return RevertReason::Panic {
                code,
                meaning: panic_meaning(code),
            };
        }
    }

    let selector: [u8; 4] = data[..4].try_into().expect("length checked");
    for entry in abi.errors() {
        if *entry.selector() != selector {
            continue;
        }
        if let Some(reason) = decode_declared_error(entry, &data[4..]) {
            return reason;
        }
    }

    RevertReason::Raw { data: data.to_vec() }
}

fn decode_declared_error(
    entry: &alloy_json_abi::Error,
    payload: &[u8],
) -> Option<RevertReason> {
    if entry.inputs.is_empty() {
        return Some(RevertReason::Contract {
            name: entry.name.clone(),
            fields: vec![],
        });
    }

    let types: Vec<DynSolType> = entry
        .inputs
        .iter()
        .map(|p| p.resolve().ok())
        .collect::<Option<Vec<_>>>()?;

    let decoded = DynSolType::Tuple(types).abi_decode(payload).ok()?;
    let values = match decoded {
        DynSolValue::Tuple(vals) => vals,
        single => vec![single],
    };

    let fields = entry
        .inputs
        .iter()
        .map(|p| p.name.clone())
        .zip(values)
        .collect();

    Some(RevertReason::Contract {
        name: entry.name.clone(),
        fields,
    })
}

/// Map a Solidity panic code to a human-readable description.
pub fn panic_meaning(code: u64) -> &'static str {
    match code {
        0x00 => "generic compiler-inserted panic",
        0x01 => "assert() called with false condition",
        0x11 => "arithmetic overflow or underflow",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum value",
        0x22 => "corrupted storage byte array",
        0x31 => ".pop() on empty array",
        0x32 => "out-of-bounds array access",
        0x41 => "too much memory allocated (out of memory)",
        0x51 => "called zero-initialized internal function pointer",
        _ => "unknown panic code",
    }
}
