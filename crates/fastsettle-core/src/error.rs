//! Error types for the schema and codec layer.

use thiserror::Error;

/// Errors raised while parsing or using the contract ABI schema.
///
/// These are construction-time failures: a proxy built against a valid
/// schema never sees them at call time except for programming errors
/// (unknown method name, wrong argument shape).
#[derive(Debug, Error)]
pub enum AbiError {
    #[error("ABI JSON parse failed: {reason}")]
    InvalidJson { reason: String },

    #[error("function '{name}' not found in ABI")]
    UnknownFunction { name: String },

    #[error("event '{name}' not found in ABI")]
    UnknownEvent { name: String },

    #[error("argument count mismatch for '{name}': ABI declares {expected}, got {got}")]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("argument {index} of '{name}' does not match the declared ABI type")]
    ArgumentType { name: String, index: usize },

    #[error("type resolution failed for '{name}': {reason}")]
    TypeResolution { name: String, reason: String },
}

/// Errors that can occur while decoding a log or return data.
///
/// Decoding is total: any variant here means the affected record was NOT
/// produced. A malformed log never yields a partial record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("log signature mismatch for event '{event}': expected topic {expected}, got {got}")]
    SignatureMismatch {
        event: String,
        expected: String,
        got: String,
    },

    #[error("log for event '{event}' carries {got} topics, expected {expected}")]
    TopicCount {
        event: String,
        expected: usize,
        got: usize,
    },

    #[error("ABI decode failed for '{context}': {reason}")]
    AbiDecodeFailed { context: String, reason: String },

    #[error("missing field '{field}' while decoding {context}")]
    MissingField {
        context: &'static str,
        field: &'static str,
    },

    #[error("field '{field}' of {context} has unexpected type, expected {expected}")]
    FieldType {
        context: &'static str,
        field: &'static str,
        expected: &'static str,
    },

    #[error("return data decode failed for '{function}': {reason}")]
    ReturnData { function: String, reason: String },
}
