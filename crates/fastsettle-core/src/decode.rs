//! Generic event-log decoding.
//!
//! One [`EventDecoder`] per event shape, built from the shared schema.
//! Decoding is strict: the decoded fields are a deterministic,
//! order-preserving function of the log's topics and data, and any log
//! that cannot be fully reconstructed is an error — malformed logs never
//! produce partial records.

use alloy_core::dyn_abi::{DynSolType, DynSolValue};
use alloy_dyn_abi::Specifier;
use alloy_primitives::{Address, U256};

use crate::abi::SettlementAbi;
use crate::error::{AbiError, DecodeError};
use crate::event::{ContractEvent, Decoded, RawLog};

/// Where a declared field is read from during decode.
#[derive(Debug, Clone, Copy)]
enum FieldSlot {
    /// `topics[1 + i]`
    Indexed(usize),
    /// Member `i` of the ABI-encoded data tuple.
    Body(usize),
}

/// Decodes raw logs of one event shape into declaration-order values.
#[derive(Debug, Clone)]
pub struct EventDecoder {
    name: String,
    signature: alloy_primitives::B256,
    indexed: Vec<DynSolType>,
    body: Vec<DynSolType>,
    layout: Vec<FieldSlot>,
}

impl EventDecoder {
    /// Build the decoder for `E` from the parsed schema.
    pub fn for_event<E: ContractEvent>(abi: &SettlementAbi) -> Result<Self, AbiError> {
        Self::new(abi, E::NAME)
    }

    /// Build a decoder for the named event.
    pub fn new(abi: &SettlementAbi, name: &str) -> Result<Self, AbiError> {
        let event = abi.event(name)?;

        let mut indexed = Vec::new();
        let mut body = Vec::new();
        let mut layout = Vec::with_capacity(event.inputs.len());

        for (i, param) in event.inputs.iter().enumerate() {
            let ty = param.resolve().map_err(|e| AbiError::TypeResolution {
                name: name.into(),
                reason: format!("event input {i}: {e}"),
            })?;
            if param.indexed {
                layout.push(FieldSlot::Indexed(indexed.len()));
                indexed.push(ty);
            } else {
                layout.push(FieldSlot::Body(body.len()));
                body.push(ty);
            }
        }

        Ok(Self {
            name: name.into(),
            signature: event.selector(),
            indexed,
            body,
            layout,
        })
    }

    /// The event signature hash (`topics[0]` of every matching log).
    pub fn signature(&self) -> alloy_primitives::B256 {
        self.signature
    }

    /// Event name this decoder was built for.
    pub fn event_name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the log's `topics[0]` carries this event's signature.
    pub fn matches(&self, log: &RawLog) -> bool {
        log.signature() == Some(&self.signature)
    }

    /// Decode a matching log into field values in declaration order.
    pub fn decode(&self, log: &RawLog) -> Result<Vec<DynSolValue>, DecodeError> {
        match log.signature() {
            Some(sig) if *sig == self.signature => {}
            other => {
                return Err(DecodeError::SignatureMismatch {
                    event: self.name.clone(),
                    expected: self.signature.to_string(),
                    got: other.map_or_else(|| "none".into(), |s| s.to_string()),
                });
            }
        }

        if log.topics.len() != self.indexed.len() + 1 {
            return Err(DecodeError::TopicCount {
                event: self.name.clone(),
                expected: self.indexed.len() + 1,
                got: log.topics.len(),
            });
        }

        // Indexed params: one 32-byte topic each. Value types are stored
        // directly; reference types (string, bytes, arrays, tuples) are
        // stored as the keccak256 of their encoding and the original value
        // is unrecoverable — those come back as the raw 32-byte word.
        let mut indexed_vals = Vec::with_capacity(self.indexed.len());
        for (i, ty) in self.indexed.iter().enumerate() {
            let topic = &log.topics[i + 1];
            if is_hashed_in_topic(ty) {
                indexed_vals.push(DynSolValue::FixedBytes(*topic, 32));
                continue;
            }
            let val = ty.abi_decode(topic.as_slice()).map_err(|e| {
                DecodeError::AbiDecodeFailed {
                    context: format!("{} topic {}", self.name, i + 1),
                    reason: e.to_string(),
                }
            })?;
            indexed_vals.push(val);
        }

        // Non-indexed params: the data payload is one ABI-encoded tuple.
        let mut body_vals = Vec::with_capacity(self.body.len());
        if !self.body.is_empty() {
            let decoded = DynSolType::Tuple(self.body.clone())
                .abi_decode(&log.data)
                .map_err(|e| DecodeError::AbiDecodeFailed {
                    context: format!("{} data", self.name),
                    reason: e.to_string(),
                })?;
            body_vals = match decoded {
                DynSolValue::Tuple(vals) => vals,
                other => vec![other],
            };
        }

        if body_vals.len() != self.body.len() {
            return Err(DecodeError::AbiDecodeFailed {
                context: format!("{} data", self.name),
                reason: format!(
                    "expected {} values, decoded {}",
                    self.body.len(),
                    body_vals.len()
                ),
            });
        }

        let values = self
            .layout
            .iter()
            .map(|slot| match *slot {
                FieldSlot::Indexed(i) => indexed_vals[i].clone(),
                FieldSlot::Body(i) => body_vals[i].clone(),
            })
            .collect();
        Ok(values)
    }

    /// Decode a matching log straight into a typed record, keeping the log.
    pub fn decode_as<E: ContractEvent>(&self, log: RawLog) -> Result<Decoded<E>, DecodeError> {
        let values = self.decode(&log)?;
        Ok(Decoded {
            event: E::from_values(values)?,
            log,
        })
    }
}

/// Reference types lose their value when used as an indexed topic; only the
/// hash remains.
fn is_hashed_in_topic(ty: &DynSolType) -> bool {
    matches!(
        ty,
        DynSolType::String
            | DynSolType::Bytes
            | DynSolType::Array(_)
            | DynSolType::FixedArray(..)
            | DynSolType::Tuple(_)
    )
}

/// Pulls typed fields out of a declaration-order value list.
///
/// Shared by the event records and the return-data structs so every
/// consumer reports missing or mistyped fields the same way.
pub struct FieldReader {
    context: &'static str,
    values: std::vec::IntoIter<DynSolValue>,
}

impl FieldReader {
    pub fn new(context: &'static str, values: Vec<DynSolValue>) -> Self {
        Self {
            context,
            values: values.into_iter(),
        }
    }

    fn next(&mut self, field: &'static str) -> Result<DynSolValue, DecodeError> {
        self.values.next().ok_or(DecodeError::MissingField {
            context: self.context,
            field,
        })
    }

    fn type_err(&self, field: &'static str, expected: &'static str) -> DecodeError {
        DecodeError::FieldType {
            context: self.context,
            field,
            expected,
        }
    }

    pub fn address(&mut self, field: &'static str) -> Result<Address, DecodeError> {
        self.next(field)?
            .as_address()
            .ok_or_else(|| self.type_err(field, "address"))
    }

    pub fn uint(&mut self, field: &'static str) -> Result<U256, DecodeError> {
        self.next(field)?
            .as_uint()
            .map(|(v, _)| v)
            .ok_or_else(|| self.type_err(field, "uint256"))
    }

    pub fn address_array(&mut self, field: &'static str) -> Result<Vec<Address>, DecodeError> {
        match self.next(field)? {
            DynSolValue::Array(items) => items
                .into_iter()
                .map(|v| v.as_address().ok_or_else(|| self.type_err(field, "address[]")))
                .collect(),
            _ => Err(self.type_err(field, "address[]")),
        }
    }

    pub fn bool_array(&mut self, field: &'static str) -> Result<Vec<bool>, DecodeError> {
        match self.next(field)? {
            DynSolValue::Array(items) => items
                .into_iter()
                .map(|v| v.as_bool().ok_or_else(|| self.type_err(field, "bool[]")))
                .collect(),
            _ => Err(self.type_err(field, "bool[]")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{IntentExecuted, SwapTargetsUpdated, TreasuryUpdated};
    use alloy_primitives::{Bytes, B256};

    fn abi() -> SettlementAbi {
        SettlementAbi::parse().unwrap()
    }

    fn word(n: u64) -> [u8; 32] {
        let mut w = [0u8; 32];
        w[24..].copy_from_slice(&n.to_be_bytes());
        w
    }

    /// A well-formed IntentExecuted log: 3 indexed addresses, 4 data words.
    fn intent_executed_log(user: Address) -> RawLog {
        let decoder = EventDecoder::new(&abi(), "IntentExecuted").unwrap();
        let mut data = Vec::with_capacity(128);
        for n in [10u64, 9, 11, 2] {
            data.extend_from_slice(&word(n));
        }
        RawLog {
            address: Address::repeat_byte(0xc0),
            topics: vec![
                decoder.signature(),
                user.into_word(),
                Address::repeat_byte(0x01).into_word(),
                Address::repeat_byte(0x02).into_word(),
            ],
            data: Bytes::from(data),
            block_number: 19_000_000,
            log_index: 3,
            ..Default::default()
        }
    }

    #[test]
    fn known_event_signatures() {
        let abi = abi();
        let cases = [
            (
                "ExecutorUpdated",
                "0ef3c7eb9dbcf33ddf032f4cce366a07eda85eed03e3172e4a90c4cc16d57886",
            ),
            (
                "IntentExecuted",
                "1ad6a4af59e844de3a921ec3dba60cb46f0b9051c9a106258624709dff629a87",
            ),
            (
                "SwapTargetsUpdated",
                "e18e0ae71e84871d203445f1d9d5c51bd93bb2e362ee0e455940a88475dc13bc",
            ),
            (
                "TreasuryUpdated",
                "4ab5be82436d353e61ca18726e984e561f5c1cc7c6d38b29d2553c790434705a",
            ),
        ];
        for (name, expected) in cases {
            let dec = EventDecoder::new(&abi, name).unwrap();
            assert_eq!(hex::encode(dec.signature()), expected, "topic0 for {name}");
        }
    }

    #[test]
    fn decode_intent_executed() {
        let user = Address::repeat_byte(0xaa);
        let log = intent_executed_log(user);
        let decoder = EventDecoder::new(&abi(), "IntentExecuted").unwrap();

        let rec = decoder.decode_as::<IntentExecuted>(log.clone()).unwrap();
        assert_eq!(rec.event.user, user);
        assert_eq!(rec.event.input_token, Address::repeat_byte(0x01));
        assert_eq!(rec.event.input_amt, U256::from(10u64));
        assert_eq!(rec.event.user_amt_out, U256::from(9u64));
        assert_eq!(rec.event.received, U256::from(11u64));
        assert_eq!(rec.event.surplus, U256::from(2u64));
        // the raw log travels with the record
        assert_eq!(rec.log, log);
    }

    #[test]
    fn decode_dynamic_array_event() {
        let abi = abi();
        let decoder = EventDecoder::new(&abi, "SwapTargetsUpdated").unwrap();

        let targets = vec![Address::repeat_byte(0x33), Address::repeat_byte(0x44)];
        let payload = DynSolValue::Tuple(vec![
            DynSolValue::Array(targets.iter().map(|a| DynSolValue::Address(*a)).collect()),
            DynSolValue::Array(vec![DynSolValue::Bool(true), DynSolValue::Bool(false)]),
        ])
        .abi_encode();

        let log = RawLog {
            topics: vec![decoder.signature()],
            data: Bytes::from(payload),
            ..Default::default()
        };

        let rec = decoder.decode_as::<SwapTargetsUpdated>(log).unwrap();
        assert_eq!(rec.event.targets, targets);
        assert_eq!(rec.event.allowed, vec![true, false]);
    }

    #[test]
    fn signature_mismatch_is_rejected() {
        let decoder = EventDecoder::new(&abi(), "TreasuryUpdated").unwrap();
        let log = RawLog {
            topics: vec![
                B256::repeat_byte(0xff),
                Address::repeat_byte(0x01).into_word(),
                Address::repeat_byte(0x02).into_word(),
            ],
            ..Default::default()
        };
        assert!(!decoder.matches(&log));
        let err = decoder.decode(&log).unwrap_err();
        assert!(matches!(err, DecodeError::SignatureMismatch { .. }));
    }

    #[test]
    fn missing_topic_is_rejected() {
        let decoder = EventDecoder::new(&abi(), "TreasuryUpdated").unwrap();
        let log = RawLog {
            // signature present, but only one of two indexed topics
            topics: vec![decoder.signature(), Address::repeat_byte(0x01).into_word()],
            ..Default::default()
        };
        let err = decoder.decode(&log).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::TopicCount { expected: 3, got: 2, .. }
        ));
    }

    #[test]
    fn malformed_data_never_yields_partial_record() {
        let user = Address::repeat_byte(0xaa);
        let mut log = intent_executed_log(user);
        // right signature, truncated data payload
        log.data = Bytes::from(word(10)[..].to_vec());

        let decoder = EventDecoder::new(&abi(), "IntentExecuted").unwrap();
        let err = decoder.decode_as::<IntentExecuted>(log).unwrap_err();
        assert!(matches!(err, DecodeError::AbiDecodeFailed { .. }));
    }

    #[test]
    fn decode_preserves_declaration_order() {
        let user = Address::repeat_byte(0xaa);
        let decoder = EventDecoder::new(&abi(), "IntentExecuted").unwrap();
        let values = decoder.decode(&intent_executed_log(user)).unwrap();
        assert_eq!(values.len(), 7);
        // indexed fields first in declaration order, then the data words
        assert_eq!(values[0].as_address(), Some(user));
        assert_eq!(values[3].as_uint().unwrap().0, U256::from(10u64));
        assert_eq!(values[6].as_uint().unwrap().0, U256::from(2u64));
    }
}
