//! # Event Topics
//!
//! Builds the log records a precompile emits on success. The first topic is
//! always the event signature hash; indexed arguments follow, each encoded
//! with [`encode_word`]. Non-indexed arguments go into the data section.

use crate::abi::codec::{canonical_signature, encode, parse_types, ParamType};
use crate::abi::word::{encode_word, Value};
use crate::domain::entities::EventLog;
use crate::domain::services::keccak256;
use crate::domain::value_objects::{Address, Bytes, Hash};
use crate::errors::{AbiError, EncodeError};

/// Maximum indexed arguments per log (four topics minus the signature).
pub const MAX_INDEXED: usize = 3;

/// One event input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventParam {
    /// Declared type.
    pub kind: ParamType,
    /// Stored as a topic rather than in data.
    pub indexed: bool,
}

/// Event declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDescriptor {
    /// Event name.
    pub name: String,
    /// Inputs in declaration order.
    pub inputs: Vec<EventParam>,
    /// Keccak-256 of the canonical signature.
    pub id: Hash,
}

impl EventDescriptor {
    /// Declares an event from `(type, indexed)` pairs.
    pub fn new(name: &str, inputs: &[(&str, bool)]) -> Result<Self, AbiError> {
        let types: Vec<&str> = inputs.iter().map(|(t, _)| *t).collect();
        let kinds = parse_types(&types)?;
        let id = keccak256(canonical_signature(name, &kinds).as_bytes());
        let inputs = kinds
            .into_iter()
            .zip(inputs)
            .map(|(kind, (_, indexed))| EventParam {
                kind,
                indexed: *indexed,
            })
            .collect();
        Ok(Self {
            name: name.to_string(),
            inputs,
            id,
        })
    }

    /// Canonical signature string.
    #[must_use]
    pub fn signature(&self) -> String {
        let kinds: Vec<ParamType> = self.inputs.iter().map(|p| p.kind.clone()).collect();
        canonical_signature(&self.name, &kinds)
    }
}

/// Topic list for one event: signature hash, then the indexed values.
pub fn make_topics(event_id: Hash, indexed: &[Value]) -> Result<Vec<Hash>, EncodeError> {
    if indexed.len() > MAX_INDEXED {
        return Err(EncodeError::TooManyTopics(indexed.len()));
    }
    let mut topics = Vec::with_capacity(indexed.len() + 1);
    topics.push(event_id);
    for value in indexed {
        topics.push(encode_word(value)?);
    }
    Ok(topics)
}

/// Builds a log record from the event's full argument list.
pub fn build_log(
    descriptor: &EventDescriptor,
    address: Address,
    args: Vec<Value>,
    block_height: u64,
) -> Result<EventLog, EncodeError> {
    if args.len() != descriptor.inputs.len() {
        return Err(EncodeError::UnsupportedType("event argument count"));
    }

    let (indexed, data): (Vec<_>, Vec<_>) = descriptor
        .inputs
        .iter()
        .zip(args)
        .partition(|(param, _)| param.indexed);

    let indexed: Vec<Value> = indexed.into_iter().map(|(_, v)| v).collect();
    let data: Vec<Value> = data.into_iter().map(|(_, v)| v).collect();

    Ok(EventLog {
        address,
        topics: make_topics(descriptor.id, &indexed)?,
        data: Bytes::from_vec(encode(&data)?),
        block_height,
    })
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::word::BigInt;
    use crate::domain::value_objects::U256;

    #[test]
    fn test_transfer_event_id() {
        let event = EventDescriptor::new(
            "Transfer",
            &[("address", true), ("address", true), ("uint256", false)],
        )
        .unwrap();
        assert_eq!(event.signature(), "Transfer(address,address,uint256)");
        assert_eq!(
            hex::encode(event.id.0),
            "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_build_log_splits_indexed() {
        let event = EventDescriptor::new(
            "Transfer",
            &[("address", true), ("address", true), ("uint256", false)],
        )
        .unwrap();
        let from = Address::new([1u8; 20]);
        let to = Address::new([2u8; 20]);
        let log = build_log(
            &event,
            Address::new([9u8; 20]),
            vec![
                Value::Address(from),
                Value::Address(to),
                Value::BigInt(BigInt::from_u256(U256::from(3u64))),
            ],
            77,
        )
        .unwrap();

        assert_eq!(log.topics.len(), 3);
        assert_eq!(log.topics[0], event.id);
        assert_eq!(&log.topics[1].0[12..], from.as_bytes());
        assert_eq!(&log.topics[2].0[12..], to.as_bytes());
        assert_eq!(log.data.len(), 32);
        assert_eq!(log.data.as_slice()[31], 3);
        assert_eq!(log.block_height, 77);
    }

    #[test]
    fn test_make_topics_limit() {
        let values = vec![Value::Bool(true); 4];
        assert_eq!(
            make_topics(Hash::ZERO, &values),
            Err(EncodeError::TooManyTopics(4))
        );
    }

    #[test]
    fn test_indexed_string_is_hashed() {
        let topics = make_topics(Hash::ZERO, &[Value::String("memo".into())]).unwrap();
        assert_eq!(topics[1], keccak256(b"memo"));
    }

    #[test]
    fn test_build_log_wrong_arity() {
        let event = EventDescriptor::new("Ping", &[("uint64", false)]).unwrap();
        assert!(build_log(&event, Address::ZERO, vec![], 0).is_err());
    }
}
