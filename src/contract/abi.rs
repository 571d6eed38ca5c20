//! Contract ABI message lookup.
//!
//! Message names resolve at call time from the contract's generated metadata
//! (the ink! metadata JSON). Only the message list is consumed here: label,
//! 4-byte selector and mutability. Argument encoding is SCALE, supplied by
//! the caller's typed argument struct.

use std::collections::HashMap;

use parity_scale_codec::{Decode, Encode};
use serde::Deserialize;

use crate::error::CallError;

#[derive(Deserialize)]
struct RawMetadata {
    spec: RawSpec,
}

#[derive(Deserialize)]
struct RawSpec {
    messages: Vec<RawMessage>,
}

#[derive(Deserialize)]
struct RawMessage {
    label: String,
    selector: String,
    #[serde(default)]
    mutates: bool,
    #[serde(default)]
    payable: bool,
}

/// One callable contract message.
#[derive(Clone, Debug)]
pub struct InkMessage {
    label: String,
    selector: [u8; 4],
    mutates: bool,
    payable: bool,
}

impl InkMessage {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn selector(&self) -> [u8; 4] {
        self.selector
    }

    /// True for state-changing messages that require the commit path.
    pub fn mutates(&self) -> bool {
        self.mutates
    }

    pub fn payable(&self) -> bool {
        self.payable
    }

    /// Build the call payload: selector followed by SCALE-encoded arguments.
    pub fn encode_call<A: Encode>(&self, args: &A) -> Vec<u8> {
        let mut data = self.selector.to_vec();
        args.encode_to(&mut data);
        data
    }

    /// Decode a return payload into `T`.
    pub fn decode_return<T: Decode>(&self, bytes: &[u8]) -> Result<T, parity_scale_codec::Error> {
        T::decode(&mut &bytes[..])
    }
}

/// Message table parsed from a contract's metadata JSON.
pub struct ContractAbi {
    messages: HashMap<String, InkMessage>,
}

impl ContractAbi {
    /// Parse the message list out of ink! contract metadata.
    pub fn from_metadata_json(json: &str) -> Result<Self, CallError> {
        let raw: RawMetadata =
            serde_json::from_str(json).map_err(|e| CallError::InvalidAbi {
                reason: e.to_string(),
            })?;

        let mut messages = HashMap::with_capacity(raw.spec.messages.len());
        for message in raw.spec.messages {
            let selector_hex = message.selector.strip_prefix("0x").unwrap_or(&message.selector);
            let bytes = hex::decode(selector_hex).map_err(|e| CallError::InvalidAbi {
                reason: format!("selector of '{}': {e}", message.label),
            })?;
            let selector: [u8; 4] = bytes.try_into().map_err(|_| CallError::InvalidAbi {
                reason: format!("selector of '{}' is not 4 bytes", message.label),
            })?;
            messages.insert(
                message.label.clone(),
                InkMessage {
                    label: message.label,
                    selector,
                    mutates: message.mutates,
                    payable: message.payable,
                },
            );
        }

        Ok(Self { messages })
    }

    /// Look up a message by its label.
    pub fn message_by_name(&self, label: &str) -> Option<&InkMessage> {
        self.messages.get(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const METADATA: &str = r#"{
        "spec": {
            "messages": [
                { "label": "paid_until", "selector": "0x9bae9d5e", "mutates": false },
                { "label": "pay_subscription", "selector": "0xdeadbeef", "mutates": true, "payable": true }
            ]
        }
    }"#;

    #[test]
    fn parses_messages() {
        let abi = ContractAbi::from_metadata_json(METADATA).unwrap();
        let msg = abi.message_by_name("paid_until").unwrap();
        assert_eq!(msg.selector(), [0x9b, 0xae, 0x9d, 0x5e]);
        assert!(!msg.mutates());

        let tx = abi.message_by_name("pay_subscription").unwrap();
        assert!(tx.mutates());
        assert!(tx.payable());

        assert!(abi.message_by_name("missing").is_none());
    }

    #[test]
    fn encode_call_prepends_selector() {
        let abi = ContractAbi::from_metadata_json(METADATA).unwrap();
        let msg = abi.message_by_name("paid_until").unwrap();
        let payload = msg.encode_call(&42u32);
        assert_eq!(&payload[..4], &[0x9b, 0xae, 0x9d, 0x5e]);
        assert_eq!(&payload[4..], &42u32.encode()[..]);
    }

    #[test]
    fn rejects_bad_selectors() {
        let bad = r#"{ "spec": { "messages": [ { "label": "m", "selector": "0x1234" } ] } }"#;
        assert!(matches!(
            ContractAbi::from_metadata_json(bad),
            Err(CallError::InvalidAbi { .. })
        ));
        assert!(ContractAbi::from_metadata_json("not json").is_err());
    }
}
