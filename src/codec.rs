//! Address, hash and hex codec helpers.
//!
//! Everything on the wire uses canonical fixed-width byte forms: 20-byte
//! (H160) contract addresses and 32-byte hashes, rendered as lowercase
//! `0x`-prefixed hex. Inputs arrive either already in hex form or as SS58
//! strings from wallet-facing code; both normalize to the same canonical form.

use std::fmt;
use std::str::FromStr;

use parity_scale_codec::{Decode, Encode};
use serde_json::Value;
use subxt::utils::AccountId32;

use crate::error::CodecError;

/// Canonical 20-byte (H160) contract/account address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub struct Address20(pub [u8; 20]);

impl Address20 {
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl fmt::Display for Address20 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Canonical 32-byte hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Encode, Decode)]
pub struct Hash32(pub [u8; 32]);

impl Hash32 {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl fmt::Display for Hash32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Normalize an address string to its canonical 20-byte form.
///
/// Accepts either a `0x`-prefixed 40-hex-digit string or an SS58 address.
/// SS58 addresses decode to 32 bytes; the canonical H160 form is the first
/// 20 bytes, which is the mapping `pallet-revive` applies to Substrate
/// accounts.
pub fn normalize_address(input: &str) -> Result<Address20, CodecError> {
    if let Some(stripped) = input.strip_prefix("0x") {
        if stripped.len() != 40 {
            return Err(CodecError::InvalidAddress {
                input: input.to_string(),
                reason: format!("expected 20-byte (H160) hex, got {} hex digits", stripped.len()),
            });
        }
        let bytes = hex::decode(stripped).map_err(|e| CodecError::InvalidAddress {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        let mut out = [0u8; 20];
        out.copy_from_slice(&bytes);
        return Ok(Address20(out));
    }

    let account = AccountId32::from_str(input).map_err(|e| CodecError::InvalidAddress {
        input: input.to_string(),
        reason: e.to_string(),
    })?;
    let mut out = [0u8; 20];
    out.copy_from_slice(&account.0[..20]);
    Ok(Address20(out))
}

/// Normalize a 32-byte hash given as hex with or without a `0x` prefix.
///
/// No truncation or padding is performed; any decoded length other than
/// exactly 32 bytes is an error.
pub fn normalize_hash32(input: &str) -> Result<Hash32, CodecError> {
    let stripped = input.strip_prefix("0x").unwrap_or(input);
    let bytes = hex::decode(stripped).map_err(|_| CodecError::InvalidHash {
        expected: 32,
        got: stripped.len() / 2,
    })?;
    if bytes.len() != 32 {
        return Err(CodecError::InvalidHash {
            expected: 32,
            got: bytes.len(),
        });
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(Hash32(out))
}

/// Render raw bytes as lowercase `0x`-prefixed hex.
pub fn bytes_to_hex(bytes: impl AsRef<[u8]>) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Best-effort conversion of a decoded on-chain value into a `0x` hex string.
///
/// Recognized shapes: a string (prefixed if needed), a byte array, and objects
/// exposing a `hex` or `bytes` field. Anything else yields `None`. Total:
/// never panics, never errors.
pub fn to_hex_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => {
            if s.is_empty() {
                return None;
            }
            if s.starts_with("0x") {
                Some(s.clone())
            } else {
                Some(format!("0x{s}"))
            }
        }
        Value::Array(items) => {
            let mut bytes = Vec::with_capacity(items.len());
            for item in items {
                let byte = item.as_u64().filter(|v| *v <= u8::MAX as u64)?;
                bytes.push(byte as u8);
            }
            Some(bytes_to_hex(bytes))
        }
        Value::Object(map) => map
            .get("hex")
            .or_else(|| map.get("bytes"))
            .and_then(to_hex_string),
        _ => None,
    }
}

/// True for absent payloads and byte payloads of zero length.
///
/// Distinguishes "call succeeded but returned nothing" from a decode failure.
pub fn is_empty_result(value: Option<&[u8]>) -> bool {
    match value {
        None => true,
        Some(bytes) => bytes.is_empty(),
    }
}

/// Apply a decode function, falling back to `fallback` on any decode error.
///
/// The standard recovery path for contract reads: a missing or garbled value
/// is equivalent to "no data", so decode errors are swallowed here instead of
/// propagating to the caller.
pub fn safe_decode<R, T, E>(decode: impl FnOnce(R) -> Result<T, E>, raw: R, fallback: T) -> T {
    decode(raw).unwrap_or(fallback)
}

/// Encode `value` as left-zero-padded big-endian hex of exactly `width` bytes.
///
/// Values that do not fit in `width` bytes are an error; truncation is never
/// performed.
pub fn fixed_width_hex(value: u128, width: usize) -> Result<String, CodecError> {
    let be = value.to_be_bytes();
    if width >= be.len() {
        let mut out = vec![0u8; width - be.len()];
        out.extend_from_slice(&be);
        return Ok(bytes_to_hex(out));
    }
    if be[..be.len() - width].iter().any(|b| *b != 0) {
        return Err(CodecError::ValueOverflow { width });
    }
    Ok(bytes_to_hex(&be[be.len() - width..]))
}
