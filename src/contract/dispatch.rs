//! Dispatch error decoding.
//!
//! A dispatch error is the structured failure a node returns after a
//! transaction was included in a block but rejected by runtime logic. Two
//! representations are consumed: the SCALE form embedded in dry-run results
//! and `System.ExtrinsicFailed` events, and the JSON shape
//! `{ type, module?: { pallet, name } }` produced by wallet-facing tooling.

use std::fmt;

use parity_scale_codec::Decode;
use serde_json::Value;
use subxt::Metadata;

/// Decoded, user-visible dispatch failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchFailure {
    /// A pallet-level error, rendered as `"Pallet.ErrorName"`.
    Module { pallet: String, name: String },
    /// Any non-module error kind, rendered by its type name.
    Other(String),
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchFailure::Module { pallet, name } => write!(f, "{pallet}.{name}"),
            DispatchFailure::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// SCALE mirror of `sp_runtime::DispatchError`.
///
/// Variant order and inner shapes must match the runtime exactly; inner enums
/// are decoded so the byte stream is consumed correctly even when only the
/// outer kind is reported.
#[derive(Decode, Debug, PartialEq, Eq)]
pub(crate) enum SpDispatchError {
    // The &'static str payload of Other is #[codec(skip)] upstream.
    Other,
    CannotLookup,
    BadOrigin,
    Module(SpModuleError),
    ConsumerRemaining,
    NoProviders,
    TooManyConsumers,
    Token(SpTokenError),
    Arithmetic(SpArithmeticError),
    Transactional(SpTransactionalError),
    Exhausted,
    Corruption,
    Unavailable,
    RootNotAllowed,
}

#[derive(Decode, Debug, PartialEq, Eq)]
pub(crate) struct SpModuleError {
    pub index: u8,
    pub error: [u8; 4],
}

#[derive(Decode, Debug, PartialEq, Eq)]
pub(crate) enum SpTokenError {
    FundsUnavailable,
    OnlyProvider,
    BelowMinimum,
    CannotCreate,
    UnknownAsset,
    Frozen,
    Unsupported,
    CannotCreateHold,
    NotExpendable,
    Blocked,
}

#[derive(Decode, Debug, PartialEq, Eq)]
pub(crate) enum SpArithmeticError {
    Underflow,
    Overflow,
    DivisionByZero,
}

#[derive(Decode, Debug, PartialEq, Eq)]
pub(crate) enum SpTransactionalError {
    LimitReached,
    NoLayer,
}

impl SpDispatchError {
    fn kind(&self) -> &'static str {
        match self {
            SpDispatchError::Other => "Other",
            SpDispatchError::CannotLookup => "CannotLookup",
            SpDispatchError::BadOrigin => "BadOrigin",
            SpDispatchError::Module(_) => "Module",
            SpDispatchError::ConsumerRemaining => "ConsumerRemaining",
            SpDispatchError::NoProviders => "NoProviders",
            SpDispatchError::TooManyConsumers => "TooManyConsumers",
            SpDispatchError::Token(_) => "Token",
            SpDispatchError::Arithmetic(_) => "Arithmetic",
            SpDispatchError::Transactional(_) => "Transactional",
            SpDispatchError::Exhausted => "Exhausted",
            SpDispatchError::Corruption => "Corruption",
            SpDispatchError::Unavailable => "Unavailable",
            SpDispatchError::RootNotAllowed => "RootNotAllowed",
        }
    }
}

/// Resolve a SCALE dispatch error against the chain's metadata.
///
/// Pallet and error names the metadata cannot resolve degrade to the
/// `UnknownModule`/`UnknownError` placeholders rather than failing; node
/// versions that omit error metadata still produce a printable result.
pub(crate) fn resolve(error: &SpDispatchError, metadata: &Metadata) -> DispatchFailure {
    match error {
        SpDispatchError::Module(module) => {
            let pallet = metadata.pallet_by_index(module.index);
            let pallet_name = pallet.as_ref().map(|p| p.name().to_string());
            let error_name = pallet
                .and_then(|p| p.error_variant_by_index(module.error[0]))
                .map(|variant| variant.name.clone());
            module_failure(pallet_name, error_name)
        }
        other => DispatchFailure::Other(other.kind().to_string()),
    }
}

pub(crate) fn module_failure(pallet: Option<String>, name: Option<String>) -> DispatchFailure {
    DispatchFailure::Module {
        pallet: pallet.unwrap_or_else(|| "UnknownModule".to_string()),
        name: name.unwrap_or_else(|| "UnknownError".to_string()),
    }
}

/// Decode the externally-produced JSON dispatch error shape into a
/// human-readable string.
///
/// Non-module errors return their `type` directly; module errors read
/// `pallet`/`section` and `name`/`error`, falling back to the
/// `UnknownModule`/`UnknownError` placeholders when fields are absent.
pub fn decode_dispatch_error(error: &Value) -> String {
    let Some(obj) = error.as_object() else {
        return "Unknown error".to_string();
    };

    if let Some(kind) = obj.get("type").and_then(Value::as_str) {
        if kind != "Module" {
            return kind.to_string();
        }
    }

    if let Some(module) = obj.get("module").and_then(Value::as_object) {
        let pallet = module
            .get("pallet")
            .or_else(|| module.get("section"))
            .and_then(Value::as_str)
            .unwrap_or("UnknownModule");
        let name = module
            .get("name")
            .or_else(|| module.get("error"))
            .and_then(Value::as_str)
            .unwrap_or("UnknownError");
        return format!("{pallet}.{name}");
    }

    "Module error".to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_module_error_from_scale() {
        // Variant 3 (Module), pallet index 5, error bytes [1, 0, 0, 0].
        let bytes = [3u8, 5, 1, 0, 0, 0];
        let decoded = SpDispatchError::decode(&mut &bytes[..]).unwrap();
        assert_eq!(
            decoded,
            SpDispatchError::Module(SpModuleError {
                index: 5,
                error: [1, 0, 0, 0]
            })
        );
    }

    #[test]
    fn decodes_nested_error_kinds() {
        // Token(FundsUnavailable)
        let decoded = SpDispatchError::decode(&mut &[7u8, 0][..]).unwrap();
        assert_eq!(decoded.kind(), "Token");

        // BadOrigin
        let decoded = SpDispatchError::decode(&mut &[2u8][..]).unwrap();
        assert_eq!(decoded.kind(), "BadOrigin");
    }

    #[test]
    fn module_failure_preserves_placeholders() {
        let failure = module_failure(None, None);
        assert_eq!(failure.to_string(), "UnknownModule.UnknownError");

        let failure = module_failure(Some("Assets".into()), None);
        assert_eq!(failure.to_string(), "Assets.UnknownError");
    }

    #[test]
    fn json_module_error_with_error_key() {
        let raw = json!({ "type": "Module", "module": { "pallet": "Assets", "error": "BalanceLow" } });
        assert_eq!(decode_dispatch_error(&raw), "Assets.BalanceLow");
    }

    #[test]
    fn json_module_error_with_name_key() {
        let raw = json!({ "type": "Module", "module": { "section": "Balances", "name": "InsufficientBalance" } });
        assert_eq!(decode_dispatch_error(&raw), "Balances.InsufficientBalance");
    }

    #[test]
    fn json_non_module_error_returns_type() {
        assert_eq!(decode_dispatch_error(&json!({ "type": "BadOrigin" })), "BadOrigin");
    }

    #[test]
    fn json_fallbacks() {
        assert_eq!(decode_dispatch_error(&json!(null)), "Unknown error");
        assert_eq!(decode_dispatch_error(&json!("boom")), "Unknown error");
        assert_eq!(decode_dispatch_error(&json!({ "type": "Module" })), "Module error");
        assert_eq!(
            decode_dispatch_error(&json!({ "type": "Module", "module": {} })),
            "UnknownModule.UnknownError"
        );
    }
}
