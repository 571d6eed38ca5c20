//! Error types, one enum per domain.
//!
//! `CodecError` for malformed caller input, `TransportError` for connection
//! bootstrap and teardown, `CallError` for the contract call protocol. Each
//! variant names the failing concern; underlying library errors ride along as
//! sources rather than being stringified away.

use crate::contract::dispatch::DispatchFailure;

/// Errors produced while normalizing addresses, hashes and fixed-width values.
///
/// These are input-validation failures: they occur before any network call and
/// have no side effects.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Invalid address '{input}': {reason}")]
    InvalidAddress { input: String, reason: String },

    #[error("Invalid hash: expected {expected} bytes, got {got}")]
    InvalidHash { expected: usize, got: usize },

    #[error("Value does not fit into {width} bytes")]
    ValueOverflow { width: usize },
}

/// Transport bootstrap and teardown failures.
///
/// These are never raised synchronously from `SessionManager::activate`; they
/// are observed through the `ConnectionStatus` stream only.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("No RPC endpoints configured for chain '{chain}'")]
    NoEndpoints { chain: String },

    #[error("Unsupported RPC URL scheme (expected ws/wss): {url}")]
    UnsupportedScheme { url: String },

    #[error("RPC connection failed after trying {attempts} endpoint(s)")]
    ConnectionFailed { attempts: usize },

    #[error("Missing chain specification for light-client chain '{chain}'")]
    MissingChainSpec { chain: String },

    #[error("Light-client bootstrap failed for chain '{chain}': {reason}")]
    LightClient { chain: String, reason: String },

    #[error("RPC client error: {0}")]
    Rpc(#[from] subxt::ext::subxt_rpcs::Error),

    #[error("Client initialization failed: {reason}")]
    ClientInit { reason: String },
}

/// Contract call protocol failures.
///
/// `SimulationFailed` and `Dispatch` are on-chain-level outcomes the caller
/// must branch on; the remaining variants are plumbing failures.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("No active session")]
    NoSession,

    #[error("Invalid contract metadata: {reason}")]
    InvalidAbi { reason: String },

    #[error("Contract has no message labelled '{label}'")]
    UnknownMessage { label: String },

    #[error("Dry run rejected the call{}", failure_suffix(.failure))]
    SimulationFailed { failure: Option<DispatchFailure> },

    #[error("Dispatch failed: {0}")]
    Dispatch(DispatchFailure),

    #[error("Runtime API call failed: {reason}")]
    RuntimeApi {
        reason: String,
        #[source]
        source: Option<subxt::Error>,
    },

    #[error("Failed to decode runtime response: {0}")]
    Decode(#[from] parity_scale_codec::Error),

    #[error("Transaction submission failed: {reason}")]
    Submission {
        reason: String,
        #[source]
        source: Option<subxt::Error>,
    },
}

fn failure_suffix(failure: &Option<DispatchFailure>) -> String {
    match failure {
        Some(f) => format!(": {f}"),
        None => String::new(),
    }
}

impl CallError {
    pub(crate) fn runtime_api(reason: impl Into<String>, source: subxt::Error) -> Self {
        Self::RuntimeApi {
            reason: reason.into(),
            source: Some(source),
        }
    }

    pub(crate) fn submission(reason: impl Into<String>, source: subxt::Error) -> Self {
        Self::Submission {
            reason: reason.into(),
            source: Some(source),
        }
    }
}
