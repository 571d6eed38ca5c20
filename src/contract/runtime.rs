//! Runtime access for contract calls.
//!
//! The dry run goes through the raw `state_call("ReviveApi_call", …)` RPC
//! with hand-encoded SCALE arguments; the real submission is a dynamically
//! built `Revive.call` extrinsic signed with the account's keypair and
//! awaited to finalization. Both sit behind the [`ContractRuntime`] seam so
//! the protocol layer can be exercised without a node.

use parity_scale_codec::{Decode, Encode};
use serde_json::json;
use subxt::backend::rpc::RpcClient;
use subxt::dynamic::Value;
use subxt::ext::subxt_rpcs::rpc_params;
use subxt::utils::AccountId32;
use subxt::{OnlineClient, PolkadotConfig};
use subxt_signer::sr25519::Keypair;

use crate::codec::bytes_to_hex;
use crate::contract::dispatch::{self, SpDispatchError};
use crate::contract::{CallEnvelope, CallLimits, SimulationResult, Submission};
use crate::error::CallError;
use crate::registry::ClientRegistry;
use crate::session::ChainSession;

/// Weight limit of a contract execution: computational time and proof size.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Encode, Decode)]
pub struct WeightLimit {
    #[codec(compact)]
    pub ref_time: u64,
    #[codec(compact)]
    pub proof_size: u64,
}

/// SCALE mirror of `pallet_revive::StorageDeposit`.
#[derive(Decode, Debug)]
enum StorageDeposit {
    Refund(u128),
    Charge(u128),
}

impl StorageDeposit {
    fn value(&self) -> u128 {
        match self {
            StorageDeposit::Refund(v) | StorageDeposit::Charge(v) => *v,
        }
    }
}

/// SCALE mirror of `pallet_revive::ExecReturnValue`.
#[derive(Decode, Debug)]
struct ExecReturnValue {
    #[allow(dead_code)]
    flags: u32,
    data: Vec<u8>,
}

/// SCALE mirror of the `ReviveApi_call` return type.
#[derive(Decode, Debug)]
struct ContractCallResult {
    #[allow(dead_code)]
    gas_consumed: WeightLimit,
    gas_required: WeightLimit,
    storage_deposit: StorageDeposit,
    result: Result<ExecReturnValue, SpDispatchError>,
}

/// The node-facing half of the contract call protocol.
pub trait ContractRuntime: Send + Sync {
    /// Read-only dry run of `envelope` under `origin`.
    fn dry_run(
        &self,
        origin: &AccountId32,
        envelope: &CallEnvelope,
    ) -> impl Future<Output = Result<SimulationResult, CallError>> + Send;

    /// Sign, submit and await finalization of the real call.
    fn submit(
        &self,
        signer: &Keypair,
        envelope: &CallEnvelope,
        limits: CallLimits,
    ) -> impl Future<Output = Result<Submission, CallError>> + Send;
}

/// Production runtime over `pallet-revive`.
pub struct ReviveRuntime {
    client: OnlineClient<PolkadotConfig>,
    rpc: RpcClient,
}

impl ReviveRuntime {
    pub fn new(client: OnlineClient<PolkadotConfig>, rpc: RpcClient) -> Self {
        Self { client, rpc }
    }

    /// Build from the active session.
    pub fn from_session(session: &ChainSession) -> Result<Self, CallError> {
        let client = session.api().ok_or(CallError::NoSession)?;
        let rpc = session.rpc().ok_or(CallError::NoSession)?;
        Ok(Self::new(client, rpc))
    }

    /// Build from a registry-cached client for `endpoint`.
    pub async fn from_registry(
        registry: &ClientRegistry,
        endpoint: &str,
    ) -> Result<Self, CallError> {
        let rpc = registry.get_or_create(endpoint).await?;
        let client = OnlineClient::<PolkadotConfig>::from_rpc_client(rpc.clone())
            .await
            .map_err(|e| CallError::RuntimeApi {
                reason: format!("client initialization for {endpoint} failed"),
                source: Some(e),
            })?;
        Ok(Self::new(client, rpc))
    }
}

impl ContractRuntime for ReviveRuntime {
    async fn dry_run(
        &self,
        origin: &AccountId32,
        envelope: &CallEnvelope,
    ) -> Result<SimulationResult, CallError> {
        // (origin, dest, value, gas_limit, storage_deposit_limit, input_data)
        let args = (
            origin,
            &envelope.dest,
            envelope.value,
            None::<WeightLimit>,
            None::<u128>,
            &envelope.data,
        )
            .encode();

        tracing::debug!(dest = %envelope.dest, bytes = envelope.data.len(), "dry-running contract call");

        let raw: String = self
            .rpc
            .request("state_call", rpc_params!["ReviveApi_call", bytes_to_hex(&args)])
            .await
            .map_err(|e| CallError::RuntimeApi {
                reason: format!("ReviveApi_call failed: {e}"),
                source: None,
            })?;

        let bytes = hex::decode(raw.strip_prefix("0x").unwrap_or(&raw)).map_err(|e| {
            CallError::RuntimeApi {
                reason: format!("non-hex state_call response: {e}"),
                source: None,
            }
        })?;
        let decoded = ContractCallResult::decode(&mut &bytes[..])?;

        let failure = decoded
            .result
            .as_ref()
            .err()
            .map(|e| dispatch::resolve(e, &self.client.metadata()));
        let (success, return_data) = match decoded.result {
            Ok(ret) => (true, (!ret.data.is_empty()).then_some(ret.data)),
            Err(_) => (false, None),
        };

        Ok(SimulationResult {
            success,
            return_data,
            gas_required: decoded.gas_required,
            storage_deposit_limit: decoded.storage_deposit.value(),
            failure,
        })
    }

    async fn submit(
        &self,
        signer: &Keypair,
        envelope: &CallEnvelope,
        limits: CallLimits,
    ) -> Result<Submission, CallError> {
        let tx = subxt::dynamic::tx(
            "Revive",
            "call",
            vec![
                Value::from_bytes(envelope.dest.0),
                Value::u128(envelope.value),
                Value::named_composite([
                    ("ref_time", Value::u128(limits.gas.ref_time.into())),
                    ("proof_size", Value::u128(limits.gas.proof_size.into())),
                ]),
                Value::u128(limits.storage_deposit),
                Value::from_bytes(&envelope.data),
            ],
        );

        tracing::info!(dest = %envelope.dest, value = envelope.value, "submitting contract call");

        let progress = self
            .client
            .tx()
            .sign_and_submit_then_watch_default(&tx, signer)
            .await
            .map_err(|e| CallError::submission("sign-and-submit failed", e))?;

        let in_block = progress
            .wait_for_finalized()
            .await
            .map_err(|e| CallError::submission("transaction not finalized", e))?;
        let tx_hash = in_block.extrinsic_hash();

        let events = in_block
            .fetch_events()
            .await
            .map_err(|e| CallError::submission("failed to fetch events", e))?;

        let mut dispatch_error = None;
        for event in events.iter() {
            let event = event.map_err(|e| CallError::submission("failed to decode event", e))?;
            if event.pallet_name() == "System" && event.variant_name() == "ExtrinsicFailed" {
                // The first field of ExtrinsicFailed is the DispatchError.
                let bytes = event.field_bytes();
                let decoded = SpDispatchError::decode(&mut &bytes[..])?;
                dispatch_error = Some(dispatch::resolve(&decoded, &self.client.metadata()));
                break;
            }
        }

        Ok(Submission {
            dispatch_error,
            result: json!({ "extrinsicHash": bytes_to_hex(tx_hash.0) }),
        })
    }
}
