//! Contract call protocol.
//!
//! State-changing calls are strictly two-phase: a read-only dry run first, to
//! obtain the gas and storage-deposit limits the real call needs, then the
//! signed submission using exactly those limits. The two phases are coupled
//! inside [`ContractCaller::commit`]; there is no public way to submit with
//! limits taken from an unrelated simulation, which is what makes stale-limit
//! bugs unrepresentable.

use serde_json::Value;
use subxt::utils::AccountId32;
use subxt_signer::sr25519::Keypair;

use crate::codec::{self, Address20, is_empty_result, safe_decode};
use crate::error::CallError;

pub mod abi;
pub mod dispatch;
pub mod runtime;

pub use abi::{ContractAbi, InkMessage};
pub use dispatch::{DispatchFailure, decode_dispatch_error};
pub use runtime::{ContractRuntime, ReviveRuntime, WeightLimit};

/// One contract invocation: destination, encoded message payload, and the
/// value transferred alongside. Constructed fresh per call, never persisted.
#[derive(Clone, Debug)]
pub struct CallEnvelope {
    pub dest: Address20,
    pub data: Vec<u8>,
    pub value: u128,
}

impl CallEnvelope {
    pub fn new(dest: Address20, data: Vec<u8>) -> Self {
        Self {
            dest,
            data,
            value: 0,
        }
    }

    pub fn with_value(mut self, value: u128) -> Self {
        self.value = value;
        self
    }
}

/// Outcome of one dry run.
///
/// Consumed immediately by the commit phase of the same logical operation and
/// never cached across calls: chain state may have changed in between.
#[derive(Clone, Debug)]
pub struct SimulationResult {
    /// False when the simulated call would fail on-chain. Not an error;
    /// callers must branch on it.
    pub success: bool,
    /// Returned payload, `None` when the call returned nothing.
    pub return_data: Option<Vec<u8>>,
    /// Weight the real call needs.
    pub gas_required: WeightLimit,
    /// Storage deposit the real call needs.
    pub storage_deposit_limit: u128,
    /// Decoded failure detail when `success` is false.
    pub failure: Option<DispatchFailure>,
}

/// Limits threaded from a simulation into the submission it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallLimits {
    pub gas: WeightLimit,
    pub storage_deposit: u128,
}

/// Raw result of one finalized submission, as produced by a
/// [`ContractRuntime`].
#[derive(Clone, Debug)]
pub struct Submission {
    pub dispatch_error: Option<DispatchFailure>,
    /// Loosely-typed result object; the transaction hash is probed out of it
    /// by field name.
    pub result: Value,
}

/// Terminal result of a successful commit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// Canonical `0x` transaction hash, when the submission result exposed
    /// one.
    pub tx_hash: Option<String>,
}

/// Hash-bearing fields probed on a submission result, in priority order.
/// Implementations vary the field name; the first present, non-null one wins.
const TX_HASH_FIELDS: [&str; 4] = ["txHash", "extrinsicHash", "hash", "hashHex"];

fn probe_tx_hash(result: &Value) -> Option<String> {
    TX_HASH_FIELDS
        .iter()
        .find_map(|field| result.get(*field).filter(|v| !v.is_null()))
        .and_then(codec::to_hex_string)
}

/// Call helper bound to one contract: a destination address plus its ABI.
pub struct ContractCaller<R> {
    runtime: R,
    dest: Address20,
    abi: ContractAbi,
}

impl<R: ContractRuntime> ContractCaller<R> {
    pub fn new(runtime: R, dest: Address20, abi: ContractAbi) -> Self {
        Self { runtime, dest, abi }
    }

    /// Look up a message of this contract by label.
    pub fn message(&self, label: &str) -> Result<&InkMessage, CallError> {
        self.abi
            .message_by_name(label)
            .ok_or_else(|| CallError::UnknownMessage {
                label: label.to_string(),
            })
    }

    /// Build an envelope for `label` with SCALE-encodable arguments.
    pub fn envelope<A: parity_scale_codec::Encode>(
        &self,
        label: &str,
        args: &A,
        value: u128,
    ) -> Result<CallEnvelope, CallError> {
        let message = self.message(label)?;
        Ok(CallEnvelope::new(self.dest, message.encode_call(args)).with_value(value))
    }

    /// Dry-run `envelope` under `caller`'s origin.
    ///
    /// The dry run always transfers zero value; the envelope's value is
    /// applied only at commit time. On-chain-level failure is reported via
    /// `success == false`, never as an `Err`.
    pub async fn simulate(
        &self,
        caller: &AccountId32,
        envelope: &CallEnvelope,
    ) -> Result<SimulationResult, CallError> {
        let read_only = CallEnvelope {
            dest: envelope.dest,
            data: envelope.data.clone(),
            value: 0,
        };
        self.runtime.dry_run(caller, &read_only).await
    }

    /// Simulate, then sign and submit `envelope`, awaiting finalization.
    ///
    /// The internal simulation is mandatory even when the caller already ran
    /// one: limits must reflect this exact envelope and current chain state.
    /// A failed simulation refuses submission outright; a dispatch error in
    /// the finalized result is surfaced as [`CallError::Dispatch`], never as
    /// a success.
    pub async fn commit(
        &self,
        signer: &Keypair,
        envelope: &CallEnvelope,
    ) -> Result<DispatchOutcome, CallError> {
        let origin = signer.public_key().to_account_id();

        let simulation = self.simulate(&origin, envelope).await?;
        if !simulation.success {
            tracing::warn!(dest = %envelope.dest, failure = ?simulation.failure, "dry run failed; refusing to submit");
            return Err(CallError::SimulationFailed {
                failure: simulation.failure,
            });
        }

        let limits = CallLimits {
            gas: simulation.gas_required,
            storage_deposit: simulation.storage_deposit_limit,
        };

        let submission = self.runtime.submit(signer, envelope, limits).await?;
        if let Some(failure) = submission.dispatch_error {
            return Err(CallError::Dispatch(failure));
        }

        let tx_hash = probe_tx_hash(&submission.result);
        tracing::info!(dest = %envelope.dest, tx_hash = ?tx_hash, "contract call finalized");
        Ok(DispatchOutcome { tx_hash })
    }

    /// Read a value from the contract: encode, simulate, decode.
    ///
    /// Returns `None` for failed simulations, empty payloads and undecodable
    /// payloads; a garbled read degrades to "no data" instead of failing.
    pub async fn read<T: parity_scale_codec::Decode, A: parity_scale_codec::Encode>(
        &self,
        caller: &AccountId32,
        label: &str,
        args: &A,
    ) -> Result<Option<T>, CallError> {
        let message = self.message(label)?;
        let envelope = CallEnvelope::new(self.dest, message.encode_call(args));
        let result = self.simulate(caller, &envelope).await?;

        if !result.success || is_empty_result(result.return_data.as_deref()) {
            return Ok(None);
        }
        let bytes = result.return_data.unwrap_or_default();
        Ok(safe_decode(
            |raw: &[u8]| message.decode_return::<T>(raw).map(Some),
            bytes.as_slice(),
            None,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use parity_scale_codec::Encode;
    use serde_json::json;

    use super::*;

    const METADATA: &str = r#"{
        "spec": {
            "messages": [
                { "label": "price_of", "selector": "0x11223344", "mutates": false },
                { "label": "pay", "selector": "0x55667788", "mutates": true, "payable": true }
            ]
        }
    }"#;

    fn dest() -> Address20 {
        Address20([0xab; 20])
    }

    fn caller() -> AccountId32 {
        AccountId32([7u8; 32])
    }

    fn signer() -> Keypair {
        subxt_signer::sr25519::dev::alice()
    }

    #[derive(Default)]
    struct MockRuntime {
        simulation: Mutex<Option<SimulationResult>>,
        submission: Mutex<Option<Submission>>,
        dry_run_values: Mutex<Vec<u128>>,
        submitted: Mutex<Vec<(CallEnvelope, CallLimits)>>,
        submit_count: AtomicUsize,
    }

    impl MockRuntime {
        fn simulating(self, result: SimulationResult) -> Self {
            *self.simulation.lock().unwrap() = Some(result);
            self
        }

        fn submitting(self, submission: Submission) -> Self {
            *self.submission.lock().unwrap() = Some(submission);
            self
        }
    }

    fn ok_simulation(data: Option<Vec<u8>>) -> SimulationResult {
        SimulationResult {
            success: true,
            return_data: data,
            gas_required: WeightLimit {
                ref_time: 42,
                proof_size: 7,
            },
            storage_deposit_limit: 99,
            failure: None,
        }
    }

    impl ContractRuntime for MockRuntime {
        async fn dry_run(
            &self,
            _origin: &AccountId32,
            envelope: &CallEnvelope,
        ) -> Result<SimulationResult, CallError> {
            self.dry_run_values.lock().unwrap().push(envelope.value);
            Ok(self
                .simulation
                .lock()
                .unwrap()
                .clone()
                .expect("no simulation configured"))
        }

        async fn submit(
            &self,
            _signer: &Keypair,
            envelope: &CallEnvelope,
            limits: CallLimits,
        ) -> Result<Submission, CallError> {
            self.submit_count.fetch_add(1, Ordering::SeqCst);
            self.submitted
                .lock()
                .unwrap()
                .push((envelope.clone(), limits));
            Ok(self
                .submission
                .lock()
                .unwrap()
                .clone()
                .expect("no submission configured"))
        }
    }

    fn caller_with(runtime: MockRuntime) -> ContractCaller<MockRuntime> {
        ContractCaller::new(
            runtime,
            dest(),
            ContractAbi::from_metadata_json(METADATA).unwrap(),
        )
    }

    #[tokio::test]
    async fn commit_threads_limits_from_its_own_simulation() {
        let runtime = MockRuntime::default()
            .simulating(ok_simulation(None))
            .submitting(Submission {
                dispatch_error: None,
                result: json!({ "txHash": "0xfeed" }),
            });
        let contract = caller_with(runtime);

        let envelope = contract.envelope("pay", &(), 5).unwrap();
        let outcome = contract.commit(&signer(), &envelope).await.unwrap();
        assert_eq!(outcome.tx_hash.as_deref(), Some("0xfeed"));

        let submitted = contract.runtime.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        let (sent, limits) = &submitted[0];
        assert_eq!(
            *limits,
            CallLimits {
                gas: WeightLimit {
                    ref_time: 42,
                    proof_size: 7
                },
                storage_deposit: 99,
            }
        );
        // The dry run sees zero value, the submission the real one.
        assert_eq!(sent.value, 5);
        assert_eq!(*contract.runtime.dry_run_values.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn commit_refuses_submission_when_simulation_fails() {
        let runtime = MockRuntime::default().simulating(SimulationResult {
            success: false,
            return_data: None,
            gas_required: WeightLimit::default(),
            storage_deposit_limit: 0,
            failure: Some(DispatchFailure::Module {
                pallet: "Revive".into(),
                name: "OutOfGas".into(),
            }),
        });
        let contract = caller_with(runtime);

        let envelope = contract.envelope("pay", &(), 0).unwrap();
        let err = contract.commit(&signer(), &envelope).await.unwrap_err();
        assert!(matches!(err, CallError::SimulationFailed { .. }));
        assert_eq!(contract.runtime.submit_count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn commit_surfaces_dispatch_errors() {
        let runtime = MockRuntime::default()
            .simulating(ok_simulation(None))
            .submitting(Submission {
                dispatch_error: Some(DispatchFailure::Module {
                    pallet: "Assets".into(),
                    name: "BalanceLow".into(),
                }),
                result: json!({ "txHash": "0xfeed" }),
            });
        let contract = caller_with(runtime);

        let envelope = contract.envelope("pay", &(), 0).unwrap();
        match contract.commit(&signer(), &envelope).await {
            Err(CallError::Dispatch(failure)) => {
                assert_eq!(failure.to_string(), "Assets.BalanceLow");
            }
            other => panic!("expected dispatch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn tx_hash_probing_follows_priority_order() {
        let runtime = MockRuntime::default()
            .simulating(ok_simulation(None))
            .submitting(Submission {
                dispatch_error: None,
                // txHash is present but null; the probe must fall through to
                // the next field and normalize it.
                result: json!({ "txHash": null, "extrinsicHash": "abcd" }),
            });
        let contract = caller_with(runtime);

        let envelope = contract.envelope("pay", &(), 0).unwrap();
        let outcome = contract.commit(&signer(), &envelope).await.unwrap();
        assert_eq!(outcome.tx_hash.as_deref(), Some("0xabcd"));
    }

    #[tokio::test]
    async fn commit_succeeds_without_any_hash_field() {
        let runtime = MockRuntime::default()
            .simulating(ok_simulation(None))
            .submitting(Submission {
                dispatch_error: None,
                result: json!({}),
            });
        let contract = caller_with(runtime);

        let envelope = contract.envelope("pay", &(), 0).unwrap();
        let outcome = contract.commit(&signer(), &envelope).await.unwrap();
        assert_eq!(outcome.tx_hash, None);
    }

    #[tokio::test]
    async fn read_decodes_returned_payload() {
        let runtime = MockRuntime::default().simulating(ok_simulation(Some(123u64.encode())));
        let contract = caller_with(runtime);

        let price: Option<u64> = contract.read(&caller(), "price_of", &1u8).await.unwrap();
        assert_eq!(price, Some(123));
    }

    #[tokio::test]
    async fn read_degrades_to_none() {
        // Empty payload.
        let contract = caller_with(MockRuntime::default().simulating(ok_simulation(None)));
        let value: Option<u64> = contract.read(&caller(), "price_of", &()).await.unwrap();
        assert_eq!(value, None);

        // Undecodable payload: one byte cannot be a u64.
        let contract =
            caller_with(MockRuntime::default().simulating(ok_simulation(Some(vec![1]))));
        let value: Option<u64> = contract.read(&caller(), "price_of", &()).await.unwrap();
        assert_eq!(value, None);

        // Failed simulation.
        let contract = caller_with(MockRuntime::default().simulating(SimulationResult {
            success: false,
            return_data: None,
            gas_required: WeightLimit::default(),
            storage_deposit_limit: 0,
            failure: None,
        }));
        let value: Option<u64> = contract.read(&caller(), "price_of", &()).await.unwrap();
        assert_eq!(value, None);
    }

    #[tokio::test]
    async fn unknown_message_fails_before_any_call() {
        let contract = caller_with(MockRuntime::default());
        let err = contract.envelope("missing", &(), 0).unwrap_err();
        assert!(matches!(err, CallError::UnknownMessage { .. }));
        assert!(contract.runtime.dry_run_values.lock().unwrap().is_empty());
    }
}
