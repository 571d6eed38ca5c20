//! Connection session management.
//!
//! Exactly one session is live at a time. Switching chains is an atomic
//! teardown-then-reinit: the previous transport is fully closed before the new
//! one is constructed, because two light-client engines must not run
//! concurrently. Concurrent `activate` calls are not queued; the last call to
//! complete teardown-and-reinit wins, and a superseded activation discards its
//! freshly built link and publishes no status (see [`StatusSender`]).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use subxt::backend::rpc::RpcClient;
use subxt::{OnlineClient, PolkadotConfig};
use tokio::sync::watch;

use crate::config::{ChainDescriptor, TransportKind};
use crate::status::{ConnectionStatus, LIGHTCLIENT_URI, StatusSender};
use crate::transport::{Connector, NetworkConnector, SessionLink};

/// Read-only snapshot of the active session.
#[derive(Clone, Debug)]
pub struct SessionInfo {
    pub descriptor: ChainDescriptor,
    pub uri: String,
    pub generation: u64,
}

struct ActiveSession<L> {
    descriptor: ChainDescriptor,
    link: L,
    generation: u64,
}

/// Owner of the exactly-one-live-at-a-time chain session.
pub struct SessionManager<C: Connector> {
    connector: C,
    latest: Arc<AtomicU64>,
    status_tx: watch::Sender<ConnectionStatus>,
    session: Mutex<Option<ActiveSession<C::Link>>>,
}

/// Production session manager over the network connector.
pub type ChainSession = SessionManager<NetworkConnector>;

impl Default for ChainSession {
    fn default() -> Self {
        Self::new(NetworkConnector::new())
    }
}

impl<C: Connector> SessionManager<C> {
    pub fn new(connector: C) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Idle);
        Self {
            connector,
            latest: Arc::new(AtomicU64::new(0)),
            status_tx,
            session: Mutex::new(None),
        }
    }

    /// Subscribe to connection status transitions for all sessions managed
    /// here, current and future.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status_tx.subscribe()
    }

    /// Activate `descriptor`, tearing down any active session first.
    ///
    /// Always reconnects, even for the descriptor that is already active: the
    /// existing transport may be degraded and re-activation is the recovery
    /// path. Transport failures resolve this call normally and are observed
    /// through the status stream only.
    pub async fn activate(&self, descriptor: ChainDescriptor) {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let status = StatusSender::new(self.status_tx.clone(), self.latest.clone(), generation);

        // Teardown strictly precedes re-init.
        let previous = self.lock_slot().take();
        if let Some(mut prev) = previous {
            tracing::info!(chain = %prev.descriptor.key, "tearing down previous session");
            prev.link.close().await;
        }

        status.publish(ConnectionStatus::Connecting {
            uri: connecting_hint(&descriptor),
        });

        match self.connector.connect(&descriptor, &status).await {
            Ok(link) => {
                let mut slot = self.lock_slot();
                if self.latest.load(Ordering::SeqCst) == generation {
                    tracing::info!(chain = %descriptor.key, generation, "session active");
                    *slot = Some(ActiveSession {
                        descriptor,
                        link,
                        generation,
                    });
                } else {
                    drop(slot);
                    tracing::debug!(
                        chain = %descriptor.key,
                        generation,
                        "activation superseded; discarding fresh link"
                    );
                    let mut link = link;
                    link.close().await;
                }
            }
            Err(e) => {
                tracing::warn!(chain = %descriptor.key, error = %e, "connection failed");
                status.publish(ConnectionStatus::Error {
                    cause: e.to_string(),
                });
            }
        }
    }

    /// Snapshot of the active session, if any. Never blocks.
    pub fn current(&self) -> Option<SessionInfo> {
        self.lock_slot().as_ref().map(|s| SessionInfo {
            descriptor: s.descriptor.clone(),
            uri: s.link.uri().to_string(),
            generation: s.generation,
        })
    }

    /// Run `f` against the active link, if any.
    pub fn with_link<R>(&self, f: impl FnOnce(&C::Link) -> R) -> Option<R> {
        self.lock_slot().as_ref().map(|s| f(&s.link))
    }

    /// Tear down the active session. Idempotent: repeated calls are no-ops.
    pub async fn shutdown(&self) {
        let previous = self.lock_slot().take();
        if let Some(mut prev) = previous {
            tracing::info!(chain = %prev.descriptor.key, "shutting down session");
            prev.link.close().await;
            self.status_tx.send_replace(ConnectionStatus::Closed);
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Option<ActiveSession<C::Link>>> {
        // Held only for non-awaiting critical sections; a poisoned lock means
        // a panic already tore through one of those.
        self.session.lock().expect("session lock poisoned")
    }
}

impl ChainSession {
    /// Typed API client of the active session, if connected.
    pub fn api(&self) -> Option<OnlineClient<PolkadotConfig>> {
        self.with_link(|link| link.api()).flatten()
    }

    /// Raw JSON-RPC client of the active session, if connected.
    pub fn rpc(&self) -> Option<RpcClient> {
        self.with_link(|link| link.rpc_client()).flatten()
    }
}

fn connecting_hint(descriptor: &ChainDescriptor) -> String {
    match descriptor.transport {
        TransportKind::LightClient => LIGHTCLIENT_URI.to_string(),
        TransportKind::Rpc => descriptor
            .endpoints
            .first()
            .cloned()
            .unwrap_or_else(|| descriptor.key.clone()),
    }
}
