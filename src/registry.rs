//! Process-wide RPC client cache.
//!
//! One shared client per endpoint URL: repeated lookups return the handle
//! created on first use instead of opening a duplicate socket. Entries are
//! inserted once and never mutated or evicted; app-level chain switching
//! operates on sessions, not on this registry.

use std::collections::HashMap;

use subxt::backend::rpc::RpcClient;
use tokio::sync::Mutex;

use crate::error::TransportError;
use crate::transport::rpc::build_rpc_client;

/// Endpoint-keyed cache of shared [`RpcClient`] handles.
///
/// Inject an instance rather than relying on an ambient singleton; tests get
/// isolation from a fresh registry per test.
#[derive(Default)]
pub struct ClientRegistry {
    clients: Mutex<HashMap<String, RpcClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the shared client for `endpoint`, creating and caching it on
    /// first use. Guarantees at most one live client per endpoint URL for the
    /// lifetime of this registry.
    pub async fn get_or_create(&self, endpoint: &str) -> Result<RpcClient, TransportError> {
        self.get_or_create_with(endpoint, build_rpc_client).await
    }

    /// True when a client for `endpoint` has already been created.
    pub async fn contains(&self, endpoint: &str) -> bool {
        self.clients.lock().await.contains_key(endpoint)
    }

    // Lock is held across the build so two concurrent first lookups cannot
    // both open a socket for the same endpoint.
    async fn get_or_create_with<F>(
        &self,
        endpoint: &str,
        build: F,
    ) -> Result<RpcClient, TransportError>
    where
        F: AsyncFnOnce(&str) -> Result<RpcClient, TransportError>,
    {
        let mut clients = self.clients.lock().await;
        if let Some(existing) = clients.get(endpoint) {
            tracing::debug!(endpoint, "reusing cached RPC client");
            return Ok(existing.clone());
        }

        let client = build(endpoint).await?;
        clients.insert(endpoint.to_string(), client.clone());
        tracing::info!(endpoint, "RPC client cached");
        Ok(client)
    }
}
