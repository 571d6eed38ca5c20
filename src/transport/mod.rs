//! Transport connectors.
//!
//! Two interchangeable transports produce the same JSON-RPC-shaped client:
//! a direct socket connection ([`rpc`]) and an in-process smoldot light
//! client ([`light`]). Upper layers are transport-agnostic; they only see a
//! [`ChainLink`].

use futures::{Stream, StreamExt};
use subxt::backend::rpc::RpcClient;
use subxt::lightclient::LightClient;
use subxt::{OnlineClient, PolkadotConfig};

use crate::config::{ChainDescriptor, TransportKind};
use crate::error::TransportError;
use crate::status::StatusSender;

pub mod light;
pub mod rpc;

/// A live binding to one chain produced by a [`Connector`].
pub trait SessionLink: Send + 'static {
    /// Endpoint URI (or pseudo-URI) this link is bound to.
    fn uri(&self) -> &str;

    /// Graceful teardown. Must be idempotent: closing an already-closed link
    /// is a no-op, not an error.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Builds a [`SessionLink`] for a chain descriptor, publishing status
/// transitions along the way. The seam the session manager is generic over.
pub trait Connector: Send + Sync + 'static {
    type Link: SessionLink;

    fn connect(
        &self,
        descriptor: &ChainDescriptor,
        status: &StatusSender,
    ) -> impl Future<Output = Result<Self::Link, TransportError>> + Send;
}

/// Production connector: dispatches on the descriptor's transport variant.
#[derive(Default)]
pub struct NetworkConnector;

impl NetworkConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for NetworkConnector {
    type Link = ChainLink;

    async fn connect(
        &self,
        descriptor: &ChainDescriptor,
        status: &StatusSender,
    ) -> Result<ChainLink, TransportError> {
        descriptor.validate()?;
        match descriptor.transport {
            TransportKind::Rpc => rpc::connect(descriptor, status).await,
            TransportKind::LightClient => light::connect(descriptor, status).await,
        }
    }
}

/// Transport handle plus the typed client derived from it.
///
/// Dropping or closing the link releases the underlying socket or smoldot
/// engine; accessors hand out clones that share the same connection.
pub struct ChainLink {
    uri: String,
    client: Option<OnlineClient<PolkadotConfig>>,
    rpc: Option<RpcClient>,
    light: Option<LightClient>,
}

impl ChainLink {
    pub(crate) fn new(
        uri: String,
        client: OnlineClient<PolkadotConfig>,
        rpc: RpcClient,
        light: Option<LightClient>,
    ) -> Self {
        Self {
            uri,
            client: Some(client),
            rpc: Some(rpc),
            light,
        }
    }

    /// The typed API client, if the link is still open.
    pub fn api(&self) -> Option<OnlineClient<PolkadotConfig>> {
        self.client.clone()
    }

    /// The raw JSON-RPC client, if the link is still open.
    pub fn rpc_client(&self) -> Option<RpcClient> {
        self.rpc.clone()
    }

    /// Stream of finalized block numbers for this link's chain.
    pub async fn finalized_block_numbers(
        &self,
    ) -> Result<impl Stream<Item = Result<u64, subxt::Error>> + use<>, TransportError> {
        let client = self.client.clone().ok_or(TransportError::ClientInit {
            reason: "link is closed".to_string(),
        })?;
        let blocks = client
            .blocks()
            .subscribe_finalized()
            .await
            .map_err(|e| TransportError::ClientInit {
                reason: e.to_string(),
            })?;
        Ok(blocks.map(|block| block.map(|b| u64::from(b.number()))))
    }
}

impl SessionLink for ChainLink {
    fn uri(&self) -> &str {
        &self.uri
    }

    async fn close(&mut self) {
        if self.client.is_none() && self.rpc.is_none() && self.light.is_none() {
            return;
        }
        tracing::info!(uri = %self.uri, "closing transport");
        // Dropping the handles tears down the socket / smoldot engine once
        // outstanding clones are gone.
        self.client = None;
        self.rpc = None;
        self.light = None;
    }
}
