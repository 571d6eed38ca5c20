//! Direct socket RPC transport.
//!
//! Connects to the first reachable endpoint in the descriptor's list, falling
//! through the remaining endpoints in order. There is no cap on the number of
//! endpoints tried and no automatic retry once the list is exhausted.

use subxt::backend::rpc::RpcClient;
use subxt::{OnlineClient, PolkadotConfig};
use url::Url;

use crate::config::ChainDescriptor;
use crate::error::TransportError;
use crate::status::{ConnectionStatus, StatusSender};
use crate::transport::ChainLink;

/// Build an RPC client for a single ws/wss endpoint.
///
/// Plain `ws` is accepted for local development nodes; everything else must
/// be `wss`.
pub(crate) async fn build_rpc_client(endpoint: &str) -> Result<RpcClient, TransportError> {
    let url = Url::parse(endpoint).map_err(|_| TransportError::UnsupportedScheme {
        url: endpoint.to_string(),
    })?;

    match url.scheme() {
        "wss" => Ok(RpcClient::from_url(endpoint).await?),
        "ws" => Ok(RpcClient::from_insecure_url(endpoint).await?),
        _ => Err(TransportError::UnsupportedScheme {
            url: endpoint.to_string(),
        }),
    }
}

pub(crate) async fn connect(
    descriptor: &ChainDescriptor,
    status: &StatusSender,
) -> Result<ChainLink, TransportError> {
    let mut attempts = 0;

    for endpoint in &descriptor.endpoints {
        attempts += 1;
        status.publish(ConnectionStatus::Connecting {
            uri: endpoint.clone(),
        });

        let rpc = match build_rpc_client(endpoint).await {
            Ok(rpc) => rpc,
            Err(e) => {
                tracing::warn!(chain = %descriptor.key, endpoint, error = %e, "RPC endpoint failed");
                continue;
            }
        };

        match OnlineClient::<PolkadotConfig>::from_rpc_client(rpc.clone()).await {
            Ok(client) => {
                tracing::info!(chain = %descriptor.key, endpoint, "connected via socket RPC");
                status.publish(ConnectionStatus::Connected {
                    uri: endpoint.clone(),
                });
                return Ok(ChainLink::new(endpoint.clone(), client, rpc, None));
            }
            Err(e) => {
                tracing::warn!(chain = %descriptor.key, endpoint, error = %e, "client handshake failed");
            }
        }
    }

    Err(TransportError::ConnectionFailed { attempts })
}
