//! Smoldot light-client transport.
//!
//! The light-client engine syncs chain state over peer-to-peer gossip instead
//! of trusting a single RPC endpoint. Parachains require their relay chain to
//! be registered with the engine first; the parachain registration then
//! references that relay handle. There is no automatic retry: a failed
//! bootstrap leaves partially-initialized engine state that must be discarded
//! before reconnecting, which happens by re-activating the chain.

use subxt::backend::rpc::RpcClient;
use subxt::lightclient::LightClient;
use subxt::{OnlineClient, PolkadotConfig};

use crate::config::ChainDescriptor;
use crate::error::TransportError;
use crate::status::{ConnectionStatus, LIGHTCLIENT_URI, StatusSender};
use crate::transport::ChainLink;

pub(crate) async fn connect(
    descriptor: &ChainDescriptor,
    status: &StatusSender,
) -> Result<ChainLink, TransportError> {
    let chain_spec =
        descriptor
            .chain_spec
            .as_deref()
            .ok_or_else(|| TransportError::MissingChainSpec {
                chain: descriptor.key.clone(),
            })?;

    status.publish(ConnectionStatus::Connecting {
        uri: LIGHTCLIENT_URI.to_string(),
    });

    let (light, chain_rpc) = match &descriptor.relay {
        Some(relay) => {
            let relay_spec =
                relay
                    .chain_spec
                    .as_deref()
                    .ok_or_else(|| TransportError::MissingChainSpec {
                        chain: relay.key.clone(),
                    })?;

            tracing::info!(chain = %descriptor.key, relay = %relay.key, "registering relay chain");
            let (light, _relay_rpc) =
                LightClient::relay_chain(relay_spec).map_err(|e| TransportError::LightClient {
                    chain: relay.key.clone(),
                    reason: e.to_string(),
                })?;

            tracing::info!(chain = %descriptor.key, "registering parachain");
            let para_rpc =
                light
                    .parachain(chain_spec)
                    .map_err(|e| TransportError::LightClient {
                        chain: descriptor.key.clone(),
                        reason: e.to_string(),
                    })?;
            (light, para_rpc)
        }
        None => {
            tracing::info!(chain = %descriptor.key, "registering chain with light client");
            LightClient::relay_chain(chain_spec).map_err(|e| TransportError::LightClient {
                chain: descriptor.key.clone(),
                reason: e.to_string(),
            })?
        }
    };

    let rpc = RpcClient::new(chain_rpc);
    let client = OnlineClient::<PolkadotConfig>::from_rpc_client(rpc.clone())
        .await
        .map_err(|e| TransportError::ClientInit {
            reason: e.to_string(),
        })?;

    tracing::info!(chain = %descriptor.key, "connected via light client");
    status.publish(ConnectionStatus::Connected {
        uri: LIGHTCLIENT_URI.to_string(),
    });

    Ok(ChainLink::new(
        LIGHTCLIENT_URI.to_string(),
        client,
        rpc,
        Some(light),
    ))
}
