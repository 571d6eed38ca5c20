//! Chain descriptors and the built-in chain catalogue.
//!
//! A `ChainDescriptor` is the static, immutable description of a reachable
//! network. A fixed catalogue of these is configuration; nothing here opens a
//! connection.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::TransportError;

/// Transport variant used to reach a chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Direct JSON-RPC over a persistent ws/wss socket.
    Rpc,
    /// In-process smoldot light client speaking peer-to-peer protocols.
    LightClient,
}

/// Native token properties used by consumers to interpret balances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    pub token_decimals: u8,
    pub token_symbol: String,
}

/// Static description of a reachable network.
///
/// Immutable once constructed. Parachains carry their relay chain as a boxed
/// descriptor in `relay`; the relationship is strictly one level deep.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainDescriptor {
    /// Unique key identifying this chain (e.g. "polkadot_asset_hub").
    pub key: String,

    /// Human-readable display name.
    pub name: String,

    /// Transport variant to use for this chain.
    pub transport: TransportKind,

    /// Candidate RPC endpoint URLs, ordered, first preferred.
    pub endpoints: Vec<String>,

    /// Relay (parent) chain descriptor; present only for parachains.
    #[serde(default)]
    pub relay: Option<Box<ChainDescriptor>>,

    /// JSON chain specification string, required for the light-client
    /// transport.
    #[serde(default)]
    pub chain_spec: Option<String>,

    /// Block-explorer base URL, if any.
    #[serde(default)]
    pub explorer_url: Option<String>,

    /// Native token properties.
    pub properties: ChainProperties,
}

impl ChainDescriptor {
    /// Switch this descriptor to the light-client transport with the given
    /// chain specification.
    pub fn with_chain_spec(mut self, chain_spec: impl Into<String>) -> Self {
        self.transport = TransportKind::LightClient;
        self.chain_spec = Some(chain_spec.into());
        self
    }

    /// Validate the descriptor against its transport variant.
    ///
    /// Run before connecting so misconfiguration fails fast instead of midway
    /// through a bootstrap.
    pub fn validate(&self) -> Result<(), TransportError> {
        match self.transport {
            TransportKind::Rpc => {
                if self.endpoints.is_empty() {
                    return Err(TransportError::NoEndpoints {
                        chain: self.key.clone(),
                    });
                }
            }
            TransportKind::LightClient => {
                if self.chain_spec.is_none() {
                    return Err(TransportError::MissingChainSpec {
                        chain: self.key.clone(),
                    });
                }
                if let Some(relay) = &self.relay {
                    if relay.chain_spec.is_none() {
                        return Err(TransportError::MissingChainSpec {
                            chain: relay.key.clone(),
                        });
                    }
                    // Strict one-level parent relationship.
                    if relay.relay.is_some() {
                        return Err(TransportError::ClientInit {
                            reason: format!(
                                "relay chain '{}' must not itself have a relay chain",
                                relay.key
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

fn chain(
    key: &str,
    name: &str,
    endpoints: &[&str],
    token_decimals: u8,
    token_symbol: &str,
    relay: Option<ChainDescriptor>,
) -> ChainDescriptor {
    ChainDescriptor {
        key: key.to_string(),
        name: name.to_string(),
        transport: TransportKind::Rpc,
        endpoints: endpoints.iter().map(|e| e.to_string()).collect(),
        relay: relay.map(Box::new),
        chain_spec: None,
        explorer_url: None,
        properties: ChainProperties {
            token_decimals,
            token_symbol: token_symbol.to_string(),
        },
    }
}

/// The built-in chain catalogue: Polkadot and Paseo with their Asset Hub
/// parachains. First entry is the default chain.
pub fn well_known() -> Vec<ChainDescriptor> {
    let polkadot = chain("polkadot", "Polkadot", &["wss://rpc.polkadot.io"], 10, "DOT", None);
    let paseo = chain("paseo", "Paseo", &["wss://rpc.ibp.network/paseo"], 10, "PAS", None);

    let polkadot_asset_hub = chain(
        "polkadot_asset_hub",
        "Polkadot Asset Hub",
        &[
            "wss://polkadot-asset-hub-rpc.polkadot.io",
            "wss://statemint.api.onfinality.io/public-ws",
        ],
        10,
        "DOT",
        Some(polkadot.clone()),
    );
    let paseo_asset_hub = chain(
        "paseo_asset_hub",
        "Paseo Asset Hub",
        &["wss://asset-hub-paseo-rpc.dwellir.com"],
        10,
        "PAS",
        Some(paseo.clone()),
    );

    vec![polkadot, polkadot_asset_hub, paseo, paseo_asset_hub]
}

/// Pick the connection endpoint, honoring a caller-supplied override only
/// when it is a valid `wss` URL. Anything else falls back to the default.
pub fn resolve_endpoint(override_url: Option<&str>, default: &str) -> String {
    let Some(candidate) = override_url else {
        return default.to_string();
    };
    match Url::parse(candidate) {
        Ok(url) if url.scheme() == "wss" => candidate.to_string(),
        _ => default.to_string(),
    }
}

/// Build a Polkadot-JS Apps explorer link for a transaction hash.
pub fn explorer_link(endpoint: &str, tx_hash: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(endpoint.as_bytes()).collect();
    format!("https://polkadot.js.org/apps/?rpc={encoded}#/explorer/query/{tx_hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_parents_are_one_level() {
        let chains = well_known();
        assert_eq!(chains.len(), 4);

        let asset_hub = chains.iter().find(|c| c.key == "polkadot_asset_hub").unwrap();
        let relay = asset_hub.relay.as_ref().unwrap();
        assert_eq!(relay.key, "polkadot");
        assert!(relay.relay.is_none());

        let polkadot = chains.iter().find(|c| c.key == "polkadot").unwrap();
        assert!(polkadot.relay.is_none());
    }

    #[test]
    fn validate_requires_endpoints_for_rpc() {
        let mut descriptor = well_known().remove(0);
        descriptor.endpoints.clear();
        assert!(matches!(
            descriptor.validate(),
            Err(TransportError::NoEndpoints { .. })
        ));
    }

    #[test]
    fn validate_requires_chain_spec_for_light_client() {
        let descriptor = well_known().remove(0);
        let mut lc = descriptor.clone();
        lc.transport = TransportKind::LightClient;
        assert!(matches!(
            lc.validate(),
            Err(TransportError::MissingChainSpec { .. })
        ));
        assert!(lc.clone().with_chain_spec("{}").validate().is_ok());
    }

    #[test]
    fn endpoint_override_must_be_wss() {
        let default = "wss://rpc.polkadot.io";
        assert_eq!(resolve_endpoint(None, default), default);
        assert_eq!(
            resolve_endpoint(Some("wss://rpc.example.org"), default),
            "wss://rpc.example.org"
        );
        assert_eq!(resolve_endpoint(Some("http://evil.example"), default), default);
        assert_eq!(resolve_endpoint(Some("not a url"), default), default);
    }

    #[test]
    fn explorer_link_encodes_endpoint() {
        let link = explorer_link("wss://rpc.polkadot.io", "0xabc");
        assert!(link.contains("wss%3A%2F%2Frpc.polkadot.io"));
        assert!(link.ends_with("/explorer/query/0xabc"));
    }

    #[test]
    fn descriptor_round_trips_through_serde() {
        let chains = well_known();
        let json = serde_json::to_string(&chains).unwrap();
        let back: Vec<ChainDescriptor> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), chains.len());
        assert_eq!(back[1].relay.as_ref().unwrap().key, "polkadot");
    }
}
