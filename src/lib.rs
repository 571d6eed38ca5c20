//! Chain connectivity and contract invocation for Polkadot SDK networks.
//!
//! Two concerns, layered:
//!
//! * **Connectivity** — [`session::ChainSession`] owns at most one live chain
//!   connection at a time, built over WebSocket RPC or an embedded light
//!   client depending on the [`config::ChainDescriptor`], and broadcasts its
//!   lifecycle through a [`status::ConnectionStatus`] watch channel. Switching
//!   chains tears the old connection down before the new one comes up, and
//!   overlapping switches resolve to the most recent request.
//! * **Contract calls** — [`contract::ContractCaller`] drives ink! contract
//!   messages through `pallet-revive`: reads are dry runs decoded leniently,
//!   writes are a mandatory dry run for gas and deposit limits followed by a
//!   signed submission with exactly those limits.
//!
//! ```no_run
//! use dotlink::config::well_known;
//! use dotlink::session::ChainSession;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let session = ChainSession::default();
//! let mut status = session.subscribe_status();
//!
//! session.activate(well_known()[0].clone()).await;
//! while status.changed().await.is_ok() {
//!     println!("{}", *status.borrow());
//! }
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod contract;
pub mod error;
pub mod registry;
pub mod session;
pub mod status;
pub mod transport;

pub use codec::{Address20, Hash32, normalize_address, normalize_hash32};
pub use config::{ChainDescriptor, TransportKind};
pub use contract::{ContractAbi, ContractCaller, DispatchFailure, ReviveRuntime};
pub use error::{CallError, CodecError, TransportError};
pub use session::{ChainSession, SessionManager};
pub use status::ConnectionStatus;
