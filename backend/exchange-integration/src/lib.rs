//! Integration gateway for the exchange's mutual fund order platform.
//!
//! The pieces compose left to right: [`config`] resolves the deployment,
//! [`crypto`] guards credentials at rest, [`session`] keeps per-user tokens
//! alive, [`soap`] builds and parses the wire format, [`reference`] mints
//! collision-free order references, and [`credentials`] owns the partner
//! credential lifecycle. Transport lives in the `external-services` crate
//! behind the `interfaces` traits.

pub mod config;
pub mod credentials;
pub mod crypto;
pub mod mock;
pub mod orders;
pub mod reference;
pub mod session;
pub mod soap;
pub mod stores;

pub use config::{Environment, GatewayConfig};
pub use credentials::{CredentialInput, CredentialService, CredentialStatus};
pub use crypto::CredentialCipher;
pub use orders::{BuySell, BuySellType, CancelRequest, OrderRequest, OrderService, OrderTicket};
pub use reference::ReferenceNumberGenerator;
pub use session::SessionManager;
pub use soap::{ServiceFlag, SoapEnvelope};
pub use stores::{MemoryCredentialStore, MemorySequenceStore, MemorySessionStore};
