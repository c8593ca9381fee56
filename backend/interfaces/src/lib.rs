//! Trait seams between the gateway core and its collaborators: the
//! persistence layer (token cache, credentials, sequences, audit log) and
//! the HTTP transport.

pub mod stores;
pub mod transport;

pub use stores::{CredentialStore, SequenceStore, SessionStore};
pub use transport::{AuditSink, JsonCall, JsonTransport, SoapCall, SoapTransport};
