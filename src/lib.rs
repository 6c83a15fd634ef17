//! IRSA Cross-Account S3 Probe
//!
//! Diagnostic service that checks an IRSA workload can assume a role in
//! another account and read an S3 object with the resulting credentials.

pub mod broker;
pub mod config;
pub mod error;
pub mod identity;
pub mod server;
pub mod store;
pub mod sts;
pub mod types;

#[cfg(test)]
mod testutil;

pub use broker::CredentialBroker;
pub use config::Config;
pub use error::BrokerError;
pub use store::{ObjectStore, ObjectStoreConnector, S3Connector};
pub use sts::{AwsSts, SecurityTokenService};
