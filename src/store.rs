//! Object store adapter
//!
//! An [`ObjectStoreConnector`] turns a temporary credential set into an
//! [`ObjectStore`] client that is authenticated with exactly those
//! credentials. [`S3Connector`] is the `aws-sdk-s3` implementation.

use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::Client as S3Client;
use tracing::debug;

use crate::error::BrokerError;
use crate::types::{ObjectLocation, TemporaryCredentialSet};

/// Provider name attached to credentials handed to the S3 client
const ASSUMED_ROLE_PROVIDER: &str = "irsa-s3-probe-assume-role";

/// Read access to objects
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full object body into memory
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>, BrokerError>;
}

/// Builds object store clients bound to a specific credential set
pub trait ObjectStoreConnector: Send + Sync {
    fn connect(&self, credentials: &TemporaryCredentialSet) -> Box<dyn ObjectStore>;
}

/// Creates S3 clients from a shared base config and per-request credentials
pub struct S3Connector {
    base_config: aws_config::SdkConfig,
    bucket_region: Option<Region>,
}

impl S3Connector {
    pub fn new(base_config: aws_config::SdkConfig, bucket_region: Option<String>) -> Self {
        Self {
            base_config,
            bucket_region: bucket_region.map(Region::new),
        }
    }
}

impl ObjectStoreConnector for S3Connector {
    fn connect(&self, credentials: &TemporaryCredentialSet) -> Box<dyn ObjectStore> {
        let static_creds = Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            Some(credentials.session_token.clone()),
            credentials.expires_at,
            ASSUMED_ROLE_PROVIDER,
        );

        // The ambient provider from base_config is replaced, not chained
        let mut builder =
            aws_sdk_s3::config::Builder::from(&self.base_config).credentials_provider(static_creds);
        if let Some(region) = &self.bucket_region {
            builder = builder.region(region.clone());
        }

        Box::new(S3ObjectStore {
            client: S3Client::from_conf(builder.build()),
        })
    }
}

struct S3ObjectStore {
    client: S3Client,
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>, BrokerError> {
        debug!("Calling S3 GetObject for {}", location);

        let output = self
            .client
            .get_object()
            .bucket(&location.bucket)
            .key(&location.key)
            .send()
            .await
            .map_err(BrokerError::from_sdk)?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| BrokerError::Transport(format!("Failed to read object body: {}", e)))?;

        Ok(body.into_bytes().to_vec())
    }
}
