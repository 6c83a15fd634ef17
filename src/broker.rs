//! Cross-Account Credential Broker
//!
//! Assumes the target role and reads one object with the resulting temporary
//! credentials. Credentials are obtained fresh for every call and dropped
//! before it returns.

use std::sync::Arc;
use tracing::{debug, info};

use crate::error::BrokerError;
use crate::store::ObjectStoreConnector;
use crate::sts::SecurityTokenService;
use crate::types::{ObjectLocation, ObjectRead, RoleIdentifier};

/// Default RoleSessionName used for AssumeRole
pub const DEFAULT_SESSION_NAME: &str = "irsa-s3-probe";

pub struct CredentialBroker {
    sts: Arc<dyn SecurityTokenService>,
    connector: Arc<dyn ObjectStoreConnector>,
    session_name: String,
}

impl CredentialBroker {
    pub fn new(
        sts: Arc<dyn SecurityTokenService>,
        connector: Arc<dyn ObjectStoreConnector>,
        session_name: impl Into<String>,
    ) -> Self {
        Self {
            sts,
            connector,
            session_name: session_name.into(),
        }
    }

    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// Assume `role`, then read `location` with the assumed credentials.
    ///
    /// The two calls run strictly in order. The body is read fully into
    /// memory and must be valid UTF-8.
    pub async fn read_object_via_assumed_role(
        &self,
        role: &RoleIdentifier,
        location: &ObjectLocation,
    ) -> Result<ObjectRead, BrokerError> {
        let credentials = self.sts.assume_role(role, &self.session_name).await?;
        info!("Assumed role {} as {}", role, credentials.assumed_role_arn);
        debug!(access_key_id = %credentials.access_key_id, "Issued temporary credentials");

        let store = self.connector.connect(&credentials);
        let bytes = store.get_object(location).await?;
        let size = bytes.len();
        let content = String::from_utf8(bytes)?;

        info!("Read {} ({} bytes) via assumed role", location, size);

        Ok(ObjectRead {
            assumed_role_arn: credentials.assumed_role_arn,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{
        issued_access_key, FakeConnector, FakeSts, TEST_ASSUMED_ARN, TEST_BUCKET, TEST_KEY,
        TEST_ROLE,
    };

    fn broker(sts: Arc<FakeSts>, connector: FakeConnector) -> CredentialBroker {
        CredentialBroker::new(sts, Arc::new(connector), DEFAULT_SESSION_NAME)
    }

    fn target() -> (RoleIdentifier, ObjectLocation) {
        (
            RoleIdentifier::new(TEST_ROLE),
            ObjectLocation::new(TEST_BUCKET, TEST_KEY),
        )
    }

    #[tokio::test]
    async fn test_reads_object_with_assumed_credentials() {
        let sts = Arc::new(FakeSts::default());
        let connector = FakeConnector::with_object(TEST_BUCKET, TEST_KEY, "hello");
        let broker = broker(sts.clone(), connector.clone());
        let (role, location) = target();
        assert_eq!(broker.session_name(), DEFAULT_SESSION_NAME);

        let read = broker
            .read_object_via_assumed_role(&role, &location)
            .await
            .unwrap();

        assert_eq!(read.content, "hello");
        assert_eq!(read.assumed_role_arn, TEST_ASSUMED_ARN);

        let calls = sts.assume_calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(TEST_ROLE.to_string(), broker.session_name().to_string())]
        );

        let reads = connector.reads.lock().unwrap().clone();
        assert_eq!(reads.len(), 1);
        let (used, read_location) = &reads[0];
        assert_eq!(used.access_key_id, issued_access_key(1));
        assert_eq!(used.secret_access_key, "secret-1");
        assert_eq!(used.session_token, "token-1");
        assert_eq!(read_location, &location);
    }

    #[tokio::test]
    async fn test_each_call_assumes_role_again() {
        let sts = Arc::new(FakeSts::default());
        let connector = FakeConnector::with_object(TEST_BUCKET, TEST_KEY, "hello");
        let broker = broker(sts.clone(), connector.clone());
        let (role, location) = target();

        broker.read_object_via_assumed_role(&role, &location).await.unwrap();
        broker.read_object_via_assumed_role(&role, &location).await.unwrap();

        assert_eq!(sts.assume_call_count(), 2);
        let connections = connector.connections.lock().unwrap().clone();
        assert_eq!(connections.len(), 2);
        assert_eq!(connections[0].access_key_id, issued_access_key(1));
        assert_eq!(connections[1].access_key_id, issued_access_key(2));
    }

    #[tokio::test]
    async fn test_non_utf8_body_is_decode_error() {
        let sts = Arc::new(FakeSts::default());
        let connector = FakeConnector::with_object(TEST_BUCKET, TEST_KEY, vec![0x68, 0xff, 0xfe]);
        let broker = broker(sts, connector);
        let (role, location) = target();

        let err = broker
            .read_object_via_assumed_role(&role, &location)
            .await
            .unwrap_err();

        assert!(matches!(err, BrokerError::Decode(_)));
        assert!(!err.to_string().is_empty());
    }

    #[tokio::test]
    async fn test_denied_role_skips_object_read() {
        let sts = Arc::new(FakeSts::denying());
        let connector = FakeConnector::with_object(TEST_BUCKET, TEST_KEY, "hello");
        let broker = broker(sts, connector.clone());
        let (role, location) = target();

        let err = broker
            .read_object_via_assumed_role(&role, &location)
            .await
            .unwrap_err();

        assert!(matches!(err, BrokerError::Authorization(_)));
        assert!(connector.connections.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let sts = Arc::new(FakeSts::default());
        let broker = broker(sts, FakeConnector::empty());
        let (role, location) = target();

        let err = broker
            .read_object_via_assumed_role(&role, &location)
            .await
            .unwrap_err();

        assert!(matches!(err, BrokerError::NotFound(_)));
    }
}
