//! In-memory STS and object store doubles for unit tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::BrokerError;
use crate::sts::{CallerIdentity, SecurityTokenService};
use crate::store::{ObjectStore, ObjectStoreConnector};
use crate::types::{ObjectLocation, RoleIdentifier, TemporaryCredentialSet};

pub const TEST_ROLE: &str = "arn:aws:iam::498136949440:role/s3bridge-cross-account-role";
pub const TEST_BUCKET: &str = "cyper-s3bridge-test-bucket-1762272055";
pub const TEST_KEY: &str = "test.txt";
pub const TEST_ASSUMED_ARN: &str =
    "arn:aws:sts::498136949440:assumed-role/s3bridge-cross-account-role/irsa-s3-probe";

/// Access key issued by [`FakeSts`] for the n-th AssumeRole call
pub fn issued_access_key(call: usize) -> String {
    format!("ASIAFAKE{:04}", call)
}

/// STS double that issues numbered credentials and records each call
#[derive(Default)]
pub struct FakeSts {
    pub caller: Option<CallerIdentity>,
    pub deny_assume_role: bool,
    pub assume_calls: Mutex<Vec<(String, String)>>,
}

impl FakeSts {
    pub fn with_caller(account: &str, arn: &str) -> Self {
        Self {
            caller: Some(CallerIdentity {
                account: account.to_string(),
                arn: arn.to_string(),
            }),
            ..Default::default()
        }
    }

    pub fn denying() -> Self {
        Self {
            deny_assume_role: true,
            ..Default::default()
        }
    }

    pub fn assume_call_count(&self) -> usize {
        self.assume_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SecurityTokenService for FakeSts {
    async fn get_caller_identity(&self) -> Result<CallerIdentity, BrokerError> {
        self.caller.clone().ok_or_else(|| {
            BrokerError::Authorization("Unable to locate credentials".to_string())
        })
    }

    async fn assume_role(
        &self,
        role: &RoleIdentifier,
        session_name: &str,
    ) -> Result<TemporaryCredentialSet, BrokerError> {
        if self.deny_assume_role {
            return Err(BrokerError::Authorization(format!(
                "User is not authorized to perform: sts:AssumeRole on resource: {}",
                role
            )));
        }

        let mut calls = self.assume_calls.lock().unwrap();
        calls.push((role.to_string(), session_name.to_string()));

        Ok(TemporaryCredentialSet {
            access_key_id: issued_access_key(calls.len()),
            secret_access_key: format!("secret-{}", calls.len()),
            session_token: format!("token-{}", calls.len()),
            assumed_role_arn: TEST_ASSUMED_ARN.to_string(),
            expires_at: None,
        })
    }
}

/// Credentials handed to the connector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

/// Object store double serving fixed objects and recording credentials used
#[derive(Clone, Default)]
pub struct FakeConnector {
    objects: Arc<HashMap<(String, String), Vec<u8>>>,
    pub connections: Arc<Mutex<Vec<ObservedCredentials>>>,
    pub reads: Arc<Mutex<Vec<(ObservedCredentials, ObjectLocation)>>>,
}

impl FakeConnector {
    pub fn with_object(bucket: &str, key: &str, body: impl Into<Vec<u8>>) -> Self {
        let mut objects = HashMap::new();
        objects.insert((bucket.to_string(), key.to_string()), body.into());
        Self {
            objects: Arc::new(objects),
            ..Default::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl ObjectStoreConnector for FakeConnector {
    fn connect(&self, credentials: &TemporaryCredentialSet) -> Box<dyn ObjectStore> {
        let observed = ObservedCredentials {
            access_key_id: credentials.access_key_id.clone(),
            secret_access_key: credentials.secret_access_key.clone(),
            session_token: credentials.session_token.clone(),
        };
        self.connections.lock().unwrap().push(observed.clone());

        Box::new(FakeStore {
            credentials: observed,
            connector: self.clone(),
        })
    }
}

struct FakeStore {
    credentials: ObservedCredentials,
    connector: FakeConnector,
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>, BrokerError> {
        self.connector
            .reads
            .lock()
            .unwrap()
            .push((self.credentials.clone(), location.clone()));

        self.connector
            .objects
            .get(&(location.bucket.clone(), location.key.clone()))
            .cloned()
            .ok_or_else(|| BrokerError::NotFound("The specified key does not exist.".to_string()))
    }
}
