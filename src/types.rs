//! Core types shared by the identity resolver and the credential broker.

use serde::Serialize;
use std::time::SystemTime;

/// ARN of the role to assume in the foreign account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleIdentifier(String);

impl RoleIdentifier {
    pub fn new(arn: impl Into<String>) -> Self {
        Self(arn.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoleIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Bucket and key of the object read through the assumed role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Short-lived credentials returned by AssumeRole.
///
/// Owned by the request that obtained them and dropped when it completes.
/// Not `Clone`, so a set cannot be stashed and handed to a later request.
#[derive(PartialEq, Eq)]
pub struct TemporaryCredentialSet {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    /// Principal ARN of the assumed-role session
    pub assumed_role_arn: String,
    pub expires_at: Option<SystemTime>,
}

impl std::fmt::Debug for TemporaryCredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemporaryCredentialSet")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field("session_token", &"** redacted **")
            .field("assumed_role_arn", &self.assumed_role_arn)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Caller identity as reported by GetCallerIdentity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityDescriptor {
    pub account: String,
    pub arn: String,
    pub is_irsa: bool,
}

/// Result of a successful read through the assumed role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectRead {
    pub assumed_role_arn: String,
    pub content: String,
}
