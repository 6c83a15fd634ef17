//! Security Token Service adapter
//!
//! The identity resolver and the credential broker only see the
//! [`SecurityTokenService`] trait; [`AwsSts`] backs it with `aws-sdk-sts`.

use async_trait::async_trait;
use aws_sdk_sts::Client as StsClient;
use std::time::SystemTime;
use tracing::debug;

use crate::error::BrokerError;
use crate::types::{RoleIdentifier, TemporaryCredentialSet};

/// Raw GetCallerIdentity result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
}

/// Trait for the two STS operations the service needs
#[async_trait]
pub trait SecurityTokenService: Send + Sync {
    /// Identity of the ambient credentials
    async fn get_caller_identity(&self) -> Result<CallerIdentity, BrokerError>;

    /// Exchange the ambient identity for credentials scoped to `role`
    async fn assume_role(
        &self,
        role: &RoleIdentifier,
        session_name: &str,
    ) -> Result<TemporaryCredentialSet, BrokerError>;
}

/// STS backed by the AWS SDK and the process credential chain
pub struct AwsSts {
    client: StsClient,
}

impl AwsSts {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: StsClient::new(sdk_config),
        }
    }
}

#[async_trait]
impl SecurityTokenService for AwsSts {
    async fn get_caller_identity(&self) -> Result<CallerIdentity, BrokerError> {
        debug!("Calling AWS STS GetCallerIdentity");

        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(BrokerError::from_sdk)?;

        let account = output
            .account()
            .ok_or_else(|| BrokerError::Service("GetCallerIdentity response missing Account".to_string()))?;
        let arn = output
            .arn()
            .ok_or_else(|| BrokerError::Service("GetCallerIdentity response missing Arn".to_string()))?;

        Ok(CallerIdentity {
            account: account.to_string(),
            arn: arn.to_string(),
        })
    }

    async fn assume_role(
        &self,
        role: &RoleIdentifier,
        session_name: &str,
    ) -> Result<TemporaryCredentialSet, BrokerError> {
        debug!("Calling AWS STS AssumeRole for {} (session {})", role, session_name);

        let output = self
            .client
            .assume_role()
            .role_arn(role.as_str())
            .role_session_name(session_name)
            .send()
            .await
            .map_err(BrokerError::from_sdk)?;

        let sts_creds = output
            .credentials()
            .ok_or_else(|| BrokerError::Service("AWS STS returned no credentials".to_string()))?;
        let assumed_role_user = output
            .assumed_role_user()
            .ok_or_else(|| BrokerError::Service("AWS STS returned no assumed role user".to_string()))?;

        Ok(TemporaryCredentialSet {
            access_key_id: sts_creds.access_key_id().to_string(),
            secret_access_key: sts_creds.secret_access_key().to_string(),
            session_token: sts_creds.session_token().to_string(),
            assumed_role_arn: assumed_role_user.arn().to_string(),
            expires_at: SystemTime::try_from(*sts_creds.expiration()).ok(),
        })
    }
}
