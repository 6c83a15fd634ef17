//! Service configuration
//!
//! Every option can be set with a flag or its environment variable. Defaults
//! point at the reference cross-account setup.

use clap::{Parser, ValueEnum};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;

use crate::broker::DEFAULT_SESSION_NAME;
use crate::types::{ObjectLocation, RoleIdentifier};

pub const DEFAULT_TARGET_ROLE: &str = "arn:aws:iam::498136949440:role/s3bridge-cross-account-role";
pub const DEFAULT_BUCKET: &str = "cyper-s3bridge-test-bucket-1762272055";
pub const DEFAULT_OBJECT_KEY: &str = "test.txt";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "irsa-s3-probe")]
#[command(about = "IRSA cross-account S3 access test service", long_about = None)]
#[command(version)]
pub struct Config {
    /// ARN of the cross-account role to assume
    #[arg(long, env = "TARGET_ROLE_ARN", default_value = DEFAULT_TARGET_ROLE)]
    pub target_role: String,

    /// Bucket holding the test object
    #[arg(long, env = "BUCKET_NAME", default_value = DEFAULT_BUCKET)]
    pub bucket: String,

    /// Key of the test object
    #[arg(long, env = "OBJECT_KEY", default_value = DEFAULT_OBJECT_KEY)]
    pub object_key: String,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "BIND_ADDRESS", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub bind_address: IpAddr,

    /// RoleSessionName passed to AssumeRole
    #[arg(long, env = "ROLE_SESSION_NAME", default_value = DEFAULT_SESSION_NAME)]
    pub session_name: String,

    /// Region for STS and S3 (defaults to the SDK provider chain)
    #[arg(long, env = "AWS_REGION")]
    pub region: Option<String>,

    /// Region of the target bucket, if different
    #[arg(long, env = "BUCKET_REGION")]
    pub bucket_region: Option<String>,

    /// Per-operation timeout for AWS calls, in seconds
    #[arg(long, env = "AWS_CALL_TIMEOUT_SECS")]
    pub call_timeout_secs: Option<u64>,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid target role ARN: {0}")]
    InvalidRoleArn(String),

    #[error("Bucket name must not be empty")]
    EmptyBucket,

    #[error("Object key must not be empty")]
    EmptyObjectKey,

    #[error("Port must not be 0")]
    InvalidPort,

    #[error("Invalid role session name: {0}")]
    InvalidSessionName(String),

    #[error("Call timeout must be at least 1 second")]
    InvalidTimeout,
}

impl Config {
    /// Check the parsed options before any AWS client is built
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_role_arn(&self.target_role) {
            return Err(ConfigError::InvalidRoleArn(self.target_role.clone()));
        }
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::EmptyBucket);
        }
        if self.object_key.is_empty() {
            return Err(ConfigError::EmptyObjectKey);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if !is_valid_session_name(&self.session_name) {
            return Err(ConfigError::InvalidSessionName(self.session_name.clone()));
        }
        if self.call_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    pub fn role(&self) -> RoleIdentifier {
        RoleIdentifier::new(&self.target_role)
    }

    pub fn location(&self) -> ObjectLocation {
        ObjectLocation::new(&self.bucket, &self.object_key)
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_secs.map(Duration::from_secs)
    }
}

/// `arn:<partition>:iam::<account>:role/<name>`
fn is_role_arn(arn: &str) -> bool {
    let parts: Vec<&str> = arn.splitn(6, ':').collect();
    match parts.as_slice() {
        ["arn", partition, "iam", "", account, resource] => {
            !partition.is_empty()
                && !account.is_empty()
                && account.chars().all(|c| c.is_ascii_digit())
                && resource.strip_prefix("role/").is_some_and(|name| !name.is_empty())
        }
        _ => false,
    }
}

/// STS accepts 2-64 characters from `[\w+=,.@-]`
fn is_valid_session_name(name: &str) -> bool {
    (2..=64).contains(&name.len())
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_+=,.@-".contains(c))
}
