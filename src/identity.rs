//! Identity Resolver
//!
//! Reports which principal the process is running as. Under IRSA this is an
//! assumed-role session created from the pod's projected service account
//! token.

use tracing::info;

use crate::error::BrokerError;
use crate::sts::SecurityTokenService;
use crate::types::IdentityDescriptor;

/// Whether `arn` denotes an assumed-role session.
///
/// Matches the `AssumedRole` marker as well as the `assumed-role/` resource
/// type that STS puts in session ARNs.
pub fn is_assumed_role(arn: &str) -> bool {
    if arn.contains("AssumedRole") {
        return true;
    }

    // arn:partition:service:region:account:resource
    arn.splitn(6, ':')
        .nth(5)
        .is_some_and(|resource| resource.starts_with("assumed-role/"))
}

/// Resolve the ambient caller identity through STS
pub async fn resolve_caller_identity(
    sts: &dyn SecurityTokenService,
) -> Result<IdentityDescriptor, BrokerError> {
    let caller = sts.get_caller_identity().await?;
    let is_irsa = is_assumed_role(&caller.arn);

    info!(account = %caller.account, is_irsa, "Resolved caller identity: {}", caller.arn);

    Ok(IdentityDescriptor {
        account: caller.account,
        arn: caller.arn,
        is_irsa,
    })
}
