//! ARN helpers for IAM principals, roles and policies.

use cfgen_core::intrinsic;
use cfgen_core::{CoreResult, PropertyValue, Reference, RoleLiteralReference, UserLiteralReference};

/// Role names starting with this prefix are qualified with the deployment
/// region, e.g. `$REGION_lambda` becomes `<Region>_lambda`.
pub const REGION_PREFIX: &str = "$REGION";

/// ARN of an existing IAM role.
pub fn role_uri(role: &str) -> CoreResult<PropertyValue> {
    let reference = match role.strip_prefix(REGION_PREFIX) {
        Some(rest) => RoleLiteralReference::new(rest)?,
        None => RoleLiteralReference::without_region(role)?,
    };
    Ok(reference.resolve())
}

/// ARN of an IAM principal in the current account, e.g. `user/bob` or `root`.
pub fn user_uri(username: &str) -> CoreResult<PropertyValue> {
    Ok(UserLiteralReference::new(username)?.resolve())
}

/// ARN of an AWS managed policy.
pub fn aws_policy_uri(policy_name: &str) -> String {
    format!("arn:aws:iam::aws:policy/{}", policy_name)
}

/// ARN of a customer managed policy in the current account.
pub fn user_policy_uri(policy_name: &str) -> PropertyValue {
    intrinsic::join(
        "",
        vec![
            "arn:aws:iam::".into(),
            intrinsic::account_id(),
            ":policy/".into(),
            policy_name.into(),
        ],
    )
}

/// `arn:aws:<service>:<Region>:<AccountId>:<suffix>`
pub fn resource_arn(service: &str, suffix: &str) -> PropertyValue {
    intrinsic::join(
        "",
        vec![
            format!("arn:aws:{}:", service).into(),
            intrinsic::region(),
            ":".into(),
            intrinsic::account_id(),
            ":".into(),
            suffix.into(),
        ],
    )
}
