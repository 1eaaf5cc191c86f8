//! Generators compiled into the `cfgen` binary.
//!
//! A unit selects one with `generator: <name>`. Service roles derive their
//! key and role name from the directory holding the unit, so one unit per
//! service directory yields one role per service.

use cfgen_build::{BuildResult, DirContext, TemplateRegistry};
use cfgen_core::{AsTemplate, CoreResult, DataBag, Emitted};
use cfgen_iam::{PolicyDocument, PolicyStatement, RoleTemplate};

/// Registry holding every built-in generator.
pub fn builtin_registry() -> BuildResult<TemplateRegistry> {
    let mut registry = TemplateRegistry::new();
    registry
        .register(
            "lambda-role",
            service_role("lambda.amazonaws.com", "service-role/AWSLambdaBasicExecutionRole"),
        )?
        .register(
            "ecs-task-role",
            service_role(
                "ecs-tasks.amazonaws.com",
                "service-role/AmazonECSTaskExecutionRolePolicy",
            ),
        )?;
    Ok(registry)
}

fn service_role(
    service: &'static str,
    managed_policy: &'static str,
) -> impl Fn(&DirContext, &DataBag) -> CoreResult<Emitted> + Send + Sync {
    move |context: &DirContext, data: &DataBag| {
        let base = context
            .rel_path()
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "service".to_string());
        let role_name = match data.get("app") {
            Some(app) => format!("{}-{}", app, base),
            None => base.clone(),
        };

        let mut trust = PolicyStatement::new();
        trust.add_service_principal(service)?.add_action("sts:AssumeRole")?;
        let mut assume = PolicyDocument::new();
        assume.add_statement(trust);

        let mut role = RoleTemplate::new(&format!("{}-role", base), &role_name)?;
        role.set_assume_policy(assume)?
            .add_aws_managed_policy(managed_policy)?;
        Ok(role.into_template().into())
    }
}
