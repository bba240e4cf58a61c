use crate::access::{resolve_access, AccessPolicy};
use crate::cli::config::CliContext;
use crate::cli::utils::output_decision;
use crate::cli::OutputFormat;
use crate::config::config;
use crate::roles::EmailRoleMap;

/// Resolve which dashboard the stored session may see
pub async fn handle(role: Option<String>, output_format: OutputFormat) -> anyhow::Result<()> {
    let ctx = CliContext::connect(config().clone());
    let policy = AccessPolicy::new(&ctx.config.auth, EmailRoleMap::builtin());

    let session = ctx.client.get_session().await;
    let profiles = ctx.profile_source(session.as_ref());
    let decision = resolve_access(session.as_ref(), role.as_deref(), &policy, profiles.as_ref()).await;

    output_decision(&output_format, &decision)
}
