//! Executes parsed `authctl auth` commands and renders their output.

use std::io::Write;

use anyhow::{Context as _, Result};
use auth_core::AuthError;
use chrono::Local;

use super::args::AuthCommand;
use crate::authz::AuthorizationClient;
use crate::exchange::CodeSource;
use crate::identity::Subject;
use crate::scope::Scope;
use crate::session::{LoginMode, SessionManager};

pub const ROOT_TOKEN_WARNING: &str = "WARNING: DO NOT LOSE THE ROBOT TOKEN BELOW WITHOUT ADDING \
OTHER ADMINS.\nIF YOU DO, YOU WILL BE PERMANENTLY LOCKED OUT OF YOUR CLUSTER!";

/// Everything a command needs to run.
pub struct CommandContext {
    pub session: SessionManager,
    pub authz: AuthorizationClient,
}

/// Run `command`, writing user-facing output to `out`.
pub async fn execute<W: Write>(command: AuthCommand, ctx: &CommandContext, out: &mut W) -> Result<()> {
    match command {
        AuthCommand::Activate { initial_admin } => {
            let subject = initial_admin.as_deref().map(Subject::parse).transpose()?;
            let activation = ctx
                .session
                .activate(subject)
                .await
                .map_err(|e| wrap(e, "error activating auth"))?;
            if let Some(token) = &activation.root_token {
                writeln!(out, "{}\nRoot token: {}", ROOT_TOKEN_WARNING, token)?;
            }
            if let Some(reason) = activation.store_error {
                out.flush()?;
                anyhow::bail!(
                    "auth is active, but the root token could not be saved locally ({}); \
                     keep the token printed above and run `authctl auth use-auth-token` to store it",
                    reason
                );
            }
        }
        AuthCommand::Deactivate => {
            ctx.session.deactivate().await?;
        }
        AuthCommand::Login { otp, code } => {
            let mode = match (otp, code) {
                (_, Some(code)) => LoginMode::OneTimeCode(CodeSource::Provided(code)),
                (true, None) => LoginMode::OneTimeCode(CodeSource::Interactive),
                (false, None) => LoginMode::ExternalProof,
            };
            ctx.session
                .login(mode)
                .await
                .map_err(|e| wrap(e, "error authenticating with the cluster"))?;
        }
        AuthCommand::Logout => {
            ctx.session.logout().await?;
        }
        AuthCommand::Whoami => {
            let identity = ctx.session.whoami().await?;
            writeln!(out, "You are \"{}\"", identity.subject)?;
            if let Some(expires_at) = identity.expires_at {
                writeln!(
                    out,
                    "session expires: {}",
                    expires_at.with_timezone(&Local).to_rfc2822()
                )?;
            }
        }
        AuthCommand::Check { scope, repo } => {
            let scope = Scope::parse(&scope)?;
            let authorized = ctx.authz.check(scope, &repo).await?;
            writeln!(out, "{}", authorized)?;
        }
        AuthCommand::Get { first, second } => match second {
            None => {
                let acl = ctx.authz.get_acl(&first).await?;
                for grant in acl {
                    writeln!(out, "{}: {}", grant.username, grant.scope)?;
                }
            }
            Some(repo) => {
                let scope = ctx.authz.get_scope(&first, &repo).await?;
                writeln!(out, "{}", scope)?;
            }
        },
        AuthCommand::Set {
            username,
            scope,
            repo,
        } => {
            let scope = Scope::parse(&scope)?;
            ctx.authz.set_scope(&username, scope, &repo).await?;
        }
        AuthCommand::ListAdmins => {
            for admin in ctx.authz.list_admins().await? {
                writeln!(out, "{}", admin)?;
            }
        }
        AuthCommand::ModifyAdmins { add, remove } => {
            ctx.authz.modify_admins(&add, &remove).await?;
        }
        AuthCommand::GetAuthToken { username, quiet } => {
            let credential = ctx.authz.get_auth_token(&username).await?;
            if quiet {
                writeln!(out, "{}", credential.token)?;
            } else {
                let subject = credential.subject.as_deref().unwrap_or(&username);
                writeln!(
                    out,
                    "New credentials:\n  Subject: {}\n  Token: {}",
                    subject, credential.token
                )?;
            }
        }
        AuthCommand::UseAuthToken => {
            ctx.session
                .use_delegated_token(None)
                .await
                .context("error storing auth token")?;
        }
    }
    Ok(())
}

/// A short suggestion for failures that may succeed if simply run again.
pub fn retry_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<AuthError>())
        .filter(|auth_err| auth_err.is_retryable())
        .map(|_| "the cluster could not be reached; check the endpoint and try again")
}

/// Prefix remote failures with what the command was doing. Partially-activated
/// errors already tell the operator what to run and are passed through as is.
fn wrap(err: AuthError, what: &str) -> anyhow::Error {
    match err {
        AuthError::PartiallyActivated(_) => err.into(),
        err => anyhow::Error::new(err).context(what.to_string()),
    }
}
