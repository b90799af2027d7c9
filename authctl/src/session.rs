//! Session lifecycle: activation, login, logout and identity.
//!
//! Nothing here tracks whether the cluster is active. That state lives in the
//! remote service and shows up as the kind of error a call returns;
//! `AuthError::PartiallyActivated` already carries the recovery guidance.

use std::sync::Arc;

use auth_core::{AuthError, AuthResult};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::credential::{expiry_from_ttl, Credential, CredentialStore};
use crate::exchange::{CodeSource, IdentityExchange};
use crate::identity::{ActivationGrant, Subject};
use crate::prompt::Prompter;
use crate::remote::AuthApi;

/// How `login` obtains its proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginMode {
    /// Send the operator through the identity provider.
    ExternalProof,
    /// Exchange a one-time code, given directly or typed in.
    OneTimeCode(CodeSource),
}

/// Result of a successful activation.
#[derive(Debug, Clone)]
pub struct Activation {
    pub credential: Credential,
    /// Set when the initial admin is a robot: its token is the cluster's root
    /// credential and must be shown to the operator.
    pub root_token: Option<String>,
    /// Why the credential could not be saved locally. Only ever set for robot
    /// activations, where the cluster is already active and the root token
    /// above is the only way back in.
    pub store_error: Option<String>,
}

/// Who the current session belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub expires_at: Option<DateTime<Utc>>,
}

pub struct SessionManager {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn CredentialStore>,
    prompter: Arc<dyn Prompter>,
    exchange: IdentityExchange,
}

impl SessionManager {
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: Arc<dyn CredentialStore>,
        prompter: Arc<dyn Prompter>,
        identity_provider_url: impl Into<String>,
    ) -> Self {
        let exchange = IdentityExchange::new(api.clone(), prompter.clone(), identity_provider_url);
        Self {
            api,
            store,
            prompter,
            exchange,
        }
    }

    /// Turn on access control with `initial_admin` (the operator when `None`)
    /// as the first admin. Robot admins skip the identity provider.
    pub async fn activate(&self, initial_admin: Option<Subject>) -> AuthResult<Activation> {
        let grant = match initial_admin {
            Some(Subject::Robot(name)) => ActivationGrant::Robot(name),
            human => ActivationGrant::Human {
                external_token: self.exchange.request_external_proof()?,
                subject: human.map(|s| s.name().to_string()),
            },
        };
        let is_robot = grant.is_robot();

        info!(initial_admin = ?grant.initial_admin(), robot = is_robot, "Activating auth");
        let credential = self.api.activate(grant).await?;

        if !is_robot {
            self.store.write(&credential).await?;
            return Ok(Activation {
                credential,
                root_token: None,
                store_error: None,
            });
        }

        let store_error = match self.store.write(&credential).await {
            Ok(()) => None,
            Err(e) => {
                warn!(error = %e, "Activated, but the root credential could not be saved");
                Some(e.to_string())
            }
        };
        Ok(Activation {
            root_token: Some(credential.token.clone()),
            credential,
            store_error,
        })
    }

    /// Turn off access control after the operator confirms. Declining fails
    /// with `Aborted` without contacting the cluster.
    pub async fn deactivate(&self) -> AuthResult<()> {
        let confirmed = self.prompter.confirm(
            "Are you sure you want to delete ALL auth information (ACLs, tokens, and admins) \
             in this cluster, and expose ALL data? yN",
        )?;
        if !confirmed {
            return Err(AuthError::Aborted);
        }

        warn!("Deactivating auth; all ACLs, tokens and admins will be deleted");
        self.api.deactivate().await
    }

    /// Obtain a credential per `mode` and persist it, replacing any prior one.
    pub async fn login(&self, mode: LoginMode) -> AuthResult<Credential> {
        let credential = match mode {
            LoginMode::ExternalProof => {
                let proof = self.exchange.request_external_proof()?;
                self.exchange.exchange_external_proof(&proof).await?
            }
            LoginMode::OneTimeCode(source) => {
                let code = self.exchange.resolve_one_time_code(source)?;
                self.exchange.exchange_one_time_code(&code).await?
            }
        };

        self.store.write(&credential).await?;
        info!(subject = ?credential.subject, "Logged in");
        Ok(credential)
    }

    /// Forget the stored credential. Succeeds when already logged out.
    pub async fn logout(&self) -> AuthResult<()> {
        self.store.clear().await
    }

    pub async fn whoami(&self) -> AuthResult<Identity> {
        self.whoami_at(Utc::now()).await
    }

    /// As `whoami`, computing the expiry relative to `now`.
    pub async fn whoami_at(&self, now: DateTime<Utc>) -> AuthResult<Identity> {
        let session = self.api.who_am_i().await?;
        Ok(Identity {
            subject: session.username,
            expires_at: expiry_from_ttl(session.ttl_seconds, now),
        })
    }

    /// Store a credential obtained elsewhere, typically from `get-auth-token`.
    /// It is not checked until it is first used.
    pub async fn use_delegated_token(&self, token: Option<String>) -> AuthResult<Credential> {
        let token = match token {
            Some(token) => token,
            None => self.prompter.prompt("Please paste your auth token:")?,
        };
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::Validation("auth token must not be empty".into()));
        }

        let credential = Credential::new(token);
        self.store.write(&credential).await?;
        Ok(credential)
    }
}
