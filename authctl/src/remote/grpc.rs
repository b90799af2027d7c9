//! `AuthApi` over gRPC.

use std::sync::Arc;

use async_trait::async_trait;
use auth_core::config::ClientConfig;
use auth_core::grpc::proto::{
    authenticate_request, ActivateRequest, AuthenticateRequest, AuthorizeRequest,
    DeactivateRequest, GetAclRequest, GetAdminsRequest, GetAuthTokenRequest, GetScopeRequest,
    ModifyAdminsRequest, SetScopeRequest, WhoAmIRequest,
};
use auth_core::grpc::{classify_status, outgoing, AuthClient, AuthClientConfig, Request, RpcKind};
use auth_core::{AuthError, AuthResult};
use tracing::debug;

use super::{AccessGrant, AuthApi, SessionInfo};
use crate::credential::{Credential, CredentialStore};
use crate::identity::{ActivationGrant, Proof};
use crate::scope::Scope;

/// Talks to the cluster, attaching whatever credential is stored at the
/// moment of each call.
pub struct GrpcAuthApi {
    client: AuthClient,
    store: Arc<dyn CredentialStore>,
}

impl GrpcAuthApi {
    pub fn new(client: AuthClient, store: Arc<dyn CredentialStore>) -> Self {
        Self { client, store }
    }

    /// Build a client from configuration. The connection is made on first use
    /// so purely local commands work without a reachable cluster.
    pub fn from_config(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> AuthResult<Self> {
        let client = AuthClient::new(AuthClientConfig::from(config))?;
        Ok(Self::new(client, store))
    }

    async fn request<T>(&self, rpc: &'static str, message: T) -> AuthResult<Request<T>> {
        let credential = self.store.read().await?;
        let token = credential.as_ref().map(|c| c.token.as_str());
        let (request, request_id) = outgoing(message, token)?;
        debug!(
            rpc,
            request_id = %request_id,
            authenticated = token.is_some(),
            "Calling auth API"
        );
        Ok(request)
    }
}

fn subject_or_none(subject: String) -> Option<String> {
    if subject.is_empty() {
        None
    } else {
        Some(subject)
    }
}

#[async_trait]
impl AuthApi for GrpcAuthApi {
    async fn authenticate(&self, proof: Proof) -> AuthResult<Credential> {
        let proof = match proof {
            Proof::ExternalToken(token) => authenticate_request::Proof::ExternalToken(token),
            Proof::OneTimeCode(code) => authenticate_request::Proof::OneTimeCode(code),
        };
        // Authenticate must not carry a stale session token.
        let (request, _) = outgoing(AuthenticateRequest { proof: Some(proof) }, None)?;
        debug!(rpc = "Authenticate", "Calling auth API");

        let response = self
            .client
            .clone()
            .authenticate(request)
            .await
            .map_err(|status| classify_status(&status, RpcKind::Authenticate))?;

        let mut credential = Credential::new(response.token).with_ttl(response.ttl_seconds);
        credential.subject = subject_or_none(response.subject);
        Ok(credential)
    }

    async fn activate(&self, grant: ActivationGrant) -> AuthResult<Credential> {
        let message = match &grant {
            ActivationGrant::Human {
                external_token,
                subject,
            } => ActivateRequest {
                external_token: Some(external_token.clone()),
                subject: subject.clone().unwrap_or_default(),
            },
            ActivationGrant::Robot(name) => ActivateRequest {
                external_token: None,
                subject: name.clone(),
            },
        };
        let request = self.request("Activate", message).await?;
        let response = self.client.clone().activate(request).await?;

        let mut credential = Credential::new(response.token);
        credential.subject = grant.initial_admin().map(str::to_string);
        Ok(credential)
    }

    async fn deactivate(&self) -> AuthResult<()> {
        let request = self.request("Deactivate", DeactivateRequest {}).await?;
        self.client.clone().deactivate(request).await?;
        Ok(())
    }

    async fn authorize(&self, repo: &str, scope: Scope) -> AuthResult<bool> {
        let request = self
            .request(
                "Authorize",
                AuthorizeRequest {
                    repo: repo.to_string(),
                    scope: scope.to_wire(),
                },
            )
            .await?;
        let response = self.client.clone().authorize(request).await?;
        Ok(response.authorized)
    }

    async fn get_acl(&self, repo: &str) -> AuthResult<Vec<AccessGrant>> {
        let request = self
            .request(
                "GetACL",
                GetAclRequest {
                    repo: repo.to_string(),
                },
            )
            .await?;
        let response = self.client.clone().get_acl(request).await?;

        response
            .entries
            .into_iter()
            .map(|entry| -> AuthResult<AccessGrant> {
                Ok(AccessGrant {
                    username: entry.username,
                    repo: repo.to_string(),
                    scope: Scope::from_wire(entry.scope)?,
                })
            })
            .collect()
    }

    async fn get_scopes(&self, username: &str, repos: &[String]) -> AuthResult<Vec<Scope>> {
        let request = self
            .request(
                "GetScope",
                GetScopeRequest {
                    repos: repos.to_vec(),
                    username: username.to_string(),
                },
            )
            .await?;
        let response = self.client.clone().get_scope(request).await?;

        if response.scopes.len() != repos.len() {
            return Err(AuthError::Remote(format!(
                "expected {} scopes in response, got {}",
                repos.len(),
                response.scopes.len()
            )));
        }
        response.scopes.into_iter().map(Scope::from_wire).collect()
    }

    async fn set_scope(&self, username: &str, scope: Scope, repo: &str) -> AuthResult<()> {
        let request = self
            .request(
                "SetScope",
                SetScopeRequest {
                    repo: repo.to_string(),
                    scope: scope.to_wire(),
                    username: username.to_string(),
                },
            )
            .await?;
        self.client.clone().set_scope(request).await?;
        Ok(())
    }

    async fn get_admins(&self) -> AuthResult<Vec<String>> {
        let request = self.request("GetAdmins", GetAdminsRequest {}).await?;
        let response = self.client.clone().get_admins(request).await?;
        Ok(response.admins)
    }

    async fn modify_admins(&self, add: &[String], remove: &[String]) -> AuthResult<()> {
        let request = self
            .request(
                "ModifyAdmins",
                ModifyAdminsRequest {
                    add: add.to_vec(),
                    remove: remove.to_vec(),
                },
            )
            .await?;
        self.client.clone().modify_admins(request).await?;
        Ok(())
    }

    async fn get_auth_token(&self, subject: &str) -> AuthResult<Credential> {
        let request = self
            .request(
                "GetAuthToken",
                GetAuthTokenRequest {
                    subject: subject.to_string(),
                },
            )
            .await?;
        let response = self
            .client
            .clone()
            .get_auth_token(request)
            .await?;

        let mut credential = Credential::new(response.token);
        credential.subject = subject_or_none(response.subject).or_else(|| Some(subject.to_string()));
        Ok(credential)
    }

    async fn who_am_i(&self) -> AuthResult<SessionInfo> {
        let request = self.request("WhoAmI", WhoAmIRequest {}).await?;
        let response = self.client.clone().who_am_i(request).await?;
        Ok(SessionInfo {
            username: response.username,
            ttl_seconds: response.ttl_seconds,
        })
    }
}
