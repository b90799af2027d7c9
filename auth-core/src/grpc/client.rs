//! Auth API gRPC client used by the CLI.

use std::time::Duration;

use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Status};

use super::proto::api_client::ApiClient;
use super::proto::{
    ActivateRequest, ActivateResponse, AuthenticateRequest, AuthenticateResponse,
    AuthorizeRequest, AuthorizeResponse, DeactivateRequest, DeactivateResponse, GetAclRequest,
    GetAclResponse, GetAdminsRequest, GetAdminsResponse, GetAuthTokenRequest,
    GetAuthTokenResponse, GetScopeRequest, GetScopeResponse, ModifyAdminsRequest,
    ModifyAdminsResponse, SetScopeRequest, SetScopeResponse, WhoAmIRequest, WhoAmIResponse,
};
use crate::config::ClientConfig;
use crate::error::AuthError;

/// Configuration for the auth API client.
#[derive(Clone, Debug)]
pub struct AuthClientConfig {
    /// The gRPC endpoint of the cluster (e.g., "http://cluster:30650").
    pub endpoint: String,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Request timeout.
    pub request_timeout: Duration,
}

impl Default for AuthClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:30650".to_string(),
            connect_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&ClientConfig> for AuthClientConfig {
    fn from(config: &ClientConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        }
    }
}

/// Client for `auth.v1.API`. Cheap to clone; clones share the channel.
#[derive(Clone)]
pub struct AuthClient {
    api_client: ApiClient<Channel>,
}

impl AuthClient {
    /// Create a client that connects on first use, so purely local commands
    /// never need a reachable cluster. Connection failures surface from the
    /// individual call as `UNAVAILABLE`.
    pub fn new(config: AuthClientConfig) -> Result<Self, AuthError> {
        let channel = Endpoint::from_shared(config.endpoint.clone())
            .map_err(|e| {
                AuthError::Validation(format!("invalid endpoint {:?}: {}", config.endpoint, e))
            })?
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .connect_lazy();

        Ok(Self {
            api_client: ApiClient::new(channel),
        })
    }

    // =========================================================================
    // Activation and sessions
    // =========================================================================

    pub async fn activate(
        &mut self,
        request: Request<ActivateRequest>,
    ) -> Result<ActivateResponse, Status> {
        Ok(self.api_client.activate(request).await?.into_inner())
    }

    pub async fn deactivate(
        &mut self,
        request: Request<DeactivateRequest>,
    ) -> Result<DeactivateResponse, Status> {
        Ok(self.api_client.deactivate(request).await?.into_inner())
    }

    pub async fn authenticate(
        &mut self,
        request: Request<AuthenticateRequest>,
    ) -> Result<AuthenticateResponse, Status> {
        Ok(self.api_client.authenticate(request).await?.into_inner())
    }

    pub async fn who_am_i(
        &mut self,
        request: Request<WhoAmIRequest>,
    ) -> Result<WhoAmIResponse, Status> {
        Ok(self.api_client.who_am_i(request).await?.into_inner())
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    pub async fn authorize(
        &mut self,
        request: Request<AuthorizeRequest>,
    ) -> Result<AuthorizeResponse, Status> {
        Ok(self.api_client.authorize(request).await?.into_inner())
    }

    pub async fn get_acl(
        &mut self,
        request: Request<GetAclRequest>,
    ) -> Result<GetAclResponse, Status> {
        Ok(self.api_client.get_acl(request).await?.into_inner())
    }

    pub async fn get_scope(
        &mut self,
        request: Request<GetScopeRequest>,
    ) -> Result<GetScopeResponse, Status> {
        Ok(self.api_client.get_scope(request).await?.into_inner())
    }

    pub async fn set_scope(
        &mut self,
        request: Request<SetScopeRequest>,
    ) -> Result<SetScopeResponse, Status> {
        Ok(self.api_client.set_scope(request).await?.into_inner())
    }

    // =========================================================================
    // Admins and delegated tokens
    // =========================================================================

    pub async fn get_admins(
        &mut self,
        request: Request<GetAdminsRequest>,
    ) -> Result<GetAdminsResponse, Status> {
        Ok(self.api_client.get_admins(request).await?.into_inner())
    }

    pub async fn modify_admins(
        &mut self,
        request: Request<ModifyAdminsRequest>,
    ) -> Result<ModifyAdminsResponse, Status> {
        Ok(self.api_client.modify_admins(request).await?.into_inner())
    }

    pub async fn get_auth_token(
        &mut self,
        request: Request<GetAuthTokenRequest>,
    ) -> Result<GetAuthTokenResponse, Status> {
        Ok(self.api_client.get_auth_token(request).await?.into_inner())
    }
}
