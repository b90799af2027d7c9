//! `GrpcAuthApi` against an in-process tonic server: token attachment,
//! status classification and response validation over a real channel.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use auth_core::config::ClientConfig;
use auth_core::grpc::error::PARTIALLY_ACTIVATED_MESSAGE;
use auth_core::grpc::proto::api_server::{Api, ApiServer};
use auth_core::grpc::proto::{
    authenticate_request, AclEntry, ActivateRequest, ActivateResponse, AuthenticateRequest,
    AuthenticateResponse, AuthorizeRequest, AuthorizeResponse, DeactivateRequest,
    DeactivateResponse, GetAclRequest, GetAclResponse, GetAdminsRequest, GetAdminsResponse,
    GetAuthTokenRequest, GetAuthTokenResponse, GetScopeRequest, GetScopeResponse,
    ModifyAdminsRequest, ModifyAdminsResponse, Scope as WireScope, SetScopeRequest,
    SetScopeResponse, WhoAmIRequest, WhoAmIResponse,
};
use auth_core::grpc::{Request, Response, Status, AUTH_TOKEN_KEY};
use auth_core::tonic::transport::Server;
use authctl::{
    AccessGrant, AuthApi, AuthError, Credential, CredentialStore, GrpcAuthApi,
    MemoryCredentialStore, Proof, Scope,
};
use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;

/// Session token seen by the server, per RPC, in arrival order.
type Seen = Arc<Mutex<Vec<(&'static str, Option<String>)>>>;

struct FakeCluster {
    seen: Seen,
}

impl FakeCluster {
    fn record<T>(&self, rpc: &'static str, request: &Request<T>) -> Option<String> {
        let token = request
            .metadata()
            .get(AUTH_TOKEN_KEY)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.seen.lock().unwrap().push((rpc, token.clone()));
        token
    }
}

#[async_trait]
impl Api for FakeCluster {
    async fn activate(
        &self,
        request: Request<ActivateRequest>,
    ) -> Result<Response<ActivateResponse>, Status> {
        self.record("Activate", &request);
        Err(Status::unimplemented("activate"))
    }

    async fn deactivate(
        &self,
        request: Request<DeactivateRequest>,
    ) -> Result<Response<DeactivateResponse>, Status> {
        self.record("Deactivate", &request);
        Err(Status::unimplemented("deactivate"))
    }

    async fn authenticate(
        &self,
        request: Request<AuthenticateRequest>,
    ) -> Result<Response<AuthenticateResponse>, Status> {
        self.record("Authenticate", &request);
        match request.into_inner().proof {
            Some(authenticate_request::Proof::OneTimeCode(code)) if code == "good-code" => {
                Ok(Response::new(AuthenticateResponse {
                    token: "session-token".into(),
                    subject: "alice".into(),
                    ttl_seconds: Some(60),
                }))
            }
            _ => Err(Status::unauthenticated("proof was rejected")),
        }
    }

    async fn who_am_i(
        &self,
        request: Request<WhoAmIRequest>,
    ) -> Result<Response<WhoAmIResponse>, Status> {
        let token = self
            .record("WhoAmI", &request)
            .ok_or_else(|| Status::unauthenticated("no authentication token found in request"))?;
        Ok(Response::new(WhoAmIResponse {
            username: format!("holder-of-{}", token),
            ttl_seconds: None,
        }))
    }

    async fn authorize(
        &self,
        request: Request<AuthorizeRequest>,
    ) -> Result<Response<AuthorizeResponse>, Status> {
        self.record("Authorize", &request);
        Err(Status::unimplemented("authorize"))
    }

    async fn get_acl(
        &self,
        request: Request<GetAclRequest>,
    ) -> Result<Response<GetAclResponse>, Status> {
        self.record("GetACL", &request);
        Ok(Response::new(GetAclResponse {
            entries: vec![
                AclEntry {
                    username: "alice".into(),
                    scope: WireScope::Writer as i32,
                },
                AclEntry {
                    username: "bob".into(),
                    scope: WireScope::Owner as i32,
                },
            ],
        }))
    }

    async fn get_scope(
        &self,
        request: Request<GetScopeRequest>,
    ) -> Result<Response<GetScopeResponse>, Status> {
        self.record("GetScope", &request);
        let request = request.into_inner();
        // "truncated" gets one scope fewer than it asked for.
        let count = if request.username == "truncated" {
            request.repos.len().saturating_sub(1)
        } else {
            request.repos.len()
        };
        Ok(Response::new(GetScopeResponse {
            scopes: vec![WireScope::Reader as i32; count],
        }))
    }

    async fn set_scope(
        &self,
        request: Request<SetScopeRequest>,
    ) -> Result<Response<SetScopeResponse>, Status> {
        self.record("SetScope", &request);
        Err(Status::unimplemented("set scope"))
    }

    async fn get_admins(
        &self,
        request: Request<GetAdminsRequest>,
    ) -> Result<Response<GetAdminsResponse>, Status> {
        self.record("GetAdmins", &request);
        Err(Status::unimplemented("get admins"))
    }

    async fn modify_admins(
        &self,
        request: Request<ModifyAdminsRequest>,
    ) -> Result<Response<ModifyAdminsResponse>, Status> {
        self.record("ModifyAdmins", &request);
        Err(Status::unavailable(PARTIALLY_ACTIVATED_MESSAGE))
    }

    async fn get_auth_token(
        &self,
        request: Request<GetAuthTokenRequest>,
    ) -> Result<Response<GetAuthTokenResponse>, Status> {
        self.record("GetAuthToken", &request);
        Err(Status::unimplemented("get auth token"))
    }
}

struct Harness {
    api: GrpcAuthApi,
    store: Arc<MemoryCredentialStore>,
    seen: Seen,
}

impl Harness {
    fn last_token(&self, rpc: &str) -> Option<String> {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(name, _)| *name == rpc)
            .and_then(|(_, token)| token.clone())
    }
}

async fn start_cluster() -> Harness {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let seen: Seen = Arc::default();
    let cluster = FakeCluster { seen: seen.clone() };

    tokio::spawn(async move {
        Server::builder()
            .add_service(ApiServer::new(cluster))
            .serve_with_incoming(TcpListenerStream::new(listener))
            .await
            .unwrap();
    });

    let store = Arc::new(MemoryCredentialStore::new());
    let config = ClientConfig {
        endpoint: format!("http://{}", addr),
        ..Default::default()
    };
    let api = GrpcAuthApi::from_config(&config, store.clone()).unwrap();
    Harness { api, store, seen }
}

#[tokio::test]
async fn stored_credential_is_attached_per_call() {
    let harness = start_cluster().await;

    harness.store.write(&Credential::new("tok-1")).await.unwrap();
    let session = harness.api.who_am_i().await.unwrap();
    assert_eq!(session.username, "holder-of-tok-1");
    assert_eq!(session.ttl_seconds, None);
    assert_eq!(harness.last_token("WhoAmI").as_deref(), Some("tok-1"));

    harness.store.write(&Credential::new("tok-2")).await.unwrap();
    assert_eq!(harness.api.who_am_i().await.unwrap().username, "holder-of-tok-2");

    harness.store.clear().await.unwrap();
    let err = harness.api.who_am_i().await.unwrap_err();
    assert!(matches!(err, AuthError::NotAuthenticated(_)), "got {:?}", err);
    assert_eq!(harness.last_token("WhoAmI"), None);
}

#[tokio::test]
async fn authenticate_omits_stored_token_and_rejects_bad_proof() {
    let harness = start_cluster().await;
    harness.store.write(&Credential::new("stale")).await.unwrap();

    let credential = harness
        .api
        .authenticate(Proof::OneTimeCode("good-code".into()))
        .await
        .unwrap();
    assert_eq!(credential.token, "session-token");
    assert_eq!(credential.subject.as_deref(), Some("alice"));
    assert_eq!(credential.ttl_seconds, Some(60));
    assert_eq!(harness.last_token("Authenticate"), None);

    let err = harness
        .api
        .authenticate(Proof::OneTimeCode("wrong".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidProof(_)), "got {:?}", err);
}

#[tokio::test]
async fn partially_activated_status_carries_guidance() {
    let harness = start_cluster().await;
    harness.store.write(&Credential::new("admin")).await.unwrap();

    let err = harness
        .api
        .modify_admins(&["alice".into()], &[])
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::PartiallyActivated(_)), "got {:?}", err);
    assert!(err.to_string().contains("authctl auth deactivate"));
    assert_eq!(harness.last_token("ModifyAdmins").as_deref(), Some("admin"));
}

#[tokio::test]
async fn scope_count_must_match_requested_repos() {
    let harness = start_cluster().await;
    let repos = vec!["images".to_string(), "models".to_string()];

    let scopes = harness.api.get_scopes("alice", &repos).await.unwrap();
    assert_eq!(scopes, vec![Scope::Reader, Scope::Reader]);

    let err = harness.api.get_scopes("truncated", &repos).await.unwrap_err();
    assert!(matches!(err, AuthError::Remote(_)), "got {:?}", err);
}

#[tokio::test]
async fn acl_entries_are_decoded_for_the_repo() {
    let harness = start_cluster().await;

    let acl = harness.api.get_acl("images").await.unwrap();
    assert_eq!(
        acl,
        vec![
            AccessGrant {
                username: "alice".into(),
                repo: "images".into(),
                scope: Scope::Writer,
            },
            AccessGrant {
                username: "bob".into(),
                repo: "images".into(),
                scope: Scope::Owner,
            },
        ]
    );
}
