//! In-memory stand-in for the cluster's auth service.
//!
//! Keeps ACLs, admins and tokens in process and answers the same way the
//! real service does, including its failure statuses. The caller's token is
//! read from the shared `CredentialStore`, just as the gRPC transport would
//! attach it.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use auth_core::grpc::error::{
    ALREADY_ACTIVATED_MESSAGE, NOT_ACTIVATED_MESSAGE, PARTIALLY_ACTIVATED_MESSAGE,
};
use auth_core::grpc::{classify_status, RpcKind, Status};
use auth_core::{AuthError, AuthResult};
use tokio::sync::Mutex;

use super::{AccessGrant, AuthApi, SessionInfo};
use crate::credential::{Credential, CredentialStore};
use crate::identity::{ActivationGrant, Proof};
use crate::scope::Scope;

#[derive(Debug, Clone)]
struct TokenRecord {
    subject: String,
    ttl_seconds: Option<i64>,
}

#[derive(Default)]
struct MockState {
    active: bool,
    partially_activated: bool,
    session_ttl: Option<i64>,
    admins: BTreeSet<String>,
    tokens: HashMap<String, TokenRecord>,
    acls: HashMap<String, BTreeMap<String, Scope>>,
    external_identities: HashMap<String, String>,
    one_time_codes: HashMap<String, String>,
    calls: HashMap<&'static str, usize>,
    last_activation: Option<ActivationGrant>,
    next_token: u64,
}

impl MockState {
    fn record(&mut self, rpc: &'static str) {
        *self.calls.entry(rpc).or_default() += 1;
    }

    fn mint(&mut self, subject: &str, ttl_seconds: Option<i64>) -> String {
        self.next_token += 1;
        let token = format!("mock-token-{}", self.next_token);
        self.tokens.insert(
            token.clone(),
            TokenRecord {
                subject: subject.to_string(),
                ttl_seconds,
            },
        );
        token
    }

    fn ensure_active(&self) -> Result<(), Status> {
        if self.partially_activated {
            return Err(Status::unavailable(PARTIALLY_ACTIVATED_MESSAGE));
        }
        if !self.active {
            return Err(Status::unavailable(NOT_ACTIVATED_MESSAGE));
        }
        Ok(())
    }

    fn caller(&self, token: Option<&str>) -> Result<TokenRecord, Status> {
        let token = token.ok_or_else(|| Status::unauthenticated("no authentication token found in request"))?;
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| Status::unauthenticated("provided auth token is corrupted or has expired"))
    }

    fn require_admin(&self, caller: &TokenRecord, action: &str) -> Result<(), Status> {
        if self.admins.contains(&caller.subject) {
            Ok(())
        } else {
            Err(Status::permission_denied(format!(
                "{} is not authorized to {}; must be a cluster admin",
                caller.subject, action
            )))
        }
    }

    fn scope_of(&self, username: &str, repo: &str) -> Scope {
        self.acls
            .get(repo)
            .and_then(|acl| acl.get(username))
            .copied()
            .unwrap_or(Scope::None)
    }
}

/// In-memory auth service. Cluster starts inactive.
pub struct MockAuthApi {
    store: Arc<dyn CredentialStore>,
    state: Mutex<MockState>,
}

impl MockAuthApi {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self {
            store,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Make `proof` a valid identity-provider token for `subject`.
    pub async fn register_identity(&self, proof: &str, subject: &str) {
        self.state
            .lock()
            .await
            .external_identities
            .insert(proof.to_string(), subject.to_string());
    }

    /// Issue a single-use code for `subject`.
    pub async fn issue_one_time_code(&self, code: &str, subject: &str) {
        self.state
            .lock()
            .await
            .one_time_codes
            .insert(code.to_string(), subject.to_string());
    }

    /// Put the cluster in (or out of) the half-activated state.
    pub async fn set_partially_activated(&self, partially_activated: bool) {
        self.state.lock().await.partially_activated = partially_activated;
    }

    /// TTL attached to sessions minted by `authenticate`.
    pub async fn set_session_ttl(&self, ttl_seconds: Option<i64>) {
        self.state.lock().await.session_ttl = ttl_seconds;
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.active
    }

    /// Number of times the named RPC (e.g. `"Authenticate"`) was invoked.
    pub async fn calls(&self, rpc: &str) -> usize {
        self.state.lock().await.calls.get(rpc).copied().unwrap_or(0)
    }

    pub async fn last_activation(&self) -> Option<ActivationGrant> {
        self.state.lock().await.last_activation.clone()
    }

    async fn token(&self) -> AuthResult<Option<String>> {
        Ok(self.store.read().await?.map(|c| c.token))
    }
}

fn remote(status: Status) -> AuthError {
    classify_status(&status, RpcKind::Other)
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn authenticate(&self, proof: Proof) -> AuthResult<Credential> {
        let mut state = self.state.lock().await;
        state.record("Authenticate");
        state
            .ensure_active()
            .map_err(|s| classify_status(&s, RpcKind::Authenticate))?;

        let subject = match &proof {
            Proof::ExternalToken(token) => state.external_identities.get(token).cloned(),
            Proof::OneTimeCode(code) => state.one_time_codes.remove(code),
        };
        let subject = subject.ok_or_else(|| {
            classify_status(
                &Status::unauthenticated(format!("{} was rejected", proof.kind())),
                RpcKind::Authenticate,
            )
        })?;

        let ttl = state.session_ttl;
        let token = state.mint(&subject, ttl);
        Ok(Credential::new(token).with_subject(subject).with_ttl(ttl))
    }

    async fn activate(&self, grant: ActivationGrant) -> AuthResult<Credential> {
        let mut state = self.state.lock().await;
        state.record("Activate");
        state.last_activation = Some(grant.clone());

        if state.partially_activated {
            return Err(remote(Status::unavailable(PARTIALLY_ACTIVATED_MESSAGE)));
        }
        if state.active {
            return Err(remote(Status::already_exists(ALREADY_ACTIVATED_MESSAGE)));
        }

        let admin = match &grant {
            ActivationGrant::Robot(name) => name.clone(),
            ActivationGrant::Human {
                external_token,
                subject,
            } => {
                let operator = state
                    .external_identities
                    .get(external_token)
                    .cloned()
                    .ok_or_else(|| remote(Status::invalid_argument("external token was rejected")))?;
                subject.clone().unwrap_or(operator)
            }
        };

        state.active = true;
        state.admins = BTreeSet::from([admin.clone()]);
        let token = state.mint(&admin, None);
        Ok(Credential::new(token).with_subject(admin))
    }

    async fn deactivate(&self) -> AuthResult<()> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("Deactivate");
        if !state.partially_activated {
            state.ensure_active().map_err(remote)?;
            let caller = state.caller(token.as_deref()).map_err(remote)?;
            state.require_admin(&caller, "deactivate auth").map_err(remote)?;
        }

        state.active = false;
        state.partially_activated = false;
        state.admins.clear();
        state.tokens.clear();
        state.acls.clear();
        Ok(())
    }

    async fn authorize(&self, repo: &str, scope: Scope) -> AuthResult<bool> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("Authorize");
        state.ensure_active().map_err(remote)?;
        let caller = state.caller(token.as_deref()).map_err(remote)?;

        if state.admins.contains(&caller.subject) {
            return Ok(true);
        }
        Ok(state.scope_of(&caller.subject, repo).satisfies(scope))
    }

    async fn get_acl(&self, repo: &str) -> AuthResult<Vec<AccessGrant>> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("GetACL");
        state.ensure_active().map_err(remote)?;
        let caller = state.caller(token.as_deref()).map_err(remote)?;

        if !state.admins.contains(&caller.subject)
            && !state.scope_of(&caller.subject, repo).satisfies(Scope::Reader)
        {
            return Err(remote(Status::permission_denied(format!(
                "{} is not authorized to read the ACL of {}",
                caller.subject, repo
            ))));
        }

        Ok(state
            .acls
            .get(repo)
            .map(|acl| {
                acl.iter()
                    .map(|(username, scope)| AccessGrant {
                        username: username.clone(),
                        repo: repo.to_string(),
                        scope: *scope,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_scopes(&self, username: &str, repos: &[String]) -> AuthResult<Vec<Scope>> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("GetScope");
        state.ensure_active().map_err(remote)?;
        state.caller(token.as_deref()).map_err(remote)?;

        Ok(repos
            .iter()
            .map(|repo| state.scope_of(username, repo))
            .collect())
    }

    async fn set_scope(&self, username: &str, scope: Scope, repo: &str) -> AuthResult<()> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("SetScope");
        state.ensure_active().map_err(remote)?;
        let caller = state.caller(token.as_deref()).map_err(remote)?;

        if !state.admins.contains(&caller.subject)
            && !state.scope_of(&caller.subject, repo).satisfies(Scope::Owner)
        {
            return Err(remote(Status::permission_denied(format!(
                "{} is not authorized to modify the ACL of {}",
                caller.subject, repo
            ))));
        }

        let acl = state.acls.entry(repo.to_string()).or_default();
        if scope == Scope::None {
            acl.remove(username);
        } else {
            acl.insert(username.to_string(), scope);
        }
        Ok(())
    }

    async fn get_admins(&self) -> AuthResult<Vec<String>> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("GetAdmins");
        state.ensure_active().map_err(remote)?;
        state.caller(token.as_deref()).map_err(remote)?;
        Ok(state.admins.iter().cloned().collect())
    }

    async fn modify_admins(&self, add: &[String], remove: &[String]) -> AuthResult<()> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("ModifyAdmins");
        state.ensure_active().map_err(remote)?;
        let caller = state.caller(token.as_deref()).map_err(remote)?;
        state.require_admin(&caller, "modify admins").map_err(remote)?;

        for subject in add {
            state.admins.insert(subject.clone());
        }
        for subject in remove {
            state.admins.remove(subject);
        }
        Ok(())
    }

    async fn get_auth_token(&self, subject: &str) -> AuthResult<Credential> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("GetAuthToken");
        state.ensure_active().map_err(remote)?;
        let caller = state.caller(token.as_deref()).map_err(remote)?;
        state.require_admin(&caller, "get a token for another subject").map_err(remote)?;

        let minted = state.mint(subject, None);
        Ok(Credential::new(minted).with_subject(subject))
    }

    async fn who_am_i(&self) -> AuthResult<SessionInfo> {
        let token = self.token().await?;
        let mut state = self.state.lock().await;
        state.record("WhoAmI");
        state.ensure_active().map_err(remote)?;
        let caller = state.caller(token.as_deref()).map_err(remote)?;
        Ok(SessionInfo {
            username: caller.subject,
            ttl_seconds: caller.ttl_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryCredentialStore;

    #[tokio::test]
    async fn test_inactive_cluster_rejects_calls() {
        let api = MockAuthApi::new(Arc::new(MemoryCredentialStore::new()));
        let err = api.get_admins().await.unwrap_err();
        assert!(matches!(err, AuthError::NotActivated(_)));
    }

    #[tokio::test]
    async fn test_one_time_codes_are_single_use() {
        let store = Arc::new(MemoryCredentialStore::new());
        let api = MockAuthApi::new(store);
        api.activate(ActivationGrant::Robot("robot:root".into()))
            .await
            .unwrap();
        api.issue_one_time_code("otp-1", "alice").await;

        let credential = api
            .authenticate(Proof::OneTimeCode("otp-1".into()))
            .await
            .unwrap();
        assert_eq!(credential.subject.as_deref(), Some("alice"));

        let err = api
            .authenticate(Proof::OneTimeCode("otp-1".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidProof(_)));
    }

    #[tokio::test]
    async fn test_second_activation_is_rejected() {
        let api = MockAuthApi::new(Arc::new(MemoryCredentialStore::new()));
        api.activate(ActivationGrant::Robot("robot:root".into()))
            .await
            .unwrap();
        let err = api
            .activate(ActivationGrant::Robot("robot:other".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::AlreadyActivated(_)));
    }
}
