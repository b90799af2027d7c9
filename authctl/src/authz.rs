//! Scope checks, ACL management and cluster admins.

use std::collections::BTreeSet;
use std::sync::Arc;

use auth_core::{AuthError, AuthResult};
use tracing::info;

use crate::credential::Credential;
use crate::remote::{AccessGrant, AuthApi};
use crate::scope::Scope;

pub struct AuthorizationClient {
    api: Arc<dyn AuthApi>,
}

impl AuthorizationClient {
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self { api }
    }

    /// Whether the caller holds at least `scope` on `repo`.
    pub async fn check(&self, scope: Scope, repo: &str) -> AuthResult<bool> {
        require("repo", repo)?;
        self.api.authorize(repo, scope).await
    }

    /// The full access list of `repo`, in server order.
    pub async fn get_acl(&self, repo: &str) -> AuthResult<Vec<AccessGrant>> {
        require("repo", repo)?;
        self.api.get_acl(repo).await
    }

    /// Scope `username` holds on `repo`; `Scope::None` if never granted.
    pub async fn get_scope(&self, username: &str, repo: &str) -> AuthResult<Scope> {
        require("username", username)?;
        require("repo", repo)?;
        let scopes = self.api.get_scopes(username, &[repo.to_string()]).await?;
        scopes
            .into_iter()
            .next()
            .ok_or_else(|| AuthError::Remote("server returned no scope".into()))
    }

    /// Set `username`'s scope on `repo` to exactly `scope`; `Scope::None` revokes.
    pub async fn set_scope(&self, username: &str, scope: Scope, repo: &str) -> AuthResult<()> {
        require("username", username)?;
        require("repo", repo)?;
        self.api.set_scope(username, scope, repo).await?;
        info!(username, %scope, repo, "Scope set");
        Ok(())
    }

    pub async fn list_admins(&self) -> AuthResult<BTreeSet<String>> {
        Ok(self.api.get_admins().await?.into_iter().collect())
    }

    /// Grant and revoke admin status in one call. Deltas must be disjoint and
    /// not both empty.
    pub async fn modify_admins(&self, add: &[String], remove: &[String]) -> AuthResult<()> {
        let add = normalize(add)?;
        let remove = normalize(remove)?;
        if add.is_empty() && remove.is_empty() {
            return Err(AuthError::Validation(
                "nothing to modify: pass at least one admin to add or remove".into(),
            ));
        }
        if let Some(both) = add.iter().find(|s| remove.contains(*s)) {
            return Err(AuthError::Validation(format!(
                "{:?} cannot be both added and removed",
                both
            )));
        }

        self.api.modify_admins(&add, &remove).await?;
        info!(added = ?add, removed = ?remove, "Admins modified");
        Ok(())
    }

    /// Mint a credential for `subject` (admin only). This is not the caller's
    /// session and is never stored here.
    pub async fn get_auth_token(&self, subject: &str) -> AuthResult<Credential> {
        require("subject", subject)?;
        self.api.get_auth_token(subject).await
    }
}

fn require(what: &str, value: &str) -> AuthResult<()> {
    if value.trim().is_empty() {
        Err(AuthError::Validation(format!("{} must not be empty", what)))
    } else {
        Ok(())
    }
}

fn normalize(subjects: &[String]) -> AuthResult<Vec<String>> {
    let mut seen = BTreeSet::new();
    let mut out = Vec::with_capacity(subjects.len());
    for subject in subjects {
        let subject = subject.trim();
        require("admin subject", subject)?;
        if seen.insert(subject.to_string()) {
            out.push(subject.to_string());
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::MemoryCredentialStore;
    use crate::remote::MockAuthApi;

    fn client() -> (AuthorizationClient, Arc<MockAuthApi>) {
        let api = Arc::new(MockAuthApi::new(Arc::new(MemoryCredentialStore::new())));
        (AuthorizationClient::new(api.clone()), api)
    }

    #[tokio::test]
    async fn test_overlapping_deltas_rejected_locally() {
        let (client, api) = client();
        let err = client
            .modify_admins(&["alice".into()], &["alice".into()])
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(api.calls("ModifyAdmins").await, 0);
    }

    #[tokio::test]
    async fn test_empty_deltas_rejected_locally() {
        let (client, api) = client();
        let err = client.modify_admins(&[], &[]).await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(api.calls("ModifyAdmins").await, 0);
    }

    #[tokio::test]
    async fn test_empty_repo_rejected_locally() {
        let (client, api) = client();
        let err = client.check(Scope::Reader, " ").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(api.calls("Authorize").await, 0);
    }

    #[test]
    fn test_normalize_dedupes_and_trims() {
        let out = normalize(&[" a".into(), "b".into(), "a".into()]).unwrap();
        assert_eq!(out, vec!["a".to_string(), "b".to_string()]);
        assert!(normalize(&["".into()]).is_err());
    }
}
