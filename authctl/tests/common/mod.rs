//! Common test utilities for authctl integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use authctl::{
    AuthorizationClient, CodeSource, Credential, FileCredentialStore, LoginMode, MockAuthApi,
    ScriptedPrompter, SessionManager, Subject,
};
use tempfile::TempDir;

pub const IDENTITY_PROVIDER_URL: &str = "https://idp.example/authorize";

/// A client wired to an in-memory cluster, with its credential file in a
/// private temp directory.
pub struct TestContext {
    pub dir: TempDir,
    pub store: Arc<FileCredentialStore>,
    pub api: Arc<MockAuthApi>,
    pub prompter: Arc<ScriptedPrompter>,
    pub session: SessionManager,
    pub authz: AuthorizationClient,
}

/// Create a context whose prompter answers with `answers`, in order.
pub fn setup(answers: &[&str]) -> TestContext {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = Arc::new(FileCredentialStore::new(dir.path().join("session.json")));
    let api = Arc::new(MockAuthApi::new(store.clone()));
    let prompter = Arc::new(ScriptedPrompter::new(answers.iter().copied()));
    let session = SessionManager::new(
        api.clone(),
        store.clone(),
        prompter.clone(),
        IDENTITY_PROVIDER_URL,
    );
    let authz = AuthorizationClient::new(api.clone());

    TestContext {
        dir,
        store,
        api,
        prompter,
        session,
        authz,
    }
}

impl TestContext {
    /// Activate with a robot admin; the session is then that robot.
    pub async fn activate_as_robot(&self, name: &str) -> Credential {
        let subject = Subject::parse(name).expect("valid robot subject");
        self.session
            .activate(Some(subject))
            .await
            .expect("Failed to activate")
            .credential
    }

    /// Replace the stored session with one for `subject`, via a one-time code.
    pub async fn login_as(&self, subject: &str) -> Credential {
        let code = format!("otp-for-{}", subject);
        self.api.issue_one_time_code(&code, subject).await;
        self.session
            .login(LoginMode::OneTimeCode(CodeSource::Provided(code)))
            .await
            .expect("Failed to log in")
    }
}
