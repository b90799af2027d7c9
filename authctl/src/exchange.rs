//! Turning external proofs and one-time codes into cluster credentials.

use std::sync::Arc;

use auth_core::{AuthError, AuthResult};
use tracing::info;

use crate::credential::Credential;
use crate::identity::Proof;
use crate::prompt::Prompter;
use crate::remote::AuthApi;

/// Where a one-time code comes from. Both sources are permanent options.
#[derive(Clone, PartialEq, Eq)]
pub enum CodeSource {
    /// Supplied directly, e.g. on the command line.
    Provided(String),
    /// Read from the operator.
    Interactive,
}

impl std::fmt::Debug for CodeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeSource::Provided(_) => f.write_str("Provided(<redacted>)"),
            CodeSource::Interactive => f.write_str("Interactive"),
        }
    }
}

pub struct IdentityExchange {
    api: Arc<dyn AuthApi>,
    prompter: Arc<dyn Prompter>,
    provider_url: String,
}

impl IdentityExchange {
    pub fn new(api: Arc<dyn AuthApi>, prompter: Arc<dyn Prompter>, provider_url: impl Into<String>) -> Self {
        Self {
            api,
            prompter,
            provider_url: provider_url.into(),
        }
    }

    /// Send the operator to the identity provider and read back the token it
    /// displays.
    pub fn request_external_proof(&self) -> AuthResult<String> {
        let message = format!(
            "(1) Please paste this link into a browser:\n\n{}\n\n\
             (You will be asked to authorize this cluster's login app. If you accept, \
             you will be given a token to paste here, which will give you an externally \
             verified account in this cluster)\n\n\
             (2) Please paste the token you receive here:",
            self.provider_url
        );
        let token = self.prompter.prompt(&message)?;
        non_empty(token, "identity provider token")
    }

    pub fn resolve_one_time_code(&self, source: CodeSource) -> AuthResult<String> {
        let code = match source {
            CodeSource::Provided(code) => code.trim().to_string(),
            CodeSource::Interactive => self
                .prompter
                .prompt("Please enter your One-Time Password:")?,
        };
        non_empty(code, "one-time password")
    }

    pub async fn exchange_external_proof(&self, proof: &str) -> AuthResult<Credential> {
        self.exchange(Proof::ExternalToken(non_empty(proof.to_string(), "identity provider token")?))
            .await
    }

    pub async fn exchange_one_time_code(&self, code: &str) -> AuthResult<Credential> {
        self.exchange(Proof::OneTimeCode(non_empty(code.to_string(), "one-time password")?))
            .await
    }

    async fn exchange(&self, proof: Proof) -> AuthResult<Credential> {
        info!(proof = proof.kind(), "Retrieving cluster token");
        let credential = self.api.authenticate(proof).await?;
        if credential.token.is_empty() {
            return Err(AuthError::Remote("server returned an empty token".into()));
        }
        Ok(credential)
    }
}

fn non_empty(value: String, what: &str) -> AuthResult<String> {
    let value = value.trim().to_string();
    if value.is_empty() {
        Err(AuthError::Validation(format!("{} must not be empty", what)))
    } else {
        Ok(value)
    }
}
