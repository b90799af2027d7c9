//! Subjects and the proofs used to authenticate them.

use std::fmt;

use auth_core::{AuthError, AuthResult};

/// Reserved prefix marking a machine identity.
pub const ROBOT_PREFIX: &str = "robot:";

/// A principal, classified once when it enters the system.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// A person who proves their identity through the external identity provider.
    Human(String),
    /// A machine identity; the full name including the `robot:` prefix.
    Robot(String),
}

impl Subject {
    pub fn parse(text: &str) -> AuthResult<Subject> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AuthError::Validation("subject must not be empty".into()));
        }
        match text.strip_prefix(ROBOT_PREFIX) {
            Some("") => Err(AuthError::Validation(format!(
                "robot subject {:?} has no name after the prefix",
                text
            ))),
            Some(_) => Ok(Subject::Robot(text.to_string())),
            None => Ok(Subject::Human(text.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Subject::Human(name) | Subject::Robot(name) => name,
        }
    }

    pub fn is_robot(&self) -> bool {
        matches!(self, Subject::Robot(_))
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Evidence exchanged with the cluster for a session credential.
#[derive(Clone, PartialEq, Eq)]
pub enum Proof {
    /// Opaque token issued by the external identity provider.
    ExternalToken(String),
    /// Short-lived code issued by the cluster itself.
    OneTimeCode(String),
}

impl Proof {
    pub fn kind(&self) -> &'static str {
        match self {
            Proof::ExternalToken(_) => "external_token",
            Proof::OneTimeCode(_) => "one_time_code",
        }
    }
}

impl fmt::Debug for Proof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Proof::{}(<redacted>)", self.kind())
    }
}

/// What the activate call carries: a human's proof, or a robot name.
#[derive(Clone, PartialEq, Eq)]
pub enum ActivationGrant {
    Human {
        external_token: String,
        /// Explicit initial admin; the operator behind the proof when `None`.
        subject: Option<String>,
    },
    Robot(String),
}

impl ActivationGrant {
    /// Subject the remote service is asked to make the first admin.
    pub fn initial_admin(&self) -> Option<&str> {
        match self {
            ActivationGrant::Human { subject, .. } => subject.as_deref(),
            ActivationGrant::Robot(name) => Some(name),
        }
    }

    pub fn is_robot(&self) -> bool {
        matches!(self, ActivationGrant::Robot(_))
    }
}

impl fmt::Debug for ActivationGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationGrant::Human { subject, .. } => f
                .debug_struct("Human")
                .field("external_token", &"<redacted>")
                .field("subject", subject)
                .finish(),
            ActivationGrant::Robot(name) => f.debug_tuple("Robot").field(name).finish(),
        }
    }
}
