//! Access levels and their ordering.
//!
//! Scopes are totally ordered `none < reader < writer < owner`; holding a
//! scope implies every lower one.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use auth_core::grpc::proto::Scope as ScopeProto;
use auth_core::{AuthError, AuthResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    None,
    Reader,
    Writer,
    Owner,
}

impl Scope {
    /// Every scope in ascending order.
    pub const ALL: [Scope; 4] = [Scope::None, Scope::Reader, Scope::Writer, Scope::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::None => "none",
            Scope::Reader => "reader",
            Scope::Writer => "writer",
            Scope::Owner => "owner",
        }
    }

    /// Exact, case-sensitive parse of a scope name.
    pub fn parse(text: &str) -> AuthResult<Scope> {
        match text {
            "none" => Ok(Scope::None),
            "reader" => Ok(Scope::Reader),
            "writer" => Ok(Scope::Writer),
            "owner" => Ok(Scope::Owner),
            other => Err(AuthError::InvalidScope(other.to_string())),
        }
    }

    pub fn compare(a: Scope, b: Scope) -> Ordering {
        a.cmp(&b)
    }

    /// True when `self` grants at least `required`.
    pub fn satisfies(self, required: Scope) -> bool {
        self >= required
    }

    /// Decode a wire value; unknown numbers are a remote protocol error.
    pub fn from_wire(value: i32) -> AuthResult<Scope> {
        ScopeProto::try_from(value)
            .map(Scope::from)
            .map_err(|_| AuthError::Remote(format!("server returned unknown scope value {}", value)))
    }

    pub fn to_wire(self) -> i32 {
        ScopeProto::from(self) as i32
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scope {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Scope::parse(s)
    }
}

impl From<ScopeProto> for Scope {
    fn from(proto: ScopeProto) -> Self {
        match proto {
            ScopeProto::None => Scope::None,
            ScopeProto::Reader => Scope::Reader,
            ScopeProto::Writer => Scope::Writer,
            ScopeProto::Owner => Scope::Owner,
        }
    }
}

impl From<Scope> for ScopeProto {
    fn from(scope: Scope) -> Self {
        match scope {
            Scope::None => ScopeProto::None,
            Scope::Reader => ScopeProto::Reader,
            Scope::Writer => ScopeProto::Writer,
            Scope::Owner => ScopeProto::Owner,
        }
    }
}
