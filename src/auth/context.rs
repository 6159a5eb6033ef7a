use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::config::Config;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Professor,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Student => write!(f, "student"),
            UserRole::Professor => write!(f, "professor"),
        }
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" | "etudiant" => Ok(UserRole::Student),
            "professor" | "professeur" => Ok(UserRole::Professor),
            other => Err(format!("unknown role '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
struct Identity {
    user_id: String,
    role: UserRole,
    token: Option<SecretString>,
}

/// Identity handed down from the external identity provider.
///
/// Services receive this explicitly instead of reading ambient globals. It is
/// created once the provider resolves a session and torn down on sign-out.
/// Clones share one identity, so a sign-out is seen by every holder,
/// including the HTTP client that attaches the bearer token.
#[derive(Clone, Debug, Default)]
pub struct AuthContext {
    identity: Arc<RwLock<Option<Identity>>>,
}

impl AuthContext {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn signed_in(user_id: &str, role: UserRole, token: Option<SecretString>) -> Self {
        let ctx = Self::signed_out();
        ctx.sign_in(user_id, role, token);
        ctx
    }

    /// Builds the context from the identity values carried in config, if any.
    pub fn from_config(config: &Config) -> Self {
        match &config.user_id {
            Some(user_id) => Self::signed_in(user_id, config.user_role, config.api_token.clone()),
            None => Self::signed_out(),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<Identity>> {
        self.identity
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<Identity>> {
        self.identity
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn sign_in(&self, user_id: &str, role: UserRole, token: Option<SecretString>) {
        log::info!("Signed in as {} ({})", user_id, role);
        *self.write() = Some(Identity {
            user_id: user_id.to_string(),
            role,
            token,
        });
    }

    pub fn sign_out(&self) {
        if let Some(identity) = self.write().take() {
            log::info!("Signed out {}", identity.user_id);
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_some()
    }

    pub fn user_id(&self) -> Option<String> {
        self.read().as_ref().map(|i| i.user_id.clone())
    }

    pub fn role(&self) -> Option<UserRole> {
        self.read().as_ref().map(|i| i.role)
    }

    pub fn bearer_token(&self) -> Option<SecretString> {
        self.read().as_ref().and_then(|i| i.token.clone())
    }
}
