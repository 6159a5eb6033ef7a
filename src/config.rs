use std::env;
use std::time::Duration;

use secrecy::SecretString;

use crate::auth::UserRole;
use crate::errors::{AppError, AppResult};

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<SecretString>,
    pub user_id: Option<String>,
    pub user_role: UserRole,
    pub tick_interval_ms: u64,
    pub poll_interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base_url: env::var("QUIZ_API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000/api".to_string()),
            api_token: env::var("QUIZ_API_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .map(SecretString::from),
            user_id: env::var("QUIZ_USER_ID")
                .ok()
                .filter(|u| !u.trim().is_empty()),
            user_role: env::var("QUIZ_USER_ROLE")
                .ok()
                .and_then(|r| r.parse().ok())
                .unwrap_or(UserRole::Student),
            tick_interval_ms: env::var("QUIZ_TICK_INTERVAL_MS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(1000),
            poll_interval_secs: env::var("QUIZ_POLL_INTERVAL_SECS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10),
            request_timeout_secs: env::var("QUIZ_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(15),
        }
    }

    /// Reject settings the attempt runner cannot work with.
    pub fn validate(&self) -> AppResult<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "QUIZ_API_BASE_URL must start with http:// or https:// (got '{}')",
                self.api_base_url
            )));
        }

        if self.tick_interval_ms == 0 {
            return Err(AppError::Config(
                "QUIZ_TICK_INTERVAL_MS must be greater than zero".to_string(),
            ));
        }

        if self.poll_interval_secs == 0 {
            return Err(AppError::Config(
                "QUIZ_POLL_INTERVAL_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:3000/api".to_string(),
            api_token: Some(SecretString::from("test_token".to_string())),
            user_id: Some("user_test".to_string()),
            user_role: UserRole::Student,
            tick_interval_ms: 1000,
            poll_interval_secs: 10,
            request_timeout_secs: 5,
        }
    }
}
