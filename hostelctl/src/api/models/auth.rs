//! API models for login.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Login form as posted by the login page (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct LoginForm {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl LoginForm {
    /// Both fields, if both are present and non-empty.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let username = self.username.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let password = self.password.as_deref().filter(|s| !s.is_empty())?;
        Some((username, password))
    }
}
