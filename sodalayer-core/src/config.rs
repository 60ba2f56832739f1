//! Connection configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{backend::Credentials, error::DocumentStoreResult};

/// Settings used when opening a [`Connection`](crate::connection::Connection).
///
/// Deserializes from JSON with every field optional:
///
/// ```ignore
/// let config = ConnectionConfig::from_json(r#"{ "user": "hr", "password": "hr", "auto_commit": true }"#)?;
/// ```
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    /// Commit after every successful insert.
    pub auto_commit: bool,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("auto_commit", &self.auto_commit)
            .finish()
    }
}

impl ConnectionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> DocumentStoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_auto_commit(mut self, auto_commit: bool) -> Self {
        self.auto_commit = auto_commit;
        self
    }

    /// Returns the credentials to present, if a user is configured.
    pub fn credentials(&self) -> Option<Credentials> {
        self.user
            .as_ref()
            .map(|user| Credentials::new(user.clone(), self.password.clone().unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_masks_the_password() {
        let config = ConnectionConfig::new().with_credentials("hr", "secret");
        let printed = format!("{config:?}");

        assert!(printed.contains("\"hr\""));
        assert!(printed.contains("***"));
        assert!(!printed.contains("secret"));
    }

    #[test]
    fn missing_fields_use_defaults() {
        let config = ConnectionConfig::from_json(r#"{ "user": "hr" }"#).unwrap();

        assert_eq!(config.user.as_deref(), Some("hr"));
        assert!(!config.auto_commit);
        assert_eq!(config.credentials(), Some(Credentials::new("hr", "")));
    }

    #[test]
    fn anonymous_config_has_no_credentials() {
        assert_eq!(ConnectionConfig::new().credentials(), None);
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(ConnectionConfig::from_json("{ user: ").is_err());
    }
}
