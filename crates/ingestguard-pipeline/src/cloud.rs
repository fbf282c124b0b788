use std::fmt;

use crate::errors::CredentialsError;

pub const ORGANIZATION_ID_VAR: &str = "GX_CLOUD_ORGANIZATION_ID";
pub const ACCESS_TOKEN_VAR: &str = "GX_CLOUD_ACCESS_TOKEN";

/// Credentials for the hosted validation service. Read once at startup and
/// passed explicitly from there on.
#[derive(Clone, PartialEq, Eq)]
pub struct CloudCredentials {
    organization_id: String,
    access_token: String,
}

impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("organization_id", &self.organization_id)
            .field("access_token", &"***")
            .finish()
    }
}

fn missing(var: &str, what: &str) -> CredentialsError {
    CredentialsError::MissingCredentials {
        var: var.to_string(),
        what: what.to_string(),
    }
}

impl CloudCredentials {
    pub fn new(
        organization_id: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Result<Self, CredentialsError> {
        let organization_id = organization_id.into();
        let access_token = access_token.into();
        if organization_id.is_empty() {
            return Err(missing(ORGANIZATION_ID_VAR, "organization id"));
        }
        if access_token.is_empty() {
            return Err(missing(ACCESS_TOKEN_VAR, "access token"));
        }
        Ok(Self {
            organization_id,
            access_token,
        })
    }

    pub fn from_env() -> Result<Self, CredentialsError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build credentials from any variable source; unset and empty values
    /// are treated the same.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CredentialsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let organization_id = lookup(ORGANIZATION_ID_VAR).unwrap_or_default();
        if organization_id.is_empty() {
            return Err(missing(ORGANIZATION_ID_VAR, "organization id"));
        }
        let access_token = lookup(ACCESS_TOKEN_VAR).unwrap_or_default();
        Self::new(organization_id, access_token)
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}
