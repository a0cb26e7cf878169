use async_trait::async_trait;
use reqwest::Request;

use crate::authenticators::{AUTH_TYPE_BEARER, Authenticator, required, set_bearer};
use crate::config::AuthenticatorConfig;
use crate::errors::Error;

/// Attaches a caller-supplied token as-is. Nothing is fetched or cached.
#[derive(Clone, Debug)]
pub struct BearerTokenAuthenticator {
    bearer_token: String,
}

impl BearerTokenAuthenticator {
    pub fn new(bearer_token: impl Into<String>) -> Result<Self, Error> {
        let auth = Self {
            bearer_token: bearer_token.into(),
        };
        auth.validate()?;
        Ok(auth)
    }

    pub fn from_config(config: &AuthenticatorConfig) -> Result<Self, Error> {
        Self::new(required("bearer_token", config.bearer_token.as_deref())?)
    }

    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    /// Replaces the token, e.g. after the caller obtained a new one elsewhere.
    pub fn set_bearer_token(&mut self, bearer_token: impl Into<String>) {
        self.bearer_token = bearer_token.into();
    }
}

#[async_trait]
impl Authenticator for BearerTokenAuthenticator {
    fn authentication_type(&self) -> &'static str {
        AUTH_TYPE_BEARER
    }

    fn validate(&self) -> Result<(), Error> {
        required("bearer_token", Some(self.bearer_token.as_str())).map(|_| ())
    }

    async fn authenticate(&self, request: &mut Request) -> Result<(), Error> {
        set_bearer(request, &self.bearer_token)
    }
}
