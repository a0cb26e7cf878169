use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::{DecodingKey, Validation};
use reqwest::{Client, Request};
use serde::Deserialize;
use tracing::info;

use crate::authenticators::{
    AUTH_TYPE_BASIC_TOKEN, Authenticator, required, set_bearer, well_formed,
};
use crate::config::AuthenticatorConfig;
use crate::errors::Error;
use crate::http;
use crate::token::{TokenCache, TokenData, TokenFetcher};

const TOKEN_PATH: &str = "/v1/authorize";

#[derive(Debug, Deserialize)]
struct BasicTokenResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TimingClaims {
    iat: Option<i64>,
    exp: Option<i64>,
}

/// Reads `iat`/`exp` from a JWT without checking its signature; the token is
/// only inspected for timing, never trusted.
pub(crate) fn decode_timing(token: &str) -> Result<(i64, i64), Error> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data = jsonwebtoken::decode::<TimingClaims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| Error::Decode(format!("access token is not a JWT: {e}")))?;
    match (data.claims.iat, data.claims.exp) {
        (Some(iat), Some(exp)) => Ok((iat, exp)),
        _ => Err(Error::Decode(
            "access token is missing the iat or exp claim".into(),
        )),
    }
}

/// Obtains a bearer token by presenting a username and password with HTTP
/// basic auth.
pub struct BasicAuthFetcher {
    client: Client,
    token_url: String,
    username: String,
    password: String,
    headers: reqwest::header::HeaderMap,
}

impl BasicAuthFetcher {
    pub fn from_config(config: &AuthenticatorConfig) -> Result<Self, Error> {
        let url = required("url", config.url.as_deref())?;
        Ok(Self {
            client: http::build_client(config.disable_ssl, config.timeout())?,
            token_url: http::resolve_url(url, TOKEN_PATH),
            username: required("username", config.username.as_deref())?.to_string(),
            password: required("password", config.password.as_deref())?.to_string(),
            headers: http::header_map(&config.headers)?,
        })
    }
}

#[async_trait]
impl TokenFetcher for BasicAuthFetcher {
    async fn fetch(&self) -> Result<TokenData, Error> {
        let request = self
            .client
            .get(&self.token_url)
            .headers(self.headers.clone())
            .basic_auth(&self.username, Some(&self.password));

        let body = http::send_for_body(request, "basic_token").await?;
        let resp: BasicTokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Decode(format!("token response: {e}")))?;
        let (issued_at, expiration) = decode_timing(&resp.access_token)?;

        info!(issued_at, expiration, "basic token acquired");
        TokenData::from_service(resp.access_token, issued_at, expiration)
    }
}

/// Authenticates requests with a bearer token obtained from a username and
/// password.
pub struct BasicAuthAuthenticator {
    config: AuthenticatorConfig,
    fetcher: Arc<BasicAuthFetcher>,
    cache: TokenCache,
}

impl BasicAuthAuthenticator {
    pub fn from_config(config: &AuthenticatorConfig) -> Result<Self, Error> {
        validate_config(config)?;
        let fetcher = Arc::new(BasicAuthFetcher::from_config(config)?);
        let cache = TokenCache::new(fetcher.clone()).with_context(AUTH_TYPE_BASIC_TOKEN);
        Ok(Self {
            config: config.clone(),
            fetcher,
            cache,
        })
    }

    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        url: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::from_config(&AuthenticatorConfig {
            auth_type: Some(AUTH_TYPE_BASIC_TOKEN.to_string()),
            username: Some(username.into()),
            password: Some(password.into()),
            url: Some(url.into()),
            ..Default::default()
        })
    }

    pub fn with_cache(mut self, configure: impl FnOnce(TokenCache) -> TokenCache) -> Self {
        self.cache = configure(self.cache);
        self
    }

    pub async fn get_token(&self) -> Result<String, Error> {
        self.cache.get_token().await
    }

    /// Fetches a token directly, bypassing and not updating the cache.
    pub async fn request_token(&self) -> Result<TokenData, Error> {
        self.fetcher.fetch().await
    }

    pub fn token_cache(&self) -> &TokenCache {
        &self.cache
    }

    pub fn url(&self) -> Option<&str> {
        self.config.url.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.config.username.as_deref()
    }

    pub fn disable_ssl(&self) -> bool {
        self.config.disable_ssl
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.config.headers
    }
}

#[async_trait]
impl Authenticator for BasicAuthAuthenticator {
    fn authentication_type(&self) -> &'static str {
        AUTH_TYPE_BASIC_TOKEN
    }

    fn validate(&self) -> Result<(), Error> {
        validate_config(&self.config)
    }

    async fn authenticate(&self, request: &mut Request) -> Result<(), Error> {
        let token = self.get_token().await?;
        set_bearer(request, &token)
    }
}

fn validate_config(config: &AuthenticatorConfig) -> Result<(), Error> {
    let username = required("username", config.username.as_deref())?;
    well_formed("username", username)?;
    required("password", config.password.as_deref())?;
    let url = required("url", config.url.as_deref())?;
    well_formed("url", url)
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header, encode};
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Claims {
        sub: &'static str,
        iat: i64,
        exp: i64,
    }

    #[test]
    fn timing_comes_from_claims() {
        let token = encode(
            &Header::default(),
            &Claims {
                sub: "user",
                iat: 1_000,
                exp: 4_600,
            },
            &EncodingKey::from_secret(b"anything"),
        )
        .unwrap();
        assert_eq!(decode_timing(&token).unwrap(), (1_000, 4_600));
    }

    #[test]
    fn missing_claims_is_a_decode_error() {
        #[derive(Serialize)]
        struct NoTiming {
            sub: &'static str,
        }
        let token = encode(
            &Header::default(),
            &NoTiming { sub: "user" },
            &EncodingKey::from_secret(b"anything"),
        )
        .unwrap();
        assert!(matches!(decode_timing(&token), Err(Error::Decode(_))));
        assert!(matches!(decode_timing("not-a-jwt"), Err(Error::Decode(_))));
    }

    #[test]
    fn password_is_required() {
        let config = AuthenticatorConfig {
            username: Some("user".into()),
            url: Some("https://cpd.example".into()),
            ..Default::default()
        };
        let err = BasicAuthAuthenticator::from_config(&config)
            .err()
            .expect("missing password");
        assert_eq!(
            err.to_string(),
            "The password property is required but was not specified."
        );
    }

    #[test]
    fn token_url_gets_authorize_path() {
        let auth = BasicAuthAuthenticator::new("user", "pw", "https://cpd.example/").unwrap();
        assert_eq!(auth.fetcher.token_url, "https://cpd.example/v1/authorize");
        assert_eq!(auth.username(), Some("user"));
        assert_eq!(auth.authentication_type(), "basic_token");
    }
}
