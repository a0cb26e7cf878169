use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Request};
use serde::Deserialize;
use tracing::info;

use crate::authenticators::{AUTH_TYPE_API_KEY, Authenticator, required, set_bearer, well_formed};
use crate::config::AuthenticatorConfig;
use crate::errors::Error;
use crate::http;
use crate::token::{TokenCache, TokenData, TokenFetcher};

const TOKEN_PATH: &str = "/identity/token";
const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";
const RESPONSE_TYPE: &str = "cloud_iam";

/// Success body of the API-key exchange.
#[derive(Debug, Deserialize)]
struct ApiKeyTokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: i64,
    expiration: i64,
}

/// Exchanges an API key for a bearer token with a form-encoded POST.
pub struct ApiKeyFetcher {
    client: Client,
    token_url: String,
    apikey: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    scope: Option<String>,
    headers: reqwest::header::HeaderMap,
}

impl ApiKeyFetcher {
    pub fn from_config(config: &AuthenticatorConfig) -> Result<Self, Error> {
        let url = required("url", config.url.as_deref())?;
        Ok(Self {
            client: http::build_client(config.disable_ssl, config.timeout())?,
            token_url: http::resolve_url(url, TOKEN_PATH),
            apikey: required("apikey", config.apikey.as_deref())?.to_string(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            scope: config.scope.clone(),
            headers: http::header_map(&config.headers)?,
        })
    }

    fn form_body(&self) -> String {
        let mut body = format!(
            "grant_type={}&apikey={}&response_type={}",
            urlencoding::encode(GRANT_TYPE),
            urlencoding::encode(&self.apikey),
            RESPONSE_TYPE
        );
        if let Some(scope) = self.scope.as_deref() {
            body.push_str("&scope=");
            body.push_str(&urlencoding::encode(scope));
        }
        body
    }
}

#[async_trait]
impl TokenFetcher for ApiKeyFetcher {
    async fn fetch(&self) -> Result<TokenData, Error> {
        let mut request = self
            .client
            .post(&self.token_url)
            .headers(self.headers.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(self.form_body());
        if let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) {
            request = request.basic_auth(id, Some(secret));
        }

        let body = http::send_for_body(request, "apikey_token").await?;
        let resp: ApiKeyTokenResponse = serde_json::from_str(&body)
            .map_err(|e| Error::Decode(format!("token response: {e}")))?;

        info!(
            expires_in = resp.expires_in,
            expiration = resp.expiration,
            has_refresh_token = resp.refresh_token.is_some(),
            "apikey token acquired"
        );

        let issued_at = resp
            .expiration
            .checked_sub(resp.expires_in)
            .ok_or_else(|| Error::Decode("token timing out of range".into()))?;
        Ok(
            TokenData::from_service(resp.access_token, issued_at, resp.expiration)?
                .with_refresh_token(resp.refresh_token)
                .with_token_type(resp.token_type),
        )
    }
}

/// Authenticates requests with a bearer token obtained by exchanging an API key.
pub struct ApiKeyAuthenticator {
    config: AuthenticatorConfig,
    fetcher: Arc<ApiKeyFetcher>,
    cache: TokenCache,
}

impl ApiKeyAuthenticator {
    pub fn from_config(config: &AuthenticatorConfig) -> Result<Self, Error> {
        validate_config(config)?;
        let fetcher = Arc::new(ApiKeyFetcher::from_config(config)?);
        let cache = TokenCache::new(fetcher.clone()).with_context(AUTH_TYPE_API_KEY);
        Ok(Self {
            config: config.clone(),
            fetcher,
            cache,
        })
    }

    pub fn new(apikey: impl Into<String>, url: impl Into<String>) -> Result<Self, Error> {
        Self::from_config(&AuthenticatorConfig {
            auth_type: Some(AUTH_TYPE_API_KEY.to_string()),
            apikey: Some(apikey.into()),
            url: Some(url.into()),
            ..Default::default()
        })
    }

    /// Swaps the token cache, e.g. for one with a test clock. The cache must
    /// wrap this authenticator's fetcher.
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

    pub fn apikey(&self) -> Option<&str> {
        self.config.apikey.as_deref()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.config.client_id.as_deref()
    }

    pub fn scope(&self) -> Option<&str> {
        self.config.scope.as_deref()
    }

    pub fn disable_ssl(&self) -> bool {
        self.config.disable_ssl
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.config.headers
    }
}

#[async_trait]
impl Authenticator for ApiKeyAuthenticator {
    fn authentication_type(&self) -> &'static str {
        AUTH_TYPE_API_KEY
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
    let apikey = required("apikey", config.apikey.as_deref())?;
    well_formed("apikey", apikey)?;
    let url = required("url", config.url.as_deref())?;
    well_formed("url", url)?;
    match (config.client_id.as_deref(), config.client_secret.as_deref()) {
        (Some(_), Some(_)) | (None, None) => Ok(()),
        _ => Err(Error::Config(
            "The client_id and client_secret properties must both be set or both be unset."
                .into(),
        )),
    }
}
