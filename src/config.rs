//! read authenticator configuration from a file, the environment, a secret or a property map

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use aws_config::BehaviorVersion;
use serde::Deserialize;

use crate::errors::Error;

pub enum ConfigLocation {
    File(String),
    /// Environment variables prefixed with the given service name.
    Env(String),
    /// An AWS Secrets Manager secret id whose value is a JSON document.
    Secret(String),
}

/// Credential material and transport settings for one authenticator.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthenticatorConfig {
    pub auth_type: Option<String>,
    pub apikey: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub bearer_token: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub scope: Option<String>,
    pub disable_ssl: bool,
    pub headers: HashMap<String, String>,
    pub timeout_secs: Option<u64>,
}

impl fmt::Debug for AuthenticatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redacted(secret: &Option<String>) -> Option<&'static str> {
            secret.as_ref().map(|_| "<redacted>")
        }
        f.debug_struct("AuthenticatorConfig")
            .field("auth_type", &self.auth_type)
            .field("apikey", &redacted(&self.apikey))
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &redacted(&self.password))
            .field("bearer_token", &redacted(&self.bearer_token))
            .field("client_id", &self.client_id)
            .field("client_secret", &redacted(&self.client_secret))
            .field("scope", &self.scope)
            .field("disable_ssl", &self.disable_ssl)
            .field("headers", &self.headers)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AuthenticatorConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Builds a config from un-prefixed property names such as `AUTH_TYPE`,
    /// `APIKEY` or `AUTH_URL`. Unknown keys are ignored.
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self, Error> {
        Self::from_lookup(|key| props.get(key).cloned())
    }

    /// Reads `<SERVICE>_AUTH_TYPE`, `<SERVICE>_APIKEY`, ... from the environment.
    pub fn from_env(service_name: &str) -> Result<Self, Error> {
        Self::from_service_vars(service_name, |var| std::env::var(var).ok())
    }

    /// Resolves each property through `lookup` under its `<SERVICE>_` name.
    fn from_service_vars(
        service_name: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        let prefix = env_prefix(service_name);
        Self::from_lookup(|key| lookup(&format!("{prefix}_{key}")))
    }

    pub fn from_file(path: &str) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let disable_ssl = match non_empty("AUTH_DISABLE_SSL") {
            Some(v) => parse_bool("AUTH_DISABLE_SSL", &v)?,
            None => false,
        };
        let timeout_secs = non_empty("AUTH_TIMEOUT_SECS")
            .map(|v| {
                v.parse::<u64>().map_err(|_| {
                    Error::Config(format!("Invalid AUTH_TIMEOUT_SECS value '{v}'"))
                })
            })
            .transpose()?;
        Ok(Self {
            auth_type: non_empty("AUTH_TYPE"),
            apikey: non_empty("APIKEY"),
            url: non_empty("AUTH_URL"),
            username: non_empty("USERNAME"),
            password: non_empty("PASSWORD"),
            bearer_token: non_empty("BEARER_TOKEN"),
            client_id: non_empty("CLIENT_ID"),
            client_secret: non_empty("CLIENT_SECRET"),
            scope: non_empty("SCOPE"),
            disable_ssl,
            headers: HashMap::new(),
            timeout_secs,
        })
    }
}

pub async fn read_config(loc: ConfigLocation) -> Result<AuthenticatorConfig, Error> {
    let config = match loc {
        ConfigLocation::File(path) => AuthenticatorConfig::from_file(&path)?,
        ConfigLocation::Env(service_name) => AuthenticatorConfig::from_env(&service_name)?,
        ConfigLocation::Secret(secret_id) => read_config_from_secret(&secret_id).await?,
    };
    Ok(config)
}

async fn read_config_from_secret(secret_id: &str) -> Result<AuthenticatorConfig, Error> {
    let client = aws_sdk_secretsmanager::Client::new(
        &aws_config::load_defaults(BehaviorVersion::latest()).await,
    );
    let resp = client
        .get_secret_value()
        .secret_id(secret_id)
        .send()
        .await
        .map_err(|e| Error::Config(format!("Failed to get secret: {}", e)))?;
    let secret = match resp.secret_string() {
        Some(s) => Ok(s),
        None => Err(Error::Config(
            "Failed to get secret string, returned None".to_string(),
        )),
    }?;
    let config: AuthenticatorConfig = serde_json::from_str(secret)?;
    Ok(config)
}

fn env_prefix(service_name: &str) -> String {
    service_name.to_uppercase().replace('-', "_")
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    match value.to_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(Error::Config(format!(
            "Invalid {key} value '{other}'; expected 'true' or 'false'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn properties_map_to_fields() {
        let config = AuthenticatorConfig::from_properties(&props(&[
            ("AUTH_TYPE", "apikey"),
            ("APIKEY", "my-key"),
            ("AUTH_URL", "https://auth.example"),
            ("CLIENT_ID", "cid"),
            ("CLIENT_SECRET", "csecret"),
            ("AUTH_DISABLE_SSL", "TRUE"),
            ("AUTH_TIMEOUT_SECS", "15"),
        ]))
        .unwrap();
        assert_eq!(config.auth_type.as_deref(), Some("apikey"));
        assert_eq!(config.apikey.as_deref(), Some("my-key"));
        assert_eq!(config.url.as_deref(), Some("https://auth.example"));
        assert_eq!(config.client_id.as_deref(), Some("cid"));
        assert!(config.disable_ssl);
        assert_eq!(config.timeout(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn empty_values_are_treated_as_missing() {
        let config =
            AuthenticatorConfig::from_properties(&props(&[("APIKEY", ""), ("USERNAME", "u")]))
                .unwrap();
        assert!(config.apikey.is_none());
        assert_eq!(config.username.as_deref(), Some("u"));
        assert!(!config.disable_ssl);
    }

    #[test]
    fn bad_bool_is_a_config_error() {
        let err = AuthenticatorConfig::from_properties(&props(&[("AUTH_DISABLE_SSL", "yes")]))
            .expect_err("yes is not a bool");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn service_name_prefix_is_normalized() {
        assert_eq!(env_prefix("my-service"), "MY_SERVICE");
    }

    #[test]
    fn service_vars_are_read_under_prefix() {
        let vars = props(&[
            ("MY_SERVICE_AUTH_TYPE", "basic_token"),
            ("MY_SERVICE_USERNAME", "env-user"),
            ("MY_SERVICE_PASSWORD", "env-pass"),
            ("MY_SERVICE_AUTH_URL", "https://cpd.example"),
            ("MY_SERVICE_AUTH_DISABLE_SSL", "true"),
            ("USERNAME", "unprefixed"),
        ]);
        let config =
            AuthenticatorConfig::from_service_vars("my-service", |var| vars.get(var).cloned())
                .unwrap();
        assert_eq!(config.auth_type.as_deref(), Some("basic_token"));
        assert_eq!(config.username.as_deref(), Some("env-user"));
        assert_eq!(config.url.as_deref(), Some("https://cpd.example"));
        assert!(config.disable_ssl);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = AuthenticatorConfig {
            apikey: Some("key-value".into()),
            password: Some("pw-value".into()),
            client_id: Some("cid".into()),
            client_secret: Some("secret-value".into()),
            ..Default::default()
        };
        let rendered = format!("{config:?}");
        assert!(rendered.contains("cid"));
        assert!(rendered.contains("<redacted>"));
        for secret in ["key-value", "pw-value", "secret-value"] {
            assert!(!rendered.contains(secret), "{secret} leaked: {rendered}");
        }
    }

    #[test]
    fn json_document_deserializes_with_defaults() {
        let config: AuthenticatorConfig = serde_json::from_str(
            r#"{"auth_type":"basic_token","username":"u","password":"p","url":"https://h","headers":{"X-Trace":"1"}}"#,
        )
        .unwrap();
        assert_eq!(config.auth_type.as_deref(), Some("basic_token"));
        assert_eq!(config.headers.get("X-Trace").map(String::as_str), Some("1"));
        assert!(!config.disable_ssl);
        assert!(config.timeout_secs.is_none());
    }
}
