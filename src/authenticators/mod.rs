//! Authenticators decorate outgoing requests with credentials.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Request;
use reqwest::header::{AUTHORIZATION, HeaderValue};

use crate::config::AuthenticatorConfig;
use crate::errors::Error;

mod api_key;
mod basic;
mod bearer;

pub use api_key::{ApiKeyAuthenticator, ApiKeyFetcher};
pub use basic::{BasicAuthAuthenticator, BasicAuthFetcher};
pub use bearer::BearerTokenAuthenticator;

pub const AUTH_TYPE_API_KEY: &str = "apikey";
pub const AUTH_TYPE_BASIC_TOKEN: &str = "basic_token";
pub const AUTH_TYPE_BEARER: &str = "bearer";

#[async_trait]
pub trait Authenticator: Send + Sync {
    fn authentication_type(&self) -> &'static str;

    /// Checks the configuration this authenticator was built from.
    fn validate(&self) -> Result<(), Error>;

    /// Attaches credentials to `request`. On error the request is untouched.
    async fn authenticate(&self, request: &mut Request) -> Result<(), Error>;
}

/// Builds the authenticator named by `config.auth_type`.
pub fn authenticator_from_config(
    config: &AuthenticatorConfig,
) -> Result<Arc<dyn Authenticator>, Error> {
    let auth_type = config
        .auth_type
        .as_deref()
        .ok_or_else(|| Error::Config(required_message("auth_type")))?;
    let authenticator: Arc<dyn Authenticator> = match auth_type.to_lowercase().as_str() {
        AUTH_TYPE_API_KEY => Arc::new(ApiKeyAuthenticator::from_config(config)?),
        AUTH_TYPE_BASIC_TOKEN => Arc::new(BasicAuthAuthenticator::from_config(config)?),
        AUTH_TYPE_BEARER => Arc::new(BearerTokenAuthenticator::from_config(config)?),
        other => {
            return Err(Error::Config(format!(
                "Unrecognized authentication type '{other}'"
            )));
        }
    };
    Ok(authenticator)
}

/// Sets `Authorization: Bearer <token>`, replacing any existing value.
pub(crate) fn set_bearer(request: &mut Request, token: &str) -> Result<(), Error> {
    let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
        .map_err(|e| Error::Decode(format!("token is not a valid header value: {e}")))?;
    value.set_sensitive(true);
    request.headers_mut().insert(AUTHORIZATION, value);
    Ok(())
}

pub(crate) fn required<'a>(name: &str, value: Option<&'a str>) -> Result<&'a str, Error> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::Config(required_message(name))),
    }
}

pub(crate) fn well_formed(name: &str, value: &str) -> Result<(), Error> {
    if has_bad_first_or_last_char(value) {
        return Err(Error::Config(format!(
            "The {name} property value is invalid; it must not begin or end with '{{', '}}' or '\"'."
        )));
    }
    Ok(())
}

/// True when `value` looks like an unsubstituted template such as `{apikey}`
/// or a quoted string.
pub fn has_bad_first_or_last_char(value: &str) -> bool {
    value.starts_with(['{', '"']) || value.ends_with(['}', '"'])
}

fn required_message(name: &str) -> String {
    format!("The {name} property is required but was not specified.")
}

#[cfg(test)]
mod tests {
    use reqwest::Method;

    use super::*;

    #[test]
    fn bad_chars_detected() {
        assert!(has_bad_first_or_last_char("{apikey}"));
        assert!(has_bad_first_or_last_char("\"quoted\""));
        assert!(has_bad_first_or_last_char("trailing}"));
        assert!(!has_bad_first_or_last_char("plain-key"));
    }

    #[test]
    fn required_rejects_missing_and_empty() {
        assert!(required("apikey", Some("k")).is_ok());
        let err = required("apikey", Some("")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "The apikey property is required but was not specified."
        );
        assert!(required("apikey", None).is_err());
    }

    #[test]
    fn set_bearer_replaces_existing_header() {
        let mut request = Request::new(Method::GET, "https://api.example/v1".parse().unwrap());
        request
            .headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        set_bearer(&mut request, "tok").unwrap();
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer tok");
        assert_eq!(request.headers().get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn factory_requires_known_auth_type() {
        let err = authenticator_from_config(&AuthenticatorConfig::default())
            .err()
            .expect("missing auth type");
        assert!(matches!(err, Error::Config(_)));

        let config = AuthenticatorConfig {
            auth_type: Some("kerberos".into()),
            ..Default::default()
        };
        let err = authenticator_from_config(&config)
            .err()
            .expect("unknown auth type");
        assert!(err.to_string().contains("kerberos"));
    }

    #[test]
    fn factory_dispatches_case_insensitively() {
        let config = AuthenticatorConfig {
            auth_type: Some("Bearer".into()),
            bearer_token: Some("static".into()),
            ..Default::default()
        };
        let auth = authenticator_from_config(&config).unwrap();
        assert_eq!(auth.authentication_type(), AUTH_TYPE_BEARER);
    }
}
