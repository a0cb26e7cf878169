#![allow(dead_code)]

use std::time::Duration;

use jsonwebtoken::{EncodingKey, Header, encode};
use reqwest::{Method, Request};
use sdk_auth::TokenCache;

pub fn now() -> i64 {
    jiff::Timestamp::now().as_second()
}

pub fn api_request() -> Request {
    Request::new(
        Method::GET,
        "https://api.example/v1/resources".parse().unwrap(),
    )
}

/// Body of a successful API-key exchange.
pub fn apikey_token_body(access_token: &str, expires_in: i64, expiration: i64) -> String {
    serde_json::json!({
        "access_token": access_token,
        "refresh_token": "refresh",
        "token_type": "Bearer",
        "expires_in": expires_in,
        "expiration": expiration,
    })
    .to_string()
}

/// An HS256 JWT carrying only timing claims.
pub fn jwt(iat: i64, exp: i64) -> String {
    encode(
        &Header::default(),
        &serde_json::json!({ "sub": "user", "iat": iat, "exp": exp }),
        &EncodingKey::from_secret(b"test-secret"),
    )
    .unwrap()
}

pub async fn wait_for_refresh(cache: &TokenCache) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while cache.refresh_in_flight().await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("background refresh did not finish");
}
