use async_trait::async_trait;

use crate::errors::Error;

use super::TokenData;

/// Performs one round trip to an identity service to obtain a fresh token.
#[async_trait]
pub trait TokenFetcher: Send + Sync {
    async fn fetch(&self) -> Result<TokenData, Error>;
}
