mod cache;
mod data;
mod fetcher;
mod policy;

pub use cache::{TokenCache, TokenCacheResult};
pub use data::TokenData;
pub use fetcher::TokenFetcher;
pub use policy::RefreshPolicy;
