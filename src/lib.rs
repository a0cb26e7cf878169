//! Bearer-token authentication for outbound HTTP requests.
//!
//! Authenticators obtain tokens from an identity service, cache them, and
//! refresh them in the background before they expire so request paths rarely
//! wait on the network.

pub mod authenticators;
pub mod clock;
pub mod config;
pub mod errors;
mod http;
pub mod telemetry;
pub mod token;

pub use authenticators::{
    ApiKeyAuthenticator, Authenticator, BasicAuthAuthenticator, BearerTokenAuthenticator,
    authenticator_from_config,
};
pub use config::{AuthenticatorConfig, ConfigLocation, read_config};
pub use errors::Error;
pub use token::{RefreshPolicy, TokenCache, TokenData, TokenFetcher};
