use crate::errors::Error;

use super::RefreshPolicy;

/// An access token plus the timestamps used to decide when to replace it.
///
/// All timestamps are Unix seconds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenData {
    access_token: String,
    refresh_token: Option<String>,
    token_type: Option<String>,
    issued_at: i64,
    expiration: i64,
    refresh_time: i64,
}

impl TokenData {
    /// Builds token data with the default refresh fraction: the refresh window
    /// opens once 80% of the token's lifetime has elapsed.
    pub fn new(access_token: impl Into<String>, issued_at: i64, expiration: i64) -> Self {
        Self::with_refresh_fraction(
            access_token,
            issued_at,
            expiration,
            RefreshPolicy::DEFAULT_REFRESH_FRACTION,
        )
    }

    /// Like [`TokenData::new`], for timestamps taken from a token service.
    /// Rejects timing whose lifetime does not fit in an `i64`.
    pub fn from_service(
        access_token: impl Into<String>,
        issued_at: i64,
        expiration: i64,
    ) -> Result<Self, Error> {
        expiration
            .checked_sub(issued_at)
            .ok_or_else(|| Error::Decode("token timing out of range".into()))?;
        Ok(Self::new(access_token, issued_at, expiration))
    }

    pub fn with_refresh_fraction(
        access_token: impl Into<String>,
        issued_at: i64,
        expiration: i64,
        refresh_fraction: f64,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            token_type: None,
            issued_at,
            expiration,
            refresh_time: refresh_time_for(issued_at, expiration, refresh_fraction),
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: Option<String>) -> Self {
        self.refresh_token = refresh_token;
        self
    }

    pub fn with_token_type(mut self, token_type: Option<String>) -> Self {
        self.token_type = token_type;
        self
    }

    /// Returns the raw token value suitable for Authorization headers.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    pub fn token_type(&self) -> Option<&str> {
        self.token_type.as_deref()
    }

    pub fn issued_at(&self) -> i64 {
        self.issued_at
    }

    pub fn expiration(&self) -> i64 {
        self.expiration
    }

    pub fn refresh_time(&self) -> i64 {
        self.refresh_time
    }

    /// Lifetime from issuance to expiration, in seconds.
    pub fn time_to_live(&self) -> i64 {
        self.expiration.saturating_sub(self.issued_at)
    }

    pub fn is_valid(&self, now: i64) -> bool {
        !self.access_token.is_empty() && now < self.expiration
    }

    pub fn in_refresh_window(&self, now: i64) -> bool {
        now >= self.refresh_time
    }

    /// Recomputes the refresh time for a different refresh fraction.
    pub(crate) fn apply_refresh_fraction(&mut self, refresh_fraction: f64) {
        self.refresh_time = refresh_time_for(self.issued_at, self.expiration, refresh_fraction);
    }

    /// Pushes the refresh time out so that callers arriving in the same window
    /// do not trigger another refresh. Only the cache calls this.
    pub(crate) fn defer_refresh(&mut self, until: i64) {
        self.refresh_time = until;
    }

    /// Overrides the timing metadata. Effectively an invalidation; not used on
    /// the normal refresh path.
    pub fn override_timing(&mut self, expiration: i64, refresh_time: i64) {
        self.expiration = expiration;
        self.refresh_time = refresh_time;
    }
}

/// `expiration - fraction * ttl`, never at or past `expiration` for tokens with
/// a positive lifetime.
fn refresh_time_for(issued_at: i64, expiration: i64, refresh_fraction: f64) -> i64 {
    let ttl = expiration.saturating_sub(issued_at);
    if ttl <= 0 {
        return expiration;
    }
    let lead = ((ttl as f64) * refresh_fraction) as i64;
    expiration.saturating_sub(lead.max(1))
}
