use std::fmt;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::clock::{Clock, SystemClock};
use crate::errors::Error;
use crate::telemetry::refresh::RefreshTelemetry;

use super::{RefreshPolicy, TokenData, TokenFetcher};

/// Convenience result alias for cache operations.
pub type TokenCacheResult<T> = Result<T, Error>;

/// Cached token plus the single-flight marker. Both fields change together
/// under one lock.
#[derive(Default)]
struct CacheState {
    data: Option<TokenData>,
    refresh_in_flight: bool,
}

/// Serves a valid token on every call, fetching synchronously only when no
/// valid token is cached and refreshing in the background once a token enters
/// its refresh window.
///
/// At most one background refresh is outstanding per cache. Failures of that
/// refresh are logged and otherwise invisible; the old token keeps being served
/// until it expires, at which point the next call fetches synchronously and
/// reports any error.
#[derive(Clone)]
pub struct TokenCache {
    state: Arc<Mutex<CacheState>>,
    fetcher: Arc<dyn TokenFetcher>,
    clock: Arc<dyn Clock>,
    policy: RefreshPolicy,
    context: Arc<str>,
}

impl TokenCache {
    pub fn new(fetcher: Arc<dyn TokenFetcher>) -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState::default())),
            fetcher,
            clock: Arc::new(SystemClock),
            policy: RefreshPolicy::default(),
            context: Arc::from("token_cache"),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: RefreshPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Label attached to refresh log events.
    pub fn with_context(mut self, context: impl Into<Arc<str>>) -> Self {
        self.context = context.into();
        self
    }

    pub async fn get_token(&self) -> TokenCacheResult<String> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;
        let now = self.clock.now();

        if let Some(data) = state.data.as_mut().filter(|data| data.is_valid(now)) {
            if data.in_refresh_window(now) && !state.refresh_in_flight {
                let next_attempt = now.saturating_add(self.policy.debounce_secs());
                let telemetry = RefreshTelemetry::new(&*self.context);
                telemetry.emit_start(now, data.refresh_time(), data.expiration());
                data.defer_refresh(next_attempt);
                state.refresh_in_flight = true;
                self.spawn_refresh(telemetry);
            }
            return Ok(data.access_token().to_owned());
        }

        debug!(
            context = %self.context,
            cold = state.data.is_none(),
            "token.fetch.sync"
        );
        // The lock stays held so concurrent callers wait for this fetch instead
        // of issuing their own. A failure leaves the state as it was.
        let mut fetched = self.fetcher.fetch().await?;
        fetched.apply_refresh_fraction(self.policy.refresh_fraction);
        let token = fetched.access_token().to_owned();
        state.data = Some(fetched);
        Ok(token)
    }

    fn spawn_refresh(&self, telemetry: RefreshTelemetry) {
        let state = Arc::clone(&self.state);
        let fetcher = Arc::clone(&self.fetcher);
        let refresh_fraction = self.policy.refresh_fraction;
        tokio::spawn(async move {
            let result = fetcher.fetch().await;
            let mut state = state.lock().await;
            state.refresh_in_flight = false;
            match result {
                Ok(mut data) => {
                    data.apply_refresh_fraction(refresh_fraction);
                    telemetry.emit_success(&data);
                    state.data = Some(data);
                }
                Err(err) => telemetry.emit_failure(&err),
            }
        });
    }

    /// Snapshot of the currently cached token data.
    pub async fn token_data(&self) -> Option<TokenData> {
        self.state.lock().await.data.clone()
    }

    pub async fn refresh_in_flight(&self) -> bool {
        self.state.lock().await.refresh_in_flight
    }

    /// Installs token data directly, replacing whatever is cached.
    pub async fn set_token_data(&self, data: TokenData) {
        self.state.lock().await.data = Some(data);
    }

    /// Drops the cached token so the next call fetches synchronously.
    pub async fn invalidate(&self) {
        self.state.lock().await.data = None;
    }
}

impl fmt::Debug for TokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCache")
            .field("policy", &self.policy)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}
