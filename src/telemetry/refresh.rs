use tracing::{Level, event};
use uuid::Uuid;

use crate::errors::Error;
use crate::token::TokenData;

/// Structured events for one background refresh attempt.
#[derive(Clone, Debug)]
pub struct RefreshTelemetry {
    attempt_id: Uuid,
    context: String,
}

impl RefreshTelemetry {
    pub fn new(context: impl Into<String>) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            context: context.into(),
        }
    }

    pub fn emit_start(&self, now: i64, refresh_time: i64, expiration: i64) {
        event!(
            Level::DEBUG,
            attempt_id = %self.attempt_id,
            context = %self.context,
            now,
            refresh_time,
            expiration,
            "token.refresh.start"
        );
    }

    pub fn emit_success(&self, data: &TokenData) {
        event!(
            Level::INFO,
            attempt_id = %self.attempt_id,
            context = %self.context,
            expiration = data.expiration(),
            refresh_time = data.refresh_time(),
            "token.refresh.success"
        );
    }

    pub fn emit_failure(&self, error: &Error) {
        event!(
            Level::WARN,
            attempt_id = %self.attempt_id,
            context = %self.context,
            status = ?error.status_code(),
            error = %error,
            "token.refresh.failure"
        );
    }
}
