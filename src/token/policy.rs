use std::time::Duration;

use crate::errors::Error;

/// Rules governing proactive refresh behaviour.
#[derive(Clone, Debug)]
pub struct RefreshPolicy {
    /// Share of a token's lifetime, counted back from expiration, during which
    /// a background refresh may run.
    pub refresh_fraction: f64,
    /// How far to push the refresh time out once a background refresh starts.
    pub debounce: Duration,
}

impl RefreshPolicy {
    pub const DEFAULT_REFRESH_FRACTION: f64 = 0.2;
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(60);

    pub fn new(refresh_fraction: f64, debounce: Duration) -> Result<Self, Error> {
        if !(refresh_fraction > 0.0 && refresh_fraction < 1.0) {
            return Err(Error::Config(
                "Refresh fraction must be between 0 and 1 (exclusive)".into(),
            ));
        }
        if debounce.is_zero() {
            return Err(Error::Config("Refresh debounce must be > 0".into()));
        }
        Ok(Self {
            refresh_fraction,
            debounce,
        })
    }

    pub(crate) fn debounce_secs(&self) -> i64 {
        i64::try_from(self.debounce.as_secs())
            .unwrap_or(i64::MAX)
            .max(1)
    }
}

impl Default for RefreshPolicy {
    fn default() -> Self {
        Self {
            refresh_fraction: Self::DEFAULT_REFRESH_FRACTION,
            debounce: Self::DEFAULT_DEBOUNCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_matches_constants() {
        let policy = RefreshPolicy::default();
        assert_eq!(policy.refresh_fraction, 0.2);
        assert_eq!(policy.debounce_secs(), 60);
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        for fraction in [0.0, 1.0, -0.5, f64::NAN] {
            let err = RefreshPolicy::new(fraction, Duration::from_secs(60))
                .expect_err("fraction must be rejected");
            assert!(matches!(err, Error::Config(_)));
        }
    }

    #[test]
    fn huge_debounce_saturates() {
        let policy = RefreshPolicy::new(0.2, Duration::from_secs(u64::MAX / 2)).unwrap();
        assert_eq!(policy.debounce_secs(), i64::MAX);
    }

    #[test]
    fn rejects_zero_debounce() {
        let err = RefreshPolicy::new(0.2, Duration::ZERO).expect_err("zero debounce");
        assert!(matches!(err, Error::Config(_)));
    }
}
