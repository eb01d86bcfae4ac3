//! Session tuning options and the inbound `solve-problem` request.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tuning options for a single debate session.
///
/// Every field has a documented default so a request may carry any subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebateConfig {
    /// Maximum number of rounds. Rounds are numbered from 0, so no work is
    /// dispatched in round `max_rounds` or later.
    pub max_rounds: u32,
    /// Maximum consecutive stalled rounds before forced termination.
    pub max_stall: u32,
    /// Time budget for each worker call.
    #[serde(rename = "per_call_timeout_ms", with = "duration_ms")]
    pub per_call_timeout: Duration,
    /// Restrict the session to these worker ids (`None` = all registered).
    pub worker_pool: Option<Vec<String>>,
    /// Bounded retries per worker per round (0 or 1).
    pub max_retries: u32,
    /// Dispatch the workers of a round concurrently against a snapshot of
    /// peer answers. When false, workers are dispatched one at a time.
    pub parallel_dispatch: bool,
    /// Capacity of the event broadcast channel. Read once by
    /// `Coordinator::new`; per-request overrides do not resize the bus.
    pub event_capacity: usize,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_rounds: 3,
            max_stall: 2,
            per_call_timeout: Duration::from_secs(60),
            worker_pool: None,
            max_retries: 0,
            parallel_dispatch: true,
            event_capacity: 256,
        }
    }
}

impl DebateConfig {
    /// Parse a flat TOML document; missing keys take their defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check option ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_rounds == 0 {
            return Err(ConfigError::ZeroRounds);
        }
        if self.per_call_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.max_retries > 1 {
            return Err(ConfigError::TooManyRetries(self.max_retries));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::ZeroEventCapacity);
        }
        if matches!(&self.worker_pool, Some(pool) if pool.is_empty()) {
            return Err(ConfigError::EmptyWorkerPool);
        }
        Ok(())
    }

    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    pub fn with_max_stall(mut self, max_stall: u32) -> Self {
        self.max_stall = max_stall;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.per_call_timeout = timeout;
        self
    }

    pub fn with_worker_pool<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.worker_pool = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel_dispatch = false;
        self
    }
}

/// Inbound `solve-problem` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveProblemRequest {
    /// Free-text problem statement.
    pub question: String,
    /// Optional tuning; absent options take defaults.
    #[serde(default)]
    pub configuration: Option<DebateConfig>,
}

impl SolveProblemRequest {
    /// The effective configuration for this request.
    pub fn config(&self) -> DebateConfig {
        self.configuration.clone().unwrap_or_default()
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DebateConfig::default();
        assert_eq!(config.max_rounds, 3);
        assert_eq!(config.max_stall, 2);
        assert_eq!(config.per_call_timeout, Duration::from_secs(60));
        assert!(config.worker_pool.is_none());
        assert!(config.parallel_dispatch);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_options() {
        assert_eq!(
            DebateConfig::default().with_max_rounds(0).validate(),
            Err(ConfigError::ZeroRounds)
        );
        assert_eq!(
            DebateConfig::default().with_retries(2).validate(),
            Err(ConfigError::TooManyRetries(2))
        );
        assert_eq!(
            DebateConfig::default()
                .with_timeout(Duration::ZERO)
                .validate(),
            Err(ConfigError::ZeroTimeout)
        );
        let empty: Vec<String> = Vec::new();
        assert_eq!(
            DebateConfig::default().with_worker_pool(empty).validate(),
            Err(ConfigError::EmptyWorkerPool)
        );
    }

    #[test]
    fn test_from_toml_partial() {
        let config = DebateConfig::from_toml_str(
            "max_rounds = 5\nper_call_timeout_ms = 1500\nworker_pool = [\"algebra\"]\n",
        )
        .unwrap();
        assert_eq!(config.max_rounds, 5);
        assert_eq!(config.max_stall, 2);
        assert_eq!(config.per_call_timeout, Duration::from_millis(1500));
        assert_eq!(config.worker_pool, Some(vec!["algebra".to_string()]));
    }

    #[test]
    fn test_from_toml_invalid() {
        let err = DebateConfig::from_toml_str("max_rounds = \"three\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        let err = DebateConfig::from_toml_str("max_retries = 3").unwrap_err();
        assert_eq!(err, ConfigError::TooManyRetries(3));
    }

    #[test]
    fn test_solve_request_json() {
        let request: SolveProblemRequest = serde_json::from_str(
            r#"{"question": "1+1?", "configuration": {"max_rounds": 1}}"#,
        )
        .unwrap();
        let config = request.config();
        assert_eq!(config.max_rounds, 1);
        assert_eq!(config.max_stall, 2);

        let bare: SolveProblemRequest = serde_json::from_str(r#"{"question": "2+2?"}"#).unwrap();
        assert_eq!(bare.config(), DebateConfig::default());
    }
}
