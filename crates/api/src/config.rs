use std::time::Duration;

use lostfound_core::expiry::{ExpiryPolicy, SchedulerConfig};
use lostfound_core::matching::MatchingConfig;
use lostfound_core::ttl_store::RateLimitConfig;
use lostfound_similarity::SimilarityClientConfig;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the database URL and JWT secret have defaults suitable
/// for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// How long shutdown waits for background tasks (default: `30`).
    pub shutdown_timeout_secs: u64,
    pub jwt: JwtConfig,
    pub similarity: SimilarityClientConfig,
    /// When unset, notifications go to the log-only gateway.
    pub notification_webhook_url: Option<String>,
    pub matching: MatchingConfig,
    pub scheduler: SchedulerConfig,
    pub rate_limits: RateLimitConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default                  |
    /// |-----------------------------------|--------------------------|
    /// | `HOST`                            | `0.0.0.0`                |
    /// | `PORT`                            | `3000`                   |
    /// | `CORS_ORIGINS`                    | `http://localhost:5173`  |
    /// | `REQUEST_TIMEOUT_SECS`            | `30`                     |
    /// | `SHUTDOWN_TIMEOUT_SECS`           | `30`                     |
    /// | `SIMILARITY_SERVICE_URL`          | `http://localhost:8000`  |
    /// | `SIMILARITY_TIMEOUT_SECS`         | `15`                     |
    /// | `NOTIFICATION_WEBHOOK_URL`        | unset                    |
    /// | `MATCH_HIGH_CONFIDENCE_THRESHOLD` | `0.8`                    |
    /// | `MATCH_BACKGROUND_THRESHOLD`      | `0.75`                   |
    /// | `MATCH_BATCH_LIMIT`               | `100`                    |
    /// | `MATCH_MAX_PER_LOST_ITEM`         | `5`                      |
    /// | `BACKGROUND_MATCH_INTERVAL_SECS`  | `7200`                   |
    /// | `EXPIRY_INTERVAL_SECS`            | `86400`                  |
    /// | `HEALTH_CHECK_INTERVAL_SECS`      | `600`                    |
    /// | `LOST_ITEM_TTL_DAYS`              | `30`                     |
    /// | `FOUND_ITEM_TTL_DAYS`             | `60`                     |
    /// | `CLAIM_RATE_LIMIT_PER_HOUR`       | `10`                     |
    /// | `REPORT_RATE_LIMIT_PER_HOUR`      | `20`                     |
    ///
    /// # Panics
    ///
    /// Panics on unparseable values or an invalid matching configuration.
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000);

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let mut similarity = SimilarityClientConfig::new(
            std::env::var("SIMILARITY_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8000".into()),
        );
        similarity.timeout = Duration::from_secs(env_or("SIMILARITY_TIMEOUT_SECS", 15));

        let notification_webhook_url = std::env::var("NOTIFICATION_WEBHOOK_URL")
            .ok()
            .filter(|url| !url.trim().is_empty());

        let defaults = MatchingConfig::default();
        let matching = MatchingConfig {
            high_confidence_threshold: env_or(
                "MATCH_HIGH_CONFIDENCE_THRESHOLD",
                defaults.high_confidence_threshold,
            ),
            background_threshold: env_or(
                "MATCH_BACKGROUND_THRESHOLD",
                defaults.background_threshold,
            ),
            batch_limit: env_or("MATCH_BATCH_LIMIT", defaults.batch_limit),
            max_matches_per_lost_item: env_or(
                "MATCH_MAX_PER_LOST_ITEM",
                defaults.max_matches_per_lost_item,
            ),
        };
        if let Err(e) = matching.validate() {
            panic!("Invalid matching configuration: {e}");
        }
        similarity.instant_threshold = matching.background_threshold;

        let scheduler_defaults = SchedulerConfig::default();
        let scheduler = SchedulerConfig {
            match_interval: Duration::from_secs(env_or(
                "BACKGROUND_MATCH_INTERVAL_SECS",
                scheduler_defaults.match_interval.as_secs(),
            )),
            expiry_interval: Duration::from_secs(env_or(
                "EXPIRY_INTERVAL_SECS",
                scheduler_defaults.expiry_interval.as_secs(),
            )),
            health_check_interval: Duration::from_secs(env_or(
                "HEALTH_CHECK_INTERVAL_SECS",
                scheduler_defaults.health_check_interval.as_secs(),
            )),
            expiry: ExpiryPolicy {
                lost_item_ttl_days: env_or(
                    "LOST_ITEM_TTL_DAYS",
                    scheduler_defaults.expiry.lost_item_ttl_days,
                ),
                found_item_ttl_days: env_or(
                    "FOUND_ITEM_TTL_DAYS",
                    scheduler_defaults.expiry.found_item_ttl_days,
                ),
            },
        };

        let limit_defaults = RateLimitConfig::default();
        let rate_limits = RateLimitConfig {
            claims_per_hour: env_or("CLAIM_RATE_LIMIT_PER_HOUR", limit_defaults.claims_per_hour),
            reports_per_hour: env_or(
                "REPORT_RATE_LIMIT_PER_HOUR",
                limit_defaults.reports_per_hour,
            ),
        };

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", 30),
            shutdown_timeout_secs: env_or("SHUTDOWN_TIMEOUT_SECS", 30),
            jwt: JwtConfig::from_env(),
            similarity,
            notification_webhook_url,
            matching,
            scheduler,
            rate_limits,
        }
    }
}

/// Parse `key` from the environment, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .unwrap_or_else(|e| panic!("{key} must be a valid value: {e}")),
        Err(_) => default,
    }
}
