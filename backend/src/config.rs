use std::{fmt::Display, str::FromStr, time::Duration};

use shared::models::{POLL_COLLECTION, VOTE_COLLECTION};
use tracing::{info, warn};

pub const DEFAULT_FIREHOSE_URL: &str = "wss://jetstream2.us-east.bsky.network/subscribe";

#[derive(Debug, Clone, PartialEq)]
pub struct IngesterConfig {
    pub endpoint: String,
    pub service: String,
    pub collections: Vec<String>,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
    pub enabled: bool,
}

impl Default for IngesterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_FIREHOSE_URL.into(),
            service: "jetstream".into(),
            collections: vec![POLL_COLLECTION.into(), VOTE_COLLECTION.into()],
            min_backoff: Duration::from_millis(1_000),
            max_backoff: Duration::from_millis(60_000),
            enabled: true,
        }
    }
}

impl IngesterConfig {
    /// Reads settings through `lookup` (the runtime's secret store in
    /// production), falling back to defaults for anything missing or invalid.
    pub fn load(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let min_backoff = Duration::from_millis(try_load(&lookup, "INGESTER_MIN_BACKOFF_MS", 1_000u64));
        let max_backoff = Duration::from_millis(try_load(&lookup, "INGESTER_MAX_BACKOFF_MS", 60_000u64));

        Self {
            endpoint: try_load(&lookup, "FIREHOSE_URL", defaults.endpoint),
            service: try_load(&lookup, "INGESTER_SERVICE", defaults.service),
            collections: defaults.collections,
            min_backoff,
            max_backoff: max_backoff.max(min_backoff),
            enabled: try_load(&lookup, "INGESTER_ENABLED", true),
        }
    }
}

fn try_load<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value: {e}, using default: {default}");
            default
        }),
        None => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
