use std::sync::Arc;

use log::Logger;

use crate::db::Db;
use crate::geocoding::Geocoder;

/// Everything a route handler needs, cloned into each request.
#[derive(Clone)]
pub struct Environment {
    pub logger: Arc<Logger>,
    pub db: Arc<dyn Db + Send + Sync>,
    pub geocoder: Arc<dyn Geocoder + Send + Sync>,
    pub config: Arc<Config>,
}

impl Environment {
    pub fn new(
        logger: Arc<Logger>,
        db: Arc<dyn Db + Send + Sync>,
        geocoder: Arc<dyn Geocoder + Send + Sync>,
        config: Config,
    ) -> Self {
        Self {
            logger,
            db,
            geocoder,
            config: Arc::new(config),
        }
    }
}

/// The default prefix for every API route.
pub const DEFAULT_API_PATH: &str = "api";

/// The default limit on submission bodies. Entries are small; anything
/// bigger than this is not a mood entry.
pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    /// A single path segment that prefixes every API route.
    pub(crate) api_path: String,

    pub(crate) max_body_bytes: u64,
}

impl Config {
    /// Creates a new instance. `api_path` is one path segment, without
    /// slashes.
    pub fn new(api_path: impl Into<String>, max_body_bytes: u64) -> Self {
        let api_path = api_path.into();

        assert!(
            !api_path.is_empty() && !api_path.contains('/'),
            "API path must be a single path segment, got {:?}",
            api_path
        );

        Self {
            api_path,
            max_body_bytes,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(DEFAULT_API_PATH, DEFAULT_MAX_BODY_BYTES)
    }
}
