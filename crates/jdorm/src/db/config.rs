use super::PoolConfig;

use jdorm_core::schema::LoadingPolicy;
use std::time::Duration;

/// Settings fixed when a [`Db`](crate::Db) is built.
#[derive(Debug, Clone)]
pub struct Config {
    pub pool: PoolConfig,

    /// Maximum number of cached select templates. Zero disables caching.
    pub statement_cache_size: usize,

    /// Loading policy for relations that do not declare one.
    pub default_loading: LoadingPolicy,

    /// Upper bound on a single statement. `None` means no limit.
    pub query_timeout: Option<Duration>,

    /// Rows a query cursor turns into instances at a time.
    pub hydrate_batch_size: usize,

    /// Keys looked up by one relation query. Larger batches are split, and
    /// the driver's parameter limit caps the size.
    pub relation_batch_size: usize,
}

impl Config {
    pub fn new() -> Config {
        Config {
            pool: PoolConfig::new(),
            statement_cache_size: 256,
            default_loading: LoadingPolicy::Lazy,
            query_timeout: None,
            hydrate_batch_size: 128,
            relation_batch_size: 500,
        }
    }

    pub fn pool(mut self, pool: PoolConfig) -> Config {
        self.pool = pool;
        self
    }

    pub fn statement_cache_size(mut self, size: usize) -> Config {
        self.statement_cache_size = size;
        self
    }

    pub fn default_loading(mut self, loading: LoadingPolicy) -> Config {
        self.default_loading = loading;
        self
    }

    pub fn query_timeout(mut self, timeout: Option<Duration>) -> Config {
        self.query_timeout = timeout;
        self
    }

    pub fn hydrate_batch_size(mut self, size: usize) -> Config {
        self.hydrate_batch_size = size.max(1);
        self
    }

    pub fn relation_batch_size(mut self, size: usize) -> Config {
        self.relation_batch_size = size.max(1);
        self
    }
}

impl Default for Config {
    fn default() -> Config {
        Config::new()
    }
}
