//! Connection pooling for database connections.

use std::{
    fmt,
    ops::{Deref, DerefMut},
    time::Duration,
};

use deadpool::managed::{Metrics, Object, PoolError, RecycleError, RecycleResult, TimeoutType, Timeouts};
use jdorm_core::{
    driver::{operation::Transaction, Capability, Connection, Driver},
    err, Error, Result,
};

/// Get the default maximum size of a pool, which is `cpu_core_count * 2`
/// including logical cores (Hyper-Threading).
fn get_default_pool_max_size() -> usize {
    deadpool::managed::PoolConfig::default().max_size
}

/// Configuration for connection pool behavior.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Connections opened when the pool is created and kept open after a
    /// broken connection is discarded.
    pub min_size: usize,

    pub max_size: usize,

    /// How long an acquire waits for a free connection. `None` waits
    /// indefinitely.
    pub acquire_timeout: Option<Duration>,

    pub acquire: AcquireMode,
}

/// What an acquire does when every connection is in use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcquireMode {
    /// Wait for a connection to be released, up to the acquire timeout.
    #[default]
    Block,

    /// Fail immediately with a pool-exhausted error.
    FailFast,
}

impl PoolConfig {
    /// Creates a new pool configuration with default settings.
    pub fn new() -> Self {
        Self {
            min_size: 0,
            max_size: get_default_pool_max_size(),
            acquire_timeout: Some(Duration::from_secs(30)),
            acquire: AcquireMode::Block,
        }
    }

    pub fn min_size(mut self, min_size: usize) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn acquire_mode(mut self, mode: AcquireMode) -> Self {
        self.acquire = mode;
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time pool counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Open connections, idle or in use.
    pub size: usize,

    /// Idle connections ready to hand out.
    pub available: usize,

    pub max_size: usize,

    /// Acquires currently waiting for a connection.
    pub waiting: usize,
}

/// A connection pool that manages database connections.
#[derive(Debug)]
pub struct Pool {
    inner: deadpool::managed::Pool<Manager>,
    config: PoolConfig,
    capability: &'static Capability,
}

impl Pool {
    /// Creates a new connection pool from the given driver and opens
    /// `min_size` connections.
    pub async fn new(driver: impl Driver, config: PoolConfig) -> Result<Self> {
        let capability = driver.capability();
        let mut config = config;

        if let Some(max_connections) = driver.max_connections() {
            config.max_size = config.max_size.min(max_connections);
        }

        if config.max_size == 0 {
            return Err(err!("connection pool max_size must be at least 1"));
        }

        config.min_size = config.min_size.min(config.max_size);

        let inner = deadpool::managed::Pool::builder(Manager {
            driver: Box::new(driver),
        })
        .max_size(config.max_size)
        .runtime(deadpool::Runtime::Tokio1)
        .build()
        .map_err(Error::connection_pool)?;

        let pool = Self {
            inner,
            config,
            capability,
        };

        // Hold every warm connection at once so each one is newly opened.
        let mut warm = Vec::with_capacity(pool.config.min_size);
        for _ in 0..pool.config.min_size {
            warm.push(pool.inner.get().await.map_err(map_pool_error)?);
        }
        drop(warm);

        tracing::debug!(
            min_size = pool.config.min_size,
            max_size = pool.config.max_size,
            dialect = ?capability.dialect,
            "connection pool ready"
        );
        Ok(pool)
    }

    /// Retrieves a connection using the configured acquire timeout.
    pub async fn get(&self) -> Result<PoolConnection> {
        self.get_within(self.config.acquire_timeout).await
    }

    /// Retrieves a connection, waiting at most `timeout`. Fail-fast pools
    /// never wait.
    pub async fn get_within(&self, timeout: Option<Duration>) -> Result<PoolConnection> {
        let wait = match self.config.acquire {
            AcquireMode::Block => timeout,
            AcquireMode::FailFast => Some(Duration::ZERO),
        };

        let mut timeouts = Timeouts::new();
        timeouts.wait = wait;

        match self.inner.timeout_get(&timeouts).await {
            Ok(inner) => Ok(PoolConnection {
                inner,
                pool: self.inner.clone(),
                min_size: self.config.min_size,
            }),
            Err(PoolError::Timeout(TimeoutType::Wait)) => match self.config.acquire {
                AcquireMode::FailFast => Err(Error::pool_exhausted(self.config.max_size)),
                AcquireMode::Block => Err(Error::pool_timeout(wait.unwrap_or_default())),
            },
            Err(err) => Err(map_pool_error(err)),
        }
    }

    /// Returns a connection to the pool. Equivalent to dropping it.
    pub fn release(&self, connection: PoolConnection) {
        tracing::trace!(broken = connection.inner.broken, "releasing connection");
        drop(connection);
    }

    pub fn status(&self) -> PoolStatus {
        let status = self.inner.status();
        PoolStatus {
            size: status.size,
            available: status.available,
            max_size: status.max_size,
            waiting: status.waiting,
        }
    }

    /// Close the pool. Idle connections are dropped now, in-use connections
    /// when they are released, and further acquires fail.
    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Effective configuration, after clamping to driver limits.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Returns the database driver's capabilities.
    pub fn capability(&self) -> &'static Capability {
        self.capability
    }
}

fn map_pool_error(err: PoolError<Error>) -> Error {
    match err {
        PoolError::Backend(err) => err,
        PoolError::Closed => Error::connection_pool(err!("connection pool is closed")),
        err => Error::connection_pool(err),
    }
}

#[derive(Debug)]
struct Manager {
    driver: Box<dyn Driver>,
}

/// A pooled connection plus whether it can be handed out again.
#[derive(Debug)]
pub(crate) struct Pooled {
    connection: Box<dyn Connection>,
    broken: bool,
}

impl deadpool::managed::Manager for Manager {
    type Type = Pooled;
    type Error = Error;

    async fn create(&self) -> Result<Self::Type> {
        let connection = self.driver.connect().await?;
        tracing::debug!("opened database connection");
        Ok(Pooled {
            connection,
            broken: false,
        })
    }

    async fn recycle(&self, obj: &mut Self::Type, _metrics: &Metrics) -> RecycleResult<Self::Error> {
        if obj.broken {
            tracing::debug!("discarding broken connection");
            return Err(RecycleError::Backend(err!("connection is broken")));
        }

        if obj.connection.in_transaction() {
            tracing::debug!("rolling back transaction left open on returned connection");
            if let Err(err) = obj.connection.exec(Transaction::Rollback.into()).await {
                return Err(RecycleError::Backend(err));
            }
        }

        if !obj.connection.is_valid().await {
            tracing::debug!("discarding connection that failed its health check");
            return Err(RecycleError::Backend(err!("connection failed health check")));
        }

        Ok(())
    }
}

/// A connection retrieved from a pool.
///
/// When dropped, the connection is returned to the pool for reuse. A
/// connection marked broken is discarded instead and the pool is topped back
/// up to its minimum size in the background.
pub struct PoolConnection {
    inner: Object<Manager>,
    pool: deadpool::managed::Pool<Manager>,
    min_size: usize,
}

impl PoolConnection {
    /// Prevent this connection from being handed out again.
    pub fn mark_broken(&mut self) {
        self.inner.broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.inner.broken
    }
}

impl Deref for PoolConnection {
    type Target = Box<dyn Connection>;

    fn deref(&self) -> &Self::Target {
        &self.inner.connection
    }
}

impl DerefMut for PoolConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner.connection
    }
}

impl Drop for PoolConnection {
    fn drop(&mut self) {
        if self.inner.broken {
            replenish(self.pool.clone(), self.min_size);
        }
    }
}

impl fmt::Debug for PoolConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolConnection")
            .field("connection", &self.inner.connection)
            .field("broken", &self.inner.broken)
            .finish()
    }
}

/// Cycle idle connections through recycling, which drops broken ones, and
/// open new connections until the pool holds `min_size` again.
fn replenish(pool: deadpool::managed::Pool<Manager>, min_size: usize) {
    let Ok(handle) = tokio::runtime::Handle::try_current() else {
        return;
    };

    handle.spawn(async move {
        let mut timeouts = Timeouts::new();
        timeouts.wait = Some(Duration::ZERO);

        let mut held = vec![];
        loop {
            let status = pool.status();
            if status.available == 0 && status.size >= min_size {
                break;
            }

            match pool.timeout_get(&timeouts).await {
                Ok(connection) => held.push(connection),
                Err(err) => {
                    tracing::debug!(%err, "stopped replenishing connection pool");
                    break;
                }
            }
        }

        tracing::trace!(size = pool.status().size, "connection pool replenished");
    });
}
