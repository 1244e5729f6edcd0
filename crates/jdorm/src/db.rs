mod builder;
mod config;
mod connect;
mod pool;

pub use builder::Builder;
pub use config::Config;
pub use connect::*;
pub use pool::*;

use crate::{registry::Registry, Entity, Result, Session};

use jdorm_core::schema::EntityDescriptor;
use jdorm_sql::{Serializer, TemplateCache};
use std::{
    sync::{atomic::AtomicU64, Arc},
    time::Duration,
};

/// Shared state between all `Db` clones.
pub(crate) struct Shared {
    pub(crate) config: Config,
    pub(crate) registry: Registry,
    pub(crate) pool: Pool,
    pub(crate) templates: TemplateCache,
    pub(crate) serializer: Serializer,
    pub(crate) next_session: AtomicU64,
}

/// A database handle: the registry, the connection pool, and the statement
/// cache. Cheap to clone; every clone shares the same state.
#[derive(Clone)]
pub struct Db {
    pub(crate) shared: Arc<Shared>,
}

impl Db {
    pub fn builder() -> Builder {
        Builder::default()
    }

    /// Open a session, waiting up to the pool's acquire timeout for a
    /// connection.
    pub async fn open(&self) -> Result<Session> {
        Session::open(self.shared.clone(), self.shared.config.pool.acquire_timeout).await
    }

    /// Open a session, waiting at most `timeout` for a connection.
    pub async fn open_with_timeout(&self, timeout: Duration) -> Result<Session> {
        Session::open(self.shared.clone(), Some(timeout)).await
    }

    /// Register an entity type after the database was built.
    pub fn register<T: Entity>(&self) -> Result<Arc<EntityDescriptor>> {
        self.shared.registry.register::<T>()
    }

    pub fn describe<T: Entity>(&self) -> Result<Arc<EntityDescriptor>> {
        self.shared.registry.describe::<T>()
    }

    pub fn registry(&self) -> &Registry {
        &self.shared.registry
    }

    pub fn pool(&self) -> &Pool {
        &self.shared.pool
    }

    pub fn statement_cache(&self) -> &TemplateCache {
        &self.shared.templates
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn serializer(&self) -> Serializer {
        self.shared.serializer
    }

    /// Create a table for every registered entity that does not have one.
    pub async fn push_schema(&self) -> Result<()> {
        let snapshot = self.shared.registry.snapshot();
        let mut connection = self.shared.pool.get().await?;

        for registered in snapshot.entities() {
            tracing::debug!(table = %registered.descriptor.table, "creating table");
            let query = registered.templates.create_table.query(None, &[])?;
            connection.exec(query.into()).await?;
        }

        Ok(())
    }

    /// Close the pool and drop cached statements. Sessions already open keep
    /// their connection until they end.
    pub fn shutdown(&self) {
        tracing::debug!("shutting down");
        self.shared.pool.close();
        self.shared.templates.clear();
    }
}

impl std::fmt::Debug for Db {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Db")
            .field("pool", &self.shared.pool.status())
            .field("entities", &self.shared.registry.descriptors().len())
            .finish()
    }
}
