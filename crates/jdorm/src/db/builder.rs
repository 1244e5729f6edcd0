use super::{Config, Connect, Db, Pool, Shared};
use crate::{registry::Registry, Entity, Result};

use jdorm_core::{driver::Driver, schema::EntityDescriptor};
use jdorm_sql::{Serializer, TemplateCache};
use std::sync::{atomic::AtomicU64, Arc};

type Registration = fn(&Registry) -> Result<Arc<EntityDescriptor>>;

#[derive(Default)]
pub struct Builder {
    config: Config,

    /// Entities to register once the registry exists, in call order.
    entities: Vec<Registration>,
}

impl Builder {
    pub fn register<T: Entity>(&mut self) -> &mut Self {
        self.entities.push(Registry::register::<T>);
        self
    }

    pub fn config(&mut self, config: Config) -> &mut Self {
        self.config = config;
        self
    }

    /// Build a database on top of `driver`. Fails if any registered mapping
    /// is invalid or the pool cannot open its minimum connections.
    pub async fn build(&mut self, driver: impl Driver) -> Result<Db> {
        let config = self.config.clone();
        let pool = Pool::new(driver, config.pool.clone()).await?;
        let serializer = Serializer::for_capability(pool.capability());
        let registry = Registry::new(serializer, config.default_loading);

        for register in &self.entities {
            register(&registry)?;
        }

        Ok(Db {
            shared: Arc::new(Shared {
                templates: TemplateCache::new(config.statement_cache_size),
                config,
                registry,
                pool,
                serializer,
                next_session: AtomicU64::new(1),
            }),
        })
    }

    /// Build a database for a connection URL, e.g. `sqlite::memory:`.
    pub async fn connect(&mut self, url: &str) -> Result<Db> {
        self.build(Connect::new(url)?).await
    }
}
