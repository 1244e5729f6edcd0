use super::{
    identity::{EntryState, IdentityMap},
    SessionShared, Status,
};
use crate::{
    db::{PoolConnection, Shared},
    entity::AnyInstance,
    registry::{Registered, ResolvedRelation, Snapshot},
    relation::Binding,
    Entity,
};

use jdorm_core::{
    driver::{
        operation::{Operation, QuerySql, Transaction},
        Cancel, Response,
    },
    schema::RelationKind,
    stmt::{Criteria, Key, ValueRecord},
    Error, Result,
};
use jdorm_sql::{lower, StatementKind, TemplateKey};
use std::{
    any::TypeId,
    sync::{Arc, Weak},
};

/// A write staged for the next flush.
pub(crate) enum Pending {
    Insert { entity: TypeId, instance: AnyInstance },
    Update { entity: TypeId, key: Key },
    Delete { entity: TypeId, key: Key },
}

/// Everything a session owns, behind its lock.
pub(crate) struct SessionState {
    pub(crate) id: u64,
    pub(crate) me: Weak<SessionShared>,
    pub(crate) db: Arc<Shared>,
    pub(crate) status: Status,
    pub(crate) connection: Option<PoolConnection>,
    pub(crate) canceller: Option<Arc<dyn Cancel>>,
    pub(crate) registry: Arc<Snapshot>,
    pub(crate) identity: IdentityMap,
    pub(crate) pending: Vec<Pending>,

    /// Whether a flush has written anything in the open transaction.
    pub(crate) wrote: bool,
}

impl SessionState {
    pub(crate) fn ensure_open(&self) -> Result<()> {
        match self.status {
            Status::Open | Status::Pending => Ok(()),
            _ => Err(Error::session_closed()),
        }
    }

    pub(crate) fn refresh_status(&mut self) {
        if matches!(self.status, Status::Open | Status::Pending) {
            self.status = if self.pending.is_empty() && !self.wrote {
                Status::Open
            } else {
                Status::Pending
            };
        }
    }

    pub(crate) fn registered<T: Entity>(&mut self) -> Result<Arc<Registered>> {
        self.registered_by_type(TypeId::of::<T>())
            .map_err(|_| Error::unknown_type(T::NAME))
    }

    /// Look up an entity, picking up registrations made after the session
    /// opened.
    pub(crate) fn registered_by_type(&mut self, entity: TypeId) -> Result<Arc<Registered>> {
        if let Some(registered) = self.registry.get(entity) {
            return Ok(registered.clone());
        }

        self.registry = self.db.registry.snapshot();
        self.registry
            .get(entity)
            .cloned()
            .ok_or_else(|| Error::unknown_type(format!("{entity:?}")))
    }

    pub(crate) fn resolve_relation(
        &mut self,
        source: &Registered,
        index: usize,
    ) -> Result<ResolvedRelation> {
        match self.registry.resolve_relation(source, index) {
            Err(err) if err.is_unresolved_relationship() => {
                self.registry = self.db.registry.snapshot();
                self.registry.resolve_relation(source, index)
            }
            res => res,
        }
    }

    /// Run one statement on the session's connection.
    pub(crate) async fn exec(&mut self, query: QuerySql) -> Result<Response> {
        tracing::trace!(session = self.id, sql = %query.sql, params = query.params.len(), "exec");
        self.exec_op(query.into()).await
    }

    /// Run one operation, applying the query timeout.
    pub(crate) async fn exec_op(&mut self, op: Operation) -> Result<Response> {
        let timeout = self.db.config.query_timeout;
        let canceller = self.canceller.clone();

        let Some(connection) = self.connection.as_mut() else {
            return Err(Error::session_closed());
        };

        let res = match timeout {
            Some(limit) => match tokio::time::timeout(limit, connection.exec(op)).await {
                Ok(res) => res,
                Err(_) => {
                    if let Some(canceller) = &canceller {
                        canceller.cancel();
                    }
                    Err(Error::query_timeout(limit))
                }
            },
            None => connection.exec(op).await,
        };

        if let Err(err) = &res {
            self.after_failure(err);
        }

        res
    }

    /// Track connection and transaction loss after a failed statement.
    fn after_failure(&mut self, err: &Error) {
        let Some(connection) = self.connection.as_mut() else {
            return;
        };

        if err.is_connection_broken() {
            tracing::warn!(session = self.id, error = %err, "connection broken; transaction lost");
            connection.mark_broken();
            self.end(Status::RolledBack);
        } else if !connection.in_transaction() && !err.is_query_timeout() {
            tracing::debug!(session = self.id, error = %err, "database rolled back the transaction");
            self.end(Status::RolledBack);
        }
    }

    /// Select rows of `registered` matching `criteria`.
    pub(crate) async fn select(
        &mut self,
        registered: &Registered,
        criteria: &Criteria,
    ) -> Result<Vec<ValueRecord>> {
        let descriptor = &registered.descriptor;
        let (shape, params) = lower::lower(descriptor, criteria)?;

        let key = TemplateKey {
            kind: StatementKind::Select,
            entity: descriptor.name.clone(),
            shape,
        };

        let serializer = self.db.serializer;
        let template = self
            .db
            .templates
            .get_or_insert_with(key.clone(), || Ok(serializer.select(descriptor, &key.shape)))?;

        let query = template.query(None, &params)?;
        self.exec(query).await?.rows.into_values()
    }

    /// Attach every relation field of `instance` to this session so unloaded
    /// relations load on first access.
    pub(crate) fn bind_relations(
        &mut self,
        registered: &Registered,
        instance: &AnyInstance,
        record: &ValueRecord,
    ) -> Result<()> {
        for index in 0..registered.descriptor.relations.len() {
            let Some(slot) = (registered.vtable.relation)(instance, index)? else {
                continue;
            };

            if slot.is_resolved() {
                continue;
            }

            let resolved = self.resolve_relation(registered, index)?;
            let key = Key::from_vec(record.project(&resolved.source_fields));

            if key.has_null() {
                if resolved.kind == RelationKind::ManyToOne {
                    slot.resolve(vec![])?;
                }
                continue;
            }

            slot.bind(Binding {
                session: self.me.clone(),
                entity: registered.type_id,
                relation: index,
                key,
            });
        }

        Ok(())
    }

    /// Roll back the open transaction.
    pub(crate) async fn rollback_transaction(&mut self) {
        if self.connection.is_none() {
            return;
        }

        let res = match self.connection.as_mut() {
            Some(connection) if connection.in_transaction() => {
                connection.exec(Transaction::Rollback.into()).await.map(drop)
            }
            _ => Ok(()),
        };

        if let Err(err) = res {
            tracing::warn!(session = self.id, error = %err, "rollback failed; discarding connection");
            if let Some(connection) = self.connection.as_mut() {
                connection.mark_broken();
            }
        }

        self.end(Status::RolledBack);
    }

    /// Finish the unit of work: forget managed instances and return the
    /// connection to the pool.
    pub(crate) fn end(&mut self, status: Status) {
        self.status = status;
        self.pending.clear();
        self.identity.clear();
        self.wrote = false;
        self.canceller = None;

        if let Some(connection) = self.connection.take() {
            self.db.pool.release(connection);
        }

        tracing::debug!(session = self.id, ?status, "session ended");
    }

    /// Key an instance is managed under, if any.
    pub(crate) fn managed_key(&self, instance: &AnyInstance) -> Option<(TypeId, Key, EntryState)> {
        let (entity, key) = self.identity.find(instance)?;
        let state = self.identity.get(entity, &key)?.state;
        Some((entity, key, state))
    }
}
