pub(crate) mod flush;
pub(crate) mod identity;
pub(crate) mod state;

use identity::{Entry, EntryState};
use state::{Pending, SessionState};

use crate::{
    db::Shared,
    engine::hydrate,
    entity::AnyInstance,
    registry::Registered,
    relation::Binding,
    Cursor, Entity, Instance,
};

use jdorm_core::{
    driver::{operation::Transaction, Cancel},
    err,
    stmt::{Criteria, Key, ValueRecord},
    Error, Result,
};
use std::{
    any::TypeId,
    fmt,
    sync::{atomic::Ordering, Arc},
    time::Duration,
};
use tokio::sync::{Mutex, MutexGuard};

/// A unit of work bound to one pooled connection and one transaction.
///
/// A session tracks every instance it loads or saves in an identity map:
/// within one session each row maps to exactly one [`Instance`]. Writes are
/// staged and reach the database on [`flush`](Session::flush) or
/// [`commit`](Session::commit).
///
/// A session serves one task at a time. Calling into it while another call
/// is in progress fails with a concurrent-session-access error rather than
/// waiting.
pub struct Session {
    shared: Arc<SessionShared>,
}

pub(crate) struct SessionShared {
    id: u64,
    canceller: Option<Arc<dyn Cancel>>,
    state: Mutex<SessionState>,
}

/// Lifecycle of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Transaction open, nothing written or staged.
    Open,

    /// Writes are staged or flushed but not committed.
    Pending,

    Committed,

    RolledBack,

    /// Closed by the caller.
    Closed,
}

/// Aborts the statement a session is currently running, from any task.
#[derive(Clone)]
pub struct CancelHandle {
    session: u64,
    canceller: Option<Arc<dyn Cancel>>,
}

impl CancelHandle {
    /// Request cancellation. Returns `false` when the driver cannot cancel
    /// statements.
    pub fn cancel(&self) -> bool {
        match &self.canceller {
            Some(canceller) => {
                tracing::debug!(session = self.session, "cancelling in-flight statement");
                canceller.cancel();
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelHandle")
            .field("session", &self.session)
            .field("supported", &self.canceller.is_some())
            .finish()
    }
}

impl Session {
    pub(crate) async fn open(db: Arc<Shared>, timeout: Option<Duration>) -> Result<Session> {
        let mut connection = db
            .pool
            .get_within(timeout)
            .await
            .map_err(|e| e.context(err!("opening session")))?;

        if let Err(e) = connection.exec(Transaction::Start.into()).await {
            if e.is_connection_broken() {
                connection.mark_broken();
            }
            return Err(e.context(err!("opening session")));
        }

        let id = db.next_session.fetch_add(1, Ordering::Relaxed);
        let canceller = connection.canceller();
        let registry = db.registry.snapshot();

        let shared = Arc::new_cyclic(|me| SessionShared {
            id,
            canceller: canceller.clone(),
            state: Mutex::new(SessionState {
                id,
                me: me.clone(),
                db,
                status: Status::Open,
                connection: Some(connection),
                canceller,
                registry,
                identity: Default::default(),
                pending: vec![],
                wrote: false,
            }),
        });

        tracing::debug!(session = id, "session opened");
        Ok(Session { shared })
    }

    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// Stage an entity for persistence and return its managed handle.
    ///
    /// If an instance with the same key is already managed, its contents are
    /// replaced and that handle is returned. Entities with a database
    /// generated key are always inserted; the key is assigned at flush.
    pub async fn save<T: Entity>(&self, entity: T) -> Result<Instance<T>> {
        let mut state = self.shared.lock()?;
        let registered = state.registered::<T>()?;
        let type_id = registered.type_id;
        let record = entity.to_record();

        if registered.descriptor.has_generated_key() {
            let instance = Instance::new(entity);
            state.pending.push(Pending::Insert {
                entity: type_id,
                instance: instance.clone().into_any(),
            });
            state.refresh_status();
            return Ok(instance);
        }

        let key = registered.descriptor.key_of(&record);

        match state.identity.get(type_id, &key).map(|entry| (entry.state, entry.instance.clone())) {
            Some((EntryState::Deleted, _)) => {
                state.identity.remove(type_id, &key);
            }
            Some((entry_state, any)) => {
                let existing = Instance::<T>::from_any(any.clone())?;
                *existing.write() = entity;

                if entry_state == EntryState::Persisted {
                    stage_update(&mut state, type_id, key);
                }

                state.bind_relations(&registered, &any, &record)?;
                state.refresh_status();
                return Ok(existing);
            }
            None => {}
        }

        let instance = Instance::new(entity);
        let any = instance.clone().into_any();

        state.identity.insert(
            type_id,
            key,
            Entry {
                instance: any.clone(),
                state: EntryState::New,
                snapshot: None,
            },
        );
        state.pending.push(Pending::Insert {
            entity: type_id,
            instance: any.clone(),
        });
        state.bind_relations(&registered, &any, &record)?;
        state.refresh_status();

        Ok(instance)
    }

    /// Stage the current contents of a managed instance for update.
    ///
    /// An instance from another session is attached to this one and updated
    /// at flush; if its row no longer exists the flush fails with a
    /// record-not-found error.
    pub async fn save_instance<T: Entity>(&self, instance: &Instance<T>) -> Result<()> {
        let mut state = self.shared.lock()?;
        let registered = state.registered::<T>()?;
        let any = instance.clone().into_any();

        match state.managed_key(&any) {
            Some((type_id, key, EntryState::Persisted)) => stage_update(&mut state, type_id, key),
            Some((_, _, EntryState::New)) => {}
            Some((_, key, EntryState::Deleted)) => {
                return Err(err!("`{}` {key} was deleted in this session", T::NAME));
            }
            None if is_staged_insert(&state, &any) => {}
            None => {
                let record = instance.read().to_record();
                let key = registered.descriptor.key_of(&record);

                if state.identity.live(registered.type_id, &key).is_some() {
                    return Err(err!(
                        "another `{}` instance with key {key} is already managed by this session",
                        T::NAME
                    ));
                }

                state.identity.insert(
                    registered.type_id,
                    key.clone(),
                    Entry {
                        instance: any.clone(),
                        state: EntryState::Persisted,
                        snapshot: None,
                    },
                );
                stage_update(&mut state, registered.type_id, key);
                state.bind_relations(&registered, &any, &record)?;
            }
        }

        state.refresh_status();
        Ok(())
    }

    /// Stage a managed instance for deletion. Later lookups in this session
    /// no longer return it.
    pub async fn delete<T: Entity>(&self, instance: &Instance<T>) -> Result<()> {
        let mut state = self.shared.lock()?;
        let registered = state.registered::<T>()?;
        let any = instance.clone().into_any();

        let managed = match state.managed_key(&any) {
            Some(managed) => Some(managed),
            None if is_staged_insert(&state, &any) => None,
            None => {
                // Unmanaged: act on the row its key names.
                let key = registered.descriptor.key_of(&instance.read().to_record());
                match state.identity.get(registered.type_id, &key) {
                    Some(entry) => Some((registered.type_id, key, entry.state)),
                    None => {
                        state.identity.insert(
                            registered.type_id,
                            key.clone(),
                            Entry {
                                instance: any.clone(),
                                state: EntryState::Persisted,
                                snapshot: None,
                            },
                        );
                        Some((registered.type_id, key, EntryState::Persisted))
                    }
                }
            }
        };

        match managed {
            Some((type_id, key, EntryState::Persisted)) => {
                state.pending.retain(|op| {
                    !matches!(op, Pending::Update { entity, key: k } if *entity == type_id && *k == key)
                });
                if let Some(entry) = state.identity.get_mut(type_id, &key) {
                    entry.state = EntryState::Deleted;
                }
                state.pending.push(Pending::Delete {
                    entity: type_id,
                    key,
                });
            }
            Some((type_id, key, EntryState::New)) => {
                if let Some(entry) = state.identity.remove(type_id, &key) {
                    unstage_insert(&mut state, &entry.instance);
                }
            }
            Some((_, _, EntryState::Deleted)) => {}
            None => unstage_insert(&mut state, &any),
        }

        state.refresh_status();
        Ok(())
    }

    /// Look up an instance by primary key.
    ///
    /// Returns the managed instance without a query when the key is already
    /// in the identity map. Instances deleted in this session are not found.
    pub async fn find<T: Entity>(&self, key: impl Into<Key>) -> Result<Option<Instance<T>>> {
        let key = key.into();
        let mut state = self.shared.lock()?;
        let registered = state.registered::<T>()?;

        if key.len() != registered.descriptor.primary_key.len() {
            return Err(Error::unsupported_criteria(format!(
                "`{}` has a {}-field primary key; got {} values",
                T::NAME,
                registered.descriptor.primary_key.len(),
                key.len()
            )));
        }

        if let Some(entry) = state.identity.get(registered.type_id, &key) {
            return match entry.state {
                EntryState::Deleted => Ok(None),
                _ => Instance::from_any(entry.instance.clone()).map(Some),
            };
        }

        if key.has_null() {
            return Ok(None);
        }

        let query = registered.templates.by_key.query(None, key.values())?;
        let rows = state.exec(query).await?.rows.into_values()?;
        let instances = hydrate::hydrate(&mut state, &registered, rows).await?;

        instances.into_iter().next().map(Instance::from_any).transpose()
    }

    /// Run a query. Rows are fetched now and turned into instances as the
    /// cursor advances.
    pub async fn query<T: Entity>(&self, criteria: Criteria) -> Result<Cursor<T>> {
        let mut state = self.shared.lock()?;
        let registered = state.registered::<T>()?;
        let rows = state.select(&registered, &criteria).await?;
        let batch = state.db.config.hydrate_batch_size;

        Ok(Cursor::new(Arc::downgrade(&self.shared), registered, rows, batch))
    }

    /// First instance matching `criteria`.
    pub async fn first<T: Entity>(&self, criteria: Criteria) -> Result<Option<Instance<T>>> {
        self.query::<T>(criteria.limit(1)).await?.next().await.transpose()
    }

    /// Every instance of `T`.
    pub async fn all<T: Entity>(&self) -> Result<Vec<Instance<T>>> {
        self.query::<T>(Criteria::all()).await?.collect().await
    }

    /// Write staged changes without committing. On failure the transaction
    /// is rolled back and the session ends.
    pub async fn flush(&self) -> Result<()> {
        let mut state = self.shared.lock()?;

        if let Err(e) = state.flush().await {
            state.rollback_transaction().await;
            return Err(e);
        }

        Ok(())
    }

    /// Flush and commit, ending the session.
    pub async fn commit(&self) -> Result<()> {
        let mut state = self.shared.lock()?;

        if let Err(e) = state.flush().await {
            state.rollback_transaction().await;
            return Err(e);
        }

        if let Err(e) = state.exec_op(Transaction::Commit.into()).await {
            state.rollback_transaction().await;
            return Err(e);
        }

        state.end(Status::Committed);
        Ok(())
    }

    /// Discard staged and flushed changes, ending the session.
    pub async fn rollback(&self) -> Result<()> {
        let mut state = self.shared.lock()?;
        state.rollback_transaction().await;
        Ok(())
    }

    /// End the session, rolling back anything uncommitted. Closing twice is
    /// a no-op.
    pub async fn close(&self) -> Result<()> {
        let mut state = self.shared.try_lock()?;

        if state.ensure_open().is_ok() {
            state.rollback_transaction().await;
        }

        if state.status != Status::Closed {
            state.end(Status::Closed);
        }

        Ok(())
    }

    pub fn status(&self) -> Result<Status> {
        Ok(self.shared.try_lock()?.status)
    }

    /// Number of instances in the identity map.
    pub fn managed(&self) -> Result<usize> {
        Ok(self.shared.try_lock()?.identity.len())
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            session: self.shared.id,
            canceller: self.shared.canceller.clone(),
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").field("id", &self.shared.id).finish()
    }
}

impl SessionShared {
    fn try_lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        self.state
            .try_lock()
            .map_err(|_| Error::concurrent_session_access())
    }

    /// Lock for an operation that needs an open transaction.
    fn lock(&self) -> Result<MutexGuard<'_, SessionState>> {
        let state = self.try_lock()?;
        state.ensure_open()?;
        Ok(state)
    }

    pub(crate) async fn hydrate(
        &self,
        registered: &Arc<Registered>,
        rows: Vec<ValueRecord>,
    ) -> Result<Vec<AnyInstance>> {
        let mut state = self.lock()?;
        hydrate::hydrate(&mut state, registered, rows).await
    }

    pub(crate) async fn load_relation(&self, binding: &Binding) -> Result<Vec<AnyInstance>> {
        let mut state = self.lock()?;
        let registered = state.registered_by_type(binding.entity)?;
        let resolved = state.resolve_relation(&registered, binding.relation)?;
        let mut targets = hydrate::fetch(&mut state, &resolved, vec![binding.key.clone()]).await?;
        Ok(targets.shift_remove(&binding.key).unwrap_or_default())
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        if self.connection.is_some() {
            tracing::debug!(session = self.id, "session dropped while open; rolling back");
        }
    }
}

fn stage_update(state: &mut SessionState, type_id: TypeId, key: Key) {
    let staged = state
        .pending
        .iter()
        .any(|op| matches!(op, Pending::Update { entity, key: k } if *entity == type_id && *k == key));

    if !staged {
        state.pending.push(Pending::Update {
            entity: type_id,
            key,
        });
    }
}

fn is_staged_insert(state: &SessionState, any: &AnyInstance) -> bool {
    state
        .pending
        .iter()
        .any(|op| matches!(op, Pending::Insert { instance, .. } if Arc::ptr_eq(instance, any)))
}

fn unstage_insert(state: &mut SessionState, any: &AnyInstance) {
    state
        .pending
        .retain(|op| !matches!(op, Pending::Insert { instance, .. } if Arc::ptr_eq(instance, any)));
}
