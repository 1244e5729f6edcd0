use super::{
    identity::{Entry, EntryState},
    state::{Pending, SessionState},
};
use crate::{engine::coerce, entity::AnyInstance};

use jdorm_core::{err, stmt::Key, Error, Result};
use std::{any::TypeId, collections::HashSet};

impl SessionState {
    /// Write staged inserts, updates, and deletes in the order they were
    /// staged, then update every managed instance whose fields changed since
    /// it was loaded.
    pub(crate) async fn flush(&mut self) -> Result<()> {
        let pending = std::mem::take(&mut self.pending);
        let mut written = HashSet::new();

        if !pending.is_empty() {
            tracing::debug!(session = self.id, ops = pending.len(), "flushing staged writes");
        }

        for op in pending {
            match op {
                Pending::Insert { entity, instance } => {
                    self.flush_insert(entity, instance).await?;
                }
                Pending::Update { entity, key } => {
                    self.flush_update(entity, &key).await?;
                    written.insert((entity, key));
                }
                Pending::Delete { entity, key } => {
                    self.flush_delete(entity, &key).await?;
                }
            }
            self.wrote = true;
        }

        for (entity, key) in self.dirty(&written)? {
            self.flush_update(entity, &key).await?;
            self.wrote = true;
        }

        self.refresh_status();
        Ok(())
    }

    async fn flush_insert(&mut self, entity: TypeId, instance: AnyInstance) -> Result<()> {
        let registered = self.registered_by_type(entity)?;
        let descriptor = &registered.descriptor;
        let template = &registered.templates.insert;

        let mut record = (registered.vtable.record)(&instance)?;
        let response = self.exec(template.query(Some(&record), &[])?).await?;

        if !template.returning.is_empty() {
            let Some(row) = response.rows.into_values()?.into_iter().next() else {
                return Err(err!("insert into `{}` returned no generated key", descriptor.table));
            };

            for (value, &field) in row.into_iter().zip(&template.returning) {
                let value = coerce::value_for(value, &descriptor.fields[field])?;
                (registered.vtable.assign)(&instance, field, value.clone())?;
                record[field] = value;
            }
        }

        let key = descriptor.key_of(&record);
        tracing::trace!(session = self.id, entity = %descriptor.name, %key, "inserted");

        self.identity.insert(
            entity,
            key,
            Entry {
                instance: instance.clone(),
                state: EntryState::Persisted,
                snapshot: Some(record.clone()),
            },
        );

        self.bind_relations(&registered, &instance, &record)
    }

    async fn flush_update(&mut self, entity: TypeId, key: &Key) -> Result<()> {
        let registered = self.registered_by_type(entity)?;
        let descriptor = &registered.descriptor;

        let Some(instance) = self.identity.live(entity, key).cloned() else {
            return Ok(());
        };

        let record = (registered.vtable.record)(&instance)?;
        if descriptor.key_of(&record) != *key {
            return Err(err!(
                "primary key of `{}` {} was modified; keys cannot change",
                descriptor.name,
                key
            ));
        }

        if let Some(template) = &registered.templates.update {
            let response = self.exec(template.query(Some(&record), &[])?).await?;

            if response.rows.count() == 0 {
                return Err(Error::record_not_found(format!(
                    "update of `{}` {key}",
                    descriptor.name
                )));
            }
        }

        if let Some(entry) = self.identity.get_mut(entity, key) {
            entry.snapshot = Some(record);
        }

        Ok(())
    }

    async fn flush_delete(&mut self, entity: TypeId, key: &Key) -> Result<()> {
        let registered = self.registered_by_type(entity)?;
        let template = &registered.templates.delete;

        let response = self.exec(template.query(None, key.values())?).await?;
        if response.rows.count() == 0 {
            return Err(Error::record_not_found(format!(
                "delete of `{}` {key}",
                registered.descriptor.name
            )));
        }

        self.identity.remove(entity, key);
        Ok(())
    }

    /// Persisted instances whose current fields differ from their snapshot.
    fn dirty(&mut self, written: &HashSet<(TypeId, Key)>) -> Result<Vec<(TypeId, Key)>> {
        let mut candidates = vec![];
        for ((entity, key), entry) in self.identity.persisted() {
            if !written.contains(&(*entity, key.clone())) {
                candidates.push((*entity, key.clone(), entry.instance.clone(), entry.snapshot.clone()));
            }
        }

        let mut dirty = vec![];
        for (entity, key, instance, snapshot) in candidates {
            let registered = self.registered_by_type(entity)?;
            let record = (registered.vtable.record)(&instance)?;

            if snapshot.as_ref() != Some(&record) {
                dirty.push((entity, key));
            }
        }

        Ok(dirty)
    }
}
