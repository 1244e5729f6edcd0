use super::coerce;
use crate::{
    entity::AnyInstance,
    registry::{Registered, ResolvedRelation},
    relation::RelationSlot,
    session::{
        identity::{Entry, EntryState},
        state::SessionState,
    },
};

use async_recursion::async_recursion;
use indexmap::{IndexMap, IndexSet};
use jdorm_core::{
    schema::{LoadingPolicy, RelationKind},
    stmt::{Criteria, Key, Value, ValueRecord},
    Result,
};
use std::sync::Arc;

/// Turn rows of `registered` into managed instances, in row order.
///
/// Rows whose key is already managed resolve to the existing instance and
/// the row's values are ignored. Rows for instances deleted in this session
/// are skipped. Eager relations of newly constructed instances are loaded
/// with one query per relation.
#[async_recursion]
pub(crate) async fn hydrate(
    state: &mut SessionState,
    registered: &Arc<Registered>,
    rows: Vec<ValueRecord>,
) -> Result<Vec<AnyInstance>> {
    let descriptor = &registered.descriptor;
    let mut instances = Vec::with_capacity(rows.len());
    let mut constructed = vec![];

    for row in rows {
        let record = coerce::record(descriptor, row)?;
        let key = descriptor.key_of(&record);

        if let Some(entry) = state.identity.get(registered.type_id, &key) {
            if entry.state != EntryState::Deleted {
                instances.push(entry.instance.clone());
            }
            continue;
        }

        let instance = (registered.vtable.load)(record.clone())?;
        state.bind_relations(registered, &instance, &record)?;
        state.identity.insert(
            registered.type_id,
            key,
            Entry {
                instance: instance.clone(),
                state: EntryState::Persisted,
                snapshot: Some(record),
            },
        );

        constructed.push(instance.clone());
        instances.push(instance);
    }

    tracing::trace!(
        session = state.id,
        entity = %descriptor.name,
        rows = instances.len(),
        constructed = constructed.len(),
        "hydrated"
    );

    load_eager(state, registered, &constructed).await?;
    Ok(instances)
}

/// Resolve every eager relation of `instances`, one batched query per
/// relation.
async fn load_eager(
    state: &mut SessionState,
    registered: &Arc<Registered>,
    instances: &[AnyInstance],
) -> Result<()> {
    if instances.is_empty() {
        return Ok(());
    }

    for (index, relation) in registered.descriptor.relations.iter().enumerate() {
        if relation.loading != LoadingPolicy::Eager {
            continue;
        }

        let resolved = state.resolve_relation(registered, index)?;
        let mut waiting: Vec<(Arc<dyn RelationSlot>, Key)> = vec![];

        for instance in instances {
            let Some(slot) = (registered.vtable.relation)(instance, index)? else {
                continue;
            };

            if slot.is_resolved() {
                continue;
            }

            let record = (registered.vtable.record)(instance)?;
            let key = Key::from_vec(record.project(&resolved.source_fields));

            if key.has_null() {
                slot.resolve(vec![])?;
                continue;
            }

            waiting.push((slot, key));
        }

        if waiting.is_empty() {
            continue;
        }

        let keys = waiting.iter().map(|(_, key)| key.clone()).collect();
        let targets = fetch(state, &resolved, keys).await?;

        for (slot, key) in waiting {
            slot.resolve(targets.get(&key).cloned().unwrap_or_default())?;
        }

    }

    Ok(())
}

/// Load the targets of `relation` for each of `keys`, grouped by key.
///
/// Targets already managed by the session are reused without a query when
/// the relation points at the target's primary key. The remaining keys are
/// queried in bounded chunks.
pub(crate) async fn fetch(
    state: &mut SessionState,
    relation: &ResolvedRelation,
    keys: Vec<Key>,
) -> Result<IndexMap<Key, Vec<AnyInstance>>> {
    let target = &relation.target;
    let mut found: IndexMap<Key, Vec<AnyInstance>> = IndexMap::new();
    let mut missing: IndexSet<Key> = IndexSet::new();

    let by_primary_key = relation.kind == RelationKind::ManyToOne
        && relation.target_fields == target.descriptor.primary_key;

    for key in keys {
        if by_primary_key {
            if let Some(entry) = state.identity.get(target.type_id, &key) {
                if entry.state != EntryState::Deleted {
                    found.insert(key, vec![entry.instance.clone()]);
                }
                continue;
            }
        }
        missing.insert(key);
    }

    if missing.is_empty() {
        return Ok(found);
    }

    let size = chunk_size(state, relation);
    let missing: Vec<Key> = missing.into_iter().collect();

    for chunk in missing.chunks(size) {
        let wanted: IndexSet<&Key> = chunk.iter().collect();

        let mut criteria = Criteria::new();
        for (position, &field) in relation.target_fields.iter().enumerate() {
            let values: IndexSet<Value> = chunk
                .iter()
                .map(|key| key.values()[position].clone())
                .collect();
            criteria = criteria.is_in(target.descriptor.fields[field].name.clone(), values);
        }
        for &field in &target.descriptor.primary_key {
            criteria = criteria.order_by(target.descriptor.fields[field].name.clone());
        }

        let rows = state.select(target, &criteria).await?;
        let instances = hydrate(state, target, rows).await?;

        // With composite keys the per-column IN lists select a superset.
        for instance in instances {
            let record = (target.vtable.record)(&instance)?;
            let key = Key::from_vec(record.project(&relation.target_fields));
            if wanted.contains(&key) {
                found.entry(key).or_default().push(instance);
            }
        }
    }

    Ok(found)
}

/// Keys per relation query: the configured batch, capped so every key column
/// fits the driver's parameter limit.
fn chunk_size(state: &SessionState, relation: &ResolvedRelation) -> usize {
    let columns = relation.target_fields.len().max(1);
    let by_params = state.db.pool.capability().max_params / columns;

    state.db.config.relation_batch_size.min(by_params).max(1)
}
