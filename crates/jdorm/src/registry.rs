use crate::{entity::VTable, Entity};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use jdorm_core::{
    schema::{EntityDescriptor, FieldDecl, LoadingPolicy, Mapping, RelationDecl, RelationKind},
    Error, Result,
};
use jdorm_sql::{lower, Serializer, Template};
use parking_lot::Mutex;
use std::{any::TypeId, collections::HashMap, sync::Arc};

/// Catalog of entity descriptors.
///
/// Registration is serialized; lookups load the published snapshot without
/// taking a lock.
#[derive(Debug)]
pub struct Registry {
    snapshot: ArcSwap<Snapshot>,
    write: Mutex<()>,
    serializer: Serializer,
    default_loading: LoadingPolicy,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct Snapshot {
    by_type: HashMap<TypeId, Arc<Registered>>,

    /// In registration order.
    by_name: IndexMap<String, Arc<Registered>>,
}

/// A registered entity with everything needed to persist it.
pub(crate) struct Registered {
    pub(crate) type_id: TypeId,
    pub(crate) descriptor: Arc<EntityDescriptor>,
    pub(crate) vtable: VTable,
    pub(crate) templates: Templates,
}

/// Statements built once at registration.
#[derive(Debug)]
pub(crate) struct Templates {
    pub(crate) insert: Template,
    pub(crate) update: Option<Template>,
    pub(crate) delete: Template,
    pub(crate) by_key: Template,
    pub(crate) create_table: Template,
}

/// A relation with both ends located.
#[derive(Debug)]
pub(crate) struct ResolvedRelation {
    pub(crate) kind: RelationKind,
    pub(crate) target: Arc<Registered>,

    /// Fields on the declaring entity whose values identify the targets.
    pub(crate) source_fields: Vec<usize>,

    /// Fields on the target matched against `source_fields`, position by
    /// position.
    pub(crate) target_fields: Vec<usize>,
}

impl Registry {
    pub(crate) fn new(serializer: Serializer, default_loading: LoadingPolicy) -> Registry {
        Registry {
            snapshot: ArcSwap::default(),
            write: Mutex::new(()),
            serializer,
            default_loading,
        }
    }

    /// Register `T` using its derived mapping.
    pub fn register<T: Entity>(&self) -> Result<Arc<EntityDescriptor>> {
        self.register_mapping::<T>(T::mapping())
    }

    /// Register `T` with an explicit mapping.
    ///
    /// The mapping may rename the table and columns and choose loading
    /// policies, but its fields and relations must match `T` in order, type
    /// and nullability.
    ///
    /// Registering an identical mapping again returns the existing
    /// descriptor. A different mapping for the same type or name fails with
    /// a mapping conflict.
    pub fn register_mapping<T: Entity>(&self, mapping: Mapping) -> Result<Arc<EntityDescriptor>> {
        let descriptor = EntityDescriptor::from_mapping(mapping.clone(), self.default_loading)?;

        if descriptor.name != T::NAME {
            return Err(Error::mapping(
                T::NAME,
                format!("mapping is named `{}`", descriptor.name),
            ));
        }

        check_layout(&mapping, &T::mapping())?;

        let _write = self.write.lock();
        let current = self.snapshot();
        let type_id = TypeId::of::<T>();

        if let Some(existing) = current.by_type.get(&type_id) {
            return if *existing.descriptor == descriptor {
                Ok(existing.descriptor.clone())
            } else {
                Err(Error::mapping_conflict(&descriptor.name))
            };
        }

        if current.by_name.contains_key(&descriptor.name) {
            return Err(Error::mapping_conflict(&descriptor.name));
        }

        let templates = Templates {
            insert: self.serializer.insert(&descriptor)?,
            update: self.serializer.update(&descriptor),
            delete: self.serializer.delete(&descriptor),
            by_key: self.serializer.select(&descriptor, &lower::by_key(&descriptor)),
            create_table: self.serializer.create_table(&descriptor),
        };

        let descriptor = Arc::new(descriptor);
        let registered = Arc::new(Registered {
            type_id,
            descriptor: descriptor.clone(),
            vtable: VTable::of::<T>(),
            templates,
        });

        let mut next = Snapshot::clone(&current);
        next.by_type.insert(type_id, registered.clone());
        next.by_name.insert(descriptor.name.clone(), registered);
        self.snapshot.store(Arc::new(next));

        tracing::debug!(entity = %descriptor.name, table = %descriptor.table, "registered entity");
        Ok(descriptor)
    }

    /// Descriptor of a registered type.
    pub fn describe<T: Entity>(&self) -> Result<Arc<EntityDescriptor>> {
        self.snapshot()
            .by_type
            .get(&TypeId::of::<T>())
            .map(|registered| registered.descriptor.clone())
            .ok_or_else(|| Error::unknown_type(T::NAME))
    }

    /// Descriptor of a registered entity, by name.
    pub fn describe_name(&self, name: &str) -> Result<Arc<EntityDescriptor>> {
        self.snapshot()
            .by_name
            .get(name)
            .map(|registered| registered.descriptor.clone())
            .ok_or_else(|| Error::unknown_type(name))
    }

    /// Descriptors of every registered entity, in registration order.
    pub fn descriptors(&self) -> Vec<Arc<EntityDescriptor>> {
        self.snapshot()
            .by_name
            .values()
            .map(|registered| registered.descriptor.clone())
            .collect()
    }

    /// Check that every declared relation resolves.
    pub fn verify(&self) -> Result<()> {
        let snapshot = self.snapshot();
        for registered in snapshot.by_name.values() {
            for index in 0..registered.descriptor.relations.len() {
                snapshot.resolve_relation(registered, index)?;
            }
        }
        Ok(())
    }

    pub(crate) fn snapshot(&self) -> Arc<Snapshot> {
        self.snapshot.load_full()
    }
}

/// Records are read and written by position, so an explicit mapping has to
/// line up with the layout the type was derived with.
fn check_layout(mapping: &Mapping, derived: &Mapping) -> Result<()> {
    let fail = |message: String| Err(Error::mapping(&mapping.name, message));

    if mapping.fields.len() != derived.fields.len() {
        return fail(format!(
            "mapping declares {} fields; the type has {}",
            mapping.fields.len(),
            derived.fields.len()
        ));
    }

    for (position, (field, expected)) in mapping.fields.iter().zip(&derived.fields).enumerate() {
        if !same_field(field, expected) {
            return fail(format!(
                "field {position} is declared as `{}`; the type stores `{}` there",
                describe_field(field),
                describe_field(expected),
            ));
        }
    }

    if mapping.relations.len() != derived.relations.len()
        || !mapping.relations.iter().zip(&derived.relations).all(|(a, b)| same_relation(a, b))
    {
        return fail("relations do not match the type's relation fields".to_string());
    }

    Ok(())
}

fn same_field(field: &FieldDecl, expected: &FieldDecl) -> bool {
    field.name == expected.name
        && field.ty == expected.ty
        && field.nullable == expected.nullable
        && field.primary_key == expected.primary_key
        && field.generated == expected.generated
}

fn describe_field(field: &FieldDecl) -> String {
    let nullable = if field.nullable { "?" } else { "" };
    format!("{}: {}{nullable}", field.name, field.ty)
}

fn same_relation(relation: &RelationDecl, expected: &RelationDecl) -> bool {
    relation.name == expected.name
        && relation.kind == expected.kind
        && relation.target == expected.target
        && relation.foreign_key == expected.foreign_key
        && relation.pair == expected.pair
}

impl Snapshot {
    pub(crate) fn get(&self, type_id: TypeId) -> Option<&Arc<Registered>> {
        self.by_type.get(&type_id)
    }

    pub(crate) fn entities(&self) -> impl Iterator<Item = &Arc<Registered>> {
        self.by_name.values()
    }

    /// Locate both ends of relation `index` of `source`.
    pub(crate) fn resolve_relation(
        &self,
        source: &Registered,
        index: usize,
    ) -> Result<ResolvedRelation> {
        let descriptor = &source.descriptor;
        let relation = &descriptor.relations[index];

        let Some(target) = self.by_name.get(&relation.target) else {
            return Err(Error::unresolved_relationship(
                &descriptor.name,
                &relation.name,
                &relation.target,
            ));
        };

        let fail = |message: String| Error::mapping(&descriptor.name, message);

        match relation.kind {
            RelationKind::ManyToOne => {
                let mut target_fields = Vec::with_capacity(relation.foreign_key.len());
                for fk in &relation.foreign_key {
                    let Some(index) = target.descriptor.field_index(&fk.target) else {
                        return Err(fail(format!(
                            "relation `{}` references unknown field `{}.{}`",
                            relation.name, relation.target, fk.target
                        )));
                    };
                    target_fields.push(index);
                }

                Ok(ResolvedRelation {
                    kind: relation.kind,
                    target: target.clone(),
                    source_fields: relation.foreign_key.iter().map(|fk| fk.source).collect(),
                    target_fields,
                })
            }
            RelationKind::OneToMany | RelationKind::OneToOne => {
                let candidates: Vec<_> = target
                    .descriptor
                    .relations
                    .iter()
                    .filter(|pair| pair.kind == RelationKind::ManyToOne)
                    .filter(|pair| pair.target == descriptor.name)
                    .filter(|pair| relation.pair.as_ref().map_or(true, |name| *name == pair.name))
                    .collect();

                let pair = match candidates[..] {
                    [pair] => pair,
                    [] => {
                        return Err(fail(format!(
                            "relation `{}` has no matching belongs-to relation on `{}`",
                            relation.name, relation.target
                        )))
                    }
                    _ => {
                        return Err(fail(format!(
                            "relation `{}` is ambiguous; name its pair on `{}`",
                            relation.name, relation.target
                        )))
                    }
                };

                let mut source_fields = Vec::with_capacity(pair.foreign_key.len());
                for fk in &pair.foreign_key {
                    let Some(index) = descriptor.field_index(&fk.target) else {
                        return Err(fail(format!(
                            "relation `{}` pairs with `{}.{}`, which references unknown field `{}`",
                            relation.name, relation.target, pair.name, fk.target
                        )));
                    };
                    source_fields.push(index);
                }

                Ok(ResolvedRelation {
                    kind: relation.kind,
                    target: target.clone(),
                    source_fields,
                    target_fields: pair.foreign_key.iter().map(|fk| fk.source).collect(),
                })
            }
            RelationKind::ManyToMany => Err(fail(format!(
                "relation `{}`: many-to-many relations are not supported",
                relation.name
            ))),
        }
    }
}

impl std::fmt::Debug for Registered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registered")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
