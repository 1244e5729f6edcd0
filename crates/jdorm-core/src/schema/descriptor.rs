use super::{LoadingPolicy, Mapping, RelationKind};
use crate::stmt::{Key, Type, ValueRecord};
use crate::{Error, Result};

use std::collections::HashSet;

/// Validated, immutable mapping of one entity type.
///
/// Two descriptors compare equal exactly when registering them twice is a
/// no-op.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor {
    pub name: String,

    pub table: String,

    /// Column-backed fields, in declared order. Records exchanged with the
    /// database use this order.
    pub fields: Vec<FieldMapping>,

    /// Indices into `fields` that make up the primary key.
    pub primary_key: Vec<usize>,

    pub relations: Vec<RelationMapping>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub name: String,
    pub column: String,
    pub ty: Type,
    pub nullable: bool,
    pub primary_key: bool,
    pub generated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationMapping {
    pub name: String,
    pub kind: RelationKind,
    pub target: String,
    pub foreign_key: Vec<ForeignKeyField>,
    pub pair: Option<String>,
    pub loading: LoadingPolicy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForeignKeyField {
    /// Index of the referencing field on this entity.
    pub source: usize,

    /// Name of the referenced field on the target entity.
    pub target: String,
}

impl EntityDescriptor {
    /// Validate declared mapping intent.
    ///
    /// Relations are only checked locally here; whether their targets exist
    /// is decided when they are resolved against a registry.
    pub fn from_mapping(mapping: Mapping, default_loading: LoadingPolicy) -> Result<EntityDescriptor> {
        let name = mapping.name;
        let fail = |message: String| Error::mapping(name.clone(), message);

        if name.is_empty() {
            return Err(Error::mapping("<unnamed>", "entity name is empty"));
        }

        if mapping.fields.is_empty() {
            return Err(fail("no fields declared".into()));
        }

        let table = match mapping.table {
            Some(table) if table.is_empty() => return Err(fail("table name is empty".into())),
            Some(table) => table,
            None => std_util::str::table_name(&name),
        };

        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        let mut fields = Vec::with_capacity(mapping.fields.len());
        let mut primary_key = vec![];

        for (index, decl) in mapping.fields.into_iter().enumerate() {
            let column = decl.column.unwrap_or_else(|| decl.name.clone());

            if !names.insert(decl.name.clone()) {
                return Err(fail(format!("duplicate field `{}`", decl.name)));
            }

            if !columns.insert(column.clone()) {
                return Err(fail(format!("duplicate column `{column}`")));
            }

            if decl.primary_key {
                if decl.nullable {
                    return Err(fail(format!("primary key field `{}` is nullable", decl.name)));
                }
                primary_key.push(index);
            }

            if decl.generated && (!decl.ty.is_integer() || !decl.primary_key) {
                return Err(fail(format!(
                    "generated field `{}` must be an integer primary key",
                    decl.name
                )));
            }

            fields.push(FieldMapping {
                name: decl.name,
                column,
                ty: decl.ty,
                nullable: decl.nullable,
                primary_key: decl.primary_key,
                generated: decl.generated,
            });
        }

        if primary_key.is_empty() {
            return Err(fail("no primary key declared".into()));
        }

        if primary_key.len() > 1 && primary_key.iter().any(|&i| fields[i].generated) {
            return Err(fail("a generated key cannot be part of a composite key".into()));
        }

        let mut relations = Vec::with_capacity(mapping.relations.len());

        for decl in mapping.relations {
            if !names.insert(decl.name.clone()) {
                return Err(fail(format!("duplicate field `{}`", decl.name)));
            }

            match decl.kind {
                RelationKind::ManyToMany => {
                    return Err(fail(format!(
                        "relation `{}`: many-to-many relations are not supported",
                        decl.name
                    )));
                }
                RelationKind::ManyToOne if decl.foreign_key.is_empty() => {
                    return Err(fail(format!(
                        "relation `{}` must declare its foreign key",
                        decl.name
                    )));
                }
                RelationKind::OneToMany | RelationKind::OneToOne if !decl.foreign_key.is_empty() => {
                    return Err(fail(format!(
                        "relation `{}` is not the owning side and cannot declare a foreign key",
                        decl.name
                    )));
                }
                _ => {}
            }

            let mut foreign_key = Vec::with_capacity(decl.foreign_key.len());
            for (source, target) in decl.foreign_key {
                let Some(index) = fields.iter().position(|field| field.name == source) else {
                    return Err(fail(format!(
                        "relation `{}` references unknown field `{source}`",
                        decl.name
                    )));
                };
                foreign_key.push(ForeignKeyField { source: index, target });
            }

            relations.push(RelationMapping {
                name: decl.name,
                kind: decl.kind,
                target: decl.target,
                foreign_key,
                pair: decl.pair,
                loading: decl.loading.unwrap_or(default_loading),
            });
        }

        Ok(EntityDescriptor {
            name,
            table,
            fields,
            primary_key,
            relations,
        })
    }

    pub fn field(&self, name: &str) -> Option<&FieldMapping> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn relation(&self, name: &str) -> Option<&RelationMapping> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    pub fn relation_index(&self, name: &str) -> Option<usize> {
        self.relations.iter().position(|relation| relation.name == name)
    }

    /// Whether the primary key is assigned by the database.
    pub fn has_generated_key(&self) -> bool {
        self.primary_key.iter().any(|&i| self.fields[i].generated)
    }

    /// Extract the primary key from a record in declared field order.
    pub fn key_of(&self, record: &ValueRecord) -> Key {
        Key::from_vec(record.project(&self.primary_key))
    }
}
