use crate::stmt::Type;

/// Declared mapping intent for one entity type.
///
/// Usually produced by `#[derive(Entity)]`, but can be built by hand.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    /// Entity name, unique within a registry.
    pub name: String,

    /// Table name. Defaults to the pluralized snake case of `name`.
    pub table: Option<String>,

    pub fields: Vec<FieldDecl>,

    pub relations: Vec<RelationDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,

    /// Column name. Defaults to the field name.
    pub column: Option<String>,

    pub ty: Type,

    pub nullable: bool,

    pub primary_key: bool,

    /// The database assigns the value on insert.
    pub generated: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelationDecl {
    pub name: String,

    pub kind: RelationKind,

    /// Name of the target entity.
    pub target: String,

    /// `(field on this entity, field on the target)` pairs. Only declared on
    /// the side that holds the foreign key.
    pub foreign_key: Vec<(String, String)>,

    /// For the inverse side: name of the relation on the target that holds
    /// the foreign key. Inferred when the target has exactly one candidate.
    pub pair: Option<String>,

    /// `None` falls back to the registry's default.
    pub loading: Option<LoadingPolicy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// `belongs_to`: this entity holds the foreign key.
    ManyToOne,

    /// `has_many`: the target holds the foreign key.
    OneToMany,

    /// `has_one`: the target holds the foreign key, at most one row.
    OneToOne,

    ManyToMany,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadingPolicy {
    /// Loaded in a batch together with the owning rows.
    Eager,

    /// Loaded on first access.
    #[default]
    Lazy,
}

impl Mapping {
    pub fn new(name: impl Into<String>) -> Mapping {
        Mapping {
            name: name.into(),
            table: None,
            fields: vec![],
            relations: vec![],
        }
    }

    pub fn table(mut self, table: impl Into<String>) -> Mapping {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Mapping {
        self.fields.push(field);
        self
    }

    pub fn relation(mut self, relation: RelationDecl) -> Mapping {
        self.relations.push(relation);
        self
    }
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: Type) -> FieldDecl {
        FieldDecl {
            name: name.into(),
            column: None,
            ty,
            nullable: false,
            primary_key: false,
            generated: false,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> FieldDecl {
        self.column = Some(column.into());
        self
    }

    pub fn nullable(mut self) -> FieldDecl {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> FieldDecl {
        self.primary_key = true;
        self
    }

    pub fn generated(mut self) -> FieldDecl {
        self.generated = true;
        self
    }
}

impl RelationDecl {
    pub fn new(name: impl Into<String>, kind: RelationKind, target: impl Into<String>) -> RelationDecl {
        RelationDecl {
            name: name.into(),
            kind,
            target: target.into(),
            foreign_key: vec![],
            pair: None,
            loading: None,
        }
    }

    pub fn foreign_key(mut self, source: impl Into<String>, target: impl Into<String>) -> RelationDecl {
        self.foreign_key.push((source.into(), target.into()));
        self
    }

    pub fn pair(mut self, pair: impl Into<String>) -> RelationDecl {
        self.pair = Some(pair.into());
        self
    }

    pub fn loading(mut self, loading: LoadingPolicy) -> RelationDecl {
        self.loading = Some(loading);
        self
    }
}

impl RelationKind {
    /// Whether this side of the relation stores the foreign key.
    pub fn is_owning(self) -> bool {
        matches!(self, RelationKind::ManyToOne)
    }

    pub fn is_collection(self) -> bool {
        matches!(self, RelationKind::OneToMany | RelationKind::ManyToMany)
    }
}
