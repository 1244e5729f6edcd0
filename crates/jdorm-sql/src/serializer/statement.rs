use super::{delim::And, Bind, Comma, Flavor, Formatter, Ident, Params, Serializer, ToSql};

use crate::{FilterShape, Shape, Slot, StatementKind, Template};

use jdorm_core::{schema::EntityDescriptor, stmt::Direction, Error, Result};

/// `"column" = ?`
struct ColumnEq<'a>(&'a str, Slot);

/// One `WHERE` conjunct of a select, with its parameters already numbered.
enum Filter<'a> {
    Eq(&'a str, usize),
    In(&'a str, std::ops::Range<usize>),
}

struct OrderBy<'a>(&'a str, Direction);

impl Serializer {
    /// `INSERT` of every non-generated column. Generated columns are read
    /// back with `RETURNING`.
    pub fn insert(&self, descriptor: &EntityDescriptor) -> Result<Template> {
        let generated = indices(descriptor, |field| field.generated);
        let columns = indices(descriptor, |field| !field.generated);

        if !generated.is_empty() && !self.supports_returning() {
            return Err(Error::mapping(
                descriptor.name.clone(),
                "generated keys need `INSERT ... RETURNING`, which this database does not support",
            ));
        }

        Ok(self.serialize(
            StatementKind::Insert,
            &descriptor.name,
            generated.clone(),
            |f| {
                fmt!(f, "INSERT INTO " Ident(&descriptor.table));

                if columns.is_empty() {
                    fmt!(f, " DEFAULT VALUES");
                } else {
                    let names = Comma(columns.iter().map(|&i| Ident(&descriptor.fields[i].column)));
                    let values = Comma(columns.iter().map(|&i| Bind(Slot::Field(i))));
                    fmt!(f, " (" names ") VALUES (" values ")");
                }

                if !generated.is_empty() {
                    let names = Comma(generated.iter().map(|&i| Ident(&descriptor.fields[i].column)));
                    fmt!(f, " RETURNING " names);
                }
            },
        ))
    }

    /// `UPDATE` of every non-key column, by primary key. `None` when the
    /// entity has no non-key columns.
    pub fn update(&self, descriptor: &EntityDescriptor) -> Option<Template> {
        let columns = indices(descriptor, |field| !field.primary_key);

        if columns.is_empty() {
            return None;
        }

        Some(self.serialize(StatementKind::Update, &descriptor.name, vec![], |f| {
            let assignments = Comma(
                columns
                    .iter()
                    .map(|&i| ColumnEq(&descriptor.fields[i].column, Slot::Field(i))),
            );
            let key = And(
                descriptor
                    .primary_key
                    .iter()
                    .map(|&i| ColumnEq(&descriptor.fields[i].column, Slot::Field(i))),
            );

            fmt!(f, "UPDATE " Ident(&descriptor.table) " SET " assignments " WHERE " key);
        }))
    }

    /// `DELETE` by primary key. Parameters are the key values in key order.
    pub fn delete(&self, descriptor: &EntityDescriptor) -> Template {
        self.serialize(StatementKind::Delete, &descriptor.name, vec![], |f| {
            let key = And(
                descriptor
                    .primary_key
                    .iter()
                    .enumerate()
                    .map(|(p, &i)| ColumnEq(&descriptor.fields[i].column, Slot::Param(p))),
            );

            fmt!(f, "DELETE FROM " Ident(&descriptor.table) " WHERE " key);
        })
    }

    /// `SELECT` of every column in declared order.
    pub fn select(&self, descriptor: &EntityDescriptor, shape: &Shape) -> Template {
        let all = (0..descriptor.fields.len()).collect::<Vec<_>>();

        self.serialize(StatementKind::Select, &descriptor.name, all.clone(), |f| {
            let columns = Comma(all.iter().map(|&i| Ident(&descriptor.fields[i].column)));
            fmt!(f, "SELECT " columns " FROM " Ident(&descriptor.table));

            let mut next = 0;
            let filters = shape
                .filters
                .iter()
                .map(|filter| match *filter {
                    FilterShape::Eq(i) => {
                        next += 1;
                        Filter::Eq(&descriptor.fields[i].column, next - 1)
                    }
                    FilterShape::In(i, len) => {
                        next += len;
                        Filter::In(&descriptor.fields[i].column, next - len..next)
                    }
                })
                .collect::<Vec<_>>();

            if !filters.is_empty() {
                fmt!(f, " WHERE " And(filters));
            }

            if !shape.order_by.is_empty() {
                let order_by = Comma(
                    shape
                        .order_by
                        .iter()
                        .map(|&(i, direction)| OrderBy(&descriptor.fields[i].column, direction)),
                );
                fmt!(f, " ORDER BY " order_by);
            }

            if shape.limit {
                fmt!(f, " LIMIT " Bind(Slot::Param(next)));
                next += 1;
            } else if shape.offset {
                match f.serializer.flavor {
                    Flavor::Sqlite => fmt!(f, " LIMIT -1"),
                    Flavor::Mysql => fmt!(f, " LIMIT 18446744073709551615"),
                    Flavor::Postgresql => {}
                }
            }

            if shape.offset {
                fmt!(f, " OFFSET " Bind(Slot::Param(next)));
            }
        })
    }
}

fn indices(
    descriptor: &EntityDescriptor,
    f: impl Fn(&jdorm_core::schema::FieldMapping) -> bool,
) -> Vec<usize> {
    descriptor
        .fields
        .iter()
        .enumerate()
        .filter(|(_, field)| f(field))
        .map(|(i, _)| i)
        .collect()
}

impl ToSql for ColumnEq<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        fmt!(f, Ident(self.0) " = " Bind(self.1));
    }
}

impl ToSql for Filter<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        match self {
            Filter::Eq(column, p) => fmt!(f, Ident(column) " = " Bind(Slot::Param(p))),
            Filter::In(_, params) if params.is_empty() => fmt!(f, "1 = 0"),
            Filter::In(column, params) => {
                let values = Comma(params.map(|p| Bind(Slot::Param(p))));
                fmt!(f, Ident(column) " IN (" values ")");
            }
        }
    }
}

impl ToSql for OrderBy<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let direction = match self.1 {
            Direction::Asc => " ASC",
            Direction::Desc => " DESC",
        };
        fmt!(f, Ident(self.0) direction);
    }
}
