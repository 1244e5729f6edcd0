use super::{Comma, Flavor, Formatter, Ident, Params, Serializer, ToSql};

use crate::{StatementKind, Template};

use jdorm_core::schema::{EntityDescriptor, FieldMapping};

struct ColumnDef<'a> {
    field: &'a FieldMapping,

    /// The column alone is the table's generated primary key.
    identity: bool,
}

impl Serializer {
    /// `CREATE TABLE IF NOT EXISTS` for an entity.
    pub fn create_table(&self, descriptor: &EntityDescriptor) -> Template {
        let identity = descriptor.has_generated_key();

        self.serialize(StatementKind::CreateTable, &descriptor.name, vec![], |f| {
            let columns = Comma(descriptor.fields.iter().map(|field| ColumnDef {
                field,
                identity: identity && field.generated,
            }));

            fmt!(f, "CREATE TABLE IF NOT EXISTS " Ident(&descriptor.table) " (" columns);

            // SQLite declares an autoincrement key inline on the column.
            if !(identity && f.serializer.flavor == Flavor::Sqlite) {
                let key = Comma(
                    descriptor
                        .primary_key
                        .iter()
                        .map(|&i| Ident(&descriptor.fields[i].column)),
                );
                fmt!(f, ", PRIMARY KEY (" key ")");
            }

            fmt!(f, ")");
        })
    }
}

impl ToSql for ColumnDef<'_> {
    fn to_sql<P: Params>(self, f: &mut Formatter<'_, P>) {
        let flavor = f.serializer.flavor;
        let ty = flavor.storage_type(self.field.ty, self.field.primary_key);

        fmt!(f, Ident(&self.field.column) " " ty);

        if self.identity {
            let suffix = match flavor {
                Flavor::Sqlite => " PRIMARY KEY AUTOINCREMENT",
                Flavor::Postgresql => " GENERATED BY DEFAULT AS IDENTITY",
                Flavor::Mysql => " NOT NULL AUTO_INCREMENT",
            };
            fmt!(f, suffix);
        } else if !self.field.nullable {
            fmt!(f, " NOT NULL");
        }
    }
}
