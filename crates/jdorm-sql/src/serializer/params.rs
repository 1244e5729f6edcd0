use super::{Flavor, Formatter, ToSql};

use crate::Slot;

pub trait Params {
    fn push(&mut self, slot: Slot) -> Placeholder;
}

/// 1-based position of a parameter in the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder(pub usize);

impl Params for Vec<Slot> {
    fn push(&mut self, slot: Slot) -> Placeholder {
        Vec::push(self, slot);
        Placeholder(self.len())
    }
}

/// Records a slot and writes its placeholder.
pub(super) struct Bind(pub(super) Slot);

impl ToSql for Placeholder {
    fn to_sql<P: super::Params>(self, f: &mut Formatter<'_, P>) {
        match f.serializer.flavor {
            Flavor::Mysql => f.dst.push('?'),
            Flavor::Postgresql => {
                f.dst.push('$');
                f.dst.push_str(&self.0.to_string());
            }
            Flavor::Sqlite => {
                f.dst.push('?');
                f.dst.push_str(&self.0.to_string());
            }
        }
    }
}

impl ToSql for Bind {
    fn to_sql<P: super::Params>(self, f: &mut Formatter<'_, P>) {
        let placeholder = f.params.push(self.0);
        placeholder.to_sql(f);
    }
}
