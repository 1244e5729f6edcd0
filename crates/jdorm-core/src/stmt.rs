//! Values exchanged between entities, statements, and drivers.

mod criteria;
pub use criteria::{BinaryOp, Criteria, Direction, OrderBy, Predicate};

mod key;
pub use key::Key;

mod ty;
pub use ty::Type;

mod value;
pub use value::Value;

mod value_record;
pub use value_record::ValueRecord;
