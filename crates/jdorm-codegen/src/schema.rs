mod belongs_to;
pub(crate) use belongs_to::BelongsTo;

mod error;
pub(crate) use error::ErrorSet;

mod field;
pub(crate) use field::{Field, FieldTy};

mod has_many;
pub(crate) use has_many::HasMany;

mod has_one;
pub(crate) use has_one::HasOne;

mod loading;
pub(crate) use loading::Loading;

mod model;
pub(crate) use model::Model;

mod model_attr;
pub(crate) use model_attr::ModelAttr;

mod name;
pub(crate) use name::Name;
