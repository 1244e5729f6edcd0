//! Validation of query criteria against an entity descriptor.
//!
//! Lowering separates criteria into a [`Shape`] (which fields, which
//! operators, how many `IN` values) and the parameter values. Two criteria
//! with the same shape share one select template.

use jdorm_core::{
    schema::EntityDescriptor,
    stmt::{BinaryOp, Criteria, Direction, Predicate, Value},
    Error, Result,
};

/// The structure of a criteria, independent of the values it compares against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Shape {
    pub filters: Vec<FilterShape>,
    pub order_by: Vec<(usize, Direction)>,
    pub limit: bool,
    pub offset: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterShape {
    /// `field = ?`
    Eq(usize),

    /// `field IN (?, ...)` with this many values. Zero matches nothing.
    In(usize, usize),
}

/// Check `criteria` and split it into shape and parameter values.
///
/// Parameter order is filter values, then limit, then offset.
pub fn lower(descriptor: &EntityDescriptor, criteria: &Criteria) -> Result<(Shape, Vec<Value>)> {
    if !criteria.has_filter() && !criteria.scan_all {
        return Err(Error::unsupported_criteria(format!(
            "query on `{}` has no predicates; use `Criteria::all()` to select every row",
            descriptor.name
        )));
    }

    let mut shape = Shape::default();
    let mut params = vec![];

    for predicate in &criteria.predicates {
        let index = field(descriptor, predicate.field())?;

        match predicate {
            Predicate::Compare { op: BinaryOp::Eq, value, field } => {
                if value.is_null() {
                    return Err(Error::unsupported_criteria(format!(
                        "comparison of `{}.{field}` with NULL",
                        descriptor.name
                    )));
                }
                shape.filters.push(FilterShape::Eq(index));
                params.push(value.clone());
            }
            Predicate::Compare { op, field, .. } => {
                return Err(Error::unsupported_criteria(format!(
                    "operator `{op}` on `{}.{field}`",
                    descriptor.name
                )));
            }
            Predicate::In { values, field } => {
                if values.iter().any(Value::is_null) {
                    return Err(Error::unsupported_criteria(format!(
                        "NULL in the value set for `{}.{field}`",
                        descriptor.name
                    )));
                }
                shape.filters.push(FilterShape::In(index, values.len()));
                params.extend(values.iter().cloned());
            }
        }
    }

    for order_by in &criteria.order_by {
        let index = field(descriptor, &order_by.field)?;
        shape.order_by.push((index, order_by.direction));
    }

    if let Some(limit) = criteria.limit {
        shape.limit = true;
        params.push(Value::I64(clamp(limit)));
    }

    if let Some(offset) = criteria.offset {
        shape.offset = true;
        params.push(Value::I64(clamp(offset)));
    }

    Ok((shape, params))
}

/// Key lookup: `pk1 = ? AND pk2 = ?`.
pub fn by_key(descriptor: &EntityDescriptor) -> Shape {
    Shape {
        filters: descriptor
            .primary_key
            .iter()
            .map(|&index| FilterShape::Eq(index))
            .collect(),
        ..Shape::default()
    }
}

fn field(descriptor: &EntityDescriptor, name: &str) -> Result<usize> {
    if let Some(index) = descriptor.field_index(name) {
        return Ok(index);
    }

    let message = if descriptor.relation(name).is_some() {
        format!(
            "`{}.{name}` is a relationship; filter on its key fields instead",
            descriptor.name
        )
    } else {
        format!("`{}` has no field `{name}`", descriptor.name)
    };

    Err(Error::unsupported_criteria(message))
}

fn clamp(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
