use super::Value;

use std::fmt;

/// Filter, ordering, and paging for an entity query.
///
/// Predicates are combined with `AND`. An empty filter is rejected when the
/// query is built unless it was created with [`Criteria::all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    pub predicates: Vec<Predicate>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,

    /// Set by [`Criteria::all`]; permits an empty filter.
    pub scan_all: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// `field <op> value`
    Compare {
        field: String,
        op: BinaryOp,
        value: Value,
    },

    /// `field IN (values...)`
    In { field: String, values: Vec<Value> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Asc,
    Desc,
}

impl Criteria {
    pub fn new() -> Criteria {
        Criteria::default()
    }

    /// Criteria that match every row.
    pub fn all() -> Criteria {
        Criteria {
            scan_all: true,
            ..Criteria::default()
        }
    }

    pub fn eq(self, field: impl Into<String>, value: impl Into<Value>) -> Criteria {
        self.compare(field, BinaryOp::Eq, value)
    }

    pub fn compare(
        mut self,
        field: impl Into<String>,
        op: BinaryOp,
        value: impl Into<Value>,
    ) -> Criteria {
        self.predicates.push(Predicate::Compare {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn is_in<I>(mut self, field: impl Into<String>, values: I) -> Criteria
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.predicates.push(Predicate::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        });
        self
    }

    pub fn order_by(mut self, field: impl Into<String>) -> Criteria {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction: Direction::Asc,
        });
        self
    }

    pub fn order_by_desc(mut self, field: impl Into<String>) -> Criteria {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction: Direction::Desc,
        });
        self
    }

    pub fn limit(mut self, limit: u64) -> Criteria {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Criteria {
        self.offset = Some(offset);
        self
    }

    pub fn has_filter(&self) -> bool {
        !self.predicates.is_empty()
    }
}

impl Predicate {
    pub fn field(&self) -> &str {
        match self {
            Predicate::Compare { field, .. } | Predicate::In { field, .. } => field,
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
        })
    }
}
