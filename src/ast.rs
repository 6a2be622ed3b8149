use std::fmt;

use crate::field::Field;
use crate::record::Record;

/// A condition operator, written directly after the field name in a
/// condition token (`pid>=10`, `status!='running'`, `statusin['ready']`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    In,
    NotIn,
}

impl CompareOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Gt => ">",
            CompareOp::Le => "<=",
            CompareOp::Ge => ">=",
            CompareOp::In => "in",
            CompareOp::NotIn => "not_in",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A single field/operator/value predicate. The value is kept as raw text
/// and re-parsed against the field's codec at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: Field,
    pub op: CompareOp,
    pub raw_value: String,
}

/// One `field=value` pair of an update. The raw value is only parsed when
/// the update is applied; a value that fails its codec skips that one field.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub field: Field,
    pub raw_value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: Field,
    pub direction: SortDirection,
}

/// A validated request produced by the command parser.
#[derive(Debug, PartialEq)]
pub enum Command {
    Insert(Record),
    Select {
        fields: Vec<Field>,
        conditions: Vec<Condition>,
    },
    Delete {
        conditions: Vec<Condition>,
    },
    Update {
        assignments: Vec<Assignment>,
        conditions: Vec<Condition>,
    },
    Uniq {
        fields: Vec<Field>,
    },
    Sort {
        keys: Vec<SortKey>,
    },
}
