use thiserror::Error;

use crate::ast::CompareOp;

/// Failure to parse a raw text token as one of the typed values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("malformed integer literal")]
    BadInt,
    #[error("integer does not fit 32 bits")]
    IntOutOfRange,
    #[error("malformed string literal")]
    BadString,
    #[error("malformed time literal")]
    BadTime,
    #[error("time component out of range")]
    TimeOutOfRange,
    #[error("malformed decimal literal")]
    BadDecimal,
    #[error("unknown status name")]
    BadStatus,
    #[error("value does not match the field type")]
    TypeMismatch,
}

/// Rejection of a whole command line. Every variant maps to the same
/// `incorrect:'...'` diagnostic; the detail is only surfaced in logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty command line")]
    EmptyLine,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("unknown field {0:?}")]
    UnknownField(String),
    #[error("duplicate field {0:?}")]
    DuplicateField(&'static str),
    #[error("malformed assignment {0:?}")]
    MalformedAssignment(String),
    #[error("expected 7 distinct fields, found {0}")]
    WrongFieldCount(usize),
    #[error("empty field list")]
    EmptyFieldList,
    #[error("malformed condition {0:?}")]
    MalformedCondition(String),
    #[error("operator {op} is not allowed for field {field}")]
    OperatorNotAllowed { field: &'static str, op: CompareOp },
    #[error("invalid {field} value: {source}")]
    BadValue {
        field: &'static str,
        source: ValueError,
    },
    #[error("field {0} cannot be used as a sort key")]
    UnsortableField(&'static str),
    #[error("expected asc or desc, found {0:?}")]
    BadDirection(String),
    #[error("unexpected trailing input {0:?}")]
    TrailingInput(String),
}
