use std::cmp::Ordering;

use crate::ast::CompareOp;
use crate::error::ValueError;
use crate::record::Record;
use crate::value::{self, Value};

/// One of the seven fields of the fixed record schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Pid,
    Name,
    Priority,
    KernTm,
    FileTm,
    CpuUsage,
    Status,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Pid,
        Field::Name,
        Field::Priority,
        Field::KernTm,
        Field::FileTm,
        Field::CpuUsage,
        Field::Status,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Pid => "pid",
            Field::Name => "name",
            Field::Priority => "priority",
            Field::KernTm => "kern_tm",
            Field::FileTm => "file_tm",
            Field::CpuUsage => "cpu_usage",
            Field::Status => "status",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }

    /// Parses a raw text token with this field's codec.
    pub fn parse_value(&self, raw: &str) -> Result<Value, ValueError> {
        match self {
            Field::Pid | Field::Priority => value::parse_int(raw).map(Value::Int),
            Field::Name => value::parse_text(raw).map(Value::Text),
            Field::KernTm | Field::FileTm => value::parse_time(raw).map(Value::Time),
            Field::CpuUsage => value::parse_decimal(raw).map(Value::Decimal),
            Field::Status => value::parse_status(raw).map(Value::Status),
        }
    }

    /// The per-field operator matrix: all relational operators everywhere,
    /// except `status` which only supports `=`, `!=`, `in` and `not_in`.
    pub fn allows(&self, op: CompareOp) -> bool {
        match self {
            Field::Status => matches!(
                op,
                CompareOp::Eq | CompareOp::Ne | CompareOp::In | CompareOp::NotIn
            ),
            _ => !matches!(op, CompareOp::In | CompareOp::NotIn),
        }
    }

    /// Whether the field may appear as a sort key. `status` may not.
    pub fn sortable(&self) -> bool {
        !matches!(self, Field::Status)
    }

    /// Compares two records on this field: integers and hundredths
    /// numerically, names byte-lexicographically, times by
    /// (hour, minute, second).
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            Field::Pid => a.pid.cmp(&b.pid),
            Field::Name => a.name.cmp(&b.name),
            Field::Priority => a.priority.cmp(&b.priority),
            Field::KernTm => a.kern_tm.cmp(&b.kern_tm),
            Field::FileTm => a.file_tm.cmp(&b.file_tm),
            Field::CpuUsage => a.cpu_usage.cmp(&b.cpu_usage),
            Field::Status => a.status.cmp(&b.status),
        }
    }
}
