use std::cmp::Ordering;

use bitvec::prelude::*;
use tracing::{debug, trace};

use crate::ast::{Assignment, Command, CompareOp, Condition, SortDirection, SortKey};
use crate::field::Field;
use crate::record::Record;
use crate::store::Store;
use crate::value::{Value, parse_quoted_list};

/// The query engine: owns the record store and runs one command at a time.
///
/// Commands are atomic. A line that fails to parse produces a single
/// diagnostic and leaves the store untouched; bulk effects (delete, update,
/// uniq) match against the pre-command state before mutating anything.
#[derive(Default)]
pub struct Engine {
    store: Store,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Parses and executes one command line, returning the output lines.
    ///
    /// Never fails: a rejected command becomes the `incorrect:'...'`
    /// diagnostic carrying the first 20 characters of the raw line.
    ///
    /// # Example
    /// ```
    /// use procdb::Engine;
    ///
    /// let mut engine = Engine::new();
    /// let out = engine.execute_line(
    ///     "insert pid=1,name=\"p1\",priority=5,kern_tm='01:02:03',\
    ///      file_tm='04:05:06',cpu_usage=12.5,status='running'",
    /// );
    /// assert_eq!(out, vec!["insert:1".to_string()]);
    ///
    /// let out = engine.execute_line("select pid,name pid>0");
    /// assert_eq!(out, vec!["select:1".to_string(), "pid=1 name=\"p1\"".to_string()]);
    /// ```
    pub fn execute_line(&mut self, line: &str) -> Vec<String> {
        match crate::parser::parse_command(line) {
            Ok(command) => self.run(command),
            Err(err) => {
                debug!(line, %err, "command rejected");
                vec![Self::reject(line)]
            }
        }
    }

    fn reject(line: &str) -> String {
        let head: String = line.chars().take(20).collect();
        format!("incorrect:'{head}'")
    }

    fn run(&mut self, command: Command) -> Vec<String> {
        match command {
            Command::Insert(record) => self.insert(record),
            Command::Select { fields, conditions } => self.select(&fields, &conditions),
            Command::Delete { conditions } => self.delete(&conditions),
            Command::Update {
                assignments,
                conditions,
            } => self.update(&assignments, &conditions),
            Command::Uniq { fields } => self.uniq(&fields),
            Command::Sort { keys } => self.sort(&keys),
        }
    }

    /// Appends the already validated record and reports the new store size.
    fn insert(&mut self, record: Record) -> Vec<String> {
        self.store.push(record);
        vec![format!("insert:{}", self.store.len())]
    }

    /// Scans the store in order and projects the requested fields of every
    /// match, one output line per record.
    fn select(&self, fields: &[Field], conditions: &[Condition]) -> Vec<String> {
        let mut rows = Vec::new();
        for record in self.store.iter() {
            if matches_all(record, conditions) {
                let cells: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{}={}", f.name(), record.get(*f)))
                    .collect();
                rows.push(cells.join(" "));
            }
        }

        let mut out = Vec::with_capacity(rows.len() + 1);
        out.push(format!("select:{}", rows.len()));
        out.extend(rows);
        out
    }

    /// Marks matches against the pre-delete snapshot, then removes them from
    /// the highest index down. An empty condition list removes everything.
    fn delete(&mut self, conditions: &[Condition]) -> Vec<String> {
        let mut marks = bitvec![0; self.store.len()];
        for (index, record) in self.store.iter().enumerate() {
            if matches_all(record, conditions) {
                marks.set(index, true);
            }
        }

        let removed = self.store.remove_marked(&marks);
        vec![format!("delete:{removed}")]
    }

    /// Applies each assignment independently to every matching record. An
    /// assignment whose raw value fails its field codec leaves only that
    /// field unchanged; the record still counts as touched.
    fn update(&mut self, assignments: &[Assignment], conditions: &[Condition]) -> Vec<String> {
        let hits: Vec<usize> = self
            .store
            .iter()
            .enumerate()
            .filter(|(_, record)| matches_all(record, conditions))
            .map(|(index, _)| index)
            .collect();

        for &index in &hits {
            let Some(record) = self.store.get_mut(index) else {
                continue;
            };
            for assignment in assignments {
                match assignment.field.parse_value(&assignment.raw_value) {
                    Ok(value) => {
                        if record.set(assignment.field, value).is_err() {
                            trace!(field = assignment.field.name(), "assignment skipped");
                        }
                    }
                    Err(err) => {
                        trace!(field = assignment.field.name(), %err, "assignment skipped");
                    }
                }
            }
        }

        vec![format!("update:{}", hits.len())]
    }

    /// Pairwise-compares records on the listed fields; of two records equal
    /// on every listed field the later one is removed, the earlier kept.
    fn uniq(&mut self, fields: &[Field]) -> Vec<String> {
        let records = self.store.records();
        let n = records.len();
        let mut marks = bitvec![0; n];

        for i in 0..n {
            if marks[i] {
                continue;
            }
            for j in i + 1..n {
                if marks[j] {
                    continue;
                }
                let equal = fields
                    .iter()
                    .all(|f| f.compare(&records[i], &records[j]) == Ordering::Equal);
                if equal {
                    marks.set(j, true);
                }
            }
        }

        let removed = self.store.remove_marked(&marks);
        vec![format!("uniq:{removed}")]
    }

    /// Stable multi-key sort of the whole store. Ties across all keys keep
    /// the pre-sort order, so equal records end up in original-index order.
    fn sort(&mut self, keys: &[SortKey]) -> Vec<String> {
        self.store.sort_by(|a, b| {
            for key in keys {
                let mut ord = key.field.compare(a, b);
                if key.direction == SortDirection::Desc {
                    ord = ord.reverse();
                }
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        vec![format!("sort:{}", self.store.len())]
    }
}

/// Logical AND of all conditions; an empty list matches every record.
fn matches_all(record: &Record, conditions: &[Condition]) -> bool {
    conditions.iter().all(|c| condition_matches(record, c))
}

/// Evaluates one condition, re-parsing its raw value against the field's
/// codec. Parser validation makes re-parse failures unreachable for
/// relational operators, but a failure still just evaluates to false.
fn condition_matches(record: &Record, condition: &Condition) -> bool {
    match condition.op {
        CompareOp::In | CompareOp::NotIn => {
            let Some(items) = parse_quoted_list(&condition.raw_value) else {
                return false;
            };
            if items.is_empty() {
                return false;
            }
            let Value::Status(status) = record.get(condition.field) else {
                return false;
            };
            let found = items.iter().any(|item| item == status.name());
            if condition.op == CompareOp::In {
                found
            } else {
                !found
            }
        }
        op => {
            let Ok(value) = condition.field.parse_value(&condition.raw_value) else {
                return false;
            };
            let Some(ord) = compare_field(record, condition.field, &value) else {
                return false;
            };
            match op {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Ne => ord != Ordering::Equal,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Le => ord != Ordering::Greater,
                CompareOp::Ge => ord != Ordering::Less,
                CompareOp::In | CompareOp::NotIn => false,
            }
        }
    }
}

/// Compares a record's field against a parsed literal of the same type.
fn compare_field(record: &Record, field: Field, value: &Value) -> Option<Ordering> {
    match (field, value) {
        (Field::Pid, Value::Int(v)) => Some(record.pid.cmp(v)),
        (Field::Name, Value::Text(v)) => Some(record.name.as_str().cmp(v.as_str())),
        (Field::Priority, Value::Int(v)) => Some(record.priority.cmp(v)),
        (Field::KernTm, Value::Time(v)) => Some(record.kern_tm.cmp(v)),
        (Field::FileTm, Value::Time(v)) => Some(record.file_tm.cmp(v)),
        (Field::CpuUsage, Value::Decimal(v)) => Some(record.cpu_usage.cmp(v)),
        (Field::Status, Value::Status(v)) => Some(record.status.cmp(v)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn insert_line(pid: i32, priority: i32, status: &str) -> String {
        format!(
            "insert pid={pid},name=\"p{pid}\",priority={priority},kern_tm='01:02:03',\
             file_tm='04:05:06',cpu_usage=12.5,status='{status}'"
        )
    }

    fn seeded(rows: &[(i32, i32, &str)]) -> Engine {
        let mut engine = Engine::new();
        for (i, &(pid, priority, status)) in rows.iter().enumerate() {
            let out = engine.execute_line(&insert_line(pid, priority, status));
            assert_eq!(out, vec![format!("insert:{}", i + 1)]);
        }
        engine
    }

    fn pids(engine: &Engine) -> Vec<i32> {
        engine.store().iter().map(|r| r.pid).collect()
    }

    #[test]
    fn test_insert_and_select() {
        let mut engine = Engine::new();

        let out = engine.execute_line(
            "insert pid=1,name=\"p1\",priority=5,kern_tm='01:02:03',\
             file_tm='04:05:06',cpu_usage=12.5,status='running'",
        );
        assert_eq!(out, vec!["insert:1"]);

        let out = engine.execute_line("select pid,name pid>0");
        assert_eq!(out, vec!["select:1", "pid=1 name=\"p1\""]);
    }

    #[test]
    fn test_select_formats_all_fields() {
        let mut engine = seeded(&[(1, 5, "running")]);

        let out = engine
            .execute_line("select pid,name,priority,kern_tm,file_tm,cpu_usage,status");
        assert_eq!(
            out,
            vec![
                "select:1".to_string(),
                "pid=1 name=\"p1\" priority=5 kern_tm='01:02:03' \
                 file_tm='04:05:06' cpu_usage=12.50 status='running'"
                    .to_string(),
            ]
        );
    }

    #[test]
    fn test_insert_rejection_truncates_diagnostic() {
        let mut engine = Engine::new();
        let line = "insert pid=1,pid=2,name=\"x\",priority=1,kern_tm='0:0:0',\
                    file_tm='0:0:0',cpu_usage=1,status='running'";

        let out = engine.execute_line(line);
        assert_eq!(out, vec!["incorrect:'insert pid=1,pid=2,n'"]);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_empty_line_is_incorrect() {
        let mut engine = Engine::new();
        assert_eq!(engine.execute_line(""), vec!["incorrect:''"]);
    }

    #[test]
    fn test_select_no_conditions_matches_all() {
        let mut engine = seeded(&[(1, 1, "ready"), (2, 2, "running")]);
        let out = engine.execute_line("select pid");
        assert_eq!(out, vec!["select:2", "pid=1", "pid=2"]);
    }

    #[test]
    fn test_select_conditions_are_anded() {
        let mut engine = seeded(&[(1, 1, "ready"), (2, 2, "ready"), (3, 3, "ready")]);
        let out = engine.execute_line("select pid pid>1 priority<3");
        assert_eq!(out, vec!["select:1", "pid=2"]);
    }

    #[test]
    fn test_select_status_in_and_not_in() {
        let mut engine = seeded(&[(1, 1, "running"), (2, 2, "ready"), (3, 3, "dying")]);

        let out = engine.execute_line("select pid statusin['running','ready']");
        assert_eq!(out, vec!["select:2", "pid=1", "pid=2"]);

        let out = engine.execute_line("select pid statusnot_in['running','ready']");
        assert_eq!(out, vec!["select:1", "pid=3"]);
    }

    // Malformed or empty lists match nothing, for not_in as well.
    #[test]
    fn test_select_malformed_list_matches_nothing() {
        let mut engine = seeded(&[(1, 1, "running")]);

        assert_eq!(
            engine.execute_line("select pid statusin[broken"),
            vec!["select:0"]
        );
        assert_eq!(
            engine.execute_line("select pid statusnot_in[broken"),
            vec!["select:0"]
        );
        assert_eq!(
            engine.execute_line("select pid statusin[]"),
            vec!["select:0"]
        );
    }

    #[test]
    fn test_select_disallowed_status_operator() {
        let mut engine = seeded(&[(1, 1, "running")]);
        let out = engine.execute_line("select pid status<'running'");
        assert_eq!(out, vec!["incorrect:'select pid status<'r'"]);
    }

    #[test]
    fn test_delete_with_conditions() {
        let mut engine = seeded(&[(1, 1, "ready"), (2, 2, "ready"), (3, 3, "ready")]);

        let out = engine.execute_line("delete pid>=2");
        assert_eq!(out, vec!["delete:2"]);
        assert_eq!(pids(&engine), vec![1]);
    }

    #[test]
    fn test_delete_without_conditions_clears_store() {
        let mut engine = seeded(&[(1, 1, "ready"), (2, 2, "ready")]);

        let out = engine.execute_line("delete");
        assert_eq!(out, vec!["delete:2"]);
        assert!(engine.store().is_empty());
    }

    #[test]
    fn test_update_counts_matches() {
        let mut engine = seeded(&[(1, 1, "ready"), (2, 2, "ready")]);

        let out = engine.execute_line("update priority=9 pid>0");
        assert_eq!(out, vec!["update:2"]);
        assert!(engine.store().iter().all(|r| r.priority == 9));

        let out = engine.execute_line("update priority=1 pid=404");
        assert_eq!(out, vec!["update:0"]);
    }

    // A bad value skips only that field; the rest of the update applies.
    #[test]
    fn test_update_partial_field_skip() {
        let mut engine = seeded(&[(1, 5, "ready")]);

        let out = engine.execute_line("update priority=7,cpu_usage=bogus pid=1");
        assert_eq!(out, vec!["update:1"]);

        let record = engine.store().get(0).unwrap();
        assert_eq!(record.priority, 7);
        assert_eq!(record.cpu_usage, 1250); // untouched
    }

    #[test]
    fn test_update_matches_pre_update_snapshot() {
        let mut engine = seeded(&[(1, 1, "ready"), (2, 2, "ready")]);

        // bumping priority must not re-match records already updated
        let out = engine.execute_line("update priority=2 priority<2");
        assert_eq!(out, vec!["update:1"]);
        let priorities: Vec<i32> = engine.store().iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![2, 2]);
    }

    #[test]
    fn test_uniq_distinct_removes_nothing() {
        let mut engine = seeded(&[(1, 1, "ready"), (2, 2, "ready"), (3, 3, "ready")]);
        assert_eq!(engine.execute_line("uniq pid"), vec!["uniq:0"]);
        assert_eq!(engine.store().len(), 3);
    }

    #[test]
    fn test_uniq_keeps_earlier_duplicate() {
        let mut engine = seeded(&[(1, 1, "ready"), (2, 2, "ready"), (1, 3, "ready")]);

        assert_eq!(engine.execute_line("uniq pid"), vec!["uniq:1"]);
        assert_eq!(pids(&engine), vec![1, 2]);
        // the survivor is the earlier record
        assert_eq!(engine.store().get(0).map(|r| r.priority), Some(1));
    }

    #[test]
    fn test_uniq_multi_field_subset() {
        let mut engine = seeded(&[(1, 5, "ready"), (1, 6, "ready"), (1, 5, "ready")]);

        // equal on (pid, priority) only for the first and third record
        assert_eq!(engine.execute_line("uniq pid,priority"), vec!["uniq:1"]);
        let priorities: Vec<i32> = engine.store().iter().map(|r| r.priority).collect();
        assert_eq!(priorities, vec![5, 6]);
    }

    #[test]
    fn test_sort_multi_key() {
        let mut engine = seeded(&[(1, 5, "ready"), (2, 5, "ready"), (3, 9, "ready")]);

        let out = engine.execute_line("sort priority=desc,pid=asc");
        assert_eq!(out, vec!["sort:3"]);
        assert_eq!(pids(&engine), vec![3, 1, 2]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let mut engine = seeded(&[(2, 5, "ready"), (1, 5, "ready"), (3, 9, "ready")]);

        engine.execute_line("sort priority=asc,pid=asc");
        let once = pids(&engine);
        engine.execute_line("sort priority=asc,pid=asc");
        assert_eq!(pids(&engine), once);
    }

    #[test]
    fn test_sort_ties_keep_insertion_order() {
        let mut engine = seeded(&[(7, 1, "ready"), (3, 1, "ready"), (5, 1, "ready")]);

        // all priorities equal: the order must not change
        engine.execute_line("sort priority=asc");
        assert_eq!(pids(&engine), vec![7, 3, 5]);
    }

    #[test]
    fn test_rejected_commands_do_not_mutate() {
        let mut engine = seeded(&[(1, 1, "ready")]);

        engine.execute_line("delete pid>abc");
        engine.execute_line("update priority=2,priority=3");
        engine.execute_line("sort status=asc");
        engine.execute_line("uniq pid,pid");

        assert_eq!(engine.store().len(), 1);
        assert_eq!(engine.store().get(0).map(|r| r.priority), Some(1));
    }

    #[test]
    fn test_name_conditions_are_byte_lexicographic() {
        let mut engine = Engine::new();
        for name in ["alpha", "beta"] {
            engine.execute_line(&format!(
                "insert pid=1,name=\"{name}\",priority=1,kern_tm='0:0:0',\
                 file_tm='0:0:0',cpu_usage=0,status='ready'"
            ));
        }

        let out = engine.execute_line("select name name<\"b\"");
        assert_eq!(out, vec!["select:1", "name=\"alpha\""]);
    }

    #[test]
    fn test_time_conditions() {
        let mut engine = Engine::new();
        for (pid, time) in [(1, "'01:00:00'"), (2, "'02:30:00'")] {
            engine.execute_line(&format!(
                "insert pid={pid},name=\"p\",priority=1,kern_tm={time},\
                 file_tm='0:0:0',cpu_usage=0,status='ready'"
            ));
        }

        let out = engine.execute_line("select pid kern_tm>='02:00:00'");
        assert_eq!(out, vec!["select:1", "pid=2"]);
    }

    #[test]
    fn test_cpu_usage_conditions_in_hundredths() {
        let mut engine = Engine::new();
        for (pid, cpu) in [(1, "0.5"), (2, "0.50"), (3, "12.5")] {
            engine.execute_line(&format!(
                "insert pid={pid},name=\"p\",priority=1,kern_tm='0:0:0',\
                 file_tm='0:0:0',cpu_usage={cpu},status='ready'"
            ));
        }

        // 0.5 and 0.50 are the same stored value
        let out = engine.execute_line("select pid cpu_usage=0.50");
        assert_eq!(out, vec!["select:2", "pid=1", "pid=2"]);

        let out = engine.execute_line("select pid cpu_usage>1");
        assert_eq!(out, vec!["select:1", "pid=3"]);
    }
}
