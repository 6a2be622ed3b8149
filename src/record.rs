use allocative::Allocative;

use crate::error::ValueError;
use crate::field::Field;
use crate::value::{Status, Time, Value};

/// One stored process entry. Every field is always populated; insertion is
/// all-or-nothing so a partially built record never reaches the store.
#[derive(Debug, Clone, PartialEq, Allocative)]
pub struct Record {
    pub pid: i32,
    pub name: String,
    pub priority: i32,
    pub kern_tm: Time,
    pub file_tm: Time,
    /// Signed hundredths, ±999.99.
    pub cpu_usage: i32,
    pub status: Status,
}

impl Record {
    /// Builds a record from typed field/value pairs. Returns `None` unless
    /// every one of the 7 fields is present with a value of its own type.
    pub fn from_values(pairs: Vec<(Field, Value)>) -> Option<Record> {
        let mut pid = None;
        let mut name = None;
        let mut priority = None;
        let mut kern_tm = None;
        let mut file_tm = None;
        let mut cpu_usage = None;
        let mut status = None;

        for (field, value) in pairs {
            match (field, value) {
                (Field::Pid, Value::Int(v)) => pid = Some(v),
                (Field::Name, Value::Text(v)) => name = Some(v),
                (Field::Priority, Value::Int(v)) => priority = Some(v),
                (Field::KernTm, Value::Time(v)) => kern_tm = Some(v),
                (Field::FileTm, Value::Time(v)) => file_tm = Some(v),
                (Field::CpuUsage, Value::Decimal(v)) => cpu_usage = Some(v),
                (Field::Status, Value::Status(v)) => status = Some(v),
                _ => return None,
            }
        }

        Some(Record {
            pid: pid?,
            name: name?,
            priority: priority?,
            kern_tm: kern_tm?,
            file_tm: file_tm?,
            cpu_usage: cpu_usage?,
            status: status?,
        })
    }

    /// Reads one field as a [Value].
    pub fn get(&self, field: Field) -> Value {
        match field {
            Field::Pid => Value::Int(self.pid),
            Field::Name => Value::Text(self.name.clone()),
            Field::Priority => Value::Int(self.priority),
            Field::KernTm => Value::Time(self.kern_tm),
            Field::FileTm => Value::Time(self.file_tm),
            Field::CpuUsage => Value::Decimal(self.cpu_usage),
            Field::Status => Value::Status(self.status),
        }
    }

    /// Replaces one field in place.
    ///
    /// # Errors
    /// Returns [ValueError::TypeMismatch] if the value variant does not match
    /// the field's type; the record is left unchanged.
    pub fn set(&mut self, field: Field, value: Value) -> Result<(), ValueError> {
        match (field, value) {
            (Field::Pid, Value::Int(v)) => self.pid = v,
            (Field::Name, Value::Text(v)) => self.name = v,
            (Field::Priority, Value::Int(v)) => self.priority = v,
            (Field::KernTm, Value::Time(v)) => self.kern_tm = v,
            (Field::FileTm, Value::Time(v)) => self.file_tm = v,
            (Field::CpuUsage, Value::Decimal(v)) => self.cpu_usage = v,
            (Field::Status, Value::Status(v)) => self.status = v,
            _ => return Err(ValueError::TypeMismatch),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        Record {
            pid: 1,
            name: "p1".into(),
            priority: 5,
            kern_tm: Time {
                hour: 1,
                minute: 2,
                second: 3,
            },
            file_tm: Time {
                hour: 4,
                minute: 5,
                second: 6,
            },
            cpu_usage: 1250,
            status: Status::Running,
        }
    }

    #[test]
    fn test_get_every_field() {
        let record = sample();
        assert_eq!(record.get(Field::Pid), Value::Int(1));
        assert_eq!(record.get(Field::Name), Value::Text("p1".into()));
        assert_eq!(record.get(Field::Priority), Value::Int(5));
        assert_eq!(
            record.get(Field::KernTm),
            Value::Time(Time {
                hour: 1,
                minute: 2,
                second: 3
            })
        );
        assert_eq!(record.get(Field::CpuUsage), Value::Decimal(1250));
        assert_eq!(record.get(Field::Status), Value::Status(Status::Running));
    }

    #[test]
    fn test_set_and_mismatch() {
        let mut record = sample();

        record.set(Field::Priority, Value::Int(9)).unwrap();
        assert_eq!(record.priority, 9);

        record
            .set(Field::Status, Value::Status(Status::Dying))
            .unwrap();
        assert_eq!(record.status, Status::Dying);

        let err = record.set(Field::Pid, Value::Text("nope".into()));
        assert_eq!(err, Err(ValueError::TypeMismatch));
        assert_eq!(record.pid, 1);
    }

    #[test]
    fn test_from_values_requires_all_fields() {
        let full: Vec<(Field, Value)> = Field::ALL
            .into_iter()
            .map(|f| (f, sample().get(f)))
            .collect();
        assert_eq!(Record::from_values(full.clone()), Some(sample()));

        let mut missing = full.clone();
        missing.pop();
        assert_eq!(Record::from_values(missing), None);

        let mut mismatched = full;
        mismatched[0] = (Field::Pid, Value::Text("1".into()));
        assert_eq!(Record::from_values(mismatched), None);
    }
}
