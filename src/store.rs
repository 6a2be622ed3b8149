use std::cmp::Ordering;

use allocative::Allocative;
use bitvec::slice::BitSlice;

use crate::record::Record;

/// The ordered, index-addressable sequence of all current records.
///
/// Insertion order is preserved; indices are zero-based and stay valid until
/// a removal or a sort. The store owns the record memory and is dropped with
/// the session.
#[derive(Debug, Default, Allocative)]
pub struct Store {
    records: Vec<Record>,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends a record at the end.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.records.get_mut(index)
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Removes every record whose bit is set, walking from the highest index
    /// down so the remaining marked indices stay valid. Returns the number of
    /// removed records.
    pub fn remove_marked(&mut self, marks: &BitSlice) -> usize {
        let len = self.records.len();
        let hits: Vec<usize> = marks.iter_ones().take_while(|&i| i < len).collect();
        for &index in hits.iter().rev() {
            self.records.remove(index);
        }
        hits.len()
    }

    /// Stable in-place sort; records comparing equal keep their current
    /// relative order.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Record, &Record) -> Ordering,
    {
        self.records.sort_by(compare);
    }

    /// Bytes held by the store and its records, via `allocative`. Purely
    /// informational; nothing in the command language depends on it.
    pub fn approx_heap_size(&self) -> usize {
        allocative::size_of_unique(self)
    }
}
