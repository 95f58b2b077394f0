//! Sparse per-row attributes stored as runs of rows.
//!
//! ## Representation:
//!
//! A sorted list of `(Interval, value)` entries with three invariants:
//! 1. **Disjoint** - at most one entry contains any row
//! 2. **Coalesced** - no two touching entries carry the same value
//! 3. **Sorted** - entries ordered by start row, so lookups are a binary search
//!
//! Rows not covered by an entry read as `T::default()`. The boolean flavour,
//! [`IntervalFlags`], only ever stores `true` runs, so a column with no
//! invalid or masked rows costs an empty `Vec`.

use colstore_common::Interval;

#[derive(Debug, Clone, PartialEq)]
pub struct IntervalAttribute<T> {
    entries: Vec<(Interval, T)>,
}

impl<T> Default for IntervalAttribute<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> IntervalAttribute<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[(Interval, T)] {
        &self.entries
    }

    pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        self.entries.iter().map(|(iv, _)| *iv)
    }

    /// Value stored for `row`, if any entry covers it.
    pub fn get(&self, row: usize) -> Option<&T> {
        let idx = self.entries.partition_point(|(iv, _)| iv.start() <= row);
        if idx == 0 {
            return None;
        }
        let (iv, value) = &self.entries[idx - 1];
        iv.contains_row(row).then_some(value)
    }

    /// Assign `value` to every row of `interval`.
    pub fn set_value(&mut self, interval: Interval, value: T) {
        self.subtract(&interval);

        let mut merged = interval;
        self.entries.retain(|(iv, v)| {
            if *v == value && iv.touches(&interval) {
                merged = Interval::merge(&merged, iv).unwrap_or(merged);
                false
            } else {
                true
            }
        });

        let pos = self
            .entries
            .partition_point(|(iv, _)| iv.start() < merged.start());
        self.entries.insert(pos, (merged, value));
    }

    /// Drop the rows of `interval` from every entry without storing anything.
    pub fn subtract(&mut self, interval: &Interval) {
        if !self.entries.iter().any(|(iv, _)| iv.intersects(interval)) {
            return;
        }
        let mut out = Vec::with_capacity(self.entries.len() + 1);
        for (iv, value) in self.entries.drain(..) {
            if !iv.intersects(interval) {
                out.push((iv, value));
                continue;
            }
            for piece in Interval::subtract(&iv, interval) {
                out.push((piece, value.clone()));
            }
        }
        self.entries = out;
    }

    /// Open a gap of `count` rows in front of `before`.
    pub fn insert_rows(&mut self, before: usize, count: usize) {
        if count == 0 || self.entries.is_empty() {
            return;
        }
        let mut out = Vec::with_capacity(self.entries.len() + 1);
        for (iv, value) in self.entries.drain(..) {
            if iv.start() >= before {
                out.push((shift_up(&iv, count), value));
            } else if iv.contains_row(before) {
                let pieces = Interval::split(&iv, before);
                out.push((pieces[0], value.clone()));
                if let Some(tail) = pieces.get(1) {
                    out.push((shift_up(tail, count), value));
                }
            } else {
                out.push((iv, value));
            }
        }
        self.entries = out;
    }

    /// Delete `count` rows starting at `first`, closing the gap.
    pub fn remove_rows(&mut self, first: usize, count: usize) {
        let Some(cut) = Interval::with_len(first, count) else {
            return;
        };
        self.subtract(&cut);
        for (iv, _) in self.entries.iter_mut() {
            if iv.start() > cut.end() {
                *iv = Interval::new(iv.start() - count, iv.end() - count);
            }
        }
        self.coalesce();
    }

    fn coalesce(&mut self) {
        let mut out: Vec<(Interval, T)> = Vec::with_capacity(self.entries.len());
        for (iv, value) in self.entries.drain(..) {
            if let Some((last, last_value)) = out.last_mut() {
                if *last_value == value && last.touches(&iv) {
                    *last = Interval::merge(last, &iv).unwrap_or(*last);
                    continue;
                }
            }
            out.push((iv, value));
        }
        self.entries = out;
    }

    /// Check the sorted/disjoint/coalesced invariants.
    pub fn is_normalized(&self) -> bool {
        self.entries.windows(2).all(|w| {
            let (a, va) = &w[0];
            let (b, vb) = &w[1];
            a.end() < b.start() && !(va == vb && a.touches(b))
        })
    }
}

impl<T: Clone + PartialEq + Default> IntervalAttribute<T> {
    /// Value for `row`, or the type default when no entry covers it.
    pub fn value(&self, row: usize) -> T {
        self.get(row).cloned().unwrap_or_default()
    }
}

fn shift_up(iv: &Interval, count: usize) -> Interval {
    Interval::new(iv.start() + count, iv.end() + count)
}

/// Boolean per-row flag that only materializes `true` runs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntervalFlags {
    inner: IntervalAttribute<bool>,
}

impl IntervalFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn set(&mut self, interval: Interval, flag: bool) {
        if flag {
            self.inner.set_value(interval, true);
        } else {
            self.inner.subtract(&interval);
        }
    }

    pub fn is_set(&self, row: usize) -> bool {
        self.inner.get(row).copied().unwrap_or(false)
    }

    /// True when every row of `interval` is set.
    pub fn is_set_interval(&self, interval: &Interval) -> bool {
        // runs are coalesced, so one entry must cover the whole interval
        self.inner.intervals().any(|iv| iv.contains(interval))
    }

    pub fn intervals(&self) -> impl Iterator<Item = Interval> + '_ {
        self.inner.intervals()
    }

    pub fn insert_rows(&mut self, before: usize, count: usize) {
        self.inner.insert_rows(before, count);
    }

    pub fn remove_rows(&mut self, first: usize, count: usize) {
        self.inner.remove_rows(first, count);
    }

    pub fn is_normalized(&self) -> bool {
        self.inner.is_normalized()
    }
}
