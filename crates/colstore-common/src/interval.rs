//! Inclusive row ranges and the small set-algebra the attribute maps are
//! built on.
//!
//! An [`Interval`] always satisfies `start <= end`; operations whose result
//! could be empty (intersection, subtraction, split) return `Option` or a
//! short list instead of producing a degenerate interval.

use std::fmt;

use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Result of subtracting or splitting an interval: zero, one or two pieces.
pub type IntervalPieces = SmallVec<[Interval; 2]>;

/// Inclusive `[start, end]` range of row indices.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    start: usize,
    end: usize,
}

impl Interval {
    /// Build `[start, end]`. Passing `start > end` is a contract violation.
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end, "interval start {start} after end {end}");
        Self { start, end }
    }

    pub fn try_new(start: usize, end: usize) -> Result<Self, &'static str> {
        if start > end {
            return Err("Interval must be ordered: start <= end");
        }
        Ok(Self { start, end })
    }

    /// Single-row interval `[row, row]`.
    pub fn row(row: usize) -> Self {
        Self {
            start: row,
            end: row,
        }
    }

    /// `count` rows starting at `first`; `None` when `count == 0`.
    pub fn with_len(first: usize, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        Some(Self {
            start: first,
            end: first + count - 1,
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn size(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains_row(&self, row: usize) -> bool {
        self.start <= row && row <= self.end
    }

    pub fn contains(&self, other: &Interval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// True when the two intervals are adjacent without overlapping.
    pub fn touches(&self, other: &Interval) -> bool {
        other.end.checked_add(1) == Some(self.start) || other.start.checked_sub(1) == Some(self.end)
    }

    pub fn intersection(a: &Interval, b: &Interval) -> Option<Interval> {
        if !a.intersects(b) {
            return None;
        }
        Some(Interval {
            start: a.start.max(b.start),
            end: a.end.min(b.end),
        })
    }

    /// Union of two intervals; only defined when they intersect or touch.
    pub fn merge(a: &Interval, b: &Interval) -> Option<Interval> {
        if !(a.intersects(b) || a.touches(b)) {
            return None;
        }
        Some(Interval {
            start: a.start.min(b.start),
            end: a.end.max(b.end),
        })
    }

    /// Rows of `src` not covered by `minus`.
    pub fn subtract(src: &Interval, minus: &Interval) -> IntervalPieces {
        let mut out = IntervalPieces::new();
        let Some(cut) = Interval::intersection(src, minus) else {
            out.push(*src);
            return out;
        };
        if cut.start > src.start {
            out.push(Interval::new(src.start, cut.start - 1));
        }
        if cut.end < src.end {
            out.push(Interval::new(cut.end + 1, src.end));
        }
        out
    }

    /// Split `i` so that `at` becomes the first row of the second piece.
    ///
    /// `at` outside `[start, end]` (or equal to `start`) leaves `i` whole.
    pub fn split(i: &Interval, at: usize) -> IntervalPieces {
        let mut out = IntervalPieces::new();
        if at <= i.start || at > i.end {
            out.push(*i);
            return out;
        }
        out.push(Interval::new(i.start, at - 1));
        out.push(Interval::new(at, i.end));
        out
    }

    /// Shift both ends by `delta`. Returns `None` if the result would leave
    /// the index range.
    pub fn translate(&self, delta: isize) -> Option<Interval> {
        Some(Interval {
            start: self.start.checked_add_signed(delta)?,
            end: self.end.checked_add_signed(delta)?,
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.start, self.end)
    }
}
