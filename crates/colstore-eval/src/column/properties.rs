//! Monotonicity classification and value lookup.

use colstore_common::{ColumnMode, Properties};

use super::core::ColumnCore;

pub fn classify(core: &ColumnCore) -> Properties {
    let rows = core.row_count();
    if rows == 0 || !core.mode().is_numeric() {
        return Properties::No;
    }
    let flagged = !core.invalid().is_empty() || !core.masked().is_empty();
    if flagged && (0..rows).any(|row| !core.is_usable(row)) {
        return Properties::No;
    }
    if rows == 1 {
        return Properties::NonMonotonic;
    }

    // -1 undecided, 0 ruled out, 1 established
    let mut increasing = -1;
    let mut decreasing = -1;
    let mut prev = f64::NAN;
    for row in 0..rows {
        let value = core.buffer().value_at(row);
        if value.is_nan() {
            return Properties::NonMonotonic;
        }
        if row > 0 {
            if value > prev {
                decreasing = 0;
                if increasing < 0 {
                    increasing = 1;
                }
            } else if value < prev {
                increasing = 0;
                if decreasing < 0 {
                    decreasing = 1;
                }
            }
            if increasing == 0 && decreasing == 0 {
                return Properties::NonMonotonic;
            }
        }
        prev = value;
    }

    match (increasing, decreasing) {
        (i, d) if i < 0 && d < 0 => Properties::Constant,
        (1, _) => Properties::MonotonicIncreasing,
        (_, 1) => Properties::MonotonicDecreasing,
        _ => Properties::NonMonotonic,
    }
}

fn partition_point(n: usize, pred: impl Fn(usize) -> bool) -> usize {
    let (mut lo, mut hi) = (0, n);
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if pred(mid) {
            lo = mid + 1;
        } else {
            hi = mid;
        }
    }
    lo
}

fn usable_value(core: &ColumnCore, row: usize) -> Option<f64> {
    let v = core.buffer().value_at(row);
    (!v.is_nan() && core.is_usable(row)).then_some(v)
}

/// Row holding `target`, or the nearest row whose value lies below
/// (`want_lower`) or above it. Monotonic columns are bisected; others are
/// scanned, falling back to the overall nearest row when no row lies on the
/// requested side. `None` for empty or non-numeric columns.
pub fn index_for_value(
    core: &ColumnCore,
    properties: Properties,
    target: f64,
    want_lower: bool,
) -> Option<usize> {
    let n = core.row_count();
    if n == 0 || !core.mode().is_numeric() || target.is_nan() {
        return None;
    }
    let value = |row: usize| core.buffer().value_at(row);
    match properties {
        Properties::Constant => Some(0),
        Properties::MonotonicIncreasing => {
            let k = partition_point(n, |r| value(r) < target);
            Some(if k < n && value(k) == target {
                k
            } else if k == 0 {
                0
            } else if k == n {
                n - 1
            } else if want_lower {
                k - 1
            } else {
                k
            })
        }
        Properties::MonotonicDecreasing => {
            let k = partition_point(n, |r| value(r) > target);
            Some(if k < n && value(k) == target {
                k
            } else if k == 0 {
                0
            } else if k == n {
                n - 1
            } else if want_lower {
                k
            } else {
                k - 1
            })
        }
        Properties::No | Properties::NonMonotonic => scan_for_value(core, target, want_lower),
    }
}

fn scan_for_value(core: &ColumnCore, target: f64, want_lower: bool) -> Option<usize> {
    let mut side: Option<(usize, f64)> = None;
    let mut any: Option<(usize, f64)> = None;
    for row in 0..core.row_count() {
        let Some(v) = usable_value(core, row) else {
            continue;
        };
        let dist = (v - target).abs();
        if any.is_none_or(|(_, d)| dist < d) {
            any = Some((row, dist));
        }
        let on_side = if want_lower { v <= target } else { v >= target };
        if on_side && side.is_none_or(|(_, d)| dist < d) {
            side = Some((row, dist));
        }
    }
    side.or(any).map(|(row, _)| row)
}

/// Row whose value is closest to `target`.
pub fn nearest_index(core: &ColumnCore, properties: Properties, target: f64) -> Option<usize> {
    if !properties.is_monotonic() {
        let mut best: Option<(usize, f64)> = None;
        for row in 0..core.row_count() {
            let Some(v) = usable_value(core, row) else {
                continue;
            };
            let dist = (v - target).abs();
            if best.is_none_or(|(_, d)| dist < d) {
                best = Some((row, dist));
            }
        }
        return best.map(|(row, _)| row);
    }
    let lower = index_for_value(core, properties, target, true)?;
    let upper = index_for_value(core, properties, target, false)?;
    let value = |row: usize| core.buffer().value_at(row);
    if (value(upper) - target).abs() < (value(lower) - target).abs() {
        Some(upper)
    } else {
        Some(lower)
    }
}

fn clamp_range(core: &ColumnCore, start: usize, end: usize) -> Option<(usize, usize)> {
    let n = core.row_count();
    if n == 0 || start >= n {
        return None;
    }
    let end = end.min(n - 1);
    (start <= end).then_some((start, end))
}

fn extreme(
    core: &ColumnCore,
    properties: Properties,
    start: usize,
    end: usize,
    want_min: bool,
) -> f64 {
    if !core.mode().is_numeric() && core.mode() != ColumnMode::DateTime {
        return f64::NAN;
    }
    let Some((start, end)) = clamp_range(core, start, end) else {
        return f64::NAN;
    };
    let value = |row: usize| core.buffer().value_at(row);
    match (properties, want_min) {
        (Properties::Constant, _) => return value(start),
        (Properties::MonotonicIncreasing, true) | (Properties::MonotonicDecreasing, false) => {
            return value(start);
        }
        (Properties::MonotonicIncreasing, false) | (Properties::MonotonicDecreasing, true) => {
            return value(end);
        }
        _ => {}
    }
    let values = (start..=end).filter_map(|row| usable_value(core, row));
    if want_min {
        values.fold(f64::NAN, f64::min)
    } else {
        values.fold(f64::NAN, f64::max)
    }
}

/// Smallest usable value in rows `start..=end` (clamped); NaN if none.
pub fn minimum(core: &ColumnCore, properties: Properties, start: usize, end: usize) -> f64 {
    extreme(core, properties, start, end, true)
}

pub fn maximum(core: &ColumnCore, properties: Properties, start: usize, end: usize) -> f64 {
    extreme(core, properties, start, end, false)
}

/// Usable rows whose value lies in `[min, max]`.
pub fn row_count_in(core: &ColumnCore, min: f64, max: f64) -> usize {
    (0..core.row_count())
        .filter_map(|row| usable_value(core, row))
        .filter(|v| *v >= min && *v <= max)
        .count()
}

fn has_value(core: &ColumnCore, row: usize) -> bool {
    match core.mode() {
        ColumnMode::Integer | ColumnMode::BigInt => row < core.row_count(),
        _ => !core.buffer().is_default_at(row),
    }
}

/// Rows that are valid, unmasked and hold a value; counting stops at
/// `max` when it is non-zero.
pub fn available_row_count(core: &ColumnCore, max: usize) -> usize {
    let mut count = 0;
    for row in 0..core.row_count() {
        if core.is_usable(row) && has_value(core, row) {
            count += 1;
            if max > 0 && count == max {
                break;
            }
        }
    }
    count
}
