//! Typed backing store of a column.
//!
//! Each variant owns its native sequence. Switching modes builds a new
//! variant through [`ColumnBuffer::convert`]; values are translated, never
//! reinterpreted. Accessors that do not match the active mode, or that point
//! past the end, return the type default.

use chrono::NaiveDateTime;
use colstore_common::{ColumnMode, format_date_time, from_millis, parse_date_time, to_millis};

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnBuffer {
    Double(Vec<f64>),
    Integer(Vec<i32>),
    BigInt(Vec<i64>),
    Text(Vec<String>),
    /// `None` is an invalid (unset) date-time.
    DateTime(Vec<Option<NaiveDateTime>>),
}

/// One value of any mode.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Double(f64),
    Integer(i32),
    BigInt(i64),
    Text(String),
    DateTime(Option<NaiveDateTime>),
}

impl CellValue {
    pub fn mode(&self) -> ColumnMode {
        match self {
            CellValue::Double(_) => ColumnMode::Double,
            CellValue::Integer(_) => ColumnMode::Integer,
            CellValue::BigInt(_) => ColumnMode::BigInt,
            CellValue::Text(_) => ColumnMode::Text,
            CellValue::DateTime(_) => ColumnMode::DateTime,
        }
    }
}

impl Default for ColumnBuffer {
    fn default() -> Self {
        ColumnBuffer::Double(Vec::new())
    }
}

macro_rules! each_variant {
    ($buf:expr, $v:ident => $body:expr) => {
        match $buf {
            ColumnBuffer::Double($v) => $body,
            ColumnBuffer::Integer($v) => $body,
            ColumnBuffer::BigInt($v) => $body,
            ColumnBuffer::Text($v) => $body,
            ColumnBuffer::DateTime($v) => $body,
        }
    };
}

fn grow_to<T: Clone>(vec: &mut Vec<T>, len: usize, default: T) {
    if vec.len() < len {
        vec.resize(len, default);
    }
}

/// `false`, leaving `vec` alone, when the end row overflows `usize`.
fn replace_slice<T: Clone>(vec: &mut Vec<T>, first: usize, values: &[T], default: T) -> bool {
    let Some(end) = first.checked_add(values.len()) else {
        return false;
    };
    grow_to(vec, end, default);
    vec[first..end].clone_from_slice(values);
    true
}

fn insert_default<T: Clone>(vec: &mut Vec<T>, before: usize, count: usize, default: T) {
    if before > vec.len() {
        return;
    }
    vec.splice(before..before, std::iter::repeat_n(default, count));
}

fn remove_range<T>(vec: &mut Vec<T>, first: usize, count: usize) {
    if first >= vec.len() {
        return;
    }
    let end = first.saturating_add(count).min(vec.len());
    vec.drain(first..end);
}

fn copy_range<T: Clone>(
    dst: &mut Vec<T>,
    src: &[T],
    src_start: usize,
    dst_start: usize,
    count: usize,
    default: T,
) {
    let Some(end) = dst_start.checked_add(count) else {
        return;
    };
    grow_to(dst, end, default.clone());
    for k in 0..count {
        dst[dst_start + k] = src
            .get(src_start.saturating_add(k))
            .cloned().unwrap_or_else(|| default.clone());
    }
}

fn f64_to_i32(v: f64) -> i32 {
    let r = v.round();
    if r.is_finite() && r >= i32::MIN as f64 && r <= i32::MAX as f64 {
        r as i32
    } else {
        0
    }
}

fn f64_to_i64(v: f64) -> i64 {
    let r = v.round();
    // i64::MAX as f64 rounds up to 2^63, which is out of range
    if r.is_finite() && r >= i64::MIN as f64 && r < i64::MAX as f64 {
        r as i64
    } else {
        0
    }
}

fn parse_f64(s: &str) -> f64 {
    s.trim().parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_i32(s: &str) -> i32 {
    let s = s.trim();
    s.parse::<i32>().unwrap_or_else(|_| f64_to_i32(parse_f64(s)))
}

fn parse_i64(s: &str) -> i64 {
    let s = s.trim();
    s.parse::<i64>().unwrap_or_else(|_| f64_to_i64(parse_f64(s)))
}

/// Text form used when a numeric value is shown or converted to text.
pub fn format_double(v: f64) -> String {
    if v.is_nan() { String::new() } else { v.to_string() }
}

impl ColumnBuffer {
    /// `len` rows of the mode's default value.
    pub fn new(mode: ColumnMode, len: usize) -> Self {
        match mode {
            ColumnMode::Double => ColumnBuffer::Double(vec![f64::NAN; len]),
            ColumnMode::Integer => ColumnBuffer::Integer(vec![0; len]),
            ColumnMode::BigInt => ColumnBuffer::BigInt(vec![0; len]),
            ColumnMode::Text => ColumnBuffer::Text(vec![String::new(); len]),
            ColumnMode::DateTime => ColumnBuffer::DateTime(vec![None; len]),
        }
    }

    pub fn mode(&self) -> ColumnMode {
        match self {
            ColumnBuffer::Double(_) => ColumnMode::Double,
            ColumnBuffer::Integer(_) => ColumnMode::Integer,
            ColumnBuffer::BigInt(_) => ColumnMode::BigInt,
            ColumnBuffer::Text(_) => ColumnMode::Text,
            ColumnBuffer::DateTime(_) => ColumnMode::DateTime,
        }
    }

    pub fn len(&self) -> usize {
        each_variant!(self, v => v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow with defaults or truncate.
    pub fn resize(&mut self, len: usize) {
        match self {
            ColumnBuffer::Double(v) => v.resize(len, f64::NAN),
            ColumnBuffer::Integer(v) => v.resize(len, 0),
            ColumnBuffer::BigInt(v) => v.resize(len, 0),
            ColumnBuffer::Text(v) => v.resize(len, String::new()),
            ColumnBuffer::DateTime(v) => v.resize(len, None),
        }
    }

    /// Insert `count` default rows before `before`; ignored past the end.
    pub fn insert_rows(&mut self, before: usize, count: usize) {
        match self {
            ColumnBuffer::Double(v) => insert_default(v, before, count, f64::NAN),
            ColumnBuffer::Integer(v) => insert_default(v, before, count, 0),
            ColumnBuffer::BigInt(v) => insert_default(v, before, count, 0),
            ColumnBuffer::Text(v) => insert_default(v, before, count, String::new()),
            ColumnBuffer::DateTime(v) => insert_default(v, before, count, None),
        }
    }

    /// Remove up to `count` rows starting at `first`.
    pub fn remove_rows(&mut self, first: usize, count: usize) {
        each_variant!(self, v => remove_range(v, first, count))
    }

    /// Rows `first..first+count` as a new buffer of the same mode (clamped).
    pub fn slice(&self, first: usize, count: usize) -> ColumnBuffer {
        let len = self.len();
        let start = first.min(len);
        let end = first.saturating_add(count).min(len);
        match self {
            ColumnBuffer::Double(v) => ColumnBuffer::Double(v[start..end].to_vec()),
            ColumnBuffer::Integer(v) => ColumnBuffer::Integer(v[start..end].to_vec()),
            ColumnBuffer::BigInt(v) => ColumnBuffer::BigInt(v[start..end].to_vec()),
            ColumnBuffer::Text(v) => ColumnBuffer::Text(v[start..end].to_vec()),
            ColumnBuffer::DateTime(v) => ColumnBuffer::DateTime(v[start..end].to_vec()),
        }
    }

    /// Copy `count` rows of `src` (same mode) into this buffer, growing it
    /// as needed. Returns `false` without touching anything on a mode
    /// mismatch.
    pub fn copy_from(
        &mut self,
        src: &ColumnBuffer,
        src_start: usize,
        dst_start: usize,
        count: usize,
    ) -> bool {
        match (self, src) {
            (ColumnBuffer::Double(d), ColumnBuffer::Double(s)) => {
                copy_range(d, s, src_start, dst_start, count, f64::NAN)
            }
            (ColumnBuffer::Integer(d), ColumnBuffer::Integer(s)) => {
                copy_range(d, s, src_start, dst_start, count, 0)
            }
            (ColumnBuffer::BigInt(d), ColumnBuffer::BigInt(s)) => {
                copy_range(d, s, src_start, dst_start, count, 0)
            }
            (ColumnBuffer::Text(d), ColumnBuffer::Text(s)) => {
                copy_range(d, s, src_start, dst_start, count, String::new())
            }
            (ColumnBuffer::DateTime(d), ColumnBuffer::DateTime(s)) => {
                copy_range(d, s, src_start, dst_start, count, None)
            }
            _ => return false,
        }
        true
    }

    /// Numeric view: integers widened, date-times as ms since epoch,
    /// text and missing rows as NaN.
    pub fn value_at(&self, row: usize) -> f64 {
        match self {
            ColumnBuffer::Double(v) => v.get(row).copied().unwrap_or(f64::NAN),
            ColumnBuffer::Integer(v) => v.get(row).map(|x| *x as f64).unwrap_or(0.0),
            ColumnBuffer::BigInt(v) => v.get(row).map(|x| *x as f64).unwrap_or(0.0),
            ColumnBuffer::Text(_) => f64::NAN,
            ColumnBuffer::DateTime(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|dt| to_millis(&dt) as f64)
                .unwrap_or(f64::NAN),
        }
    }

    pub fn double_at(&self, row: usize) -> f64 {
        match self {
            ColumnBuffer::Double(v) => v.get(row).copied().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }

    pub fn integer_at(&self, row: usize) -> i32 {
        match self {
            ColumnBuffer::Integer(v) => v.get(row).copied().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn big_int_at(&self, row: usize) -> i64 {
        match self {
            ColumnBuffer::BigInt(v) => v.get(row).copied().unwrap_or(0),
            _ => 0,
        }
    }

    pub fn text_at(&self, row: usize) -> &str {
        match self {
            ColumnBuffer::Text(v) => v.get(row).map(String::as_str).unwrap_or(""),
            _ => "",
        }
    }

    pub fn date_time_at(&self, row: usize) -> Option<NaiveDateTime> {
        match self {
            ColumnBuffer::DateTime(v) => v.get(row).copied().flatten(),
            _ => None,
        }
    }

    /// Human-readable text of any mode; empty for NaN/invalid values.
    pub fn display_text(&self, row: usize) -> String {
        match self {
            ColumnBuffer::Double(v) => v.get(row).map(|x| format_double(*x)).unwrap_or_default(),
            ColumnBuffer::Integer(v) => v.get(row).map(|x| x.to_string()).unwrap_or_default(),
            ColumnBuffer::BigInt(v) => v.get(row).map(|x| x.to_string()).unwrap_or_default(),
            ColumnBuffer::Text(v) => v.get(row).cloned().unwrap_or_default(),
            ColumnBuffer::DateTime(v) => v
                .get(row)
                .copied()
                .flatten()
                .map(|dt| format_date_time(&dt))
                .unwrap_or_default(),
        }
    }

    /// True when `row` holds the mode's default value (or is past the end).
    pub fn is_default_at(&self, row: usize) -> bool {
        match self {
            ColumnBuffer::Double(v) => v.get(row).is_none_or(|x| x.is_nan()),
            ColumnBuffer::Integer(v) => v.get(row).is_none_or(|x| *x == 0),
            ColumnBuffer::BigInt(v) => v.get(row).is_none_or(|x| *x == 0),
            ColumnBuffer::Text(v) => v.get(row).is_none_or(|x| x.is_empty()),
            ColumnBuffer::DateTime(v) => v.get(row).is_none_or(|x| x.is_none()),
        }
    }

    pub fn set_double(&mut self, row: usize, value: f64) -> bool {
        self.replace_doubles(row, &[value])
    }

    pub fn set_integer(&mut self, row: usize, value: i32) -> bool {
        self.replace_integers(row, &[value])
    }

    pub fn set_big_int(&mut self, row: usize, value: i64) -> bool {
        self.replace_big_ints(row, &[value])
    }

    pub fn set_text(&mut self, row: usize, value: &str) -> bool {
        match self {
            ColumnBuffer::Text(v) => {
                let Some(end) = row.checked_add(1) else {
                    return false;
                };
                grow_to(v, end, String::new());
                v[row] = value.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn set_date_time(&mut self, row: usize, value: Option<NaiveDateTime>) -> bool {
        self.replace_date_times(row, &[value])
    }

    pub fn replace_doubles(&mut self, first: usize, values: &[f64]) -> bool {
        match self {
            ColumnBuffer::Double(v) => {
                replace_slice(v, first, values, f64::NAN)
            }
            _ => false,
        }
    }

    pub fn replace_integers(&mut self, first: usize, values: &[i32]) -> bool {
        match self {
            ColumnBuffer::Integer(v) => {
                replace_slice(v, first, values, 0)
            }
            _ => false,
        }
    }

    pub fn replace_big_ints(&mut self, first: usize, values: &[i64]) -> bool {
        match self {
            ColumnBuffer::BigInt(v) => {
                replace_slice(v, first, values, 0)
            }
            _ => false,
        }
    }

    pub fn replace_texts(&mut self, first: usize, values: &[String]) -> bool {
        match self {
            ColumnBuffer::Text(v) => {
                replace_slice(v, first, values, String::new())
            }
            _ => false,
        }
    }

    pub fn replace_date_times(&mut self, first: usize, values: &[Option<NaiveDateTime>]) -> bool {
        match self {
            ColumnBuffer::DateTime(v) => {
                replace_slice(v, first, values, None)
            }
            _ => false,
        }
    }

    /// Value at `row` in this buffer's mode (type default past the end).
    pub fn cell(&self, row: usize) -> CellValue {
        match self {
            ColumnBuffer::Double(_) => CellValue::Double(self.double_at(row)),
            ColumnBuffer::Integer(_) => CellValue::Integer(self.integer_at(row)),
            ColumnBuffer::BigInt(_) => CellValue::BigInt(self.big_int_at(row)),
            ColumnBuffer::Text(_) => CellValue::Text(self.text_at(row).to_string()),
            ColumnBuffer::DateTime(_) => CellValue::DateTime(self.date_time_at(row)),
        }
    }

    /// Store `value` at `row`; `false` when the modes differ or the row
    /// cannot be addressed.
    pub fn set_cell(&mut self, row: usize, value: &CellValue) -> bool {
        match value {
            CellValue::Double(v) => self.set_double(row, *v),
            CellValue::Integer(v) => self.set_integer(row, *v),
            CellValue::BigInt(v) => self.set_big_int(row, *v),
            CellValue::Text(v) => self.set_text(row, v),
            CellValue::DateTime(v) => self.set_date_time(row, *v),
        }
    }

    /// Overwrite rows starting at `first` with `values`; `false` when the
    /// modes differ or the range end overflows.
    pub fn replace(&mut self, first: usize, values: &ColumnBuffer) -> bool {
        match values {
            ColumnBuffer::Double(v) => self.replace_doubles(first, v),
            ColumnBuffer::Integer(v) => self.replace_integers(first, v),
            ColumnBuffer::BigInt(v) => self.replace_big_ints(first, v),
            ColumnBuffer::Text(v) => self.replace_texts(first, v),
            ColumnBuffer::DateTime(v) => self.replace_date_times(first, v),
        }
    }

    /// Best-effort translation of every row into `mode`.
    pub fn convert(&self, mode: ColumnMode) -> ColumnBuffer {
        if mode == self.mode() {
            return self.clone();
        }
        match (self, mode) {
            (ColumnBuffer::Double(v), ColumnMode::Integer) => {
                ColumnBuffer::Integer(v.iter().map(|x| f64_to_i32(*x)).collect())
            }
            (ColumnBuffer::Double(v), ColumnMode::BigInt) => {
                ColumnBuffer::BigInt(v.iter().map(|x| f64_to_i64(*x)).collect())
            }
            (ColumnBuffer::Double(v), ColumnMode::DateTime) => ColumnBuffer::DateTime(
                v.iter()
                    .map(|x| if x.is_finite() { from_millis(f64_to_i64(*x)) } else { None })
                    .collect(),
            ),
            (ColumnBuffer::Integer(v), ColumnMode::Double) => {
                ColumnBuffer::Double(v.iter().map(|x| *x as f64).collect())
            }
            (ColumnBuffer::Integer(v), ColumnMode::BigInt) => {
                ColumnBuffer::BigInt(v.iter().map(|x| *x as i64).collect())
            }
            (ColumnBuffer::Integer(v), ColumnMode::DateTime) => {
                ColumnBuffer::DateTime(v.iter().map(|x| from_millis(*x as i64)).collect())
            }
            (ColumnBuffer::BigInt(v), ColumnMode::Double) => {
                ColumnBuffer::Double(v.iter().map(|x| *x as f64).collect())
            }
            (ColumnBuffer::BigInt(v), ColumnMode::Integer) => {
                ColumnBuffer::Integer(v.iter().map(|x| i32::try_from(*x).unwrap_or(0)).collect())
            }
            (ColumnBuffer::BigInt(v), ColumnMode::DateTime) => {
                ColumnBuffer::DateTime(v.iter().map(|x| from_millis(*x)).collect())
            }
            (ColumnBuffer::Text(v), ColumnMode::Double) => {
                ColumnBuffer::Double(v.iter().map(|s| parse_f64(s)).collect())
            }
            (ColumnBuffer::Text(v), ColumnMode::Integer) => {
                ColumnBuffer::Integer(v.iter().map(|s| parse_i32(s)).collect())
            }
            (ColumnBuffer::Text(v), ColumnMode::BigInt) => {
                ColumnBuffer::BigInt(v.iter().map(|s| parse_i64(s)).collect())
            }
            (ColumnBuffer::Text(v), ColumnMode::DateTime) => {
                ColumnBuffer::DateTime(v.iter().map(|s| parse_date_time(s)).collect())
            }
            (ColumnBuffer::DateTime(v), ColumnMode::Double) => ColumnBuffer::Double(
                v.iter()
                    .map(|x| x.map(|dt| to_millis(&dt) as f64).unwrap_or(f64::NAN))
                    .collect(),
            ),
            (ColumnBuffer::DateTime(v), ColumnMode::Integer) => ColumnBuffer::Integer(
                v.iter()
                    .map(|x| x.and_then(|dt| i32::try_from(to_millis(&dt)).ok()).unwrap_or(0))
                    .collect(),
            ),
            (ColumnBuffer::DateTime(v), ColumnMode::BigInt) => ColumnBuffer::BigInt(
                v.iter().map(|x| x.map(|dt| to_millis(&dt)).unwrap_or(0)).collect(),
            ),
            (_, ColumnMode::Text) => {
                ColumnBuffer::Text((0..self.len()).map(|row| self.display_text(row)).collect())
            }
            // same-mode pairs returned above
            _ => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_per_mode() {
        let b = ColumnBuffer::new(ColumnMode::Double, 2);
        assert!(b.value_at(1).is_nan());
        let b = ColumnBuffer::new(ColumnMode::Integer, 2);
        assert_eq!(b.integer_at(1), 0);
        let b = ColumnBuffer::new(ColumnMode::Text, 2);
        assert_eq!(b.text_at(0), "");
        let b = ColumnBuffer::new(ColumnMode::DateTime, 2);
        assert_eq!(b.date_time_at(0), None);
    }

    #[test]
    fn test_wrong_mode_access_returns_default() {
        let b = ColumnBuffer::Integer(vec![4, 5]);
        assert_eq!(b.value_at(1), 5.0);
        assert!(b.double_at(1).is_nan());
        assert_eq!(b.text_at(0), "");
        assert_eq!(b.big_int_at(0), 0);
        assert_eq!(b.integer_at(7), 0);
    }

    #[test]
    fn test_set_grows_and_rejects_mismatch() {
        let mut b = ColumnBuffer::Double(vec![1.0]);
        assert!(b.set_double(3, 4.0));
        assert_eq!(b.len(), 4);
        assert!(b.value_at(2).is_nan());
        assert!(!b.set_integer(0, 2));
        assert_eq!(b.value_at(0), 1.0);
    }

    #[test]
    fn test_insert_and_remove_rows() {
        let mut b = ColumnBuffer::Integer(vec![1, 2, 3]);
        b.insert_rows(1, 2);
        assert_eq!(b, ColumnBuffer::Integer(vec![1, 0, 0, 2, 3]));
        b.insert_rows(9, 2);
        assert_eq!(b.len(), 5);
        b.remove_rows(3, 10);
        assert_eq!(b, ColumnBuffer::Integer(vec![1, 0, 0]));
    }

    #[test]
    fn test_copy_from_checks_mode() {
        let mut dst = ColumnBuffer::Double(vec![0.0; 2]);
        let src = ColumnBuffer::Double(vec![7.0, 8.0, 9.0]);
        assert!(dst.copy_from(&src, 1, 1, 2));
        assert_eq!(dst, ColumnBuffer::Double(vec![0.0, 8.0, 9.0]));
        assert!(!dst.copy_from(&ColumnBuffer::Integer(vec![1]), 0, 0, 1));
    }

    #[test]
    fn test_conversions() {
        let d = ColumnBuffer::Double(vec![1.6, f64::NAN, -2.4]);
        assert_eq!(d.convert(ColumnMode::Integer), ColumnBuffer::Integer(vec![2, 0, -2]));
        assert_eq!(
            d.convert(ColumnMode::Text),
            ColumnBuffer::Text(vec!["1.6".into(), String::new(), "-2.4".into()])
        );
        let t = ColumnBuffer::Text(vec!["3".into(), "x".into(), "2.5".into()]);
        assert_eq!(t.convert(ColumnMode::BigInt), ColumnBuffer::BigInt(vec![3, 0, 3]));
        let ms = ColumnBuffer::BigInt(vec![86_400_000]);
        let dt = ms.convert(ColumnMode::DateTime);
        assert_eq!(dt.display_text(0), "1970-01-02 00:00:00.000");
        assert_eq!(dt.convert(ColumnMode::BigInt), ms);
    }

    #[test]
    fn test_unaddressable_rows_are_rejected() {
        let mut buf = ColumnBuffer::Double(vec![1.0]);
        assert!(!buf.set_cell(usize::MAX, &CellValue::Double(2.0)));
        assert!(!buf.replace(usize::MAX - 1, &ColumnBuffer::Double(vec![1.0, 2.0])));
        let mut text = ColumnBuffer::Text(vec![]);
        assert!(!text.set_text(usize::MAX, "a"));
        assert_eq!(buf, ColumnBuffer::Double(vec![1.0]));
        assert!(text.is_empty());
    }
}
