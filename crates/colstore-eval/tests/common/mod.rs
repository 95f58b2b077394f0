#![allow(dead_code)]

use colstore_eval::{Column, UndoStack};
use std::rc::Rc;

pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual} (tolerance {tol})"
    );
}

pub fn doubles(col: &Column) -> Vec<f64> {
    (0..col.row_count()).map(|r| col.value_at(r)).collect()
}

/// Double column with an undo stack attached.
pub fn tracked(name: &str, values: Vec<f64>) -> (Column, Rc<UndoStack>) {
    let col = Column::from_doubles(name, values);
    let stack = Rc::new(UndoStack::new());
    col.set_undo_stack(Some(stack.clone()));
    (col, stack)
}

/// Everything a command may touch, for before/after comparisons.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub texts: Vec<String>,
    pub invalid: Vec<(usize, usize)>,
    pub masked: Vec<(usize, usize)>,
    pub formulas: Vec<(usize, usize, String)>,
    pub width: i32,
}

pub fn snapshot(col: &Column) -> Snapshot {
    let core = col.core();
    Snapshot {
        texts: (0..core.row_count())
            .map(|r| core.buffer().display_text(r))
            .collect(),
        invalid: core.invalid().intervals().map(|i| (i.start(), i.end())).collect(),
        masked: core.masked().intervals().map(|i| (i.start(), i.end())).collect(),
        formulas: core
            .formulas()
            .entries()
            .iter()
            .map(|(i, f)| (i.start(), i.end(), f.clone()))
            .collect(),
        width: core.width(),
    }
}
