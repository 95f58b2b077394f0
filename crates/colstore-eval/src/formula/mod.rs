//! Column formulas: an expression over other columns, recomputed into the
//! owning column.
//!
//! A binding names its variables and the columns they read. Argument
//! columns are held weakly. With `auto_update` the formula column observes
//! every argument and recomputes after data or row-structure changes; an
//! argument that announces its removal is unbound, which turns the output
//! into NaN until a new column is bound.

pub mod functions;
pub mod interpreter;

use std::rc::Rc;

use colstore_parse::parse;

use crate::column::{Column, ColumnEvent, ColumnObserver, ObserverId, WeakColumn};
use interpreter::{EvalContext, Interpreter, VariableData};

#[derive(Debug, Clone)]
pub struct FormulaVariable {
    pub name: String,
    pub column: Option<WeakColumn>,
    /// Path of the argument column, kept for rebinding after a load.
    pub path: String,
}

impl FormulaVariable {
    pub fn new(name: impl Into<String>, column: &Column) -> Self {
        Self {
            name: name.into(),
            column: Some(column.downgrade()),
            path: column.path(),
        }
    }

    pub fn unbound(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            column: None,
            path: path.into(),
        }
    }

    pub fn column(&self) -> Option<Column> {
        self.column.as_ref().and_then(WeakColumn::upgrade)
    }

    pub fn is_bound(&self) -> bool {
        self.column.as_ref().is_some_and(WeakColumn::is_alive)
    }
}

#[derive(Debug, Clone)]
pub struct FormulaBinding {
    pub expression: String,
    pub variables: Vec<FormulaVariable>,
    pub auto_update: bool,
    pub auto_resize: bool,
}

impl FormulaBinding {
    pub fn new(expression: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            variables: Vec::new(),
            auto_update: false,
            auto_resize: false,
        }
    }

    pub fn variable(mut self, name: impl Into<String>, column: &Column) -> Self {
        self.variables.push(FormulaVariable::new(name, column));
        self
    }

    pub fn auto_update(mut self, on: bool) -> Self {
        self.auto_update = on;
        self
    }

    pub fn auto_resize(mut self, on: bool) -> Self {
        self.auto_resize = on;
        self
    }
}

pub(crate) struct FormulaState {
    binding: FormulaBinding,
    observer: Option<Rc<FormulaObserver>>,
    subscriptions: Vec<(WeakColumn, ObserverId)>,
}

/// Recomputes its target when an argument column changes.
struct FormulaObserver {
    target: WeakColumn,
}

impl ColumnObserver for FormulaObserver {
    fn on_column_event(&self, column: &Column, event: &ColumnEvent) {
        let Some(target) = self.target.upgrade() else {
            return;
        };
        if *event == ColumnEvent::AboutToBeRemoved {
            #[cfg(feature = "tracing")]
            tracing::warn!(
                column = %target.name(),
                argument = %column.name(),
                "formula argument removed; unbinding"
            );
            target.unbind_formula_column(column);
            target.update_formula();
        } else if event.affects_values() {
            target.update_formula();
        }
    }
}

impl Column {
    /// Install `binding` as this column's formula. Recomputation happens
    /// on [`Column::update_formula`] or, with `auto_update`, whenever an
    /// argument changes.
    pub fn set_column_formula(&self, binding: FormulaBinding) {
        self.drop_subscriptions();
        *self.inner.formula.borrow_mut() = Some(FormulaState {
            binding,
            observer: None,
            subscriptions: Vec::new(),
        });
        self.resubscribe();
        self.emit(ColumnEvent::FormulaChanged);
    }

    pub fn clear_column_formula(&self) {
        self.drop_subscriptions();
        let had = self.inner.formula.borrow_mut().take().is_some();
        if had {
            self.emit(ColumnEvent::FormulaChanged);
        }
    }

    pub fn column_formula(&self) -> Option<FormulaBinding> {
        self.inner
            .formula
            .borrow()
            .as_ref()
            .map(|state| state.binding.clone())
    }

    /// Bind every variable whose path equals `path` to `column`. Returns
    /// how many variables were bound.
    pub fn bind_formula_path(&self, path: &str, column: &Column) -> usize {
        let bound = {
            let mut formula = self.inner.formula.borrow_mut();
            let Some(state) = formula.as_mut() else {
                return 0;
            };
            let mut bound = 0;
            for var in state.binding.variables.iter_mut() {
                if var.path == path && !var.column.as_ref().is_some_and(|w| w.points_to(column)) {
                    var.column = Some(column.downgrade());
                    bound += 1;
                }
            }
            bound
        };
        if bound > 0 {
            self.drop_subscriptions();
            self.resubscribe();
        }
        bound
    }

    /// Variables whose argument column is missing or dropped.
    pub fn dangling_formula_paths(&self) -> Vec<String> {
        self.inner
            .formula
            .borrow()
            .as_ref()
            .map(|state| {
                state
                    .binding
                    .variables
                    .iter()
                    .filter(|v| !v.is_bound())
                    .map(|v| v.path.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn unbind_formula_column(&self, column: &Column) {
        let released: Vec<ObserverId> = {
            let mut formula = self.inner.formula.borrow_mut();
            let Some(state) = formula.as_mut() else {
                return;
            };
            for var in state.binding.variables.iter_mut() {
                if var.column.as_ref().is_some_and(|w| w.points_to(column)) {
                    var.column = None;
                }
            }
            let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut state.subscriptions)
                .into_iter()
                .partition(|(w, _)| w.points_to(column));
            state.subscriptions = kept;
            gone.into_iter().map(|(_, id)| id).collect()
        };
        for id in released {
            column.unsubscribe(id);
        }
    }

    fn drop_subscriptions(&self) {
        let subscriptions = match self.inner.formula.borrow_mut().as_mut() {
            Some(state) => std::mem::take(&mut state.subscriptions),
            None => return,
        };
        for (source, id) in subscriptions {
            if let Some(source) = source.upgrade() {
                source.unsubscribe(id);
            }
        }
    }

    fn resubscribe(&self) {
        let (sources, observer) = {
            let mut formula = self.inner.formula.borrow_mut();
            let Some(state) = formula.as_mut() else {
                return;
            };
            if !state.binding.auto_update {
                state.observer = None;
                return;
            }
            let observer = state
                .observer
                .get_or_insert_with(|| {
                    Rc::new(FormulaObserver {
                        target: self.downgrade(),
                    })
                })
                .clone();
            let sources: Vec<Column> = state
                .binding
                .variables
                .iter()
                .filter_map(FormulaVariable::column)
                .filter(|c| !c.ptr_eq(self))
                .collect();
            (sources, observer)
        };

        let mut subscriptions: Vec<(WeakColumn, ObserverId)> = Vec::new();
        for source in sources {
            if subscriptions.iter().any(|(w, _)| w.points_to(&source)) {
                continue;
            }
            let id = source.subscribe(&observer);
            subscriptions.push((source.downgrade(), id));
        }
        if let Some(state) = self.inner.formula.borrow_mut().as_mut() {
            state.subscriptions = subscriptions;
        }
    }

    /// Recompute the column from its formula. Does nothing without a
    /// formula or while a recomputation of this column is in progress.
    pub fn update_formula(&self) {
        let Some(binding) = self.column_formula() else {
            return;
        };
        if self.inner.updating.replace(true) {
            return;
        }
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("update_formula", column = %self.name()).entered();

        let values = self.evaluate_formula(&binding);
        self.editor().write_doubles(values);
        self.inner.updating.set(false);
    }

    fn evaluate_formula(&self, binding: &FormulaBinding) -> Vec<f64> {
        let ast = match parse(&binding.expression) {
            Ok(ast) => ast,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(column = %self.name(), error = %err, "formula does not parse");
                let _ = err;
                return vec![f64::NAN; self.row_count()];
            }
        };

        let mut ctx = EvalContext::new(self.config().random_seed);
        for var in &binding.variables {
            let Some(source) = var.column() else {
                #[cfg(feature = "tracing")]
                tracing::warn!(column = %self.name(), variable = %var.name, "formula argument missing");
                return vec![f64::NAN; self.row_count()];
            };
            let data = {
                let core = source.core();
                let buffer = core.buffer();
                let values: Vec<f64> = if core.mode().is_numeric() {
                    (0..buffer.len()).map(|row| buffer.value_at(row)).collect()
                } else {
                    vec![f64::NAN; buffer.len()]
                };
                VariableData::new(values, core.masked().clone())
            };
            ctx.bind(var.name.clone(), data);
        }

        let bounds = ctx.length_bounds();
        if let Some((_, longest)) = bounds {
            if binding.auto_resize && longest > self.row_count() {
                self.editor().resize(longest);
            }
        }

        let rows = self.row_count();
        let evaluated = match bounds {
            Some((shortest, _)) => shortest.min(rows),
            None => rows,
        };
        let mut out: Vec<f64> = {
            let core = self.core();
            (0..rows).map(|row| core.buffer().value_at(row)).collect()
        };
        let interp = Interpreter::new(&ctx);
        for row in 0..evaluated {
            out[row] = interp.evaluate(&ast, row, &out);
        }
        for v in out.iter_mut().skip(evaluated) {
            *v = f64::NAN;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstore_common::ColumnMode;

    #[test]
    fn test_constant_expression_fills_every_row() {
        let col = Column::from_doubles("c", vec![0.0; 3]);
        col.set_column_formula(FormulaBinding::new("i*10"));
        col.update_formula();
        assert_eq!(
            (0..3).map(|r| col.value_at(r)).collect::<Vec<_>>(),
            vec![10.0, 20.0, 30.0]
        );
    }

    #[test]
    fn test_rows_beyond_shortest_argument_are_nan() {
        let x = Column::from_doubles("x", vec![1.0, 2.0]);
        let y = Column::from_doubles("y", vec![1.0, 1.0, 1.0]);
        let out = Column::from_doubles("out", vec![0.0; 3]);
        out.set_column_formula(FormulaBinding::new("x + y").variable("x", &x).variable("y", &y));
        out.update_formula();
        assert_eq!(out.value_at(1), 3.0);
        assert!(out.value_at(2).is_nan());
    }

    #[test]
    fn test_auto_resize_grows_to_longest_argument() {
        let x = Column::from_doubles("x", vec![1.0, 2.0, 3.0, 4.0]);
        let out = Column::new("out", ColumnMode::Double);
        out.set_column_formula(
            FormulaBinding::new("x*x").variable("x", &x).auto_resize(true),
        );
        out.update_formula();
        assert_eq!(out.row_count(), 4);
        assert_eq!(out.value_at(3), 16.0);
    }

    #[test]
    fn test_parse_error_gives_nan() {
        let out = Column::from_doubles("out", vec![1.0, 2.0]);
        out.set_column_formula(FormulaBinding::new("2 *"));
        out.update_formula();
        assert!(out.value_at(0).is_nan() && out.value_at(1).is_nan());
    }

    #[test]
    fn test_integer_output_is_converted() {
        let x = Column::from_integers("x", vec![1, 2]);
        let out = Column::from_integers("out", vec![0, 0]);
        out.set_column_formula(FormulaBinding::new("x / 2").variable("x", &x));
        out.update_formula();
        assert_eq!(out.integer_at(0), 1);
        assert_eq!(out.integer_at(1), 1);
    }

    #[test]
    fn test_dropped_argument_yields_nan() {
        let out = Column::from_doubles("out", vec![0.0; 2]);
        {
            let x = Column::from_doubles("x", vec![1.0, 2.0]);
            out.set_column_formula(FormulaBinding::new("x").variable("x", &x));
        }
        out.update_formula();
        assert!(out.value_at(0).is_nan());
        assert_eq!(out.dangling_formula_paths(), vec!["x".to_string()]);
    }

    #[test]
    fn test_self_reference_is_not_subscribed() {
        let col = Column::from_doubles("c", vec![1.0, 2.0]);
        col.set_column_formula(
            FormulaBinding::new("c + 1").variable("c", &col).auto_update(true),
        );
        assert_eq!(col.observer_count(), 0);
        col.update_formula();
        assert_eq!(col.value_at(1), 3.0);
    }
}
