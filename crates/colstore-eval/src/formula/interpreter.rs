//! Row-wise evaluation of a parsed formula.

use std::cell::RefCell;

use colstore_parse::{ASTNode, ASTNodeType};
use once_cell::unsync::OnceCell;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;

use super::functions::{self, ContextFn, FunctionKind};
use crate::attributes::IntervalFlags;
use crate::stats::{Statistics, quantile_sorted, sorted_samples};

/// Values of one formula variable, captured before the pass starts.
pub struct VariableData {
    values: Vec<f64>,
    masked: IntervalFlags,
    sorted: OnceCell<Vec<f64>>,
    statistics: OnceCell<Statistics>,
}

impl VariableData {
    pub fn new(values: Vec<f64>, masked: IntervalFlags) -> Self {
        Self {
            values,
            masked,
            sorted: OnceCell::new(),
            statistics: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize) -> f64 {
        self.values.get(row).copied().unwrap_or(f64::NAN)
    }

    /// Unmasked, non-NaN samples in ascending order.
    fn sorted(&self) -> &[f64] {
        self.sorted.get_or_init(|| {
            sorted_samples(
                self.values
                    .iter()
                    .enumerate()
                    .filter(|(row, _)| !self.masked.is_set(*row))
                    .map(|(_, v)| *v),
            )
        })
    }

    fn statistics(&self) -> &Statistics {
        self.statistics
            .get_or_init(|| Statistics::from_sorted(self.sorted()))
    }
}

pub struct EvalContext {
    variables: FxHashMap<String, VariableData>,
    rng: RefCell<SmallRng>,
}

impl EvalContext {
    pub fn new(seed: u64) -> Self {
        Self {
            variables: FxHashMap::default(),
            rng: RefCell::new(SmallRng::seed_from_u64(seed)),
        }
    }

    pub fn bind(&mut self, name: impl Into<String>, data: VariableData) {
        self.variables.insert(name.into(), data);
    }

    pub fn variable(&self, name: &str) -> Option<&VariableData> {
        self.variables.get(name)
    }

    /// Shortest and longest variable, or `None` with no variables.
    pub fn length_bounds(&self) -> Option<(usize, usize)> {
        let min = self.variables.values().map(VariableData::len).min()?;
        let max = self.variables.values().map(VariableData::len).max()?;
        Some((min, max))
    }
}

pub struct Interpreter<'a> {
    ctx: &'a EvalContext,
}

impl<'a> Interpreter<'a> {
    pub fn new(ctx: &'a EvalContext) -> Self {
        Self { ctx }
    }

    /// Value of `node` at 0-based `row`. `current` holds the output column
    /// as computed so far in this pass.
    pub fn evaluate(&self, node: &ASTNode, row: usize, current: &[f64]) -> f64 {
        match &node.node_type {
            ASTNodeType::Number(n) => *n,
            ASTNodeType::Variable(name) => self.variable_value(name, row),
            ASTNodeType::UnaryOp { op, expr } => {
                let v = self.evaluate(expr, row, current);
                if op == "-" { -v } else { v }
            }
            ASTNodeType::BinaryOp { op, left, right } => {
                let l = self.evaluate(left, row, current);
                let r = self.evaluate(right, row, current);
                match op.as_str() {
                    "+" => l + r,
                    "-" => l - r,
                    "*" => l * r,
                    "/" => l / r,
                    "^" => l.powf(r),
                    _ => f64::NAN,
                }
            }
            ASTNodeType::Function { name, args } => self.call(name, args, row, current),
        }
    }

    fn variable_value(&self, name: &str, row: usize) -> f64 {
        if let Some(data) = self.ctx.variable(name) {
            return data.get(row);
        }
        if name == "i" {
            return (row + 1) as f64;
        }
        functions::constant(name).unwrap_or(f64::NAN)
    }

    /// Column variable named by a bare identifier argument.
    fn column_arg(&self, node: &ASTNode) -> Option<&'a VariableData> {
        match &node.node_type {
            ASTNodeType::Variable(name) => self.ctx.variable(name),
            _ => None,
        }
    }

    fn call(&self, name: &str, args: &[ASTNode], row: usize, current: &[f64]) -> f64 {
        let Some(kind) = functions::lookup(name) else {
            return f64::NAN;
        };
        if args.len() != kind.arity() {
            return f64::NAN;
        }
        let eval = |k: usize| self.evaluate(&args[k], row, current);
        match kind {
            FunctionKind::Unary(f) => f(eval(0)),
            FunctionKind::Binary(f) => f(eval(0), eval(1)),
            FunctionKind::Aggregate(f) => self
                .column_arg(&args[0])
                .map(|data| f(data.statistics()))
                .unwrap_or(f64::NAN),
            FunctionKind::Context(f) => self.call_context(f, args, row, current),
        }
    }

    fn call_context(&self, f: ContextFn, args: &[ASTNode], row: usize, current: &[f64]) -> f64 {
        let eval = |k: usize| self.evaluate(&args[k], row, current);
        let last_column = || args.last().and_then(|a| self.column_arg(a));
        match f {
            ContextFn::Rand => self.ctx.rng.borrow_mut().r#gen::<f64>(),
            ContextFn::Cell => match (one_based(eval(0)), last_column()) {
                (Some(r), Some(data)) => data.get(r),
                _ => f64::NAN,
            },
            ContextFn::CellDefault => {
                let default = eval(1);
                match (one_based(eval(0)), last_column()) {
                    (Some(r), Some(data)) if r < data.len() => data.get(r),
                    _ => default,
                }
            }
            ContextFn::Current => {
                let default = eval(1);
                one_based(eval(0))
                    .and_then(|r| current.get(r).copied())
                    .unwrap_or(default)
            }
            ContextFn::Quantile | ContextFn::Percentile => {
                let p = eval(0);
                let p = if f == ContextFn::Percentile { p / 100.0 } else { p };
                last_column()
                    .map(|data| quantile_sorted(data.sorted(), p))
                    .unwrap_or(f64::NAN)
            }
            ContextFn::MovingAverage | ContextFn::MovingRange => {
                let (Some(data), true) = (last_column(), row > 0) else {
                    return f64::NAN;
                };
                let (prev, cur) = (data.get(row - 1), data.get(row));
                if f == ContextFn::MovingAverage {
                    (prev + cur) / 2.0
                } else {
                    (cur - prev).abs()
                }
            }
            ContextFn::SmMin | ContextFn::SmMax | ContextFn::SmAverage | ContextFn::SmRange => {
                let (Some(n), Some(data)) = (window_size(eval(0)), last_column()) else {
                    return f64::NAN;
                };
                let start = (row + 1).saturating_sub(n);
                let window = (start..=row).map(|r| data.get(r));
                match f {
                    ContextFn::SmMin => window.fold(f64::NAN, f64::min),
                    ContextFn::SmMax => window.fold(f64::NAN, f64::max),
                    ContextFn::SmAverage => window.sum::<f64>() / n as f64,
                    _ => {
                        let (lo, hi) = window.fold((f64::NAN, f64::NAN), |(lo, hi), v| {
                            (lo.min(v), hi.max(v))
                        });
                        hi - lo
                    }
                }
            }
            ContextFn::PeriodicSample => match (window_size(eval(0)), last_column()) {
                (Some(n), Some(data)) => data.get(row.saturating_mul(n)),
                _ => f64::NAN,
            },
            ContextFn::RandomSample => match last_column() {
                Some(data) if !data.is_empty() => {
                    let r = self.ctx.rng.borrow_mut().gen_range(0..data.len());
                    data.get(r)
                }
                _ => f64::NAN,
            },
        }
    }
}

/// 1-based formula index to a 0-based row.
fn one_based(index: f64) -> Option<usize> {
    (index.is_finite() && index >= 1.0).then(|| index as usize - 1)
}

fn window_size(n: f64) -> Option<usize> {
    (n.is_finite() && n >= 1.0).then_some(n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colstore_parse::parse;

    fn ctx_with(name: &str, values: Vec<f64>) -> EvalContext {
        let mut ctx = EvalContext::new(7);
        ctx.bind(name, VariableData::new(values, IntervalFlags::new()));
        ctx
    }

    fn eval_rows(ctx: &EvalContext, expr: &str, rows: usize) -> Vec<f64> {
        let ast = parse(expr).unwrap();
        let interp = Interpreter::new(ctx);
        let mut out = vec![f64::NAN; rows];
        for row in 0..rows {
            out[row] = interp.evaluate(&ast, row, &out);
        }
        out
    }

    #[test]
    fn test_arithmetic_and_row_index() {
        let ctx = ctx_with("x", vec![1.0, 2.0, 3.0]);
        assert_eq!(eval_rows(&ctx, "2*x + i", 3), vec![3.0, 6.0, 9.0]);
        assert_eq!(eval_rows(&ctx, "2^3^2", 1), vec![512.0]);
    }

    #[test]
    fn test_cell_addressing() {
        let ctx = ctx_with("x", vec![10.0, 20.0, 30.0]);
        let out = eval_rows(&ctx, "cell(i+1, x)", 3);
        assert_eq!(&out[..2], &[20.0, 30.0]);
        assert!(out[2].is_nan());
        assert_eq!(eval_rows(&ctx, "cell_default(i-1, -1, x)", 2), vec![-1.0, 10.0]);
    }

    #[test]
    fn test_current_sees_computed_rows() {
        let ctx = EvalContext::new(0);
        // running count: each row adds one to the previous output
        assert_eq!(eval_rows(&ctx, "current(i-1, 0) + 1", 4), vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_windowed_functions() {
        let ctx = ctx_with("x", vec![1.0, 4.0, 2.0, 8.0]);
        let ma = eval_rows(&ctx, "ma(x)", 4);
        assert!(ma[0].is_nan());
        assert_eq!(&ma[1..], &[2.5, 3.0, 5.0]);
        assert_eq!(eval_rows(&ctx, "mr(x)", 4)[3], 6.0);
        assert_eq!(eval_rows(&ctx, "smmax(2, x)", 4), vec![1.0, 4.0, 4.0, 8.0]);
        assert_eq!(eval_rows(&ctx, "sma(2, x)", 2), vec![0.5, 2.5]);
        assert_eq!(eval_rows(&ctx, "smr(3, x)", 4)[3], 6.0);
        assert_eq!(eval_rows(&ctx, "psample(2, x)", 2), vec![1.0, 2.0]);
    }

    #[test]
    fn test_aggregates_broadcast() {
        let ctx = ctx_with("x", vec![1.0, 1.0, 2.0, 5.0]);
        assert_eq!(eval_rows(&ctx, "mean(x)", 2), vec![2.25, 2.25]);
        assert_eq!(eval_rows(&ctx, "median(x)", 1), vec![1.5]);
        assert_eq!(eval_rows(&ctx, "percentile(50, x)", 1), vec![1.5]);
        assert!(eval_rows(&ctx, "quantile(2, x)", 1)[0].is_nan());
        assert!(eval_rows(&ctx, "mean(2)", 1)[0].is_nan());
    }

    #[test]
    fn test_unknown_names_and_bad_arity_are_nan() {
        let ctx = EvalContext::new(0);
        assert!(eval_rows(&ctx, "nope(1)", 1)[0].is_nan());
        assert!(eval_rows(&ctx, "sin(1, 2)", 1)[0].is_nan());
        assert!(eval_rows(&ctx, "y + 1", 1)[0].is_nan());
        assert!((eval_rows(&ctx, "cos(pi)", 1)[0] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_random_functions_are_seeded() {
        let a = eval_rows(&ctx_with("x", vec![1.0, 2.0, 3.0]), "rsample(x) + rand()", 5);
        let b = eval_rows(&ctx_with("x", vec![1.0, 2.0, 3.0]), "rsample(x) + rand()", 5);
        assert_eq!(a, b);
        assert!(a.iter().all(|v| (1.0..4.0).contains(v)));
    }
}
