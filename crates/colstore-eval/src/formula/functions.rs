//! Built-in formula functions, looked up by name.

use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;

use crate::stats::Statistics;

/// Functions that need the evaluation context rather than plain numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextFn {
    Cell,
    CellDefault,
    Current,
    Quantile,
    Percentile,
    MovingAverage,
    MovingRange,
    SmMin,
    SmMax,
    SmAverage,
    SmRange,
    PeriodicSample,
    RandomSample,
    Rand,
}

#[derive(Clone, Copy)]
pub enum FunctionKind {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
    /// A summary statistic of one column argument, broadcast to every row.
    Aggregate(fn(&Statistics) -> f64),
    Context(ContextFn),
}

impl FunctionKind {
    /// Required argument count.
    pub fn arity(&self) -> usize {
        match self {
            FunctionKind::Unary(_) | FunctionKind::Aggregate(_) => 1,
            FunctionKind::Binary(_) => 2,
            FunctionKind::Context(f) => match f {
                ContextFn::Rand => 0,
                ContextFn::MovingAverage | ContextFn::MovingRange | ContextFn::RandomSample => 1,
                ContextFn::Cell
                | ContextFn::Current
                | ContextFn::Quantile
                | ContextFn::Percentile
                | ContextFn::SmMin
                | ContextFn::SmMax
                | ContextFn::SmAverage
                | ContextFn::SmRange
                | ContextFn::PeriodicSample => 2,
                ContextFn::CellDefault => 3,
            },
        }
    }
}

fn sgn(x: f64) -> f64 {
    if x.is_nan() { x } else { 1f64.copysign(x) }
}

fn theta(x: f64) -> f64 {
    if x >= 0.0 { 1.0 } else { 0.0 }
}

fn rint(x: f64) -> f64 {
    x.round_ties_even()
}

static FUNCTIONS: Lazy<FxHashMap<&'static str, FunctionKind>> = Lazy::new(|| {
    use FunctionKind::*;
    let mut m: FxHashMap<&'static str, FunctionKind> = FxHashMap::default();

    let unary: [(&'static str, fn(f64) -> f64); 27] = [
        ("abs", f64::abs),
        ("fabs", f64::abs),
        ("sqrt", f64::sqrt),
        ("cbrt", f64::cbrt),
        ("exp", f64::exp),
        ("expm1", f64::exp_m1),
        ("ln", f64::ln),
        ("log", f64::ln),
        ("log10", f64::log10),
        ("log2", f64::log2),
        ("log1p", f64::ln_1p),
        ("sin", f64::sin),
        ("cos", f64::cos),
        ("tan", f64::tan),
        ("asin", f64::asin),
        ("acos", f64::acos),
        ("atan", f64::atan),
        ("sinh", f64::sinh),
        ("cosh", f64::cosh),
        ("tanh", f64::tanh),
        ("floor", f64::floor),
        ("ceil", f64::ceil),
        ("round", f64::round),
        ("rint", rint),
        ("trunc", f64::trunc),
        ("sgn", sgn),
        ("theta", theta),
    ];
    for (name, f) in unary {
        m.insert(name, Unary(f));
    }

    let binary: [(&'static str, fn(f64, f64) -> f64); 4] = [
        ("atan2", f64::atan2),
        ("pow", f64::powf),
        ("hypot", f64::hypot),
        // C fmod: result takes the sign of the dividend
        ("fmod", |x, y| x % y),
    ];
    for (name, f) in binary {
        m.insert(name, Binary(f));
    }

    let aggregates: [(&'static str, fn(&Statistics) -> f64); 26] = [
        ("size", |s| s.size as f64),
        ("sum", |s| s.sum),
        ("min", |s| s.minimum),
        ("max", |s| s.maximum),
        ("mean", |s| s.arithmetic_mean),
        ("median", |s| s.median),
        ("stdev", |s| s.standard_deviation),
        ("var", |s| s.variance),
        ("gm", |s| s.geometric_mean),
        ("hm", |s| s.harmonic_mean),
        ("chm", |s| s.contraharmonic_mean),
        ("mode", |s| s.mode),
        ("quartile1", |s| s.first_quartile),
        ("quartile3", |s| s.third_quartile),
        ("iqr", |s| s.iqr),
        ("percentile1", |s| s.percentile_1),
        ("percentile5", |s| s.percentile_5),
        ("percentile10", |s| s.percentile_10),
        ("percentile90", |s| s.percentile_90),
        ("percentile95", |s| s.percentile_95),
        ("percentile99", |s| s.percentile_99),
        ("trimean", |s| s.trimean),
        ("meandev", |s| s.mean_deviation),
        ("meandevmedian", |s| s.mean_deviation_around_median),
        ("mediandev", |s| s.median_deviation),
        ("skew", |s| s.skewness),
    ];
    for (name, f) in aggregates {
        m.insert(name, Aggregate(f));
    }
    m.insert("kurt", Aggregate(|s| s.kurtosis));
    m.insert("entropy", Aggregate(|s| s.entropy));

    for (name, f) in [
        ("cell", ContextFn::Cell),
        ("cell_default", ContextFn::CellDefault),
        ("current", ContextFn::Current),
        ("quantile", ContextFn::Quantile),
        ("percentile", ContextFn::Percentile),
        ("ma", ContextFn::MovingAverage),
        ("mr", ContextFn::MovingRange),
        ("smmin", ContextFn::SmMin),
        ("smmax", ContextFn::SmMax),
        ("sma", ContextFn::SmAverage),
        ("smr", ContextFn::SmRange),
        ("psample", ContextFn::PeriodicSample),
        ("rsample", ContextFn::RandomSample),
        ("rand", ContextFn::Rand),
    ] {
        m.insert(name, Context(f));
    }
    m
});

pub fn lookup(name: &str) -> Option<FunctionKind> {
    FUNCTIONS.get(name).copied()
}

pub fn is_known(name: &str) -> bool {
    FUNCTIONS.contains_key(name)
}

/// Named constants usable as bare identifiers.
pub fn constant(name: &str) -> Option<f64> {
    match name {
        "pi" => Some(std::f64::consts::PI),
        "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Names of every built-in function, sorted.
pub fn function_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = FUNCTIONS.keys().copied().collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_arity() {
        assert_eq!(lookup("sma").map(|f| f.arity()), Some(2));
        assert_eq!(lookup("cell_default").map(|f| f.arity()), Some(3));
        assert_eq!(lookup("rand").map(|f| f.arity()), Some(0));
        assert_eq!(lookup("kurt").map(|f| f.arity()), Some(1));
        assert!(lookup("nope").is_none());
        assert!(function_names().contains(&"hypot"));
    }

    #[test]
    fn test_sign_helpers() {
        assert_eq!(sgn(-3.0), -1.0);
        assert_eq!(theta(0.0), 1.0);
        assert_eq!(theta(-0.5), 0.0);
        assert_eq!(rint(2.5), 2.0);
    }
}
