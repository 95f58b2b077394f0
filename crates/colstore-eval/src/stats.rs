//! Descriptive statistics over a column's numeric rows.
//!
//! Callers pass the usable samples (masked rows already dropped); NaN
//! samples are skipped here. Quantiles use linear interpolation between
//! order statistics (`h = (n-1)p`, the type-7 estimator). Variance is the
//! sample variance; skewness and kurtosis use population central moments,
//! with kurtosis reported as excess kurtosis.

use rustc_hash::FxHashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub size: usize,
    /// Number of distinct values.
    pub unique: usize,
    pub sum: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub arithmetic_mean: f64,
    pub geometric_mean: f64,
    pub harmonic_mean: f64,
    pub contraharmonic_mean: f64,
    pub mode: f64,
    pub first_quartile: f64,
    pub median: f64,
    pub third_quartile: f64,
    pub iqr: f64,
    pub percentile_1: f64,
    pub percentile_5: f64,
    pub percentile_10: f64,
    pub percentile_90: f64,
    pub percentile_95: f64,
    pub percentile_99: f64,
    pub trimean: f64,
    pub variance: f64,
    pub standard_deviation: f64,
    pub mean_deviation: f64,
    pub mean_deviation_around_median: f64,
    pub median_deviation: f64,
    pub skewness: f64,
    pub kurtosis: f64,
    pub entropy: f64,
}

impl Default for Statistics {
    fn default() -> Self {
        let nan = f64::NAN;
        Self {
            size: 0,
            unique: 0,
            sum: 0.0,
            minimum: nan,
            maximum: nan,
            arithmetic_mean: nan,
            geometric_mean: nan,
            harmonic_mean: nan,
            contraharmonic_mean: nan,
            mode: nan,
            first_quartile: nan,
            median: nan,
            third_quartile: nan,
            iqr: nan,
            percentile_1: nan,
            percentile_5: nan,
            percentile_10: nan,
            percentile_90: nan,
            percentile_95: nan,
            percentile_99: nan,
            trimean: nan,
            variance: nan,
            standard_deviation: nan,
            mean_deviation: nan,
            mean_deviation_around_median: nan,
            median_deviation: nan,
            skewness: nan,
            kurtosis: nan,
            entropy: nan,
        }
    }
}

/// Interpolated quantile of ascending `sorted` data; NaN when empty or
/// `p` is outside `[0, 1]`.
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() || !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let frac = h - lo as f64;
    match sorted.get(lo + 1) {
        Some(next) if frac > 0.0 => sorted[lo] + frac * (next - sorted[lo]),
        _ => sorted[lo],
    }
}

/// NaN-free samples in ascending order.
pub fn sorted_samples(samples: impl IntoIterator<Item = f64>) -> Vec<f64> {
    let mut data: Vec<f64> = samples.into_iter().filter(|v| !v.is_nan()).collect();
    data.sort_by(f64::total_cmp);
    data
}

/// Occurrence count per distinct value; `-0.0` counts as `0.0`.
fn frequencies(data: &[f64]) -> FxHashMap<u64, usize> {
    let mut freq = FxHashMap::default();
    for v in data {
        *freq.entry((v + 0.0).to_bits()).or_insert(0) += 1;
    }
    freq
}

fn geometric_mean(data: &[f64], min: f64) -> f64 {
    let n = data.len() as f64;
    if min <= -100.0 {
        f64::NAN
    } else if min < 0.0 {
        // percentage returns: mean growth factor of (1 + v/100)
        let log_sum: f64 = data.iter().map(|v| (v / 100.0 + 1.0).ln()).sum();
        100.0 * ((log_sum / n).exp() - 1.0)
    } else if min == 0.0 {
        let log_sum: f64 = data
            .iter()
            .map(|v| if *v == 0.0 { 0.0 } else { v.ln() })
            .sum();
        (log_sum / n).exp()
    } else {
        let log_sum: f64 = data.iter().map(|v| v.ln()).sum();
        (log_sum / n).exp()
    }
}

/// Zero when any sample is zero; NaN for samples of both signs.
fn harmonic_mean(n: f64, inv_sum: f64, min: f64, max: f64, data: &[f64]) -> f64 {
    if data.iter().any(|v| *v == 0.0) {
        0.0
    } else if min < 0.0 && max > 0.0 {
        f64::NAN
    } else {
        n / inv_sum
    }
}

impl Statistics {
    pub fn from_samples(samples: impl IntoIterator<Item = f64>) -> Self {
        let data = sorted_samples(samples);
        Self::from_sorted(&data)
    }

    /// `data` must be ascending and NaN-free.
    pub fn from_sorted(data: &[f64]) -> Self {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("statistics", n = data.len()).entered();

        let mut stats = Statistics::default();
        let n = data.len();
        if n == 0 {
            return stats;
        }
        let nf = n as f64;
        stats.size = n;
        stats.minimum = data[0];
        stats.maximum = data[n - 1];

        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut inv_sum = 0.0;
        for v in data {
            sum += v;
            sum_sq += v * v;
            inv_sum += 1.0 / v;
        }
        let mean = sum / nf;
        stats.sum = sum;
        stats.arithmetic_mean = mean;
        stats.geometric_mean = geometric_mean(data, stats.minimum);
        stats.harmonic_mean = harmonic_mean(nf, inv_sum, stats.minimum, stats.maximum, data);
        stats.contraharmonic_mean = sum_sq / sum;

        stats.first_quartile = quantile_sorted(data, 0.25);
        stats.median = quantile_sorted(data, 0.5);
        stats.third_quartile = quantile_sorted(data, 0.75);
        stats.iqr = stats.third_quartile - stats.first_quartile;
        stats.percentile_1 = quantile_sorted(data, 0.01);
        stats.percentile_5 = quantile_sorted(data, 0.05);
        stats.percentile_10 = quantile_sorted(data, 0.10);
        stats.percentile_90 = quantile_sorted(data, 0.90);
        stats.percentile_95 = quantile_sorted(data, 0.95);
        stats.percentile_99 = quantile_sorted(data, 0.99);
        stats.trimean = (stats.first_quartile + 2.0 * stats.median + stats.third_quartile) / 4.0;

        let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
        let mut abs_dev_mean = 0.0;
        let mut abs_dev_median = 0.0;
        for v in data {
            let d = v - mean;
            let d2 = d * d;
            m2 += d2;
            m3 += d2 * d;
            m4 += d2 * d2;
            abs_dev_mean += d.abs();
            abs_dev_median += (v - stats.median).abs();
        }
        stats.variance = if n > 1 { m2 / (nf - 1.0) } else { f64::NAN };
        stats.standard_deviation = stats.variance.sqrt();
        stats.mean_deviation = abs_dev_mean / nf;
        stats.mean_deviation_around_median = abs_dev_median / nf;
        let deviations = sorted_samples(data.iter().map(|v| (v - stats.median).abs()));
        stats.median_deviation = quantile_sorted(&deviations, 0.5);

        let (m2, m3, m4) = (m2 / nf, m3 / nf, m4 / nf);
        stats.skewness = m3 / m2.powf(1.5);
        stats.kurtosis = m4 / (m2 * m2) - 3.0;

        let freq = frequencies(data);
        stats.unique = freq.len();
        let top = freq.values().copied().max().unwrap_or(0);
        let tied = freq.values().filter(|c| **c == top).count();
        stats.mode = if top > 1 && tied == 1 {
            freq.iter()
                .find(|(_, c)| **c == top)
                .map(|(bits, _)| f64::from_bits(*bits))
                .unwrap_or(f64::NAN)
        } else {
            f64::NAN
        };
        stats.entropy = freq
            .values()
            .map(|c| {
                let p = *c as f64 / nf;
                -p * p.log2()
            })
            .sum();

        stats
    }

    /// Size and distinct-value count of text rows.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut seen: FxHashMap<&str, usize> = FxHashMap::default();
        let mut size = 0;
        for t in texts {
            size += 1;
            *seen.entry(t).or_insert(0) += 1;
        }
        Statistics {
            size,
            unique: seen.len(),
            ..Statistics::default()
        }
    }

    /// Size, minimum and maximum of date-time rows given as ms since epoch.
    pub fn from_millis(samples: impl IntoIterator<Item = f64>) -> Self {
        let data = sorted_samples(samples);
        let mut stats = Statistics {
            size: data.len(),
            ..Statistics::default()
        };
        if let (Some(first), Some(last)) = (data.first(), data.last()) {
            stats.minimum = *first;
            stats.maximum = *last;
        }
        stats
    }
}
