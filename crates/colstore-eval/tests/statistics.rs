mod common;

use colstore_eval::{Column, ColumnMode, Statistics};
use colstore_common::from_millis;
use common::assert_close;

#[test]
fn test_small_sample_moments() {
    let s = Column::from_doubles("x", vec![1.0, 1.0, 2.0, 5.0]).statistics();
    assert_eq!(s.size, 4);
    assert_close(s.arithmetic_mean, 2.25, 1e-12);
    assert_close(s.median, 1.5, 1e-12);
    assert_close(s.variance, 3.583_333, 1e-5);
    assert_close(s.skewness, 0.9575, 1e-4);
    assert_eq!(s.mode, 1.0);
    assert_eq!(s.unique, 3);
    assert_eq!(s.minimum, 1.0);
    assert_eq!(s.maximum, 5.0);
    assert_close(s.iqr, s.third_quartile - s.first_quartile, 1e-12);
}

#[test]
fn test_means_with_negative_and_zero_values() {
    let s = Statistics::from_samples([-1.0, 0.0, 2.0, 5.0]);
    assert_close(s.geometric_mean, 1.4743, 1e-4);
    assert_eq!(s.harmonic_mean, 0.0);

    let s = Statistics::from_samples([-150.0, 3.0]);
    assert!(s.geometric_mean.is_nan());

    let s = Statistics::from_samples([1.0, 4.0]);
    assert_close(s.geometric_mean, 2.0, 1e-12);
    assert_close(s.contraharmonic_mean, 17.0 / 5.0, 1e-12);
}

#[test]
fn test_harmonic_mean_of_mixed_signs_is_nan() {
    for values in [vec![-1.0, 2.0], vec![-1.0, 1.0]] {
        let col = Column::from_doubles("x", values);
        assert!(col.statistics().harmonic_mean.is_nan());
    }

    let s = Statistics::from_samples([-1.0, -4.0]);
    assert_close(s.harmonic_mean, -1.6, 1e-12);
    let s = Statistics::from_samples([1.0, 4.0]);
    assert_close(s.harmonic_mean, 1.6, 1e-12);
}

#[test]
fn test_masked_rows_and_nan_are_skipped() {
    let col = Column::from_doubles("x", vec![1.0, f64::NAN, 1000.0, 3.0]);
    col.set_masked_row(2, true);
    let s = col.statistics();
    assert_eq!(s.size, 2);
    assert_close(s.arithmetic_mean, 2.0, 1e-12);
}

#[test]
fn test_invalid_rows_still_count() {
    let col = Column::from_integers("n", vec![2, 4, 6]);
    col.set_invalid_row(0, true);
    assert_eq!(col.statistics().size, 3);
}

#[test]
fn test_empty_column_statistics() {
    let s = Column::new("x", ColumnMode::Double).statistics();
    assert_eq!(s.size, 0);
    assert_eq!(s.sum, 0.0);
    assert!(s.arithmetic_mean.is_nan());
    assert!(s.median.is_nan());
}

#[test]
fn test_text_and_date_time_statistics() {
    let s = Column::from_texts("t", vec!["b", "a", "b", ""]).statistics();
    assert_eq!(s.size, 4);
    assert_eq!(s.unique, 3);
    assert!(s.arithmetic_mean.is_nan());

    let col = Column::from_date_times("d", vec![from_millis(5_000), from_millis(1_000)]);
    let s = col.statistics();
    assert_eq!(s.size, 2);
    assert_eq!(s.minimum, 1_000.0);
    assert_eq!(s.maximum, 5_000.0);
}

#[test]
fn test_statistics_follow_undo() {
    let (col, stack) = common::tracked("x", vec![1.0, 2.0, 3.0]);
    assert_eq!(col.statistics().sum, 6.0);
    col.set_value_at(0, 10.0);
    assert_eq!(col.statistics().sum, 15.0);
    stack.undo();
    assert_eq!(col.statistics().sum, 6.0);
}
