pub mod datetime;
pub mod interval;
pub mod mode;

pub use datetime::*;
pub use interval::*;
pub use mode::*;

#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_interval_and_mode_serde() {
        let iv = Interval::new(3, 7);
        let json = serde_json::to_string(&iv).unwrap();
        assert_eq!(serde_json::from_str::<Interval>(&json).unwrap(), iv);

        let json = serde_json::to_string(&ColumnMode::BigInt).unwrap();
        assert_eq!(serde_json::from_str::<ColumnMode>(&json).unwrap(), ColumnMode::BigInt);
    }
}
