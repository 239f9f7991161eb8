/// Builds a `NaiveDate`, panicking on an invalid date. Meant for
/// literals in tests and examples.
#[macro_export]
macro_rules! date {
    ($y:expr, $m:expr, $d:expr) => {
        chrono::NaiveDate::from_ymd_opt($y, $m, $d).unwrap()
    };
}
