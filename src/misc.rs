use chrono::{Datelike, Months, NaiveDate};

/// A date range checker.
#[derive(Debug)]
pub enum BetweenDate {
    FromTo(NaiveDate, NaiveDate),
    From(NaiveDate),
    To(NaiveDate),
    Always,
}

impl BetweenDate {
    /// Creates a `BetweenDate` from optional `from` and `to` dates.
    ///
    /// # Arguments
    ///
    /// * `from` - Optional start date
    /// * `to` - Optional end date
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use ledger_trends::misc::BetweenDate;
    ///
    /// let from = Some(NaiveDate::from_ymd_opt(2025,1,1).unwrap());
    /// let to   = Some(NaiveDate::from_ymd_opt(2025,12,31).unwrap());
    /// let between = BetweenDate::new(from, to);
    ///
    /// let date = NaiveDate::from_ymd_opt(2025,6,15).unwrap();
    /// assert!(between.check(date));
    /// ```
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        match (from, to) {
            (Some(f), Some(t)) => BetweenDate::FromTo(f, t),
            (Some(f), None) => BetweenDate::From(f),
            (None, Some(t)) => BetweenDate::To(t),
            (None, None) => BetweenDate::Always,
        }
    }

    /// Returns true if `d` is within the range.
    pub fn check(&self, d: NaiveDate) -> bool {
        match self {
            BetweenDate::FromTo(from, to) => d >= *from && d <= *to,
            BetweenDate::From(from) => d >= *from,
            BetweenDate::To(to) => d <= *to,
            BetweenDate::Always => true,
        }
    }
}

/// Returns the first day of the month `d` belongs to.
///
/// ```
/// use chrono::NaiveDate;
/// use ledger_trends::misc::first_of_month;
///
/// let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
/// assert_eq!(first_of_month(d), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
/// ```
pub fn first_of_month(d: NaiveDate) -> NaiveDate {
    d.with_day(1).unwrap_or(d)
}

/// Returns the first day of the month following the month of `d`.
///
/// ```
/// use chrono::NaiveDate;
/// use ledger_trends::misc::next_month;
///
/// let d = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
/// assert_eq!(next_month(d), NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
/// ```
pub fn next_month(d: NaiveDate) -> NaiveDate {
    let first = first_of_month(d);
    // only fails past NaiveDate::MAX
    first
        .checked_add_months(Months::new(1))
        .unwrap_or(first)
}

/// Iterates over the first day of every month from the month of
/// `from` up to and including the month of `to`. Yields nothing when
/// `from` is after `to`.
pub fn iter_months(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let last = first_of_month(to);
    let mut curr = Some(first_of_month(from));

    std::iter::from_fn(move || {
        let res = curr.filter(|c| *c <= last)?;
        curr = res.checked_add_months(Months::new(1));
        Some(res)
    })
}
