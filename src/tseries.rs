use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::{AddAssign, Neg};

use crate::error::Error;
use crate::register::Density;

/// A value per date, ordered by date.
#[derive(Debug, PartialEq, Eq, Serialize, Clone, Default)]
pub struct TSeries {
    pub ts: BTreeMap<NaiveDate, Decimal>,
}

/// Kind of moving average used to smooth a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Average {
    /// arithmetic mean of the window
    #[default]
    Simple,
    /// exponential smoothing seeded with the oldest value of the window
    Exponential,
    /// linearly weighted mean, the newest value weighs the most
    Weighted,
}

/// How a monthly series is derived before being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeriesOptions {
    /// flip the sign of every value before smoothing
    pub negate: bool,
    pub average: Average,
    /// number of trailing points of the moving average
    pub window: usize,
    /// whether months without activity show up in the series
    pub density: Density,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        SeriesOptions {
            negate: false,
            average: Average::Simple,
            window: 1,
            density: Density::Sparse,
        }
    }
}

impl SeriesOptions {
    /// Negates the series if requested, then smooths it.
    pub fn apply(&self, series: TSeries) -> Result<TSeries, Error> {
        let series = if self.negate { -series } else { series };
        series.moving_average(self.window, self.average)
    }
}

impl TSeries {
    pub fn len(&self) -> usize {
        self.ts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ts.is_empty()
    }

    pub fn at(&self, d: NaiveDate) -> Option<Decimal> {
        self.ts.get(&d).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, Decimal)> + '_ {
        self.ts.iter().map(|(d, v)| (*d, *v))
    }

    /// Sum of all values of the series.
    pub fn total(&self) -> Decimal {
        self.ts.values().sum()
    }

    /// Running sum of the series: each value becomes the sum of all
    /// values up to and including its date.
    pub fn cumulative(&self) -> TSeries {
        self.iter()
            .scan(Decimal::ZERO, |accum, (d, v)| {
                *accum += v;
                Some((d, *accum))
            })
            .collect()
    }

    /// Smooths the series with a trailing moving average of `window`
    /// points.
    ///
    /// Near the start of the series the window shrinks: the value at
    /// index `i` is computed over the last `min(i + 1, window)` points,
    /// so the first value is always kept as is.
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use rust_decimal::dec;
    /// use ledger_trends::tseries::{Average, TSeries};
    ///
    /// let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
    /// let s: TSeries = [(d(1), dec!(1)), (d(2), dec!(2)), (d(3), dec!(6))]
    ///     .into_iter()
    ///     .collect();
    ///
    /// let avg = s.moving_average(2, Average::Simple).unwrap();
    /// assert_eq!(avg.at(d(1)), Some(dec!(1)));
    /// assert_eq!(avg.at(d(2)), Some(dec!(1.5)));
    /// assert_eq!(avg.at(d(3)), Some(dec!(4)));
    /// ```
    pub fn moving_average(&self, window: usize, kind: Average) -> Result<TSeries, Error> {
        if window == 0 {
            return Err(Error::EmptyWindow);
        }

        let values = self.ts.values().copied().collect::<Vec<_>>();
        let smoothed = self.ts.keys().enumerate().map(|(i, d)| {
            let from = (i + 1).saturating_sub(window);
            kind.of(&values[from..=i])
                .map(|v| (*d, v))
                .ok_or(Error::Overflow)
        });

        smoothed.collect()
    }
}

impl Average {
    /// Average of a non empty window, oldest value first. `None` if an
    /// intermediate result does not fit in a `Decimal`.
    fn of(self, w: &[Decimal]) -> Option<Decimal> {
        let n = Decimal::from(w.len());
        match self {
            Average::Simple => w
                .iter()
                .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))?
                .checked_div(n),
            Average::Weighted => {
                let weighted = w
                    .iter()
                    .zip(1u64..)
                    .try_fold(Decimal::ZERO, |acc, (v, k)| {
                        acc.checked_add(v.checked_mul(Decimal::from(k))?)
                    })?;
                weighted.checked_div(n * (n + Decimal::ONE) / Decimal::TWO)
            }
            Average::Exponential => {
                let alpha = Decimal::TWO / (n + Decimal::ONE);
                let (seed, rest) = w.split_first()?;
                rest.iter().try_fold(*seed, |ema, v| {
                    alpha
                        .checked_mul(*v)?
                        .checked_add((Decimal::ONE - alpha).checked_mul(ema)?)
                })
            }
        }
    }
}

impl Neg for TSeries {
    type Output = TSeries;
    fn neg(self) -> Self::Output {
        self.ts.into_iter().map(|(d, v)| (d, -v)).collect()
    }
}

impl AddAssign<TSeries> for TSeries {
    fn add_assign(&mut self, rhs: TSeries) {
        rhs.ts.into_iter().for_each(|(t, m)| {
            *self.ts.entry(t).or_default() += m;
        });
    }
}

impl IntoIterator for TSeries {
    type Item = (NaiveDate, Decimal);
    type IntoIter = std::collections::btree_map::IntoIter<NaiveDate, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.ts.into_iter()
    }
}

impl<'a> IntoIterator for &'a TSeries {
    type Item = (&'a NaiveDate, &'a Decimal);
    type IntoIter = std::collections::btree_map::Iter<'a, NaiveDate, Decimal>;

    fn into_iter(self) -> Self::IntoIter {
        self.ts.iter()
    }
}

impl FromIterator<(NaiveDate, Decimal)> for TSeries {
    fn from_iter<T: IntoIterator<Item = (NaiveDate, Decimal)>>(iter: T) -> Self {
        Self {
            ts: iter.into_iter().collect(),
        }
    }
}
