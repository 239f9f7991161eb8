use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::journal::Journal;
use crate::misc::{iter_months, next_month};
use crate::tseries::TSeries;

/// Whether a monthly register lists months without transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Density {
    /// only months with at least one transaction
    #[default]
    Sparse,
    /// every month between the first and the last active month
    Dense,
}

/// Transactions grouped by month, ascending. Each entry is keyed by
/// the first day of its month.
pub type MonthlyRegister = Vec<(NaiveDate, Journal)>;

/// Groups the transactions of the journal by month.
///
/// With `Density::Dense` the months between the first and the last
/// active month that have no transactions are filled with an empty
/// journal, giving a gap-free time axis.
pub fn monthly_register(journal: &Journal, density: Density) -> MonthlyRegister {
    let sparse = journal.group_by_month();

    let bounds = sparse.first().zip(sparse.last()).map(|(f, l)| (f.0, l.0));

    let reg = match (density, bounds) {
        (Density::Dense, Some((first, last))) => {
            let mut active = sparse.into_iter().peekable();
            iter_months(first, last)
                .map(|m| match active.next_if(|(am, _)| *am == m) {
                    Some(entry) => entry,
                    None => (m, Journal::default()),
                })
                .collect()
        }
        _ => sparse,
    };

    debug!(months = reg.len(), ?density, "monthly register");
    reg
}

/// Sum of the amounts of each month of the register. Empty months
/// yield zero.
pub fn monthly_subtotals(register: &[(NaiveDate, Journal)]) -> TSeries {
    register.iter().map(|(m, j)| (*m, j.balance())).collect()
}

/// Running balance of the subtotals.
///
/// The balance accumulated through a month is reported against the
/// *following* month: it is the balance carried into that month.
///
/// ```
/// use chrono::NaiveDate;
/// use rust_decimal::dec;
/// use ledger_trends::{register::monthly_balances, tseries::TSeries};
///
/// let d = |m| NaiveDate::from_ymd_opt(2024, m, 1).unwrap();
/// let subtotals: TSeries = [(d(1), dec!(150)), (d(2), dec!(10))].into_iter().collect();
///
/// let balances = monthly_balances(&subtotals);
/// assert_eq!(balances.at(d(2)), Some(dec!(150)));
/// assert_eq!(balances.at(d(3)), Some(dec!(160)));
/// ```
pub fn monthly_balances(subtotals: &TSeries) -> TSeries {
    subtotals
        .cumulative()
        .into_iter()
        .map(|(m, v)| (next_month(m), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rust_decimal::{Decimal, dec};

    use crate::date;
    use crate::journal::Transaction;

    fn journal() -> Journal {
        Journal::new(vec![
            Transaction::new(date!(2024, 1, 15), "Assets:Bank:Checking", dec!(100.00)),
            Transaction::new(date!(2024, 1, 20), "Assets:Bank:Savings", dec!(50.00)),
            Transaction::new(date!(2024, 2, 1), "Assets:Cash", dec!(10.00)),
        ])
    }

    #[test]
    fn test_subtotals_and_balances() {
        let reg = monthly_register(&journal(), Density::Sparse);
        let subtotals = monthly_subtotals(&reg);
        assert_eq!(
            subtotals.iter().collect::<Vec<_>>(),
            vec![
                (date!(2024, 1, 1), dec!(150.00)),
                (date!(2024, 2, 1), dec!(10.00))
            ]
        );

        let balances = monthly_balances(&subtotals);
        assert_eq!(
            balances.iter().collect::<Vec<_>>(),
            vec![
                (date!(2024, 2, 1), dec!(150.00)),
                (date!(2024, 3, 1), dec!(160.00))
            ]
        );
    }

    #[test]
    fn test_dense_register() {
        let journal = Journal::new(vec![
            Transaction::new(date!(2023, 1, 3), "Expenses:Rent", dec!(500)),
            Transaction::new(date!(2023, 4, 28), "Expenses:Rent", dec!(510)),
            Transaction::new(date!(2023, 4, 29), "Expenses:Food", dec!(12.30)),
        ]);

        let sparse = monthly_register(&journal, Density::Sparse);
        assert_eq!(sparse.len(), 2);

        let dense = monthly_register(&journal, Density::Dense);
        let months = dense.iter().map(|(m, j)| (*m, j.len())).collect::<Vec<_>>();
        assert_eq!(
            months,
            vec![
                (date!(2023, 1, 1), 1),
                (date!(2023, 2, 1), 0),
                (date!(2023, 3, 1), 0),
                (date!(2023, 4, 1), 2)
            ]
        );

        let subtotals = monthly_subtotals(&dense);
        assert_eq!(subtotals.at(date!(2023, 2, 1)), Some(Decimal::ZERO));
        assert_eq!(subtotals.at(date!(2023, 3, 1)), Some(Decimal::ZERO));
        assert_eq!(subtotals.at(date!(2023, 4, 1)), Some(dec!(522.30)));
    }

    #[test]
    fn test_subtotals_conserve_amounts() {
        let mut journal = journal();
        journal.extend([
            Transaction::new(date!(2024, 6, 30), "Assets:Cash", dec!(-3.33)),
            Transaction::new(date!(2023, 12, 31), "Assets:Cash", dec!(7.01)),
        ]);

        for density in [Density::Sparse, Density::Dense] {
            let subtotals = monthly_subtotals(&monthly_register(&journal, density));
            assert_eq!(subtotals.total(), journal.balance());

            // each balance is the running sum of the subtotals, one month later
            let balances = monthly_balances(&subtotals);
            let mut running = Decimal::ZERO;
            for ((m, sub), (bm, bal)) in subtotals.iter().zip(balances.iter()) {
                running += sub;
                assert_eq!(bm, next_month(m));
                assert_eq!(bal, running);
            }
        }
    }

    #[test]
    fn test_empty_journal() {
        for density in [Density::Sparse, Density::Dense] {
            let reg = monthly_register(&Journal::default(), density);
            assert!(reg.is_empty());
            assert!(monthly_balances(&monthly_subtotals(&reg)).is_empty());
        }
    }
}
