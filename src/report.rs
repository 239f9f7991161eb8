use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::account_tree::AccountRow;
use crate::error::Error;
use crate::journal::{AccName, Journal};
use crate::register::{monthly_balances, monthly_register, monthly_subtotals};
use crate::tseries::{SeriesOptions, TSeries};

/// A monthly series along with the account (or account group) it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedSeries {
    pub name: AccName,
    pub series: TSeries,
}

/// A report: the hierarchical summary of a set of accounts plus some
/// monthly series about them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub title: AccName,
    pub summary: Vec<AccountRow>,
    pub series: Vec<NamedSeries>,
}

/// Monthly balances of the transactions of `journal`, with the series
/// options applied.
fn balances(journal: &Journal, opts: &SeriesOptions) -> Result<TSeries, Error> {
    let reg = monthly_register(journal, opts.density);
    opts.apply(monthly_balances(&monthly_subtotals(&reg)))
}

/// Overview of all the accounts under `root`.
///
/// The series are the monthly balances of `root` itself, followed by
/// the monthly balances of each of its accounts. Only accounts
/// matching one of the `qry` regular expressions get a series, all of
/// them if `qry` is empty.
pub fn overview(
    journal: &Journal,
    root: &AccName,
    qry: &[Regex],
    opts: &SeriesOptions,
) -> Result<Report, Error> {
    let journal = journal.for_account(root);
    let summary = journal.summary()?;

    let mut series = vec![NamedSeries {
        name: root.clone(),
        series: balances(&journal, opts)?,
    }];

    for acc in journal
        .accounts()
        .into_iter()
        .filter(|a| qry.is_empty() || qry.iter().any(|r| r.is_match(a)))
    {
        series.push(NamedSeries {
            series: balances(&journal.for_account(&acc), opts)?,
            name: acc,
        });
    }

    debug!(%root, series = series.len(), "overview report");
    Ok(Report {
        title: root.clone(),
        summary: summary.iter().collect(),
        series,
    })
}

/// Details of a single account: its summary and the monthly
/// variations of its uncleared transactions.
pub fn account_details(
    journal: &Journal,
    account: &AccName,
    opts: &SeriesOptions,
) -> Result<Report, Error> {
    let journal = journal.for_account(account);
    let summary = journal.summary()?;

    let reg = monthly_register(&journal.uncleared(), opts.density);
    let variations = opts.apply(monthly_subtotals(&reg))?;

    debug!(%account, months = variations.len(), "account details report");
    Ok(Report {
        title: account.clone(),
        summary: summary.iter().collect(),
        series: vec![NamedSeries {
            name: account.clone(),
            series: variations,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rust_decimal::dec;

    use crate::date;
    use crate::journal::{State, Transaction};
    use crate::register::Density;
    use crate::tseries::Average;

    fn journal() -> Journal {
        let mut cleared = Transaction::new(date!(2024, 1, 20), "Assets:Bank:Savings", dec!(50.00));
        cleared.state = State::Cleared;

        Journal::new(vec![
            Transaction::new(date!(2024, 1, 15), "Assets:Bank:Checking", dec!(100.00)),
            cleared,
            Transaction::new(date!(2024, 3, 1), "Assets:Cash", dec!(10.00)),
            Transaction::new(date!(2024, 3, 1), "Expenses:Food", dec!(10.00)),
            Transaction::new(date!(2024, 3, 1), "Assets:Bank:Checking", dec!(-20.00)),
        ])
    }

    fn names(r: &Report) -> Vec<String> {
        r.series.iter().map(|s| s.name.to_string()).collect()
    }

    #[test]
    fn test_overview() -> Result<(), Error> {
        let report = overview(
            &journal(),
            &AccName::from("Assets"),
            &[],
            &SeriesOptions::default(),
        )?;

        assert_eq!(report.summary[0].full_name, AccName::from("Assets"));
        assert_eq!(report.summary[0].amount, dec!(140.00));
        assert!(report.summary.iter().all(|r| r.full_name.is_under(&"Assets".into())));

        assert_eq!(
            names(&report),
            vec![
                "Assets",
                "Assets:Bank:Checking",
                "Assets:Bank:Savings",
                "Assets:Cash"
            ]
        );
        assert_eq!(
            report.series[0].series.iter().collect::<Vec<_>>(),
            vec![
                (date!(2024, 2, 1), dec!(150.00)),
                (date!(2024, 4, 1), dec!(140.00))
            ]
        );
        Ok(())
    }

    #[test]
    fn test_overview_query_and_options() -> Result<(), Error> {
        let opts = SeriesOptions {
            negate: true,
            average: Average::Simple,
            window: 2,
            density: Density::Dense,
        };
        let qry = [Regex::new("Cash$").unwrap()];
        let report = overview(&journal(), &AccName::from("Assets"), &qry, &opts)?;

        assert_eq!(names(&report), vec!["Assets", "Assets:Cash"]);

        // dense balances: Feb 150, Mar 150, Apr 140, negated and smoothed
        assert_eq!(
            report.series[0].series.iter().collect::<Vec<_>>(),
            vec![
                (date!(2024, 2, 1), dec!(-150)),
                (date!(2024, 3, 1), dec!(-150)),
                (date!(2024, 4, 1), dec!(-145))
            ]
        );
        Ok(())
    }

    #[test]
    fn test_account_details() -> Result<(), Error> {
        let report = account_details(
            &journal(),
            &AccName::from("Assets:Bank"),
            &SeriesOptions::default(),
        )?;

        let rows = report
            .summary
            .iter()
            .map(|r| (r.name.to_string(), r.amount))
            .collect::<Vec<_>>();
        assert_eq!(
            rows,
            vec![
                ("Assets:Bank".to_owned(), dec!(130.00)),
                ("Checking".to_owned(), dec!(80.00)),
                ("Savings".to_owned(), dec!(50.00)),
            ]
        );

        // the cleared savings transaction is not a variation
        assert_eq!(
            report.series[0].series.iter().collect::<Vec<_>>(),
            vec![
                (date!(2024, 1, 1), dec!(100.00)),
                (date!(2024, 3, 1), dec!(-20.00))
            ]
        );
        Ok(())
    }

    #[test]
    fn test_unknown_root() -> Result<(), Error> {
        let report = overview(
            &journal(),
            &AccName::from("Liabilities"),
            &[],
            &SeriesOptions::default(),
        )?;
        assert!(report.summary.is_empty());
        assert_eq!(report.series.len(), 1);
        assert!(report.series[0].series.is_empty());

        let opts = SeriesOptions {
            window: 0,
            ..SeriesOptions::default()
        };
        assert_eq!(
            account_details(&journal(), &AccName::from("Assets"), &opts),
            Err(Error::EmptyWindow)
        );
        Ok(())
    }
}
