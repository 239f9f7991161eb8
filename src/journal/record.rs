use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::{AccName, State, Transaction};
use crate::error::{Error, Field};

/// Accepted date layouts, ledger's own first.
const DATE_FORMATS: [&str; 2] = ["%Y/%m/%d", "%Y-%m-%d"];

/// The raw text fields of one transaction, as exported by `ledger csv`:
/// `date, code, payee, account, currency, amount, cost, note`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord<'r> {
    /// position of the record in its source, used to report errors
    pub index: usize,
    pub fields: Vec<&'r str>,
}

impl<'r> RawRecord<'r> {
    pub fn new(index: usize, fields: impl IntoIterator<Item = &'r str>) -> RawRecord<'r> {
        RawRecord {
            index,
            fields: fields.into_iter().collect(),
        }
    }

    fn malformed(&self, field: Field, value: &str) -> Error {
        Error::MalformedRecord {
            record: self.index,
            field,
            value: value.to_owned(),
        }
    }

    fn parse_date(&self, s: &str) -> Result<NaiveDate, Error> {
        let s = s.trim();
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
            .ok_or_else(|| self.malformed(Field::Date, s))
    }

    fn parse_account(&self, s: &str) -> Result<AccName, Error> {
        let acc = AccName::from(s.trim());
        if acc.segments().any(|seg| seg.is_empty()) {
            return Err(self.malformed(Field::Account, s));
        }

        Ok(acc)
    }

    fn parse_amount(&self, s: &str) -> Result<Decimal, Error> {
        Decimal::from_str(s.trim()).map_err(|_| self.malformed(Field::Amount, s))
    }

    /// The cost column carries either a clearing mark or a numeric cost.
    fn parse_cost(&self, s: &str) -> Result<(State, Option<Decimal>), Error> {
        match s.trim() {
            "" => Ok((State::None, None)),
            "*" => Ok((State::Cleared, None)),
            "!" => Ok((State::Pending, None)),
            cost => match Decimal::from_str(cost) {
                Ok(c) => Ok((State::Cleared, Some(c))),
                Err(_) => Err(self.malformed(Field::Cost, s)),
            },
        }
    }
}

impl TryFrom<RawRecord<'_>> for Transaction {
    type Error = Error;

    fn try_from(rec: RawRecord<'_>) -> Result<Self, Self::Error> {
        let [date, code, payee, account, currency, amount, cost, note] = rec.fields[..] else {
            return Err(rec.malformed(Field::Columns, &rec.fields.len().to_string()));
        };

        let (state, cost) = rec.parse_cost(cost)?;

        Ok(Transaction {
            date: rec.parse_date(date)?,
            code: code.to_owned(),
            payee: payee.to_owned(),
            account: rec.parse_account(account)?,
            currency: currency.to_owned(),
            amount: rec.parse_amount(amount)?,
            state,
            cost,
            note: note.to_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rust_decimal::dec;

    use crate::date;

    fn record(fields: [&str; 8]) -> RawRecord<'_> {
        RawRecord::new(3, fields)
    }

    #[test]
    fn test_parse_record() -> Result<(), Error> {
        let rec = record([
            "2024/01/15",
            "42",
            "Employer",
            "Assets:Bank:Checking",
            "$",
            "100.00",
            "*",
            "salary",
        ]);

        let xact = Transaction::try_from(rec)?;
        assert_eq!(
            xact,
            Transaction {
                date: date!(2024, 1, 15),
                code: "42".to_owned(),
                payee: "Employer".to_owned(),
                account: AccName::from("Assets:Bank:Checking"),
                currency: "$".to_owned(),
                amount: dec!(100.00),
                state: State::Cleared,
                cost: None,
                note: "salary".to_owned(),
            }
        );

        let xact = Transaction::try_from(record([
            "2024-03-02",
            "",
            "Shop",
            "Expenses:Food",
            "$",
            "-12.5",
            "",
            "",
        ]))?;
        assert_eq!(xact.date, date!(2024, 3, 2));
        assert_eq!(xact.amount, dec!(-12.5));
        assert!(xact.is_uncleared());

        let xact = Transaction::try_from(record([
            "2024-03-02",
            "",
            "Broker",
            "Assets:Stocks",
            "ACME",
            "3",
            "150.25",
            "",
        ]))?;
        assert_eq!(xact.cost, Some(dec!(150.25)));
        assert_eq!(xact.state, State::Cleared);
        assert!(!xact.is_uncleared());

        Ok(())
    }

    #[test]
    fn test_malformed_record() {
        let bad_date = record(["2024/13/01", "", "", "Assets", "$", "1", "", ""]);
        assert_eq!(
            Transaction::try_from(bad_date),
            Err(Error::MalformedRecord {
                record: 3,
                field: Field::Date,
                value: "2024/13/01".to_owned()
            })
        );

        let bad_amount = record(["2024/01/01", "", "", "Assets", "$", "ten", "", ""]);
        assert!(matches!(
            Transaction::try_from(bad_amount),
            Err(Error::MalformedRecord {
                field: Field::Amount,
                ..
            })
        ));

        let bad_account = record(["2024/01/01", "", "", "Assets::Bank", "$", "1", "", ""]);
        assert!(matches!(
            Transaction::try_from(bad_account),
            Err(Error::MalformedRecord {
                field: Field::Account,
                ..
            })
        ));

        let bad_cost = record(["2024/01/01", "", "", "Assets", "$", "1", "?", ""]);
        assert!(matches!(
            Transaction::try_from(bad_cost),
            Err(Error::MalformedRecord {
                field: Field::Cost,
                ..
            })
        ));

        let short = RawRecord::new(0, ["2024/01/01", "", "Assets"]);
        assert_eq!(
            Transaction::try_from(short),
            Err(Error::MalformedRecord {
                record: 0,
                field: Field::Columns,
                value: "3".to_owned()
            })
        );
    }
}
