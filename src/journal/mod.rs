use std::{
    collections::BTreeSet,
    fmt::{self, Debug, Display},
    ops::Deref,
};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::account_tree::{AccountTree, Summary};
use crate::misc::{self, BetweenDate};

mod record;

pub use record::RawRecord;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum State {
    None,    // It's neither * nor !
    Cleared, // *
    Pending, // !
}

/// The name of an account.
///
/// Account names use a colon-separated hierarchy to represent
/// account structure. For example: `"Assets:Bank:Checking"`
/// and `"Assets:Cash"`.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Default)]
pub struct AccName(String);

impl AccName {
    /// Account name separator
    pub const SEP: &'static str = ":";

    /// Builds an account name joining the given segments with `":"`.
    ///
    /// # Examples
    /// ```
    /// use ledger_trends::journal::AccName;
    ///
    /// let acc = AccName::from_segments(["Assets", "Bank"]);
    /// assert_eq!(acc, AccName::from("Assets:Bank"));
    /// ```
    pub fn from_segments<S: AsRef<str>>(segments: impl IntoIterator<Item = S>) -> AccName {
        let parts = segments
            .into_iter()
            .map(|s| s.as_ref().to_owned())
            .collect::<Vec<_>>();

        AccName(parts.join(AccName::SEP))
    }

    /// Returns an iterator over the account name segments, split by `":"`.
    ///
    /// # Examples
    /// ```
    /// use ledger_trends::journal::AccName;
    ///
    /// let acc = AccName::from("Assets:Bank:Checking");
    /// let parts: Vec<&str> = acc.segments().collect();
    /// assert_eq!(parts, vec!["Assets", "Bank", "Checking"]);
    /// ```
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(AccName::SEP)
    }

    /// Returns true if `prefix` names this account or one of its
    /// parents. The comparison is done segment by segment, so
    /// `Assets:Ban` is not a parent of `Assets:Bank`.
    ///
    /// # Examples
    /// ```
    /// use ledger_trends::journal::AccName;
    ///
    /// let acc = AccName::from("Assets:Bank:Checking");
    /// assert!(acc.is_under(&AccName::from("Assets:Bank")));
    /// assert!(acc.is_under(&AccName::from("Assets:Bank:Checking")));
    /// assert!(!acc.is_under(&AccName::from("Assets:Ban")));
    /// ```
    pub fn is_under(&self, prefix: &AccName) -> bool {
        let mut own = self.segments();
        prefix.segments().all(|p| own.next() == Some(p))
    }

    /// Returns the number of segments of this account name.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Appends a sub-account to the current account name,
    /// joining them with `":"`.
    /// If the current name is empty, returns the sub-account directly.
    ///
    /// # Examples
    /// ```
    /// use ledger_trends::journal::AccName;
    ///
    /// let acc = AccName::from("Assets:Bank");
    /// let acc = acc.append(&("Checking".into()));
    /// let exp = AccName::from("Assets:Bank:Checking");
    /// assert_eq!(acc, exp);
    ///
    /// let acc = AccName::from("");
    /// let acc = acc.append(&("Checking".into()));
    /// let exp = AccName::from("Checking");
    /// assert_eq!(acc, exp);
    /// ```
    pub fn append(&self, sub: &AccName) -> Self {
        if self.is_empty() {
            sub.clone()
        } else {
            AccName(format!("{}{}{}", &self, AccName::SEP, &sub))
        }
    }
}

impl Deref for AccName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Debug for AccName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Display for AccName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AccName {
    fn from(s: String) -> Self {
        AccName(s)
    }
}

impl From<&str> for AccName {
    fn from(s: &str) -> Self {
        AccName(s.to_owned())
    }
}

/// A single movement of `amount` against one account. Transactions
/// are immutable once built, either directly or from a [`RawRecord`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub code: String,
    pub payee: String,
    pub account: AccName,
    pub currency: String,
    /// Debits and credits correspond to positive and negative values,
    /// respectively
    pub amount: Decimal,
    /// clearing state, `State::None` means the transaction is uncleared
    pub state: State,
    /// recorded cost, if the source provided a numeric one
    pub cost: Option<Decimal>,
    pub note: String,
}

impl Transaction {
    /// Creates an uncleared transaction with empty code, payee,
    /// currency and note.
    pub fn new(date: NaiveDate, account: impl Into<AccName>, amount: Decimal) -> Transaction {
        Transaction {
            date,
            code: String::new(),
            payee: String::new(),
            account: account.into(),
            currency: String::new(),
            amount,
            state: State::None,
            cost: None,
            note: String::new(),
        }
    }

    /// Returns true if no cost nor clearing mark was recorded.
    pub fn is_uncleared(&self) -> bool {
        self.state == State::None && self.cost.is_none()
    }
}

/// An ordered set of transactions, sorted by date.
///
/// Every derived set (`filter`, `for_account`, ...) is a new journal
/// holding a subsequence of its parent in the same relative order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Journal {
    xacts: Vec<Transaction>,
}

impl Journal {
    /// Creates a journal from the given transactions. Transactions
    /// are sorted by date, keeping the input order for equal dates.
    pub fn new(mut xacts: Vec<Transaction>) -> Journal {
        xacts.sort_by_key(|x| x.date);
        Journal { xacts }
    }

    /// Builds a journal from raw records, failing on the first record
    /// that can not be converted.
    pub fn from_records<'r>(
        records: impl IntoIterator<Item = RawRecord<'r>>,
    ) -> Result<Journal, crate::error::Error> {
        let xacts = records
            .into_iter()
            .map(Transaction::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Journal::new(xacts))
    }

    /// returns an iterator over all transactions in the journal
    pub fn xacts(&self) -> impl Iterator<Item = &Transaction> {
        self.xacts.iter()
    }

    pub fn len(&self) -> usize {
        self.xacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xacts.is_empty()
    }

    /// Returns a new journal with the transactions satisfying `pred`.
    pub fn filter(&self, mut pred: impl FnMut(&Transaction) -> bool) -> Journal {
        Journal {
            xacts: self.xacts.iter().filter(|x| pred(x)).cloned().collect(),
        }
    }

    /// Transactions posted to `account` or to any of its sub-accounts.
    pub fn for_account(&self, account: &AccName) -> Journal {
        self.filter(|x| x.account.is_under(account))
    }

    /// Transactions dated in the given month.
    pub fn for_month(&self, year: i32, month: u32) -> Journal {
        self.filter(|x| x.date.year() == year && x.date.month() == month)
    }

    /// Transactions with no recorded cost nor clearing mark.
    pub fn uncleared(&self) -> Journal {
        self.filter(|x| x.is_uncleared())
    }

    /// Returns a new journal containing only the transactions whose
    /// dates fall within the optional `from` and `to` date range.
    pub fn filter_by_date(&self, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Journal {
        let between = BetweenDate::new(from, to);
        self.filter(|x| between.check(x.date))
    }

    /// Distinct account names, in lexicographic order.
    pub fn accounts(&self) -> BTreeSet<AccName> {
        self.xacts.iter().map(|x| x.account.clone()).collect()
    }

    /// Sum of the amounts of all transactions.
    pub fn balance(&self) -> Decimal {
        self.xacts.iter().map(|x| x.amount).sum()
    }

    /// Groups transactions by the first day of their month. Only
    /// months with at least one transaction appear, in ascending
    /// order.
    pub fn group_by_month(&self) -> Vec<(NaiveDate, Journal)> {
        // transactions are sorted, so each month is a contiguous run
        let mut groups: Vec<(NaiveDate, Journal)> = Vec::new();
        for x in &self.xacts {
            let month = misc::first_of_month(x.date);
            match groups.last_mut() {
                Some((m, j)) if *m == month => j.xacts.push(x.clone()),
                _ => groups.push((
                    month,
                    Journal {
                        xacts: vec![x.clone()],
                    },
                )),
            }
        }

        groups
    }

    /// Builds the hierarchical summary of this journal: the account
    /// tree of all its accounts, filled with every transaction and
    /// accumulated.
    pub fn summary(&self) -> Result<Summary, crate::error::Error> {
        let mut tree = AccountTree::from_accounts(self.accounts());
        tree.fill(self)?;
        Ok(tree.accumulate())
    }
}

impl FromIterator<Transaction> for Journal {
    fn from_iter<T: IntoIterator<Item = Transaction>>(iter: T) -> Self {
        Journal::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Journal {
    type Item = &'a Transaction;
    type IntoIter = std::slice::Iter<'a, Transaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.xacts.iter()
    }
}

impl Extend<Transaction> for Journal {
    fn extend<T: IntoIterator<Item = Transaction>>(&mut self, iter: T) {
        self.xacts.extend(iter);
        self.xacts.sort_by_key(|x| x.date);
    }
}
