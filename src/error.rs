use std::fmt::{self, Display};

use crate::journal::AccName;

/// A field of a raw transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// the record does not have the expected number of columns
    Columns,
    Date,
    Account,
    Amount,
    Cost,
}

/// Errors raised by the aggregation core.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A raw record could not be turned into a transaction.
    ///
    /// `record` is the zero based position of the record in its source
    /// and `value` the offending text.
    #[error("malformed record #{record}: invalid {field} \"{value}\"")]
    MalformedRecord {
        record: usize,
        field: Field,
        value: String,
    },

    /// An amount was registered against an account that was never
    /// inserted in the tree. This is a bug in the fill sequence, not
    /// bad input.
    #[error("unknown account \"{0}\"")]
    UnknownAccount(AccName),

    /// A moving average was requested with a window of zero points.
    #[error("moving average window must contain at least one point")]
    EmptyWindow,

    /// A moving average went past the range of `Decimal`.
    #[error("moving average overflowed")]
    Overflow,
}

impl Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Field::Columns => "column count",
            Field::Date => "date",
            Field::Account => "account",
            Field::Amount => "amount",
            Field::Cost => "cost",
        };

        write!(f, "{}", name)
    }
}
