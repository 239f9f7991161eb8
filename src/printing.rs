use std::io::{self, Write};

use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, presets};
use rust_decimal::Decimal;

use crate::account_tree::AccountRow;
use crate::report::{NamedSeries, Report};

/// Output format of the report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fmt {
    Tty,
    Json,
    Lisp,
}

/// Writes `report` to `out` in the format `fmt`.
///
/// A closed pipe on the reading end is not an error: the output is
/// usually piped through `head` or a pager.
pub fn report(mut out: impl Write, report: &Report, fmt: Fmt) -> io::Result<()> {
    let res = match fmt {
        Fmt::Tty => print_tty(&mut out, report),
        Fmt::Json => serde_json::to_string(report)
            .map_err(io::Error::other)
            .and_then(|s| writeln!(out, "{}", s)),
        Fmt::Lisp => serde_lexpr::to_string(report)
            .map_err(io::Error::other)
            .and_then(|s| writeln!(out, "{}", s)),
    };

    match res {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        res => res,
    }
}

fn print_tty(mut out: impl Write, report: &Report) -> io::Result<()> {
    let mut summary = Table::new();
    summary.load_preset(presets::NOTHING);

    let mut total = Decimal::ZERO;
    for row in &report.summary {
        if row.level == 0 {
            total += row.amount;
        }
        summary.add_row(summary_row(row));
    }

    summary.add_row(vec![
        Cell::new("--------------")
            .add_attribute(Attribute::Bold)
            .set_alignment(CellAlignment::Right),
    ]);
    summary.add_row(vec![amount(total)]);
    writeln!(out, "{}", summary)?;

    for s in &report.series {
        writeln!(out)?;
        writeln!(out, "{}", series_table(s))?;
    }

    Ok(())
}

fn summary_row(row: &AccountRow) -> Vec<Cell> {
    vec![
        amount(row.amount),
        Cell::new(format!("{}{}", "  ".repeat(row.level), row.name))
            .fg(Color::DarkBlue)
            .set_alignment(CellAlignment::Left),
    ]
}

fn series_table(s: &NamedSeries) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::NOTHING).set_header(vec![
        Cell::new("Month").add_attribute(Attribute::Bold),
        Cell::new(&s.name)
            .add_attribute(Attribute::Bold)
            .fg(Color::DarkBlue)
            .set_alignment(CellAlignment::Right),
    ]);

    table.add_rows(s.series.iter().map(|(month, value)| {
        vec![Cell::new(month.format("%Y-%m")), amount(value)]
    }));

    table
}

/// Returns a right aligned `Cell` displaying `q` with two decimals,
/// red if negative.
fn amount(q: Decimal) -> Cell {
    let text = format!("{:.2}", q);
    let text = if q < Decimal::ZERO {
        console::style(text).red().to_string()
    } else {
        text
    };

    Cell::new(text).set_alignment(CellAlignment::Right)
}
