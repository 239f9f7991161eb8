use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgGroup, Args, Parser, Subcommand, ValueEnum};
use regex::Regex;
use tracing_subscriber::EnvFilter;

use ledger_trends::{
    journal::AccName,
    printing, register,
    report::{self, Report},
    source::{self, Source},
    tseries::{self, SeriesOptions},
};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let journal = match source::read(&cli.source()) {
        Ok(journal) => journal.filter_by_date(cli.begin, cli.end),
        Err(err) => {
            eprintln!("fail reading journal: {err}");
            std::process::exit(1);
        }
    };

    let opts = cli.series.options();
    let res: Result<Report, _> = match &cli.command {
        Commands::Overview(args) => {
            report::overview(&journal, &args.assets, &args.report_query, &opts)
        }
        Commands::Account(args) => report::account_details(&journal, &args.name, &opts),
    };

    let rep = match res {
        Ok(rep) => rep,
        Err(err) => {
            eprintln!("fail building the report: {err}");
            std::process::exit(1);
        }
    };

    if let Err(err) = printing::report(io::stdout(), &rep, cli.fmt.into()) {
        eprintln!("fail printing the report: {err}");
        std::process::exit(1);
    };
}

/// Output format of the reports
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Fmt {
    Tty,
    Json,
    Lisp,
}

impl From<Fmt> for printing::Fmt {
    fn from(arg: Fmt) -> Self {
        match arg {
            Fmt::Json => printing::Fmt::Json,
            Fmt::Tty => printing::Fmt::Tty,
            Fmt::Lisp => printing::Fmt::Lisp,
        }
    }
}

#[derive(Parser)]
#[command(
    author,
    about,
    long_about = None)] // Read from `Cargo.toml`
#[clap(group(
    ArgGroup::new("input")
        .required(true)
        .args(["journal_path", "csv_path"])
))]
struct Cli {
    /// The ledger file, exported through `<ledger-cmd> -f <file> csv`.
    #[arg(short = 'f', long = "file")]
    journal_path: Option<PathBuf>,

    /// Read an already exported ledger csv, `-` reads it from stdin.
    #[arg(long = "csv")]
    csv_path: Option<PathBuf>,

    /// The ledger executable.
    #[arg(long = "ledger-cmd", default_value = "ledger")]
    ledger_cmd: String,

    /// Only transactions from that date forward will be considered.
    #[arg(short = 'b', long = "begin", global = true)]
    begin: Option<NaiveDate>,

    /// Transactions after that date  will be discarded.
    #[arg(short = 'e', long = "end", global = true)]
    end: Option<NaiveDate>,

    /// Format of report to generate.
    #[arg(long = "fmt", global = true, default_value_t = Fmt::Tty, value_enum)]
    fmt: Fmt,

    #[command(flatten)]
    series: SeriesArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summary of the asset accounts and their monthly balances.
    #[command(alias = "ov")]
    Overview(OverviewArgs),

    /// Summary of one account and the monthly variations of its
    /// uncleared transactions.
    #[command(alias = "acc")]
    Account(AccountArgs),
}

#[derive(Args)]
struct OverviewArgs {
    /// Only accounts that match one of these regular expressions get
    /// their own series.
    report_query: Vec<Regex>,

    /// Top level account holding the assets.
    #[arg(long = "assets", default_value = "Assets")]
    assets: AccName,
}

#[derive(Args)]
struct AccountArgs {
    /// Full name of the account, e.g. `Expenses:Food`.
    name: AccName,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Average {
    #[value(alias = "s")]
    Simple,
    #[value(alias = "e", alias = "ema")]
    Exponential,
    #[value(alias = "w", alias = "wma")]
    Weighted,
}

impl From<Average> for tseries::Average {
    fn from(arg: Average) -> Self {
        match arg {
            Average::Simple => tseries::Average::Simple,
            Average::Exponential => tseries::Average::Exponential,
            Average::Weighted => tseries::Average::Weighted,
        }
    }
}

#[derive(Args)]
#[command(next_help_heading = "Series")]
struct SeriesArgs {
    /// Kind of moving average used to smooth the series.
    #[arg(long = "average", default_value_t = Average::Simple, value_enum, global = true)]
    average: Average,

    /// Number of months of the moving average, 1 disables smoothing.
    #[arg(long = "window", default_value_t = 1, global = true)]
    window: usize,

    /// Flip the sign of the series before smoothing.
    #[arg(long = "negate", global = true)]
    negate: bool,

    /// Also report months without transactions.
    #[arg(long = "dense", global = true)]
    dense: bool,
}

impl SeriesArgs {
    fn options(&self) -> SeriesOptions {
        SeriesOptions {
            negate: self.negate,
            average: self.average.into(),
            window: self.window,
            density: if self.dense {
                register::Density::Dense
            } else {
                register::Density::Sparse
            },
        }
    }
}

impl Cli {
    fn source(&self) -> Source {
        match (&self.csv_path, &self.journal_path) {
            (Some(p), _) if p.as_os_str() == "-" => Source::Csv(None),
            (Some(p), _) => Source::Csv(Some(p.clone())),
            (None, file) => Source::Ledger {
                cmd: self.ledger_cmd.clone(),
                file: file.clone().unwrap_or_default(),
            },
        }
    }
}
