use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{Fingerprint, FingerprintCache};
use crate::error::Error;
use crate::journal::{Journal, RawRecord};

/// Where the transactions come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// a `ledger csv` export, `None` reads it from stdin
    Csv(Option<PathBuf>),
    /// a ledger journal, exported through `<cmd> -f <file> csv`
    Ledger { cmd: String, file: PathBuf },
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("fail reading {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("invalid csv: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Record(#[from] Error),

    #[error("`{cmd}` exited with {status}: {stderr}")]
    Command {
        cmd: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl SourceError {
    fn io(path: impl AsRef<Path>) -> impl FnOnce(io::Error) -> SourceError {
        let path = path.as_ref().to_path_buf();
        move |source| SourceError::Io { path, source }
    }
}

/// Reads a headerless `ledger csv` export into a journal.
pub fn read_csv(r: impl Read) -> Result<Journal, SourceError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(r);

    let rows = rdr.records().collect::<Result<Vec<_>, _>>()?;
    let journal = Journal::from_records(
        rows.iter()
            .enumerate()
            .map(|(i, row)| RawRecord::new(i, row.iter())),
    )?;

    Ok(journal)
}

/// Runs `<cmd> -f <file> csv` and returns its standard output.
pub fn run_ledger_csv(cmd: &str, file: &Path) -> Result<Vec<u8>, SourceError> {
    let out = Command::new(cmd)
        .arg("-f")
        .arg(file)
        .arg("csv")
        .output()
        .map_err(SourceError::io(cmd))?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr).trim().to_owned();
        warn!(cmd, status = %out.status, %stderr, "ledger command failed");
        return Err(SourceError::Command {
            cmd: cmd.to_owned(),
            status: out.status,
            stderr,
        });
    }

    Ok(out.stdout)
}

/// Raw csv content of a `Source::Csv`, read from stdin when no path is
/// given.
fn csv_content(path: Option<&Path>) -> Result<Vec<u8>, SourceError> {
    match path {
        Some(path) => fs::read(path).map_err(SourceError::io(path)),
        None => {
            let mut buf = Vec::new();
            io::stdin()
                .read_to_end(&mut buf)
                .map_err(SourceError::io("<stdin>"))?;
            Ok(buf)
        }
    }
}

/// Reads the journal of `src`, without any caching.
pub fn read(src: &Source) -> Result<Journal, SourceError> {
    let journal = match src {
        Source::Csv(path) => read_csv(csv_content(path.as_deref())?.as_slice())?,
        Source::Ledger { cmd, file } => read_csv(run_ledger_csv(cmd, file)?.as_slice())?,
    };

    info!(xacts = journal.len(), "journal read");
    Ok(journal)
}

/// Loads the journal of `src`, reusing the cached one when the content
/// of the source did not change. Meant for hosts that keep `cache`
/// alive across requests.
///
/// For a ledger journal the fingerprint is taken over the journal file
/// itself, so the ledger command only runs when the file changed.
pub fn load(src: &Source, cache: &FingerprintCache<Journal>) -> Result<Arc<Journal>, SourceError> {
    let journal = match src {
        Source::Csv(path) => {
            let content = csv_content(path.as_deref())?;
            let fp = Fingerprint::of(&content);
            cache.get_or_try_insert(fp, || read_csv(content.as_slice()))?
        }
        Source::Ledger { cmd, file } => {
            let fp = Fingerprint::of(fs::read(file).map_err(SourceError::io(file))?);
            cache.get_or_try_insert(fp, || read_csv(run_ledger_csv(cmd, file)?.as_slice()))?
        }
    };

    info!(xacts = journal.len(), "journal loaded");
    Ok(journal)
}
