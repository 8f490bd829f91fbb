//! Running one operation over many files.
//!
//! Each file gets its own [`ByteStore`]. A failing or filtered-out file is
//! recorded in the report and the batch moves on to the next one.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::{
    scan::Outcome,
    store::{ByteStore, Error},
};

/// What happened to the files of a batch.
#[derive(Debug, Default)]
pub struct Report {
    /// Files the handler completed, or stopped early on.
    pub handled: Vec<PathBuf>,
    /// Files the handler rejected, with the reason given.
    pub filtered: Vec<(PathBuf, String)>,
    /// Files that could not be loaded or handled.
    pub failed: Vec<(PathBuf, Error)>,
}

impl Report {
    pub fn total(&self) -> usize {
        self.handled.len() + self.filtered.len() + self.failed.len()
    }
}

/// Load each file and pass it to `handler`.
pub fn run<I, P, F>(paths: I, mut handler: F) -> Report
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
    F: FnMut(&Path, &mut ByteStore) -> Result<Outcome, Error>,
{
    let mut report = Report::default();

    for path in paths {
        let path = path.as_ref();

        let outcome = ByteStore::load(path).and_then(|mut store| handler(path, &mut store));

        match outcome {
            Ok(Outcome::FilteredOut(reason)) => {
                debug!("{}: {reason}", path.display());
                report.filtered.push((path.to_owned(), reason));
            }
            Ok(_) => report.handled.push(path.to_owned()),
            Err(e) => {
                warn!("{}: {e}", path.display());
                report.failed.push((path.to_owned(), e));
            }
        }
    }

    report
}
