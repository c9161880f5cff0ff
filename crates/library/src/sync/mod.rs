//! Full library imports.
//!
//! Each archive found in the comics directory goes through
//! `Discovered → Identified → Reconciled → Persisted`, or is skipped. See
//! [`Library::import`](crate::Library::import) for the event stream and
//! [`Library::run_full_import`](crate::Library::run_full_import) for a
//! summary of a whole run.

mod file;
mod stream;

pub use self::stream::ImportEvent;

use derive_more::Display;
use longbox_store::models::Issue;
use std::fmt::{Display as FmtDisplay, Formatter, Result as FmtResult};
use std::path::PathBuf;

/// Why an archive was left out of the library.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    #[display("not a zip archive")]
    NotAnArchive,
    #[display("corrupt archive")]
    Corrupt,
    #[display("no pages")]
    NoPages,
}

/// What importing one archive did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(Issue),
    Updated(Issue),
    /// Same path, size and modification time as at the last import.
    Unchanged(Issue),
    Skipped(SkipReason),
}

/// An archive that couldn't be imported this time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub path: PathBuf,
    pub reason: String,
    /// Importing again later might succeed.
    pub retryable: bool,
}

/// Tally of a full import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub created: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub skipped: u64,
    pub failed: u64,
    pub skips: Vec<(PathBuf, SkipReason)>,
    pub failures: Vec<Failure>,
}

impl ImportSummary {
    /// Count one event. Events that aren't about an archive are ignored.
    pub fn record(&mut self, event: &ImportEvent) {
        match event {
            ImportEvent::Processed { outcome: Outcome::Created(_), .. } => self.created += 1,
            ImportEvent::Processed { outcome: Outcome::Updated(_), .. } => self.updated += 1,
            ImportEvent::Processed { outcome: Outcome::Unchanged(_), .. } => self.unchanged += 1,
            ImportEvent::Processed { path, outcome: Outcome::Skipped(reason) } => {
                self.skipped += 1;
                self.skips.push((path.clone(), *reason));
            },
            ImportEvent::Failed { path, error } => {
                self.failed += 1;
                self.failures.push(Failure {
                    path: path.clone(),
                    reason: (**error).to_string(),
                    retryable: error.is_retryable(),
                });
            },
            ImportEvent::Started | ImportEvent::DiscoveryComplete(_) | ImportEvent::Complete => {},
        }
    }

    /// Archives seen, whatever happened to them.
    pub fn total(&self) -> u64 {
        self.created + self.updated + self.unchanged + self.skipped + self.failed
    }
}

impl FmtDisplay for ImportSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} created, {} updated, {} unchanged, {} skipped, {} failed",
            self.created, self.updated, self.unchanged, self.skipped, self.failed
        )
    }
}
