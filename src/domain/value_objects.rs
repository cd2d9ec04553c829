//! Domain value objects representing immutable concepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of the object wrapping a scan's findings in each raw scan object
pub const SCAN_RESULTS_KEY: &str = "scanResults";

/// Key of the vulnerability collection inside the scan results object
pub const VULNERABILITIES_KEY: &str = "vulnerabilities";

/// Kind of a remote listing entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
    /// Symlinks, submodules and anything the remote adds later
    #[serde(other)]
    Other,
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::File => write!(f, "file"),
            EntryType::Dir => write!(f, "dir"),
            EntryType::Other => write!(f, "other"),
        }
    }
}

/// Lifecycle of a single ingestion run.
///
/// `Idle -> Listing -> FanningOut -> Draining -> Done`; a listing failure
/// moves straight to `Failed`. Per-file failures never leave the
/// `FanningOut`/`Draining` phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionPhase {
    Idle,
    Listing,
    FanningOut,
    Draining,
    Done,
    Failed,
}

impl IngestionPhase {
    /// Whether `next` is a legal successor of this phase
    pub fn can_advance_to(self, next: IngestionPhase) -> bool {
        use IngestionPhase::*;
        matches!(
            (self, next),
            (Idle, Listing)
                | (Listing, FanningOut)
                | (Listing, Failed)
                | (FanningOut, Draining)
                | (Draining, Done)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, IngestionPhase::Done | IngestionPhase::Failed)
    }
}

impl fmt::Display for IngestionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IngestionPhase::Idle => "idle",
            IngestionPhase::Listing => "listing",
            IngestionPhase::FanningOut => "fanning_out",
            IngestionPhase::Draining => "draining",
            IngestionPhase::Done => "done",
            IngestionPhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_type_deserializes_known_and_unknown_kinds() {
        let kinds: Vec<EntryType> =
            serde_json::from_str(r#"["file", "dir", "symlink", "submodule"]"#).unwrap();
        assert_eq!(
            kinds,
            vec![
                EntryType::File,
                EntryType::Dir,
                EntryType::Other,
                EntryType::Other
            ]
        );
    }

    #[test]
    fn phase_transitions_follow_run_lifecycle() {
        use IngestionPhase::*;
        assert!(Idle.can_advance_to(Listing));
        assert!(Listing.can_advance_to(FanningOut));
        assert!(Listing.can_advance_to(Failed));
        assert!(FanningOut.can_advance_to(Draining));
        assert!(Draining.can_advance_to(Done));

        // Per-file failures are absorbed, never terminal
        assert!(!FanningOut.can_advance_to(Failed));
        assert!(!Draining.can_advance_to(Failed));
        assert!(!Idle.can_advance_to(FanningOut));
        assert!(!Done.can_advance_to(Listing));

        assert!(Done.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!Draining.is_terminal());
    }
}
