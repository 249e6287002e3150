// src/pipeline/stage.rs

//! Pipeline stages and the task state machine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Position of a task in the processing pipeline.
///
/// The forward path is
/// `created -> downloading -> downloaded -> preprocessing -> ready -> running -> finished`.
/// `preprocessed` is never entered by the scheduler; `preprocessing` advances
/// straight to `ready`. `archiving`/`archived` belong to the archiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Created,
    Downloading,
    Downloaded,
    Preprocessing,
    Preprocessed,
    Ready,
    Running,
    Finished,
    Archiving,
    Archived,
    Failed,
}

impl Stage {
    pub const ALL: [Stage; 11] = [
        Stage::Created,
        Stage::Downloading,
        Stage::Downloaded,
        Stage::Preprocessing,
        Stage::Preprocessed,
        Stage::Ready,
        Stage::Running,
        Stage::Finished,
        Stage::Archiving,
        Stage::Archived,
        Stage::Failed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Created => "created",
            Stage::Downloading => "downloading",
            Stage::Downloaded => "downloaded",
            Stage::Preprocessing => "preprocessing",
            Stage::Preprocessed => "preprocessed",
            Stage::Ready => "ready",
            Stage::Running => "running",
            Stage::Finished => "finished",
            Stage::Archiving => "archiving",
            Stage::Archived => "archived",
            Stage::Failed => "failed",
        }
    }

    /// Stage a task enters when it is submitted or when its job succeeds.
    ///
    /// `None` means "no further state"; callers treat it as terminal.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Created => Some(Stage::Downloading),
            Stage::Downloading => Some(Stage::Downloaded),
            Stage::Downloaded => Some(Stage::Preprocessing),
            Stage::Preprocessing => Some(Stage::Ready),
            Stage::Ready => Some(Stage::Running),
            Stage::Running => Some(Stage::Finished),
            _ => None,
        }
    }

    /// Stage a task is rolled back to when its job is lost.
    pub fn previous(self) -> Option<Stage> {
        match self {
            Stage::Downloading => Some(Stage::Created),
            Stage::Downloaded => Some(Stage::Downloading),
            Stage::Preprocessing => Some(Stage::Downloaded),
            Stage::Running => Some(Stage::Ready),
            _ => None,
        }
    }

    /// Whether the catalog reports a task in this stage as "in processing".
    ///
    /// These are the stages strictly between `created` and `finished`.
    pub fn is_processing(self) -> bool {
        matches!(
            self,
            Stage::Downloading
                | Stage::Downloaded
                | Stage::Preprocessing
                | Stage::Preprocessed
                | Stage::Ready
                | Stage::Running
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == wanted)
            .ok_or_else(|| format!("invalid task stage: {s}"))
    }
}

/// Execution phase a submitted job belongs to.
///
/// Each phase has its own container image table and working directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    InputDownloading,
    Preprocessing,
    Processing,
}

impl Phase {
    /// Phase of the job that moves a task into `stage`.
    pub fn for_stage(stage: Stage) -> Phase {
        match stage {
            Stage::Running => Phase::Processing,
            Stage::Preprocessing => Phase::Preprocessing,
            _ => Phase::InputDownloading,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::InputDownloading => "inputdownloading",
            Phase::Preprocessing => "preprocessing",
            Phase::Processing => "processing",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_table_is_exact() {
        let expected = [
            (Stage::Created, Some(Stage::Downloading)),
            (Stage::Downloading, Some(Stage::Downloaded)),
            (Stage::Downloaded, Some(Stage::Preprocessing)),
            (Stage::Preprocessing, Some(Stage::Ready)),
            (Stage::Preprocessed, None),
            (Stage::Ready, Some(Stage::Running)),
            (Stage::Running, Some(Stage::Finished)),
            (Stage::Finished, None),
            (Stage::Archiving, None),
            (Stage::Archived, None),
            (Stage::Failed, None),
        ];

        for (stage, next) in expected {
            assert_eq!(stage.next(), next, "next({stage})");
        }
    }

    #[test]
    fn backward_table_is_exact() {
        let expected = [
            (Stage::Created, None),
            (Stage::Downloading, Some(Stage::Created)),
            (Stage::Downloaded, Some(Stage::Downloading)),
            (Stage::Preprocessing, Some(Stage::Downloaded)),
            (Stage::Preprocessed, None),
            (Stage::Ready, None),
            (Stage::Running, Some(Stage::Ready)),
            (Stage::Finished, None),
            (Stage::Archiving, None),
            (Stage::Archived, None),
            (Stage::Failed, None),
        ];

        for (stage, previous) in expected {
            assert_eq!(stage.previous(), previous, "previous({stage})");
        }
    }

    #[test]
    fn preprocessed_is_never_a_forward_hop() {
        assert!(Stage::ALL.iter().all(|s| s.next() != Some(Stage::Preprocessed)));
    }

    #[test]
    fn processing_excludes_created_and_terminal_stages() {
        let processing: Vec<_> = Stage::ALL.into_iter().filter(|s| s.is_processing()).collect();
        assert_eq!(
            processing,
            vec![
                Stage::Downloading,
                Stage::Downloaded,
                Stage::Preprocessing,
                Stage::Preprocessed,
                Stage::Ready,
                Stage::Running,
            ]
        );
    }

    #[test]
    fn stage_names_parse_back() {
        for stage in Stage::ALL {
            assert_eq!(stage.as_str().parse::<Stage>(), Ok(stage));
        }
        assert_eq!("RUNNING".parse::<Stage>(), Ok(Stage::Running));
        assert!("paused".parse::<Stage>().is_err());
    }

    #[test]
    fn phase_follows_the_stage_being_entered() {
        assert_eq!(Phase::for_stage(Stage::Running), Phase::Processing);
        assert_eq!(Phase::for_stage(Stage::Preprocessing), Phase::Preprocessing);
        assert_eq!(Phase::for_stage(Stage::Downloading), Phase::InputDownloading);
    }
}
