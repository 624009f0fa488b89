use crate::extractor::RunSummary;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Notification emitted by the worker while a run progresses. `RunCompleted` is always last.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted { directory: PathBuf },
    FilesDiscovered { count: usize, extension: String },
    NoFilesFound { extension: String },
    FileProcessed { file_name: String, status: FileStatus },
    Progress { fraction: f64 },
    RunCompleted { outcome: RunOutcome },
}

/// What happened to one file. Exactly one is reported per discovered file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Extracted { count: usize },
    NoMatch,
    ReadError { message: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RunOutcome {
    Success { summary: RunSummary },
    Failure {
        message: String,
        suggestion: Option<String>,
    },
}

impl RunEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::RunCompleted { .. })
    }
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success { .. })
    }
}

impl fmt::Display for RunEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunEvent::RunStarted { directory } => {
                write!(f, "Scanning directory: {}", directory.display())
            }
            RunEvent::FilesDiscovered { count, extension } => {
                write!(f, "Found {} .{} files", count, extension)
            }
            RunEvent::NoFilesFound { extension } => {
                write!(f, "No .{} files found", extension)
            }
            RunEvent::FileProcessed { file_name, status } => match status {
                FileStatus::Extracted { count } => {
                    write!(f, "{}: extracted {} titles", file_name, count)
                }
                FileStatus::NoMatch => write!(f, "{}: no 《》 titles found", file_name),
                FileStatus::ReadError { message } => {
                    write!(f, "Could not read {}: {}", file_name, message)
                }
            },
            RunEvent::Progress { fraction } => {
                write!(f, "Progress: {:.0}%", fraction * 100.0)
            }
            RunEvent::RunCompleted { outcome } => match outcome {
                RunOutcome::Success { summary } => write!(
                    f,
                    "Done! Extracted {} titles, saved to {}",
                    summary.total_entries_extracted,
                    summary.output_path.display()
                ),
                RunOutcome::Failure { message, .. } => write!(f, "Run failed: {}", message),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_event_lines() {
        let extracted = RunEvent::FileProcessed {
            file_name: "a.txt".to_string(),
            status: FileStatus::Extracted { count: 2 },
        };
        assert_eq!(extracted.to_string(), "a.txt: extracted 2 titles");

        let no_match = RunEvent::FileProcessed {
            file_name: "b.txt".to_string(),
            status: FileStatus::NoMatch,
        };
        assert_eq!(no_match.to_string(), "b.txt: no 《》 titles found");

        let failed = RunEvent::FileProcessed {
            file_name: "c.txt".to_string(),
            status: FileStatus::ReadError {
                message: "permission denied".to_string(),
            },
        };
        assert!(failed.to_string().contains("permission denied"));
    }

    #[test]
    fn test_progress_line() {
        let event = RunEvent::Progress { fraction: 0.5 };
        assert_eq!(event.to_string(), "Progress: 50%");
        assert!(!event.is_terminal());
    }

    #[test]
    fn test_failure_outcome() {
        let event = RunEvent::RunCompleted {
            outcome: RunOutcome::Failure {
                message: "disk full".to_string(),
                suggestion: None,
            },
        };
        assert!(event.is_terminal());
        assert_eq!(event.to_string(), "Run failed: disk full");
    }

    #[test]
    fn test_json_shape() {
        let event = RunEvent::FileProcessed {
            file_name: "a.txt".to_string(),
            status: FileStatus::Extracted { count: 3 },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "file_processed");
        assert_eq!(json["status"]["status"], "extracted");
        assert_eq!(json["status"]["count"], 3);
    }
}
