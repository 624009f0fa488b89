use crate::config::Config;
use crate::error::Result;
use crate::extractor::{ExtractionRun, RunSummary, TitleExtractor, WorkbookWriter};
use crate::runner::events::{FileStatus, RunEvent};
use crate::scanner::{SourceFile, TextScanner};
use std::path::{Path, PathBuf};

/// Files a run would read and where its workbook would land.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub directory: PathBuf,
    pub files: Vec<SourceFile>,
    pub destination: PathBuf,
}

/// Scan, extract and write, one file at a time on the calling thread.
pub struct Pipeline {
    scanner: TextScanner,
    extractor: TitleExtractor,
    writer: WorkbookWriter,
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            scanner: TextScanner::new(&config.scan),
            extractor: TitleExtractor::new(),
            writer: WorkbookWriter::new(&config.output),
        }
    }

    pub fn plan(&self, directory: &Path) -> Result<RunPlan> {
        let files = self.scanner.discover(directory)?;

        Ok(RunPlan {
            directory: directory.to_path_buf(),
            files,
            destination: self.writer.destination(directory),
        })
    }

    /// Runs over `directory`, handing every event to `emit` in the order it happens.
    ///
    /// Fails before emitting anything when the directory is invalid. Per-file read errors are
    /// reported through `emit` and never abort the run; only a failed workbook write does.
    pub fn execute<F>(&self, directory: &Path, mut emit: F) -> Result<RunSummary>
    where
        F: FnMut(RunEvent),
    {
        self.scanner.validate_directory(directory)?;

        let span = tracing::info_span!("run", directory = %directory.display());
        let _entered = span.enter();

        emit(RunEvent::RunStarted {
            directory: directory.to_path_buf(),
        });

        let plan = self.plan(directory)?;
        self.run_plan(&plan, emit)
    }

    /// Reads the planned files in order and writes the workbook to the planned destination.
    /// Files that vanished or became unreadable since discovery are reported and skipped.
    pub fn run_plan<F>(&self, plan: &RunPlan, mut emit: F) -> Result<RunSummary>
    where
        F: FnMut(RunEvent),
    {
        let extension = self.scanner.get_extension().to_string();
        if plan.files.is_empty() {
            emit(RunEvent::NoFilesFound { extension });
        } else {
            emit(RunEvent::FilesDiscovered {
                count: plan.files.len(),
                extension,
            });
        }

        let mut run = ExtractionRun::new(plan.files.len());
        for file in &plan.files {
            let status = self.process_file(file, &mut run);
            emit(RunEvent::FileProcessed {
                file_name: file.file_name.clone(),
                status,
            });
            emit(RunEvent::Progress {
                fraction: run.progress_fraction(),
            });
        }

        self.writer.write(&run.entries, &plan.destination)?;

        tracing::info!(
            files = run.total_files_found,
            entries = run.total_entries_extracted,
            failed = run.files_failed_to_read,
            "run finished"
        );

        Ok(run.summarize(plan.destination.clone()))
    }

    fn process_file(&self, file: &SourceFile, run: &mut ExtractionRun) -> FileStatus {
        match file.read_text() {
            Ok(text) => {
                let count = run.record_file(self.extractor.extract(&text, &file.file_name));
                tracing::debug!(file = %file.file_name, count, "extracted titles");

                if count == 0 {
                    FileStatus::NoMatch
                } else {
                    FileStatus::Extracted { count }
                }
            }
            Err(err) => {
                let message = err.to_string();
                tracing::warn!(file = %file.file_name, error = %message, "failed to read file");
                run.record_read_error(format!("{}: {}", file.file_name, message));

                FileStatus::ReadError { message }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TitleGrabError;
    use crate::extractor::workbook::read_rows;
    use std::fs;
    use tempfile::TempDir;

    fn run_collecting(directory: &Path) -> (Result<RunSummary>, Vec<RunEvent>) {
        let pipeline = Pipeline::new(&Config::default());
        let mut events = Vec::new();
        let result = pipeline.execute(directory, |event| events.push(event));
        (result, events)
    }

    #[test]
    fn test_invalid_directory_emits_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let (result, events) = run_collecting(&temp_dir.path().join("missing"));

        assert!(matches!(result, Err(TitleGrabError::InvalidInput { .. })));
        assert!(events.is_empty());
    }

    #[test]
    fn test_scenario_with_match_and_no_match() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "他读了《三国演义》和《红楼梦》。").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "无内容。").unwrap();

        let (result, events) = run_collecting(temp_dir.path());
        let summary = result.unwrap();

        assert_eq!(summary.total_files_found, 2);
        assert_eq!(summary.files_with_matches, 1);
        assert_eq!(summary.files_without_matches, 1);
        assert_eq!(summary.total_entries_extracted, 2);

        let statuses: Vec<(&str, &FileStatus)> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::FileProcessed { file_name, status } => {
                    Some((file_name.as_str(), status))
                }
                _ => None,
            })
            .collect();
        assert_eq!(statuses.len(), 2);
        assert!(statuses.contains(&("a.txt", &FileStatus::Extracted { count: 2 })));
        assert!(statuses.contains(&("b.txt", &FileStatus::NoMatch)));

        let rows = read_rows(&summary.output_path).unwrap();
        assert_eq!(
            rows[1..].to_vec(),
            vec![
                vec!["三国演义".to_string(), "a.txt".to_string()],
                vec!["红楼梦".to_string(), "a.txt".to_string()],
            ]
        );
    }

    #[test]
    fn test_event_order_and_progress() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["1.txt", "2.txt", "3.txt"] {
            fs::write(temp_dir.path().join(name), "《书》").unwrap();
        }

        let (result, events) = run_collecting(temp_dir.path());
        assert!(result.is_ok());

        assert!(matches!(events[0], RunEvent::RunStarted { .. }));
        assert!(matches!(
            events[1],
            RunEvent::FilesDiscovered { count: 3, .. }
        ));

        let fractions: Vec<f64> = events
            .iter()
            .filter_map(|e| match e {
                RunEvent::Progress { fraction } => Some(*fraction),
                _ => None,
            })
            .collect();
        assert_eq!(fractions.len(), 3);
        assert!(fractions.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(fractions.last().copied(), Some(1.0));

        // Each file event is immediately followed by its progress update.
        for pair in events[2..].chunks(2) {
            assert!(matches!(pair[0], RunEvent::FileProcessed { .. }));
            assert!(matches!(pair[1], RunEvent::Progress { .. }));
        }
    }

    #[test]
    fn test_empty_directory_writes_header_only() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("notes.md"), "《不算》").unwrap();

        let (result, events) = run_collecting(temp_dir.path());
        let summary = result.unwrap();

        assert_eq!(summary.total_files_found, 0);
        assert!(events
            .iter()
            .any(|e| matches!(e, RunEvent::NoFilesFound { .. })));
        assert_eq!(read_rows(&summary.output_path).unwrap().len(), 1);
    }

    #[test]
    fn test_write_failure_fails_run() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "《书》").unwrap();
        // A directory squatting on the workbook name makes the write fail.
        fs::create_dir(temp_dir.path().join("提取结果.xlsx")).unwrap();

        let (result, events) = run_collecting(temp_dir.path());

        assert!(matches!(result, Err(TitleGrabError::WriteFailure { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, RunEvent::FileProcessed { .. })));
    }

    #[test]
    fn test_unreadable_file_is_recorded_and_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let pipeline = Pipeline::new(&Config::default());
        let mut run = ExtractionRun::new(2);

        // Deleted between discovery and reading.
        let gone = SourceFile::new(temp_dir.path().join("gone.txt"));
        let status = pipeline.process_file(&gone, &mut run);
        assert!(matches!(status, FileStatus::ReadError { .. }));

        let present = temp_dir.path().join("here.txt");
        fs::write(&present, "《书》").unwrap();
        let status = pipeline.process_file(&SourceFile::new(present), &mut run);
        assert_eq!(status, FileStatus::Extracted { count: 1 });

        assert_eq!(run.files_failed_to_read, 1);
        assert_eq!(run.errors.len(), 1);
        assert!(run.errors[0].starts_with("gone.txt: "));
        assert_eq!(run.total_entries_extracted, 1);
        assert_eq!(run.progress_fraction(), 1.0);
    }

    #[test]
    fn test_plan_lists_files_without_reading() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "《书》").unwrap();

        let pipeline = Pipeline::new(&Config::default());
        let plan = pipeline.plan(temp_dir.path()).unwrap();

        assert_eq!(plan.files.len(), 1);
        assert_eq!(plan.destination, temp_dir.path().join("提取结果.xlsx"));
        assert!(!plan.destination.exists());
    }
}
