use crate::extractor::ExtractedEntry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Counters and entries accumulated over one scan of a directory.
#[derive(Debug, Clone)]
pub struct ExtractionRun {
    pub total_files_found: usize,
    pub files_attempted: usize,
    pub files_with_matches: usize,
    pub files_without_matches: usize,
    pub files_failed_to_read: usize,
    pub total_entries_extracted: usize,
    pub entries: Vec<ExtractedEntry>,
    pub errors: Vec<String>,
    pub start_time: Instant,
}

impl ExtractionRun {
    pub fn new(total_files_found: usize) -> Self {
        Self {
            total_files_found,
            files_attempted: 0,
            files_with_matches: 0,
            files_without_matches: 0,
            files_failed_to_read: 0,
            total_entries_extracted: 0,
            entries: Vec::new(),
            errors: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Appends a file's entries; an empty batch counts the file as having no match.
    pub fn record_file<I>(&mut self, entries: I) -> usize
    where
        I: IntoIterator<Item = ExtractedEntry>,
    {
        let before = self.entries.len();
        self.entries.extend(entries);
        let added = self.entries.len() - before;

        self.files_attempted += 1;
        if added == 0 {
            self.files_without_matches += 1;
        } else {
            self.files_with_matches += 1;
            self.total_entries_extracted += added;
        }

        added
    }

    pub fn record_read_error<S: Into<String>>(&mut self, error: S) {
        self.files_attempted += 1;
        self.files_failed_to_read += 1;
        self.errors.push(error.into());
    }

    /// Share of discovered files attempted so far. An empty run counts as complete.
    pub fn progress_fraction(&self) -> f64 {
        if self.total_files_found == 0 {
            1.0
        } else {
            self.files_attempted as f64 / self.total_files_found as f64
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn summarize(&self, output_path: PathBuf) -> RunSummary {
        RunSummary {
            output_path,
            total_files_found: self.total_files_found,
            files_with_matches: self.files_with_matches,
            files_without_matches: self.files_without_matches,
            files_failed_to_read: self.files_failed_to_read,
            total_entries_extracted: self.total_entries_extracted,
            errors: self.errors.clone(),
            elapsed_ms: self.elapsed().as_millis() as u64,
            finished_at: Utc::now(),
        }
    }
}

/// Frozen counters of a run whose workbook was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub output_path: PathBuf,
    pub total_files_found: usize,
    pub files_with_matches: usize,
    pub files_without_matches: usize,
    pub files_failed_to_read: usize,
    pub total_entries_extracted: usize,
    pub errors: Vec<String>,
    pub elapsed_ms: u64,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn has_read_errors(&self) -> bool {
        self.files_failed_to_read > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut run = ExtractionRun::new(3);
        assert_eq!(run.progress_fraction(), 0.0);

        let added = run.record_file(vec![
            ExtractedEntry::new("三国演义", "a.txt"),
            ExtractedEntry::new("红楼梦", "a.txt"),
        ]);
        assert_eq!(added, 2);

        run.record_file(Vec::new());
        run.record_read_error("c.txt: permission denied");

        assert_eq!(run.files_attempted, 3);
        assert_eq!(run.files_with_matches, 1);
        assert_eq!(run.files_without_matches, 1);
        assert_eq!(run.files_failed_to_read, 1);
        assert_eq!(run.total_entries_extracted, 2);
        assert_eq!(run.entries.len(), run.total_entries_extracted);
        assert_eq!(run.progress_fraction(), 1.0);
    }

    #[test]
    fn test_empty_run_is_complete() {
        let run = ExtractionRun::new(0);
        assert_eq!(run.progress_fraction(), 1.0);
    }

    #[test]
    fn test_summary() {
        let mut run = ExtractionRun::new(1);
        run.record_read_error("a.txt: denied");

        let summary = run.summarize(PathBuf::from("out.xlsx"));
        assert_eq!(summary.total_files_found, 1);
        assert!(summary.has_read_errors());
        assert_eq!(summary.errors, vec!["a.txt: denied".to_string()]);

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["total_entries_extracted"], 0);
        assert_eq!(json["output_path"], "out.xlsx");
    }
}
