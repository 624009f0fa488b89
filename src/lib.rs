pub mod cli;
pub mod config;
pub mod error;
pub mod extractor;
pub mod runner;
pub mod scanner;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat};
pub use config::{Config, OutputConfig, ScanConfig};
pub use error::{Result, TitleGrabError, UserFriendlyError};

// Core functionality re-exports
pub use extractor::{
    workbook, ExtractedEntry, ExtractionRun, RunSummary, TitleExtractor, WorkbookWriter,
};
pub use runner::{
    CompletionStatus, FileStatus, Pipeline, RunEvent, RunHandle, RunOutcome, RunPlan, RunState,
    Runner,
};
pub use scanner::{FileFilter, SourceFile, TextScanner};
pub use ui::{OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;

/// Main library interface for titlegrab
pub struct TitleGrab {
    runner: Runner,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
}

impl TitleGrab {
    /// Create a new TitleGrab instance with the provided configuration
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        // The bar would interleave with JSON lines on stdout.
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            runner: Runner::new(config),
            output_formatter,
            progress_manager,
        }
    }

    /// Create TitleGrab instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Ok(Self::new(
            config,
            output_mode,
            cli_args.verbose,
            cli_args.quiet,
        ))
    }

    /// Extract 《》 titles from every matching file in `directory` into the workbook.
    ///
    /// Events are printed as they arrive and drive the progress bar. The result is the
    /// worker's own, so a failed run returns the error that ended it.
    pub async fn extract_titles<P: AsRef<Path>>(&self, directory: P) -> Result<RunSummary> {
        let mut handle = self.runner.begin_run(directory.as_ref())?;
        let progress = self.progress_manager.create_run_progress();

        while let Some(event) = handle.next_event().await {
            ui::progress::update_run_progress(&progress, &event);
            self.progress_manager
                .suspend(|| self.output_formatter.print_event(&event));
        }

        // Only a worker that died without reporting leaves the bar running.
        if !progress.is_finished() {
            progress.abandon();
        }

        handle.finish().await
    }

    /// Files a run would process and its destination, without reading anything.
    pub fn plan<P: AsRef<Path>>(&self, directory: P) -> Result<RunPlan> {
        Pipeline::new(self.config()).plan(directory.as_ref())
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    /// Get configuration reference
    pub fn config(&self) -> &Config {
        self.runner.config()
    }

    pub fn state(&self) -> RunState {
        self.runner.state()
    }

    /// Get output formatter reference
    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &TitleGrabError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn quiet_titlegrab() -> TitleGrab {
        TitleGrab::new(Config::default(), OutputMode::Plain, 0, true)
    }

    #[tokio::test]
    async fn test_extract_titles_writes_workbook() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "《诗经》与《楚辞》").unwrap();

        let titlegrab = quiet_titlegrab();
        let summary = titlegrab.extract_titles(temp_dir.path()).await.unwrap();

        assert_eq!(summary.total_entries_extracted, 2);
        assert!(summary.output_path.exists());
        assert_eq!(
            titlegrab.state(),
            RunState::Completed(CompletionStatus::Success)
        );
    }

    #[tokio::test]
    async fn test_extract_titles_invalid_directory() {
        let temp_dir = TempDir::new().unwrap();
        let titlegrab = quiet_titlegrab();

        let result = titlegrab
            .extract_titles(temp_dir.path().join("nope"))
            .await;

        assert!(matches!(result, Err(TitleGrabError::InvalidInput { .. })));
        assert_eq!(
            titlegrab.state(),
            RunState::Completed(CompletionStatus::Failure)
        );
    }

    #[test]
    fn test_plan_does_not_write() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "《书》").unwrap();

        let plan = quiet_titlegrab().plan(temp_dir.path()).unwrap();
        assert_eq!(plan.files.len(), 1);
        assert!(!plan.destination.exists());
    }

    #[test]
    fn test_sample_config_generation() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("sample.toml");

        let result = TitleGrab::generate_sample_config(&config_path);
        assert!(result.is_ok());

        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[scan]"));
        assert!(content.contains("[output]"));
    }
}
