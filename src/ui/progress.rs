use crate::runner::{RunEvent, RunOutcome};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::time::Duration;

const PROGRESS_SCALE: u64 = 100;

const RUNNING_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>3}% {msg}";
const SUCCESS_TEMPLATE: &str = "  [{elapsed_precise}] [{bar:40.green}] {pos:>3}% {msg}";
const FAILURE_TEMPLATE: &str = "  [{elapsed_precise}] [{bar:40.red}] {pos:>3}% {msg}";

pub struct ProgressManager {
    multi_progress: MultiProgress,
    enabled: bool,
}

impl ProgressManager {
    pub fn new(enabled: bool) -> Self {
        Self {
            multi_progress: MultiProgress::new(),
            enabled,
        }
    }

    pub fn create_run_progress(&self) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::hidden();
        }

        let pb = self.multi_progress.add(ProgressBar::new(PROGRESS_SCALE));
        pb.set_style(bar_style(RUNNING_TEMPLATE));
        pb.set_message("Scanning...");
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn suspend<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        if self.enabled {
            self.multi_progress.suspend(f)
        } else {
            f()
        }
    }
}

fn bar_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn scaled_position(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * PROGRESS_SCALE as f64).round() as u64
}

pub fn update_run_progress(pb: &ProgressBar, event: &RunEvent) {
    match event {
        RunEvent::FilesDiscovered { count, .. } => {
            pb.set_message(format!("Processing {} files...", count));
        }
        RunEvent::NoFilesFound { .. } => pb.set_message("No files to process"),
        RunEvent::FileProcessed { file_name, .. } => pb.set_message(file_name.clone()),
        RunEvent::Progress { fraction } => pb.set_position(scaled_position(*fraction)),
        RunEvent::RunCompleted { outcome } => finish_run_progress(pb, outcome),
        RunEvent::RunStarted { .. } => {}
    }
}

/// Fills the bar and recolors it for the terminal state: green on success, red on failure.
pub fn finish_run_progress(pb: &ProgressBar, outcome: &RunOutcome) {
    let duration = pb.elapsed();
    pb.disable_steady_tick();
    pb.set_position(PROGRESS_SCALE);

    match outcome {
        RunOutcome::Success { summary } => {
            pb.set_style(bar_style(SUCCESS_TEMPLATE));
            pb.finish_with_message(format!(
                "{} titles extracted (completed in {})",
                summary.total_entries_extracted,
                format_duration(duration)
            ));
        }
        RunOutcome::Failure { .. } => {
            pb.set_style(bar_style(FAILURE_TEMPLATE));
            pb.abandon_with_message(format!("failed after {}", format_duration(duration)));
        }
    }
}

fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", duration.as_millis())
    }
}
