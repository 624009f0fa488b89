use crate::error::{TitleGrabError, UserFriendlyError};
use crate::extractor::RunSummary;
use crate::runner::{FileStatus, RunEvent, RunOutcome, RunPlan};
use console::{style, Emoji, StyledObject, Term};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt::Display;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");
static BOOK: Emoji = Emoji("📖 ", "- ");
static EMPTY: Emoji = Emoji("📭 ", "- ");

const RULE_WIDTH: usize = 60;

/// Renders run events, summaries, plans and errors in one of three modes.
///
/// JSON mode prints exactly one object per stdout line, so the stream can be read as
/// newline-delimited JSON. Errors always go to stderr.
pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors =
            mode == OutputMode::Human && !quiet && Term::stdout().features().colors_supported();

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn info(&self, message: &str) {
        if !self.shows(1) {
            return;
        }
        let line = match self.mode {
            OutputMode::Human => self.decorate(INFO, style(message).cyan()),
            OutputMode::Json => json_line(&message_json("info", message)),
            OutputMode::Plain => format!("INFO: {}", message),
        };
        println!("{}", line);
    }

    pub fn print_user_friendly_error(&self, error: &TitleGrabError) {
        for line in self.error_lines(error) {
            eprintln!("{}", line);
        }
    }

    /// One line per run event, if any. A failed `RunCompleted` is left to
    /// `print_user_friendly_error` outside JSON mode.
    pub fn print_event(&self, event: &RunEvent) {
        if let Some(line) = self.event_line(event) {
            println!("{}", line);
        }
    }

    pub fn print_run_summary(&self, summary: &RunSummary) {
        for line in self.summary_lines(summary) {
            println!("{}", line);
        }
    }

    pub fn print_plan(&self, plan: &RunPlan) {
        for line in self.plan_lines(plan) {
            println!("{}", line);
        }
    }

    pub fn print_separator(&self) {
        if let Some(rule) = self.rule() {
            println!("{}", rule);
        }
    }

    fn shows(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn decorate<D: Display>(&self, emoji: Emoji<'_, '_>, styled: StyledObject<D>) -> String {
        if self.use_colors {
            format!("{}{}", emoji, styled)
        } else {
            format!("{}{}", emoji.1, styled.force_styling(false))
        }
    }

    fn rule(&self) -> Option<String> {
        match self.mode {
            _ if self.quiet => None,
            OutputMode::Json => None,
            OutputMode::Human if self.use_colors => {
                Some(style("─".repeat(RULE_WIDTH)).dim().to_string())
            }
            OutputMode::Human | OutputMode::Plain => Some("-".repeat(RULE_WIDTH)),
        }
    }

    fn error_lines(&self, error: &TitleGrabError) -> Vec<String> {
        let message = error.user_message();
        let suggestion = error.suggestion();

        match self.mode {
            OutputMode::Json => {
                let mut object = message_json("error", &message);
                if let Some(suggestion) = suggestion {
                    object["suggestion"] = json!(suggestion);
                }
                vec![json_line(&object)]
            }
            OutputMode::Plain => {
                let mut lines = vec![format!("ERROR: {}", message)];
                lines.extend(suggestion.map(|s| format!("SUGGESTION: {}", s)));
                lines
            }
            OutputMode::Human => {
                let mut lines = vec![self.decorate(CROSS, style(message.as_str()).red().bold())];
                if let Some(suggestion) = suggestion {
                    lines.push(String::new());
                    lines.push(self.decorate(
                        INFO,
                        style(format!("Suggestion: {}", suggestion)).cyan(),
                    ));
                }
                lines
            }
        }
    }

    fn event_line(&self, event: &RunEvent) -> Option<String> {
        if self.quiet {
            return None;
        }
        match self.mode {
            OutputMode::Json => Some(json_line(&event_json(event))),
            OutputMode::Plain => plain_event_line(event),
            OutputMode::Human => self.human_event_line(event),
        }
    }

    fn human_event_line(&self, event: &RunEvent) -> Option<String> {
        let text = event.to_string();
        let line = match event {
            RunEvent::RunStarted { .. } => self.decorate(ROCKET, style(text).bold()),
            RunEvent::FilesDiscovered { .. } => self.decorate(SPARKLES, style(text).bold()),
            RunEvent::NoFilesFound { .. } => self.decorate(WARNING, style(text).yellow()),
            RunEvent::FileProcessed { status, .. } => match status {
                FileStatus::Extracted { .. } => self.decorate(BOOK, style(text)),
                FileStatus::NoMatch => self.decorate(EMPTY, style(text).dim()),
                FileStatus::ReadError { .. } => self.decorate(WARNING, style(text).yellow()),
            },
            // The progress bar covers these unless -vv asks for them.
            RunEvent::Progress { .. } if self.shows(2) => format!("  {}", style(text).dim()),
            RunEvent::Progress { .. } => return None,
            RunEvent::RunCompleted { outcome } if outcome.is_success() => {
                self.decorate(CHECKMARK, style(text).green().bold())
            }
            RunEvent::RunCompleted { .. } => return None,
        };
        Some(line)
    }

    fn summary_lines(&self, summary: &RunSummary) -> Vec<String> {
        match self.mode {
            OutputMode::Json => vec![json_line(&summary_json(summary))],
            OutputMode::Plain => plain_summary_lines(summary),
            OutputMode::Human if self.quiet => Vec::new(),
            OutputMode::Human => self.human_summary_lines(summary),
        }
    }

    fn human_summary_lines(&self, summary: &RunSummary) -> Vec<String> {
        let mut stats = vec![
            ("Files found:", summary.total_files_found.to_string()),
            ("With titles:", summary.files_with_matches.to_string()),
            ("Without titles:", summary.files_without_matches.to_string()),
        ];
        if summary.has_read_errors() {
            stats.push(("Unreadable:", summary.files_failed_to_read.to_string()));
        }
        stats.push(("Titles:", summary.total_entries_extracted.to_string()));
        stats.push((
            "Time taken:",
            format_duration(Duration::from_millis(summary.elapsed_ms)),
        ));
        stats.push(("Saved to:", summary.output_path.display().to_string()));

        let rule = self.rule().unwrap_or_default();
        let mut lines = vec![String::new(), rule.clone()];
        lines.push(if self.use_colors {
            format!("{}{}", CHECKMARK, style("Title extraction completed!").green().bold())
        } else {
            "✓ Title extraction completed!".to_string()
        });
        lines.push(String::new());

        for (label, value) in stats {
            let value = if self.use_colors {
                style(value).cyan().bold().to_string()
            } else {
                value
            };
            lines.push(format!("  {:<16}{}", label, value));
        }

        if summary.has_read_errors() {
            lines.push(String::new());
            lines.push("Issues encountered:".to_string());
            lines.extend(summary.errors.iter().map(|e| format!("  - {}", e)));
        }

        lines.push(rule);
        lines
    }

    fn plan_lines(&self, plan: &RunPlan) -> Vec<String> {
        if self.mode == OutputMode::Json {
            let files: Vec<&str> = plan.files.iter().map(|f| f.file_name.as_str()).collect();
            return vec![json_line(&json!({
                "type": "plan",
                "directory": plan.directory,
                "files": files,
                "destination": plan.destination,
            }))];
        }

        let mut lines = vec![
            format!("Directory:   {}", plan.directory.display()),
            format!("Destination: {}", plan.destination.display()),
            format!("Files ({}):", plan.files.len()),
        ];
        lines.extend(plan.files.iter().map(|f| format!("  {}", f.file_name)));
        lines
    }
}

fn plain_event_line(event: &RunEvent) -> Option<String> {
    let prefix = match event {
        RunEvent::RunStarted { .. } => "STARTING",
        RunEvent::FilesDiscovered { .. } => "FOUND",
        RunEvent::NoFilesFound { .. } => "WARNING",
        RunEvent::FileProcessed {
            status: FileStatus::ReadError { .. },
            ..
        } => "WARNING",
        RunEvent::FileProcessed { .. } => "FILE",
        RunEvent::Progress { .. } => "PROGRESS",
        RunEvent::RunCompleted {
            outcome: RunOutcome::Success { .. },
        } => "SUCCESS",
        RunEvent::RunCompleted { .. } => return None,
    };
    Some(format!("{}: {}", prefix, event))
}

fn plain_summary_lines(summary: &RunSummary) -> Vec<String> {
    vec![
        "COMPLETED: Title extraction".to_string(),
        format!("Files found: {}", summary.total_files_found),
        format!("With titles: {}", summary.files_with_matches),
        format!("Without titles: {}", summary.files_without_matches),
        format!("Unreadable: {}", summary.files_failed_to_read),
        format!("Titles: {}", summary.total_entries_extracted),
        format!("Output: {}", summary.output_path.display()),
        format!("Duration: {}ms", summary.elapsed_ms),
    ]
}

/// Compact single-line JSON.
fn json_line<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
}

/// Adds `type` and `timestamp` to an object; other values pass through unchanged.
fn tagged(mut value: Value, kind: &str) -> Value {
    if let Some(object) = value.as_object_mut() {
        object.insert("type".to_string(), json!(kind));
        object.insert(
            "timestamp".to_string(),
            json!(chrono::Utc::now().to_rfc3339()),
        );
    }
    value
}

fn message_json(level: &str, message: &str) -> Value {
    tagged(json!({ "level": level, "message": message }), "message")
}

fn event_json(event: &RunEvent) -> Value {
    tagged(serde_json::to_value(event).unwrap_or_else(|_| json!({})), "event")
}

fn summary_json(summary: &RunSummary) -> Value {
    tagged(serde_json::to_value(summary).unwrap_or_else(|_| json!({})), "summary")
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{ExtractedEntry, ExtractionRun};
    use std::path::PathBuf;

    fn summary_with_read_error() -> RunSummary {
        let mut run = ExtractionRun::new(2);
        run.record_read_error("bad.txt: permission denied");
        run.record_file(vec![ExtractedEntry::new("书", "good.txt")]);
        run.summarize(PathBuf::from("/tmp/提取结果.xlsx"))
    }

    #[test]
    fn test_quiet_mode() {
        let formatter = OutputFormatter::new(OutputMode::Human, 2, true);
        assert_eq!(formatter.verbose_level, 0);
        assert!(!formatter.use_colors);
        assert!(!formatter.shows(0));
    }

    #[test]
    fn test_shows_by_verbosity() {
        let formatter = OutputFormatter::new(OutputMode::Plain, 1, false);
        assert!(formatter.shows(0));
        assert!(formatter.shows(1));
        assert!(!formatter.shows(2));
    }

    #[test]
    fn test_json_summary_is_one_line() {
        let formatter = OutputFormatter::new(OutputMode::Json, 0, false);
        let lines = formatter.summary_lines(&summary_with_read_error());

        assert_eq!(lines.len(), 1);
        assert!(!lines[0].contains('\n'));

        let value: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["type"], "summary");
        assert_eq!(value["total_entries_extracted"], 1);
        assert_eq!(value["files_failed_to_read"], 1);
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn test_json_error_carries_suggestion() {
        let formatter = OutputFormatter::new(OutputMode::Json, 0, false);
        let error = TitleGrabError::InvalidInput {
            path: "nope".to_string(),
        };
        let lines = formatter.error_lines(&error);

        assert_eq!(lines.len(), 1);
        let value: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(value["level"], "error");
        assert_eq!(value["suggestion"], json!(error.suggestion()));
    }

    #[test]
    fn test_human_summary_lists_unreadable_files() {
        let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
        let text = formatter
            .human_summary_lines(&summary_with_read_error())
            .join("\n");

        assert!(text.contains("Issues encountered:"));
        assert!(text.contains("  - bad.txt: permission denied"));
        assert!(text.contains("Unreadable:"));
    }

    #[test]
    fn test_failed_completion_is_left_to_error_output() {
        let event = RunEvent::RunCompleted {
            outcome: RunOutcome::Failure {
                message: "boom".to_string(),
                suggestion: None,
            },
        };

        for mode in [OutputMode::Human, OutputMode::Plain] {
            assert!(OutputFormatter::new(mode, 0, false)
                .event_line(&event)
                .is_none());
        }
        assert!(OutputFormatter::new(OutputMode::Json, 0, false)
            .event_line(&event)
            .is_some());
    }

    #[test]
    fn test_progress_lines_need_double_verbose() {
        let event = RunEvent::Progress { fraction: 0.5 };
        assert!(OutputFormatter::new(OutputMode::Human, 1, false)
            .event_line(&event)
            .is_none());
        assert!(OutputFormatter::new(OutputMode::Human, 2, false)
            .event_line(&event)
            .is_some());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "61m 1s");
        assert_eq!(format_duration(Duration::from_millis(500)), "500ms");
        assert_eq!(format_duration(Duration::from_millis(0)), "0ms");
    }

    #[test]
    fn test_event_json_carries_type_and_timestamp() {
        let value = event_json(&RunEvent::Progress { fraction: 0.25 });
        assert_eq!(value["type"], "event");
        assert_eq!(value["event"], "progress");
        assert_eq!(value["fraction"], 0.25);
        assert!(value["timestamp"].is_string());
    }
}
