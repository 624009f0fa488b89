use crate::config::Config;
use crate::error::Result;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "titlegrab")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Extract 《》 titles from text files into an Excel workbook")]
#[command(
    long_about = "titlegrab scans a directory for .txt files, extracts every piece of text \
                  enclosed in 《 and 》 and saves the results, with the file each came from, \
                  to 提取结果.xlsx in the same directory."
)]
#[command(before_help = "📖 titlegrab - Book Title Extraction Tool")]
#[command(after_help = "EXAMPLES:\n  \
    titlegrab ./novels\n  \
    titlegrab ./novels --dry-run\n  \
    titlegrab ./novels --output-format json\n  \
    titlegrab ./novels --config my-config.toml\n  \
    titlegrab --generate-config --config titlegrab.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Directory containing the text files
    #[arg(required_unless_present = "generate_config")]
    pub directory: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Dry run (show what would be done without executing)
    #[arg(long, help = "List the files that would be processed without reading them")]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let config = Config::load_with_defaults(self.config.as_ref())?;
        config.validate()?;

        Ok(config)
    }

    /// Fallback `tracing` directive when `RUST_LOG` is unset.
    pub fn tracing_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "titlegrab=info",
            2 => "titlegrab=debug",
            _ => "titlegrab=trace",
        }
    }
}
