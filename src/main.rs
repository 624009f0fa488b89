use clap::Parser;
use std::process;
use titlegrab::{
    Cli, OutputFormatter, OutputMode, RunSummary, TitleGrab, TitleGrabError, UserFriendlyError,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    // Parse CLI arguments
    let cli = Cli::parse();

    init_tracing(&cli);

    // Handle special commands first
    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let Some(directory) = cli.directory.clone() else {
        eprintln!("A directory to scan is required");
        return 1;
    };

    // Create TitleGrab instance
    let titlegrab = match TitleGrab::from_cli(&cli) {
        Ok(titlegrab) => titlegrab,
        Err(e) => {
            print_startup_error(&e);
            return 1;
        }
    };

    // Handle dry run mode
    if cli.dry_run {
        return handle_dry_run(&titlegrab, &directory);
    }

    let result = titlegrab.extract_titles(&directory).await;
    match &result {
        // Unreadable files are listed in the summary; the run itself succeeded.
        Ok(summary) => titlegrab.output_formatter().print_run_summary(summary),
        Err(e) => titlegrab.handle_error(e),
    }

    run_exit_code(&result)
}

fn run_exit_code(result: &titlegrab::Result<RunSummary>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(e) => exit_code_for(e),
    }
}

fn init_tracing(cli: &Cli) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.tracing_filter().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn exit_code_for(error: &TitleGrabError) -> i32 {
    match error {
        TitleGrabError::InvalidInput { .. } => 3,
        TitleGrabError::WriteFailure { .. } => 4,
        _ => 1, // General error
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| "titlegrab.toml".to_string());

    match TitleGrab::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  titlegrab <directory> --config {}", config_path);
            println!("\nEdit the file to customize settings for your needs.");
            0
        }
        Err(e) => {
            eprintln!(
                "Failed to generate configuration file: {}",
                e.user_message()
            );
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn handle_dry_run(titlegrab: &TitleGrab, directory: &std::path::Path) -> i32 {
    let formatter = titlegrab.output_formatter();

    formatter.info("DRY RUN MODE - No files will be read or written");
    formatter.print_separator();

    match titlegrab.plan(directory) {
        Ok(plan) => {
            formatter.print_plan(&plan);
            0
        }
        Err(e) => {
            titlegrab.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn print_startup_error(error: &TitleGrabError) {
    // Formatter settings are unknown before the CLI is fully processed.
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}
