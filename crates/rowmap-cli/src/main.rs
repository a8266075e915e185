//! Rowmap CLI - convert booking records to storage rows and back
//!
//! This is the main entry point for the Rowmap CLI application, providing
//! commands for converting record files in either direction, checking them
//! and inspecting the mapping table.

mod cli;
mod config;
mod error;
mod handlers;
mod logging;
mod output;

use cli::{Cli, Commands};
use colored::control;
use config::Config;
use error::Result;
use logging::{timing::Timer, LogSettings};
use output::OutputWriter;
use std::process;

fn main() {
    // Parse command-line arguments
    let cli = Cli::parse_args();

    // Set up colored output
    control::set_override(cli.use_color());

    // Run the application
    let result = run(cli);

    // Handle the result
    match result {
        Ok(()) => {
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", error::format_error(&e, control::SHOULD_COLORIZE.should_colorize()));

            if e.should_show_help() {
                eprintln!("\nFor more information, try '--help'");
            }

            process::exit(e.exit_code());
        }
    }
}

/// Main application logic
fn run(cli: Cli) -> Result<()> {
    // Logging settings live in the config file, so it is loaded first
    let config = Config::load_with_file(cli.config.as_deref())?;

    if let Err(e) = init_logging(&cli, &config) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    let _timer = Timer::new("cli_execution");

    let use_color = cli.use_color() && config.output.color;
    control::set_override(use_color);
    let mut output =
        OutputWriter::new(cli.output, use_color, cli.quiet).with_redaction(config.logging.redact);

    tracing::info!(
        command = ?cli.command,
        verbosity = cli.verbosity_level(),
        "Executing command"
    );

    // Handle the subcommand
    match cli.command {
        Commands::ToPersistence(args) => {
            handlers::handle_to_persistence(args, &config, &mut output)
        }
        Commands::FromPersistence(args) => {
            handlers::handle_from_persistence(args, &config, &mut output)
        }
        Commands::Check(args) => handlers::handle_check(args, &config, &mut output),
        Commands::Mappings(args) => handlers::handle_mappings(args, &config, &mut output),
        Commands::Config(args) => handlers::handle_config(args, &config, &mut output),
        Commands::Completions(args) => handlers::handle_completions(args),
    }
}

/// Initialize the logging system
fn init_logging(cli: &Cli, config: &Config) -> Result<()> {
    let mut settings = LogSettings::from_verbosity(cli.verbosity_level());

    // Config file first, then environment overrides
    settings.apply_config(&config.logging);
    settings.merge_with_env();

    // If quiet mode, only log errors
    if cli.quiet {
        settings.level = "error".to_string();
        settings.console = false;
    }

    logging::init_logging(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["rowmap", "mappings"]);
        assert_eq!(cli.verbosity_level(), 0);

        let cli = Cli::parse_from(["rowmap", "-vv", "check", "bookings.json"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["rowmap", "--quiet", "from-persistence", "rows.json"]);
        assert_eq!(cli.verbosity_level(), 0);
    }
}
