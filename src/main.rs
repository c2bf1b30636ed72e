use clap::Parser;
use sortbox::cli::{Cli, resolve_command, run_cli};
use sortbox::config::Config;
use sortbox::logging::{TracingLog, setup_console_logging, setup_logging};
use sortbox::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            OutputFormatter::error(&format!("Error loading configuration: {}", e));
            return ExitCode::from(1);
        }
    };

    if cli.print_config {
        return match config.to_toml() {
            Ok(rendered) => {
                OutputFormatter::plain(&rendered);
                ExitCode::SUCCESS
            }
            Err(e) => {
                OutputFormatter::error(&e.to_string());
                ExitCode::from(1)
            }
        };
    }

    let log_dir = cli
        .log_dir
        .clone()
        .unwrap_or_else(|| config.logging.directory.clone());

    // Logging is best effort: without a log file the run still proceeds.
    let _guard = match setup_logging(&log_dir, &config.logging.file_name, cli.verbose) {
        Ok(guard) => Some(guard),
        Err(e) => {
            OutputFormatter::warning(&format!("File logging disabled: {:#}", e));
            let _ = setup_console_logging(cli.verbose);
            None
        }
    };

    let command = match resolve_command(&cli, &config) {
        Ok(command) => command,
        Err(e) => {
            OutputFormatter::error(&format!("{:#}", e));
            return ExitCode::from(1);
        }
    };

    match run_cli(&command, &config, &TracingLog) {
        Ok(report) if report.is_complete_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(2),
        Err(e) => {
            tracing::error!("{:#}", e);
            OutputFormatter::error(&format!("{:#}", e));
            ExitCode::from(1)
        }
    }
}
