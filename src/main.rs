use anyhow::Result;
use clap::Parser;
use costmap::cli::{Cli, Commands};
use costmap::commands::{self, AnalyzeConfig};
use costmap::config;
use std::process::ExitCode;

fn log_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

// RUST_LOG wins over -v when set
fn init_logging(verbosity: u8) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level(verbosity)))
        .format_timestamp(None)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbosity);
    costmap::observability::install_panic_hook();

    match cli.command {
        Commands::Analyze {
            files,
            case,
            method,
            mode,
            branch_selection,
            size_variable,
            format,
            output,
        } => {
            let file_config = config::load_config();
            let analyze_config = AnalyzeConfig {
                files,
                case,
                method,
                mode,
                branch_selection,
                size_variable,
                format,
                output,
            };
            let all_ok = commands::handle_analyze(analyze_config, &file_config)?;
            Ok(if all_ok {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Commands::Classify { files, format } => {
            commands::handle_classify(&files, format, &config::load_config())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Methods { file, format } => {
            commands::handle_methods(&file, format, &config::load_config())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            commands::init::init_config(force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_log_levels() {
        assert_eq!(log_level(0), "warn");
        assert_eq!(log_level(1), "info");
        assert_eq!(log_level(2), "debug");
        assert_eq!(log_level(7), "trace");
    }
}
