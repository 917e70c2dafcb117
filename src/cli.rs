use crate::core::CasePolicy;
use crate::cost::BranchSelection;
use crate::engine::AnalysisMode;
use crate::io::output::OutputFormat;
use crate::recurrence::SolveMethod;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "costmap")]
#[command(about = "Step-by-step asymptotic cost analyzer for pseudocode algorithms", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Increase verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze AST documents and derive their cost
    Analyze {
        /// AST JSON files to analyze
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Execution scenario to model
        #[arg(short, long, value_enum)]
        case: Option<CasePolicy>,

        /// Recurrence solving method (automatic when omitted)
        #[arg(short, long, value_enum)]
        method: Option<SolveMethod>,

        /// Which analyzer to run
        #[arg(long, value_enum, default_value = "auto")]
        mode: AnalysisMode,

        /// How worst and best cases compare the arms of an if
        #[arg(long = "branch-selection", value_enum)]
        branch_selection: Option<BranchSelection>,

        /// Name of the input size variable
        #[arg(long = "size-variable", env = "COSTMAP_SIZE_VARIABLE")]
        size_variable: Option<String>,

        /// Output format (config default_format, else terminal)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Label each program iterative, recursive, hybrid or unknown
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// List the recurrence methods that apply to a recursive program
    Methods {
        file: PathBuf,

        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Initialize a new .costmap.toml configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_accepts_kebab_case_values() {
        let cli = Cli::try_parse_from([
            "costmap",
            "analyze",
            "fib.json",
            "--case",
            "average",
            "--method",
            "characteristic-equation",
            "--branch-selection",
            "row-count",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbosity, 2);
        match cli.command {
            Commands::Analyze {
                files,
                case,
                method,
                branch_selection,
                ..
            } => {
                assert_eq!(files, vec![PathBuf::from("fib.json")]);
                assert_eq!(case, Some(CasePolicy::Average));
                assert_eq!(method, Some(SolveMethod::CharacteristicEquation));
                assert_eq!(branch_selection, Some(BranchSelection::RowCount));
            }
            other => panic!("expected analyze, got {other:?}"),
        }
    }
}
