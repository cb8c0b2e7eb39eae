use crate::commands::{run_evaluate, run_validate, EvaluateArgs, ValidateArgs};
use crate::server;
use adhealth::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "adhealth",
    about = "Evaluate collected directory health-check results against their rules",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Evaluate a results file and write the report as JSON
    Evaluate(EvaluateArgs),
    /// Check the rule sets of a definitions file for authoring problems
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Evaluate(args) => run_evaluate(args),
        Command::Validate(args) => run_validate(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["adhealth"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_evaluate_arguments() {
        let cli = Cli::try_parse_from([
            "adhealth",
            "evaluate",
            "--definitions",
            "defs.json",
            "--results",
            "results.json",
            "--output",
            "report.json",
        ])
        .expect("parses");

        match cli.command {
            Some(Command::Evaluate(args)) => {
                assert_eq!(args.definitions, PathBuf::from("defs.json"));
                assert_eq!(args.results, PathBuf::from("results.json"));
                assert!(args.thresholds.is_none());
                assert_eq!(args.output, Some(PathBuf::from("report.json")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn evaluate_requires_results() {
        assert!(Cli::try_parse_from(["adhealth", "evaluate", "--definitions", "d.json"]).is_err());
    }
}
