use crate::infra::read_json;
use adhealth::config::AppConfig;
use adhealth::error::AppError;
use adhealth::evaluation::{
    validate_definitions, CheckCatalog, CheckDefinition, EvaluationEngine, EvaluationReport,
    ExecutionResult, RuleProblem, ThresholdSet,
};
use adhealth::telemetry;
use clap::Args;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// JSON array of check definitions
    #[arg(long)]
    pub(crate) definitions: PathBuf,
    /// JSON array of execution results collected by the check runners
    #[arg(long)]
    pub(crate) results: PathBuf,
    /// Optional JSON object of named thresholds
    #[arg(long)]
    pub(crate) thresholds: Option<PathBuf>,
    /// Write the report here instead of stdout
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub(crate) struct ValidateArgs {
    /// JSON array of check definitions
    #[arg(long)]
    pub(crate) definitions: PathBuf,
}

fn init_logging() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(())
}

pub(crate) fn evaluate_files(args: &EvaluateArgs) -> Result<EvaluationReport, AppError> {
    let catalog = CheckCatalog::from_path(&args.definitions)?;
    let thresholds = match &args.thresholds {
        Some(path) => ThresholdSet::from_path(path)?,
        None => ThresholdSet::default(),
    };
    let results: Vec<ExecutionResult> = read_json(&args.results)?;

    Ok(EvaluationEngine::new().evaluate_batch(&results, catalog.definitions(), &thresholds))
}

pub(crate) fn run_evaluate(args: EvaluateArgs) -> Result<(), AppError> {
    init_logging()?;

    let report = evaluate_files(&args)?;
    let rendered = serde_json::to_string_pretty(&report)?;

    match &args.output {
        Some(path) => {
            fs::write(path, rendered)?;
            let summary = report.summary;
            println!(
                "Evaluated {} checks: {} pass, {} warning, {} fail, {} issues ({} skipped)",
                summary.total_checks,
                summary.pass_count,
                summary.warning_count,
                summary.fail_count,
                summary.total_issues,
                summary.skipped_count
            );
            println!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }

    Ok(())
}

pub(crate) fn validate_files(args: &ValidateArgs) -> Result<Vec<RuleProblem>, AppError> {
    let definitions: Vec<CheckDefinition> = read_json(&args.definitions)?;
    Ok(validate_definitions(&definitions))
}

pub(crate) fn run_validate(args: ValidateArgs) -> Result<(), AppError> {
    init_logging()?;

    let problems = validate_files(&args)?;
    if problems.is_empty() {
        println!("No rule problems found in {}", args.definitions.display());
        return Ok(());
    }

    println!("{} rule problem(s) in {}", problems.len(), args.definitions.display());
    for problem in &problems {
        match problem.rule_index {
            Some(index) => println!("- {} rule #{}: {}", problem.check_id, index, problem.message),
            None => println!("- {}: {}", problem.check_id, problem.message),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use adhealth::evaluation::EvaluationStatus;
    use std::path::Path;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("adhealth-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    fn write(dir: &Path, file: &str, contents: &str) -> PathBuf {
        let path = dir.join(file);
        fs::write(&path, contents).expect("fixture written");
        path
    }

    const DEFINITIONS: &str = r#"[
        {
            "CheckId": "TIME-001",
            "CheckName": "Time skew",
            "CategoryId": "TIME",
            "Severity": "High",
            "EvaluationRules": {"Rules": [
                {"Condition": "OffsetSeconds > MaxTimeSkewSeconds", "Status": "Fail", "Title": "Time skew"}
            ]},
            "RemediationSteps": "w32tm /resync"
        }
    ]"#;

    #[test]
    fn evaluates_files_with_thresholds() {
        let dir = scratch_dir("evaluate");
        let args = EvaluateArgs {
            definitions: write(&dir, "definitions.json", DEFINITIONS),
            results: write(
                &dir,
                "results.json",
                r#"[
                    {"CheckId": "TIME-001", "Status": "Completed", "RawOutput": {"Name": "DC01", "OffsetSeconds": 42}},
                    {"CheckId": "UNKNOWN", "Status": "Completed", "RawOutput": null}
                ]"#,
            ),
            thresholds: Some(write(&dir, "thresholds.json", r#"{"MaxTimeSkewSeconds": 30}"#)),
            output: None,
        };

        let report = evaluate_files(&args).expect("report");

        assert_eq!(report.results.len(), 1);
        assert_eq!(report.results[0].evaluation_status, EvaluationStatus::Fail);
        assert_eq!(report.results[0].issues[0].affected_object, "DC01");
        assert_eq!(report.summary.skipped_count, 1);
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn missing_results_file_is_an_io_error() {
        let dir = scratch_dir("missing");
        let args = EvaluateArgs {
            definitions: write(&dir, "definitions.json", DEFINITIONS),
            results: dir.join("absent.json"),
            thresholds: None,
            output: None,
        };

        assert!(matches!(evaluate_files(&args), Err(AppError::Io(_))));
        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn validation_reports_broken_conditions() {
        let dir = scratch_dir("validate");
        let args = ValidateArgs {
            definitions: write(
                &dir,
                "definitions.json",
                r#"[{"CheckId": "X", "CheckName": "X", "Severity": "Low",
                     "EvaluationRules": {"Rules": [{"Condition": "Count >>", "Status": "Fail", "Title": "t"}]}}]"#,
            ),
        };

        let problems = validate_files(&args).expect("validates");
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].rule_index, Some(0));
        let _ = fs::remove_dir_all(dir);
    }
}
