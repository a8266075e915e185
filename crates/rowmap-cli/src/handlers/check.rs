//! Check command handler

use super::convert::{record_error, transform_value};
use super::utils::{load_records, log_record};
use crate::cli::{CheckArgs, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use serde::Serialize;

/// A record that failed to transform
#[derive(Debug, Serialize)]
struct Failure {
    index: usize,
    code: &'static str,
    key: Option<String>,
    message: String,
}

/// Outcome of checking a file
#[derive(Debug, Serialize)]
struct CheckSummary {
    total: usize,
    checked: usize,
    passed: usize,
    failures: Vec<Failure>,
}

/// Handle the check command
pub fn handle_check(args: CheckArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("check", &args.file.display().to_string());
    let engine = config.build_engine(&args.policy)?;
    let file = load_records(&args.file)?;
    let total = file.values.len();

    output.info(&format!("Checking {} record(s) from {}", total, args.file.display()))?;

    let mut summary = CheckSummary {
        total,
        checked: 0,
        passed: 0,
        failures: Vec::new(),
    };

    for (index, value) in file.values.into_iter().enumerate() {
        log_record(config, index, &value);
        summary.checked += 1;

        match transform_value(&engine, args.direction, value) {
            Ok(_) => summary.passed += 1,
            Err(e) => {
                tracing::debug!(index, code = %e.code(), "Record failed");
                let error = record_error(true, index, e);
                output.error(&format!("✗ {}", error))?;

                if let Some(source) = error.transform_error() {
                    summary.failures.push(Failure {
                        index,
                        code: source.code().as_str(),
                        key: source.key().map(str::to_string),
                        message: source.to_string(),
                    });
                }

                if args.fail_fast {
                    break;
                }
            }
        }
    }

    if output.format() == OutputFormat::Human {
        if summary.failures.is_empty() {
            output.success(&format!("✓ All {} record(s) transform cleanly", total))?;
        } else if summary.checked < total {
            output.warning(&format!(
                "Stopped after {} of {} record(s)",
                summary.checked, total
            ))?;
        }
    } else {
        output.data(&summary)?;
    }

    if summary.failures.is_empty() {
        Ok(())
    } else {
        Err(Error::CheckFailed {
            failed: summary.failures.len(),
            total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{DirectionArg, PolicyArgs, UnknownFieldsArg};
    use std::fs;
    use tempfile::TempDir;

    fn check_args(file: std::path::PathBuf, fail_fast: bool, policy: PolicyArgs) -> CheckArgs {
        CheckArgs {
            file,
            direction: DirectionArg::ToPersistence,
            fail_fast,
            policy,
        }
    }

    fn sink() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(std::io::sink()))
    }

    fn write_bookings(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("bookings.json");
        fs::write(
            &path,
            r#"[
                {"firstName": "John"},
                {"fristName": "Jane"},
                {"notes": ["a", "b"]},
                {"lastName": "Smith"}
            ]"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_check_counts_failures() {
        let dir = TempDir::new().unwrap();
        let path = write_bookings(&dir);

        let args = check_args(path, false, PolicyArgs::default());
        let err = handle_check(args, &Config::default(), &mut sink()).unwrap_err();
        assert!(matches!(err, Error::CheckFailed { failed: 2, total: 4 }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_check_fail_fast() {
        let dir = TempDir::new().unwrap();
        let path = write_bookings(&dir);

        let args = check_args(path, true, PolicyArgs::default());
        let err = handle_check(args, &Config::default(), &mut sink()).unwrap_err();
        assert!(matches!(err, Error::CheckFailed { failed: 1, total: 4 }));
    }

    #[test]
    fn test_check_passthrough_policy() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bookings.yaml");
        fs::write(&path, "- firstName: John\n- fristName: Jane\n").unwrap();

        let policy = PolicyArgs {
            unknown_fields: Some(UnknownFieldsArg::Passthrough),
            partial_compounds: None,
        };
        handle_check(check_args(path, false, policy), &Config::default(), &mut sink()).unwrap();
    }
}
