//! Handlers for the to-persistence and from-persistence commands

use super::utils::{load_records, log_record, save_records};
use crate::cli::{ConvertArgs, DirectionArg, OutputFormat};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use rowmap_core::{
    ApplicationRecord, MappingEngine, PersistenceRecord, TransformError, TransformReport,
};
use serde_json::{json, Value};

/// Handle the to-persistence command
pub fn handle_to_persistence(
    args: ConvertArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    convert(args, DirectionArg::ToPersistence, config, output)
}

/// Handle the from-persistence command
pub fn handle_from_persistence(
    args: ConvertArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    convert(args, DirectionArg::FromPersistence, config, output)
}

/// Run one record through the engine in the given direction
pub(crate) fn transform_value(
    engine: &MappingEngine,
    direction: DirectionArg,
    value: Value,
) -> std::result::Result<(Value, TransformReport), TransformError> {
    match direction {
        DirectionArg::ToPersistence => {
            let record = ApplicationRecord::from_json(value)?;
            let (row, report) = engine.to_persistence_with_report(&record)?;
            Ok((row.to_json(), report))
        }
        DirectionArg::FromPersistence => {
            let row = PersistenceRecord::from_json(value)?;
            let (record, report) = engine.from_persistence_with_report(&row)?;
            Ok((record.to_json(), report))
        }
    }
}

/// Wrap a transform error, naming the record when the input is a batch
pub(crate) fn record_error(batch: bool, index: usize, source: TransformError) -> Error {
    if batch {
        Error::Record { index, source }
    } else {
        Error::Transform(source)
    }
}

fn direction_name(direction: DirectionArg) -> &'static str {
    match direction {
        DirectionArg::ToPersistence => "to_persistence",
        DirectionArg::FromPersistence => "from_persistence",
    }
}

fn convert(
    args: ConvertArgs,
    direction: DirectionArg,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let timer = Timer::with_details(direction_name(direction), &args.file.display().to_string());
    if args.save_to.as_deref() == Some(args.file.as_path()) {
        return Err(Error::invalid_args("--save-to must not overwrite the input file"));
    }
    let engine = config.build_engine(&args.policy)?;
    let file = load_records(&args.file)?;

    output.info(&format!(
        "Converting {} record(s) from {}",
        file.values.len(),
        args.file.display()
    ))?;

    let show_progress =
        config.output.progress && file.values.len() >= config.output.progress_threshold;
    let progress = if show_progress {
        output.progress_bar(file.values.len() as u64, "Converting records")
    } else {
        None
    };

    let mut converted = Vec::with_capacity(file.values.len());
    let mut reports = Vec::with_capacity(file.values.len());

    for (index, value) in file.values.into_iter().enumerate() {
        log_record(config, index, &value);
        let outcome = transform_value(&engine, direction, value);

        let (value, report) = match outcome {
            Ok(done) => done,
            Err(e) => {
                if let Some(pb) = &progress {
                    pb.abandon();
                }
                return Err(record_error(file.batch, index, e));
            }
        };
        converted.push(value);
        reports.push(report);

        if let Some(pb) = &progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let lossy = reports.iter().filter(|r| !r.is_lossless()).count();
    tracing::info!(
        records = converted.len(),
        not_lossless = lossy,
        elapsed_ms = timer.elapsed().as_millis() as u64,
        "Conversion finished"
    );

    let result = if file.batch {
        Value::Array(converted)
    } else {
        converted.pop().unwrap_or(Value::Null)
    };

    if let Some(path) = &args.save_to {
        save_records(path, &result)?;
        output.success(&format!("✓ Output saved to {}", path.display()))?;
    } else if args.report && output.format() != OutputFormat::Human {
        let reports = if file.batch {
            serde_json::to_value(&reports)?
        } else {
            serde_json::to_value(reports.first())?
        };
        return output.data(&json!({"output": result, "report": reports}));
    } else {
        output.section("Output")?;
        output.data(&result)?;
    }

    if args.report {
        if output.format() == OutputFormat::Human {
            for (index, report) in reports.iter().enumerate() {
                if file.batch {
                    output.section(&format!("Record {}", index))?;
                }
                output.report(report)?;
            }
        } else {
            output.data(&reports)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::PolicyArgs;
    use std::fs;
    use tempfile::TempDir;

    fn convert_args(file: std::path::PathBuf, save_to: Option<std::path::PathBuf>) -> ConvertArgs {
        ConvertArgs {
            file,
            report: false,
            save_to,
            policy: PolicyArgs::default(),
        }
    }

    fn quiet_output() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Json, false, true, Box::new(std::io::sink()))
    }

    #[test]
    fn test_transform_value_both_directions() {
        let engine = MappingEngine::booking();

        let (row, report) = transform_value(
            &engine,
            DirectionArg::ToPersistence,
            json!({"firstName": "John", "isDirty": true}),
        )
        .unwrap();
        assert_eq!(row, json!({"customer_first_name": "John"}));
        assert!(!report.is_lossless());

        let (record, _) =
            transform_value(&engine, DirectionArg::FromPersistence, row).unwrap();
        assert_eq!(record, json!({"firstName": "John"}));
    }

    #[test]
    fn test_record_error_names_batch_index() {
        let source = || TransformError::UnknownField { key: "x".into() };
        assert!(matches!(
            record_error(true, 3, source()),
            Error::Record { index: 3, .. }
        ));
        assert!(matches!(record_error(false, 0, source()), Error::Transform(_)));
    }

    #[test]
    fn test_convert_batch_saves_rows() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bookings.json");
        let saved = dir.path().join("rows.json");
        fs::write(
            &input,
            r#"[{"firstName": "John", "status": {"checkedIn": true}}, {"lastName": "Smith"}]"#,
        )
        .unwrap();

        handle_to_persistence(
            convert_args(input, Some(saved.clone())),
            &Config::default(),
            &mut quiet_output(),
        )
        .unwrap();

        let rows: Value = serde_json::from_str(&fs::read_to_string(&saved).unwrap()).unwrap();
        assert_eq!(
            rows,
            json!([
                {"customer_first_name": "John", "checked_in": true},
                {"customer_last_name": "Smith"}
            ])
        );
    }

    #[test]
    fn test_save_to_input_is_rejected() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("booking.json");
        fs::write(&input, r#"{"firstName": "John"}"#).unwrap();

        let err = handle_to_persistence(
            convert_args(input.clone(), Some(input)),
            &Config::default(),
            &mut quiet_output(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgs(_)));
    }

    #[test]
    fn test_convert_batch_failure_names_record() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("rows.json");
        fs::write(
            &input,
            r#"[{"customer_first_name": "John"}, {"crew_experience_file": "crew.pdf"}]"#,
        )
        .unwrap();

        let err = handle_from_persistence(
            convert_args(input, None),
            &Config::default(),
            &mut quiet_output(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Record { index: 1, .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
