//! Mappings command handler

use crate::cli::{MappingsArgs, OutputFormat, PolicyArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::OutputWriter;
use rowmap_core::mapping::STATUS_KEY;
use rowmap_core::{FieldGroup, FieldMapping, MappingEngine};
use serde_json::json;

/// Handle the mappings command
pub fn handle_mappings(
    args: MappingsArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let engine = config.build_engine(&PolicyArgs::default())?;
    let group = args.group.map(FieldGroup::from);

    let entries: Vec<&FieldMapping> = engine
        .table()
        .entries()
        .iter()
        .filter(|entry| group.map_or(true, |g| entry.group == g))
        .collect();

    if output.format() != OutputFormat::Human {
        let compounds: Vec<_> = engine
            .compounds()
            .iter()
            .filter(|rule| entries.iter().any(|e| e.app_key == rule.key))
            .map(|rule| json!({"key": rule.key, "shape": rule.shape, "columns": rule.columns()}))
            .collect();
        return output.data(&json!({
            "fields": entries,
            "compounds": compounds,
            "transient": engine.table().transient_keys(),
        }));
    }

    output.section("Field Mappings")?;
    output.table(&["Key", "Column", "Group"], mapping_rows(&engine, &entries, args.expand))?;

    if group.is_none() {
        output.section("Transient Keys")?;
        output.writeln(&engine.table().transient_keys().join(", "))?;
    }

    Ok(())
}

/// Table rows, with decomposed file columns and nested status paths when expanded
fn mapping_rows(
    engine: &MappingEngine,
    entries: &[&FieldMapping],
    expand: bool,
) -> Vec<Vec<String>> {
    let mut rows = Vec::new();

    for entry in entries {
        let key = if expand && entry.group == FieldGroup::Status {
            format!("{}.{}", STATUS_KEY, entry.app_key)
        } else {
            entry.app_key.clone()
        };
        rows.push(vec![key, entry.column.clone(), entry.group.to_string()]);

        if !expand {
            continue;
        }
        if let Some(rule) = engine.compounds().get(&entry.app_key) {
            for member in rule.shape.members() {
                rows.push(vec![
                    format!("  {}.{}", entry.app_key, member),
                    rule.column(member),
                    entry.group.to_string(),
                ]);
            }
        }
    }

    rows
}
