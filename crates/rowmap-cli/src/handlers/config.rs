//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::{Path, PathBuf};

/// Handle the config command
pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
    }
}

/// Handle config init subcommand
fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = if args.user {
        Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?
    } else {
        args.path.unwrap_or_else(|| PathBuf::from(".rowmap.yaml"))
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    output.info("Edit it to add fields, transient keys or change the policies.")?;

    Ok(())
}

/// Handle config show subcommand
fn handle_config_show(
    args: ConfigShowArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let hint = match args.format {
        ConfigFormat::Toml => Path::new("config.toml"),
        ConfigFormat::Json => Path::new("config.json"),
        ConfigFormat::Yaml => Path::new("config.yaml"),
    };

    let content = config.render(hint)?;
    output.writeln(content.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputFormat;
    use tempfile::TempDir;

    fn sink() -> OutputWriter {
        OutputWriter::with_writer(OutputFormat::Human, false, true, Box::new(std::io::sink()))
    }

    #[test]
    fn test_init_writes_defaults_and_respects_force() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("rowmap.toml");

        let init = |force| ConfigInitArgs {
            path: Some(path.clone()),
            user: false,
            force,
        };

        handle_config_init(init(false), &mut sink()).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());

        std::fs::write(&path, "[output]\nprogress = false\n").unwrap();
        handle_config_init(init(false), &mut sink()).unwrap();
        assert!(!Config::from_file(&path).unwrap().output.progress);

        handle_config_init(init(true), &mut sink()).unwrap();
        assert!(Config::from_file(&path).unwrap().output.progress);
    }
}
