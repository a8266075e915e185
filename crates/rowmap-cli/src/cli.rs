//! Command-line interface argument parsing and definitions
//!
//! This module defines the CLI structure using clap's derive API,
//! providing a type-safe and well-documented command interface.

use clap::{Parser, Subcommand, ValueEnum};
use rowmap_core::{FieldGroup, PartialCompoundPolicy, UnknownFieldPolicy};
use std::io::IsTerminal;
use std::path::PathBuf;

/// Rowmap CLI - convert booking records to flat storage rows and back
///
/// Reads records from JSON or YAML files, runs the mapping engine and prints
/// the result. Nothing is written to a database; the output is what a storage
/// client would receive.
#[derive(Parser, Debug)]
#[command(
    name = "rowmap",
    version,
    author,
    about,
    long_about = None,
    propagate_version = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Enable verbose output (can be used multiple times for increased verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "ROWMAP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format for results
    #[arg(short, long, value_enum, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// The subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Flatten application records into storage rows
    ToPersistence(ConvertArgs),

    /// Rebuild application records from storage rows
    FromPersistence(ConvertArgs),

    /// Check that every record in a file transforms cleanly
    Check(CheckArgs),

    /// List the field mapping table
    Mappings(MappingsArgs),

    /// Manage configuration files and settings
    Config(ConfigArgs),

    /// Generate shell completions for the specified shell
    Completions(CompletionsArgs),
}

/// Engine policy overrides shared by the transform commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct PolicyArgs {
    /// Handling of keys the mapping table does not cover
    #[arg(long, value_enum, value_name = "POLICY")]
    pub unknown_fields: Option<UnknownFieldsArg>,

    /// Handling of partially present file column groups
    #[arg(long, value_enum, value_name = "POLICY")]
    pub partial_compounds: Option<PartialCompoundsArg>,
}

/// Arguments for the to-persistence and from-persistence commands
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Path to a JSON or YAML file holding one record or an array of records
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Print the transform report for each record
    #[arg(long)]
    pub report: bool,

    /// Write the converted records to a file instead of stdout
    #[arg(long = "save-to", value_name = "OUTPUT_FILE")]
    pub save_to: Option<PathBuf>,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// Arguments for the check command
#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Path to a JSON or YAML file holding one record or an array of records
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Which transform to check the records against
    #[arg(short, long, value_enum, default_value = "to-persistence")]
    pub direction: DirectionArg,

    /// Stop at the first failing record
    #[arg(long)]
    pub fail_fast: bool,

    #[command(flatten)]
    pub policy: PolicyArgs,
}

/// Arguments for the mappings command
#[derive(Parser, Debug)]
pub struct MappingsArgs {
    /// Only list entries of one group
    #[arg(short, long, value_enum)]
    pub group: Option<GroupArg>,

    /// Also list the decomposed columns of file fields
    #[arg(long)]
    pub expand: bool,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a configuration file with default values
    Init(ConfigInitArgs),

    /// Show current configuration values
    Show(ConfigShowArgs),
}

/// Arguments for config init
#[derive(Parser, Debug)]
pub struct ConfigInitArgs {
    /// Destination file (.rowmap.yaml in the current directory if not specified)
    #[arg(value_name = "PATH")]
    pub path: Option<PathBuf>,

    /// Initialize the user config instead (config dir/rowmap/config.yaml)
    #[arg(long, conflicts_with = "path")]
    pub user: bool,

    /// Force overwrite existing config files
    #[arg(long)]
    pub force: bool,
}

/// Arguments for config show
#[derive(Parser, Debug)]
pub struct ConfigShowArgs {
    /// Show configuration in specified format
    #[arg(short, long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Configuration file formats
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML format
    Toml,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
}

/// Arguments for generating shell completions
#[derive(Parser, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Output format options
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable formatted output
    Human,
    /// JSON output
    Json,
    /// YAML output
    Yaml,
    /// Pretty-printed JSON output
    JsonPretty,
}

/// Transform direction
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Application record → storage row
    ToPersistence,
    /// Storage row → application record
    FromPersistence,
}

/// Unknown field policy
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum UnknownFieldsArg {
    /// Fail on unmapped keys
    Reject,
    /// Forward unmapped keys under their own name
    Passthrough,
}

/// Partial compound policy
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum PartialCompoundsArg {
    /// Fail on partial file column groups
    Reject,
    /// Leave partial file column groups out
    Omit,
}

/// Field groups of the mapping table
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum GroupArg {
    Financial,
    Customer,
    BookingDetail,
    Status,
    Timestamp,
    File,
    Notes,
}

/// Supported shells for completion generation
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the effective verbosity level (considering quiet flag)
    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }

    /// Check if colored output should be used
    pub fn use_color(&self) -> bool {
        !self.no_color && std::io::stdout().is_terminal()
    }
}

impl From<UnknownFieldsArg> for UnknownFieldPolicy {
    fn from(arg: UnknownFieldsArg) -> Self {
        match arg {
            UnknownFieldsArg::Reject => UnknownFieldPolicy::Reject,
            UnknownFieldsArg::Passthrough => UnknownFieldPolicy::Passthrough,
        }
    }
}

impl From<PartialCompoundsArg> for PartialCompoundPolicy {
    fn from(arg: PartialCompoundsArg) -> Self {
        match arg {
            PartialCompoundsArg::Reject => PartialCompoundPolicy::Reject,
            PartialCompoundsArg::Omit => PartialCompoundPolicy::Omit,
        }
    }
}

impl From<GroupArg> for FieldGroup {
    fn from(arg: GroupArg) -> Self {
        match arg {
            GroupArg::Financial => FieldGroup::Financial,
            GroupArg::Customer => FieldGroup::Customer,
            GroupArg::BookingDetail => FieldGroup::BookingDetail,
            GroupArg::Status => FieldGroup::Status,
            GroupArg::Timestamp => FieldGroup::Timestamp,
            GroupArg::File => FieldGroup::File,
            GroupArg::Notes => FieldGroup::Notes,
        }
    }
}

impl Shell {
    /// Convert to clap_complete shell type
    pub fn to_clap_shell(self) -> clap_complete::Shell {
        match self {
            Shell::Bash => clap_complete::Shell::Bash,
            Shell::Zsh => clap_complete::Shell::Zsh,
            Shell::Fish => clap_complete::Shell::Fish,
            Shell::PowerShell => clap_complete::Shell::PowerShell,
            Shell::Elvish => clap_complete::Shell::Elvish,
        }
    }
}
