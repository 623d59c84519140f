//! CLI command definitions and subcommands

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// objwizard - ABCD learning-objective wizard
#[derive(Parser)]
#[command(
    name = "ow",
    about = "Wizard for triaging course tasks and authoring ABCD learning objectives",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Where to load the wizard document from
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Course id to load from the API
    #[arg(short = 'u', long, value_name = "COURSE_ID", conflicts_with = "file")]
    pub course: Option<String>,

    /// Load the wizard document from a JSON file instead of the API
    #[arg(short, long, value_name = "PATH")]
    pub file: Option<PathBuf>,
}

impl SourceArgs {
    /// True when neither a course id nor a file was given.
    pub fn is_empty(&self) -> bool {
        self.course.is_none() && self.file.is_none()
    }
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show per-step progress for a course
    Status {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the traceability report (coverage, orphans, distributions)
    Report {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print every objective as a composed ABCD sentence
    Compose {
        #[command(flatten)]
        source: SourceArgs,

        /// Compose a single objective instead of all of them
        #[arg(long, value_name = "ID")]
        objective: Option<String>,
    },

    /// Export objectives grouped by their linked task
    Export {
        #[command(flatten)]
        source: SourceArgs,

        /// Output format
        #[arg(long, default_value = "markdown")]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// Open the interactive wizard session
    #[command(alias = "repl")]
    Edit {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Create a blank objective for every uncovered active item
    Seed {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// List Bloom verb suggestions
    Verbs {
        /// Level to show (all six when omitted)
        level: Option<String>,
    },
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    let path = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("objwizard")
        .join("logs")
        .join("objwizard.log");
    debug!(?path, "get_log_path: returning path");
    path
}

/// Output format for status/report commands
#[derive(Clone, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Table,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "table" => Ok(Self::Table),
            _ => {
                debug!(%s, "OutputFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: text, json, or table", s))
            }
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Table => write!(f, "table"),
        }
    }
}

/// Output format for the export command
#[derive(Clone, Debug, Default)]
pub enum ExportFormat {
    #[default]
    Markdown,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markdown" | "md" => Ok(Self::Markdown),
            "json" => Ok(Self::Json),
            _ => {
                debug!(%s, "ExportFormat::from_str: unknown format");
                Err(format!("Unknown format: {}. Use: markdown or json", s))
            }
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Markdown => write!(f, "markdown"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_no_command() {
        let cli = Cli::parse_from(["ow"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_parse_status_with_course() {
        let cli = Cli::parse_from(["ow", "status", "--course", "c1"]);
        if let Some(Command::Status { source, .. }) = cli.command {
            assert_eq!(source.course.as_deref(), Some("c1"));
            assert!(source.file.is_none());
        } else {
            panic!("Expected Status command");
        }
    }

    #[test]
    fn test_cli_parse_export_with_file_source() {
        let cli = Cli::parse_from(["ow", "export", "--file", "course.json", "-o", "out.md"]);
        if let Some(Command::Export {
            source,
            format,
            output,
        }) = cli.command
        {
            assert_eq!(source.file, Some(PathBuf::from("course.json")));
            assert!(matches!(format, ExportFormat::Markdown));
            assert_eq!(output, Some(PathBuf::from("out.md")));
        } else {
            panic!("Expected Export command");
        }
    }

    #[test]
    fn test_cli_parse_compose_single_objective() {
        let cli = Cli::parse_from(["ow", "compose", "--file", "course.json", "--objective", "o1"]);
        if let Some(Command::Compose { source, objective }) = cli.command {
            assert_eq!(source.file, Some(PathBuf::from("course.json")));
            assert_eq!(objective.as_deref(), Some("o1"));
        } else {
            panic!("Expected Compose command");
        }
    }

    #[test]
    fn test_cli_rejects_course_and_file_together() {
        let result = Cli::try_parse_from([
            "ow", "report", "--course", "c1", "--file", "course.json",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_parse_edit_alias() {
        let cli = Cli::parse_from(["ow", "repl", "-u", "c1"]);
        assert!(matches!(cli.command, Some(Command::Edit { .. })));
    }

    #[test]
    fn test_cli_with_config() {
        let cli = Cli::parse_from(["ow", "-c", "/path/to/config.yml", "verbs"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/config.yml")));
    }

    #[test]
    fn test_output_format_from_str() {
        assert!(matches!("text".parse::<OutputFormat>(), Ok(OutputFormat::Text)));
        assert!(matches!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json)));
        assert!(matches!("table".parse::<OutputFormat>(), Ok(OutputFormat::Table)));
        assert!("invalid".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_export_format_from_str() {
        assert!(matches!("md".parse::<ExportFormat>(), Ok(ExportFormat::Markdown)));
        assert!(matches!("json".parse::<ExportFormat>(), Ok(ExportFormat::Json)));
        assert!("yaml".parse::<ExportFormat>().is_err());
    }
}
