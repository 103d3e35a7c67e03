//! CLI argument definitions for the SRUM converter.

use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use srum_cli::logging::{LogConfig, LogFormat};
use tracing::level_filters::LevelFilter;

#[derive(Parser)]
#[command(
    name = "srum-convert",
    version,
    about = "Normalize a SRUM database and WLAN profiles into SQLite",
    long_about = "Decode every table of a SRUM (System Resource Usage Monitor) database \
                  and the WLAN profiles of a SOFTWARE hive into typed SQLite tables.\n\n\
                  Sources are JSON dumps of the ESE database and of the hive."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Prefix pretty and compact log lines with a timestamp.
    #[arg(long = "log-timestamps", global = true)]
    pub log_timestamps: bool,
}

impl Cli {
    /// Logging settings from the global flags. An explicit `--log-level` or
    /// any `-v`/`-q` disables `RUST_LOG`.
    pub fn log_config(&self) -> LogConfig {
        let level = self
            .log_level
            .map_or_else(|| self.verbosity.tracing_level_filter(), LevelFilter::from);
        let ansi = match self.color.color {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => self.log_file.is_none() && io::stderr().is_terminal(),
        };
        LogConfig::default()
            .with_level(level)
            .with_env_filter(!(self.verbosity.is_present() || self.log_level.is_some()))
            .with_format(self.log_format.into())
            .with_timestamps(self.log_timestamps)
            .with_ansi(ansi)
            .with_log_file(self.log_file.clone())
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a SRUM database (and optionally WLAN profiles) to SQLite.
    Convert(ConvertArgs),

    /// Print the type maps, table aliases and decode rules.
    Rules,
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// JSON dump of the SRUM ESE database.
    #[arg(long = "srum-db", value_name = "JSON")]
    pub srum_db: PathBuf,

    /// Destination SQLite database.
    #[arg(long = "output-db", value_name = "PATH")]
    pub output_db: PathBuf,

    /// JSON dump of the SOFTWARE hive; enables the WLAN profile table.
    #[arg(long = "software-hive", value_name = "JSON")]
    pub software_hive: Option<PathBuf>,

    /// Keep an existing output database instead of recreating it.
    ///
    /// Rows already present are skipped as duplicates.
    #[arg(long = "keep-existing")]
    pub keep_existing: bool,

    /// Seconds to wait for a locked output database.
    #[arg(long = "busy-timeout-secs", value_name = "SECS", default_value_t = 10)]
    pub busy_timeout_secs: u64,

    /// Extra table alias, as SOURCE=DESTINATION. May be repeated.
    #[arg(long = "alias", value_name = "SRC=DEST", value_parser = parse_alias)]
    pub aliases: Vec<(String, String)>,
}

fn parse_alias(value: &str) -> Result<(String, String), String> {
    let (source, destination) = value
        .split_once('=')
        .ok_or_else(|| format!("expected SOURCE=DESTINATION, got `{value}`"))?;
    let (source, destination) = (source.trim(), destination.trim());
    if source.is_empty() || destination.is_empty() {
        return Err(format!("alias needs both sides, got `{value}`"));
    }
    Ok((source.to_string(), destination.to_string()))
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LevelFilter {
    fn from(level: LogLevelArg) -> Self {
        match level {
            LogLevelArg::Error => LevelFilter::ERROR,
            LogLevelArg::Warn => LevelFilter::WARN,
            LogLevelArg::Info => LevelFilter::INFO,
            LogLevelArg::Debug => LevelFilter::DEBUG,
            LogLevelArg::Trace => LevelFilter::TRACE,
        }
    }
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(format: LogFormatArg) -> Self {
        match format {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_splits_on_first_equals() {
        assert_eq!(
            parse_alias("{AAAA}=Custom=Data"),
            Ok(("{AAAA}".to_string(), "Custom=Data".to_string()))
        );
    }

    #[test]
    fn alias_rejects_missing_side() {
        assert!(parse_alias("NoEquals").is_err());
        assert!(parse_alias("=Dest").is_err());
    }

    #[test]
    fn convert_parses_repeated_aliases() {
        let cli = Cli::try_parse_from([
            "srum-convert",
            "convert",
            "--srum-db",
            "SRUDB.json",
            "--output-db",
            "out.sqlite",
            "--alias",
            "{A}=First",
            "--alias",
            "{B}=Second",
        ])
        .expect("parse");
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.aliases.len(), 2);
        assert_eq!(args.busy_timeout_secs, 10);
        assert!(!args.keep_existing);
    }

    #[test]
    fn verbosity_flags_select_level_and_disable_env() {
        let cli = Cli::try_parse_from(["srum-convert", "-vv", "rules"]).expect("parse");
        let config = cli.log_config();
        assert_eq!(config.level_filter, LevelFilter::DEBUG);
        assert!(!config.use_env_filter);
        assert!(!config.with_timestamps);
    }

    #[test]
    fn log_flags_shape_config() {
        let cli = Cli::try_parse_from([
            "srum-convert",
            "rules",
            "--log-level",
            "trace",
            "--log-format",
            "json",
            "--log-timestamps",
            "--log-file",
            "convert.log",
            "--color",
            "never",
        ])
        .expect("parse");
        let config = cli.log_config();
        assert_eq!(config.level_filter, LevelFilter::TRACE);
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.with_timestamps);
        assert!(!config.with_ansi);
        assert_eq!(config.log_file, Some(PathBuf::from("convert.log")));
    }

    #[test]
    fn default_config_defers_to_env() {
        let cli = Cli::try_parse_from(["srum-convert", "rules"]).expect("parse");
        let config = cli.log_config();
        assert_eq!(config.level_filter, LevelFilter::WARN);
        assert!(config.use_env_filter);
    }
}
