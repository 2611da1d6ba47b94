pub mod decode;
mod error;
pub mod extract;
pub mod line;
pub mod token;
pub mod trap_log;

pub use error::Error;
pub use trap_log::TrapLog;

use clap::{Arg, CommandFactory, Parser};
use std::path::PathBuf;

const DEFAULT_OUT: &str = "spl_extracted.csv";
const DEFAULT_PATTERN: &str = "*.csv";
const DEFAULT_RECURSIVE_PATTERN: &str = "**/*.csv";

/// Extract SPL readings from SNMP trap logs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, args_override_self = true)]
pub struct Args {
    /// Path to the CSV file to write.
    #[arg(long, default_value = DEFAULT_OUT)]
    pub out: PathBuf,

    /// Also search subdirectories when reading the default `*.csv` pattern.
    #[arg(long)]
    pub recursive: bool,

    /// Glob pattern of trap logs to read. The last one given wins.
    #[arg(long)]
    pub pattern: Option<String>,
}

impl Args {
    /// Parse the command line, dropping anything that isn't a known flag instead of bailing out.
    ///
    /// The first item of `argv` is the program name. Returns the parsed arguments along with every
    /// argument that was ignored.
    pub fn parse_lenient<I>(argv: I) -> (Self, Vec<String>)
    where
        I: IntoIterator<Item = String>,
    {
        let mut command = Self::command();

        // Pulls in the generated `--help` and `--version` flags
        command.build();

        let mut argv = argv.into_iter();
        let mut known = argv.next().into_iter().collect::<Vec<_>>();
        let mut ignored = Vec::new();

        while let Some(arg) = argv.next() {
            let (takes_value, has_inline_value) = {
                let (flag, inline_value) = match arg.split_once('=') {
                    Some((flag, value)) if flag.starts_with("--") => (flag, Some(value)),
                    _ => (arg.as_str(), None),
                };

                let takes_value = command
                    .get_arguments()
                    .find(|def| flag_matches(def, flag))
                    .map(|def| def.get_action().takes_values());

                (takes_value, inline_value.is_some())
            };

            match (takes_value, has_inline_value) {
                (Some(true), true) | (Some(false), false) => known.push(arg),
                (Some(true), false) => match argv.next() {
                    // Glue the value on so clap never mistakes it for a flag
                    Some(value) if arg.starts_with("--") => known.push(format!("{arg}={value}")),
                    Some(value) => known.extend([arg, value]),
                    None => ignored.push(arg),
                },
                _ => ignored.push(arg),
            }
        }

        (Self::parse_from(known), ignored)
    }

    /// Resolve default patterns into the settings for a single run.
    pub fn into_settings(self) -> Settings {
        let pattern = self
            .pattern
            .unwrap_or_else(|| DEFAULT_PATTERN.to_string());

        // Also applies to an explicit `--pattern '*.csv'`
        let pattern = if self.recursive && pattern == DEFAULT_PATTERN {
            DEFAULT_RECURSIVE_PATTERN.to_string()
        } else {
            pattern
        };

        Settings {
            patterns: vec![pattern],
            out: self.out,
        }
    }
}

fn flag_matches(def: &Arg, flag: &str) -> bool {
    if let Some(long) = flag.strip_prefix("--") {
        return def.get_long() == Some(long);
    }

    let mut short = match flag.strip_prefix('-') {
        Some(short) => short.chars(),
        None => return false,
    };

    match (short.next(), short.next()) {
        (Some(c), None) => def.get_short() == Some(c),
        _ => false,
    }
}

/// Everything needed for one extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Glob patterns of input files.
    pub patterns: Vec<String>,

    /// Output CSV. Never read as an input, even if a pattern matches it.
    pub out: PathBuf,
}

/// A single decoded SPL reading, also a single CSV row.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SplRecord {
    /// Trap timestamp exactly as logged.
    pub timestamp: String,

    /// Trap source address without its port.
    pub ip: String,

    /// Sound pressure level in dB.
    pub spl: u64,
}
