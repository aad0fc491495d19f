use crate::message::InputFormat;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Step through topic messages, showing only those whose payload contains the
/// required key/value pairs
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// TOML configuration file with [consumer], [schema_registry] and query
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Filter query, e.g. "status=ok, region='eu west'"
    #[arg(short, long, global = true, env = "TOPIC_FILTER_QUERY")]
    pub query: Option<String>,

    /// When to use colored output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Increase diagnostic output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the tokens of the filter query
    Tokens,
    /// Show the key/value pairs the filter query requires
    Parse {
        #[arg(short = 'F', long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Read messages and display those matching the filter query
    Scan {
        /// Message file, or '-' for stdin
        #[arg(default_value = "-")]
        input: PathBuf,

        /// Layout of the input
        #[arg(short = 'F', long, value_enum, default_value_t = InputFormat::Lines)]
        format: InputFormat,

        #[command(flatten)]
        view: ViewOptions,
    },
    /// Consume a Kafka topic and display messages matching the filter query
    Consume {
        /// Topic to read, overriding [consumer] topic
        #[arg(short, long)]
        topic: Option<String>,

        #[command(flatten)]
        view: ViewOptions,
    },
    /// Print the effective configuration with credentials redacted
    Config,
}

/// How matching messages are shown
#[derive(Args, Debug, Clone, Copy, Default)]
pub struct ViewOptions {
    /// Clear the screen before each message and wait for ENTER after it
    #[arg(long)]
    pub step: bool,

    /// Stop after this many matching messages
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,

    /// Print only the number of matching messages
    #[arg(short, long)]
    pub count: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl Cli {
    /// The query from the command line or environment, falling back to configuration
    pub fn effective_query<'a>(&'a self, configured: &'a str) -> &'a str {
        self.query.as_deref().unwrap_or(configured)
    }
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_defaults() {
        let cli = Cli::try_parse_from(["topic-filter", "scan"]).unwrap();
        match cli.command {
            Commands::Scan {
                input,
                format,
                view,
            } => {
                assert_eq!(input, PathBuf::from("-"));
                assert_eq!(format, InputFormat::Lines);
                assert!(!view.step && !view.count);
                assert_eq!(view.limit, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_consume_options() {
        let cli =
            Cli::try_parse_from(["topic-filter", "consume", "-t", "orders", "--step", "-n", "3"])
                .unwrap();
        match cli.command {
            Commands::Consume { topic, view } => {
                assert_eq!(topic.as_deref(), Some("orders"));
                assert!(view.step);
                assert_eq!(view.limit, Some(3));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_query_flag_overrides_config() {
        let cli = Cli::try_parse_from(["topic-filter", "tokens", "-q", "a=1"]).unwrap();
        assert_eq!(cli.effective_query("b=2"), "a=1");
    }

    #[test]
    fn test_verbose_is_counted() {
        let cli = Cli::try_parse_from(["topic-filter", "-vv", "config"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
