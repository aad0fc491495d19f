pub mod cli;
pub mod config;
pub mod filter;
pub mod kafka;
pub mod logging;
pub mod message;
pub mod render;
pub mod scan;

use anyhow::{Context, anyhow, bail};
use colored::Colorize;
use std::io::{self, IsTerminal, Write};
use std::path::Path;
use tracing::{debug, info};

pub use cli::{Cli, ColorMode, Commands, OutputFormat, ViewOptions, cli_parse};
pub use config::{AppConfig, ConfigError, load_config, load_config_from_path};
pub use filter::{
    FilterMap, MessageFilter, Token, TokenType, matches, parse, print_filter_warnings, tokenize,
};
pub use kafka::{KafkaSource, KafkaSourceError};
pub use message::{ConsumedMessage, InputFormat, MessageError, MessageReader, open_messages};
pub use scan::{ScanStats, scan_messages};

fn apply_color_mode(mode: ColorMode) {
    match mode {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }
}

fn wait_for_enter() -> anyhow::Result<()> {
    println!();
    print!("Press ENTER to show the next message (or Ctrl-C to exit)...");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(())
}

/// Show the matches from `messages` the way `view` asks for
fn view_messages<I>(messages: I, filter: &MessageFilter, view: &ViewOptions) -> anyhow::Result<()>
where
    I: IntoIterator<Item = Result<ConsumedMessage, MessageError>>,
{
    let clear = view.step && io::stdout().is_terminal();
    let stats = scan_messages(messages, filter, view.limit, |msg| {
        if view.count {
            return Ok(());
        }
        if clear {
            render::clear_screen(&mut io::stdout())?;
        }
        render::print_message(msg);
        if view.step {
            wait_for_enter()?;
        }
        Ok(())
    })?;

    if view.count {
        println!("{}", stats.matched);
    }
    info!(
        read = stats.read,
        matched = stats.matched,
        skipped = stats.skipped,
        "scan finished"
    );
    Ok(())
}

pub fn run() -> anyhow::Result<()> {
    let cli = cli_parse();
    logging::init_logging(cli.verbose, cli.quiet);
    apply_color_mode(cli.color);

    let app_config = load_config(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(config_path) = &cli.config {
        debug!("Config file: {}", config_path.display());
    }

    let query = cli.effective_query(&app_config.query);
    let filter = MessageFilter::parse(query);
    debug!(query, pairs = filter.required().len(), "parsed filter query");
    if !cli.quiet {
        print_filter_warnings(query);
    }

    match &cli.command {
        Commands::Tokens => {
            println!("{}", "Tokenized Query:".bold());
            print!("{}", render::token_lines(&filter.tokens()));
        }
        Commands::Parse { format } => match format {
            OutputFormat::Text => {
                if filter.is_empty() {
                    println!("No filter: every message matches");
                } else {
                    println!("{}", render::filter_table(filter.required()));
                }
            }
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(filter.required())
                    .context("Failed to serialize filter")?;
                println!("{json}");
            }
        },
        Commands::Scan {
            input,
            format,
            view,
        } => {
            if view.step && input.as_path() == Path::new("-") {
                bail!("--step needs an input file: stdin is used for the ENTER prompt");
            }

            let messages = open_messages(input, *format, app_config.topic_or_default())?;
            view_messages(messages, &filter, view)?;
        }
        Commands::Consume { topic, view } => {
            let topic = topic
                .as_deref()
                .or(app_config.consumer.topic.as_deref())
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| anyhow!("No topic to consume: pass --topic or set [consumer] topic"))?;
            debug!(
                bootstrap_servers = ?app_config.consumer.bootstrap_servers,
                group_id = ?app_config.consumer.group_id,
                "consumer settings"
            );

            let shutdown =
                kafka::shutdown_on_ctrl_c().context("Failed to install Ctrl-C handler")?;
            let source = KafkaSource::connect(&app_config.consumer, topic, shutdown)
                .with_context(|| format!("Failed to start consumer for topic '{topic}'"))?;
            view_messages(source, &filter, view)?;
        }
        Commands::Config => {
            let body = toml::to_string_pretty(&app_config.redacted())
                .context("Failed to serialize config")?;
            print!("{body}");
        }
    }

    Ok(())
}
