use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use chrono::{DateTime, Utc};
use std::fmt::{self, Write as _};
use std::path::{Path, PathBuf};
use url::Url;

use minifeed::config::{Config, DisplayOptions};
use minifeed::model::{HasAuthors, HasLinks};
use minifeed::util::{display_width, truncate_to_width};
use minifeed::{Channel, FeedParser};

/// Maximum number of feed files read at once.
const MAX_CONCURRENT_READS: usize = 8;

/// Placeholder for fields a feed did not supply.
const MISSING: &str = "<none>";

/// Get the config directory path (~/.config/minifeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("minifeed"))
}

#[derive(Parser, Debug)]
#[command(
    name = "minifeed",
    about = "Parse RSS and Atom feed files and print what was found"
)]
struct Args {
    /// Config file (default: ~/.config/minifeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Character encoding to assume, overriding the documents' own
    #[arg(long, value_name = "LABEL")]
    encoding: Option<String>,

    /// Base URL for relative links (default: each file's own file:// URL)
    #[arg(long, value_name = "URL")]
    base: Option<Url>,

    /// Print channels as JSON instead of a text report
    #[arg(long)]
    json: bool,

    /// Feed documents to parse
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
}

/// JSON output record for one input file.
#[derive(Serialize)]
struct FeedReport<'a> {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<&'a Channel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?,
        None => match get_config_dir() {
            Ok(dir) => {
                let path = dir.join("config.toml");
                Config::load(&path)
                    .with_context(|| format!("Failed to load config file: {}", path.display()))?
            }
            Err(e) => {
                tracing::debug!(error = %e, "No config directory, using defaults");
                Config::default()
            }
        },
    };

    let parser = FeedParser::new(config.parser.clone());
    let parser = &parser;
    let encoding = args.encoding.as_deref();
    let base = args.base.as_ref();

    // Results stay in command-line order
    let results: Vec<(&PathBuf, Result<Channel>)> = stream::iter(&args.files)
        .map(move |path| async move {
            let result = read_and_parse(parser, path, encoding, base).await;
            (path, result)
        })
        .buffered(MAX_CONCURRENT_READS)
        .collect()
        .await;

    let failures = results.iter().filter(|(_, r)| r.is_err()).count();

    if args.json {
        let reports: Vec<FeedReport<'_>> = results
            .iter()
            .map(|(path, result)| FeedReport {
                file: path.display().to_string(),
                channel: result.as_ref().ok(),
                error: result.as_ref().err().map(|e| format!("{:#}", e)),
            })
            .collect();
        let json = serde_json::to_string_pretty(&reports).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        for (path, result) in &results {
            match result {
                Ok(channel) => print!("{}", render_report(path, channel, &config.display)?),
                Err(e) => eprintln!("{}: {:#}", path.display(), e),
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} feed(s) failed to parse", failures, results.len());
    }
    Ok(())
}

async fn read_and_parse(
    parser: &FeedParser,
    path: &Path,
    encoding: Option<&str>,
    base: Option<&Url>,
) -> Result<Channel> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read feed file: {}", path.display()))?;

    let file_url = match base {
        Some(_) => None,
        None => std::path::absolute(path)
            .ok()
            .and_then(|p| Url::from_file_path(p).ok()),
    };
    let source_url = base.or(file_url.as_ref());

    let channel = parser
        .parse_bytes(source_url, &bytes, encoding)
        .with_context(|| format!("Failed to parse feed: {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        items = channel.items.len(),
        "Parsed feed file"
    );
    Ok(channel)
}

/// Formats one channel as a plain-text report.
fn render_report(
    path: &Path,
    channel: &Channel,
    display: &DisplayOptions,
) -> Result<String, fmt::Error> {
    let width = display.summary_width;
    let mut out = String::new();

    let header = format!("{}:", path.display());
    writeln!(out, "\n{}\n{}\n", header, "=".repeat(display_width(&header)))?;
    writeln!(out, "Channel title:   {}", fit(channel.title.as_deref(), width))?;
    writeln!(
        out,
        "Channel link:    {}",
        channel.resolved_url().map_or(MISSING, Url::as_str)
    )?;
    writeln!(
        out,
        "Channel author:  {}",
        channel.author().as_deref().unwrap_or(MISSING)
    )?;
    writeln!(out, "Feed format:     {}", channel.format)?;
    writeln!(out, "Channel date:    {}", date_or_missing(channel.pub_date))?;
    writeln!(out, "Items:           {}", channel.items.len())?;

    if !display.show_items {
        return Ok(out);
    }

    for item in &channel.items {
        let categories = if item.categories.is_empty() {
            MISSING.to_string()
        } else {
            item.categories.join(", ")
        };

        writeln!(out)?;
        writeln!(out, "Item title:      {}", fit(item.title.as_deref(), width))?;
        writeln!(out, "Item categories: {}", categories)?;
        writeln!(
            out,
            "Item author(s):  {}",
            item.author().as_deref().unwrap_or(MISSING)
        )?;
        writeln!(
            out,
            "Item link:       {}",
            item.resolved_url().map_or(MISSING, Url::as_str)
        )?;
        writeln!(
            out,
            "Item date:       {}",
            date_or_missing(item.effective_date(channel))
        )?;
        if let Some(summary) = &item.summary {
            let summary = summary.split_whitespace().collect::<Vec<_>>().join(" ");
            writeln!(out, "Item desc:       {}", fit(Some(&summary), width))?;
        }
    }

    Ok(out)
}

fn date_or_missing(date: Option<DateTime<Utc>>) -> String {
    date.map_or_else(|| MISSING.to_string(), |d| d.to_rfc3339())
}

/// Truncates report text to the configured width (0 = no limit).
fn fit(text: Option<&str>, width: usize) -> String {
    match text {
        None => MISSING.to_string(),
        Some(text) if width == 0 => text.to_string(),
        Some(text) => truncate_to_width(text, width).into_owned(),
    }
}
