// ABOUTME: CLI for inspecting how wayfarer-content decomposes article HTML.
// ABOUTME: Reads HTML from a file, URL, or stdin and prints nodes, media lists, or round-trip output.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::debug;
use serde::Serialize;
use wayfarer_content::{
    excerpt, extract_images, extract_links, style_images_for_width, to_body, to_media_rail,
    Decomposer, PlaceholderTable,
};

/// Decompose article HTML and print the result as JSON.
#[derive(Parser, Debug)]
#[command(name = "wayfarer")]
#[command(about = "Inspect rich-content decomposition of article HTML", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output compact JSON instead of pretty.
    #[arg(long, global = true, default_value_t = false)]
    compact: bool,

    /// Log dropped spans and fallbacks to stderr.
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    /// Extra iframe host to treat as a video player (repeatable).
    #[arg(long = "video-platform", global = true)]
    video_platforms: Vec<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decompose into typed content nodes.
    Nodes {
        /// HTML file path, http(s) URL, or "-" for stdin.
        input: String,
        #[arg(long, value_enum, default_value_t = View::All)]
        view: View,
    },
    /// List deduplicated image URLs.
    Images { input: String },
    /// List deduplicated videos with posters.
    Videos { input: String },
    /// List deduplicated http(s) links.
    Links { input: String },
    /// Print the share-card image choice.
    ShareImage { input: String },
    /// Print a plain-text summary.
    Excerpt {
        input: String,
        #[arg(long, default_value_t = 120)]
        max_chars: usize,
    },
    /// Cap image widths and strip video/iframe markup; prints HTML.
    Style {
        input: String,
        #[arg(long, default_value_t = 375)]
        max_width: u32,
    },
    /// Convert videos to editor placeholders and back.
    RoundTrip { input: String },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum View {
    All,
    Rail,
    Body,
}

#[derive(Serialize)]
struct RoundTripOutput {
    placeholder_html: String,
    restored_html: String,
    placeholders: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let mut builder = Decomposer::builder();
    for host in &args.video_platforms {
        builder = builder.video_platform(host.clone());
    }
    let decomposer = builder.build()?;

    let output = match &args.command {
        Command::Nodes { input, view } => {
            let nodes = decomposer.parse_html_to_nodes(&load_html(input)?);
            debug!("decomposed {} nodes", nodes.len());
            let nodes = match view {
                View::All => nodes,
                View::Rail => to_media_rail(&nodes),
                View::Body => to_body(&nodes),
            };
            serde_json::to_value(nodes)?
        }
        Command::Images { input } => serde_json::to_value(extract_images(&load_html(input)?))?,
        Command::Videos { input } => serde_json::to_value(decomposer.extract_videos(&load_html(input)?))?,
        Command::Links { input } => serde_json::to_value(extract_links(&load_html(input)?))?,
        Command::ShareImage { input } => {
            serde_json::json!({ "image": decomposer.pick_share_image(&load_html(input)?) })
        }
        Command::Excerpt { input, max_chars } => {
            println!("{}", excerpt(&load_html(input)?, *max_chars));
            return Ok(());
        }
        Command::Style { input, max_width } => {
            println!("{}", style_images_for_width(&load_html(input)?, *max_width));
            return Ok(());
        }
        Command::RoundTrip { input } => {
            let html = load_html(input)?;
            let mut table = PlaceholderTable::new();
            let placeholder_html = decomposer.to_placeholder_html(&html, &mut table);
            let restored_html = decomposer.from_placeholder_html(&placeholder_html, &table);
            serde_json::to_value(RoundTripOutput {
                placeholder_html,
                restored_html,
                placeholders: table.len(),
            })?
        }
    };

    if args.compact {
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn load_html(target: &str) -> Result<String> {
    if target == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        let resp = reqwest::blocking::get(target)?.error_for_status()?;
        return Ok(resp.text()?);
    }

    let path = PathBuf::from(target);
    if !path.exists() {
        return Err(anyhow!("file not found: {}", target));
    }
    fs::read_to_string(&path).with_context(|| format!("reading {}", target))
}
