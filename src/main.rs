use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::style::Stylize;
use judgemark::export::ReviewExporter;
use judgemark::markdown::Document;
use judgemark::parsing::html_to_document::HtmlToDocumentConverter;
use judgemark::placement::{PopoverKind, Rect, Side, place};
use judgemark::review::ReviewPayload;
use judgemark::reviewers::Roster;
use judgemark::{ReviewOverlay, ThreadStore, build_line_index, mentions, settings};
use log::{LevelFilter, error, info};
use simplelog::{Config, WriteLogger};

#[derive(Parser)]
#[command(name = "judgemark", version, about = "Anchor judge review feedback onto documents")]
struct Cli {
    /// Settings file (defaults to $JUDGEMARK_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides the configured log level (off, error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<LevelFilter>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the review line table of an HTML document
    Lines { document: PathBuf },
    /// Resolve a review payload against a document
    Review { document: PathBuf, payload: PathBuf },
    /// Tokenize mentions in a piece of text
    Mentions {
        text: String,
        /// JSON array of {"id", "displayName"} reviewers to resolve against
        #[arg(long)]
        roster: Option<PathBuf>,
    },
    /// Compute where a popover goes for a highlight box
    Place {
        /// Highlight top edge, in px from the viewport top
        top: f64,
        #[arg(long, default_value_t = 0.0)]
        left: f64,
        #[arg(long, default_value_t = 100.0)]
        width: f64,
        #[arg(long, default_value_t = 20.0)]
        height: f64,
        /// Use the thread bubble threshold instead of the tooltip one
        #[arg(long)]
        bubble: bool,
    },
    /// Write a Markdown summary of a review pass
    Export {
        document: PathBuf,
        payload: PathBuf,
        #[arg(long, default_value = "Review")]
        title: String,
        /// Output file (prints to stdout when omitted)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    better_panic::install();

    let cli = Cli::parse();
    settings::load_settings(cli.config.as_deref());

    let level = cli.log_level.unwrap_or_else(settings::get_log_level);
    let log_file = settings::get_log_file();
    WriteLogger::init(
        level,
        Config::default(),
        File::create(&log_file).with_context(|| format!("Failed to create log file {log_file}"))?,
    )?;

    info!("Starting judgemark");
    let result = run(cli.command);
    if let Err(err) = &result {
        error!("Command failed: {err:?}");
    }
    info!("Shutting down judgemark");
    result
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Lines { document } => print_lines(&load_document(&document)?),
        Command::Review { document, payload } => {
            let document = load_document(&document)?;
            let payload = ReviewPayload::from_path(&payload)
                .with_context(|| format!("Failed to load review payload {payload:?}"))?;
            print_review(&document, &payload);
            Ok(())
        }
        Command::Mentions { text, roster } => {
            let roster = roster.as_deref().map(Roster::from_path).transpose()?;
            print_mentions(&text, roster.as_ref());
            Ok(())
        }
        Command::Place {
            top,
            left,
            width,
            height,
            bubble,
        } => {
            let kind = if bubble {
                PopoverKind::ThreadBubble
            } else {
                PopoverKind::Tooltip
            };
            let placement = place(
                Rect::new(left, top, width, height),
                settings::popover_threshold(kind),
                settings::get_popover_offset(),
            );
            let side = match placement.side {
                Side::Below => "below",
                Side::Above => "above",
            };
            println!(
                "{side} left={} top={} transform={}",
                placement.left,
                placement.top,
                placement.transform()
            );
            Ok(())
        }
        Command::Export {
            document,
            payload,
            title,
            output,
        } => {
            let document = load_document(&document)?;
            let payload = ReviewPayload::from_path(&payload)
                .with_context(|| format!("Failed to load review payload {payload:?}"))?;
            let mut store = ThreadStore::new();
            store.apply_review_pass(&payload.annotations);
            let markdown = ReviewExporter::new(&store, &document, &title).generate_markdown();
            match output {
                Some(path) => {
                    fs::write(&path, markdown)
                        .with_context(|| format!("Failed to write {path:?}"))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{markdown}"),
            }
            Ok(())
        }
    }
}

fn load_document(path: &Path) -> Result<Document> {
    let html = fs::read_to_string(path).with_context(|| format!("Failed to read document {path:?}"))?;
    Ok(HtmlToDocumentConverter::new().convert(&html))
}

fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() > max {
        let cut: String = flat.chars().take(max).collect();
        format!("{cut}…")
    } else {
        flat
    }
}

fn print_lines(document: &Document) -> Result<()> {
    let index = build_line_index(document);
    let blocks = document.leaf_blocks();
    for span in &index {
        let text = blocks
            .get(span.line - 1)
            .map(|b| b.plain_text())
            .unwrap_or_default();
        println!("{:>4}  {:>5}..{:<5} {}", span.line, span.start, span.end, preview(&text, 60));
    }
    Ok(())
}

fn print_review(document: &Document, payload: &ReviewPayload) {
    let overlay = ReviewOverlay::build(document, &payload.annotations);

    for annotation in &payload.annotations {
        let Some(highlight) = overlay.highlight(&annotation.id) else {
            continue;
        };
        let badge = format!(" {} ", highlight.presentation.label)
            .with(highlight.presentation.foreground)
            .on(highlight.presentation.background);
        println!(
            "{badge} {} [{}..{}] lines {}-{}: {}",
            annotation.judge_name,
            highlight.range.start,
            highlight.range.end,
            annotation.start_line,
            annotation.end_line,
            annotation.message
        );
    }

    if !overlay.unanchored().is_empty() {
        println!();
        println!("{}", "Not anchored in this document:".bold());
        for annotation in overlay.unanchored() {
            println!(
                "  {} ({}, lines {}-{}): {}",
                annotation.judge_name,
                annotation.severity.as_str(),
                annotation.start_line,
                annotation.end_line,
                annotation.message
            );
        }
    }
}

fn print_mentions(text: &str, roster: Option<&Roster>) {
    for token in mentions::scan(text) {
        let who = roster
            .and_then(|r| r.lookup(&token.raw))
            .map(|r| format!(" -> {} ({})", r.display_name, r.id))
            .unwrap_or_default();
        println!("@{:<24} key={}{who}", token.raw, token.key);
    }
    println!("stripped: {}", mentions::strip(text));
}
