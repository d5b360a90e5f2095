// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use console::{Emoji, Term};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use podarchive::{
    ArchiveLedger, Config, EpisodeRange, LedgerMatch, NoopReporter, ProgressEvent,
    ProgressReporter, ReqwestClient, RunOptions, SharedProgressReporter, run_archive,
};

// Emoji with fallback for terminals without Unicode support
static MICROPHONE: Emoji<'_, '_> = Emoji("🎙️  ", "");
static SEARCH: Emoji<'_, '_> = Emoji("🔍 ", "[~] ");
static RETRY: Emoji<'_, '_> = Emoji("🔁 ", "[r] ");
static HEADPHONES: Emoji<'_, '_> = Emoji("🎧 ", "[i] ");
static DOWNLOAD: Emoji<'_, '_> = Emoji("📥 ", "[v] ");
static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "[-] ");
static SUCCESS: Emoji<'_, '_> = Emoji("✅ ", "[+] ");
static FAILURE: Emoji<'_, '_> = Emoji("❌ ", "[!] ");
static PARTY: Emoji<'_, '_> = Emoji("🎉 ", "[*] ");
static FOLDER: Emoji<'_, '_> = Emoji("📁 ", "");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "x ");

/// Download podcast episodes from an RSS feed, skipping archived ones
#[derive(Parser, Debug)]
#[command(name = "podarchive")]
#[command(about = "Download podcast episodes from an RSS feed, skipping archived ones")]
#[command(version)]
struct Args {
    /// RSS feed URL (prompted for when omitted)
    feed: Option<String>,

    /// First episode to process, 1-based (prompted for when omitted)
    #[arg(short, long)]
    start: Option<usize>,

    /// Last episode to process, 1-based and inclusive (prompted for when omitted)
    #[arg(short, long)]
    end: Option<usize>,

    /// Folder receiving the downloaded episodes
    #[arg(long)]
    folder: Option<PathBuf>,

    /// Ledger file recording archived episodes
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Configuration file (defaults to ./podarchive.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Require ledger entries to match a whole line
    #[arg(long)]
    exact_match: bool,

    /// Never prompt; use defaults for anything not given
    #[arg(long)]
    no_prompt: bool,

    /// Quiet mode - suppress progress output
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Progress reporter using indicatif for terminal output
struct IndicatifReporter {
    multi: MultiProgress,
    main_bar: ProgressBar,
    current: Mutex<Option<ProgressBar>>,
}

impl IndicatifReporter {
    fn new() -> Self {
        let multi = MultiProgress::new();

        let main_style = ProgressStyle::default_bar()
            .template("{spinner:.green} {wide_msg}")
            .unwrap();

        let main_bar = multi.add(ProgressBar::new_spinner());
        main_bar.set_style(main_style);
        main_bar.enable_steady_tick(std::time::Duration::from_millis(100));

        Self {
            multi,
            main_bar,
            current: Mutex::new(None),
        }
    }

    fn start_bar(&self, content_length: Option<u64>, message: String) {
        let bar = match content_length {
            Some(total) => {
                let style = ProgressStyle::default_bar()
                    .template(&format!(
                        "  {DOWNLOAD}[{{bar:30.cyan/blue}}] {{bytes}}/{{total_bytes}} {{wide_msg}}"
                    ))
                    .unwrap()
                    .progress_chars("█▓░");
                let bar = self.multi.add(ProgressBar::new(total));
                bar.set_style(style);
                bar
            }
            None => {
                let style = ProgressStyle::default_spinner()
                    .template(&format!("  {DOWNLOAD}{{spinner:.cyan}} {{bytes}} {{wide_msg}}"))
                    .unwrap();
                let bar = self.multi.add(ProgressBar::new_spinner());
                bar.set_style(style);
                bar
            }
        };
        bar.set_message(message);

        if let Some(previous) = self.current.lock().unwrap().replace(bar) {
            previous.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        if let Some(bar) = self.current.lock().unwrap().as_ref() {
            f(bar);
        }
    }

    fn take_bar(&self) -> Option<ProgressBar> {
        self.current.lock().unwrap().take()
    }

    fn println(&self, line: String) {
        let _ = self.multi.println(line);
    }
}

impl ProgressReporter for IndicatifReporter {
    fn report(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::FetchingFeed {
                url,
                attempt,
                max_attempts,
            } => {
                let attempt_note = if attempt > 1 {
                    format!(" (attempt {attempt}/{max_attempts})")
                } else {
                    String::new()
                };
                self.main_bar.set_message(format!(
                    "{SEARCH}Fetching feed: {}{}",
                    url.cyan(),
                    attempt_note.dimmed()
                ));
            }

            ProgressEvent::FetchFailed {
                attempt,
                max_attempts,
                error,
            } => {
                self.println(format!(
                    "{RETRY}Fetch attempt {attempt}/{max_attempts} failed: {}",
                    error.yellow()
                ));
            }

            ProgressEvent::FeedParsed {
                total_episodes,
                selected_episodes,
            } => {
                self.main_bar.set_message(format!(
                    "{HEADPHONES}{} episodes in feed, {} selected",
                    total_episodes.to_string().cyan(),
                    selected_episodes.to_string().yellow()
                ));
            }

            ProgressEvent::EpisodeSkipped {
                episode_number,
                episode_title,
            } => {
                self.println(format!(
                    "{SKIP}[{}] {} {}",
                    episode_number.to_string().cyan(),
                    truncate_title(&episode_title, 50),
                    "already downloaded".dimmed()
                ));
            }

            ProgressEvent::DownloadStarting {
                episode_number,
                file_name,
                content_length,
                ..
            } => {
                self.start_bar(
                    content_length,
                    format!(
                        "[{}] {}",
                        episode_number.to_string().cyan(),
                        truncate_title(&file_name, 40)
                    ),
                );
            }

            ProgressEvent::DownloadProgress {
                bytes_downloaded, ..
            } => {
                self.with_bar(|bar| bar.set_position(bytes_downloaded));
            }

            ProgressEvent::DownloadCompleted {
                episode_number,
                episode_title,
                ..
            } => {
                if let Some(bar) = self.take_bar() {
                    bar.finish_and_clear();
                }
                self.println(format!(
                    "{SUCCESS}[{}] {}",
                    episode_number.to_string().cyan(),
                    truncate_title(&episode_title, 50).green()
                ));
            }

            ProgressEvent::DownloadFailed {
                episode_number,
                episode_title,
                error,
            } => {
                if let Some(bar) = self.take_bar() {
                    bar.finish_and_clear();
                }
                self.println(format!(
                    "{FAILURE}[{}] {} - {}",
                    episode_number.to_string().cyan(),
                    truncate_title(&episode_title, 30).red(),
                    error.red()
                ));
            }

            ProgressEvent::RunCompleted {
                downloaded_count,
                skipped_count,
                failed_count,
            } => {
                self.main_bar.finish_and_clear();
                println!(
                    "\n{PARTY}{} {} downloaded, {} skipped, {} failed",
                    "All downloads complete:".bold().green(),
                    downloaded_count.to_string().green().bold(),
                    skipped_count.to_string().yellow(),
                    if failed_count > 0 {
                        failed_count.to_string().red().bold()
                    } else {
                        failed_count.to_string().green()
                    }
                );
            }
        }
    }
}

fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() <= max_len {
        title.to_string()
    } else {
        let head: String = title.chars().take(max_len.saturating_sub(3)).collect();
        format!("{head}...")
    }
}

/// Initialize logging based on CLI arguments; `RUST_LOG` wins when set
fn init_logging(args: &Args) {
    let level = match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Ask a question on the terminal; `None` for a blank answer
fn prompt(term: &Term, question: &str) -> Result<Option<String>> {
    term.write_str(question)?;
    let answer = term.read_line()?;
    let answer = answer.trim();
    Ok((!answer.is_empty()).then(|| answer.to_string()))
}

fn prompt_number(term: &Term, question: &str) -> Result<Option<usize>> {
    match prompt(term, question)? {
        Some(answer) => {
            let n = answer
                .parse()
                .with_context(|| format!("'{answer}' is not an episode number"))?;
            Ok(Some(n))
        }
        None => Ok(None),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args);

    let mut config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(folder) = &args.folder {
        config.download_folder = folder.clone();
    }
    if let Some(ledger) = &args.ledger {
        config.ledger_path = ledger.clone();
    }
    if args.exact_match {
        config.ledger_match = LedgerMatch::Line;
    }

    if !args.quiet {
        println!(
            "\n{}{} {}\n",
            MICROPHONE,
            "podarchive".bold().magenta(),
            "- Podcast Archiver".dimmed()
        );
    }

    let term = Term::stdout();
    let interactive = !args.no_prompt && term.is_term();

    let feed_url = match args.feed.clone() {
        Some(feed) => Some(feed),
        None if interactive => prompt(&term, "Enter the RSS feed URL: ")?,
        None => None,
    }
    .or_else(|| config.default_feed.clone());

    let Some(feed_url) = feed_url else {
        bail!("No feed specified");
    };

    let start = match args.start {
        Some(start) => start,
        None if interactive => {
            prompt_number(&term, "Enter the start episode (default is 1): ")?.unwrap_or(1)
        }
        None => 1,
    };
    let end = match args.end {
        Some(end) => Some(end),
        None if interactive => {
            prompt_number(&term, "Enter the end episode (default is maximum): ")?
        }
        None => None,
    };

    let client = match config.request_timeout() {
        Some(timeout) => ReqwestClient::with_timeout(timeout)?,
        None => ReqwestClient::new(),
    };

    let options = RunOptions {
        feed_url,
        range: EpisodeRange::new(start, end),
        download_folder: config.download_folder.clone(),
        ledger: ArchiveLedger::new(config.ledger_path.clone(), config.ledger_match),
        retry: config.retry_policy(),
    };

    let reporter: SharedProgressReporter = if args.quiet {
        NoopReporter::shared()
    } else {
        Arc::new(IndicatifReporter::new())
    };

    let summary = run_archive(&client, &options, reporter)
        .await
        .context("Failed to archive podcast")?;

    if !args.quiet && !summary.failed_episodes.is_empty() {
        println!("\n{}", "Failed episodes:".red().bold());
        for (title, error) in &summary.failed_episodes {
            println!("  {}{} - {}", CROSS, title.yellow(), error.dimmed());
        }
    }

    if !args.quiet {
        println!(
            "\n{FOLDER}Output: {}\n",
            options.download_folder.display().to_string().cyan()
        );
    }

    Ok(())
}
