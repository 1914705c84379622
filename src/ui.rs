// UI layer: drives one upload pass from the terminal. Spinners cover the
// network lookups, a progress bar covers the uploads and a colored summary
// closes the run.

use std::io::IsTerminal;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::style::Stylize;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::blocking::Client;

use crate::api::{DiscordClient, EmojiApi};
use crate::catalog::{self, Catalog};
use crate::config::Settings;
use crate::images::scan_images;
use crate::sync::{self, PlanAction, SyncEvent, SyncOptions, SyncReport};

/// Flags that only affect how the pass is presented.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub sync: SyncOptions,
    /// Upload without asking for confirmation.
    pub assume_yes: bool,
    pub quiet: bool,
}

/// Scan, look up, plan, confirm and upload. Returns the report even when
/// the batch was aborted; the caller decides the exit status.
pub fn run_upload(settings: &Settings, options: &RunOptions) -> Result<SyncReport> {
    let images = scan_images(&settings.images_dir)
        .with_context(|| format!("Scanning {}", settings.images_dir.display()))?;

    let http = Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let spinner = new_spinner(options.quiet, "Loading item catalog...")?;
    let version = match &settings.patch {
        Some(v) => v.clone(),
        None => catalog::latest_version(&http, &settings.ddragon_url)
            .context("Resolving latest patch")?,
    };
    let catalog = Catalog::fetch(&http, &settings.ddragon_url, &version, &settings.locale)
        .context("Fetching item catalog")?;
    spinner.finish_and_clear();
    log::info!(
        "Loaded {} items from patch {} ({})",
        catalog.len(),
        catalog.version(),
        settings.locale
    );

    let discord = DiscordClient::new(&settings.token, &settings.application_id)?
        .with_base_url(settings.discord_url.clone())
        .with_max_retries(options.sync.max_rate_limit_retries);

    let spinner = new_spinner(options.quiet, "Fetching existing emojis...")?;
    let existing = discord
        .list_emojis()
        .context("Fetching existing application emojis")?;
    spinner.finish_and_clear();
    log::info!("Application already has {} emoji(s)", existing.len());

    let plan = sync::plan(images, &catalog, &existing);
    let uploads = plan.uploads();
    println!(
        "{} image(s): {} to upload, {} already present, {} not in catalog",
        plan.entries.len(),
        uploads,
        plan.entries
            .iter()
            .filter(|e| matches!(e.action, PlanAction::AlreadyPresent { .. }))
            .count(),
        plan.entries
            .iter()
            .filter(|e| e.action == PlanAction::Unknown)
            .count(),
    );

    if uploads > 0 && !options.sync.dry_run && !confirm(options, uploads)? {
        println!("Nothing uploaded.");
        return Ok(SyncReport::default());
    }

    let pb = progress_bar(options.quiet, plan.entries.len() as u64)?;
    let report = sync::run(
        &discord,
        &plan,
        &options.sync,
        &mut |wait: Duration| std::thread::sleep(wait),
        &mut |event: SyncEvent<'_>| {
            match event {
                SyncEvent::RateLimited { name, wait } => {
                    pb.set_message(format!(
                        "rate limited on {name}, waiting {:.1}s",
                        wait.as_secs_f64()
                    ));
                    return;
                }
                SyncEvent::Added { name } | SyncEvent::Planned { name } => {
                    pb.set_message(name.to_string())
                }
                _ => {}
            }
            pb.inc(1);
        },
    );
    pb.finish_and_clear();

    print_summary(&report);
    Ok(report)
}

fn confirm(options: &RunOptions, uploads: usize) -> Result<bool> {
    if options.assume_yes || !std::io::stdin().is_terminal() {
        return Ok(true);
    }
    let answer = Confirm::new()
        .with_prompt(format!("Upload {} emoji(s)?", uploads))
        .default(true)
        .interact()?;
    Ok(answer)
}

fn new_spinner(quiet: bool, message: &'static str) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn progress_bar(quiet: bool, len: u64) -> Result<ProgressBar> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(len);
    pb.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {wide_msg}",
    )?);
    Ok(pb)
}

/// Final counts, one colored line.
pub fn print_summary(report: &SyncReport) {
    let mut parts = vec![
        format!("{} added", report.added).green().to_string(),
        format!("{} skipped", report.skipped).yellow().to_string(),
    ];
    if report.planned > 0 {
        parts.push(format!("{} would be added", report.planned).cyan().to_string());
    }
    if report.rejected > 0 {
        parts.push(format!("{} rejected", report.rejected).red().to_string());
    }
    if report.unknown > 0 {
        parts.push(format!("{} unknown", report.unknown).dark_grey().to_string());
    }
    println!("{}", parts.join(", "));
    if let Some(reason) = &report.aborted {
        println!("{} {}", "Stopped early:".red().bold(), reason);
    }
}
