// Entrypoint for the CLI application.
// - Keeps `main` small: parse arguments, set up logging, resolve settings
//   and hand them to the UI flow.

use std::path::PathBuf;

use clap::Parser;
use item_emojis::config::{self, RawSettings, Settings};
use item_emojis::sync::SyncOptions;
use item_emojis::ui::{run_upload, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "item-emojis")]
#[command(about = "Upload item icons as Discord application emojis", long_about = None)]
struct Cli {
    /// Directory of item images named by item id (e.g. 1001.png)
    #[arg(short, long, default_value = "images")]
    images: PathBuf,

    /// Data Dragon patch to take item names from (default: latest)
    #[arg(short, long, env = "DDRAGON_PATCH")]
    patch: Option<String>,

    /// Catalog locale
    #[arg(long, default_value = "en_US")]
    locale: String,

    /// Bot token
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Discord application id
    #[arg(long, env = "DISCORD_APPLICATION_ID")]
    application_id: Option<String>,

    /// Store the given token in the home directory for later runs
    #[arg(long)]
    save_token: bool,

    /// Show what would be uploaded without uploading
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Do not ask for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Consecutive rate limits tolerated for one emoji before giving up
    #[arg(long, default_value_t = 10)]
    max_retries: u32,

    #[arg(long, env = "DISCORD_API_URL", hide = true)]
    discord_url: Option<String>,

    #[arg(long, env = "DDRAGON_URL", hide = true)]
    ddragon_url: Option<String>,

    /// More log output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only warnings and errors, no progress bars
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    if cli.save_token {
        match &cli.token {
            Some(token) => {
                let path = config::persist_token(token)?;
                log::info!("Saved token to {}", path.display());
            }
            None => anyhow::bail!("--save-token needs --token or DISCORD_BOT_TOKEN"),
        }
    }

    let settings = Settings::resolve(RawSettings {
        token: cli.token,
        application_id: cli.application_id,
        discord_url: cli.discord_url,
        ddragon_url: cli.ddragon_url,
        patch: cli.patch,
        locale: cli.locale,
        images_dir: cli.images,
    })?;

    let options = RunOptions {
        sync: SyncOptions {
            dry_run: cli.dry_run,
            max_rate_limit_retries: cli.max_retries,
        },
        assume_yes: cli.yes,
        quiet: cli.quiet,
    };

    let report = run_upload(&settings, &options)?;
    if let Some(reason) = report.aborted {
        anyhow::bail!("Upload stopped early: {}", reason);
    }
    Ok(())
}

/// `RUST_LOG` wins; otherwise info for this crate, tuned by -v / -q.
fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(format!("item_emojis={level}")),
    )
    .format_timestamp(None)
    .init();
}
