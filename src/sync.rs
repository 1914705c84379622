// Reconcile local item images against the application's emojis.
// A pass is planned up front (which files need uploading, which are already
// there, which the catalog does not know) and then executed one upload at a
// time. Rate limits pause and retry the same item, a 400 skips only that
// item, and any other failure stops the remaining batch.

use std::collections::HashSet;
use std::time::Duration;

use crate::api::{EmojiApi, RemoteEmoji, UploadOutcome};
use crate::catalog::Catalog;
use crate::error::UploadError;
use crate::images::LocalImage;
use crate::naming::emoji_name;

/// What the pass intends to do with one local file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    Upload { name: String },
    AlreadyPresent { name: String },
    /// The file's id is not in the catalog.
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub image: LocalImage,
    pub action: PlanAction,
}

#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn uploads(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.action, PlanAction::Upload { .. }))
            .count()
    }
}

/// Decide, per image, whether it needs uploading. Names claimed by an
/// earlier upload in the same plan count as present.
pub fn plan(images: Vec<LocalImage>, catalog: &Catalog, existing: &[RemoteEmoji]) -> Plan {
    let mut taken: HashSet<String> = existing.iter().map(|e| e.name.clone()).collect();
    let entries = images
        .into_iter()
        .map(|image| {
            let action = match catalog.name_of(&image.item_id) {
                None => PlanAction::Unknown,
                Some(item_name) => {
                    let name = emoji_name(item_name);
                    if taken.insert(name.clone()) {
                        PlanAction::Upload { name }
                    } else {
                        PlanAction::AlreadyPresent { name }
                    }
                }
            };
            PlanEntry { image, action }
        })
        .collect();
    Plan { entries }
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub dry_run: bool,
    /// Consecutive 429s tolerated for one item before giving up.
    pub max_rate_limit_retries: u32,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_rate_limit_retries: 10,
        }
    }
}

/// Per-item progress, reported as the pass runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent<'a> {
    Added { name: &'a str },
    Skipped { name: &'a str },
    Rejected { name: &'a str, reason: &'a str },
    Unknown { item_id: &'a str },
    Planned { name: &'a str },
    RateLimited { name: &'a str, wait: Duration },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: usize,
    /// Already present remotely, or refused as a duplicate name.
    pub skipped: usize,
    pub rejected: usize,
    pub unknown: usize,
    /// Dry-run uploads that would have been attempted.
    pub planned: usize,
    pub added_names: Vec<String>,
    /// Set when the batch stopped early; holds the error message.
    pub aborted: Option<String>,
}

impl SyncReport {
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }
}

/// Execute `plan` against `api`. `sleep` is called with the server's
/// back-off on every 429; `observe` sees each per-item decision.
pub fn run<A: EmojiApi + ?Sized>(
    api: &A,
    plan: &Plan,
    options: &SyncOptions,
    sleep: &mut dyn FnMut(Duration),
    observe: &mut dyn FnMut(SyncEvent<'_>),
) -> SyncReport {
    let mut report = SyncReport::default();
    for entry in &plan.entries {
        let name = match &entry.action {
            PlanAction::Unknown => {
                log::warn!(
                    "No catalog entry for {} ({}), skipping",
                    entry.image.item_id,
                    entry.image.path.display()
                );
                report.unknown += 1;
                observe(SyncEvent::Unknown {
                    item_id: &entry.image.item_id,
                });
                continue;
            }
            PlanAction::AlreadyPresent { name } => {
                log::info!("{} already exists, skipping", name);
                report.skipped += 1;
                observe(SyncEvent::Skipped { name });
                continue;
            }
            PlanAction::Upload { name } => name,
        };

        if options.dry_run {
            log::info!("Would upload {} as {}", entry.image.path.display(), name);
            report.planned += 1;
            observe(SyncEvent::Planned { name });
            continue;
        }

        match upload_one(api, &entry.image, name, options, sleep, observe) {
            Ok(Settled::Created(emoji)) => {
                log::info!("Added {} (id {})", emoji.name, emoji.id);
                report.added += 1;
                report.added_names.push(name.clone());
                observe(SyncEvent::Added { name });
            }
            Ok(Settled::NameTaken(reason)) => {
                log::info!("{} was already taken: {}", name, reason);
                report.skipped += 1;
                observe(SyncEvent::Skipped { name });
            }
            Ok(Settled::Rejected(reason)) => {
                log::warn!(
                    "Failed to upload emoji {}: Bad request (400) - {}",
                    entry.image.item_id,
                    reason
                );
                report.rejected += 1;
                observe(SyncEvent::Rejected {
                    name,
                    reason: &reason,
                });
            }
            Err(e) => {
                log::error!("Failed to upload emoji {}: {}", entry.image.item_id, e);
                report.aborted = Some(format!("{}: {}", entry.image.item_id, e));
                break;
            }
        }
    }
    report
}

/// Final outcome of one item once rate limits have been waited out.
enum Settled {
    Created(RemoteEmoji),
    NameTaken(String),
    Rejected(String),
}

/// Upload a single image, sleeping through 429s.
fn upload_one<A: EmojiApi + ?Sized>(
    api: &A,
    image: &LocalImage,
    name: &str,
    options: &SyncOptions,
    sleep: &mut dyn FnMut(Duration),
    observe: &mut dyn FnMut(SyncEvent<'_>),
) -> Result<Settled, UploadError> {
    let data_uri = image.data_uri()?;
    let mut attempts = 0;
    loop {
        match api.create_emoji(name, &data_uri)? {
            UploadOutcome::RateLimited(wait) => {
                attempts += 1;
                if attempts > options.max_rate_limit_retries {
                    return Err(UploadError::RateLimitExhausted { attempts });
                }
                log::warn!("Rate limited. Retrying {} after {:?}", name, wait);
                observe(SyncEvent::RateLimited { name, wait });
                sleep(wait);
            }
            UploadOutcome::Created(emoji) => return Ok(Settled::Created(emoji)),
            UploadOutcome::NameTaken(reason) => return Ok(Settled::NameTaken(reason)),
            UploadOutcome::Rejected(reason) => return Ok(Settled::Rejected(reason)),
        }
    }
}
