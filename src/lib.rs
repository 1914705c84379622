// Library root
// -----------
// Uploads a folder of item icons as Discord application emojis, named after
// the items in the game's Data Dragon catalog. The binary (`main.rs`) parses
// arguments and hands off to `ui`.
//
// Module responsibilities:
// - `images`: local image files and their data URIs.
// - `catalog`: Data Dragon patch lookup and item names.
// - `naming`: item name to emoji name.
// - `api`: Discord emoji endpoints and response classification.
// - `sync`: plan and run the upload pass.
// - `config`: credentials and endpoints.
// - `ui`: progress bar, confirmation prompt and summary.
pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod images;
pub mod naming;
pub mod sync;
pub mod ui;

pub use api::{DiscordClient, EmojiApi, RemoteEmoji, UploadOutcome};
pub use catalog::Catalog;
pub use error::UploadError;
pub use images::{scan_images, LocalImage};
pub use naming::emoji_name;
pub use sync::{plan, run, Plan, PlanAction, SyncEvent, SyncOptions, SyncReport};
