// Credentials and endpoint settings. Values given on the command line (or
// through their environment variables, which clap folds in) win; the bot
// token can also live in a file in the home directory.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

use crate::{api, catalog};

pub const TOKEN_FILE_NAME: &str = ".item_emojis_token";

/// Everything a sync pass needs to reach both services.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub application_id: String,
    pub discord_url: String,
    pub ddragon_url: String,
    /// `None` resolves to the newest patch at run time.
    pub patch: Option<String>,
    pub locale: String,
    pub images_dir: PathBuf,
}

/// Raw inputs before defaults and the token file are applied.
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    pub token: Option<String>,
    pub application_id: Option<String>,
    pub discord_url: Option<String>,
    pub ddragon_url: Option<String>,
    pub patch: Option<String>,
    pub locale: String,
    pub images_dir: PathBuf,
}

impl Settings {
    pub fn resolve(raw: RawSettings) -> Result<Self> {
        Self::resolve_with_home(raw, dirs::home_dir().as_deref())
    }

    fn resolve_with_home(raw: RawSettings, home: Option<&Path>) -> Result<Self> {
        let token = match non_empty(raw.token) {
            Some(t) => t,
            None => match home.map(token_path) {
                Some(path) if path.exists() => load_token(&path)?,
                _ => bail!(
                    "Missing bot token. Set DISCORD_BOT_TOKEN, pass --token, or write it to ~/{}",
                    TOKEN_FILE_NAME
                ),
            },
        };
        let application_id = non_empty(raw.application_id).context(
            "Missing application id. Set DISCORD_APPLICATION_ID or pass --application-id",
        )?;
        if !application_id.chars().all(|c| c.is_ascii_digit()) {
            bail!("Application id must be numeric, got {:?}", application_id);
        }
        Ok(Self {
            token,
            application_id,
            discord_url: non_empty(raw.discord_url)
                .unwrap_or_else(|| api::DEFAULT_BASE_URL.to_string()),
            ddragon_url: non_empty(raw.ddragon_url)
                .unwrap_or_else(|| catalog::DEFAULT_BASE_URL.to_string()),
            patch: non_empty(raw.patch),
            locale: raw.locale,
            images_dir: raw.images_dir,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn token_path(home: &Path) -> PathBuf {
    home.join(TOKEN_FILE_NAME)
}

/// Read a token file, ignoring surrounding whitespace.
fn load_token(path: &Path) -> Result<String> {
    let data = std::fs::read_to_string(path)
        .with_context(|| format!("Reading token file {}", path.display()))?;
    let token = data.trim();
    if token.is_empty() {
        bail!("Token file {} is empty", path.display());
    }
    Ok(token.to_string())
}

/// Persist a token into the user's home directory for later runs.
pub fn persist_token(token: &str) -> Result<PathBuf> {
    let dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    let path = token_path(&dir);
    std::fs::write(&path, token)
        .with_context(|| format!("Writing token file {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn raw() -> RawSettings {
        RawSettings {
            token: Some("abc".into()),
            application_id: Some("1234".into()),
            locale: "en_US".into(),
            images_dir: PathBuf::from("images"),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_fill_urls() {
        let s = Settings::resolve_with_home(raw(), None).unwrap();
        assert_eq!(s.discord_url, api::DEFAULT_BASE_URL);
        assert_eq!(s.ddragon_url, catalog::DEFAULT_BASE_URL);
        assert_eq!(s.patch, None);
    }

    #[test]
    fn token_falls_back_to_home_file() {
        let home = TempDir::new().unwrap();
        std::fs::write(home.path().join(TOKEN_FILE_NAME), "from-file\n").unwrap();
        let mut r = raw();
        r.token = Some("  ".into());
        let s = Settings::resolve_with_home(r, Some(home.path())).unwrap();
        assert_eq!(s.token, "from-file");
    }

    #[test]
    fn missing_token_is_an_error() {
        let home = TempDir::new().unwrap();
        let mut r = raw();
        r.token = None;
        let err = Settings::resolve_with_home(r, Some(home.path())).unwrap_err();
        assert!(err.to_string().contains("Missing bot token"));
    }

    #[test]
    fn application_id_must_be_numeric() {
        let mut r = raw();
        r.application_id = Some("my-app".into());
        assert!(Settings::resolve_with_home(r, None).is_err());
        let mut r = raw();
        r.application_id = None;
        assert!(Settings::resolve_with_home(r, None).is_err());
    }
}
