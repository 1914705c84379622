// Data Dragon client: resolves the game patch and loads the item catalog
// that maps the numeric id in each image file name to the item's name.

use std::collections::HashMap;

use reqwest::blocking::Client;
use serde::Deserialize;

use crate::error::UploadError;

pub const DEFAULT_BASE_URL: &str = "https://ddragon.leagueoflegends.com";

#[derive(Deserialize, Debug)]
struct ItemFile {
    data: HashMap<String, ItemEntry>,
}

#[derive(Deserialize, Debug)]
struct ItemEntry {
    name: String,
}

/// Item id to display name, for one patch and locale.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    version: String,
    names: HashMap<String, String>,
}

impl Catalog {
    /// Download `item.json` for `version` and `locale` (e.g. `en_US`).
    pub fn fetch(
        http: &Client,
        base_url: &str,
        version: &str,
        locale: &str,
    ) -> Result<Self, UploadError> {
        let url = format!("{}/cdn/{}/data/{}/item.json", base_url, version, locale);
        log::debug!("GET {}", url);
        let res = http.get(&url).send()?;
        let status = res.status();
        if !status.is_success() {
            return Err(UploadError::Catalog(format!(
                "item catalog for patch {} ({}) returned {}",
                version, locale, status
            )));
        }
        let text = res.text()?;
        Self::from_json(version, &text)
    }

    pub fn from_json(version: &str, text: &str) -> Result<Self, UploadError> {
        let file: ItemFile = serde_json::from_str(text)?;
        let names = file
            .data
            .into_iter()
            .map(|(id, entry)| (id, entry.name))
            .collect();
        Ok(Self {
            version: version.to_string(),
            names,
        })
    }

    pub fn name_of(&self, item_id: &str) -> Option<&str> {
        self.names.get(item_id).map(String::as_str)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(String, String)> for Catalog {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            version: String::new(),
            names: iter.into_iter().collect(),
        }
    }
}

/// The newest patch listed in `versions.json`.
pub fn latest_version(http: &Client, base_url: &str) -> Result<String, UploadError> {
    let url = format!("{}/api/versions.json", base_url);
    log::debug!("GET {}", url);
    let res = http.get(&url).send()?;
    if !res.status().is_success() {
        return Err(UploadError::Catalog(format!(
            "versions.json returned {}",
            res.status()
        )));
    }
    let versions: Vec<String> = serde_json::from_str(&res.text()?)?;
    versions
        .into_iter()
        .next()
        .ok_or_else(|| UploadError::Catalog("versions.json is empty".to_string()))
}
