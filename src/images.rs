// Local item icons: directory scan and `data:` URI encoding for upload.

use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::UploadError;

/// An image file on disk whose stem is a catalog item id (`1001.png`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalImage {
    pub path: PathBuf,
    pub item_id: String,
}

impl LocalImage {
    pub fn new(path: PathBuf) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        if file_name.starts_with('.') {
            return None;
        }
        let item_id = file_name.split('.').next().unwrap_or(file_name).to_string();
        Some(Self { path, item_id })
    }

    /// MIME type guessed from the extension; Discord sniffs the bytes anyway,
    /// so unknown extensions are sent as PNG.
    pub fn mime_type(&self) -> &'static str {
        let ext = self
            .path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("gif") => "image/gif",
            Some("webp") => "image/webp",
            _ => "image/png",
        }
    }

    /// Read the file and wrap it as a `data:` URI for the emoji endpoint.
    pub fn data_uri(&self) -> Result<String, UploadError> {
        let bytes = fs::read(&self.path).map_err(|source| UploadError::Image {
            path: self.path.clone(),
            source,
        })?;
        Ok(format!("data:{};base64,{}", self.mime_type(), STANDARD.encode(bytes)))
    }
}

/// List the image files directly inside `dir`, sorted by file name.
pub fn scan_images(dir: &Path) -> Result<Vec<LocalImage>, UploadError> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(image) = LocalImage::new(entry.path()) {
            images.push(image);
        }
    }
    if images.is_empty() {
        return Err(UploadError::NoImages(dir.to_path_buf()));
    }
    images.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    log::debug!("Found {} image(s) in {}", images.len(), dir.display());
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn item_id_is_stem_before_first_dot() {
        let img = LocalImage::new(PathBuf::from("images/3031.png")).unwrap();
        assert_eq!(img.item_id, "3031");
        let img = LocalImage::new(PathBuf::from("3031.old.png")).unwrap();
        assert_eq!(img.item_id, "3031");
    }

    #[test]
    fn hidden_files_are_ignored() {
        assert!(LocalImage::new(PathBuf::from(".DS_Store")).is_none());
    }

    #[test]
    fn data_uri_encodes_bytes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("1001.png");
        fs::write(&path, b"hello").unwrap();
        let img = LocalImage::new(path).unwrap();
        assert_eq!(img.data_uri().unwrap(), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn mime_follows_extension() {
        let img = LocalImage::new(PathBuf::from("1001.JPG")).unwrap();
        assert_eq!(img.mime_type(), "image/jpeg");
        let img = LocalImage::new(PathBuf::from("1001")).unwrap();
        assert_eq!(img.mime_type(), "image/png");
    }

    #[test]
    fn scan_sorts_and_skips_directories() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("3031.png"), b"x").unwrap();
        fs::write(tmp.path().join("1001.png"), b"x").unwrap();
        fs::write(tmp.path().join(".hidden"), b"x").unwrap();
        fs::create_dir(tmp.path().join("nested")).unwrap();

        let images = scan_images(tmp.path()).unwrap();
        let ids: Vec<_> = images.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "3031"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            scan_images(tmp.path()),
            Err(UploadError::NoImages(_))
        ));
    }
}
