//! Archive Reader (C1): open ZIP/RAR/7Z, list pages in natural/cover order,
//! and locate the embedded metadata document.

mod sort_key;

pub use sort_key::page_sort_key;

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CoreError, Result};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp", "tiff"];

/// Case-insensitive junk filenames that are never pages even if they carry
/// an image extension (thumbs.db previews, macOS resource forks, etc).
const JUNK_NAMES: &[&str] = &["thumbs.db", ".ds_store", "__macosx"];

/// Filenames recognised as the embedded metadata document, checked
/// case-insensitively against the archive's entry list.
const METADATA_NAMES: &[&str] = &["comicinfo.xml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Rar,
    SevenZip,
}

impl ArchiveKind {
    /// Content-sniff by magic bytes; the caller should fall back to this
    /// only for files the signature can't classify, per §4.1.
    pub fn sniff(header: &[u8]) -> Option<Self> {
        if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Some(ArchiveKind::Zip)
        } else if header.starts_with(b"Rar!\x1a\x07") {
            Some(ArchiveKind::Rar)
        } else if header.starts_with(b"7z\xbc\xaf\x27\x1c") {
            Some(ArchiveKind::SevenZip)
        } else {
            None
        }
    }

    pub fn sniff_path(path: &Path) -> Result<Option<Self>> {
        let mut file = File::open(path)?;
        let mut header = [0u8; 8];
        let n = file.read(&mut header)?;
        Ok(Self::sniff(&header[..n]))
    }
}

/// A single page resolved from an archive's entry list, ready for sorting.
#[derive(Debug, Clone)]
pub struct Page {
    pub entry_name: String,
}

/// Holds an open archive's entry list; extraction happens lazily per page.
pub struct ArchiveReader {
    path: std::path::PathBuf,
    entries: Vec<String>,
}

impl ArchiveReader {
    /// Opens `path`, sniffing its format and listing entries. Returns
    /// `CoreError::NotFound` if the file is missing and
    /// `CoreError::BadArchive` if libarchive can't parse it.
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CoreError::NotFound(path.display().to_string()));
        }
        if ArchiveKind::sniff_path(path)?.is_none() {
            tracing::debug!(path = %path.display(), "archive magic not recognised, trying by extension anyway");
        }

        let file = File::open(path)
            .map_err(|e| CoreError::BadArchive(format!("{}: {e}", path.display())))?;
        let entries = compress_tools::list_archive_files(file)
            .map_err(|e| CoreError::BadArchive(format!("{}: {e}", path.display())))?;

        Ok(Self {
            path: path.to_path_buf(),
            entries,
        })
    }

    /// Ordered, filtered page list per §4.1: junk and non-image entries
    /// dropped, remainder sorted by cover priority then natural segments.
    pub fn ordered_pages(&self) -> Vec<Page> {
        let mut pages: Vec<Page> = self
            .entries
            .iter()
            .filter(|name| is_page_candidate(name))
            .map(|name| Page {
                entry_name: name.clone(),
            })
            .collect();
        pages.sort_by(|a, b| page_sort_key(&a.entry_name).cmp(&page_sort_key(&b.entry_name)));
        pages
    }

    /// The metadata document's entry name, if the archive carries one.
    pub fn metadata_entry_name(&self) -> Option<&str> {
        self.entries.iter().find_map(|name| {
            let base = name.rsplit('/').next().unwrap_or(name).to_ascii_lowercase();
            METADATA_NAMES.contains(&base.as_str()).then_some(name.as_str())
        })
    }

    /// Reads the embedded metadata document's raw bytes, if present.
    pub fn read_metadata_bytes(&self) -> Result<Option<Vec<u8>>> {
        let Some(name) = self.metadata_entry_name() else {
            return Ok(None);
        };
        Ok(Some(self.read_entry(name)?))
    }

    /// Reads one entry's full contents by name.
    pub fn read_entry(&self, name: &str) -> Result<Vec<u8>> {
        let file = File::open(&self.path)
            .map_err(|e| CoreError::BadArchive(format!("{}: {e}", self.path.display())))?;
        let mut buf = Vec::new();
        compress_tools::uncompress_archive_file(file, &mut buf, name)
            .map_err(|e| CoreError::BadArchive(format!("{}: {e}", self.path.display())))?;
        Ok(buf)
    }
}

fn is_page_candidate(name: &str) -> bool {
    let base = name.rsplit('/').next().unwrap_or(name);
    if base.is_empty() || base.ends_with('/') {
        return false;
    }
    let lower = base.to_ascii_lowercase();
    if JUNK_NAMES.iter().any(|junk| lower.contains(junk)) {
        return false;
    }
    match lower.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS.contains(&ext),
        None => false,
    }
}
