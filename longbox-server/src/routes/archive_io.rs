//! Shared blocking-I/O helpers for the comic/reader routes: archive access
//! and image decode are both synchronous (`compress_tools`, `image`), so
//! every call here runs inside `spawn_blocking`, mirroring
//! `longbox_core::jobs::thumbnail`'s own `extract_cover`/`extract_cover_blocking`
//! split.

use longbox_core::archive::{ArchiveReader, Page};
use longbox_core::error::CoreError;

pub async fn ordered_pages(file_path: String) -> Result<Vec<Page>, CoreError> {
    tokio::task::spawn_blocking(move || {
        let reader = ArchiveReader::open(std::path::Path::new(&file_path))?;
        Ok(reader.ordered_pages())
    })
    .await
    .map_err(|e| CoreError::Internal(format!("archive worker panicked: {e}")))?
}

pub async fn read_page(file_path: String, entry_name: String) -> Result<Vec<u8>, CoreError> {
    tokio::task::spawn_blocking(move || {
        let reader = ArchiveReader::open(std::path::Path::new(&file_path))?;
        reader.read_entry(&entry_name)
    })
    .await
    .map_err(|e| CoreError::Internal(format!("archive worker panicked: {e}")))?
}

/// Nth page's entry name in canonical order, `BadRequest` if out of range.
pub async fn nth_page_entry(file_path: String, index: usize) -> Result<String, CoreError> {
    let pages = ordered_pages(file_path).await?;
    pages
        .get(index)
        .map(|p| p.entry_name.clone())
        .ok_or_else(|| CoreError::BadRequest(format!("page index {index} out of range (0..{})", pages.len())))
}

pub fn guess_content_type(entry_name: &str) -> &'static str {
    let lower = entry_name.to_ascii_lowercase();
    match lower.rsplit('.').next() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Applies the `sharpen`/`grayscale`/`webp` transforms a reader page
/// request may ask for (§6), off the async worker loop since decode and
/// re-encode are both blocking.
pub async fn transform_page(
    bytes: Vec<u8>,
    sharpen: bool,
    grayscale: bool,
    webp: bool,
) -> Result<(Vec<u8>, &'static str), CoreError> {
    if !sharpen && !grayscale && !webp {
        return Ok((bytes, "application/octet-stream"));
    }
    tokio::task::spawn_blocking(move || {
        let mut img = image::load_from_memory(&bytes)
            .map_err(|e| CoreError::BadArchive(format!("page is not a decodable image: {e}")))?;
        if grayscale {
            img = img.grayscale();
        }
        if sharpen {
            img = img.unsharpen(1.5, 2);
        }
        if webp {
            let mut out = Vec::new();
            img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::WebP)
                .map_err(|e| CoreError::Internal(format!("failed to encode webp: {e}")))?;
            Ok((out, "image/webp"))
        } else {
            let mut out = Vec::new();
            img.write_to(&mut std::io::Cursor::new(&mut out), image::ImageFormat::Png)
                .map_err(|e| CoreError::Internal(format!("failed to encode png: {e}")))?;
            Ok((out, "image/png"))
        }
    })
    .await
    .map_err(|e| CoreError::Internal(format!("image transform worker panicked: {e}")))?
}
