//! Thumbnail regeneration: the job-queue half of §6's "thumbnail directory
//! writes are self-healing" rule. The other half — generating a missing
//! thumbnail on a hot GET without writing back to the database — lives in
//! the server's comic route, not here.

use longbox_model::ids::LibraryId;
use sqlx::PgPool;

use crate::db::issues;
use crate::error::{CoreError, Result};
use crate::storage::StorageLayout;

const THUMBNAIL_WIDTH: u32 = 400;

/// Regenerates the cover thumbnail + palette swatch for every `is_dirty`
/// Issue, scoped to one library or every library when `None`. Returns the
/// count successfully regenerated; a single bad archive logs and is skipped
/// rather than aborting the whole pass.
pub async fn regenerate_dirty(pool: &PgPool, library_id: Option<LibraryId>) -> Result<u64> {
    let storage = StorageLayout::new(
        std::env::var("LONGBOX_STORAGE_ROOT").unwrap_or_else(|_| "./storage".to_string()),
    );
    storage.ensure_directories().await?;

    let dirty = issues::dirty_issue_ids(pool, library_id).await?;
    let mut regenerated = 0u64;

    for issue_id in dirty {
        match regenerate_one(pool, &storage, issue_id).await {
            Ok(()) => regenerated += 1,
            Err(e) => tracing::warn!(%issue_id, error = %e, "thumbnail regeneration failed, leaving dirty"),
        }
    }

    Ok(regenerated)
}

async fn regenerate_one(pool: &PgPool, storage: &StorageLayout, issue_id: longbox_model::ids::IssueId) -> Result<()> {
    let issue = issues::get(pool, issue_id)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("issue {issue_id}")))?;

    let dest = storage.thumbnail_path(issue_id);
    let cover_color = extract_cover(&issue.file_path, &dest).await?;

    let relative_key = format!("cover/comic_{issue_id}.webp");
    issues::mark_clean(pool, issue_id, &relative_key, cover_color.as_deref()).await
}

/// Decodes the archive's cover page and writes it out resized as WebP.
/// Archive I/O and image decode are blocking, so this runs off the async
/// worker loop's own task (§5 suspension/blocking points).
async fn extract_cover(file_path: &str, dest: &std::path::Path) -> Result<Option<String>> {
    let file_path = file_path.to_string();
    let dest = dest.to_path_buf();
    tokio::task::spawn_blocking(move || extract_cover_blocking(&file_path, &dest))
        .await
        .map_err(|e| CoreError::Internal(format!("thumbnail worker panicked: {e}")))?
}

fn extract_cover_blocking(file_path: &str, dest: &std::path::Path) -> Result<Option<String>> {
    let reader = crate::archive::ArchiveReader::open(std::path::Path::new(file_path))?;
    let pages = reader.ordered_pages();
    let cover = pages
        .first()
        .ok_or_else(|| CoreError::BadArchive("archive has no pages".into()))?;

    let bytes = reader.read_entry(&cover.entry_name)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| CoreError::BadArchive(format!("cover page is not a decodable image: {e}")))?;

    let thumb = img.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_WIDTH * 2);
    thumb
        .save_with_format(dest, image::ImageFormat::WebP)
        .map_err(|e| CoreError::Internal(format!("failed to write thumbnail: {e}")))?;

    Ok(dominant_color(&img))
}

/// Downscales to a single pixel as a cheap dominant-colour estimate and
/// formats it `#rrggbb`.
fn dominant_color(img: &image::DynamicImage) -> Option<String> {
    let swatch = img.thumbnail(1, 1).to_rgb8();
    let pixel = swatch.get_pixel(0, 0);
    Some(format!("#{:02x}{:02x}{:02x}", pixel[0], pixel[1], pixel[2]))
}
