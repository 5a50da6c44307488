//! Scan Pipeline (C4): walk -> fan out (workers run C1+C2 in isolation) ->
//! fan in (single writer, batched commits) -> reap.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use longbox_model::ids::{IssueId, LibraryId, PersonId};
use longbox_model::issue::CreditRole;
use longbox_model::library::Library;
use longbox_model::rating::AgeRating;
use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::{mpsc, Semaphore};

use crate::archive::ArchiveReader;
use crate::db::{containers, issues, series_volumes};
use crate::error::Result;
use crate::ingest::normalize;
use crate::ingest::resolver::{clean_name, EntityResolver};
use crate::metadata;

const BATCH_SIZE: usize = 50;
pub const ARCHIVE_EXTENSIONS: &[&str] = &["zip", "cbz", "rar", "cbr", "7z", "cb7"];

/// Everything the fan-in writer needs for one Issue row, already resolved
/// from raw metadata but not yet touching Series/Volume/tags (those happen
/// at write time, where the shared `EntityResolver` cache lives).
#[derive(Debug, Clone)]
pub struct NormalizedIssue {
    pub filename: String,
    pub file_size: i64,
    pub file_mtime: DateTime<Utc>,
    pub page_count: i32,
    pub number: Option<String>,
    pub title: Option<String>,
    pub summary: Option<String>,
    pub cover_year: Option<i32>,
    pub cover_month: Option<i32>,
    pub cover_day: Option<i32>,
    pub web_url: Option<String>,
    pub notes: Option<String>,
    pub age_rating: Option<AgeRating>,
    pub language_iso: Option<String>,
    pub community_rating: Option<f32>,
    pub count: Option<i32>,
    pub publisher: Option<String>,
    pub imprint: Option<String>,
    pub format: Option<String>,
    pub series_group: Option<String>,
    pub scan_info: Option<String>,
    pub alternate_series: Option<String>,
    pub alternate_number: Option<String>,
    pub story_arc: Option<String>,
    pub raw_metadata: Option<String>,
}

struct ExtractionOutcome {
    path: PathBuf,
    mtime: DateTime<Utc>,
    size: i64,
    result: std::result::Result<(metadata::ParsedMetadata, i32, String), String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanSummary {
    pub imported: u64,
    pub updated: u64,
    pub skipped: u64,
    pub deleted: u64,
    pub errors: u64,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Copy)]
pub enum WorkerCount {
    Auto,
    Explicit(usize),
}

impl WorkerCount {
    pub fn resolve(self) -> usize {
        match self {
            WorkerCount::Auto => (num_cpus::get() / 2).max(1),
            WorkerCount::Explicit(n) => n.max(1),
        }
    }
}

pub struct ScanPipeline {
    pool: PgPool,
    workers: WorkerCount,
}

impl ScanPipeline {
    pub fn new(pool: PgPool, workers: WorkerCount) -> Self {
        Self { pool, workers }
    }

    pub async fn run(&self, library: &Library, force: bool) -> Result<ScanSummary> {
        let start = Instant::now();
        let mut summary = ScanSummary::default();

        let on_disk = walk(Path::new(&library.root_path)).await?;
        let baseline = issues::baseline_for_library(&self.pool, library.id).await?;
        let baseline_by_path: HashMap<String, (IssueId, DateTime<Utc>, i64)> = baseline
            .into_iter()
            .map(|(path, id, mtime, size)| (path, (id, mtime, size)))
            .collect();

        let (tx, mut rx) = mpsc::channel::<ExtractionOutcome>(BATCH_SIZE * 2);
        let semaphore = Arc::new(Semaphore::new(self.workers.resolve()));

        let mut worker_handles = Vec::with_capacity(on_disk.len());
        for path in &on_disk {
            let permit = semaphore.clone();
            let path = path.clone();
            let tx = tx.clone();
            worker_handles.push(tokio::spawn(async move {
                let _permit = permit.acquire_owned().await;
                let outcome = tokio::task::spawn_blocking(move || extract_one(&path))
                    .await
                    .unwrap_or_else(|e| ExtractionOutcome {
                        path: PathBuf::new(),
                        mtime: Utc::now(),
                        size: 0,
                        result: Err(format!("worker panicked: {e}")),
                    });
                let _ = tx.send(outcome).await;
            }));
        }
        drop(tx);

        let mut resolver = EntityResolver::new();
        let mut batch = Vec::with_capacity(BATCH_SIZE);
        while let Some(outcome) = rx.recv().await {
            batch.push(outcome);
            if batch.len() >= BATCH_SIZE {
                self.commit_batch(library.id, std::mem::take(&mut batch), &baseline_by_path, force, &mut resolver, &mut summary)
                    .await?;
            }
        }
        if !batch.is_empty() {
            self.commit_batch(library.id, batch, &baseline_by_path, force, &mut resolver, &mut summary)
                .await?;
        }

        for handle in worker_handles {
            let _ = handle.await;
        }

        let on_disk_set: HashSet<String> = on_disk.iter().map(|p| p.display().to_string()).collect();
        let reap_ids: Vec<IssueId> = baseline_by_path
            .iter()
            .filter(|(path, _)| !on_disk_set.contains(*path))
            .map(|(_, (id, _, _))| *id)
            .collect();
        summary.deleted = reap_ids.len() as u64;
        issues::reap(&self.pool, &reap_ids).await?;

        summary.elapsed_ms = start.elapsed().as_millis() as u64;
        Ok(summary)
    }

    async fn commit_batch(
        &self,
        library_id: LibraryId,
        batch: Vec<ExtractionOutcome>,
        baseline_by_path: &HashMap<String, (IssueId, DateTime<Utc>, i64)>,
        force: bool,
        resolver: &mut EntityResolver,
        summary: &mut ScanSummary,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for outcome in batch {
            let path_key = outcome.path.display().to_string();
            let (parsed, page_count, raw_metadata) = match outcome.result {
                Ok(v) => v,
                Err(_) => {
                    summary.errors += 1;
                    continue;
                }
            };

            if let Some((_, existing_mtime, existing_size)) = baseline_by_path.get(&path_key) {
                if !force && *existing_mtime == outcome.mtime && *existing_size == outcome.size {
                    summary.skipped += 1;
                    continue;
                }
            }

            let series_name = normalize::normalize_series_name(parsed.series.as_deref());
            let volume_number = normalize::normalize_volume_number(parsed.volume_number);
            let series = resolver.series(&mut tx, library_id, &series_name).await?;
            series_volumes::touch_series(&mut *tx, series.id).await?;
            let volume = resolver.volume(&mut tx, series.id, volume_number).await?;

            let normalized = NormalizedIssue {
                filename: outcome
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                file_size: outcome.size,
                file_mtime: outcome.mtime,
                page_count,
                number: parsed.number.as_deref().map(normalize::normalize_issue_number),
                title: parsed.title.clone(),
                summary: parsed.summary.clone(),
                cover_year: parsed.cover_year,
                cover_month: parsed.cover_month,
                cover_day: parsed.cover_day,
                web_url: parsed.web_url.clone(),
                notes: parsed.notes.clone(),
                age_rating: parsed.age_rating_raw.as_deref().and_then(AgeRating::parse),
                language_iso: parsed.language_iso.clone(),
                community_rating: parsed.community_rating,
                count: parsed.count,
                publisher: parsed.publisher.clone(),
                imprint: parsed.imprint.clone(),
                format: parsed.format.clone(),
                series_group: parsed.series_group.clone(),
                scan_info: parsed.scan_info.clone(),
                alternate_series: parsed.alternate_series.clone(),
                alternate_number: parsed.alternate_number.clone(),
                story_arc: parsed.story_arc.clone(),
                raw_metadata: Some(raw_metadata),
            };

            let (issue_id, was_inserted) = issues::upsert(&mut *tx, &path_key, volume.id, &normalized).await?;
            if was_inserted {
                summary.imported += 1;
            } else {
                summary.updated += 1;
            }

            let mut credit_ids: Vec<(PersonId, CreditRole)> = Vec::new();
            for (name, role) in &parsed.credits {
                if let Some(clean) = clean_name(name) {
                    let person = resolver.person(&mut tx, &clean).await?;
                    credit_ids.push((person.id, *role));
                }
            }
            issues::replace_credits(&mut *tx, issue_id, &credit_ids).await?;

            let mut character_ids = Vec::new();
            for name in &parsed.characters {
                if let Some(clean) = clean_name(name) {
                    character_ids.push(resolver.character(&mut tx, &clean).await?.id.as_uuid());
                }
            }
            issues::replace_characters(&mut tx, issue_id, &character_ids).await?;

            let mut team_ids = Vec::new();
            for name in &parsed.teams {
                if let Some(clean) = clean_name(name) {
                    team_ids.push(resolver.team(&mut tx, &clean).await?.id.as_uuid());
                }
            }
            issues::replace_teams(&mut tx, issue_id, &team_ids).await?;

            let mut location_ids = Vec::new();
            for name in &parsed.locations {
                if let Some(clean) = clean_name(name) {
                    location_ids.push(resolver.location(&mut tx, &clean).await?.id.as_uuid());
                }
            }
            issues::replace_locations(&mut tx, issue_id, &location_ids).await?;

            let mut genre_ids = Vec::new();
            for name in &parsed.genres {
                if let Some(clean) = clean_name(name) {
                    genre_ids.push(resolver.genre(&mut tx, &clean).await?.id.as_uuid());
                }
            }
            issues::replace_genres(&mut tx, issue_id, &genre_ids).await?;

            if let Some(group) = parsed.series_group.as_deref().and_then(clean_name) {
                let collection = resolver.auto_collection(&mut tx, &group).await?;
                containers::set_membership(&mut tx, collection.id, issue_id, None).await?;
            }
            if let (Some(alt_series), Some(alt_number)) = (
                parsed.alternate_series.as_deref().and_then(clean_name),
                parsed.alternate_number.as_deref(),
            ) {
                let reading_list = resolver.auto_reading_list(&mut tx, &alt_series).await?;
                let position: Option<f64> = alt_number.trim().replace(',', ".").parse().ok();
                containers::set_membership(&mut tx, reading_list.id, issue_id, position).await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Recursively enumerates files with a supported extension under `root`
/// (§4.4 stage 1).
async fn walk(root: &Path) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let mut entries = tokio::fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let file_type = entry.file_type().await?;
            if file_type.is_dir() {
                stack.push(path);
            } else if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                if ARCHIVE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
                    out.push(path);
                }
            }
        }
    }
    Ok(out)
}

/// Runs C1 + C2 against one file, in isolation: no shared mutable state, no
/// database handle (§9's "workers must never hold a database handle").
/// An archive with no metadata document is rejected per §4.2.
fn extract_one(path: &Path) -> ExtractionOutcome {
    let meta = std::fs::metadata(path);
    let (size, mtime) = match meta {
        Ok(m) => {
            let mtime = m
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            (m.len() as i64, mtime)
        }
        Err(e) => {
            return ExtractionOutcome {
                path: path.to_path_buf(),
                mtime: Utc::now(),
                size: 0,
                result: Err(e.to_string()),
            }
        }
    };

    let result = run_extraction(path);
    ExtractionOutcome {
        path: path.to_path_buf(),
        mtime,
        size,
        result,
    }
}

fn run_extraction(path: &Path) -> std::result::Result<(metadata::ParsedMetadata, i32, String), String> {
    let reader = ArchiveReader::open(path).map_err(|e| e.to_string())?;
    let pages = reader.ordered_pages();
    let page_count = pages.len() as i32;

    let metadata_bytes = reader
        .read_metadata_bytes()
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "archive has no embedded metadata document".to_string())?;

    let parsed = metadata::parse(&metadata_bytes).map_err(|e| e.to_string())?;
    let raw = String::from_utf8_lossy(&metadata_bytes).to_string();
    Ok((parsed, page_count, raw))
}
