//! Input discovery, reading and post-processing moves.

use std::fs;
use std::path::{Path, PathBuf};

use strata_core::{AppError, AppResult};
use walkdir::WalkDir;

use crate::readers::FileKind;

/// Extensions picked up from the raw directory.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["html", "htm", "jpg", "jpeg", "png", "txt", "srt"];

/// Finds raw inputs and moves them out of the way once handled.
#[derive(Debug, Clone)]
pub struct Extractor {
    raw_dir: PathBuf,
    processed_dir: PathBuf,
    error_dir: PathBuf,
}

impl Extractor {
    pub fn new(
        raw_dir: impl Into<PathBuf>,
        processed_dir: impl Into<PathBuf>,
        error_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            raw_dir: raw_dir.into(),
            processed_dir: processed_dir.into(),
            error_dir: error_dir.into(),
        }
    }

    pub fn raw_dir(&self) -> &Path {
        &self.raw_dir
    }

    /// List candidate inputs directly inside the raw directory, sorted by path.
    ///
    /// Hidden files, subdirectories and unsupported extensions are ignored.
    /// A missing raw directory yields no files.
    pub fn discover_files(&self) -> Vec<PathBuf> {
        if !self.raw_dir.is_dir() {
            tracing::warn!("Raw directory {:?} does not exist", self.raw_dir);
            return Vec::new();
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.raw_dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_candidate(p))
            .collect();

        files.sort();
        tracing::debug!("Discovered {} files in {:?}", files.len(), self.raw_dir);
        files
    }

    /// Read a file and classify it by extension.
    pub fn read_file(&self, path: &Path) -> AppResult<(FileKind, Vec<u8>)> {
        let kind = FileKind::from_path(path);
        let content = fs::read(path)
            .map_err(|e| AppError::Parse(format!("Failed to read {:?}: {}", path, e)))?;
        Ok((kind, content))
    }

    /// Move a handled file into the processed directory, or the error
    /// directory when `to_error` is set.
    ///
    /// Existing names are never overwritten: `report.txt` becomes
    /// `report_1.txt`, `report_2.txt`, and so on. Returns the destination, or
    /// `None` if the source no longer exists.
    pub fn move_file(&self, path: &Path, to_error: bool) -> AppResult<Option<PathBuf>> {
        if !path.exists() {
            return Ok(None);
        }

        let dest_dir = if to_error {
            &self.error_dir
        } else {
            &self.processed_dir
        };
        fs::create_dir_all(dest_dir)?;

        let dest = free_destination(dest_dir, path);
        move_path(path, &dest)?;

        tracing::debug!("Moved {:?} -> {:?}", path, dest);
        Ok(Some(dest))
    }
}

fn is_candidate(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(true);
    if hidden {
        return false;
    }

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

fn free_destination(dest_dir: &Path, source: &Path) -> PathBuf {
    let file_name = source.file_name().map(PathBuf::from).unwrap_or_default();
    let mut dest = dest_dir.join(&file_name);

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let suffix = source
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut counter = 1u32;
    while dest.exists() {
        dest = dest_dir.join(format!("{}_{}{}", stem, counter, suffix));
        counter += 1;
    }
    dest
}

/// Rename, falling back to copy + delete across filesystems.
fn move_path(source: &Path, dest: &Path) -> AppResult<()> {
    if fs::rename(source, dest).is_ok() {
        return Ok(());
    }
    fs::copy(source, dest)?;
    fs::remove_file(source)?;
    Ok(())
}
