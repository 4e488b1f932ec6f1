//! Inventory of the day files under a data folder.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::warn;

use tickline_core::Tick;

use crate::decode::{first_tick, read_ipc};
use crate::LoaderError;

/// Summary of one decodable day file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickFileStats {
    pub path: PathBuf,
    pub rows: usize,
    pub columns: Vec<String>,
    /// First row that decodes into a valid tick, if any.
    pub first_row: Option<Tick>,
}

/// Result of scanning a folder for day files.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FolderStats {
    pub folder: PathBuf,
    /// Files found with the requested extension.
    pub scanned_files: usize,
    /// Files that could not be read or decoded.
    pub failed_files: usize,
    pub total_rows: usize,
    pub files: Vec<TickFileStats>,
}

/// Recursively scan `folder` for `*.<extension>` files and summarise each.
///
/// Undecodable files are logged and counted rather than failing the scan;
/// only an unreadable folder tree is an error.
pub fn collect_folder_stats(folder: &Path, extension: &str) -> Result<FolderStats, LoaderError> {
    let mut paths = Vec::new();
    collect_files(folder, extension, &mut paths)?;
    paths.sort();

    let mut stats = FolderStats {
        folder: folder.to_path_buf(),
        scanned_files: paths.len(),
        failed_files: 0,
        total_rows: 0,
        files: Vec::with_capacity(paths.len()),
    };

    for path in paths {
        match file_stats(&path) {
            Ok(file) => {
                stats.total_rows += file.rows;
                stats.files.push(file);
            }
            Err(error) => {
                warn!(path = %path.display(), %error, "skipping unreadable tick file");
                stats.failed_files += 1;
            }
        }
    }

    Ok(stats)
}

/// Row count, column names and first valid row of one file.
pub fn file_stats(path: &Path) -> Result<TickFileStats, LoaderError> {
    let bytes = fs::read(path)?;
    let (schema, batches) = read_ipc(&bytes)?;
    Ok(TickFileStats {
        path: path.to_path_buf(),
        rows: batches.iter().map(|batch| batch.num_rows()).sum(),
        columns: schema.fields().iter().map(|field| field.name().clone()).collect(),
        first_row: first_tick(&batches)?,
    })
}

fn collect_files(
    root: &Path,
    extension: &str,
    files: &mut Vec<PathBuf>,
) -> Result<(), std::io::Error> {
    for entry in fs::read_dir(root)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(path.as_path(), extension, files)?;
            continue;
        }
        if path
            .extension()
            .and_then(|value| value.to_str())
            .is_some_and(|value| value.eq_ignore_ascii_case(extension))
        {
            files.push(path);
        }
    }

    Ok(())
}
