//! # Tickline Loader
//!
//! Date-ranged loading of per-day Arrow tick files with a session cache and
//! bounded concurrent reads.
//!
//! ## Overview
//!
//! Each calendar day lives in its own file:
//!
//! ```text
//! <data_root>/<YYYY>/<MM>/tickdata_<YYYY>-<MM>-<DD>.arrow
//! ```
//!
//! A [`TickLoader`] resolves every day of a requested range from its
//! [`DateCache`] or, for days not cached yet, from its [`TickSource`]. Missing
//! files are skipped; only a range with no data at all is an error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickline_loader::{LoaderConfig, TickLoader};
//!
//! # async fn run() -> Result<(), tickline_loader::LoaderError> {
//! let loader = TickLoader::new(LoaderConfig {
//!     data_root: "/srv/ticks".into(),
//!     ..LoaderConfig::default()
//! })?;
//!
//! let ticks = loader.load_iso("2024-06-10", "2024-06-14").await?;
//! println!("loaded {} ticks", ticks.len());
//!
//! // second call for an overlapping range only reads the new day
//! let ticks = loader.load_iso("2024-06-12", "2024-06-15").await?;
//! println!("loaded {} ticks", ticks.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Per-date tick cache |
//! | [`calendar`] | Day spans and file layout |
//! | [`decode`] | Arrow IPC decoding |
//! | [`loader`] | Range loading |
//! | [`source`] | File source seam |
//! | [`stats`] | Folder inventory |

pub mod cache;
pub mod calendar;
pub mod decode;
pub mod loader;
pub mod source;
pub mod stats;

use std::env;
use std::path::PathBuf;

use arrow::error::ArrowError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Date;

use tickline_core::{Tick, ValidationError};

pub use cache::{DateCache, DayTicks};
pub use calendar::{day_file_path, DateSpan};
pub use decode::{decode_ticks, DecodedDay};
pub use loader::{LoadReport, RangeLoad, RangeRequest, TickLoader, TimeFilter};
pub use source::{FsTickSource, SourceFuture, TickSource};
pub use stats::{collect_folder_stats, file_stats, FolderStats, TickFileStats};

/// Environment variable naming the default data root.
pub const DATA_ROOT_ENV: &str = "TICKLINE_DATA_ROOT";

/// Errors from loading tick files.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Malformed request, e.g. start date after end date.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Payload is not valid Arrow IPC, or a column cannot be cast.
    #[error(transparent)]
    Arrow(#[from] ArrowError),

    #[error("tick file has no '{column}' column")]
    MissingColumn { column: String },

    #[error("tick column '{column}' has an unexpected type after casting")]
    UnexpectedColumnType { column: String },

    #[error("invalid loader config: {0}")]
    InvalidConfig(String),

    /// No day in the range produced any data.
    #[error("no tick data available between {start} and {end}")]
    DataUnavailable { start: Date, end: Date },
}

/// Configuration for a [`TickLoader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Folder holding the `<YYYY>/<MM>/` day tree.
    pub data_root: PathBuf,
    /// Day file extension, without the dot.
    pub file_extension: String,
    /// Upper bound on simultaneous file reads.
    pub max_concurrent_reads: usize,
    /// Rows decoded between yields to the runtime.
    pub decode_batch_rows: usize,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            data_root: resolve_data_root(),
            file_extension: String::from("arrow"),
            max_concurrent_reads: 3,
            decode_batch_rows: 10,
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), LoaderError> {
        if self.max_concurrent_reads == 0 {
            return Err(LoaderError::InvalidConfig(String::from(
                "max_concurrent_reads must be greater than zero",
            )));
        }
        if self.decode_batch_rows == 0 {
            return Err(LoaderError::InvalidConfig(String::from(
                "decode_batch_rows must be greater than zero",
            )));
        }
        if self.file_extension.is_empty() {
            return Err(LoaderError::InvalidConfig(String::from(
                "file_extension must not be empty",
            )));
        }
        Ok(())
    }
}

/// One-shot load of whole days from `folder`, with `YYYY-MM-DD` bounds.
///
/// Builds a fresh loader, so nothing is cached between calls; hold a
/// [`TickLoader`] to reuse its cache.
pub async fn load_by_date_range(
    folder: impl Into<PathBuf>,
    start: &str,
    end: &str,
) -> Result<Vec<Tick>, LoaderError> {
    let loader = TickLoader::new(LoaderConfig {
        data_root: folder.into(),
        ..LoaderConfig::default()
    })?;
    loader.load_iso(start, end).await
}

fn resolve_data_root() -> PathBuf {
    if let Some(path) = env::var_os(DATA_ROOT_ENV) {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    PathBuf::from("data")
}
