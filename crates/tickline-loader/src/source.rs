//! Byte sources for per-day files.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Where the loader reads day files from.
///
/// The default is the local filesystem; tests and network-backed stores
/// provide their own implementation.
pub trait TickSource: Send + Sync {
    /// Whether a file exists at `path`. Errors count as "absent".
    fn exists<'a>(&'a self, path: &'a Path) -> SourceFuture<'a, bool>;

    /// Read the whole file at `path`.
    fn read<'a>(&'a self, path: &'a Path) -> SourceFuture<'a, std::io::Result<Vec<u8>>>;
}

/// Local filesystem via `tokio::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsTickSource;

impl TickSource for FsTickSource {
    fn exists<'a>(&'a self, path: &'a Path) -> SourceFuture<'a, bool> {
        Box::pin(async move { tokio::fs::try_exists(path).await.unwrap_or(false) })
    }

    fn read<'a>(&'a self, path: &'a Path) -> SourceFuture<'a, std::io::Result<Vec<u8>>> {
        Box::pin(tokio::fs::read(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fs_source_reports_existence_and_reads_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("day.arrow");
        std::fs::write(&path, b"payload").expect("write");

        let source = FsTickSource;
        assert!(source.exists(&path).await);
        assert!(!source.exists(&dir.path().join("missing.arrow")).await);
        assert_eq!(source.read(&path).await.expect("read"), b"payload");
    }
}
