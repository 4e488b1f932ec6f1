//! Ranged, cached, concurrency-bounded tick loading.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use time::Date;
use tokio::sync::{Mutex, Semaphore};
use tracing::{debug, info, warn};

use tickline_core::{Tick, TickTimestamp, ValidationError};

use crate::cache::{DateCache, DayTicks};
use crate::calendar::{day_file_path, DateSpan};
use crate::decode::decode_ticks;
use crate::source::{FsTickSource, TickSource};
use crate::{LoaderConfig, LoaderError};

/// Which ticks of the loaded days are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeFilter {
    /// Every tick of every day in the span.
    #[default]
    DayBucket,
    /// Only ticks with `from <= timestamp <= to`.
    Exact {
        from: TickTimestamp,
        to: TickTimestamp,
    },
}

impl TimeFilter {
    pub fn keeps(&self, tick: &Tick) -> bool {
        match self {
            Self::DayBucket => true,
            Self::Exact { from, to } => tick
                .parsed_timestamp()
                .is_ok_and(|timestamp| *from <= timestamp && timestamp <= *to),
        }
    }
}

/// A validated load request: the days to fetch and how to filter them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeRequest {
    span: DateSpan,
    filter: TimeFilter,
}

impl RangeRequest {
    /// Whole days from `start` through `end`.
    pub fn days(start: Date, end: Date) -> Result<Self, ValidationError> {
        Ok(Self {
            span: DateSpan::new(start, end)?,
            filter: TimeFilter::DayBucket,
        })
    }

    /// Whole days between two `YYYY-MM-DD` strings.
    pub fn parse_days(start: &str, end: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            span: DateSpan::parse(start, end)?,
            filter: TimeFilter::DayBucket,
        })
    }

    /// Ticks whose timestamp falls within `[from, to]`.
    pub fn exact(from: TickTimestamp, to: TickTimestamp) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvalidDateRange {
                start: from.to_string(),
                end: to.to_string(),
            });
        }
        Ok(Self {
            span: DateSpan::new(from.date(), to.date())?,
            filter: TimeFilter::Exact { from, to },
        })
    }

    pub fn span(&self) -> DateSpan {
        self.span
    }

    pub fn filter(&self) -> TimeFilter {
        self.filter
    }
}

/// Per-call accounting of where each requested day came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub requested_days: usize,
    /// Days served from the cache, including ones filled by a concurrent call.
    pub cached_days: usize,
    /// Days read and decoded by this call.
    pub fetched_days: usize,
    /// Days with no file.
    pub missing_days: usize,
    /// Days whose file could not be read or decoded.
    pub failed_days: usize,
    /// Rows dropped while decoding the fetched days.
    pub skipped_rows: usize,
}

/// Ticks for a range, in ascending date order, plus the call's report.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeLoad {
    pub ticks: Vec<Tick>,
    pub report: LoadReport,
}

enum DayOutcome {
    Cached(DayTicks),
    Fetched {
        ticks: DayTicks,
        skipped_rows: usize,
    },
    Missing,
    Failed,
}

/// Loads per-day tick files for date ranges.
///
/// Days already in the cache are never re-read. Missing days are fetched
/// concurrently, with at most `max_concurrent_reads` file reads in flight,
/// and at most one fetch per date across all concurrent calls on the loader.
pub struct TickLoader {
    config: LoaderConfig,
    source: Arc<dyn TickSource>,
    cache: DateCache,
    reads: Semaphore,
    gates: Mutex<HashMap<Date, Arc<Mutex<()>>>>,
}

impl TickLoader {
    /// Loader over the local filesystem.
    pub fn new(config: LoaderConfig) -> Result<Self, LoaderError> {
        Self::with_source(config, Arc::new(FsTickSource))
    }

    pub fn with_source(
        config: LoaderConfig,
        source: Arc<dyn TickSource>,
    ) -> Result<Self, LoaderError> {
        config.validate()?;
        let reads = Semaphore::new(config.max_concurrent_reads);
        Ok(Self {
            config,
            source,
            cache: DateCache::new(),
            reads,
            gates: Mutex::new(HashMap::new()),
        })
    }

    /// Use `cache` instead of a fresh one, e.g. to share it between loaders.
    pub fn with_cache(mut self, cache: DateCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn cache(&self) -> &DateCache {
        &self.cache
    }

    /// All ticks from `start` through `end`, whole days.
    pub async fn load(&self, start: Date, end: Date) -> Result<Vec<Tick>, LoaderError> {
        let request = RangeRequest::days(start, end)?;
        Ok(self.load_request(&request).await?.ticks)
    }

    /// Like [`load`](Self::load) with `YYYY-MM-DD` bounds.
    pub async fn load_iso(&self, start: &str, end: &str) -> Result<Vec<Tick>, LoaderError> {
        let request = RangeRequest::parse_days(start, end)?;
        Ok(self.load_request(&request).await?.ticks)
    }

    /// Resolve every day of `request` from the cache or the source.
    ///
    /// Fails with [`LoaderError::DataUnavailable`] when no day yields data.
    pub async fn load_request(&self, request: &RangeRequest) -> Result<RangeLoad, LoaderError> {
        let span = request.span();
        let days = span.days();
        let cached = self.cache.get_many(&days).await;

        let missing: Vec<Date> = days
            .iter()
            .zip(&cached)
            .filter(|(_, hit)| hit.is_none())
            .map(|(date, _)| *date)
            .collect();
        let outcomes = join_all(missing.iter().map(|&date| self.fetch_day(date))).await;
        let mut fetched: HashMap<Date, DayOutcome> = missing.into_iter().zip(outcomes).collect();

        let mut report = LoadReport {
            requested_days: days.len(),
            ..LoadReport::default()
        };
        let mut resolved = Vec::with_capacity(days.len());
        for (date, hit) in days.iter().zip(cached) {
            let outcome = match hit {
                Some(ticks) => {
                    debug!(date = %date, rows = ticks.len(), "tick cache hit");
                    DayOutcome::Cached(ticks)
                }
                None => fetched.remove(date).unwrap_or(DayOutcome::Failed),
            };
            match outcome {
                DayOutcome::Cached(ticks) => {
                    report.cached_days += 1;
                    resolved.push(ticks);
                }
                DayOutcome::Fetched {
                    ticks,
                    skipped_rows,
                } => {
                    report.fetched_days += 1;
                    report.skipped_rows += skipped_rows;
                    resolved.push(ticks);
                }
                DayOutcome::Missing => report.missing_days += 1,
                DayOutcome::Failed => report.failed_days += 1,
            }
        }

        if resolved.is_empty() {
            warn!(start = %span.start(), end = %span.end(), "no tick data in range");
            return Err(LoaderError::DataUnavailable {
                start: span.start(),
                end: span.end(),
            });
        }

        let filter = request.filter();
        let ticks: Vec<Tick> = resolved
            .iter()
            .flat_map(|day| day.iter())
            .filter(|tick| filter.keeps(tick))
            .cloned()
            .collect();

        info!(
            start = %span.start(),
            end = %span.end(),
            requested_days = report.requested_days,
            cached_days = report.cached_days,
            fetched_days = report.fetched_days,
            missing_days = report.missing_days,
            failed_days = report.failed_days,
            skipped_rows = report.skipped_rows,
            rows = ticks.len(),
            "loaded tick range"
        );

        Ok(RangeLoad { ticks, report })
    }

    /// The per-date gate serialising fetches of one day.
    async fn gate(&self, date: Date) -> Arc<Mutex<()>> {
        let mut gates = self.gates.lock().await;
        Arc::clone(gates.entry(date).or_default())
    }

    /// Drop the gate for `date` once no other call holds or awaits it.
    async fn release_gate(&self, date: Date, gate: Arc<Mutex<()>>) {
        let mut gates = self.gates.lock().await;
        // one reference in the map, one here
        let unused = gates
            .get(&date)
            .is_some_and(|entry| Arc::ptr_eq(entry, &gate) && Arc::strong_count(&gate) == 2);
        if unused {
            gates.remove(&date);
        }
    }

    async fn fetch_day(&self, date: Date) -> DayOutcome {
        let gate = self.gate(date).await;
        let outcome = {
            let _guard = gate.lock().await;
            self.fetch_gated(date).await
        };
        self.release_gate(date, gate).await;
        outcome
    }

    async fn fetch_gated(&self, date: Date) -> DayOutcome {
        // a concurrent call may have filled the day while we waited
        if let Some(ticks) = self.cache.get(date).await {
            debug!(date = %date, rows = ticks.len(), "tick day filled by concurrent load");
            return DayOutcome::Cached(ticks);
        }

        let path = day_file_path(&self.config.data_root, date, &self.config.file_extension);
        if !self.source.exists(&path).await {
            debug!(date = %date, path = %path.display(), "no tick file for day");
            return DayOutcome::Missing;
        }

        let bytes = {
            let Ok(_permit) = self.reads.acquire().await else {
                return DayOutcome::Failed;
            };
            self.source.read(&path).await
        };
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(date = %date, path = %path.display(), "tick file vanished before read");
                return DayOutcome::Missing;
            }
            Err(error) => {
                warn!(date = %date, path = %path.display(), %error, "failed to read tick file");
                return DayOutcome::Failed;
            }
        };

        match decode_ticks(&bytes, self.config.decode_batch_rows).await {
            Ok(decoded) => {
                if decoded.skipped_rows > 0 {
                    warn!(
                        date = %date,
                        skipped_rows = decoded.skipped_rows,
                        "skipped malformed tick rows"
                    );
                }
                debug!(date = %date, rows = decoded.ticks.len(), "decoded tick file");
                let ticks: DayTicks = Arc::new(decoded.ticks);
                self.cache.put(date, Arc::clone(&ticks)).await;
                DayOutcome::Fetched {
                    ticks,
                    skipped_rows: decoded.skipped_rows,
                }
            }
            Err(error) => {
                warn!(date = %date, path = %path.display(), %error, "failed to decode tick file");
                DayOutcome::Failed
            }
        }
    }
}

impl std::fmt::Debug for TickLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickLoader")
            .field("config", &self.config)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use tickline_core::parse_iso_date;

    use crate::source::SourceFuture;

    use super::*;

    fn day(iso: &str) -> Date {
        parse_iso_date(iso).expect("date")
    }

    fn config() -> LoaderConfig {
        LoaderConfig {
            data_root: "/ticks".into(),
            ..LoaderConfig::default()
        }
    }

    /// Source where no file exists; counts existence checks.
    #[derive(Default)]
    struct EmptySource {
        exists_calls: AtomicUsize,
    }

    impl TickSource for EmptySource {
        fn exists<'a>(&'a self, _path: &'a Path) -> SourceFuture<'a, bool> {
            self.exists_calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { false })
        }

        fn read<'a>(&'a self, _path: &'a Path) -> SourceFuture<'a, std::io::Result<Vec<u8>>> {
            Box::pin(async { Err(ErrorKind::NotFound.into()) })
        }
    }

    fn tick(timestamp: &str) -> Tick {
        Tick::new(timestamp, 1.0, 1.0, 1.0, 1).expect("tick")
    }

    #[test]
    fn exact_filter_keeps_inclusive_bounds() {
        let from = TickTimestamp::parse("20240614 093000").expect("from");
        let to = TickTimestamp::parse("20240614 100000").expect("to");
        let filter = RangeRequest::exact(from, to).expect("request").filter();

        assert!(filter.keeps(&tick("20240614 093000")));
        assert!(filter.keeps(&tick("20240614 100000")));
        assert!(!filter.keeps(&tick("20240614 092959")));
        assert!(!filter.keeps(&tick("20240614 100001")));
        assert!(TimeFilter::DayBucket.keeps(&tick("19700101 000000")));
    }

    #[test]
    fn exact_request_spans_the_touched_days() {
        let from = TickTimestamp::parse("20240613 230000").expect("from");
        let to = TickTimestamp::parse("20240614 010000").expect("to");
        let request = RangeRequest::exact(from, to).expect("request");
        assert_eq!(request.span().days(), [day("2024-06-13"), day("2024-06-14")]);

        assert!(RangeRequest::exact(to, from).is_err());
    }

    #[tokio::test]
    async fn start_after_end_fails_before_touching_the_source() {
        let source = Arc::new(EmptySource::default());
        let loader = TickLoader::with_source(config(), source.clone()).expect("loader");

        let err = loader
            .load(day("2024-06-15"), day("2024-06-14"))
            .await
            .expect_err("must fail");

        assert!(matches!(
            err,
            LoaderError::Validation(ValidationError::InvalidDateRange { .. })
        ));
        assert_eq!(source.exists_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_range_is_data_unavailable_and_not_cached() {
        let source = Arc::new(EmptySource::default());
        let loader = TickLoader::with_source(config(), source.clone()).expect("loader");

        let err = loader.load_iso("2024-06-10", "2024-06-12").await.expect_err("must fail");

        assert!(matches!(err, LoaderError::DataUnavailable { .. }));
        assert_eq!(source.exists_calls.load(Ordering::SeqCst), 3);
        assert!(loader.cache().is_empty().await);
    }

    #[tokio::test]
    async fn cached_days_bypass_the_source() {
        let source = Arc::new(EmptySource::default());
        let cache = DateCache::new();
        cache
            .put(day("2024-06-14"), Arc::new(vec![tick("20240614 090000")]))
            .await;
        let loader = TickLoader::with_source(config(), source.clone())
            .expect("loader")
            .with_cache(cache);

        let load = loader
            .load_request(&RangeRequest::parse_days("2024-06-13", "2024-06-14").expect("request"))
            .await
            .expect("load");

        assert_eq!(load.ticks.len(), 1);
        assert_eq!(
            load.report,
            LoadReport {
                requested_days: 2,
                cached_days: 1,
                missing_days: 1,
                ..LoadReport::default()
            }
        );
        assert_eq!(source.exists_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gates_are_released_after_each_load() {
        let source = Arc::new(EmptySource::default());
        let loader = TickLoader::with_source(config(), source.clone()).expect("loader");

        let (a, b) = tokio::join!(
            loader.load_iso("2024-06-01", "2024-06-30"),
            loader.load_iso("2024-06-10", "2024-06-20"),
        );

        assert!(a.is_err() && b.is_err());
        assert!(loader.gates.lock().await.is_empty());
    }

    #[test]
    fn rejects_invalid_config() {
        let config = LoaderConfig {
            max_concurrent_reads: 0,
            ..config()
        };
        assert!(matches!(
            TickLoader::new(config),
            Err(LoaderError::InvalidConfig(_))
        ));
    }
}
