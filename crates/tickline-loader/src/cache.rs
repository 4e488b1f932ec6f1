//! Per-date tick cache.

use std::collections::HashMap;
use std::sync::Arc;

use time::Date;

use tickline_core::{format_iso_date, Tick};

/// Ticks for one calendar day, shared between the cache and callers.
pub type DayTicks = Arc<Vec<Tick>>;

#[derive(Debug, Default)]
struct CacheInner {
    map: HashMap<Date, DayTicks>,
}

/// Session-scoped cache of whole-day tick sequences keyed by calendar date.
///
/// Entries are written once per successfully decoded day and never expire on
/// their own; callers invalidate days explicitly with [`DateCache::remove`] or
/// [`DateCache::clear`]. Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct DateCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
}

impl DateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, date: Date) -> Option<DayTicks> {
        let store = self.inner.read().await;
        store.map.get(&date).cloned()
    }

    /// Look up several dates under one read lock, preserving input order.
    pub async fn get_many(&self, dates: &[Date]) -> Vec<Option<DayTicks>> {
        let store = self.inner.read().await;
        dates.iter().map(|date| store.map.get(date).cloned()).collect()
    }

    /// Insert or replace the ticks for `date`.
    pub async fn put(&self, date: Date, ticks: DayTicks) {
        let mut store = self.inner.write().await;
        store.map.insert(date, ticks);
    }

    /// Drop the given days so the next load reads them again.
    ///
    /// Returns how many of them were cached.
    pub async fn remove(&self, dates: &[Date]) -> usize {
        let mut store = self.inner.write().await;
        dates
            .iter()
            .filter(|date| store.map.remove(*date).is_some())
            .count()
    }

    /// Drop every cached day.
    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    pub async fn contains(&self, date: Date) -> bool {
        let store = self.inner.read().await;
        store.map.contains_key(&date)
    }

    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Cached dates, ascending.
    pub async fn dates(&self) -> Vec<Date> {
        let store = self.inner.read().await;
        let mut dates: Vec<Date> = store.map.keys().copied().collect();
        dates.sort_unstable();
        dates
    }

    /// Cached dates as ISO `YYYY-MM-DD` keys, ascending.
    pub async fn keys(&self) -> Vec<String> {
        self.dates().await.into_iter().map(format_iso_date).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickline_core::parse_iso_date;

    fn day(iso: &str) -> Date {
        parse_iso_date(iso).expect("date")
    }

    fn ticks(count: usize) -> DayTicks {
        Arc::new(
            (0..count)
                .map(|_| Tick::new("20240101 090000", 1.0, 1.0, 1.0, 1).expect("tick"))
                .collect(),
        )
    }

    #[tokio::test]
    async fn test_cache_basic_operations() {
        let cache = DateCache::new();

        assert!(cache.get(day("2024-01-01")).await.is_none());

        cache.put(day("2024-01-01"), ticks(2)).await;
        assert_eq!(cache.get(day("2024-01-01")).await.map(|t| t.len()), Some(2));

        cache.put(day("2024-01-01"), ticks(5)).await;
        assert_eq!(cache.get(day("2024-01-01")).await.map(|t| t.len()), Some(5));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_many_preserves_order() {
        let cache = DateCache::new();
        cache.put(day("2024-01-02"), ticks(1)).await;

        let hits = cache
            .get_many(&[day("2024-01-01"), day("2024-01-02"), day("2024-01-03")])
            .await;

        assert_eq!(
            hits.iter().map(Option::is_some).collect::<Vec<_>>(),
            [false, true, false]
        );
    }

    #[tokio::test]
    async fn test_clones_share_entries() {
        let cache = DateCache::new();
        let shared = cache.clone();

        shared.put(day("2024-03-05"), ticks(0)).await;
        cache.put(day("2024-03-01"), ticks(0)).await;

        assert!(cache.contains(day("2024-03-05")).await);
        assert_eq!(shared.keys().await, ["2024-03-01", "2024-03-05"]);
        assert!(!cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_remove_and_clear_invalidate_days() {
        let cache = DateCache::new();
        cache.put(day("2024-05-01"), ticks(1)).await;
        cache.put(day("2024-05-02"), ticks(1)).await;
        cache.put(day("2024-05-03"), ticks(1)).await;

        let removed = cache.remove(&[day("2024-05-02"), day("2024-05-09")]).await;

        assert_eq!(removed, 1);
        assert_eq!(cache.keys().await, ["2024-05-01", "2024-05-03"]);

        cache.clear().await;
        assert!(cache.is_empty().await);
    }
}
