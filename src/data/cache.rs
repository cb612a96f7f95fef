use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::loader::{self, TableSource};
use super::model::Table;
use super::registry::DatasetId;
use crate::error::DashboardError;

/// Identifies one interactive session. Tables are cached per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    /// A session id not handed out before in this process.
    pub fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        SessionId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

// ---------------------------------------------------------------------------
// Session-scoped table cache
// ---------------------------------------------------------------------------

/// Loaded tables keyed by (session, dataset).
///
/// Each entry is written once, on the first successful load, and read until
/// it is invalidated. Failed loads leave no entry so the next call retries.
#[derive(Debug, Default)]
pub struct TableCache {
    tables: HashMap<(SessionId, DatasetId), Arc<Table>>,
}

impl TableCache {
    pub fn get(&self, session: SessionId, dataset: DatasetId) -> Option<Arc<Table>> {
        self.tables.get(&(session, dataset)).cloned()
    }

    /// Return the cached table, reading it from `source` on a miss.
    pub fn load(
        &mut self,
        session: SessionId,
        dataset: DatasetId,
        source: &dyn TableSource,
    ) -> Result<Arc<Table>, DashboardError> {
        if let Some(table) = self.get(session, dataset) {
            log::debug!("{dataset}: cache hit");
            return Ok(table);
        }

        let table = Arc::new(loader::load(dataset.def(), source)?);
        log::info!(
            "{dataset}: loaded {} rows with columns {:?}",
            table.len(),
            table.columns().iter().map(|c| &c.name).collect::<Vec<_>>()
        );
        self.tables.insert((session, dataset), Arc::clone(&table));
        Ok(table)
    }

    /// Drop one entry. Returns whether it was cached.
    pub fn invalidate(&mut self, session: SessionId, dataset: DatasetId) -> bool {
        self.tables.remove(&(session, dataset)).is_some()
    }

    /// Drop every entry of a session. Returns how many were dropped.
    pub fn invalidate_session(&mut self, session: SessionId) -> usize {
        let before = self.tables.len();
        self.tables.retain(|(s, _), _| *s != session);
        before - self.tables.len()
    }

    /// Drop every entry of every session.
    pub fn clear(&mut self) {
        self.tables.clear();
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::MemorySource;

    #[test]
    fn second_load_is_served_from_cache() {
        let source = MemorySource::with_fixtures();
        let mut cache = TableCache::default();
        let session = SessionId::fresh();

        let first = cache.load(session, DatasetId::VideoGameSales, &source).unwrap();
        let second = cache.load(session, DatasetId::VideoGameSales, &source).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(source.reads(), 1);
    }

    #[test]
    fn invalidation_forces_a_reread() {
        let source = MemorySource::with_fixtures();
        let mut cache = TableCache::default();
        let session = SessionId::fresh();

        let first = cache.load(session, DatasetId::EvSales, &source).unwrap();
        assert!(cache.invalidate(session, DatasetId::EvSales));
        assert!(!cache.invalidate(session, DatasetId::EvSales));

        let second = cache.load(session, DatasetId::EvSales, &source).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(*first, *second);
        assert_eq!(source.reads(), 2);
    }

    #[test]
    fn sessions_do_not_share_entries() {
        let source = MemorySource::with_fixtures();
        let mut cache = TableCache::default();
        let (a, b) = (SessionId::fresh(), SessionId::fresh());
        assert_ne!(a, b);

        cache.load(a, DatasetId::CouplesSurvey, &source).unwrap();
        cache.load(b, DatasetId::CouplesSurvey, &source).unwrap();
        cache.load(a, DatasetId::EvSales, &source).unwrap();
        assert_eq!(source.reads(), 3);
        assert_eq!(cache.len(), 3);

        assert_eq!(cache.invalidate_session(a), 2);
        assert!(cache.get(b, DatasetId::CouplesSurvey).is_some());
        assert!(cache.get(a, DatasetId::CouplesSurvey).is_none());

        cache.load(a, DatasetId::EvSales, &source).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn failed_loads_are_not_cached() {
        let source = MemorySource::with_fixtures().without("vgsales.csv");
        let mut cache = TableCache::default();
        let session = SessionId::fresh();

        for _ in 0..2 {
            let err = cache
                .load(session, DatasetId::VideoGameSales, &source)
                .unwrap_err();
            assert!(matches!(err, DashboardError::DataUnavailable { .. }));
        }
        assert_eq!(source.reads(), 2);
        assert!(cache.is_empty());

        // Other datasets are unaffected.
        assert!(cache.load(session, DatasetId::EvSales, &source).is_ok());
    }
}
