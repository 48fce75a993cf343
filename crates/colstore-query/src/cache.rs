use crate::error::QueryResult;
use crate::time::YearMonth;
use colstore_columnar::{Table, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Counters for [`ColumnCache::materialize`]. Every miss is one full column read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Per-session cache of materialized columns and values derived from them.
///
/// Tables are immutable, so nothing in here ever needs invalidating while the table is
/// alive; [`ColumnCache::clear`] exists only to release memory.
#[derive(Clone, Debug, Default)]
pub struct ColumnCache {
    columns: HashMap<String, Arc<[Value]>>,
    ratios: HashMap<(String, String), Arc<[f64]>>,
    months: HashMap<String, Arc<[Option<YearMonth>]>>,
    stats: CacheStats,
}

impl ColumnCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the full value array for `field`, reading the column on first use only.
    pub fn materialize(&mut self, table: &Table, field: &str) -> QueryResult<Arc<[Value]>> {
        if let Some(values) = self.columns.get(field) {
            self.stats.hits += 1;
            return Ok(Arc::clone(values));
        }

        let values = table.get(field)?.scan();
        self.stats.misses += 1;
        log::debug!(
            "materialized {}.{field} ({} rows)",
            table.name(),
            values.len()
        );
        self.columns.insert(field.to_string(), Arc::clone(&values));
        Ok(values)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub(crate) fn ratio(&self, numerator: &str, denominator: &str) -> Option<Arc<[f64]>> {
        self.ratios
            .get(&(numerator.to_string(), denominator.to_string()))
            .cloned()
    }

    pub(crate) fn insert_ratio(&mut self, numerator: &str, denominator: &str, ratios: Arc<[f64]>) {
        self.ratios
            .insert((numerator.to_string(), denominator.to_string()), ratios);
    }

    pub(crate) fn months(&self, field: &str) -> Option<Arc<[Option<YearMonth>]>> {
        self.months.get(field).cloned()
    }

    pub(crate) fn insert_months(&mut self, field: &str, months: Arc<[Option<YearMonth>]>) {
        self.months.insert(field.to_string(), months);
    }

    /// Drop every cached array. Counters are kept.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.ratios.clear();
        self.months.clear();
    }
}
