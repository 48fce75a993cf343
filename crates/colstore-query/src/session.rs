use crate::cache::{CacheStats, ColumnCache};
use crate::error::{QueryError, QueryResult};
use crate::time::YearMonth;
use colstore_columnar::{BitVec, Table, Value};
use std::collections::HashSet;
use std::sync::Arc;

/// A row predicate used by [`QuerySession::filter_multi`].
pub type RowPredicate<'a> = &'a dyn Fn(&Value) -> bool;

/// A query over one immutable [`Table`]: a row-selection mask plus a column cache.
///
/// Filters only ever narrow the mask. Callers widen it again with [`QuerySession::reset`]
/// or by restoring an earlier [`QuerySession::snapshot`].
///
/// Cloning a session is cheap; cached arrays are shared through `Arc`.
#[derive(Clone, Debug)]
pub struct QuerySession<'t> {
    table: &'t Table,
    mask: BitVec,
    cache: ColumnCache,
}

/// Uppercase after trimming surrounding whitespace. Used for set-membership filters.
pub fn normalize_key(value: &str) -> String {
    value.trim().to_uppercase()
}

impl<'t> QuerySession<'t> {
    pub fn new(table: &'t Table) -> Self {
        Self {
            table,
            mask: BitVec::with_len_all_true(table.row_count()),
            cache: ColumnCache::new(),
        }
    }

    pub fn table(&self) -> &'t Table {
        self.table
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Full value array for `field`; the column is read at most once per session.
    pub fn materialize(&mut self, field: &str) -> QueryResult<Arc<[Value]>> {
        self.cache.materialize(self.table, field)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub(crate) fn cache(&self) -> &ColumnCache {
        &self.cache
    }

    pub(crate) fn cache_mut(&mut self) -> &mut ColumnCache {
        &mut self.cache
    }

    /// Keep only selected rows whose `field` value satisfies `predicate`.
    pub fn filter(
        &mut self,
        field: &str,
        mut predicate: impl FnMut(&Value) -> bool,
    ) -> QueryResult<&mut Self> {
        let values = self.materialize(field)?;
        self.mask.retain(|row| predicate(&values[row]));
        Ok(self)
    }

    /// Keep only selected rows whose `field` value is one of `allowed`.
    ///
    /// Both sides are compared after [`normalize_key`], so `" bedok"` matches `"BEDOK"`.
    pub fn filter_in<I, S>(&mut self, field: &str, allowed: I) -> QueryResult<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed: HashSet<String> = allowed
            .into_iter()
            .map(|s| normalize_key(s.as_ref()))
            .collect();
        let values = self.materialize(field)?;
        self.mask
            .retain(|row| allowed.contains(&normalize_key(&values[row].as_str())));
        Ok(self)
    }

    /// Apply several field predicates in a single pass over the selection.
    ///
    /// Every field is materialized before any bit changes; the result equals calling
    /// [`QuerySession::filter`] once per entry.
    pub fn filter_multi(&mut self, filters: &[(&str, RowPredicate<'_>)]) -> QueryResult<&mut Self> {
        let mut columns = Vec::with_capacity(filters.len());
        for (field, _) in filters {
            columns.push(self.materialize(field)?);
        }
        self.mask.retain(|row| {
            filters
                .iter()
                .zip(&columns)
                .all(|((_, predicate), values)| predicate(&values[row]))
        });
        Ok(self)
    }

    /// Keep only selected rows whose numeric `field` value is at least `threshold`.
    ///
    /// Non-numeric values never qualify.
    pub fn filter_min(&mut self, field: &str, threshold: f64) -> QueryResult<&mut Self> {
        let values = self.materialize(field)?;
        let mut malformed = 0usize;
        self.mask.retain(|row| match values[row].as_f64() {
            Some(v) => v >= threshold,
            None => {
                malformed += 1;
                false
            }
        });
        if malformed > 0 {
            log::debug!("filter_min({field}): dropped {malformed} non-numeric row(s)");
        }
        Ok(self)
    }

    /// Keep only selected rows whose `Mon-YY` `field` value falls in `months`.
    ///
    /// Unparsable values never qualify.
    pub fn filter_year_months(
        &mut self,
        field: &str,
        months: &HashSet<YearMonth>,
    ) -> QueryResult<&mut Self> {
        let parsed = self.year_months(field)?;
        self.mask
            .retain(|row| parsed[row].is_some_and(|month| months.contains(&month)));
        Ok(self)
    }

    /// Parsed `Mon-YY` values for every row of `field`, `None` where parsing failed.
    pub fn year_months(&mut self, field: &str) -> QueryResult<Arc<[Option<YearMonth>]>> {
        if let Some(months) = self.cache.months(field) {
            return Ok(months);
        }

        let values = self.materialize(field)?;
        let months: Arc<[Option<YearMonth>]> = values
            .iter()
            .map(|value| YearMonth::parse(&value.as_str()).ok())
            .collect();
        let unparsable = months.iter().filter(|m| m.is_none()).count();
        if unparsable > 0 {
            log::debug!("{field}: {unparsable} value(s) are not Mon-YY months");
        }
        self.cache.insert_months(field, Arc::clone(&months));
        Ok(months)
    }

    /// Select every row again. Cached columns are kept.
    pub fn reset(&mut self) -> &mut Self {
        self.mask.fill();
        self
    }

    /// Select every row again and drop every cached array.
    pub fn reset_all(&mut self) -> &mut Self {
        self.mask.fill();
        self.cache.clear();
        self
    }

    pub fn count(&self) -> usize {
        self.mask.count_ones()
    }

    /// Selected row ids, strictly ascending.
    pub fn selected_indices(&self) -> Vec<usize> {
        self.mask.iter_ones().collect()
    }

    pub fn mask(&self) -> &BitVec {
        &self.mask
    }

    /// An independent copy of the current mask.
    pub fn snapshot(&self) -> BitVec {
        self.mask.clone()
    }

    /// Replace the mask, e.g. with an earlier [`QuerySession::snapshot`].
    pub fn restore(&mut self, mask: BitVec) -> QueryResult<&mut Self> {
        if mask.len() != self.row_count() {
            return Err(QueryError::MaskLengthMismatch {
                expected: self.row_count(),
                actual: mask.len(),
            });
        }
        self.mask = mask;
        Ok(self)
    }
}
