use crate::error::{QueryError, QueryResult};
use crate::session::QuerySession;
use colstore_columnar::Value;
use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggFunc {
    Sum,
    Avg,
    Min,
    Max,
    Count,
}

impl AggFunc {
    pub fn as_str(self) -> &'static str {
        match self {
            AggFunc::Sum => "sum",
            AggFunc::Avg => "avg",
            AggFunc::Min => "min",
            AggFunc::Max => "max",
            AggFunc::Count => "count",
        }
    }
}

impl fmt::Display for AggFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggFunc {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(AggFunc::Sum),
            "avg" => Ok(AggFunc::Avg),
            "min" => Ok(AggFunc::Min),
            "max" => Ok(AggFunc::Max),
            "count" => Ok(AggFunc::Count),
            _ => Err(QueryError::UnknownAggregation(s.to_string())),
        }
    }
}

/// Running sum that stays integral until a real value or an overflow forces a float.
struct SumAccumulator {
    int: Option<i64>,
    real: f64,
    integral: bool,
    count: usize,
}

impl SumAccumulator {
    fn new() -> Self {
        Self {
            int: Some(0),
            real: 0.0,
            integral: true,
            count: 0,
        }
    }

    fn push(&mut self, value: &Value) -> bool {
        match value {
            Value::Integer(v) => {
                self.int = self.int.and_then(|acc| acc.checked_add(*v));
                self.real += *v as f64;
            }
            other => match other.as_f64() {
                Some(v) => {
                    self.integral = false;
                    self.real += v;
                }
                None => return false,
            },
        }
        self.count += 1;
        true
    }

    fn total(&self) -> Value {
        match self.int {
            Some(total) if self.integral => Value::Integer(total),
            _ => Value::Real(self.real),
        }
    }
}

impl QuerySession<'_> {
    /// Values of `field` for the selected rows, in row order.
    pub fn fetch(&mut self, field: &str) -> QueryResult<Vec<Value>> {
        let values = self.materialize(field)?;
        Ok(self
            .mask()
            .iter_ones()
            .map(|row| values[row].clone())
            .collect())
    }

    /// Selected rows as field maps. `None` fetches every table field.
    pub fn fetch_rows(&mut self, fields: Option<&[&str]>) -> QueryResult<Vec<BTreeMap<String, Value>>> {
        let names: Vec<String> = match fields {
            Some(fields) => fields.iter().map(|f| f.to_string()).collect(),
            None => self
                .table()
                .column_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        };

        let mut columns = Vec::with_capacity(names.len());
        for name in &names {
            columns.push(self.materialize(name)?);
        }

        Ok(self
            .mask()
            .iter_ones()
            .map(|row| {
                names
                    .iter()
                    .zip(&columns)
                    .map(|(name, values)| (name.clone(), values[row].clone()))
                    .collect()
            })
            .collect())
    }

    /// `transform` applied to each selected value of `field`, in row order.
    pub fn fetch_computed<T>(
        &mut self,
        field: &str,
        mut transform: impl FnMut(&Value) -> T,
    ) -> QueryResult<Vec<T>> {
        let values = self.materialize(field)?;
        Ok(self
            .mask()
            .iter_ones()
            .map(|row| transform(&values[row]))
            .collect())
    }

    /// Aggregate `field` over the selected rows.
    ///
    /// Values that are not numeric are skipped by `sum`, `avg` and by `min`/`max` on
    /// numeric columns. `count` counts selected rows and is `0` on an empty selection;
    /// every other function fails with [`QueryError::EmptySelection`] when nothing is left.
    pub fn aggregate(&mut self, func: AggFunc, field: &str) -> QueryResult<Value> {
        let values = self.materialize(field)?;
        let column_type = self.table().get(field)?.column_type();
        let selected = self.mask().iter_ones().map(|row| &values[row]);

        let empty = || QueryError::EmptySelection {
            func: func.to_string(),
            field: field.to_string(),
        };

        let mut skipped = 0usize;
        let result = match func {
            AggFunc::Count => Some(Value::Integer(self.count() as i64)),
            AggFunc::Sum | AggFunc::Avg => {
                let mut acc = SumAccumulator::new();
                for value in selected {
                    if !acc.push(value) {
                        skipped += 1;
                    }
                }
                match (func, acc.count) {
                    (_, 0) => None,
                    (AggFunc::Sum, _) => Some(acc.total()),
                    _ => Some(Value::Real(acc.real / acc.count as f64)),
                }
            }
            AggFunc::Min | AggFunc::Max if column_type.is_numeric() => {
                let mut best: Option<(&Value, OrderedFloat<f64>)> = None;
                for value in selected {
                    let Some(v) = value.as_f64() else {
                        skipped += 1;
                        continue;
                    };
                    let v = OrderedFloat(v);
                    let better = match best {
                        None => true,
                        Some((_, current)) if func == AggFunc::Min => v < current,
                        Some((_, current)) => v > current,
                    };
                    if better {
                        best = Some((value, v));
                    }
                }
                best.map(|(value, _)| value.clone())
            }
            AggFunc::Min | AggFunc::Max => {
                let mut best: Option<(&Value, String)> = None;
                for value in selected {
                    let text = value.as_str().into_owned();
                    let better = match &best {
                        None => true,
                        Some((_, current)) if func == AggFunc::Min => text < *current,
                        Some((_, current)) => text > *current,
                    };
                    if better {
                        best = Some((value, text));
                    }
                }
                best.map(|(value, _)| value.clone())
            }
        };

        if skipped > 0 {
            log::debug!("{func}({field}): skipped {skipped} non-numeric value(s)");
        }
        result.ok_or_else(empty)
    }

    /// `numerator / denominator` for a single row.
    pub fn derived_ratio(&mut self, numerator: &str, denominator: &str, row: usize) -> QueryResult<f64> {
        let rows = self.row_count();
        if row >= rows {
            return Err(QueryError::RowOutOfBounds { row, rows });
        }

        let num = self.materialize(numerator)?;
        let den = self.materialize(denominator)?;
        let malformed = |field: &str| QueryError::MalformedValue {
            field: field.to_string(),
            row,
        };

        let d = den[row].as_f64().ok_or_else(|| malformed(denominator))?;
        if d.is_nan() || d <= 0.0 {
            return Err(QueryError::InvalidDenominator {
                field: denominator.to_string(),
                row,
                value: d,
            });
        }
        let n = num[row].as_f64().ok_or_else(|| malformed(numerator))?;
        Ok(n / d)
    }

    /// `numerator / denominator` for every row, computed once per session.
    ///
    /// Rows where the ratio cannot be formed (non-positive or non-numeric denominator,
    /// non-numeric numerator, non-finite result) hold `f64::INFINITY`, so they never win
    /// [`QuerySession::min_by`].
    pub fn derived_ratio_column(&mut self, numerator: &str, denominator: &str) -> QueryResult<Arc<[f64]>> {
        if let Some(ratios) = self.cache().ratio(numerator, denominator) {
            return Ok(ratios);
        }

        let num = self.materialize(numerator)?;
        let den = self.materialize(denominator)?;
        let ratios: Arc<[f64]> = num
            .iter()
            .zip(den.iter())
            .map(|(n, d)| match (n.as_f64(), d.as_f64()) {
                (Some(n), Some(d)) if d > 0.0 => {
                    let ratio = n / d;
                    if ratio.is_finite() {
                        ratio
                    } else {
                        f64::INFINITY
                    }
                }
                _ => f64::INFINITY,
            })
            .collect();

        let infeasible = ratios.iter().filter(|r| r.is_infinite()).count();
        if infeasible > 0 {
            log::debug!("{numerator}/{denominator}: {infeasible} infeasible row(s)");
        }
        self.cache_mut()
            .insert_ratio(numerator, denominator, Arc::clone(&ratios));
        Ok(ratios)
    }

    /// The selected row with the smallest ratio and that ratio.
    ///
    /// Comparison is strict, so the lowest row id wins ties and a selection holding only
    /// infinite ratios yields `(None, f64::INFINITY)`.
    pub fn min_by(&self, ratios: &[f64]) -> (Option<usize>, f64) {
        let mut best_row = None;
        let mut best = f64::INFINITY;
        for row in self.mask().iter_ones() {
            let Some(&ratio) = ratios.get(row) else {
                break;
            };
            if ratio < best {
                best = ratio;
                best_row = Some(row);
            }
        }
        (best_row, best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agg_func_parses_case_insensitively() {
        assert_eq!(" AVG ".parse::<AggFunc>().unwrap(), AggFunc::Avg);
        assert!(matches!(
            "median".parse::<AggFunc>(),
            Err(QueryError::UnknownAggregation(ref s)) if s == "median"
        ));
    }

    #[test]
    fn sum_falls_back_to_real_on_overflow() {
        let mut acc = SumAccumulator::new();
        acc.push(&Value::Integer(i64::MAX));
        acc.push(&Value::Integer(1));
        assert_eq!(acc.total(), Value::Real(i64::MAX as f64 + 1.0));
    }

    #[test]
    fn sum_skips_text_that_is_not_numeric() {
        let mut acc = SumAccumulator::new();
        assert!(acc.push(&Value::Integer(2)));
        assert!(!acc.push(&Value::from("n/a")));
        assert!(acc.push(&Value::from("1.5")));
        assert_eq!(acc.count, 2);
        assert_eq!(acc.total(), Value::Real(3.5));
    }
}
