//! Query engine over colstore tables.
//!
//! A [`QuerySession`] pairs an immutable [`colstore_columnar::Table`] with a row-selection
//! bitmap and a per-session column cache. Filters narrow the bitmap, aggregates read the
//! selected rows, and [`GridScan`] drives the filters across a two-parameter grid.

#![forbid(unsafe_code)]

mod aggregate;
mod cache;
mod conditions;
mod error;
mod grid;
#[cfg(feature = "parallel")]
mod parallel;
mod session;
mod time;

pub use crate::aggregate::AggFunc;
pub use crate::cache::{CacheStats, ColumnCache};
pub use crate::conditions::{build_time_window, ConditionsError, SearchConditions, DIGIT_TOWNS};
pub use crate::error::{QueryError, QueryResult};
pub use crate::grid::{
    GridCell, GridScan, GridScanFields, MonthsFor, DEFAULT_MAX_RATIO, DEFAULT_X_RANGE,
    DEFAULT_Y_RANGE,
};
pub use crate::session::{normalize_key, QuerySession, RowPredicate};
pub use crate::time::YearMonth;
