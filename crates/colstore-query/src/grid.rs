use crate::conditions::{build_time_window, ConditionsError, SearchConditions};
use crate::error::{QueryError, QueryResult};
use crate::session::QuerySession;
use crate::time::YearMonth;
use colstore_columnar::BitVec;
use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

pub const DEFAULT_X_RANGE: RangeInclusive<u32> = 1..=8;
pub const DEFAULT_Y_RANGE: RangeInclusive<u32> = 80..=150;
pub const DEFAULT_MAX_RATIO: f64 = 4725.0;

/// Months allowed for a given `x`.
pub type MonthsFor = Arc<dyn Fn(u32) -> HashSet<YearMonth> + Send + Sync>;

/// Names of the four fields a grid scan reads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridScanFields {
    pub town: String,
    /// `Mon-YY` text.
    pub month: String,
    /// Denominator of the ratio; also compared against `y`.
    pub area: String,
    /// Numerator of the ratio.
    pub price: String,
}

impl Default for GridScanFields {
    fn default() -> Self {
        Self {
            town: "town".to_string(),
            month: "month".to_string(),
            area: "floor_area_sqm".to_string(),
            price: "resale_price".to_string(),
        }
    }
}

/// One `(x, y)` result. `row` and `ratio` are both `None` when no row qualified.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridCell {
    pub x: u32,
    pub y: u32,
    pub row: Option<usize>,
    pub ratio: Option<f64>,
}

impl GridCell {
    pub fn is_match(&self) -> bool {
        self.row.is_some()
    }
}

/// Configuration for a parameter-grid scan.
///
/// For every `x` the selection is narrowed to the allowed towns and to the months
/// `valid_months_for(x)` returns; for every `y` it is further narrowed to rows whose area
/// is at least `y`. Each cell records the selected row with the lowest `price / area`,
/// provided that ratio does not exceed `max_ratio`.
#[derive(Clone)]
pub struct GridScan {
    valid_towns: Vec<String>,
    valid_months_for: MonthsFor,
    xs: Vec<u32>,
    ys: Vec<u32>,
    max_ratio: f64,
    fields: GridScanFields,
}

impl fmt::Debug for GridScan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridScan")
            .field("valid_towns", &self.valid_towns)
            .field("xs", &self.xs)
            .field("ys", &self.ys)
            .field("max_ratio", &self.max_ratio)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

impl GridScan {
    pub fn new<I, S>(
        valid_towns: I,
        valid_months_for: impl Fn(u32) -> HashSet<YearMonth> + Send + Sync + 'static,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            valid_towns: valid_towns.into_iter().map(Into::into).collect(),
            valid_months_for: Arc::new(valid_months_for),
            xs: DEFAULT_X_RANGE.collect(),
            ys: DEFAULT_Y_RANGE.collect(),
            max_ratio: DEFAULT_MAX_RATIO,
            fields: GridScanFields::default(),
        }
    }

    /// A scan over the towns of `conditions`, where `x` is the length in months of a window
    /// starting at its target year and start month.
    pub fn from_conditions(conditions: &SearchConditions) -> Result<Self, ConditionsError> {
        let (year, start_month) = (conditions.target_year, conditions.start_month);
        // Validate once so the per-x window below cannot fail.
        build_time_window(year, start_month, 0)?;
        Ok(Self::new(conditions.towns.iter().cloned(), move |x| {
            build_time_window(year, start_month, x)
                .map(|window| window.into_iter().collect())
                .unwrap_or_default()
        }))
    }

    /// Values of `x` to scan, e.g. `1..=8`. Scanned ascending, duplicates dropped.
    pub fn with_x_range(mut self, xs: impl IntoIterator<Item = u32>) -> Self {
        self.xs = sorted_unique(xs);
        self
    }

    /// Values of `y` to scan, e.g. `80..=150`. Scanned ascending, duplicates dropped.
    pub fn with_y_range(mut self, ys: impl IntoIterator<Item = u32>) -> Self {
        self.ys = sorted_unique(ys);
        self
    }

    pub fn with_max_ratio(mut self, max_ratio: f64) -> Self {
        self.max_ratio = max_ratio;
        self
    }

    pub fn with_fields(mut self, fields: GridScanFields) -> Self {
        self.fields = fields;
        self
    }

    pub fn valid_towns(&self) -> &[String] {
        &self.valid_towns
    }

    pub fn months_for(&self, x: u32) -> HashSet<YearMonth> {
        (self.valid_months_for)(x)
    }

    pub fn x_values(&self) -> &[u32] {
        &self.xs
    }

    pub fn y_values(&self) -> &[u32] {
        &self.ys
    }

    pub fn max_ratio(&self) -> f64 {
        self.max_ratio
    }

    pub fn fields(&self) -> &GridScanFields {
        &self.fields
    }

    /// Number of cells a scan produces.
    pub fn cell_count(&self) -> usize {
        self.xs.len() * self.ys.len()
    }

    fn cell(&self, x: u32, y: u32, row: Option<usize>, ratio: f64) -> GridCell {
        match row {
            Some(row) if ratio <= self.max_ratio => GridCell {
                x,
                y,
                row: Some(row),
                ratio: Some(ratio),
            },
            _ => GridCell {
                x,
                y,
                row: None,
                ratio: None,
            },
        }
    }

    /// Narrow `session` to the town and month filters for `x` and return that mask.
    fn base_mask(&self, session: &mut QuerySession<'_>, x: u32) -> QueryResult<BitVec> {
        let months = self.months_for(x);
        session
            .reset()
            .filter_in(&self.fields.town, &self.valid_towns)?
            .filter_year_months(&self.fields.month, &months)?;
        Ok(session.snapshot())
    }

    /// All cells for one `x`, in ascending `y`. Leaves `session` filtered.
    pub(crate) fn scan_row(
        &self,
        session: &mut QuerySession<'_>,
        x: u32,
        ratios: &[f64],
    ) -> QueryResult<Vec<GridCell>> {
        let base = self.base_mask(session, x)?;
        let mut cells = Vec::with_capacity(self.ys.len());
        for &y in &self.ys {
            session
                .restore(base.clone())?
                .filter_min(&self.fields.area, f64::from(y))?;
            let (row, ratio) = session.min_by(ratios);
            cells.push(self.cell(x, y, row, ratio));
        }
        Ok(cells)
    }

    /// Pre-populate every cache a scan touches.
    #[cfg_attr(not(feature = "parallel"), allow(dead_code))]
    pub(crate) fn warm(&self, session: &mut QuerySession<'_>) -> QueryResult<()> {
        let fields = &self.fields;
        for field in [&fields.town, &fields.month, &fields.area, &fields.price] {
            session.materialize(field)?;
        }
        session.year_months(&fields.month)?;
        session.derived_ratio_column(&fields.price, &fields.area)?;
        Ok(())
    }

    /// Search a single cell from a fresh selection, computing ratios row by row.
    ///
    /// Produces the same cell as the corresponding entry of [`QuerySession::scan_grid`]
    /// without sharing the base mask or the ratio column. `session` is left reset.
    pub fn best_cell(&self, session: &mut QuerySession<'_>, x: u32, y: u32) -> QueryResult<GridCell> {
        let result = self.best_cell_inner(session, x, y);
        session.reset();
        result
    }

    fn best_cell_inner(&self, session: &mut QuerySession<'_>, x: u32, y: u32) -> QueryResult<GridCell> {
        let months = self.months_for(x);
        session
            .reset()
            .filter_in(&self.fields.town, &self.valid_towns)?
            .filter_year_months(&self.fields.month, &months)?
            .filter_min(&self.fields.area, f64::from(y))?;

        let mut best_row = None;
        let mut best = f64::INFINITY;
        for row in session.selected_indices() {
            match session.derived_ratio(&self.fields.price, &self.fields.area, row) {
                Ok(ratio) if ratio.is_finite() && ratio < best => {
                    best = ratio;
                    best_row = Some(row);
                }
                Ok(_)
                | Err(QueryError::InvalidDenominator { .. })
                | Err(QueryError::MalformedValue { .. }) => {}
                Err(err) => return Err(err),
            }
        }
        Ok(self.cell(x, y, best_row, best))
    }
}

fn sorted_unique(values: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut values: Vec<u32> = values.into_iter().collect();
    values.sort_unstable();
    values.dedup();
    values
}

impl QuerySession<'_> {
    /// Evaluate every cell of `scan`, x-major then y ascending.
    ///
    /// The ratio column is computed once and shared by every cell. The session is left
    /// reset, also when the scan fails.
    pub fn scan_grid(&mut self, scan: &GridScan) -> QueryResult<Vec<GridCell>> {
        let result = self.scan_grid_inner(scan);
        self.reset();
        result
    }

    fn scan_grid_inner(&mut self, scan: &GridScan) -> QueryResult<Vec<GridCell>> {
        let fields = scan.fields();
        let ratios = self.derived_ratio_column(&fields.price, &fields.area)?;
        let mut cells = Vec::with_capacity(scan.cell_count());
        for &x in scan.x_values() {
            cells.extend(scan.scan_row(self, x, &ratios)?);
        }
        log::debug!(
            "grid scan over {} produced {} cells ({} matched)",
            self.table().name(),
            cells.len(),
            cells.iter().filter(|c| c.is_match()).count()
        );
        Ok(cells)
    }
}
