use crate::error::QueryResult;
use crate::grid::{GridCell, GridScan};
use crate::session::QuerySession;
use colstore_columnar::Table;

#[cfg(not(target_arch = "wasm32"))]
use rayon::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use rayon::ThreadPool;
#[cfg(not(target_arch = "wasm32"))]
use std::num::NonZeroUsize;
#[cfg(not(target_arch = "wasm32"))]
use std::sync::OnceLock;

/// Pool shared by every grid scan in the process.
///
/// `None` records that no pool could be built, so later scans go straight to the sequential
/// path instead of retrying.
#[cfg(not(target_arch = "wasm32"))]
static SCAN_POOL: OnceLock<Option<ThreadPool>> = OnceLock::new();

/// Worker count for the scan pool: `RAYON_NUM_THREADS` when set to a positive number,
/// otherwise the available parallelism.
#[cfg(not(target_arch = "wasm32"))]
fn scan_threads() -> NonZeroUsize {
    std::env::var("RAYON_NUM_THREADS")
        .ok()
        .and_then(|s| s.trim().parse::<NonZeroUsize>().ok())
        .or_else(|| std::thread::available_parallelism().ok())
        .unwrap_or(NonZeroUsize::MIN)
}

#[cfg(not(target_arch = "wasm32"))]
fn scan_pool() -> Option<&'static ThreadPool> {
    SCAN_POOL
        .get_or_init(|| {
            let threads = scan_threads().get();
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .thread_name(|i| format!("colstore-scan-{i}"))
                .build();
            match pool {
                Ok(pool) => {
                    log::debug!("grid scan pool ready with {threads} threads");
                    Some(pool)
                }
                Err(err) => {
                    log::warn!("no grid scan pool ({err}); scans run sequentially");
                    None
                }
            }
        })
        .as_ref()
}

impl GridScan {
    /// Same cells as [`QuerySession::scan_grid`], with the `x` loop spread over a thread pool.
    ///
    /// A session is warmed once (columns, parsed months, ratio column) and each worker scans
    /// its rows on a clone of it, so no column is read more than once overall. Runs
    /// sequentially when no pool is available.
    pub fn scan_parallel(&self, table: &Table) -> QueryResult<Vec<GridCell>> {
        let mut session = QuerySession::new(table);
        self.warm(&mut session)?;
        let fields = self.fields();
        let ratios = session.derived_ratio_column(&fields.price, &fields.area)?;

        match self.scan_on_pool(&session, &ratios) {
            Some(cells) => cells,
            None => session.scan_grid(self),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn scan_on_pool(
        &self,
        warmed: &QuerySession<'_>,
        ratios: &[f64],
    ) -> Option<QueryResult<Vec<GridCell>>> {
        let pool = scan_pool()?;
        let rows: QueryResult<Vec<Vec<GridCell>>> = pool.install(|| {
            self.x_values()
                .par_iter()
                .map_init(
                    || warmed.clone(),
                    |worker, &x| self.scan_row(worker, x, ratios),
                )
                .collect()
        });
        Some(rows.map(|rows| rows.into_iter().flatten().collect()))
    }

    #[cfg(target_arch = "wasm32")]
    fn scan_on_pool(
        &self,
        _warmed: &QuerySession<'_>,
        _ratios: &[f64],
    ) -> Option<QueryResult<Vec<GridCell>>> {
        None
    }
}
