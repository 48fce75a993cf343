use colstore_columnar::{Column, ColumnType, Table, Value};
use colstore_query::{
    GridCell, GridScan, GridScanFields, QuerySession, SearchConditions, YearMonth,
    DEFAULT_MAX_RATIO,
};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn text(values: &[&str]) -> Vec<Value> {
    values.iter().map(|v| Value::from(*v)).collect()
}

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::Integer).collect()
}

/// The four-row worked example: towns A/B, every sale in January 2015.
fn small_table() -> Table {
    Table::new(
        "small",
        vec![
            Column::new("town", ColumnType::Text, text(&["A", "B", "A", "A"])),
            Column::new(
                "month",
                ColumnType::Text,
                text(&["Jan-15", "Jan-15", "Jan-15", "Jan-15"]),
            ),
            Column::new("floor_area_sqm", ColumnType::Integer, ints(&[80, 90, 85, 120])),
            Column::new(
                "resale_price",
                ColumnType::Integer,
                ints(&[8000, 9900, 8925, 13200]),
            ),
        ],
    )
    .unwrap()
}

fn january_2015(_x: u32) -> HashSet<YearMonth> {
    HashSet::from([YearMonth::new(2015, 1)])
}

/// Sales spread across months and towns, including malformed rows.
fn resale_table() -> Table {
    let towns = [
        "BEDOK", "CLEMENTI", "BEDOK", "YISHUN", "clementi ", "BEDOK", "BEDOK", "CLEMENTI",
        "BEDOK", "HOUGANG",
    ];
    let months = [
        "Jan-15", "Jan-15", "Feb-15", "Feb-15", "Mar-15", "Mar-15", "Apr-15", "???", "Dec-15",
        "Jan-15",
    ];
    let areas = [
        Value::Real(67.0),
        Value::Real(92.0),
        Value::Real(110.0),
        Value::Real(100.0),
        Value::Real(85.0),
        Value::Real(0.0),
        Value::Real(150.0),
        Value::Real(120.0),
        Value::from("n/a"),
        Value::Real(95.0),
    ];
    let prices = [
        300_000, 410_000, 460_000, 380_000, 350_000, 200_000, 700_000, 390_000, 500_000, 280_000,
    ];

    Table::new(
        "resale",
        vec![
            Column::new("town", ColumnType::Text, text(&towns)),
            Column::new("month", ColumnType::Text, text(&months)),
            Column::new("floor_area_sqm", ColumnType::Real, areas.to_vec()),
            Column::new("resale_price", ColumnType::Integer, ints(&prices)),
        ],
    )
    .unwrap()
}

fn resale_scan() -> GridScan {
    let conditions = SearchConditions {
        identifier: "test".to_string(),
        towns: vec!["BEDOK".to_string(), "CLEMENTI".to_string()],
        target_year: 2015,
        start_month: 1,
    };
    GridScan::from_conditions(&conditions)
        .unwrap()
        .with_x_range(1..=4)
        .with_y_range([60, 80, 90, 100, 110, 140, 160])
}

#[test]
fn worked_example_produces_x_major_cells() {
    let table = small_table();
    let scan = GridScan::new(["A"], january_2015)
        .with_x_range([1, 2])
        .with_y_range([80, 90]);

    let mut session = QuerySession::new(&table);
    let cells = session.scan_grid(&scan).unwrap();

    let best_80 = Some(0);
    let best_90 = Some(3);
    assert_eq!(
        cells,
        vec![
            GridCell { x: 1, y: 80, row: best_80, ratio: Some(100.0) },
            GridCell { x: 1, y: 90, row: best_90, ratio: Some(110.0) },
            GridCell { x: 2, y: 80, row: best_80, ratio: Some(100.0) },
            GridCell { x: 2, y: 90, row: best_90, ratio: Some(110.0) },
        ]
    );
    assert_eq!(session.selected_indices(), vec![0, 1, 2, 3]);
}

#[test]
fn default_grid_has_eight_by_seventy_one_cells() {
    let table = small_table();
    let scan = GridScan::new(["A"], january_2015);
    assert_eq!(scan.max_ratio(), DEFAULT_MAX_RATIO);
    assert_eq!(scan.fields(), &GridScanFields::default());

    let mut session = QuerySession::new(&table);
    let cells = session.scan_grid(&scan).unwrap();
    assert_eq!(cells.len(), 8 * 71);
    assert_eq!(cells.len(), scan.cell_count());

    let order: Vec<(u32, u32)> = cells.iter().map(|c| (c.x, c.y)).collect();
    let mut sorted = order.clone();
    sorted.sort();
    assert_eq!(order, sorted);
    assert_eq!(order.first(), Some(&(1, 80)));
    assert_eq!(order.last(), Some(&(8, 150)));
}

#[test]
fn cells_above_max_ratio_are_reported_as_no_match() {
    let table = small_table();
    let scan = GridScan::new(["A"], january_2015)
        .with_x_range([1])
        .with_y_range([80, 90])
        .with_max_ratio(105.0);

    let mut session = QuerySession::new(&table);
    let cells = session.scan_grid(&scan).unwrap();
    assert_eq!(cells[0].row, Some(0));
    assert_eq!(cells[1], GridCell { x: 1, y: 90, row: None, ratio: None });
}

#[test]
fn each_field_is_read_once_per_scan() {
    let table = resale_table();
    let scan = resale_scan();
    let mut session = QuerySession::new(&table);

    session.scan_grid(&scan).unwrap();
    assert_eq!(session.cache_stats().misses, 4);

    session.scan_grid(&scan).unwrap();
    assert_eq!(session.cache_stats().misses, 4);
}

#[test]
fn month_window_grows_with_x() {
    let table = resale_table();
    let scan = resale_scan();
    let mut session = QuerySession::new(&table);
    let cells = session.scan_grid(&scan).unwrap();

    let cell = |x: u32, y: u32| {
        *cells
            .iter()
            .find(|c| c.x == x && c.y == y)
            .expect("cell present")
    };

    // January only: BEDOK 67 sqm and CLEMENTI 92 sqm; HOUGANG is not an allowed town.
    assert_eq!(cell(1, 60).row, Some(1));
    assert_eq!(cell(1, 80).row, Some(1));
    assert_eq!(cell(1, 100).row, None);
    // Through March: row 4 ("clementi ") qualifies after normalization; row 5's zero
    // area never does.
    assert_eq!(cell(3, 80).row, Some(4));
    assert_eq!(cell(3, 110).row, Some(2));
    // April adds the 150 sqm sale.
    assert_eq!(cell(4, 140).row, Some(6));
    assert_eq!(cell(4, 160).row, None);
}

#[test]
fn scan_grid_matches_single_cell_search() {
    let table = resale_table();
    let scan = resale_scan();
    let mut session = QuerySession::new(&table);
    let cells = session.scan_grid(&scan).unwrap();

    let mut reference = QuerySession::new(&table);
    for cell in &cells {
        assert_eq!(&scan.best_cell(&mut reference, cell.x, cell.y).unwrap(), cell);
    }
    assert_eq!(reference.count(), table.row_count());
}

#[cfg(feature = "parallel")]
#[test]
fn parallel_scan_matches_sequential_scan() {
    let table = resale_table();
    let scan = resale_scan();
    let mut session = QuerySession::new(&table);
    let sequential = session.scan_grid(&scan).unwrap();
    assert_eq!(scan.scan_parallel(&table).unwrap(), sequential);
}

#[test]
fn custom_field_names_are_honoured() {
    let table = Table::new(
        "t",
        vec![
            Column::new("district", ColumnType::Text, text(&["A", "A"])),
            Column::new("sold", ColumnType::Text, text(&["Jan-15", "Jan-15"])),
            Column::new("sqm", ColumnType::Integer, ints(&[100, 50])),
            Column::new("price", ColumnType::Integer, ints(&[1000, 400])),
        ],
    )
    .unwrap();
    let scan = GridScan::new(["A"], january_2015)
        .with_x_range([1])
        .with_y_range([40])
        .with_fields(GridScanFields {
            town: "district".to_string(),
            month: "sold".to_string(),
            area: "sqm".to_string(),
            price: "price".to_string(),
        });

    let mut session = QuerySession::new(&table);
    let cells = session.scan_grid(&scan).unwrap();
    assert_eq!(
        cells,
        vec![GridCell { x: 1, y: 40, row: Some(1), ratio: Some(8.0) }]
    );
}

#[test]
fn missing_field_fails_and_leaves_session_reset() {
    let table = small_table();
    let scan = GridScan::new(["A"], january_2015).with_fields(GridScanFields {
        town: "district".to_string(),
        ..GridScanFields::default()
    });
    let mut session = QuerySession::new(&table);
    assert!(session.scan_grid(&scan).is_err());
    assert_eq!(session.count(), table.row_count());
}
