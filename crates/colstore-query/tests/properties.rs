#![cfg(not(target_arch = "wasm32"))]

use colstore_columnar::{Column, ColumnType, Table, Value};
use colstore_query::{AggFunc, GridScan, QuerySession, RowPredicate, YearMonth};
use proptest::prelude::*;
use std::collections::HashSet;

const TOWNS: [&str; 3] = ["A", "B", "C"];
const MONTHS: [&str; 4] = ["Jan-15", "Feb-15", "Mar-15", "bad"];

#[derive(Clone, Debug)]
struct Row {
    town: usize,
    month: usize,
    area: i64,
    price: i64,
}

fn arb_row() -> impl Strategy<Value = Row> {
    (0..TOWNS.len(), 0..MONTHS.len(), -5i64..=160, 0i64..=20_000).prop_map(
        |(town, month, area, price)| Row {
            town,
            month,
            area,
            price,
        },
    )
}

fn build_table(rows: &[Row]) -> Table {
    Table::new(
        "prop",
        vec![
            Column::new(
                "town",
                ColumnType::Text,
                rows.iter().map(|r| Value::from(TOWNS[r.town])).collect(),
            ),
            Column::new(
                "month",
                ColumnType::Text,
                rows.iter().map(|r| Value::from(MONTHS[r.month])).collect(),
            ),
            Column::new(
                "floor_area_sqm",
                ColumnType::Integer,
                rows.iter().map(|r| Value::Integer(r.area)).collect(),
            ),
            Column::new(
                "resale_price",
                ColumnType::Integer,
                rows.iter().map(|r| Value::Integer(r.price)).collect(),
            ),
        ],
    )
    .unwrap()
}

fn window(x: u32) -> HashSet<YearMonth> {
    (1..=x.min(3)).map(|m| YearMonth::new(2015, m)).collect()
}

proptest! {
    #[test]
    fn filters_only_narrow_the_selection(
        rows in prop::collection::vec(arb_row(), 0..64),
        town in 0..TOWNS.len(),
        threshold in 0i64..=160,
        price_floor in 0i64..=20_000,
        month in 0..MONTHS.len(),
    ) {
        let table = build_table(&rows);
        let mut session = QuerySession::new(&table);
        prop_assert_eq!(session.selected_indices(), (0..rows.len()).collect::<Vec<_>>());

        let before = session.count();
        session.filter_in("town", [TOWNS[town]]).unwrap();
        let after_town = session.count();
        session.filter_min("floor_area_sqm", threshold as f64).unwrap();
        let after_area = session.count();
        let priced: RowPredicate<'_> =
            &|v: &Value| v.as_f64().is_some_and(|p| p >= price_floor as f64);
        let in_month: RowPredicate<'_> = &|v: &Value| v.as_str() == MONTHS[month];
        session
            .filter_multi(&[("resale_price", priced), ("month", in_month)])
            .unwrap();
        let after_multi = session.count();
        prop_assert!(after_town <= before);
        prop_assert!(after_area <= after_town);
        prop_assert!(after_multi <= after_area);

        let selected = session.selected_indices();
        prop_assert!(selected.windows(2).all(|w| w[0] < w[1]));
        for &row in &selected {
            prop_assert_eq!(rows[row].town, town);
            prop_assert!(rows[row].area >= threshold);
            prop_assert!(rows[row].price >= price_floor);
            prop_assert_eq!(rows[row].month, month);
        }

        session.reset();
        prop_assert_eq!(session.selected_indices(), (0..rows.len()).collect::<Vec<_>>());
        prop_assert_eq!(
            session.aggregate(AggFunc::Count, "resale_price").unwrap(),
            Value::Integer(rows.len() as i64)
        );
    }

    #[test]
    fn min_by_picks_the_first_minimum(
        rows in prop::collection::vec(arb_row(), 1..64),
    ) {
        let table = build_table(&rows);
        let mut session = QuerySession::new(&table);
        let ratios = session.derived_ratio_column("resale_price", "floor_area_sqm").unwrap();
        let (best, ratio) = session.min_by(&ratios);

        let expected = ratios
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_finite())
            .fold(None, |acc: Option<(usize, f64)>, (i, &r)| match acc {
                Some((_, best)) if best <= r => acc,
                _ => Some((i, r)),
            });
        prop_assert_eq!(best, expected.map(|(i, _)| i));
        prop_assert_eq!(ratio, expected.map_or(f64::INFINITY, |(_, r)| r));
    }

    #[test]
    fn grid_scan_equals_cell_by_cell_search(
        rows in prop::collection::vec(arb_row(), 0..48),
        max_ratio in 50.0f64..5000.0,
    ) {
        let table = build_table(&rows);
        let scan = GridScan::new(["A", "C"], window)
            .with_x_range(1..=3)
            .with_y_range([0, 40, 80, 120])
            .with_max_ratio(max_ratio);

        let mut session = QuerySession::new(&table);
        let cells = session.scan_grid(&scan).unwrap();
        prop_assert_eq!(cells.len(), 12);

        let mut reference = QuerySession::new(&table);
        for cell in &cells {
            prop_assert_eq!(scan.best_cell(&mut reference, cell.x, cell.y).unwrap(), *cell);
        }

        #[cfg(feature = "parallel")]
        prop_assert_eq!(scan.scan_parallel(&table).unwrap(), cells);
    }
}
