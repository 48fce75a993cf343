#![no_main]

use colstore_columnar::{import_csv, CsvOptions, Value};
use colstore_query::{AggFunc, QuerySession};
use libfuzzer_sys::fuzz_target;

/// Avoid spending fuzz time on huge inputs; the interesting cases are small.
const MAX_INPUT_BYTES: usize = 64 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }
    let data = if data.len() > MAX_INPUT_BYTES {
        &data[..MAX_INPUT_BYTES]
    } else {
        data
    };

    let options = CsvOptions {
        has_header: data[0] & 1 == 0,
        sample_rows: usize::from(data[0] >> 1),
        ..CsvOptions::default()
    };
    let Ok(table) = import_csv(&data[1..], "fuzz", &options) else {
        return;
    };

    let names: Vec<String> = table.column_names().into_iter().map(str::to_string).collect();
    let mut session = QuerySession::new(&table);
    for name in &names {
        let count = session.aggregate(AggFunc::Count, name).expect("field exists");
        assert_eq!(count, Value::Integer(table.row_count() as i64));
        let _ = session.aggregate(AggFunc::Sum, name);
        let _ = session.aggregate(AggFunc::Max, name);
        session.filter_min(name, 0.0).expect("field exists");
        assert!(session.count() <= table.row_count());
        session.reset();
    }
    if let [first, second, ..] = names.as_slice() {
        let ratios = session
            .derived_ratio_column(first, second)
            .expect("fields exist");
        let (row, ratio) = session.min_by(&ratios);
        assert_eq!(row.is_some(), ratio.is_finite());
    }
});
