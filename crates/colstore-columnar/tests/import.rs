use colstore_columnar::{import_csv, read_csv_columns, ColumnType, ColumnarError, CsvOptions, Value};
use pretty_assertions::assert_eq;

#[test]
fn header_row_names_the_columns() {
    let input = "town,area\nA,80\nB,90.5\n";
    let table = import_csv(input.as_bytes(), "t", &CsvOptions::default()).unwrap();

    assert_eq!(table.column_names(), vec!["town", "area"]);
    assert_eq!(table.row_count(), 2);
    assert_eq!(table.get("area").unwrap().column_type(), ColumnType::Real);
    assert_eq!(table.value(0, "area"), Some(&Value::Real(80.0)));
}

#[test]
fn headerless_input_gets_generated_names() {
    let options = CsvOptions {
        has_header: false,
        ..CsvOptions::default()
    };
    let raw = read_csv_columns("1;x\n2;y\n".as_bytes(), &CsvOptions { delimiter: b';', ..options })
        .unwrap();
    assert_eq!(raw.names, vec!["Column1", "Column2"]);
    assert_eq!(raw.values[1], vec!["x", "y"]);
    assert_eq!(raw.row_count(), 2);
}

#[test]
fn quoted_fields_keep_embedded_delimiters() {
    let input = "block,street\n\"10, A\",MAIN\n";
    let table = import_csv(input.as_bytes(), "t", &CsvOptions::default()).unwrap();
    assert_eq!(table.value(0, "block"), Some(&Value::from("10, A")));
}

#[test]
fn empty_input_is_rejected() {
    let err = import_csv("".as_bytes(), "t", &CsvOptions::default()).unwrap_err();
    assert!(matches!(err, ColumnarError::EmptyInput), "{err}");
}

#[test]
fn ragged_records_are_rejected() {
    let err = import_csv("a,b\n1,2\n3\n".as_bytes(), "t", &CsvOptions::default()).unwrap_err();
    assert!(matches!(err, ColumnarError::Csv { .. }), "{err}");
}

#[test]
fn header_names_with_path_separators_are_rejected() {
    for header in ["town,a/b\n", "town,a\\b\n"] {
        let input = format!("{header}BEDOK,1\n");
        let err = import_csv(input.as_bytes(), "t", &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, ColumnarError::InvalidFieldName(_)), "{err}");
    }
}
