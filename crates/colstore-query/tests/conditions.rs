use colstore_query::{build_time_window, ConditionsError, SearchConditions, YearMonth};
use pretty_assertions::assert_eq;

#[test]
fn identifier_digits_select_towns_year_and_month() {
    let conditions = SearchConditions::from_identifier("U2231417E").unwrap();
    // Digits 2 2 3 1 4 1 7.
    assert_eq!(
        conditions.towns,
        vec!["BUKIT PANJANG", "CHOA CHU KANG", "CLEMENTI", "HOUGANG", "TAMPINES"]
    );
    assert_eq!(conditions.target_year, 2017);
    assert_eq!(conditions.start_month, 1);
}

#[test]
fn low_last_digit_maps_to_the_2020s() {
    let conditions = SearchConditions::from_identifier("A12").unwrap();
    assert_eq!(conditions.target_year, 2022);
    assert_eq!(conditions.start_month, 1);
    assert_eq!(conditions.towns, vec!["BUKIT PANJANG", "CLEMENTI"]);
}

#[test]
fn zero_start_digit_means_october() {
    let conditions = SearchConditions::from_identifier("905").unwrap();
    assert_eq!(conditions.start_month, 10);
    assert_eq!(conditions.target_year, 2015);
}

#[test]
fn identifiers_need_two_digits() {
    let err = SearchConditions::from_identifier("ABC7").unwrap_err();
    assert_eq!(
        err,
        ConditionsError::TooFewDigits {
            identifier: "ABC7".to_string(),
            digits: 1
        }
    );
}

#[test]
fn time_window_rolls_into_the_next_year() {
    assert_eq!(
        build_time_window(2015, 11, 4).unwrap(),
        vec![
            YearMonth::new(2015, 11),
            YearMonth::new(2015, 12),
            YearMonth::new(2016, 1),
            YearMonth::new(2016, 2),
        ]
    );
    assert!(build_time_window(2015, 3, 0).unwrap().is_empty());
}

#[test]
fn time_window_rejects_invalid_start_month() {
    assert_eq!(
        build_time_window(2015, 13, 2).unwrap_err(),
        ConditionsError::InvalidStartMonth(13)
    );
    assert_eq!(
        build_time_window(2015, 0, 2).unwrap_err(),
        ConditionsError::InvalidStartMonth(0)
    );
}

#[test]
fn conditions_window_starts_at_target_month() {
    let conditions = SearchConditions::from_identifier("905").unwrap();
    assert_eq!(
        conditions.time_window(2).unwrap(),
        vec![YearMonth::new(2015, 10), YearMonth::new(2015, 11)]
    );
}
