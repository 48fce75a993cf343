#![no_main]

use colstore_query::{SearchConditions, YearMonth};
use libfuzzer_sys::fuzz_target;

/// Month cells and identifiers are short; keep the harness bounded.
const MAX_INPUT_BYTES: usize = 256;

fuzz_target!(|data: &[u8]| {
    let data = if data.len() > MAX_INPUT_BYTES {
        &data[..MAX_INPUT_BYTES]
    } else {
        data
    };
    let input = String::from_utf8_lossy(data);

    if let Ok(month) = YearMonth::parse(&input) {
        assert!((1..=12).contains(&month.month));
        let next = month.next();
        assert!((1..=12).contains(&next.month));
        assert!(next > month);
    }

    if let Ok(conditions) = SearchConditions::from_identifier(&input) {
        assert!(!conditions.towns.is_empty());
        assert!((1..=12).contains(&conditions.start_month));
        let x = u32::from(data.first().copied().unwrap_or(0) % 32);
        let window = conditions.time_window(x).expect("start month validated");
        assert_eq!(window.len(), x as usize);
        assert!(window.windows(2).all(|w| w[0] < w[1]));
    }
});
