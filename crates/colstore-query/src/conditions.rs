//! Search parameters derived from an identifier string.
//!
//! Every digit of the identifier selects a town, the last digit selects the target year
//! and the second-last digit selects the month the search window starts in.

use crate::time::YearMonth;
use std::collections::BTreeSet;

/// Town selected by each decimal digit.
pub const DIGIT_TOWNS: [&str; 10] = [
    "BEDOK",
    "BUKIT PANJANG",
    "CLEMENTI",
    "CHOA CHU KANG",
    "HOUGANG",
    "JURONG WEST",
    "PASIR RIS",
    "TAMPINES",
    "WOODLANDS",
    "YISHUN",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConditionsError {
    #[error("identifier {identifier:?} has {digits} digit(s); at least 2 are required")]
    TooFewDigits { identifier: String, digits: usize },

    #[error("start month {0} is outside 1..=12")]
    InvalidStartMonth(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConditions {
    pub identifier: String,
    /// Sorted, de-duplicated town names.
    pub towns: Vec<String>,
    pub target_year: i32,
    /// 1-based month the search window starts in.
    pub start_month: u32,
}

impl SearchConditions {
    pub fn from_identifier(identifier: &str) -> Result<Self, ConditionsError> {
        let digits: Vec<u32> = identifier.chars().filter_map(|c| c.to_digit(10)).collect();
        let [.., second_last, last] = digits[..] else {
            return Err(ConditionsError::TooFewDigits {
                identifier: identifier.to_string(),
                digits: digits.len(),
            });
        };

        let towns: BTreeSet<&str> = digits.iter().map(|&d| DIGIT_TOWNS[d as usize]).collect();
        let target_year = if last >= 5 {
            2010 + last as i32
        } else {
            2020 + last as i32
        };
        let start_month = if second_last == 0 { 10 } else { second_last };

        Ok(Self {
            identifier: identifier.to_string(),
            towns: towns.into_iter().map(str::to_string).collect(),
            target_year,
            start_month,
        })
    }

    /// The `x`-month window starting at this identifier's year and month.
    pub fn time_window(&self, x: u32) -> Result<Vec<YearMonth>, ConditionsError> {
        build_time_window(self.target_year, self.start_month, x)
    }
}

/// `x` consecutive months starting at `(year, start_month)`.
pub fn build_time_window(year: i32, start_month: u32, x: u32) -> Result<Vec<YearMonth>, ConditionsError> {
    if !(1..=12).contains(&start_month) {
        return Err(ConditionsError::InvalidStartMonth(start_month));
    }
    Ok(std::iter::successors(Some(YearMonth::new(year, start_month)), |m| Some(m.next()))
        .take(x as usize)
        .collect())
}
