use chrono::{Datelike, NaiveDate};
use std::fmt;

/// A calendar month, as stored in `Mon-YY` columns such as `Jan-15`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based month.
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Parse `Mon-YY` (e.g. `Jan-15` is January 2015).
    ///
    /// Two-digit years follow the POSIX pivot: `00`-`68` map to 20xx, `69`-`99` to 19xx.
    pub fn parse(text: &str) -> Result<Self, chrono::ParseError> {
        // `%b-%y` alone carries no day, so pin the first of the month.
        let date = NaiveDate::parse_from_str(&format!("01-{}", text.trim()), "%d-%b-%y")?;
        // chrono pivots at 70; `69` is the one year that lands on the other side.
        let year = match date.year() {
            2069 => 1969,
            year => year,
        };
        Ok(Self {
            year,
            month: date.month(),
        })
    }

    /// The following calendar month, rolling December into January.
    pub fn next(self) -> Self {
        if self.month >= 12 {
            Self::new(self.year + 1, 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_abbreviated_month_and_two_digit_year() {
        assert_eq!(YearMonth::parse("Jan-15").unwrap(), YearMonth::new(2015, 1));
        assert_eq!(YearMonth::parse(" dec-09 ").unwrap(), YearMonth::new(2009, 12));
        assert_eq!(YearMonth::parse("Oct-99").unwrap(), YearMonth::new(1999, 10));
    }

    #[test]
    fn two_digit_years_pivot_between_68_and_69() {
        assert_eq!(YearMonth::parse("Jan-68").unwrap(), YearMonth::new(2068, 1));
        assert_eq!(YearMonth::parse("Jan-69").unwrap(), YearMonth::new(1969, 1));
        assert_eq!(YearMonth::parse("Jan-70").unwrap(), YearMonth::new(1970, 1));
        assert_eq!(YearMonth::parse("Jun-00").unwrap(), YearMonth::new(2000, 6));
    }

    #[test]
    fn rejects_malformed_months() {
        assert!(YearMonth::parse("2015-01").is_err());
        assert!(YearMonth::parse("Foo-15").is_err());
        assert!(YearMonth::parse("").is_err());
    }

    #[test]
    fn next_rolls_over_the_year() {
        assert_eq!(YearMonth::new(2019, 12).next(), YearMonth::new(2020, 1));
        assert_eq!(YearMonth::new(2019, 3).next(), YearMonth::new(2019, 4));
    }
}
