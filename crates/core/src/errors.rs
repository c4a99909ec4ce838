use chrono::NaiveDate;
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("start_date {start} is after end_date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("total amount overflowed while aggregating group `{group_key}`")]
    AmountOverflow { group_key: String },
}

/// Raised when a textual region or grouping name is not one of the known variants.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported {kind} `{value}` (expected {expected})")]
pub struct ParseVariantError {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

impl QueryError {
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Self::InvalidDateRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use crate::errors::{ParseVariantError, QueryError};

    #[test]
    fn invalid_range_message_names_both_bounds() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).expect("date");
        let end = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let error = QueryError::InvalidDateRange { start, end };

        assert_eq!(error.to_string(), "start_date 2024-06-01 is after end_date 2024-01-01");
        assert!(error.is_caller_error());
    }

    #[test]
    fn overflow_is_not_a_caller_error() {
        let error = QueryError::AmountOverflow { group_key: "2024-03".to_string() };
        assert!(!error.is_caller_error());
        assert!(error.to_string().contains("2024-03"));
    }

    #[test]
    fn parse_error_lists_expected_values() {
        let error = ParseVariantError {
            kind: "groupby",
            value: "bogus".to_string(),
            expected: "region|week|month|quarter|year",
        };
        assert_eq!(
            error.to_string(),
            "unsupported groupby `bogus` (expected region|week|month|quarter|year)"
        );
    }
}
