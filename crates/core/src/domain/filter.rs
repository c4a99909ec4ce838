use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::record::{Region, SalesRecord};
use crate::errors::{ParseVariantError, QueryError};

/// Aggregation strategy for a grouped query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupBy {
    Region,
    Week,
    Month,
    Quarter,
    Year,
}

/// Bucket identifier produced by [`GroupBy::bucket_key`].
///
/// Region buckets order canonically; period buckets order lexicographically.
/// A single grouping never mixes the two variants.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BucketKey {
    Region(Region),
    Period(String),
}

impl GroupBy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Week => "week",
            Self::Month => "month",
            Self::Quarter => "quarter",
            Self::Year => "year",
        }
    }

    pub fn bucket_key(self, record: &SalesRecord) -> BucketKey {
        match self {
            Self::Region => BucketKey::Region(record.region),
            Self::Week => BucketKey::Period(iso_week_key(record.date)),
            Self::Month => {
                BucketKey::Period(format!("{:04}-{:02}", record.date.year(), record.date.month()))
            }
            Self::Quarter => BucketKey::Period(format!(
                "{:04}-Q{}",
                record.date.year(),
                record.date.month0() / 3 + 1
            )),
            Self::Year => BucketKey::Period(format!("{:04}", record.date.year())),
        }
    }
}

/// ISO-8601 week key; the ISO year differs from the calendar year around New Year.
fn iso_week_key(date: NaiveDate) -> String {
    let week = date.iso_week();
    format!("{:04}-W{:02}", week.year(), week.week())
}

impl fmt::Display for GroupBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupBy {
    type Err = ParseVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "region" => Ok(Self::Region),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            "quarter" => Ok(Self::Quarter),
            "year" => Ok(Self::Year),
            _ => Err(ParseVariantError {
                kind: "groupby",
                value: value.to_string(),
                expected: "region|week|month|quarter|year",
            }),
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Region(region) => f.write_str(region.as_str()),
            Self::Period(period) => f.write_str(period),
        }
    }
}

/// Validated constraints for one sales query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterSpec {
    region: Option<Region>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    group_by: Option<GroupBy>,
}

impl FilterSpec {
    pub fn new(
        region: Option<Region>,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        group_by: Option<GroupBy>,
    ) -> Result<Self, QueryError> {
        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(QueryError::InvalidDateRange { start, end });
            }
        }

        Ok(Self { region, start_date, end_date, group_by })
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        self.start_date
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        self.end_date
    }

    pub fn group_by(&self) -> Option<GroupBy> {
        self.group_by
    }

    pub fn matches(&self, record: &SalesRecord) -> bool {
        self.region.map_or(true, |region| record.region == region)
            && self.start_date.map_or(true, |start| record.date >= start)
            && self.end_date.map_or(true, |end| record.date <= end)
    }

    /// One-line description, e.g. `region=North | 2024-01-01..2024-03-31 | grouped by month`.
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(3);
        parts.push(match self.region {
            Some(region) => format!("region={region}"),
            None => "all regions".to_string(),
        });
        if self.start_date.is_some() || self.end_date.is_some() {
            let start = self.start_date.map_or_else(|| "beginning".to_string(), |d| d.to_string());
            let end = self.end_date.map_or_else(|| "latest".to_string(), |d| d.to_string());
            parts.push(format!("{start}..{end}"));
        }
        if let Some(group_by) = self.group_by {
            parts.push(format!("grouped by {group_by}"));
        }
        parts.join(" | ")
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{BucketKey, FilterSpec, GroupBy};
    use crate::domain::record::{Region, SalesRecord};
    use crate::errors::QueryError;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    fn record_on(day: NaiveDate) -> SalesRecord {
        SalesRecord::new("Product A", Region::East, day, Decimal::new(100, 2))
    }

    fn period(group_by: GroupBy, day: NaiveDate) -> String {
        group_by.bucket_key(&record_on(day)).to_string()
    }

    #[test]
    fn week_keys_follow_iso_year_boundaries() {
        assert_eq!(period(GroupBy::Week, date(2024, 1, 31)), "2024-W05");
        assert_eq!(period(GroupBy::Week, date(2024, 12, 30)), "2025-W01");
        assert_eq!(period(GroupBy::Week, date(2021, 1, 1)), "2020-W53");
        assert_eq!(period(GroupBy::Week, date(2024, 1, 1)), "2024-W01");
    }

    #[test]
    fn month_quarter_and_year_keys_are_zero_padded() {
        assert_eq!(period(GroupBy::Month, date(2024, 3, 15)), "2024-03");
        assert_eq!(period(GroupBy::Quarter, date(2024, 3, 31)), "2024-Q1");
        assert_eq!(period(GroupBy::Quarter, date(2024, 4, 1)), "2024-Q2");
        assert_eq!(period(GroupBy::Quarter, date(2024, 12, 31)), "2024-Q4");
        assert_eq!(period(GroupBy::Year, date(2025, 7, 4)), "2025");
    }

    #[test]
    fn region_key_keeps_the_region_variant() {
        assert_eq!(
            GroupBy::Region.bucket_key(&record_on(date(2024, 1, 1))),
            BucketKey::Region(Region::East)
        );
    }

    #[test]
    fn groupby_parsing_is_case_insensitive() {
        assert_eq!("Month".parse::<GroupBy>(), Ok(GroupBy::Month));
        assert_eq!(" QUARTER".parse::<GroupBy>(), Ok(GroupBy::Quarter));
        let error = "bogus".parse::<GroupBy>().expect_err("bogus must be rejected");
        assert_eq!(error.kind, "groupby");
    }

    #[test]
    fn inverted_range_is_rejected_at_construction() {
        let result = FilterSpec::new(None, Some(date(2024, 6, 1)), Some(date(2024, 1, 1)), None);
        assert_eq!(
            result,
            Err(QueryError::InvalidDateRange { start: date(2024, 6, 1), end: date(2024, 1, 1) })
        );
    }

    #[test]
    fn single_day_range_is_allowed_and_inclusive() {
        let day = date(2024, 2, 29);
        let spec = FilterSpec::new(None, Some(day), Some(day), None).expect("valid spec");
        assert!(spec.matches(&record_on(day)));
        assert!(!spec.matches(&record_on(date(2024, 3, 1))));
    }

    #[test]
    fn unset_bounds_are_unbounded() {
        let spec = FilterSpec::new(Some(Region::East), None, Some(date(2024, 1, 1)), None)
            .expect("valid spec");
        assert!(spec.matches(&record_on(date(1999, 1, 1))));
        assert!(!spec.matches(&record_on(date(2024, 1, 2))));
    }

    #[test]
    fn summary_describes_every_constraint() {
        let spec = FilterSpec::new(
            Some(Region::North),
            Some(date(2024, 1, 1)),
            Some(date(2024, 3, 31)),
            Some(GroupBy::Month),
        )
        .expect("valid spec");
        assert_eq!(spec.summary(), "region=North | 2024-01-01..2024-03-31 | grouped by month");
        assert_eq!(FilterSpec::default().summary(), "all regions");
    }
}
