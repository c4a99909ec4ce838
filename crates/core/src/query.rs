use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::filter::{BucketKey, FilterSpec, GroupBy};
use crate::domain::record::SalesRecord;
use crate::errors::QueryError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GroupTotal {
    pub group_key: String,
    #[serde(with = "crate::domain::record::json_amount")]
    pub total_amount: Decimal,
    pub record_count: u64,
}

/// Either the matching records or per-bucket totals. Serializes as a bare JSON array.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    Records(Vec<SalesRecord>),
    Groups(Vec<GroupTotal>),
}

impl QueryResult {
    pub fn len(&self) -> usize {
        match self {
            Self::Records(records) => records.len(),
            Self::Groups(groups) => groups.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
struct Bucket {
    total: Decimal,
    count: u64,
}

/// Filters `records` by `spec`, then groups them when `spec` asks for it.
///
/// Without grouping the matching records keep their input order. Grouped
/// output is sorted by bucket key.
pub fn query(records: &[SalesRecord], spec: &FilterSpec) -> Result<QueryResult, QueryError> {
    let filtered = records.iter().filter(|record| spec.matches(record));

    match spec.group_by() {
        None => Ok(QueryResult::Records(filtered.cloned().collect())),
        Some(group_by) => aggregate(filtered, group_by).map(QueryResult::Groups),
    }
}

fn aggregate<'a>(
    records: impl Iterator<Item = &'a SalesRecord>,
    group_by: GroupBy,
) -> Result<Vec<GroupTotal>, QueryError> {
    let mut buckets: BTreeMap<BucketKey, Bucket> = BTreeMap::new();

    for record in records {
        let bucket = buckets.entry(group_by.bucket_key(record)).or_default();
        bucket.total = bucket.total.checked_add(record.amount).ok_or_else(|| {
            QueryError::AmountOverflow { group_key: group_by.bucket_key(record).to_string() }
        })?;
        bucket.count += 1;
    }

    Ok(buckets
        .into_iter()
        .map(|(key, bucket)| GroupTotal {
            group_key: key.to_string(),
            total_amount: bucket.total,
            record_count: bucket.count,
        })
        .collect())
}
