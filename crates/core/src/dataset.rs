//! Synthetic sales dataset.
//!
//! Records form a product × day grid over a declared date range. A seeded
//! generator reproduces the same sequence on every run; an unseeded one draws
//! from OS entropy but keeps the same invariants.

use std::sync::{Arc, OnceLock};

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::info;

use crate::domain::filter::FilterSpec;
use crate::domain::record::{Region, SalesRecord};
use crate::errors::QueryError;
use crate::query::{self, QueryResult};

pub const DEFAULT_PRODUCTS: usize = 25;
pub const MAX_PRODUCTS: usize = 702;

const MIN_AMOUNT_CENTS: i64 = 100;
const MAX_AMOUNT_CENTS: i64 = 25_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetConfig {
    pub products: usize,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub seed: Option<u64>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            products: DEFAULT_PRODUCTS,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or(NaiveDate::MAX),
            seed: None,
        }
    }
}

/// Generates one record per product per day, product-major, dates ascending.
///
/// An inverted range yields no records.
pub fn generate(config: &DatasetConfig) -> Vec<SalesRecord> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let days: Vec<NaiveDate> =
        config.start_date.iter_days().take_while(|day| *day <= config.end_date).collect();

    let mut records = Vec::with_capacity(config.products * days.len());
    for index in 0..config.products {
        let product_name = product_name(index);
        for day in &days {
            let region = Region::ALL[rng.gen_range(0..Region::ALL.len())];
            let cents = rng.gen_range(MIN_AMOUNT_CENTS..=MAX_AMOUNT_CENTS);
            records.push(SalesRecord::new(
                product_name.clone(),
                region,
                *day,
                Decimal::new(cents, 2),
            ));
        }
    }

    records
}

/// `Product A` .. `Product Z`, then `Product AA`, `Product AB`, ...
fn product_name(index: usize) -> String {
    let mut letters = Vec::new();
    let mut remaining = index + 1;
    while remaining > 0 {
        let offset = (remaining - 1) % 26;
        letters.push(char::from(b'A' + offset as u8));
        remaining = (remaining - 1) / 26;
    }
    let suffix: String = letters.iter().rev().collect();
    format!("Product {suffix}")
}

/// Read-only handle to a generated record set. Clones share the same records.
#[derive(Clone, Debug)]
pub struct SalesDataset {
    records: Arc<[SalesRecord]>,
}

impl SalesDataset {
    pub fn generate(config: &DatasetConfig) -> Self {
        let records = generate(config);
        info!(
            event_name = "system.dataset.generated",
            record_count = records.len(),
            products = config.products,
            start_date = %config.start_date,
            end_date = %config.end_date,
            seeded = config.seed.is_some(),
            "sales dataset generated"
        );

        Self { records: records.into() }
    }

    /// Wraps an explicit record list.
    pub fn from_records(records: Vec<SalesRecord>) -> Self {
        Self { records: records.into() }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn query(&self, spec: &FilterSpec) -> Result<QueryResult, QueryError> {
        query::query(&self.records, spec)
    }
}

/// Dataset generated on first access, at most once even under concurrent callers.
#[derive(Debug)]
pub struct SharedDataset {
    config: DatasetConfig,
    cell: OnceLock<SalesDataset>,
}

impl SharedDataset {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config, cell: OnceLock::new() }
    }

    pub fn get(&self) -> &SalesDataset {
        self.cell.get_or_init(|| SalesDataset::generate(&self.config))
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::{generate, product_name, DatasetConfig, SalesDataset, SharedDataset};
    use crate::domain::record::Region;

    fn seeded(seed: u64) -> DatasetConfig {
        DatasetConfig {
            products: 4,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).expect("date"),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 31).expect("date"),
            seed: Some(seed),
        }
    }

    #[test]
    fn same_seed_produces_identical_sequences() {
        let first = serde_json::to_string(&generate(&seeded(7))).expect("serialize");
        let second = serde_json::to_string(&generate(&seeded(7))).expect("serialize");
        assert_eq!(first, second);
    }

    #[test]
    fn different_seeds_diverge() {
        assert_ne!(generate(&seeded(1)), generate(&seeded(2)));
    }

    #[test]
    fn grid_covers_every_product_and_day() {
        let config = seeded(3);
        let records = generate(&config);

        // 2024 is a leap year: 31 + 29 + 31 days.
        assert_eq!(records.len(), 4 * 91);
        assert_eq!(records[0].product_name, "Product A");
        assert_eq!(records[0].date, config.start_date);
        assert_eq!(records[90].date, config.end_date);
        assert_eq!(records[91].product_name, "Product B");
    }

    #[test]
    fn unseeded_output_still_holds_invariants() {
        let config = DatasetConfig { seed: None, ..seeded(0) };
        let records = generate(&config);

        assert!(!records.is_empty());
        for record in &records {
            assert!(record.amount >= Decimal::ZERO);
            assert!(record.amount.scale() == 2);
            assert!(record.date >= config.start_date && record.date <= config.end_date);
            assert!(Region::ALL.contains(&record.region));
        }
    }

    #[test]
    fn inverted_range_generates_nothing() {
        let base = seeded(0);
        let config =
            DatasetConfig { start_date: base.end_date, end_date: base.start_date, ..base.clone() };
        assert!(generate(&config).is_empty());
    }

    #[test]
    fn product_names_roll_over_past_z() {
        assert_eq!(product_name(0), "Product A");
        assert_eq!(product_name(24), "Product Y");
        assert_eq!(product_name(25), "Product Z");
        assert_eq!(product_name(26), "Product AA");
        assert_eq!(product_name(701), "Product ZZ");
    }

    #[test]
    fn explicit_records_are_queried_as_given() {
        let records = generate(&seeded(5));
        let dataset = SalesDataset::from_records(records.clone());
        assert_eq!(dataset.records(), records.as_slice());
        assert!(SalesDataset::from_records(Vec::new()).is_empty());
    }

    #[test]
    fn shared_dataset_initializes_once_under_concurrency() {
        let shared = Arc::new(SharedDataset::new(DatasetConfig { seed: None, ..seeded(0) }));
        assert!(!shared.is_initialized());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || shared.get().records().as_ptr() as usize)
            })
            .collect();

        let addresses: Vec<usize> =
            handles.into_iter().map(|handle| handle.join().expect("thread panicked")).collect();

        assert!(shared.is_initialized());
        assert!(addresses.windows(2).all(|pair| pair[0] == pair[1]));
    }
}
