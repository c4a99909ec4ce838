//! Synthetic sales dataset and the query engine that filters and aggregates it.

pub mod config;
pub mod dataset;
pub mod domain;
pub mod errors;
pub mod query;

pub use dataset::{generate, DatasetConfig, SalesDataset, SharedDataset};
pub use domain::filter::{BucketKey, FilterSpec, GroupBy};
pub use domain::record::{Region, SalesRecord};
pub use errors::{ParseVariantError, QueryError};
pub use query::{query, GroupTotal, QueryResult};
