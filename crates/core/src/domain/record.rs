use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::ParseVariantError;

/// Sales region. Declaration order is the canonical reporting order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Region {
    North,
    South,
    East,
    West,
}

impl Region {
    pub const ALL: [Region; 4] = [Region::North, Region::South, Region::East, Region::West];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "North",
            Self::South => "South",
            Self::East => "East",
            Self::West => "West",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Region {
    type Err = ParseVariantError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "north" => Ok(Self::North),
            "south" => Ok(Self::South),
            "east" => Ok(Self::East),
            "west" => Ok(Self::West),
            _ => Err(ParseVariantError {
                kind: "region",
                value: value.to_string(),
                expected: "North|South|East|West",
            }),
        }
    }
}

/// One product's sales on one day in one region.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesRecord {
    pub product_name: String,
    pub region: Region,
    pub date: NaiveDate,
    #[serde(with = "json_amount")]
    pub amount: Decimal,
}

impl SalesRecord {
    pub fn new(
        product_name: impl Into<String>,
        region: Region,
        date: NaiveDate,
        amount: Decimal,
    ) -> Self {
        Self { product_name: product_name.into(), region, date, amount }
    }
}

/// Writes a [`Decimal`] as a bare JSON number with its scale intact (`120.00`).
/// Reading accepts either a number or a decimal string.
pub(crate) mod json_amount {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use serde_json::value::RawValue;

    pub(crate) fn serialize<S>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let raw = RawValue::from_string(amount.to_string()).map_err(serde::ser::Error::custom)?;
        raw.serialize(serializer)
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        <Decimal as Deserialize>::deserialize(deserializer)
    }
}
