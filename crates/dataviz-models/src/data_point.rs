//! Normalized data records produced by market and economic sources.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chart::{ChartData, ChartType};

/// Topic category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Crypto,
    Stocks,
    Economic,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Crypto => "crypto",
            Category::Stocks => "stocks",
            Category::Economic => "economic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetched reading, ready to be narrated and queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DataPoint {
    pub title: String,
    pub category: Category,
    pub data: ChartData,
    pub source: String,
    #[serde(default)]
    pub chart_type: ChartType,
    /// Reading date (YYYY-MM-DD)
    pub date: String,
}

impl DataPoint {
    /// Percent change for comparison payloads.
    pub fn change_percent(&self) -> Option<f64> {
        match self.data {
            ChartData::Comparison { change_percent, .. } => Some(change_percent),
            ChartData::Series { ref values, .. } => {
                let first = *values.first()?;
                let last = *values.last()?;
                (first != 0.0).then(|| (last - first) / first * 100.0)
            }
        }
    }
}
