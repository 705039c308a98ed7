//! Chart payloads carried by a render job.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::ValidationError;

use crate::error::{ModelError, ModelResult};

/// Labels used when a scalar comparison is drawn as a two-point series.
pub const COMPARISON_LABELS: [&str; 2] = ["Yesterday", "Today"];

/// Chart type tag.
///
/// Selects a rendering strategy. Every tag is currently drawn as a
/// progressive line reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Comparison,
    #[default]
    Line,
    Bar,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Comparison => "comparison",
            ChartType::Line => "line",
            ChartType::Bar => "bar",
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data payload of a job: either a yesterday/today pair or a labelled series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ChartData {
    /// Time series
    Series {
        labels: Vec<String>,
        values: Vec<f64>,
    },
    /// Scalar comparison between two consecutive readings
    Comparison {
        yesterday: f64,
        today: f64,
        change: f64,
        change_percent: f64,
    },
}

impl ChartData {
    /// Build a comparison payload, deriving the change fields.
    pub fn comparison(yesterday: f64, today: f64) -> Self {
        let change = today - yesterday;
        let change_percent = if yesterday != 0.0 {
            change / yesterday * 100.0
        } else {
            0.0
        };
        Self::Comparison {
            yesterday: round2(yesterday),
            today: round2(today),
            change: round2(change),
            change_percent: round2(change_percent),
        }
    }

    /// Normalize the payload into a labelled series.
    ///
    /// A comparison becomes the two-point series `Yesterday -> Today`.
    pub fn series(&self) -> Series {
        match self {
            ChartData::Series { labels, values } => Series {
                labels: labels.clone(),
                values: values.clone(),
            },
            ChartData::Comparison { yesterday, today, .. } => Series {
                labels: COMPARISON_LABELS.iter().map(|s| s.to_string()).collect(),
                values: vec![*yesterday, *today],
            },
        }
    }
}

/// Labelled numeric series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Series {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

impl Series {
    pub fn new(labels: Vec<String>, values: Vec<f64>) -> Self {
        Self { labels, values }
    }

    /// Check the series invariant: equal lengths, at least two finite points
    /// and a finite spread between them.
    pub fn validate(&self) -> ModelResult<()> {
        if self.labels.len() != self.values.len() {
            return Err(ModelError::validation(format!(
                "labels ({}) and values ({}) differ in length",
                self.labels.len(),
                self.values.len()
            )));
        }
        if self.values.len() < 2 {
            return Err(ModelError::validation(format!(
                "series needs at least 2 points, got {}",
                self.values.len()
            )));
        }
        if let Some(i) = self.values.iter().position(|v| !v.is_finite()) {
            return Err(ModelError::validation(format!(
                "value at index {} is not finite",
                i
            )));
        }
        let min = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if !(max - min).is_finite() {
            return Err(ModelError::validation(format!(
                "value range {} to {} is too wide to plot",
                min, max
            )));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Validator hook used by `RenderJob`.
pub(crate) fn validate_chart_data(data: &ChartData) -> Result<(), ValidationError> {
    data.series().validate().map_err(|e| {
        let mut err = ValidationError::new("series");
        err.message = Some(e.to_string().into());
        err
    })
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
