//! Render job definition.
//!
//! A `RenderJob` is fully self-contained: everything the renderer needs
//! is in the job file. Audio and output video are associated with it
//! only through naming conventions on the job id.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::chart::{validate_chart_data, ChartData, ChartType, Series};
use crate::data_point::DataPoint;
use crate::error::ModelResult;

/// Unique identifier for a render job.
///
/// Timestamp-derived (`YYYYMMDD_HHMMSS_xxxxxxxx`) so that job files sort
/// chronologically; the random suffix keeps ids unique within a second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new timestamp-derived job ID.
    pub fn generate() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}_{}",
            Utc::now().format("%Y%m%d_%H%M%S"),
            &suffix[..8]
        ))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unit of work: one chart plus narration to be turned into a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct RenderJob {
    /// Unique job ID, also the filename stem of every related file
    #[validate(custom(function = "validate_job_id"))]
    pub id: JobId,

    /// Chart type tag
    #[serde(default)]
    pub chart_type: ChartType,

    /// Display title
    #[validate(length(min = 1))]
    pub title: String,

    /// Chart payload
    #[validate(custom(function = "validate_chart_data"))]
    pub data: ChartData,

    /// Citation shown at the bottom of the frame
    #[serde(default)]
    pub source: String,

    /// Narration text (also burned in as caption)
    #[serde(default)]
    pub analysis: String,

    /// Creation timestamp, informational only
    #[serde(default)]
    pub created_at: String,
}

impl RenderJob {
    /// Create a new job with a generated id.
    pub fn new(title: impl Into<String>, data: ChartData) -> Self {
        Self {
            id: JobId::generate(),
            chart_type: ChartType::default(),
            title: title.into(),
            data,
            source: String::new(),
            analysis: String::new(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Build a job from a fetched data point and its narration.
    pub fn from_data_point(id: JobId, point: &DataPoint, analysis: impl Into<String>) -> Self {
        Self {
            id,
            chart_type: point.chart_type,
            title: point.title.clone(),
            data: point.data.clone(),
            source: point.source.clone(),
            analysis: analysis.into(),
            created_at: Utc::now().to_rfc3339(),
        }
    }

    /// Set the chart type.
    pub fn with_chart_type(mut self, chart_type: ChartType) -> Self {
        self.chart_type = chart_type;
        self
    }

    /// Set the source citation.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the narration text.
    pub fn with_analysis(mut self, analysis: impl Into<String>) -> Self {
        self.analysis = analysis.into();
        self
    }

    /// Run all field checks, returning a validation error on failure.
    pub fn ensure_valid(&self) -> ModelResult<()> {
        self.validate()?;
        Ok(())
    }

    /// Labelled series to plot.
    pub fn series(&self) -> Series {
        self.data.series()
    }
}

/// Job ids become file names, so they must be non-empty and path-free.
fn validate_job_id(id: &JobId) -> Result<(), ValidationError> {
    let s = id.as_str();
    let ok = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(ValidationError::new("job_id"))
    }
}
