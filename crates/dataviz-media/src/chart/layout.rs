//! Per-job chart geometry.

use dataviz_models::{RenderJob, Series};

use super::config::ChartConfig;
use super::palette::TrendPalette;
use super::series::{format_value, resample, y_bounds};
use crate::error::{MediaError, MediaResult};

/// Number of horizontal gridlines, including both axis bounds.
const Y_GRID_LINES: usize = 5;

/// Pixel rectangle the series is plotted into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotArea {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
}

impl PlotArea {
    pub fn for_canvas(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            left: w * 0.12,
            top: h * 0.2,
            right: w * 0.95,
            bottom: h * 0.8,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Baseline of the large current-value label.
    pub fn value_label_y(&self) -> f32 {
        self.top + self.height() * 0.2
    }
}

/// Axis label anchored at a pixel position along its axis.
#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub label: String,
    pub position: f32,
}

/// Data-driven content of one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameGeometry {
    pub index: usize,
    /// Revealed curve in pixel coordinates, oldest point first
    pub points: Vec<(f32, f32)>,
    /// Interpolated value at this frame
    pub value: f64,
    /// `value` formatted for display
    pub label: String,
    /// Y-axis range, identical for every frame of a job
    pub y_range: (f64, f64),
}

impl FrameGeometry {
    /// Tip of the revealed curve.
    pub fn head(&self) -> Option<(f32, f32)> {
        self.points.last().copied()
    }
}

/// Everything needed to draw every frame of one job.
///
/// Y bounds, palette and ticks are fixed at construction from the
/// original series, so they never change while the line is revealed.
#[derive(Debug, Clone)]
pub struct ChartPlan {
    title: String,
    source: String,
    width: u32,
    height: u32,
    line_width: u32,
    area: PlotArea,
    samples: Vec<f64>,
    points: Vec<(f32, f32)>,
    y_range: (f64, f64),
    palette: TrendPalette,
    x_ticks: Vec<Tick>,
    y_ticks: Vec<Tick>,
}

impl ChartPlan {
    /// Plan a chart for `series`.
    ///
    /// Fails with a validation error for mismatched lengths, fewer than
    /// two points, non-finite values or an unusable config.
    pub fn new(
        title: impl Into<String>,
        source: impl Into<String>,
        series: &Series,
        config: &ChartConfig,
    ) -> MediaResult<Self> {
        config.validate()?;
        series.validate()?;

        let area = PlotArea::for_canvas(config.width, config.height);
        let samples = resample(&series.values, config.total_frames);
        let y_range = y_bounds(&series.values, config.padding_ratio);
        if !(y_range.1 - y_range.0).is_finite() {
            return Err(MediaError::validation(format!(
                "padded value range {} to {} is too wide to plot",
                y_range.0, y_range.1
            )));
        }

        let mut plan = Self {
            title: title.into(),
            source: source.into(),
            width: config.width,
            height: config.height,
            line_width: config.line_width,
            area,
            points: Vec::with_capacity(samples.len()),
            samples,
            y_range,
            palette: TrendPalette::for_values(&series.values),
            x_ticks: Vec::new(),
            y_ticks: Vec::new(),
        };

        let last = (plan.samples.len() - 1) as f64;
        plan.points = plan
            .samples
            .iter()
            .enumerate()
            .map(|(i, v)| plan.project(i as f64 / last, *v))
            .collect();
        plan.x_ticks = x_ticks(&series.labels, &area, config.max_tick_labels);
        plan.y_ticks = y_ticks(y_range, &area);

        Ok(plan)
    }

    /// Plan the chart for a queued job.
    pub fn from_job(job: &RenderJob, config: &ChartConfig) -> MediaResult<Self> {
        Self::new(&job.title, &job.source, &job.series(), config)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn line_width(&self) -> u32 {
        self.line_width
    }

    pub fn plot_area(&self) -> &PlotArea {
        &self.area
    }

    pub fn total_frames(&self) -> usize {
        self.samples.len()
    }

    /// Resampled values, one per frame.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        self.y_range
    }

    pub fn palette(&self) -> TrendPalette {
        self.palette
    }

    /// X-axis ticks carrying the original labels.
    pub fn x_ticks(&self) -> &[Tick] {
        &self.x_ticks
    }

    pub fn y_ticks(&self) -> &[Tick] {
        &self.y_ticks
    }

    /// Map a horizontal fraction (0..=1) and a value to pixel coordinates.
    pub fn project(&self, fraction: f64, value: f64) -> (f32, f32) {
        let (lo, hi) = self.y_range;
        let x = self.area.left + self.area.width() * fraction as f32;
        let y = self.area.bottom - self.area.height() * ((value - lo) / (hi - lo)) as f32;
        (x, y)
    }

    /// Geometry of frame `index`, or `None` past the last frame.
    pub fn frame(&self, index: usize) -> Option<FrameGeometry> {
        let value = *self.samples.get(index)?;
        Some(FrameGeometry {
            index,
            points: self.points[..=index].to_vec(),
            value,
            label: format_value(value),
            y_range: self.y_range,
        })
    }

    /// All frames in reveal order.
    pub fn frames(&self) -> impl Iterator<Item = FrameGeometry> + '_ {
        (0..self.total_frames()).filter_map(move |i| self.frame(i))
    }
}

fn x_ticks(labels: &[String], area: &PlotArea, max_labels: usize) -> Vec<Tick> {
    if labels.len() < 2 {
        return Vec::new();
    }
    let stride = labels.len().div_ceil(max_labels.max(1));
    let last = (labels.len() - 1) as f32;

    labels
        .iter()
        .enumerate()
        .filter(|(i, _)| i % stride == 0)
        .map(|(i, label)| Tick {
            label: label.clone(),
            position: area.left + area.width() * (i as f32 / last),
        })
        .collect()
}

fn y_ticks((lo, hi): (f64, f64), area: &PlotArea) -> Vec<Tick> {
    let steps = (Y_GRID_LINES - 1) as f64;
    (0..Y_GRID_LINES)
        .map(|k| {
            let fraction = k as f64 / steps;
            Tick {
                label: format_value(lo + (hi - lo) * fraction),
                position: area.bottom - area.height() * fraction as f32,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MediaError;
    use dataviz_models::ErrorKind;

    fn inflation() -> Series {
        Series::new(
            vec!["Jan".into(), "Feb".into(), "Mar".into()],
            vec![3.4, 3.2, 3.5],
        )
    }

    #[test]
    fn test_frame_count_is_configured_constant() {
        for n in [2usize, 3, 10, 200] {
            let labels = (0..n).map(|i| format!("d{}", i)).collect();
            let values = (0..n).map(|i| (i as f64).sin() * 100.0).collect();
            let plan = ChartPlan::new(
                "t",
                "s",
                &Series::new(labels, values),
                &ChartConfig::default(),
            )
            .unwrap();
            assert_eq!(plan.frames().count(), 90);
            assert!(plan.frame(90).is_none());
        }
    }

    #[test]
    fn test_y_bounds_fixed_and_contain_series() {
        let plan = ChartPlan::new("Inflation", "Fed", &inflation(), &ChartConfig::default()).unwrap();
        let bounds = plan.y_bounds();
        for frame in plan.frames() {
            assert_eq!(frame.y_range, bounds);
            assert!(bounds.0 < frame.value && frame.value < bounds.1);
            for (_, y) in &frame.points {
                assert!(*y > plan.plot_area().top && *y < plan.plot_area().bottom);
            }
        }
    }

    #[test]
    fn test_prefix_grows_by_one_point() {
        let plan = ChartPlan::new("Inflation", "Fed", &inflation(), &ChartConfig::default()).unwrap();
        let frames: Vec<_> = plan.frames().collect();
        for pair in frames.windows(2) {
            assert_eq!(pair[1].points.len(), pair[0].points.len() + 1);
            assert_eq!(pair[1].points[..pair[0].points.len()], pair[0].points[..]);
        }
    }

    #[test]
    fn test_inflation_scenario() {
        let plan = ChartPlan::new("Inflation", "Fed", &inflation(), &ChartConfig::default()).unwrap();
        let first = plan.frame(0).unwrap();
        let last = plan.frame(plan.total_frames() - 1).unwrap();

        assert_eq!(first.value, 3.4);
        assert_eq!(first.label, "3.40");
        assert_eq!(last.value, 3.5);
        assert_eq!(last.label, "3.50");
        assert_eq!(plan.palette(), TrendPalette::Positive);
    }

    #[test]
    fn test_ticks_use_original_labels() {
        let plan = ChartPlan::new("Inflation", "Fed", &inflation(), &ChartConfig::default()).unwrap();
        let labels: Vec<_> = plan.x_ticks().iter().map(|t| t.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan", "Feb", "Mar"]);
        assert_eq!(plan.y_ticks().len(), 5);
    }

    #[test]
    fn test_tick_labels_are_thinned() {
        let labels: Vec<String> = (0..60).map(|i| format!("D{}", i)).collect();
        let values = (0..60).map(|i| i as f64).collect();
        let plan = ChartPlan::new("t", "s", &Series::new(labels, values), &ChartConfig::default())
            .unwrap();
        assert!(plan.x_ticks().len() <= 12);
        assert_eq!(plan.x_ticks()[0].label, "D0");
    }

    #[test]
    fn test_geometry_is_deterministic() {
        let a = ChartPlan::new("Inflation", "Fed", &inflation(), &ChartConfig::default()).unwrap();
        let b = ChartPlan::new("Inflation", "Fed", &inflation(), &ChartConfig::default()).unwrap();
        assert!(a.frames().eq(b.frames()));
    }

    #[test]
    fn test_extreme_range_rejected() {
        for values in [vec![-1e308, 1e308], vec![-8e307, 8e307]] {
            let series = Series::new(vec!["a".into(), "b".into()], values);
            let err = ChartPlan::new("t", "s", &series, &ChartConfig::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation);
        }
    }

    #[test]
    fn test_large_finite_values_project_inside_plot() {
        let series = Series::new(vec!["a".into(), "b".into()], vec![-1e300, 1e300]);
        let plan = ChartPlan::new("t", "s", &series, &ChartConfig::default()).unwrap();
        let (lo, hi) = plan.y_bounds();
        assert!(lo.is_finite() && hi.is_finite());
        for frame in plan.frames() {
            for (x, y) in &frame.points {
                assert!(x.is_finite() && y.is_finite());
            }
        }
    }

    #[test]
    fn test_single_point_rejected() {
        let series = Series::new(vec!["Jan".into()], vec![3.4]);
        let err = ChartPlan::new("t", "s", &series, &ChartConfig::default()).unwrap_err();
        assert!(matches!(err, MediaError::Validation(_)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_comparison_job_renders_two_point_series() {
        let job = RenderJob::new(
            "Bitcoin",
            dataviz_models::ChartData::comparison(43000.0, 41000.0),
        );
        let plan = ChartPlan::from_job(&job, &ChartConfig::default()).unwrap();
        assert_eq!(plan.palette(), TrendPalette::Negative);
        assert_eq!(plan.frame(89).unwrap().label, "41,000.00");
    }
}
