//! Chart Renderer: progressive line reveal of a numeric series.
//!
//! Geometry is computed once per job by [`ChartPlan`] and is a pure
//! function of the series and [`ChartConfig`]. Rasterization is a separate
//! step so tests can assert geometry without depending on fonts.

mod config;
mod font;
mod layout;
mod palette;
mod raster;
mod series;

pub use config::{ChartConfig, DEFAULT_TOTAL_FRAMES};
pub use font::{load_font, resolve_font_path};
pub use layout::{ChartPlan, FrameGeometry, PlotArea, Tick};
pub use palette::TrendPalette;
pub use raster::FrameRasterizer;
pub use series::{format_value, resample, y_bounds};
