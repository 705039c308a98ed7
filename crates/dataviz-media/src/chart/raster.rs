//! Pixel rendering of planned frames.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use rusttype::{Font, Scale};

use super::layout::{ChartPlan, FrameGeometry};
use super::palette::{BACKGROUND, CITATION, GRID, MUTED, TEXT};

const TITLE_SIZE: f32 = 72.0;
const VALUE_SIZE: f32 = 120.0;
const TICK_SIZE: f32 = 30.0;
const SOURCE_SIZE: f32 = 34.0;

const DASH_LEN: u32 = 4;
const DASH_GAP: u32 = 8;

/// Draws frames of one plan on top of pre-rendered chrome.
///
/// Title, citation, gridlines and tick labels do not change between
/// frames, so they are drawn once into a base image that every frame
/// starts from.
pub struct FrameRasterizer<'a> {
    plan: &'a ChartPlan,
    font: Option<&'a Font<'a>>,
    chrome: RgbImage,
}

impl<'a> FrameRasterizer<'a> {
    pub fn new(plan: &'a ChartPlan, font: Option<&'a Font<'a>>) -> Self {
        let chrome = draw_chrome(plan, font);
        Self { plan, font, chrome }
    }

    /// Render one frame: revealed curve, head marker and value label.
    pub fn render(&self, frame: &FrameGeometry) -> RgbImage {
        let mut img = self.chrome.clone();
        let accent = self.plan.palette().accent();
        let width = self.plan.line_width();

        draw_thick_polyline(&mut img, &frame.points, width, accent);

        if let Some((x, y)) = frame.head() {
            let center = (x.round() as i32, y.round() as i32);
            draw_filled_circle_mut(&mut img, center, (width * 2) as i32, accent);
            draw_filled_circle_mut(&mut img, center, (width / 2).max(1) as i32, TEXT);
        }

        if let Some(font) = self.font {
            let area = self.plan.plot_area();
            let size = fit_size(font, &frame.label, VALUE_SIZE, area.width());
            let top = area.value_label_y() - size / 2.0;
            draw_centered(&mut img, font, &frame.label, size, self.plan.width() as f32 / 2.0, top, accent);
        }

        img
    }
}

fn draw_chrome(plan: &ChartPlan, font: Option<&Font<'_>>) -> RgbImage {
    let mut img = RgbImage::from_pixel(plan.width(), plan.height(), BACKGROUND);
    let area = *plan.plot_area();
    let canvas_w = plan.width() as f32;
    let canvas_h = plan.height() as f32;

    for tick in plan.y_ticks() {
        draw_dotted_hline(&mut img, area.left, area.right, tick.position, GRID);
    }
    draw_hline(&mut img, area.left, area.right, area.bottom, GRID);

    let Some(font) = font else {
        return img;
    };

    let title_size = fit_size(font, plan.title(), TITLE_SIZE, canvas_w * 0.9);
    draw_centered(&mut img, font, plan.title(), title_size, canvas_w / 2.0, canvas_h * 0.07, TEXT);

    if !plan.source().is_empty() {
        let citation = format!("Source: {}", plan.source());
        let size = fit_size(font, &citation, SOURCE_SIZE, canvas_w * 0.9);
        draw_centered(&mut img, font, &citation, size, canvas_w / 2.0, canvas_h * 0.94, CITATION);
    }

    let scale = Scale::uniform(TICK_SIZE);
    for tick in plan.x_ticks() {
        draw_centered(&mut img, font, &tick.label, TICK_SIZE, tick.position, area.bottom + 18.0, MUTED);
    }
    for tick in plan.y_ticks() {
        let (w, h) = text_size(scale, font, &tick.label);
        let x = (area.left - 12.0 - w as f32).max(0.0);
        let y = tick.position - h as f32 / 2.0;
        draw_text_mut(&mut img, MUTED, x.round() as i32, y.round() as i32, scale, font, &tick.label);
    }

    img
}

/// Stroke a polyline by stamping discs along every segment.
fn draw_thick_polyline(img: &mut RgbImage, points: &[(f32, f32)], width: u32, color: Rgb<u8>) {
    let radius = (width / 2).max(1) as i32;
    let stamp = |img: &mut RgbImage, x: f32, y: f32| {
        draw_filled_circle_mut(img, (x.round() as i32, y.round() as i32), radius, color);
    };

    match points {
        [] => {}
        [(x, y)] => stamp(img, *x, *y),
        _ => {
            for pair in points.windows(2) {
                let (x0, y0) = pair[0];
                let (x1, y1) = pair[1];
                let steps = (x1 - x0).hypot(y1 - y0).ceil().max(1.0) as usize;
                for s in 0..=steps {
                    let t = s as f32 / steps as f32;
                    stamp(img, x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
                }
            }
        }
    }
}

fn draw_hline(img: &mut RgbImage, from: f32, to: f32, y: f32, color: Rgb<u8>) {
    let width = (to - from).max(1.0) as u32;
    draw_filled_rect_mut(
        img,
        Rect::at(from.round() as i32, y.round() as i32).of_size(width, 2),
        color,
    );
}

fn draw_dotted_hline(img: &mut RgbImage, from: f32, to: f32, y: f32, color: Rgb<u8>) {
    let mut x = from.round() as i32;
    let end = to.round() as i32;
    while x < end {
        draw_filled_rect_mut(img, Rect::at(x, y.round() as i32).of_size(DASH_LEN, 2), color);
        x += (DASH_LEN + DASH_GAP) as i32;
    }
}

fn draw_centered(
    img: &mut RgbImage,
    font: &Font<'_>,
    text: &str,
    size: f32,
    center_x: f32,
    top: f32,
    color: Rgb<u8>,
) {
    let scale = Scale::uniform(size);
    let (w, _) = text_size(scale, font, text);
    let x = center_x - w as f32 / 2.0;
    draw_text_mut(img, color, x.round() as i32, top.round() as i32, scale, font, text);
}

/// Shrink `size` until `text` fits in `max_width`.
fn fit_size(font: &Font<'_>, text: &str, size: f32, max_width: f32) -> f32 {
    let (w, _) = text_size(Scale::uniform(size), font, text);
    if w as f32 > max_width && w > 0 {
        size * max_width / w as f32
    } else {
        size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::{ChartConfig, TrendPalette};
    use dataviz_models::Series;

    fn small_plan(values: Vec<f64>) -> ChartPlan {
        let labels = (0..values.len()).map(|i| format!("P{}", i)).collect();
        let config = ChartConfig {
            width: 108,
            height: 192,
            line_width: 2,
            total_frames: 10,
            ..ChartConfig::default()
        };
        ChartPlan::new("t", "s", &Series::new(labels, values), &config).unwrap()
    }

    #[test]
    fn test_frame_has_canvas_size_and_background() {
        let plan = small_plan(vec![1.0, 2.0]);
        let raster = FrameRasterizer::new(&plan, None);
        let img = raster.render(&plan.frame(0).unwrap());
        assert_eq!(img.dimensions(), (108, 192));
        assert_eq!(*img.get_pixel(1, 1), BACKGROUND);
    }

    #[test]
    fn test_curve_uses_trend_accent() {
        for (values, palette) in [
            (vec![1.0, 2.0], TrendPalette::Positive),
            (vec![2.0, 1.0], TrendPalette::Negative),
        ] {
            let plan = small_plan(values);
            let raster = FrameRasterizer::new(&plan, None);
            let frame = plan.frame(plan.total_frames() - 1).unwrap();
            let img = raster.render(&frame);

            let (x, y) = frame.points[frame.points.len() / 2];
            assert_eq!(*img.get_pixel(x.round() as u32, y.round() as u32), palette.accent());
        }
    }
}
