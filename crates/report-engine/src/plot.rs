//! Displacement-over-time plot.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontRef, FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size,
};
use imageproc::rect::Rect;

use marktrack_common::error::{MarktrackError, MarktrackResult};
use marktrack_model::sample::LengthUnit;
use marktrack_model::series::{DisplacementSeries, DisplacementSummary, MarkerPair};

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME: Rgb<u8> = Rgb([60, 60, 60]);
const GRID: Rgb<u8> = Rgb([225, 225, 225]);
const TEXT: Rgb<u8> = Rgb([20, 20, 20]);
pub const SERIES_COLOR: Rgb<u8> = Rgb([31, 119, 180]);
pub const INITIAL_COLOR: Rgb<u8> = Rgb([255, 127, 14]);
pub const FINAL_COLOR: Rgb<u8> = Rgb([148, 103, 189]);
pub const ARROW_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

const MARGIN_LEFT: f32 = 70.0;
const MARGIN_RIGHT: f32 = 30.0;
const MARGIN_TOP: f32 = 40.0;
const MARGIN_BOTTOM: f32 = 50.0;
const GRID_DIVISIONS: u32 = 5;
const DASH_ON: f32 = 8.0;
const DASH_OFF: f32 = 5.0;
const ARROW_HEAD: f32 = 8.0;
/// Horizontal position of the net arrow as a fraction of the time span.
const ARROW_AT: f64 = 0.85;

/// Label font compiled into the binary (DejaVu Sans).
static BUNDLED_FONT: &[u8] = include_bytes!("../resources/DejaVuSans.ttf");

/// Plot size and label font.
#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub width: u32,
    pub height: u32,
    /// Overrides the bundled label font.
    pub font_path: Option<PathBuf>,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            font_path: None,
        }
    }
}

/// Plot image path derived from the CSV log path.
pub fn plot_path_for(log_path: &Path) -> PathBuf {
    let stem = log_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "marker_tracking".to_string());
    log_path.with_file_name(format!("{stem}_displacement.png"))
}

/// The label font shipped with the crate.
pub fn bundled_font() -> MarktrackResult<FontRef<'static>> {
    FontRef::try_from_slice(BUNDLED_FONT)
        .map_err(|_| MarktrackError::report("bundled plot font is invalid"))
}

/// Load a TrueType/OpenType font for labels.
pub fn load_font(path: &Path) -> MarktrackResult<FontVec> {
    let bytes = std::fs::read(path).map_err(|e| {
        MarktrackError::report(format!("cannot read font {}: {e}", path.display()))
    })?;
    FontVec::try_from_vec(bytes)
        .map_err(|_| MarktrackError::report(format!("invalid font file {}", path.display())))
}

/// Maps data coordinates into the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotLayout {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub t_min: f64,
    pub t_max: f64,
    pub v_min: f64,
    pub v_max: f64,
}

impl PlotLayout {
    /// Fit the layout to a non-empty series. Degenerate ranges (a single
    /// point, or a constant separation) are padded so the mapping stays
    /// finite.
    pub fn fit(series: &DisplacementSeries, width: u32, height: u32) -> Option<Self> {
        let points = series.points();
        let first = points.first()?;
        let last = points.last()?;

        let (mut t_min, mut t_max) = (first.timestamp.seconds, last.timestamp.seconds);
        if t_max - t_min <= f64::EPSILON {
            t_min -= 0.5;
            t_max += 0.5;
        }

        let (lo, hi) = points.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
            (lo.min(p.separation), hi.max(p.separation))
        });
        let span = hi - lo;
        let pad = if span <= f64::EPSILON { 1.0 } else { span * 0.1 };

        Some(Self {
            left: MARGIN_LEFT,
            top: MARGIN_TOP,
            right: (width as f32 - MARGIN_RIGHT).max(MARGIN_LEFT + 1.0),
            bottom: (height as f32 - MARGIN_BOTTOM).max(MARGIN_TOP + 1.0),
            t_min,
            t_max,
            v_min: lo - pad,
            v_max: hi + pad,
        })
    }

    pub fn x(&self, t: f64) -> f32 {
        let frac = (t - self.t_min) / (self.t_max - self.t_min);
        self.left + (frac as f32) * (self.right - self.left)
    }

    pub fn y(&self, v: f64) -> f32 {
        let frac = (v - self.v_min) / (self.v_max - self.v_min);
        self.bottom - (frac as f32) * (self.bottom - self.top)
    }

    /// Time at which the net arrow is drawn.
    pub fn arrow_time(&self) -> f64 {
        self.t_min + ARROW_AT * (self.t_max - self.t_min)
    }
}

/// Render the plot. Fails for an empty series.
pub fn render_displacement_plot<F: Font>(
    series: &DisplacementSeries,
    pair: MarkerPair,
    unit: LengthUnit,
    config: &PlotConfig,
    font: &F,
) -> MarktrackResult<RgbImage> {
    let summary = series
        .summary()
        .ok_or_else(|| MarktrackError::report("cannot plot an empty displacement series"))?;
    let layout = PlotLayout::fit(series, config.width, config.height)
        .ok_or_else(|| MarktrackError::report("cannot plot an empty displacement series"))?;

    let mut img = RgbImage::from_pixel(config.width, config.height, BACKGROUND);

    draw_grid(&mut img, &layout);
    draw_dashed_hline(&mut img, &layout, layout.y(summary.first_separation), INITIAL_COLOR);
    draw_dashed_hline(&mut img, &layout, layout.y(summary.last_separation), FINAL_COLOR);

    let pixels: Vec<(f32, f32)> = series
        .points()
        .iter()
        .map(|p| (layout.x(p.timestamp.seconds), layout.y(p.separation)))
        .collect();
    for segment in pixels.windows(2) {
        draw_line_segment_mut(&mut img, segment[0], segment[1], SERIES_COLOR);
    }
    for &(x, y) in &pixels {
        draw_filled_circle_mut(&mut img, (x.round() as i32, y.round() as i32), 3, SERIES_COLOR);
    }

    let arrow_x = layout.x(layout.arrow_time());
    draw_double_arrow(
        &mut img,
        arrow_x,
        layout.y(summary.first_separation),
        layout.y(summary.last_separation),
    );

    draw_labels(&mut img, &layout, &summary, pair, unit, font);

    Ok(img)
}

/// Render the plot and save it as PNG.
///
/// A configured font that cannot be loaded falls back to the bundled one.
pub fn write_displacement_plot(
    path: &Path,
    series: &DisplacementSeries,
    pair: MarkerPair,
    unit: LengthUnit,
    config: &PlotConfig,
) -> MarktrackResult<()> {
    let custom = config
        .font_path
        .as_deref()
        .and_then(|font_path| match load_font(font_path) {
            Ok(font) => Some(font),
            Err(e) => {
                tracing::warn!(error = %e, "Using the bundled plot font");
                None
            }
        });

    let img = match &custom {
        Some(font) => render_displacement_plot(series, pair, unit, config, font)?,
        None => render_displacement_plot(series, pair, unit, config, &bundled_font()?)?,
    };
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    img.save(path)
        .map_err(|e| MarktrackError::report(format!("failed to save plot: {e}")))?;
    tracing::info!(path = %path.display(), points = series.len(), "Displacement plot saved");
    Ok(())
}

fn draw_grid(img: &mut RgbImage, layout: &PlotLayout) {
    for i in 0..=GRID_DIVISIONS {
        let f = i as f32 / GRID_DIVISIONS as f32;
        let x = layout.left + f * (layout.right - layout.left);
        let y = layout.top + f * (layout.bottom - layout.top);
        draw_line_segment_mut(img, (x, layout.top), (x, layout.bottom), GRID);
        draw_line_segment_mut(img, (layout.left, y), (layout.right, y), GRID);
    }

    let w = (layout.right - layout.left).round().max(1.0) as u32;
    let h = (layout.bottom - layout.top).round().max(1.0) as u32;
    draw_hollow_rect_mut(
        img,
        Rect::at(layout.left.round() as i32, layout.top.round() as i32).of_size(w, h),
        FRAME,
    );
}

fn draw_dashed_hline(img: &mut RgbImage, layout: &PlotLayout, y: f32, color: Rgb<u8>) {
    let mut x = layout.left;
    while x < layout.right {
        let end = (x + DASH_ON).min(layout.right);
        draw_line_segment_mut(img, (x, y), (end, y), color);
        x += DASH_ON + DASH_OFF;
    }
}

fn draw_double_arrow(img: &mut RgbImage, x: f32, y_from: f32, y_to: f32) {
    for dx in [0.0, 1.0] {
        draw_line_segment_mut(img, (x + dx, y_from), (x + dx, y_to), ARROW_COLOR);
    }
    if (y_to - y_from).abs() < 1.0 {
        return;
    }

    // Heads point away from the shaft at both ends.
    let dir = if y_to > y_from { 1.0 } else { -1.0 };
    for (tip, outward) in [(y_to, dir), (y_from, -dir)] {
        let base = tip - outward * ARROW_HEAD;
        draw_line_segment_mut(img, (x, tip), (x - ARROW_HEAD / 2.0, base), ARROW_COLOR);
        draw_line_segment_mut(img, (x + 1.0, tip), (x + 1.0 + ARROW_HEAD / 2.0, base), ARROW_COLOR);
    }
}

fn draw_labels<F: Font>(
    img: &mut RgbImage,
    layout: &PlotLayout,
    summary: &DisplacementSummary,
    pair: MarkerPair,
    unit: LengthUnit,
    font: &F,
) {
    let title_scale = PxScale::from(18.0);
    let label_scale = PxScale::from(14.0);
    let tick_scale = PxScale::from(11.0);

    let title = format!(
        "Vertical displacement between ID {} and ID {}",
        pair.reference, pair.target
    );
    let (tw, _) = text_size(title_scale, font, &title);
    let cx = ((layout.left + layout.right) / 2.0) as i32 - tw as i32 / 2;
    draw_text_mut(img, TEXT, cx, 10, title_scale, font, &title);

    let x_label = "Time (s)";
    let (xw, _) = text_size(label_scale, font, x_label);
    let cx = ((layout.left + layout.right) / 2.0) as i32 - xw as i32 / 2;
    draw_text_mut(img, TEXT, cx, layout.bottom as i32 + 28, label_scale, font, x_label);

    let y_label = format!("Displacement ({unit})");
    draw_text_mut(img, TEXT, 4, layout.top as i32 - 20, label_scale, font, &y_label);

    for i in 0..=GRID_DIVISIONS {
        let f = i as f64 / GRID_DIVISIONS as f64;
        let t = layout.t_min + f * (layout.t_max - layout.t_min);
        let v = layout.v_min + f * (layout.v_max - layout.v_min);

        let t_text = format!("{t:.2}");
        let (w, _) = text_size(tick_scale, font, &t_text);
        draw_text_mut(
            img,
            TEXT,
            layout.x(t) as i32 - w as i32 / 2,
            layout.bottom as i32 + 6,
            tick_scale,
            font,
            &t_text,
        );

        let v_text = format!("{v:.2}");
        let (w, h) = text_size(tick_scale, font, &v_text);
        draw_text_mut(
            img,
            TEXT,
            layout.left as i32 - w as i32 - 6,
            layout.y(v) as i32 - h as i32 / 2,
            tick_scale,
            font,
            &v_text,
        );
    }

    let first_y = layout.y(summary.first_separation);
    let last_y = layout.y(summary.last_separation);

    let net_text = format!("{:.2} {unit}", summary.net);
    let arrow_x = layout.x(layout.arrow_time());
    draw_text_mut(
        img,
        ARROW_COLOR,
        arrow_x as i32 + 6,
        ((first_y + last_y) / 2.0) as i32 - 7,
        label_scale,
        font,
        &net_text,
    );

    let start_text = format!("Start: {:.2} {unit}", summary.first_separation);
    draw_text_mut(
        img,
        INITIAL_COLOR,
        layout.x(summary.first_time_secs) as i32 + 4,
        first_y as i32 - 18,
        label_scale,
        font,
        &start_text,
    );

    let final_text = format!("Final: {:.2} {unit}", summary.last_separation);
    let (fw, _) = text_size(label_scale, font, &final_text);
    draw_text_mut(
        img,
        FINAL_COLOR,
        layout.x(summary.last_time_secs) as i32 - fw as i32 - 4,
        last_y as i32 + 4,
        label_scale,
        font,
        &final_text,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use marktrack_model::sample::Timestamp;

    fn series(points: &[(u64, f64, f64)]) -> DisplacementSeries {
        let mut s = DisplacementSeries::new();
        for &(frame, t, v) in points {
            s.push(Timestamp::new(frame, t), v).unwrap();
        }
        s
    }

    #[test]
    fn test_plot_path_next_to_log() {
        assert_eq!(
            plot_path_for(Path::new("/data/marker_tracking_20260101-000000.csv")),
            PathBuf::from("/data/marker_tracking_20260101-000000_displacement.png")
        );
    }

    #[test]
    fn test_layout_maps_extremes_inside_area() {
        let s = series(&[(0, 0.0, 50.0), (30, 1.0, 20.0)]);
        let layout = PlotLayout::fit(&s, 800, 400).unwrap();
        assert!((layout.x(0.0) - layout.left).abs() < 1e-3);
        assert!((layout.x(1.0) - layout.right).abs() < 1e-3);
        assert!(layout.y(50.0) > layout.top && layout.y(50.0) < layout.bottom);
        assert!(layout.y(20.0) > layout.y(50.0));
    }

    #[test]
    fn test_layout_pads_single_point() {
        let s = series(&[(3, 0.1, 12.0)]);
        let layout = PlotLayout::fit(&s, 800, 400).unwrap();
        assert!(layout.t_max > layout.t_min);
        assert!(layout.v_max > layout.v_min);
        assert!(layout.x(0.1).is_finite());
        assert!(layout.y(12.0).is_finite());
    }

    #[test]
    fn test_empty_series_is_rejected() {
        let err = render_displacement_plot(
            &DisplacementSeries::new(),
            MarkerPair::default(),
            LengthUnit::Millimeters,
            &PlotConfig::default(),
            &bundled_font().unwrap(),
        )
        .unwrap_err();
        assert!(matches!(err, MarktrackError::Report { .. }));
    }

    #[test]
    fn test_render_draws_points_and_arrow() {
        let s = series(&[(0, 0.0, 50.0), (15, 0.5, 35.0), (30, 1.0, 20.0)]);
        let config = PlotConfig::default();
        let img = render_displacement_plot(
            &s,
            MarkerPair::default(),
            LengthUnit::Millimeters,
            &config,
            &bundled_font().unwrap(),
        )
        .unwrap();
        assert_eq!(img.dimensions(), (800, 400));

        let layout = PlotLayout::fit(&s, 800, 400).unwrap();
        let mid = (layout.x(0.5).round() as u32, layout.y(35.0).round() as u32);
        assert_eq!(*img.get_pixel(mid.0, mid.1), SERIES_COLOR);

        let arrow_x = layout.x(layout.arrow_time()).round() as u32;
        let arrow_mid = ((layout.y(50.0) + layout.y(20.0)) / 2.0).round() as u32;
        assert_eq!(*img.get_pixel(arrow_x, arrow_mid), ARROW_COLOR);

        assert_eq!(*img.get_pixel(2, 2), BACKGROUND);
    }

    fn count_pixels(
        img: &RgbImage,
        xs: std::ops::Range<u32>,
        ys: std::ops::Range<u32>,
        matches: impl Fn(&Rgb<u8>) -> bool,
    ) -> usize {
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| matches(img.get_pixel(x, y)))
            .count()
    }

    #[test]
    fn test_default_plot_labels_net_value() {
        let s = series(&[(0, 0.0, 50.0), (30, 1.0, 20.0)]);
        let config = PlotConfig::default();
        assert!(config.font_path.is_none());

        let img = render_displacement_plot(
            &s,
            MarkerPair::default(),
            LengthUnit::Millimeters,
            &config,
            &bundled_font().unwrap(),
        )
        .unwrap();

        let layout = PlotLayout::fit(&s, config.width, config.height).unwrap();
        let arrow_x = layout.x(layout.arrow_time()).round() as u32;
        let mid_y = ((layout.y(50.0) + layout.y(20.0)) / 2.0).round() as u32;
        let bluish = |p: &Rgb<u8>| p[2] > 180 && p[0] < 120 && p[1] < 120;
        let net_label = count_pixels(
            &img,
            arrow_x + 8..config.width,
            mid_y - 12..mid_y + 12,
            bluish,
        );
        assert!(net_label > 20, "net label pixels: {net_label}");

        let dark = |p: &Rgb<u8>| p[0] < 100 && p[1] < 100 && p[2] < 100;
        let title = count_pixels(&img, 0..config.width, 0..layout.top as u32 - 4, dark);
        assert!(title > 50, "title pixels: {title}");
    }

    #[test]
    fn test_missing_font_falls_back_to_bundled() {
        let dir = std::env::temp_dir().join("marktrack_test_plot");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("plot.png");
        let config = PlotConfig {
            width: 320,
            height: 200,
            font_path: Some(dir.join("missing.ttf")),
        };

        write_displacement_plot(
            &path,
            &series(&[(0, 0.0, 5.0), (10, 0.4, 5.0)]),
            MarkerPair::default(),
            LengthUnit::Pixels,
            &config,
        )
        .unwrap();

        let saved = image::open(&path).unwrap().to_rgb8();
        assert_eq!(saved.dimensions(), (320, 200));
        let dark = |p: &Rgb<u8>| p[0] < 100 && p[1] < 100 && p[2] < 100;
        assert!(count_pixels(&saved, 0..320, 0..30, dark) > 0);

        std::fs::remove_dir_all(&dir).ok();
    }
}
