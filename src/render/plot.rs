//! Multi-panel raster figure rendered to PNG.
//!
//! Every panel is gated on its variable being present in the dataset. An
//! absent variable prints a message and its panel is left out of the figure.

use super::colormap::{Colormap, Normalize};
use crate::domain::{PanelConfig, PlotConfig};
use crate::grid::{finite_range, Dataset};
use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use ndarray::{Array2, Axis, Ix2};
use std::path::{Path, PathBuf};
use thiserror::Error;

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

const MARGIN_TOP: u32 = 40;
const MARGIN_BOTTOM: u32 = 40;
const MARGIN_LEFT: u32 = 40;
const COLORBAR_GAP: u32 = 12;
const COLORBAR_WIDTH: u32 = 18;
const COLORBAR_TEXT: u32 = 70;

const TITLE_SCALE: f32 = 20.0;
const LABEL_SCALE: f32 = 15.0;

const FONT_CANDIDATES: [&str; 6] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("variable '{variable}' has no leading dimension to index")]
    NoLeadingDimension { variable: String },

    #[error("index {index} is out of range for the leading dimension of '{variable}' (length {len})")]
    LeadingIndexOutOfRange { variable: String, index: usize, len: usize },

    #[error("variable '{variable}' with dimensions ({}) is not a 2-D raster", dims.join(", "))]
    NotTwoDimensional { variable: String, dims: Vec<String> },

    #[error("figure of {width}x{height} pixels is too small for {panels} panel(s)")]
    TooSmall { width: u32, height: u32, panels: usize },

    #[error("failed to read font {}: {source}", path.display())]
    FontRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{} is not a usable TrueType/OpenType font", path.display())]
    InvalidFont { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// A panel whose variable was found and reduced to a 2-D raster.
#[derive(Debug, Clone)]
pub struct Panel {
    pub config: PanelConfig,
    pub values: Array2<f64>,
    pub range: Option<(f64, f64)>,
}

/// What the plotting step did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlotOutcome {
    /// Figure path when at least one panel was drawn.
    pub written: Option<PathBuf>,
    pub rendered: Vec<String>,
    pub skipped: Vec<String>,
}

/// Print whether each expected variable is present and return the absent ones.
pub fn report_presence(dataset: &Dataset, expected: &[String]) -> Vec<String> {
    let mut missing = Vec::new();
    for name in expected {
        match dataset.get(name) {
            Some(var) => println!("Variable '{}' found: ({}) {:?}", name, var.dims.join(", "), var.shape()),
            None => {
                println!("Variable '{}' not found in the dataset.", name);
                missing.push(name.clone());
            }
        }
    }
    missing
}

/// Resolve configured panels against `dataset`.
///
/// `missing` is the result of [`report_presence`]; panels on those variables
/// are dropped without a second message. Present variables that cannot be
/// reduced to 2-D are errors.
pub fn select_panels(
    dataset: &Dataset,
    panels: &[PanelConfig],
    missing: &[String],
) -> Result<(Vec<Panel>, Vec<String>), PlotError> {
    let mut selected = Vec::new();
    let mut skipped = Vec::new();
    for panel in panels {
        let var = match dataset.get(&panel.variable) {
            Some(var) if !missing.contains(&panel.variable) => var,
            _ => {
                tracing::debug!("Skipping panel '{}' on absent variable '{}'", panel.title, panel.variable);
                skipped.push(panel.variable.clone());
                continue;
            }
        };

        let mut view = var.data.view();
        let mut dims = var.dims.clone();
        if let Some(index) = panel.leading_index {
            let len = *view.shape().first().ok_or_else(|| PlotError::NoLeadingDimension {
                variable: panel.variable.clone(),
            })?;
            if index >= len {
                return Err(PlotError::LeadingIndexOutOfRange {
                    variable: panel.variable.clone(),
                    index,
                    len,
                });
            }
            view = view.index_axis_move(Axis(0), index);
            dims.remove(0);
        }

        let values = view
            .into_dimensionality::<Ix2>()
            .map_err(|_| PlotError::NotTwoDimensional { variable: panel.variable.clone(), dims })?
            .to_owned();
        let range = finite_range(values.iter().copied());
        selected.push(Panel { config: panel.clone(), values, range });
    }
    Ok((selected, skipped))
}

/// Render and save the configured figure, leaving out panels whose variable
/// the presence check reported as `missing`.
pub fn plot(dataset: &Dataset, config: &PlotConfig, missing: &[String]) -> Result<PlotOutcome, PlotError> {
    let (panels, skipped) = select_panels(dataset, &config.panels, missing)?;
    let rendered: Vec<String> = panels.iter().map(|p| p.config.variable.clone()).collect();
    if panels.is_empty() {
        println!("No panels to plot; figure not written.");
        return Ok(PlotOutcome { written: None, rendered, skipped });
    }

    let font = load_font(config.font.as_deref())?;
    if font.is_none() {
        tracing::warn!("No usable font found; the figure is drawn without text");
    }
    let figure = render_figure(&panels, config.width, config.height, font.as_ref())?;

    if let Some(parent) = config.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    figure.save(&config.output)?;
    tracing::info!("Wrote figure {}", config.output.display());
    println!("Figure written to {}", config.output.display());
    Ok(PlotOutcome { written: Some(config.output.clone()), rendered, skipped })
}

/// Pixel rectangles of one panel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    /// Origin of the panel column.
    pub left: u32,
    pub width: u32,
    /// Raster placement `(x, y, w, h)`.
    pub image: (u32, u32, u32, u32),
    /// Colorbar placement `(x, y, w, h)`.
    pub colorbar: (u32, u32, u32, u32),
    /// Source cells per output pixel is `1 / scale`.
    pub scale: f64,
}

/// Place a `rows x cols` raster in column `index` of `count` panels.
pub fn layout(
    index: usize,
    count: usize,
    width: u32,
    height: u32,
    rows: usize,
    cols: usize,
) -> Result<PanelLayout, PlotError> {
    let too_small = || PlotError::TooSmall { width, height, panels: count };
    let panel_width = width / count.max(1) as u32;
    let left = panel_width * index as u32;
    let reserved = MARGIN_LEFT + COLORBAR_GAP + COLORBAR_WIDTH + COLORBAR_TEXT;
    let area_w = panel_width.checked_sub(reserved).filter(|w| *w > 0).ok_or_else(too_small)?;
    let area_h = height.checked_sub(MARGIN_TOP + MARGIN_BOTTOM).filter(|h| *h > 0).ok_or_else(too_small)?;

    let scale = if rows == 0 || cols == 0 {
        1.0
    } else {
        (area_w as f64 / cols as f64).min(area_h as f64 / rows as f64)
    };
    let image_w = ((cols as f64 * scale).floor() as u32).clamp(1, area_w);
    let image_h = ((rows as f64 * scale).floor() as u32).clamp(1, area_h);
    let image_x = left + MARGIN_LEFT + (area_w - image_w) / 2;
    let image_y = MARGIN_TOP + (area_h - image_h) / 2;

    Ok(PanelLayout {
        left,
        width: panel_width,
        image: (image_x, image_y, image_w, image_h),
        colorbar: (image_x + image_w + COLORBAR_GAP, image_y, COLORBAR_WIDTH, image_h),
        scale,
    })
}

/// Draw all panels side by side onto a white canvas.
pub fn render_figure(
    panels: &[Panel],
    width: u32,
    height: u32,
    font: Option<&FontVec>,
) -> Result<RgbaImage, PlotError> {
    let mut canvas = RgbaImage::from_pixel(width, height, WHITE);
    for (i, panel) in panels.iter().enumerate() {
        let (rows, cols) = panel.values.dim();
        let place = layout(i, panels.len(), width, height, rows, cols)?;
        draw_panel(&mut canvas, panel, &place, font);
    }
    Ok(canvas)
}

fn draw_panel(canvas: &mut RgbaImage, panel: &Panel, place: &PanelLayout, font: Option<&FontVec>) {
    let cmap = Colormap::named(panel.config.colormap);
    let (lo, hi) = panel.range.unwrap_or((0.0, 0.0));
    let norm = Normalize::new(lo, hi);
    let (rows, cols) = panel.values.dim();

    let (ix, iy, iw, ih) = place.image;
    if rows > 0 && cols > 0 {
        for py in 0..ih {
            let row = ((py as f64 / place.scale) as usize).min(rows - 1);
            for px in 0..iw {
                let col = ((px as f64 / place.scale) as usize).min(cols - 1);
                let color = norm.position(panel.values[[row, col]]).map_or(WHITE, |t| cmap.at(t));
                canvas.put_pixel(ix + px, iy + py, color);
            }
        }
    }
    draw_frame(canvas, place.image);

    let (cx, cy, cw, ch) = place.colorbar;
    for py in 0..ch {
        // Top of the bar is the maximum.
        let t = if ch > 1 { 1.0 - py as f64 / (ch - 1) as f64 } else { 1.0 };
        draw_filled_rect_mut(canvas, Rect::at(cx as i32, (cy + py) as i32).of_size(cw, 1), cmap.at(t));
    }
    draw_frame(canvas, place.colorbar);

    let Some(font) = font else {
        return;
    };
    let center_x = place.left + place.width / 2;
    draw_centered(canvas, font, TITLE_SCALE, center_x, 10, &panel.config.title);
    draw_centered(canvas, font, LABEL_SCALE, ix + iw / 2, iy + ih + 12, "X");
    draw_text_mut(canvas, BLACK, (place.left + 12) as i32, (iy + ih / 2) as i32, PxScale::from(LABEL_SCALE), font, "Y");

    let tick_x = (cx + cw + 4) as i32;
    draw_text_mut(canvas, BLACK, tick_x, cy as i32, PxScale::from(LABEL_SCALE), font, &format_tick(hi));
    let bottom = (cy + ch).saturating_sub(LABEL_SCALE as u32) as i32;
    draw_text_mut(canvas, BLACK, tick_x, bottom, PxScale::from(LABEL_SCALE), font, &format_tick(lo));
    draw_text_mut(
        canvas,
        BLACK,
        tick_x,
        (cy + ch / 2) as i32,
        PxScale::from(LABEL_SCALE),
        font,
        &panel.config.colorbar_label,
    );
}

fn draw_frame(canvas: &mut RgbaImage, (x, y, w, h): (u32, u32, u32, u32)) {
    let rect = Rect::at(x as i32 - 1, y as i32 - 1).of_size(w + 2, h + 2);
    draw_hollow_rect_mut(canvas, rect, BLACK);
}

fn draw_centered(canvas: &mut RgbaImage, font: &FontVec, scale: f32, center_x: u32, y: u32, text: &str) {
    let (w, _) = text_size(PxScale::from(scale), font, text);
    let x = center_x.saturating_sub(w / 2);
    draw_text_mut(canvas, BLACK, x as i32, y as i32, PxScale::from(scale), font, text);
}

fn format_tick(v: f64) -> String {
    if v.abs() >= 1000.0 || (v != 0.0 && v.abs() < 0.01) {
        format!("{v:.2e}")
    } else {
        format!("{v:.2}")
    }
}

/// Load the configured font, or the first usable system font.
///
/// An explicitly configured font must load; discovery failures only mean
/// the figure has no text.
pub fn load_font(path: Option<&Path>) -> Result<Option<FontVec>, PlotError> {
    if let Some(path) = path {
        let bytes = std::fs::read(path)
            .map_err(|source| PlotError::FontRead { path: path.to_path_buf(), source })?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|_| PlotError::InvalidFont { path: path.to_path_buf() })?;
        return Ok(Some(font));
    }

    for candidate in FONT_CANDIDATES {
        let Ok(bytes) = std::fs::read(candidate) else {
            continue;
        };
        if let Ok(font) = FontVec::try_from_vec(bytes) {
            tracing::debug!("Using font {}", candidate);
            return Ok(Some(font));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ColormapName;
    use crate::test_utils::{axis, field_2d, field_3d, grid};
    use tempfile::TempDir;

    fn panel(variable: &str, leading_index: Option<usize>) -> PanelConfig {
        PanelConfig {
            variable: variable.to_string(),
            title: variable.to_string(),
            colormap: ColormapName::Blues,
            colorbar_label: "units".to_string(),
            leading_index,
        }
    }

    fn combined() -> Dataset {
        grid("combined", axis(4), axis(3))
            .with_variable("F16_ICECON", field_3d(2, 3, 4, |t, y, x| (t * 100 + y * 4 + x) as f64))
            .with_variable("sea_ice_thickness", field_2d(3, 4, |y, _| y as f64))
    }

    #[test]
    fn presence_report_lists_missing_variables() {
        let expected = vec!["F16_ICECON".to_string(), "ice_con".to_string()];
        assert_eq!(report_presence(&combined(), &expected), vec!["ice_con".to_string()]);
    }

    #[test]
    fn absent_variable_skips_panel_without_error() {
        let panels = vec![panel("ice_con", None), panel("sea_ice_thickness", None)];
        let missing = report_presence(&combined(), &["ice_con".to_string()]);
        let (selected, skipped) = select_panels(&combined(), &panels, &missing).expect("select");
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].config.variable, "sea_ice_thickness");
        assert_eq!(skipped, vec!["ice_con".to_string()]);
    }

    #[test]
    fn presence_result_is_the_only_gate() {
        // Reported missing, so not drawn even though the dataset holds it.
        let panels = vec![panel("sea_ice_thickness", None)];
        let missing = vec!["sea_ice_thickness".to_string()];
        let (selected, skipped) = select_panels(&combined(), &panels, &missing).expect("select");
        assert!(selected.is_empty());
        assert_eq!(skipped, missing);
    }

    #[test]
    fn checked_variables_cover_every_panel() {
        let config = PlotConfig {
            expected_variables: vec!["ice_con".to_string()],
            panels: vec![panel("F16_ICECON", Some(0)), panel("ice_con", None)],
            ..PlotConfig::default()
        };
        assert_eq!(config.checked_variables(), vec!["ice_con", "F16_ICECON"]);
    }

    #[test]
    fn leading_index_selects_slice() {
        let (selected, _) = select_panels(&combined(), &[panel("F16_ICECON", Some(1))], &[]).expect("select");
        assert_eq!(selected[0].values.dim(), (3, 4));
        assert_eq!(selected[0].values[[2, 3]], 111.0);
        assert_eq!(selected[0].range, Some((100.0, 111.0)));
    }

    #[test]
    fn leading_index_out_of_range_is_an_error() {
        let err = select_panels(&combined(), &[panel("F16_ICECON", Some(5))], &[]).unwrap_err();
        assert!(matches!(err, PlotError::LeadingIndexOutOfRange { index: 5, len: 2, .. }));
    }

    #[test]
    fn three_dimensional_without_index_is_an_error() {
        let err = select_panels(&combined(), &[panel("F16_ICECON", None)], &[]).unwrap_err();
        assert!(matches!(err, PlotError::NotTwoDimensional { .. }));
    }

    #[test]
    fn layout_preserves_aspect_and_fits_panel() {
        let place = layout(1, 2, 1200, 600, 448, 304).expect("layout");
        let (x, y, w, h) = place.image;
        assert_eq!(place.left, 600);
        assert!(x >= 600 + MARGIN_LEFT);
        assert!(y >= MARGIN_TOP);
        assert!(h <= 600 - MARGIN_TOP - MARGIN_BOTTOM);
        assert!(place.colorbar.0 + COLORBAR_WIDTH + COLORBAR_TEXT <= 1200);
        let aspect = w as f64 / h as f64;
        assert!((aspect - 304.0 / 448.0).abs() < 0.02);
    }

    #[test]
    fn layout_rejects_tiny_figure() {
        assert!(matches!(layout(0, 2, 100, 60, 10, 10), Err(PlotError::TooSmall { .. })));
    }

    #[test]
    fn raster_colors_follow_data() {
        let values = Array2::from_shape_fn((2, 2), |(y, x)| match (y, x) {
            (0, 0) => 0.0,
            (1, 1) => f64::NAN,
            _ => 1.0,
        });
        let range = finite_range(values.iter().copied());
        let panels = vec![Panel { config: panel("v", None), values, range }];
        let image = render_figure(&panels, 400, 300, None).expect("render");
        let place = layout(0, 1, 400, 300, 2, 2).expect("layout");
        let (x, y, w, h) = place.image;
        let cmap = Colormap::named(ColormapName::Blues);

        assert_eq!(*image.get_pixel(x, y), cmap.at(0.0));
        assert_eq!(*image.get_pixel(x + w - 1, y), cmap.at(1.0));
        assert_eq!(*image.get_pixel(x + w - 1, y + h - 1), WHITE);
        let (cx, cy, _, _) = place.colorbar;
        assert_eq!(*image.get_pixel(cx + 2, cy), cmap.at(1.0));
    }

    #[test]
    fn plot_writes_png_for_present_panels() {
        let tmp = TempDir::new().expect("tmp");
        let output = tmp.path().join("figure/sea_ice.png");
        let config = PlotConfig {
            output: output.clone(),
            panels: vec![panel("F16_ICECON", Some(0)), panel("sea_ice_thickness", None), panel("ice_con", None)],
            ..PlotConfig::default()
        };

        let missing = report_presence(&combined(), &config.checked_variables());
        let outcome = plot(&combined(), &config, &missing).expect("plot");
        assert_eq!(outcome.written, Some(output.clone()));
        assert_eq!(outcome.rendered, vec!["F16_ICECON", "sea_ice_thickness"]);
        assert_eq!(outcome.skipped, vec!["ice_con"]);
        let written = image::open(&output).expect("png");
        assert_eq!((written.width(), written.height()), (1200, 600));
    }

    #[test]
    fn plot_without_present_panels_writes_nothing() {
        let tmp = TempDir::new().expect("tmp");
        let output = tmp.path().join("none.png");
        let config = PlotConfig { output: output.clone(), panels: vec![panel("ice_con", None)], ..PlotConfig::default() };

        let outcome = plot(&combined(), &config, &["ice_con".to_string()]).expect("plot");
        assert_eq!(outcome.written, None);
        assert!(!output.exists());
    }

    #[test]
    fn explicit_missing_font_is_an_error() {
        let tmp = TempDir::new().expect("tmp");
        let err = load_font(Some(&tmp.path().join("nope.ttf"))).unwrap_err();
        assert!(matches!(err, PlotError::FontRead { .. }));
    }
}
