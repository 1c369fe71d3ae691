use crate::canvas::{Command, Document};
use crate::error::{Result, TableChartError};
use crate::font::FontRegistry;
use crate::types::{Color, Rect as PxRect};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Stroke, Transform};
use ttf_parser::OutlineBuilder;

/// Rasterizes a recorded document to PNG bytes at one pixel per canvas unit.
pub(crate) fn document_to_png(document: &Document, fonts: Option<&FontRegistry>) -> Result<Vec<u8>> {
    let width = document.size.width;
    let height = document.size.height;
    let mut pixmap = Pixmap::new(width, height).ok_or_else(|| {
        TableChartError::RenderFailure(format!("invalid raster size {width}x{height}"))
    })?;
    let background = document.background.unwrap_or(Color::WHITE);
    pixmap.fill(to_sk_color(background));

    let font = fonts
        .and_then(|registry| registry.resolve(&document.font_family))
        .or_else(|| FontRegistry::new().resolve(&document.font_family));
    if let Some(font) = font.as_ref() {
        log::debug!("raster: drawing text with font {}", font.name);
    }
    let mut skipped_text = 0usize;

    for cmd in &document.commands {
        match cmd {
            Command::FillRect { rect, color } => {
                if let Some(path) = rect_path(*rect) {
                    pixmap.fill_path(
                        &path,
                        &paint(*color),
                        FillRule::Winding,
                        Transform::identity(),
                        None,
                    );
                }
            }
            Command::StrokeRect { rect, color, width } => {
                if let Some(path) = rect_path(*rect) {
                    let stroke = Stroke {
                        width: width.max(0.0),
                        ..Stroke::default()
                    };
                    pixmap.stroke_path(&path, &paint(*color), &stroke, Transform::identity(), None);
                }
            }
            Command::Text {
                x,
                y,
                text,
                color,
                font_size,
            } => {
                let Some(font) = font.as_ref() else {
                    skipped_text += 1;
                    continue;
                };
                let size_px = document.font_size_px(*font_size);
                if !draw_text(
                    &mut pixmap,
                    font.data.as_slice(),
                    *x as f32,
                    *y as f32,
                    text,
                    size_px,
                    *color,
                ) {
                    skipped_text += 1;
                }
            }
        }
    }

    if skipped_text > 0 {
        log::debug!(
            "raster: skipped {} text runs, no usable font for {}",
            skipped_text,
            document.font_family
        );
    }

    pixmap
        .encode_png()
        .map_err(|e| TableChartError::RenderFailure(format!("png encode failed: {e}")))
}

fn rect_path(rect: PxRect) -> Option<Path> {
    let rect = Rect::from_xywh(
        rect.x as f32,
        rect.y as f32,
        rect.width as f32,
        rect.height as f32,
    )?;
    Some(PathBuilder::from_rect(rect))
}

// Unshaped left-to-right layout: each glyph advances by its horizontal metric.
fn draw_text(
    pixmap: &mut Pixmap,
    font_data: &[u8],
    baseline_x: f32,
    baseline_y: f32,
    text: &str,
    font_size: f32,
    color: Color,
) -> bool {
    if font_size <= 0.0 {
        return false;
    }
    let Ok(face) = ttf_parser::Face::parse(font_data, 0) else {
        return false;
    };
    let units_per_em = face.units_per_em().max(1) as f32;
    let scale = font_size / units_per_em;
    let paint = paint(color);

    let mut pen_x = 0.0f32;
    let mut drawn = 0usize;
    for ch in text.chars() {
        let Some(gid) = face.glyph_index(ch) else {
            pen_x += font_size * 0.5;
            continue;
        };
        let mut builder = GlyphPathBuilder::new(baseline_x + pen_x, baseline_y, scale);
        if face.outline_glyph(gid, &mut builder).is_some() {
            if let Some(path) = builder.finish() {
                pixmap.fill_path(
                    &path,
                    &paint,
                    FillRule::Winding,
                    Transform::identity(),
                    None,
                );
                drawn += 1;
            }
        }
        let advance = face.glyph_hor_advance(gid).unwrap_or(0) as f32 * scale;
        pen_x += if advance > 0.0 { advance } else { font_size * 0.5 };
    }
    drawn > 0 || text.chars().all(char::is_whitespace)
}

struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f32,
    origin_y: f32,
    scale: f32,
}

impl GlyphPathBuilder {
    fn new(origin_x: f32, origin_y: f32, scale: f32) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }

    // Font units grow upwards, pixels grow downwards.
    fn map(&self, x: f32, y: f32) -> (f32, f32) {
        (self.origin_x + x * self.scale, self.origin_y - y * self.scale)
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = self.map(x, y);
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x, y) = self.map(x, y);
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = self.map(x1, y1);
        let (x2, y2) = self.map(x2, y2);
        let (x, y) = self.map(x, y);
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}

fn paint(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_sk_color(color));
    paint.anti_alias = true;
    paint
}

fn to_sk_color(color: Color) -> tiny_skia::Color {
    tiny_skia::Color::from_rgba8(color.r, color.g, color.b, color.a)
}
