use crate::error::Result;
use crate::font::FontRegistry;
use crate::raster;
use crate::svg;
use crate::types::{Color, OutputFormat, Rect, Size};
use std::sync::Arc;

pub const DEFAULT_FONT_FAMILY: &str = "'Roboto Medium',sans-serif";
pub const DEFAULT_DPI: f32 = 92.0;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    FillRect {
        rect: Rect,
        color: Color,
    },
    StrokeRect {
        rect: Rect,
        color: Color,
        width: f32,
    },
    // `y` is the text baseline; `font_size` is in points.
    Text {
        x: i32,
        y: i32,
        text: String,
        color: Color,
        font_size: f32,
    },
}

/// The narrow drawing interface the table renderer talks to.
pub trait Surface {
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32);
    fn text(&mut self, x: i32, y: i32, text: &str, color: Color, font_size: f32);
    fn serialize(&self) -> Result<Vec<u8>>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub size: Size,
    pub background: Option<Color>,
    pub font_family: String,
    pub dpi: f32,
    pub commands: Vec<Command>,
}

impl Document {
    pub fn font_size_px(&self, font_size_pt: f32) -> f32 {
        font_size_px(font_size_pt, self.dpi)
    }
}

pub(crate) fn font_size_px(font_size_pt: f32, dpi: f32) -> f32 {
    font_size_pt * dpi / 72.0
}

/// Records draw calls in order and encodes them on `serialize`.
pub struct Canvas {
    document: Document,
    format: OutputFormat,
    fonts: Option<Arc<FontRegistry>>,
}

impl Canvas {
    pub fn new(size: Size, format: OutputFormat) -> Self {
        Self {
            document: Document {
                size,
                background: None,
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                dpi: DEFAULT_DPI,
                commands: Vec::new(),
            },
            format,
            fonts: None,
        }
    }

    pub fn with_background(mut self, color: Option<Color>) -> Self {
        self.document.background = color;
        self
    }

    pub fn with_font_family(mut self, family: impl Into<String>) -> Self {
        self.document.font_family = family.into();
        self
    }

    pub fn with_dpi(mut self, dpi: f32) -> Self {
        self.document.dpi = dpi;
        self
    }

    pub(crate) fn with_fonts(mut self, fonts: Option<Arc<FontRegistry>>) -> Self {
        self.fonts = fonts;
        self
    }

    pub fn size(&self) -> Size {
        self.document.size
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn commands(&self) -> &[Command] {
        &self.document.commands
    }

    pub fn command_count(&self) -> usize {
        self.document.commands.len()
    }

    pub fn finish(self) -> Document {
        self.document
    }
}

impl Surface for Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        if rect.width <= 0 || rect.height <= 0 {
            return;
        }
        self.document
            .commands
            .push(Command::FillRect { rect, color });
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, width: f32) {
        if rect.width <= 0 || rect.height <= 0 || !(width > 0.0) {
            return;
        }
        self.document
            .commands
            .push(Command::StrokeRect { rect, color, width });
    }

    fn text(&mut self, x: i32, y: i32, text: &str, color: Color, font_size: f32) {
        if text.is_empty() {
            return;
        }
        self.document.commands.push(Command::Text {
            x,
            y,
            text: text.to_string(),
            color,
            font_size,
        });
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        match self.format {
            OutputFormat::Svg => Ok(svg::document_to_svg(&self.document)),
            OutputFormat::Png => raster::document_to_png(&self.document, self.fonts.as_deref()),
        }
    }
}
