use crate::canvas::Surface;
use crate::layout::{CellContent, TableLayout};
use crate::table::TableSpec;
use crate::theme::Palette;
use crate::types::{Color, Rect};

/// Colors and sizes for one table, with spec overrides applied over the palette.
#[derive(Debug, Clone, PartialEq)]
pub struct TableStyle {
    pub header_background: Color,
    pub header_text: Color,
    pub body_text: Color,
    /// `None` when row banding is disabled.
    pub row_backgrounds: Option<[Color; 2]>,
    pub stroke: Option<(Color, f32)>,
    /// Points.
    pub font_size: f32,
}

impl TableStyle {
    pub fn resolve(spec: &TableSpec, palette: &Palette) -> Self {
        let row_backgrounds = if spec.disable_row_background {
            None
        } else {
            Some(spec.row_backgrounds.unwrap_or(palette.table_row_backgrounds))
        };
        Self {
            header_background: spec
                .header_background
                .unwrap_or(palette.table_header_background),
            header_text: spec.header_font_color.unwrap_or(palette.table_header_text),
            body_text: spec.font_color.unwrap_or(palette.table_body_text),
            row_backgrounds,
            stroke: spec.stroke(),
            font_size: spec.font_size.unwrap_or(palette.font_size),
        }
    }

    fn row_background(&self, row: usize) -> Option<Color> {
        self.row_backgrounds.map(|colors| colors[row % 2])
    }
}

/// Walks a finished layout and issues draw calls: backgrounds first, then
/// borders, then text. Merged regions are drawn after the regular cells of
/// each pass and replace the cells they cover.
pub fn render_table<S: Surface + ?Sized>(layout: &TableLayout, style: &TableStyle, surface: &mut S) {
    let width = layout.width();

    surface.fill_rect(
        Rect::new(0, layout.header.y, width, layout.header.height),
        style.header_background,
    );
    if style.row_backgrounds.is_some() {
        for (index, row) in layout.rows.iter().enumerate() {
            if let Some(color) = style.row_background(index) {
                surface.fill_rect(Rect::new(0, row.y, width, row.height), color);
            }
        }
        for region in &layout.merges {
            if let Some(color) = style.row_background(region.row_from) {
                surface.fill_rect(region.rect, color);
            }
        }
    }

    if let Some((color, stroke_width)) = style.stroke {
        for column in 0..layout.column_count() {
            if let Some(rect) = layout.header_rect(column) {
                surface.stroke_rect(rect, color, stroke_width);
            }
        }
        for row in 0..layout.row_count() {
            for column in 0..layout.column_count() {
                if layout.is_merged(row, column) {
                    continue;
                }
                if let Some(rect) = layout.cell_rect(row, column) {
                    surface.stroke_rect(rect, color, stroke_width);
                }
            }
        }
        for region in &layout.merges {
            surface.stroke_rect(region.rect, color, stroke_width);
        }
    }

    let padding = layout.metrics.padding_x;
    let baseline = layout.header.y.saturating_add(layout.metrics.baseline_offset);
    for (slot, cell) in layout.columns.slots().iter().zip(&layout.header_cells) {
        surface.text(
            slot.x.saturating_add(padding),
            baseline,
            &cell.joined(),
            style.header_text,
            style.font_size,
        );
    }

    for (row_index, row) in layout.rows.iter().enumerate() {
        for (column, slot) in layout.columns.slots().iter().enumerate() {
            if layout.is_merged(row_index, column) {
                continue;
            }
            let Some(cell) = layout.cells.get(row_index).and_then(|cells| cells.get(column))
            else {
                continue;
            };
            let baselines = layout.line_baselines(row.y, cell.line_count());
            draw_lines(surface, slot.x.saturating_add(padding), &baselines, cell, style);
        }
    }

    for region in &layout.merges {
        let baselines =
            layout.stacked_baselines(region.first_baseline, region.content.line_count());
        draw_lines(
            surface,
            region.rect.x.saturating_add(padding),
            &baselines,
            &region.content,
            style,
        );
    }
}

fn draw_lines<S: Surface + ?Sized>(
    surface: &mut S,
    x: i32,
    baselines: &[i32],
    cell: &CellContent,
    style: &TableStyle,
) {
    for (line, y) in cell.lines.iter().zip(baselines) {
        surface.text(x, *y, line, style.body_text, style.font_size);
    }
}
