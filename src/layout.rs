use crate::columns::{ColumnLayout, ColumnSlot};
use crate::error::{Result, TableChartError};
use crate::table::{CellSpan, TableSpec};
use crate::text::TextMeasurer;
use crate::types::Rect;

/// Upper bound for any pixel metric.
pub const MAX_METRIC_PX: i32 = 10_000;

/// Calibration constants for row geometry and text placement, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableMetrics {
    /// Height of the header band and of any row whose cells fit on one line.
    pub base_row_height: i32,
    /// Extra height per wrapped line beyond the first.
    pub line_height: i32,
    pub padding_x: i32,
    /// First baseline below the top of a row.
    pub baseline_offset: i32,
    /// Visual height of one line; used to center merged-region text.
    pub text_height: i32,
    pub glyph_width_ratio: f32,
}

impl Default for TableMetrics {
    fn default() -> Self {
        Self {
            base_row_height: 35,
            line_height: 20,
            padding_x: 10,
            baseline_offset: 22,
            text_height: 14,
            glyph_width_ratio: 0.5,
        }
    }
}

impl TableMetrics {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("base_row_height", self.base_row_height, 1),
            ("line_height", self.line_height, 1),
            ("text_height", self.text_height, 1),
            ("padding_x", self.padding_x, 0),
            ("baseline_offset", self.baseline_offset, 0),
        ];
        for (name, value, min) in checks {
            if !(min..=MAX_METRIC_PX).contains(&value) {
                return Err(TableChartError::invalid(format!(
                    "{name} must be within {min}..={MAX_METRIC_PX}, got {value}"
                )));
            }
        }
        if !(self.glyph_width_ratio > 0.0) || !self.glyph_width_ratio.is_finite() {
            return Err(TableChartError::invalid(format!(
                "glyph width ratio must be positive, got {}",
                self.glyph_width_ratio
            )));
        }
        Ok(())
    }

    pub fn row_height(&self, max_lines: usize) -> i32 {
        let extra = i32::try_from(max_lines.saturating_sub(1)).unwrap_or(i32::MAX);
        self.base_row_height
            .saturating_add(extra.saturating_mul(self.line_height))
    }

    /// Baseline of the first line of a block of `lines` centered in a region.
    pub fn centered_baseline(&self, top: i32, height: i32, lines: usize) -> i32 {
        let extra = i32::try_from(lines.max(1) - 1).unwrap_or(i32::MAX);
        let block = self
            .text_height
            .saturating_add(extra.saturating_mul(self.line_height));
        top.saturating_add(height.saturating_sub(block).div_euclid(2))
            .saturating_add(self.text_height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub y: i32,
    pub height: i32,
}

impl RowLayout {
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }
}

/// Wrapped lines of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CellContent {
    pub lines: Vec<String>,
}

impl CellContent {
    pub fn line_count(&self) -> usize {
        self.lines.len().max(1)
    }

    pub fn joined(&self) -> String {
        self.lines.join(" ")
    }
}

/// A validated row merge within one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeDescriptor {
    pub column: usize,
    pub row_from: usize,
    pub row_to: usize,
}

/// One rendered cell standing in for rows `row_from..=row_to` of `column`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedRegion {
    pub column: usize,
    pub row_from: usize,
    pub row_to: usize,
    pub rect: Rect,
    pub content: CellContent,
    pub first_baseline: i32,
}

/// Everything needed to draw one table; computed per render and dropped after.
#[derive(Debug, Clone, PartialEq)]
pub struct TableLayout {
    pub columns: ColumnLayout,
    pub header: RowLayout,
    pub header_cells: Vec<CellContent>,
    pub rows: Vec<RowLayout>,
    pub cells: Vec<Vec<CellContent>>,
    pub merges: Vec<MergedRegion>,
    pub metrics: TableMetrics,
    // merge index per (row, column), row-major
    coverage: Vec<Option<usize>>,
}

impl TableLayout {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> i32 {
        self.columns.total_width()
    }

    pub fn total_height(&self) -> i32 {
        self.rows
            .last()
            .map(RowLayout::bottom)
            .unwrap_or(self.header.bottom())
    }

    /// The merged region covering `(row, column)`, anchor row included.
    pub fn merge_at(&self, row: usize, column: usize) -> Option<&MergedRegion> {
        let columns = self.column_count();
        if column >= columns {
            return None;
        }
        self.coverage
            .get(row * columns + column)
            .copied()
            .flatten()
            .and_then(|index| self.merges.get(index))
    }

    /// True when the cell is drawn by a merged region rather than on its own.
    pub fn is_merged(&self, row: usize, column: usize) -> bool {
        self.merge_at(row, column).is_some()
    }

    pub fn cell_rect(&self, row: usize, column: usize) -> Option<Rect> {
        let slot = self.columns.get(column)?;
        let row = self.rows.get(row)?;
        Some(slot_rect(slot, *row))
    }

    pub fn header_rect(&self, column: usize) -> Option<Rect> {
        self.columns
            .get(column)
            .map(|slot| slot_rect(slot, self.header))
    }

    /// Baselines for each line of a cell whose top is `top`.
    pub fn line_baselines(&self, top: i32, lines: usize) -> Vec<i32> {
        self.stacked_baselines(top.saturating_add(self.metrics.baseline_offset), lines)
    }

    /// Baselines of `lines` lines starting at `first`, one `line_height` apart.
    pub fn stacked_baselines(&self, first: i32, lines: usize) -> Vec<i32> {
        let step = self.metrics.line_height;
        (0..lines.max(1))
            .scan(first, |y, _| {
                let line = *y;
                *y = y.saturating_add(step);
                Some(line)
            })
            .collect()
    }
}

fn slot_rect(slot: ColumnSlot, row: RowLayout) -> Rect {
    Rect::new(slot.x, row.y, slot.width, row.height)
}

/// Validates row-span directives and orders them by column, then first row.
pub fn resolve_merges(spec: &TableSpec) -> Result<Vec<MergeDescriptor>> {
    let columns = spec.column_count();
    let rows = spec.row_count();
    let mut out = Vec::new();
    for (&column, spans) in &spec.row_spans {
        if spans.is_empty() {
            continue;
        }
        if column >= columns {
            return Err(TableChartError::invalid(format!(
                "row span column {column} is outside the {columns} header columns"
            )));
        }
        let mut sorted: Vec<CellSpan> = spans.clone();
        sorted.sort_by_key(|span| (span.row_from, span.row_to));
        for span in &sorted {
            if span.row_from > span.row_to {
                return Err(TableChartError::invalid(format!(
                    "row span {}..={} in column {column} is reversed",
                    span.row_from, span.row_to
                )));
            }
            if span.row_to >= rows {
                return Err(TableChartError::invalid(format!(
                    "row span {}..={} in column {column} exceeds {rows} data rows",
                    span.row_from, span.row_to
                )));
            }
        }
        for pair in sorted.windows(2) {
            if pair[0].overlaps(&pair[1]) {
                return Err(TableChartError::invalid(format!(
                    "row spans {}..={} and {}..={} overlap in column {column}",
                    pair[0].row_from, pair[0].row_to, pair[1].row_from, pair[1].row_to
                )));
            }
        }
        out.extend(sorted.into_iter().map(|span| MergeDescriptor {
            column,
            row_from: span.row_from,
            row_to: span.row_to,
        }));
    }
    Ok(out)
}

/// Wraps every cell, sizes every row and resolves merged regions.
pub fn layout_table(
    spec: &TableSpec,
    columns: ColumnLayout,
    metrics: &TableMetrics,
    font_size_px: f32,
) -> Result<TableLayout> {
    spec.validate()?;
    metrics.validate()?;
    let column_count = spec.column_count();
    if columns.len() != column_count {
        return Err(TableChartError::invalid(format!(
            "column layout has {} columns, header has {column_count}",
            columns.len()
        )));
    }
    let descriptors = resolve_merges(spec)?;
    let measurer = TextMeasurer::new(metrics.glyph_width_ratio);
    let row_count = spec.row_count();

    let wrap = |text: &str, slot: ColumnSlot| CellContent {
        lines: measurer.wrap(text, slot.width, font_size_px, metrics.padding_x),
    };

    let header_cells: Vec<CellContent> = columns
        .slots()
        .iter()
        .zip(&spec.header)
        .map(|(slot, title)| wrap(title, *slot))
        .collect();
    // The header band never grows; wrapped titles are drawn on one line.
    let header = RowLayout {
        y: 0,
        height: metrics.base_row_height,
    };

    let cells: Vec<Vec<CellContent>> = (0..row_count)
        .map(|row| {
            columns
                .slots()
                .iter()
                .enumerate()
                .map(|(column, slot)| wrap(spec.cell(row, column), *slot))
                .collect()
        })
        .collect();

    let mut coverage = vec![None; row_count * column_count];
    for (index, merge) in descriptors.iter().enumerate() {
        for row in merge.row_from..=merge.row_to {
            coverage[row * column_count + merge.column] = Some(index);
        }
    }

    let mut rows = Vec::with_capacity(row_count);
    let mut y = header.bottom();
    for (row, row_cells) in cells.iter().enumerate() {
        let max_lines = row_cells
            .iter()
            .enumerate()
            .filter(|(column, _)| match coverage[row * column_count + column] {
                Some(index) => descriptors[index].row_from == row,
                None => true,
            })
            .map(|(_, cell)| cell.line_count())
            .max()
            .unwrap_or(1);
        let height = metrics.row_height(max_lines);
        rows.push(RowLayout { y, height });
        y = y.saturating_add(height);
    }

    let merges = descriptors
        .iter()
        .map(|merge| {
            let slot = columns.slots()[merge.column];
            let top = rows[merge.row_from].y;
            let height = rows[merge.row_from..=merge.row_to]
                .iter()
                .fold(0i32, |sum, row| sum.saturating_add(row.height));
            let content = cells[merge.row_from][merge.column].clone();
            let first_baseline = metrics.centered_baseline(top, height, content.line_count());
            MergedRegion {
                column: merge.column,
                row_from: merge.row_from,
                row_to: merge.row_to,
                rect: Rect::new(slot.x, top, slot.width, height),
                content,
                first_baseline,
            }
        })
        .collect();

    Ok(TableLayout {
        columns,
        header,
        header_cells,
        rows,
        cells,
        merges,
        metrics: *metrics,
        coverage,
    })
}
