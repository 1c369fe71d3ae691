use crate::error::{Result, TableChartError};
use crate::types::Color;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive range of data rows merged into one cell of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellSpan {
    pub row_from: usize,
    pub row_to: usize,
}

impl CellSpan {
    pub fn new(row_from: usize, row_to: usize) -> Self {
        Self { row_from, row_to }
    }

    pub fn overlaps(&self, other: &CellSpan) -> bool {
        self.row_from <= other.row_to && other.row_from <= self.row_to
    }
}

/// Immutable description of one table. Irregular input (short rows, a span
/// list that does not match the header) is normalized during layout.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSpec {
    pub header: Vec<String>,
    pub data: Vec<Vec<String>>,
    /// Relative column weights, one per header column.
    pub spans: Vec<i64>,
    /// Row merges keyed by column index.
    pub row_spans: BTreeMap<usize, Vec<CellSpan>>,
    pub stroke_color: Option<Color>,
    pub stroke_width: Option<f32>,
    pub disable_row_background: bool,
    /// Font size in points; falls back to the palette.
    pub font_size: Option<f32>,
    pub font_color: Option<Color>,
    pub header_font_color: Option<Color>,
    pub header_background: Option<Color>,
    pub row_backgrounds: Option<[Color; 2]>,
}

impl TableSpec {
    pub fn new<I, S>(header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            header: header.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let spec: TableSpec = serde_json::from_str(raw)?;
        Ok(spec)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn with_row<I, S>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data.push(row.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_rows<R, I, S>(mut self, rows: R) -> Self
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for row in rows {
            self = self.with_row(row);
        }
        self
    }

    pub fn with_spans(mut self, spans: impl IntoIterator<Item = i64>) -> Self {
        self.spans = spans.into_iter().collect();
        self
    }

    pub fn with_row_span(mut self, column: usize, row_from: usize, row_to: usize) -> Self {
        self.row_spans
            .entry(column)
            .or_default()
            .push(CellSpan::new(row_from, row_to));
        self
    }

    pub fn with_stroke(mut self, color: Color, width: f32) -> Self {
        self.stroke_color = Some(color);
        self.stroke_width = Some(width);
        self
    }

    pub fn without_row_background(mut self) -> Self {
        self.disable_row_background = true;
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = Some(font_size);
        self
    }

    pub fn with_font_color(mut self, color: Color) -> Self {
        self.font_color = Some(color);
        self
    }

    pub fn with_header_style(mut self, background: Color, font_color: Color) -> Self {
        self.header_background = Some(background);
        self.header_font_color = Some(font_color);
        self
    }

    pub fn with_row_backgrounds(mut self, even: Color, odd: Color) -> Self {
        self.row_backgrounds = Some([even, odd]);
        self
    }

    pub fn column_count(&self) -> usize {
        self.header.len()
    }

    pub fn row_count(&self) -> usize {
        self.data.len()
    }

    /// Cell text, or `""` for cells missing from a short row.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.data
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Stroke color and width when cell borders are configured. A width
    /// without a color strokes in black; a color without a width uses 1px.
    pub fn stroke(&self) -> Option<(Color, f32)> {
        let width = match (self.stroke_color, self.stroke_width) {
            (None, None) => return None,
            (Some(_), None) => 1.0,
            (_, Some(width)) => width,
        };
        if !(width > 0.0) {
            return None;
        }
        Some((self.stroke_color.unwrap_or(Color::BLACK), width))
    }

    /// Structural checks that do not depend on the render target.
    pub fn validate(&self) -> Result<()> {
        if self.header.is_empty() {
            return Err(TableChartError::invalid("header must not be empty"));
        }
        if let Some(size) = self.font_size {
            if !(size > 0.0) || !size.is_finite() {
                return Err(TableChartError::invalid(format!(
                    "font size must be positive, got {size}"
                )));
            }
        }
        if let Some(width) = self.stroke_width {
            if width < 0.0 || !width.is_finite() {
                return Err(TableChartError::invalid(format!(
                    "stroke width must not be negative, got {width}"
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn log_irregular_rows(&self) {
        let columns = self.column_count();
        for (index, row) in self.data.iter().enumerate() {
            if row.len() < columns {
                log::debug!(
                    "row {} has {} of {} cells, padding with empty cells",
                    index,
                    row.len(),
                    columns
                );
            } else if row.len() > columns {
                log::debug!(
                    "row {} has {} cells, ignoring {} beyond the header",
                    index,
                    row.len(),
                    row.len() - columns
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_read_as_empty_cells() {
        let spec = TableSpec::new(["A", "B", "C"]).with_row(["1"]);
        assert_eq!(spec.cell(0, 0), "1");
        assert_eq!(spec.cell(0, 2), "");
        assert_eq!(spec.cell(5, 0), "");
    }

    #[test]
    fn empty_header_is_invalid() {
        let err = TableSpec::default().validate().unwrap_err();
        assert!(err.is_invalid_spec());
    }

    #[test]
    fn stroke_defaults_fill_missing_half() {
        assert_eq!(TableSpec::new(["A"]).stroke(), None);
        let spec = TableSpec::new(["A"]).with_stroke(Color::BLACK, 1.0);
        assert_eq!(spec.stroke(), Some((Color::BLACK, 1.0)));
        let spec = TableSpec {
            stroke_color: Some(Color::rgb(255, 0, 0)),
            ..TableSpec::new(["A"])
        };
        assert_eq!(spec.stroke(), Some((Color::rgb(255, 0, 0), 1.0)));
        let spec = TableSpec {
            stroke_width: Some(0.0),
            ..TableSpec::new(["A"])
        };
        assert_eq!(spec.stroke(), None);
    }

    #[test]
    fn parses_json_spec_with_merges_and_colors() {
        let raw = r##"{
            "header": ["Name", "Age"],
            "data": [["Jim", "42"], ["Joe"]],
            "spans": [2, 1],
            "row_spans": {"1": [{"row_from": 0, "row_to": 1}]},
            "stroke_color": "#000",
            "stroke_width": 1,
            "disable_row_background": true
        }"##;
        let spec = TableSpec::from_json(raw).unwrap();
        assert_eq!(spec.header, vec!["Name", "Age"]);
        assert_eq!(spec.spans, vec![2, 1]);
        assert_eq!(spec.row_spans[&1], vec![CellSpan::new(0, 1)]);
        assert_eq!(spec.stroke(), Some((Color::BLACK, 1.0)));
        assert!(spec.disable_row_background);
        assert_eq!(spec.cell(1, 1), "");
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = TableSpec::from_json("{\"header\": 3}").unwrap_err();
        assert!(matches!(err, TableChartError::Json(_)));
    }

    #[test]
    fn span_overlap_is_inclusive() {
        let a = CellSpan::new(0, 1);
        assert!(a.overlaps(&CellSpan::new(1, 3)));
        assert!(!a.overlaps(&CellSpan::new(2, 3)));
    }
}
