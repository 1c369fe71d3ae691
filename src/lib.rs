mod canvas;
mod columns;
mod debug;
mod error;
mod font;
mod layout;
mod metrics;
mod perf;
mod raster;
mod renderer;
mod svg;
mod table;
mod text;
mod theme;
mod types;

use base64::Engine;
pub use canvas::{Canvas, Command, DEFAULT_DPI, DEFAULT_FONT_FAMILY, Document, Surface};
pub use columns::{ColumnLayout, ColumnSlot, allocate, resolve_weights};
use debug::DebugLogger;
pub use error::{Result, TableChartError};
use font::FontRegistry;
pub use layout::{
    CellContent, MAX_METRIC_PX, MergeDescriptor, MergedRegion, RowLayout, TableLayout,
    TableMetrics, layout_table, resolve_merges,
};
pub use metrics::{BatchMetrics, RenderMetrics};
use perf::PerfLogger;
pub use renderer::{TableStyle, render_table};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
pub use table::{CellSpan, TableSpec};
pub use text::TextMeasurer;
pub use theme::{DEFAULT_FONT_SIZE, Palette, Theme};
pub use types::{Color, OutputFormat, Rect, Size};

pub const DEFAULT_WIDTH: u32 = 600;
pub const DEFAULT_HEIGHT: u32 = 400;

/// Renders tables with one fixed configuration. Cheap to share across threads;
/// every render builds its own layout and surface.
pub struct TableChart {
    width: u32,
    height: Option<u32>,
    format: OutputFormat,
    theme: Theme,
    palette: Palette,
    font_family: String,
    dpi: f32,
    metrics: TableMetrics,
    svg_background: bool,
    fonts: Arc<FontRegistry>,
    debug: Option<Arc<DebugLogger>>,
    perf: Option<Arc<PerfLogger>>,
}

#[derive(Clone)]
pub struct TableChartBuilder {
    width: u32,
    height: Option<u32>,
    format: OutputFormat,
    theme: Theme,
    font_family: String,
    dpi: f32,
    metrics: TableMetrics,
    svg_background: bool,
    font_files: Vec<PathBuf>,
    font_bytes: Vec<(String, Vec<u8>)>,
    debug_path: Option<PathBuf>,
    perf_path: Option<PathBuf>,
}

/// Encoded output of one render together with the layout it was drawn from.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    pub format: OutputFormat,
    pub layout: TableLayout,
    pub metrics: RenderMetrics,
}

impl Rendered {
    pub fn to_data_uri(&self) -> String {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&self.bytes);
        format!("data:{};base64,{}", self.format.mime_type(), encoded)
    }

    /// Hex SHA-256 of the output bytes.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        digest.iter().map(|byte| format!("{byte:02x}")).collect()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl TableChart {
    pub fn builder() -> TableChartBuilder {
        TableChartBuilder::new()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn style_for(&self, spec: &TableSpec) -> TableStyle {
        TableStyle::resolve(spec, &self.palette)
    }

    /// Computes the geometry of `spec` at the configured width without drawing.
    pub fn layout(&self, spec: &TableSpec) -> Result<TableLayout> {
        spec.validate()?;
        let weights = resolve_weights(&spec.spans, spec.column_count());
        let columns = allocate(self.width as i32, &weights)?;
        let style = self.style_for(spec);
        let font_px = canvas::font_size_px(style.font_size, self.dpi);
        layout_table(spec, columns, &self.metrics, font_px)
    }

    pub fn render(&self, spec: &TableSpec) -> Result<Rendered> {
        let rendered = self.render_at(0, spec)?;
        self.emit_debug_summary("render");
        Ok(rendered)
    }

    /// Renders and writes the encoded bytes to `writer`, returning the byte count.
    pub fn render_to_writer<W: std::io::Write>(
        &self,
        spec: &TableSpec,
        mut writer: W,
    ) -> Result<usize> {
        let rendered = self.render(spec)?;
        writer
            .write_all(&rendered.bytes)
            .and_then(|_| writer.flush())
            .map_err(|err| TableChartError::RenderFailure(format!("output sink: {err}")))?;
        Ok(rendered.bytes.len())
    }

    pub fn render_to_file(&self, spec: &TableSpec, path: impl AsRef<std::path::Path>) -> Result<usize> {
        let file = std::fs::File::create(path)?;
        self.render_to_writer(spec, std::io::BufWriter::new(file))
    }

    /// Renders independent specs in parallel. Results keep input order.
    pub fn render_batch(&self, specs: &[TableSpec]) -> Vec<Result<Rendered>> {
        use rayon::prelude::*;

        let results: Vec<Result<Rendered>> = specs
            .par_iter()
            .enumerate()
            .map(|(idx, spec)| self.render_at(idx, spec))
            .collect();
        self.emit_debug_summary("render_batch");
        results
    }

    /// Like `render_batch`, but fails on the first invalid spec and totals
    /// the per-table metrics.
    pub fn render_batch_with_metrics(
        &self,
        specs: &[TableSpec],
    ) -> Result<(Vec<Rendered>, BatchMetrics)> {
        let started = Instant::now();
        let mut rendered = Vec::with_capacity(specs.len());
        let mut batch = BatchMetrics::default();
        for result in self.render_batch(specs) {
            let table = result?;
            batch.push(table.metrics.clone());
            rendered.push(table);
        }
        batch.total_ms = started.elapsed().as_secs_f64() * 1000.0;
        if let Some(perf) = self.perf.as_deref() {
            perf.log_span_ms("batch", None, batch.total_ms);
            perf.log_counts(
                "batch",
                None,
                &[
                    ("tables", batch.tables.len() as u64),
                    ("bytes", batch.total_bytes as u64),
                ],
            );
            perf.flush();
        }
        Ok((rendered, batch))
    }

    fn render_at(&self, table_id: usize, spec: &TableSpec) -> Result<Rendered> {
        let t_layout = Instant::now();
        spec.log_irregular_rows();
        let layout = self.layout(spec)?;
        let style = self.style_for(spec);
        let layout_ms = t_layout.elapsed().as_secs_f64() * 1000.0;

        let height = match self.height {
            Some(height) => height,
            None => layout.total_height().max(1) as u32,
        };
        let background = match self.format {
            OutputFormat::Png => Some(self.palette.background),
            OutputFormat::Svg => self.svg_background.then_some(self.palette.background),
        };
        let t_draw = Instant::now();
        let mut canvas = Canvas::new(Size::new(self.width, height), self.format)
            .with_background(background)
            .with_font_family(self.font_family.clone())
            .with_dpi(self.dpi)
            .with_fonts(Some(Arc::clone(&self.fonts)));
        render_table(&layout, &style, &mut canvas);
        let draw_ms = t_draw.elapsed().as_secs_f64() * 1000.0;

        let t_serialize = Instant::now();
        let bytes = canvas.serialize()?;
        let serialize_ms = t_serialize.elapsed().as_secs_f64() * 1000.0;

        let metrics = RenderMetrics {
            layout_ms,
            draw_ms,
            serialize_ms,
            command_count: canvas.command_count(),
            byte_count: bytes.len(),
        };
        if let Some(logger) = self.debug.as_deref() {
            logger.log_layout(table_id, &layout);
            logger.increment("commands", metrics.command_count as u64);
        }
        if let Some(perf) = self.perf.as_deref() {
            perf.log_span_ms("layout", Some(table_id), layout_ms);
            perf.log_span_ms("draw", Some(table_id), draw_ms);
            perf.log_span_ms("serialize", Some(table_id), serialize_ms);
            perf.log_counts(
                "table",
                Some(table_id),
                &[
                    ("commands", metrics.command_count as u64),
                    ("bytes", metrics.byte_count as u64),
                ],
            );
        }
        Ok(Rendered {
            bytes,
            format: self.format,
            layout,
            metrics,
        })
    }

    fn emit_debug_summary(&self, context: &str) {
        if let Some(logger) = self.debug.as_deref() {
            logger.emit_summary(context);
            logger.flush();
        }
        if let Some(perf) = self.perf.as_deref() {
            perf.flush();
        }
    }
}

impl TableChartBuilder {
    pub fn new() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: Some(DEFAULT_HEIGHT),
            format: OutputFormat::Svg,
            theme: Theme::Light,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            dpi: DEFAULT_DPI,
            metrics: TableMetrics::default(),
            svg_background: false,
            font_files: Vec::new(),
            font_bytes: Vec::new(),
            debug_path: None,
            perf_path: None,
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: u32) -> Self {
        self.height = Some(height);
        self
    }

    /// Sizes the canvas to the rendered table instead of a fixed height.
    pub fn auto_height(mut self) -> Self {
        self.height = None;
        self
    }

    pub fn size(self, width: u32, height: u32) -> Self {
        self.width(width).height(height)
    }

    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn font_family(mut self, family: impl Into<String>) -> Self {
        self.font_family = family.into();
        self
    }

    pub fn dpi(mut self, dpi: f32) -> Self {
        self.dpi = dpi;
        self
    }

    pub fn metrics(mut self, metrics: TableMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Paints the palette background behind SVG output. PNG output is
    /// always filled.
    pub fn svg_background(mut self, enabled: bool) -> Self {
        self.svg_background = enabled;
        self
    }

    pub fn register_font_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_files.push(path.into());
        self
    }

    pub fn register_font_bytes(mut self, name: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.font_bytes.push((name.into(), bytes));
        self
    }

    pub fn debug_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.debug_path = Some(path.into());
        self
    }

    pub fn perf_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.perf_path = Some(path.into());
        self
    }

    pub fn build(self) -> Result<TableChart> {
        if self.width == 0 || self.width > i32::MAX as u32 {
            return Err(TableChartError::invalid(format!(
                "width must be positive, got {}",
                self.width
            )));
        }
        if self.height == Some(0) {
            return Err(TableChartError::invalid("height must be positive"));
        }
        if !(self.dpi > 0.0) || !self.dpi.is_finite() {
            return Err(TableChartError::invalid(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        self.metrics.validate()?;

        let mut registry = FontRegistry::new();
        for file in &self.font_files {
            registry.register_file(file)?;
        }
        for (name, bytes) in self.font_bytes {
            registry.register_bytes(name, bytes)?;
        }
        if registry.len() > 0 {
            log::debug!("registered {} fonts for raster text", registry.len());
        }
        let debug = match self.debug_path {
            Some(path) => Some(Arc::new(DebugLogger::new(path)?)),
            None => None,
        };
        let perf = match self.perf_path {
            Some(path) => Some(Arc::new(PerfLogger::new(path)?)),
            None => None,
        };
        Ok(TableChart {
            width: self.width,
            height: self.height,
            format: self.format,
            theme: self.theme,
            palette: self.theme.palette(),
            font_family: self.font_family,
            dpi: self.dpi,
            metrics: self.metrics,
            svg_background: self.svg_background,
            fonts: Arc::new(registry),
            debug,
            perf,
        })
    }
}

impl Default for TableChartBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn chart() -> TableChart {
        TableChart::builder().build().unwrap()
    }

    fn people() -> TableSpec {
        TableSpec::new(["Name", "Age", "Address", "Tag", "Action"])
            .with_spans([1, 1, 2, 1, 1])
            .with_rows([
                ["John Brown", "32", "New York No. 1 Lake Park", "nice, developer", "Send Mail"],
                ["Jim Green\t", "42", "London No. 1 Lake Park", "wow", "Send Mail"],
                ["Joe Black\t", "32", "Sidney No. 1 Lake Park", "cool, teacher", "Send Mail"],
            ])
    }

    fn svg_texts(bytes: &[u8]) -> Vec<(String, String, String)> {
        let raw = std::str::from_utf8(bytes).unwrap();
        let doc = roxmltree::Document::parse(raw).unwrap();
        doc.descendants()
            .filter(|node| node.has_tag_name("text"))
            .map(|node| {
                (
                    node.attribute("x").unwrap_or_default().to_string(),
                    node.attribute("y").unwrap_or_default().to_string(),
                    node.text().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }

    fn outline(d: &str) -> String {
        d.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("tablechart_{name}_{nanos}.log"))
    }

    #[test]
    fn renders_two_column_scenario() {
        let spec = TableSpec::new(["Name", "Age"]).with_row(["Jim", "42"]);
        let rendered = chart().render(&spec).unwrap();
        assert_eq!(rendered.layout.columns.widths(), vec![300, 300]);
        assert_eq!(rendered.layout.header.height, 35);
        assert_eq!(rendered.layout.rows[0].height, 35);
        assert_eq!(
            svg_texts(&rendered.bytes),
            vec![
                ("10".to_string(), "22".to_string(), "Name".to_string()),
                ("310".to_string(), "22".to_string(), "Age".to_string()),
                ("10".to_string(), "57".to_string(), "Jim".to_string()),
                ("310".to_string(), "57".to_string(), "42".to_string()),
            ]
        );
        assert!(rendered.metrics.command_count > 0);
        assert_eq!(rendered.metrics.byte_count, rendered.bytes.len());
    }

    #[test]
    fn rendering_twice_is_byte_identical() {
        let chart = chart();
        let spec = people().with_row_span(4, 0, 1);
        let first = chart.render(&spec).unwrap();
        let second = chart.render(&spec).unwrap();
        assert_eq!(first.bytes, second.bytes);
        assert_eq!(first.fingerprint(), second.fingerprint());
        assert_eq!(first.fingerprint().len(), 64);
    }

    #[test]
    fn weighted_columns_and_merge_reach_the_output() {
        let spec = people().with_row_span(4, 0, 1);
        let rendered = chart().render(&spec).unwrap();
        assert_eq!(
            rendered.layout.columns.widths(),
            vec![100, 100, 200, 100, 100]
        );
        let send_mail: Vec<String> = svg_texts(&rendered.bytes)
            .into_iter()
            .filter(|(_, _, text)| text == "Send Mail")
            .map(|(_, y, _)| y)
            .collect();
        // Two visible cells: the merged block and the unmerged last row.
        assert_eq!(send_mail.len(), 2);
    }

    #[test]
    fn empty_data_renders_header_only() {
        let spec = TableSpec::new(["Name", "Age"]);
        let rendered = chart().render(&spec).unwrap();
        assert!(rendered.layout.rows.is_empty());
        assert_eq!(svg_texts(&rendered.bytes).len(), 2);
    }

    #[test]
    fn empty_header_fails_without_output() {
        let chart = chart();
        let mut sink = Vec::new();
        let err = chart
            .render_to_writer(&TableSpec::default(), &mut sink)
            .unwrap_err();
        assert!(err.is_invalid_spec());
        assert!(sink.is_empty());
    }

    #[test]
    fn overlapping_merges_are_invalid() {
        let spec = people().with_row_span(0, 0, 1).with_row_span(0, 1, 2);
        let err = chart().render(&spec).unwrap_err();
        assert!(err.is_invalid_spec());
    }

    #[test]
    fn auto_height_fits_canvas_to_table() {
        let chart = TableChart::builder().auto_height().build().unwrap();
        let rendered = chart.render(&people()).unwrap();
        let total = rendered.layout.total_height();
        let raw = String::from_utf8(rendered.bytes).unwrap();
        let doc = roxmltree::Document::parse(&raw).unwrap();
        assert_eq!(
            doc.root_element().attribute("height"),
            Some(total.to_string().as_str())
        );
    }

    #[test]
    fn png_output_decodes_to_canvas_size() {
        let chart = TableChart::builder()
            .size(300, 120)
            .format(OutputFormat::Png)
            .build()
            .unwrap();
        let spec = TableSpec::new(["A", "B"]).with_row(["1", "2"]);
        let rendered = chart.render(&spec).unwrap();
        assert!(rendered.to_data_uri().starts_with("data:image/png;base64,"));
        let image = image::load_from_memory(&rendered.bytes).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (300, 120));
        let header = chart.palette().table_header_background;
        assert_eq!(image.get_pixel(5, 5).0, [header.r, header.g, header.b, 255]);
        assert_eq!(image.get_pixel(5, 110).0, [255, 255, 255, 255]);
    }

    #[test]
    fn batch_results_keep_input_order() {
        let specs: Vec<TableSpec> = (0..8)
            .map(|rows| {
                let mut spec = TableSpec::new(["Index"]);
                for row in 0..rows {
                    spec = spec.with_row([row.to_string()]);
                }
                spec
            })
            .chain(std::iter::once(TableSpec::default()))
            .collect();
        let results = chart().render_batch(&specs);
        assert_eq!(results.len(), 9);
        for (rows, result) in results.iter().take(8).enumerate() {
            assert_eq!(result.as_ref().unwrap().layout.row_count(), rows);
        }
        assert!(results[8].as_ref().unwrap_err().is_invalid_spec());

        let (rendered, batch) = chart().render_batch_with_metrics(&specs[..8]).unwrap();
        assert_eq!(rendered.len(), 8);
        assert_eq!(batch.tables.len(), 8);
        assert_eq!(
            batch.total_bytes,
            rendered.iter().map(|table| table.bytes.len()).sum::<usize>()
        );
    }

    #[test]
    fn failing_sink_is_render_failure() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("closed"))
            }
            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }
        let spec = TableSpec::new(["A"]);
        let err = chart().render_to_writer(&spec, Broken).unwrap_err();
        assert!(matches!(err, TableChartError::RenderFailure(_)));
    }

    #[test]
    fn builder_rejects_bad_configuration() {
        assert!(TableChart::builder().width(0).build().is_err());
        assert!(TableChart::builder().height(0).build().is_err());
        assert!(TableChart::builder().dpi(0.0).build().is_err());
        let metrics = TableMetrics {
            base_row_height: 0,
            ..TableMetrics::default()
        };
        assert!(TableChart::builder().metrics(metrics).build().is_err());
        let err = TableChart::builder()
            .register_font_file("/nonexistent/tablechart/font.ttf")
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, TableChartError::Io(_)));
    }

    #[test]
    fn huge_padding_is_rejected_before_render() {
        let metrics = TableMetrics {
            padding_x: i32::MAX / 2 + 1,
            ..TableMetrics::default()
        };
        let err = TableChart::builder().metrics(metrics).build().err().unwrap();
        assert!(err.is_invalid_spec());
        let measurer = TextMeasurer::default();
        assert_eq!(measurer.max_chars_per_line(600, 15.0, i32::MAX), 0);
    }

    #[test]
    fn svg_background_is_opt_in() {
        let spec = TableSpec::new(["A"]);
        let plain = chart().render(&spec).unwrap();
        let raw = String::from_utf8(plain.bytes).unwrap();
        let doc = roxmltree::Document::parse(&raw).unwrap();
        let first = doc.root_element().first_element_child().unwrap();
        assert!(outline(first.attribute("d").unwrap()).starts_with("M 0 0 L 600 0 L 600 35"));

        let painted = TableChart::builder()
            .svg_background(true)
            .build()
            .unwrap()
            .render(&spec)
            .unwrap();
        let raw = String::from_utf8(painted.bytes).unwrap();
        let doc = roxmltree::Document::parse(&raw).unwrap();
        let first = doc.root_element().first_element_child().unwrap();
        assert!(outline(first.attribute("d").unwrap()).starts_with("M 0 0 L 600 0 L 600 400"));
        assert!(first.attribute("style").unwrap().ends_with("fill:rgba(255,255,255,1.0)"));
    }

    #[test]
    fn dark_theme_colors_header_band() {
        let chart = TableChart::builder().theme(Theme::Dark).build().unwrap();
        let rendered = chart.render(&TableSpec::new(["A"])).unwrap();
        let raw = String::from_utf8(rendered.bytes).unwrap();
        let header = chart.palette().table_header_background;
        assert!(raw.contains(&format!(
            "fill:rgba({},{},{},1.0)",
            header.r, header.g, header.b
        )));
    }

    #[test]
    fn json_spec_renders_like_builder_spec() {
        let raw = r#"{"header": ["Name", "Age"], "data": [["Jim", "42"]]}"#;
        let from_json = TableSpec::from_json(raw).unwrap();
        let built = TableSpec::new(["Name", "Age"]).with_row(["Jim", "42"]);
        let chart = chart();
        assert_eq!(
            chart.render(&from_json).unwrap().bytes,
            chart.render(&built).unwrap().bytes
        );
    }

    #[test]
    fn debug_and_perf_logs_record_each_render() {
        let debug_path = temp_path("debug_render");
        let perf_path = temp_path("perf_render");
        let logged_chart = TableChart::builder()
            .debug_log(&debug_path)
            .perf_log(&perf_path)
            .build()
            .unwrap();
        let quiet = chart();
        let spec = people().with_row_span(4, 0, 1);
        let logged = logged_chart.render(&spec).unwrap();
        assert_eq!(logged.bytes, quiet.render(&spec).unwrap().bytes);

        let debug = std::fs::read_to_string(&debug_path).unwrap();
        let lines: Vec<serde_json::Value> = debug
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines[0]["type"], "table.layout");
        assert_eq!(lines[0]["column_widths"], serde_json::json!([100, 100, 200, 100, 100]));
        assert_eq!(lines[0]["merges"][0]["height"], 90);
        assert_eq!(lines[0]["merges"][0]["baseline"], 87);
        assert_eq!(lines[1]["type"], "debug.summary");
        assert_eq!(lines[1]["counts"]["merges"], 1);

        let perf = std::fs::read_to_string(&perf_path).unwrap();
        assert!(perf.contains("\"name\":\"layout\""));
        assert!(perf.contains("\"name\":\"serialize\""));
        drop(logged_chart);
        let _ = std::fs::remove_file(&debug_path);
        let _ = std::fs::remove_file(&perf_path);
        let _ = std::fs::remove_file(perf_path.with_file_name(
            format!(
                "{}_hot.log",
                perf_path.file_stem().unwrap().to_string_lossy()
            ),
        ));
    }
}
