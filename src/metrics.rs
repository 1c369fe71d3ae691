use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RenderMetrics {
    pub layout_ms: f64,
    pub draw_ms: f64,
    pub serialize_ms: f64,
    pub command_count: usize,
    pub byte_count: usize,
}

impl RenderMetrics {
    pub fn total_ms(&self) -> f64 {
        self.layout_ms + self.draw_ms + self.serialize_ms
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchMetrics {
    pub tables: Vec<RenderMetrics>,
    pub total_ms: f64,
    pub total_bytes: usize,
}

impl BatchMetrics {
    pub(crate) fn push(&mut self, metrics: RenderMetrics) {
        self.total_bytes += metrics.byte_count;
        self.tables.push(metrics);
    }
}
