use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::layout::TableLayout;

/// JSON-lines trace of layout decisions. Clones share one file.
#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: BTreeMap<String, u64>,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: BTreeMap::new(),
            })),
        })
    }

    pub fn log_value(&self, value: &Value) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = writeln!(state.writer, "{value}");
        }
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.counters.entry(key.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    pub fn log_layout(&self, table_id: usize, layout: &TableLayout) {
        let rows: Vec<Value> = layout
            .rows
            .iter()
            .map(|row| json!({"y": row.y, "height": row.height}))
            .collect();
        let merges: Vec<Value> = layout
            .merges
            .iter()
            .map(|region| {
                json!({
                    "column": region.column,
                    "row_from": region.row_from,
                    "row_to": region.row_to,
                    "y": region.rect.y,
                    "height": region.rect.height,
                    "lines": region.content.line_count(),
                    "baseline": region.first_baseline,
                })
            })
            .collect();
        self.log_value(&json!({
            "type": "table.layout",
            "table_id": table_id,
            "column_widths": layout.columns.widths(),
            "header_height": layout.header.height,
            "rows": rows,
            "merges": merges,
            "total_height": layout.total_height(),
        }));
        let wrapped = layout
            .cells
            .iter()
            .flatten()
            .filter(|cell| cell.line_count() > 1)
            .count();
        self.increment("tables", 1);
        self.increment("rows", layout.row_count() as u64);
        self.increment("merges", layout.merges.len() as u64);
        self.increment("wrapped_cells", wrapped as u64);
    }

    pub fn emit_summary(&self, context: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let counts = std::mem::take(&mut state.counters);
            let line = json!({
                "type": "debug.summary",
                "context": context,
                "counts": counts,
            });
            let _ = writeln!(state.writer, "{line}");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}
