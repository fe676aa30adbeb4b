use std::io::Write;

use serde_json::{Map, Value};

use crate::metrics::domain::metric_catalog::MetricCatalog;
use crate::metrics::domain::metric_tag::MetricTag;
use crate::metrics::domain::metric_value::MetricValue;
use crate::metrics::domain::metrics_sink::MetricsSink;

/// Writes one JSON object per frame: `timestamp` plus every metric name in
/// catalog order, with `null` for metrics that do not apply.
///
/// Write failures are logged once and further output is discarded, since
/// the pipeline never blocks on a sink.
pub struct JsonLinesMetricsSink<W: Write + Send> {
    writer: W,
    tags: Vec<MetricTag>,
    row: Map<String, Value>,
    failed: bool,
}

impl<W: Write + Send> JsonLinesMetricsSink<W> {
    pub fn new(writer: W, catalog: &MetricCatalog) -> Self {
        let mut sink = Self {
            writer,
            tags: catalog.tags().to_vec(),
            row: Map::new(),
            failed: false,
        };
        sink.reset_row();
        sink
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn reset_row(&mut self) {
        self.row.clear();
        for tag in &self.tags {
            self.row.insert(tag.name().to_string(), Value::Null);
        }
    }

    fn write_row(&mut self, timestamp: f64) -> std::io::Result<()> {
        let mut object = Map::with_capacity(self.row.len() + 1);
        object.insert("timestamp".into(), Value::from(timestamp));
        object.extend(std::mem::take(&mut self.row));
        serde_json::to_writer(&mut self.writer, &Value::Object(object))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<W: Write + Send> MetricsSink for JsonLinesMetricsSink<W> {
    fn set_value(&mut self, tag: MetricTag, value: &MetricValue) {
        let json = serde_json::to_value(value).unwrap_or(Value::Null);
        self.row.insert(tag.name().to_string(), json);
    }

    fn mark_all_not_applicable(&mut self) {
        self.reset_row();
    }

    fn end_frame(&mut self, timestamp: f64) {
        if !self.failed {
            if let Err(e) = self.write_row(timestamp) {
                log::error!("Failed to write metrics row: {e}");
                self.failed = true;
            }
        }
        self.reset_row();
    }
}
