pub mod json_lines_metrics_sink;
pub mod log_metrics_sink;
