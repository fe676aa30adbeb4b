/// Minimum separation (seconds) between consecutive admitted frame timestamps.
pub const TIMESTAMP_EPSILON: f64 = 0.01;

/// Frames buffered between a video decoder and the detection worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

pub const DEFAULT_TRIGGER_METRIC: &str = "smile";
pub const DEFAULT_TRIGGER_THRESHOLD: f32 = 80.0;
pub const DEFAULT_TRIGGER_SUSTAIN: usize = 10;

pub const DEFAULT_WEBHOOK_EVENT: &str = "smile";
/// IFTTT maker trigger URL; `{event}` and `{key}` are substituted.
pub const IFTTT_URL_TEMPLATE: &str = "https://maker.ifttt.com/trigger/{event}/with/key/{key}";

/// Recorded results further than this from a frame's timestamp are not
/// replayed for it.
pub const REPLAY_TOLERANCE: f64 = 0.005;

pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "mkv", "avi", "webm", "m4v"];
