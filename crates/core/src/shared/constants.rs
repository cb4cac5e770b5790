/// Wait between polls of a source that is not ready yet.
pub const DEFAULT_RETRY_INTERVAL_MS: u64 = 1000;

/// Upper bound for exponential backoff between polls.
pub const DEFAULT_MAX_RETRY_INTERVAL_MS: u64 = 8000;

/// Open attempts before a source is declared unavailable.
pub const DEFAULT_OPEN_ATTEMPTS: u32 = 10;

/// Consecutive not-ready reads of one frame before giving up.
pub const DEFAULT_READ_ATTEMPTS: u32 = 10;

/// Bounded wait of the per-iteration cancellation check.
pub const DEFAULT_CANCEL_POLL_MS: u64 = 10;

pub const DEFAULT_MODEL_NAME: &str = "yolov8n.onnx";

/// Directory name under the user cache dir holding resolved models.
pub const MODEL_CACHE_DIR_NAME: &str = "framepoll";

pub const DEFAULT_CONFIDENCE: f64 = 0.25;

/// NMS IoU threshold.
pub const DEFAULT_IOU_THRESHOLD: f64 = 0.45;
