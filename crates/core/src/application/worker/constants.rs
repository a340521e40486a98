// Worker status messages

/// Message stored while the tool runs
pub const RUNNING_MESSAGE: &str = "Running terraform init/apply";

/// Message for any fault outside the tool's own exit status
pub const UNHANDLED_WORKER_ERROR: &str = "Unhandled worker error";

/// Details recorded when the worker task is aborted rather than panicking
pub const WORKER_CANCELLED: &str = "worker task was cancelled";
