// Panic payload extraction for worker isolation
use std::any::Any;
use tracing::error;

/// Turn a caught panic payload into a readable message
///
/// # Example
/// ```text
/// let handle = tokio::spawn(async { panic!("boom") });
/// if let Err(e) = handle.await {
///     if e.is_panic() {
///         assert_eq!(panic_message(e.into_panic()), "boom");
///     }
/// }
/// ```
pub fn panic_message(payload: Box<dyn Any + Send>) -> String {
    let panic_msg = if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    };

    error!(panic_msg = %panic_msg, "Worker task panicked");
    panic_msg
}
