//! Structured logging hooks for the codec.
//!
//! The `log_metric!` macro emits one `key=value` record through the `log`
//! facade at debug level. It is compiled out of release builds by the
//! `#[cfg(debug_assertions)]` guard, so hot paths may call it freely.

/// Logs a structured key-value metric line, only in debug builds.
///
/// # Example
/// ```
/// use flatrow::log_metric;
/// let rows = 4;
/// log_metric!("event"="serialize_batch", "rows"=&rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            $crate::__log::debug!(target: "flatrow::metric", "FLATROW_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}
