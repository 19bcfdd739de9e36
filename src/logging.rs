use reqwest::Method;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("stash_console=info,reqwest=warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// Compact one-line summary of an HTTP exchange: `GET /v1/stats 200 12.34ms`.
pub fn format_exchange(method: &Method, path: &str, status: u16, duration: Duration) -> String {
    let duration_ms = duration.as_secs_f64() * 1000.0;
    format!("{} {} {} {:05.2}ms", method, path, status, duration_ms)
}

pub fn log_exchange(method: &Method, path: &str, status: u16, duration: Duration) {
    let log_line = format_exchange(method, path, status, duration);

    match status {
        200..=299 => info!("{}", log_line),
        400..=499 => warn!("{}", log_line),
        500..=599 => error!("{}", log_line),
        _ => info!("{}", log_line),
    }
}

pub fn log_error(context: &str, error: &dyn std::error::Error) {
    error!("{}: {}", context, error);
}

pub fn log_panic(info: &std::panic::PanicHookInfo) {
    let payload = if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic payload".to_string()
    };

    let location = if let Some(loc) = info.location() {
        format!("{}:{}:{}", loc.file(), loc.line(), loc.column())
    } else {
        "unknown location".to_string()
    };

    error!("PANIC at {}: {}", location, payload);
}

pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        log_panic(info);
        default_hook(info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_exchange_pads_duration() {
        let line = format_exchange(
            &Method::GET,
            "/v1/galleries",
            200,
            Duration::from_micros(4_500),
        );
        assert_eq!(line, "GET /v1/galleries 200 04.50ms");
    }

    #[test]
    fn test_format_exchange_keeps_status() {
        let line = format_exchange(
            &Method::POST,
            "/api/v1/admin/tasks/3/start",
            409,
            Duration::from_millis(120),
        );
        assert!(line.starts_with("POST /api/v1/admin/tasks/3/start 409 "));
        assert!(line.ends_with("120.00ms"));
    }
}
