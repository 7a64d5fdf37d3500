//! Structured logging setup shared by both binaries.
use std::env;

use is_terminal::IsTerminal;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `AXUM_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level from `RUST_LOG` when set, otherwise from `level_var`
///   (e.g. `AXUM_LOG_LEVEL` for the service, `EDGE_LOG_LEVEL` for the agent),
///   with `extra_directives` appended (e.g. `sqlx::query=warn`)
///
/// This should be called once at process startup before any logging
/// or tracing macros are invoked.
pub fn init_tracing(level_var: &str, default_level: &str, extra_directives: &str) {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let requested = env::var(level_var).ok();
        let level = resolve_level(requested.as_deref(), default_level);
        if extra_directives.is_empty() {
            EnvFilter::new(level)
        } else {
            EnvFilter::new(format!("{level},{extra_directives}"))
        }
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}

fn resolve_level<'a>(requested: Option<&'a str>, default_level: &'a str) -> &'a str {
    // ---
    match requested {
        Some(level @ ("trace" | "debug" | "info" | "warn" | "error")) => level,
        _ => default_level,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_resolve_level() {
        // ---
        assert_eq!(resolve_level(Some("warn"), "debug"), "warn");
        assert_eq!(resolve_level(Some("loud"), "debug"), "debug");
        assert_eq!(resolve_level(None, "info"), "info");
    }
}
