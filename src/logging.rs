//! Tracing subscriber setup shared by the service and the simulator binaries.
use std::{env, io::IsTerminal};

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

// ---

/// Install the global `fmt` subscriber.
///
/// Environment knobs:
/// - `RUST_LOG` wins if set; otherwise `AXUM_LOG_LEVEL`, then `default_level`.
///   `sqlx::query` is capped at `warn` unless `RUST_LOG` says otherwise.
/// - `AXUM_SPAN_EVENTS`: `full` (enter, exit, close), `enter_exit`, or close
///   events only when unset.
/// - `FORCE_COLOR`: `1|true|yes` / `0|false|no`; unset means colour on a TTY.
///
/// Call once, after `.env` is loaded and before the first log line.
pub fn init_tracing(default_level: &str) {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = env::var("AXUM_LOG_LEVEL").ok();
        let level = filter_level(level.as_deref(), default_level);
        EnvFilter::new(format!("{level},sqlx::query=warn"))
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

fn filter_level<'a>(requested: Option<&'a str>, default_level: &'a str) -> &'a str {
    // ---
    match requested {
        Some(level @ ("trace" | "debug" | "info" | "warn" | "error")) => level,
        _ => default_level,
    }
}
