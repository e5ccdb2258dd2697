use chrono::{Local, SecondsFormat};
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt::{self, time},
    prelude::*,
};
use yansi::Paint;

use crate::config::Log;

pub fn init(log: &Log) {
    let is_color = log.style.is_color();
    if !is_color {
        yansi::disable();
    }
    let filter = match parse_filter(&log.level) {
        Ok(filter) => filter,
        Err(message) => panic!("{}", message.red().bold()),
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_timer(LocalTime)
                .with_ansi(is_color)
                .with_target(true),
        )
        .with(filter)
        .init();
}

/// A blank level keeps this crate at `info` and silences everything else.
fn parse_filter(level: &str) -> Result<Targets, String> {
    let level = level.trim();
    if level.is_empty() {
        return Ok(Targets::new().with_target(env!("CARGO_CRATE_NAME"), LevelFilter::INFO));
    }
    level
        .parse()
        .map_err(|err| format!("log level {level:?} is not a valid target filter: {err}"))
}

struct LocalTime;

impl time::FormatTime for LocalTime {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        let now = Local::now().to_rfc3339_opts(SecondsFormat::Millis, false);
        w.write_str(&now)
    }
}
