//! Console logging shared by the monitor and operator binaries

use chrono::Local;
use env_logger::fmt::Color;
use env_logger::Builder;
use log::{Level, LevelFilter};
use std::io::Write;

/// Installs the coloured `timestamp level [target] message` logger.
/// Defaults to `Info`; `RUST_LOG` overrides the filter. Output goes to
/// stderr.
pub fn init() {
    Builder::new()
        .format(|buf, record| {
            let mut timestamp_style = buf.style();
            let mut level_style = buf.style();
            let mut target_style = buf.style();

            let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            writeln!(
                buf,
                "{} {} [{}] {}",
                timestamp_style.set_color(Color::Rgb(100, 100, 100)).value(timestamp),
                level_style.set_color(level_color(record.level())).value(record.level()),
                target_style.set_color(Color::Blue).value(record.target()),
                record.args()
            )
        })
        .filter(None, LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();
}

fn level_color(level: Level) -> Color {
    match level {
        Level::Error => Color::Red,
        Level::Warn => Color::Yellow,
        Level::Info => Color::Green,
        Level::Debug => Color::Cyan,
        Level::Trace => Color::White,
    }
}
