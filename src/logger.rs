use std::fs;
use std::path::Path;

use chrono::Local;
use fern::Dispatch;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;

use crate::domain::federation_model::utils::statistics::ANALYTICS_TARGET;

const LOG_DIR: &str = "logs";
const LOG_FILE: &str = "broker.log";

/// Level from `level_override`, else `RUST_LOG`, else `info`. Unparsable values fall back to `info`.
fn resolve_level(level_override: Option<&str>) -> LevelFilter {
    let requested = match level_override {
        Some(level) => level.to_string(),
        None => std::env::var("RUST_LOG").unwrap_or_default(),
    };
    requested.trim().parse::<LevelFilter>().unwrap_or(LevelFilter::Info)
}

fn timestamp() -> impl std::fmt::Display {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f")
}

/// Installs the global logger: colored console on stderr and a plain copy in `logs/broker.log`.
///
/// Order lifecycle analytics only reach the console at `debug` or finer, the file always gets them.
/// Call once, first thing in `main`.
pub fn init(level_override: Option<&str>) {
    let level = resolve_level(level_override);

    let colors = ColoredLevelConfig::new().error(Color::Red).warn(Color::Yellow).info(Color::Green).debug(Color::Blue).trace(Color::BrightBlack);
    let console = Dispatch::new()
        .filter(move |metadata| metadata.target() != ANALYTICS_TARGET || level >= LevelFilter::Debug)
        .format(move |out, message, record| out.finish(format_args!("[{} {} {}] {}", timestamp(), colors.color(record.level()), record.target(), message)))
        .chain(std::io::stderr());

    let mut root = Dispatch::new()
        .level(level)
        .level_for("reqwest", LevelFilter::Warn)
        .level_for("hyper", LevelFilter::Warn)
        .level_for(ANALYTICS_TARGET, level.max(LevelFilter::Info))
        .chain(console);

    let log_path = Path::new(LOG_DIR).join(LOG_FILE);
    let file = fs::create_dir_all(LOG_DIR).and_then(|_| fern::log_file(&log_path));
    match file {
        Ok(file) => {
            root = root.chain(Dispatch::new().format(|out, message, record| out.finish(format_args!("[{} {} {}] {}", timestamp(), record.level(), record.target(), message))).chain(file));
        }
        Err(e) => eprintln!("Cannot write '{}', logging to the console only: {}", log_path.display(), e),
    }

    if let Err(e) = root.apply() {
        eprintln!("Logger already installed: {}", e);
        return;
    }

    log::info!("Logger initialized at level {}, file '{}'.", level, log_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins_and_bad_values_fall_back() {
        assert_eq!(resolve_level(Some("debug")), LevelFilter::Debug);
        assert_eq!(resolve_level(Some(" WARN ")), LevelFilter::Warn);
        assert_eq!(resolve_level(Some("loud")), LevelFilter::Info);
    }
}
