use std::path::{Path, PathBuf};

use simplelog::*;

use crate::error::Result;

/// Installs the terminal logger and, when `log_dir` is given, a trace-level
/// file logger next to it. Returns the path of the log file, if any.
pub fn init(level: LevelFilter, log_dir: Option<&Path>) -> Result<Option<PathBuf>> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    let log_file_path = match log_dir {
        Some(dir) => {
            if !dir.is_dir() {
                std::fs::create_dir_all(dir)?;
            }
            let log_file_config = ConfigBuilder::new().set_time_format_rfc3339().build();
            let path = dir.join(log_file_name(chrono::Utc::now()));
            let log_file = std::fs::File::create(&path)?;
            loggers.push(WriteLogger::new(LevelFilter::Trace, log_file_config, log_file));
            Some(path)
        }
        None => None,
    };

    CombinedLogger::init(loggers)?;
    Ok(log_file_path)
}

fn log_file_name(now: chrono::DateTime<chrono::Utc>) -> String {
    let timestamp = now.format("%Y-%m-%dT%H%M%SZ").to_string();
    if cfg!(debug_assertions) {
        format!("probable_viewshed_debug_{}.log", timestamp)
    } else {
        format!("probable_viewshed_{}.log", timestamp)
    }
}
