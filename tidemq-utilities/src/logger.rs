use std::{env, time::SystemTime};

use log::{info, LevelFilter};
use tidemq_models::SendableError;

pub const DEFAULT_LOG_FILE: &str = "tidemq.log";

/// Where and how verbosely binaries log.
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub level: String,
    pub file_name: String,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: "info".into(),
            file_name: DEFAULT_LOG_FILE.into(),
        }
    }
}

impl LoggerOptions {
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Unknown or empty level names fall back to `info`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.trim().to_ascii_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            _ => LevelFilter::Info,
        }
    }
}

pub fn setup_logger(options: &LoggerOptions) -> Result<(), SendableError> {
    let file_name = if options.file_name.trim().is_empty() {
        DEFAULT_LOG_FILE
    } else {
        options.file_name.as_str()
    };

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                humantime::format_rfc3339_seconds(SystemTime::now()),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(options.level_filter())
        .chain(std::io::stdout())
        .chain(fern::log_file(file_name)?)
        .apply()?;
    Ok(())
}

pub fn print_env() -> std::io::Result<()> {
    let path = env::current_dir()?;
    info!("The current directory is {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_map_to_filters() {
        let options = LoggerOptions::default();
        assert_eq!(options.level_filter(), LevelFilter::Info);
        assert_eq!(options.clone().with_level("DEBUG").level_filter(), LevelFilter::Debug);
        assert_eq!(options.clone().with_level("warn").level_filter(), LevelFilter::Warn);
        assert_eq!(options.clone().with_level("").level_filter(), LevelFilter::Info);
        assert_eq!(options.with_level("verbose").level_filter(), LevelFilter::Info);
    }
}
