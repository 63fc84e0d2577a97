use anyhow::{Context, Result};
use clap::ValueEnum;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use crate::store::FileStore;

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum LoggingMode {
    File,
    Stderr,
}

pub fn level_for(debug: bool) -> log::LevelFilter {
    if debug {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

pub fn init_logging(mode: LoggingMode, debug: bool) -> Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .level(level_for(debug))
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("hyper_util", log::LevelFilter::Warn)
        .format(|out, message, record| {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            let thread_id = format!("{:?}", std::thread::current().id());
            let module = record.module_path().unwrap_or(record.target());
            let line = record
                .line()
                .map(|line| line.to_string())
                .unwrap_or_else(|| "?".to_string());
            out.finish(format_args!(
                "[{}] [{}] [{}] [{}:{}] [{}]",
                record.level(),
                timestamp,
                thread_id,
                module,
                line,
                message
            ))
        });

    match mode {
        LoggingMode::Stderr => {
            dispatch = dispatch.chain(std::io::stderr());
        }
        LoggingMode::File => match create_log_file() {
            Ok(log_file) => {
                dispatch = dispatch.chain(log_file);
            }
            Err(err) => {
                eprintln!("Failed to open log file: {}", err);
                dispatch = dispatch.chain(std::io::stderr());
            }
        },
    }

    dispatch.apply()?;
    Ok(())
}

pub fn log_dir() -> Result<PathBuf> {
    let store = FileStore::new().context("Failed to resolve .digimall directory")?;
    Ok(store.data_dir().join("logs"))
}

fn create_log_file() -> Result<std::fs::File> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let log_path = log_dir.join(format!("{}.log", date));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_flag_raises_level() {
        assert_eq!(level_for(false), log::LevelFilter::Info);
        assert_eq!(level_for(true), log::LevelFilter::Debug);
    }

    #[test]
    fn test_mode_parses_lowercase() {
        assert_eq!(
            LoggingMode::from_str("file", true).unwrap(),
            LoggingMode::File
        );
        assert_eq!(
            LoggingMode::from_str("stderr", true).unwrap(),
            LoggingMode::Stderr
        );
    }
}
