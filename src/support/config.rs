use crate::{
    logger::{Sink, DEFAULT_MAX_FILES, DEFAULT_MAX_FILE_SIZE},
    window::WindowSettings,
};
use log::LevelFilter;
use serde::Deserialize;
use snafu::{ResultExt, Snafu};
use std::{
    fs,
    path::{Path, PathBuf},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to read config file '{}': {}", path.display(), source))]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse config file '{}': {}", path.display(), source))]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub console_level: LevelFilter,
    pub file: PathBuf,
    pub file_level: LevelFilter,
    pub max_file_size: u64,
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            console_level: LevelFilter::Trace,
            file: PathBuf::from("sample.log"),
            file_level: LevelFilter::Debug,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

impl LoggingConfig {
    pub fn sinks(&self) -> Vec<Sink> {
        vec![
            Sink::console(self.console_level),
            Sink::rolling_file(&self.file, self.file_level)
                .with_rotation(self.max_file_size, self.max_files),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowSettings,
    pub adapter_id: Option<u32>,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reads the config at `path`, falling back to defaults when the file
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).context(ReadConfig { path })?;
        Self::parse(&contents).context(ParseConfig { path })
    }

    pub fn parse(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load(dir.path().join("sample.toml")).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.adapter_id, None);
    }

    #[test]
    fn default_sinks_log_trace_to_console_and_debug_to_file() {
        let sinks = LoggingConfig::default().sinks();

        assert_eq!(sinks[0], Sink::console(LevelFilter::Trace));
        assert_eq!(sinks[1], Sink::rolling_file("sample.log", LevelFilter::Debug));
    }

    #[test]
    fn partial_files_keep_remaining_defaults() {
        let config = AppConfig::parse(
            r#"
            adapter_id = 1

            [window]
            title = "Custom"
            width = 1280

            [logging]
            console_level = "info"
            max_files = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.adapter_id, Some(1));
        assert_eq!(config.window.title, "Custom");
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.logging.console_level, LevelFilter::Info);
        assert_eq!(config.logging.file_level, LevelFilter::Debug);
        assert_eq!(config.logging.max_files, 5);
    }

    #[test]
    fn malformed_files_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.toml");
        fs::write(&path, "[window\nwidth = ").unwrap();

        let error = AppConfig::load(&path).unwrap_err();
        assert!(matches!(error, Error::ParseConfig { .. }));
    }
}
