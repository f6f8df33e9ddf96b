use log::LevelFilter;
use simplelog::{
    CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};
use snafu::{ResultExt, Snafu};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::PathBuf,
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility = "pub(crate)")]
pub enum Error {
    #[snafu(display("Failed to open log file '{}': {}", path.display(), source))]
    OpenLogFile { path: PathBuf, source: io::Error },

    #[snafu(display("Failed to install the global logger: {}", source))]
    SetLogger { source: log::SetLoggerError },
}

pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
pub const DEFAULT_MAX_FILES: usize = 3;

/// A destination for log records, installed once when the app is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Sink {
    Console {
        level: LevelFilter,
    },
    RollingFile {
        path: PathBuf,
        level: LevelFilter,
        max_size: u64,
        max_files: usize,
    },
}

impl Sink {
    pub fn console(level: LevelFilter) -> Self {
        Sink::Console { level }
    }

    pub fn rolling_file(path: impl Into<PathBuf>, level: LevelFilter) -> Self {
        Sink::RollingFile {
            path: path.into(),
            level,
            max_size: DEFAULT_MAX_FILE_SIZE,
            max_files: DEFAULT_MAX_FILES,
        }
    }

    /// Sets the rotation limits of a file sink. Console sinks are returned unchanged.
    pub fn with_rotation(self, max_size: u64, max_files: usize) -> Self {
        match self {
            Sink::RollingFile { path, level, .. } => Sink::RollingFile {
                path,
                level,
                max_size,
                max_files,
            },
            console => console,
        }
    }

    pub fn level(&self) -> LevelFilter {
        match self {
            Sink::Console { level } | Sink::RollingFile { level, .. } => *level,
        }
    }
}

fn record_config() -> Config {
    ConfigBuilder::new()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Error)
        .build()
}

pub fn create_loggers(sinks: &[Sink]) -> Result<Vec<Box<dyn SharedLogger>>> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::with_capacity(sinks.len());
    for sink in sinks {
        match sink {
            Sink::Console { level } => {
                loggers.push(TermLogger::new(*level, record_config(), TerminalMode::Mixed));
            }
            Sink::RollingFile {
                path,
                level,
                max_size,
                max_files,
            } => {
                let writer = RollingFileWriter::open(path, *max_size, *max_files)
                    .context(OpenLogFile { path: path.as_path() })?;
                loggers.push(WriteLogger::new(*level, record_config(), writer));
            }
        }
    }
    Ok(loggers)
}

pub fn install(sinks: &[Sink]) -> Result<()> {
    let loggers = create_loggers(sinks)?;
    CombinedLogger::init(loggers).context(SetLogger {})
}

/// Appends to a log file and shifts it into numbered backups once it would
/// grow past `max_size` bytes: `app.log` becomes `app.1.log`, `app.1.log`
/// becomes `app.2.log` and so on. At most `max_files` backups are kept.
pub struct RollingFileWriter {
    path: PathBuf,
    file: File,
    written: u64,
    max_size: u64,
    max_files: usize,
}

impl RollingFileWriter {
    pub fn open(path: impl Into<PathBuf>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            written,
            max_size,
            max_files,
        })
    }

    pub fn backup_path(&self, index: usize) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match self.path.extension() {
            Some(extension) => format!("{}.{}.{}", stem, index, extension.to_string_lossy()),
            None => format!("{}.{}", stem, index),
        };
        self.path.with_file_name(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.max_files > 0 {
            let oldest = self.backup_path(self.max_files);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.max_files).rev() {
                let source = self.backup_path(index);
                if source.exists() {
                    fs::rename(&source, self.backup_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.backup_path(1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RollingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let written = self.file.write(buf)?;
        self.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn backup_names_keep_the_extension() {
        let dir = tempdir().unwrap();
        let writer = RollingFileWriter::open(dir.path().join("sample.log"), 64, 2).unwrap();
        assert_eq!(writer.backup_path(1), dir.path().join("sample.1.log"));
        assert_eq!(writer.backup_path(2), dir.path().join("sample.2.log"));
    }

    #[test]
    fn rotates_once_the_size_limit_is_reached() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.log");
        let mut writer = RollingFileWriter::open(&path, 16, 2).unwrap();

        writer.write_all(b"0123456789\n").unwrap();
        writer.write_all(b"abcdefghij\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("sample.1.log")).unwrap(), "0123456789\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "abcdefghij\n");
    }

    #[test]
    fn keeps_at_most_max_files_backups() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.log");
        let mut writer = RollingFileWriter::open(&path, 4, 2).unwrap();

        for line in &["aaaa", "bbbb", "cccc", "dddd"] {
            writer.write_all(line.as_bytes()).unwrap();
        }
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "dddd");
        assert_eq!(fs::read_to_string(dir.path().join("sample.1.log")).unwrap(), "cccc");
        assert_eq!(fs::read_to_string(dir.path().join("sample.2.log")).unwrap(), "bbbb");
        assert!(!dir.path().join("sample.3.log").exists());
    }

    #[test]
    fn zero_backups_truncates_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.log");
        let mut writer = RollingFileWriter::open(&path, 4, 0).unwrap();

        writer.write_all(b"aaaa").unwrap();
        writer.write_all(b"bbbb").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "bbbb");
        assert!(!dir.path().join("sample.1.log").exists());
    }

    #[test]
    fn appends_to_an_existing_log() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.log");
        fs::write(&path, "old\n").unwrap();

        let mut writer = RollingFileWriter::open(&path, 1024, 1).unwrap();
        writer.write_all(b"new\n").unwrap();
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }

    #[test]
    fn file_sinks_create_their_log_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("logs").join("sample.log");
        let sinks = [
            Sink::console(LevelFilter::Trace),
            Sink::rolling_file(&path, LevelFilter::Debug),
        ];

        let loggers = create_loggers(&sinks).unwrap();

        assert_eq!(loggers.len(), 2);
        assert!(path.exists());
        assert_eq!(loggers[1].level(), LevelFilter::Debug);
    }

    #[test]
    fn console_sinks_log_without_a_terminal() {
        let loggers = create_loggers(&[Sink::console(LevelFilter::Info)]).unwrap();

        assert_eq!(loggers.len(), 1);
        assert_eq!(loggers[0].level(), LevelFilter::Info);
    }

    #[test]
    fn rotation_only_applies_to_file_sinks() {
        let console = Sink::console(LevelFilter::Info).with_rotation(1, 1);
        assert_eq!(console, Sink::console(LevelFilter::Info));

        let file = Sink::rolling_file("sample.log", LevelFilter::Debug).with_rotation(10, 4);
        assert_eq!(
            file,
            Sink::RollingFile {
                path: PathBuf::from("sample.log"),
                level: LevelFilter::Debug,
                max_size: 10,
                max_files: 4,
            }
        );
        assert_eq!(file.level(), LevelFilter::Debug);
    }
}
