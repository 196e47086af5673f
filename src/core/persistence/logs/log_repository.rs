use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Prefix of the daily rolling files written by the tracing appender.
pub const LOG_FILE_PREFIX: &str = "analytics.log";

/// Read access to the daily log files.
pub trait LogRepository: Send + Sync {
    /// File names, newest day first.
    fn get_logs(&self) -> Result<Vec<String>>;

    /// Lines of one day's file; `None` when that day has no file.
    fn get_log(&self, date: NaiveDate) -> Result<Option<Vec<String>>>;
}

pub struct LogRepositoryImpl {
    dir: PathBuf,
}

impl LogRepositoryImpl {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_for(&self, date: NaiveDate) -> PathBuf {
        self.dir.join(format!("{}.{}", LOG_FILE_PREFIX, date.format("%Y-%m-%d")))
    }
}

/// Day encoded in a rolling file name (`analytics.log.2024-06-01`).
pub fn log_file_date(name: &str) -> Option<NaiveDate> {
    let suffix = name.strip_prefix(LOG_FILE_PREFIX)?.strip_prefix('.')?;
    NaiveDate::parse_from_str(suffix, "%Y-%m-%d").ok()
}

impl LogRepository for LogRepositoryImpl {
    fn get_logs(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let mut files: Vec<(NaiveDate, String)> = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read log dir {}", self.dir.display()))?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                log_file_date(&name).map(|date| (date, name))
            })
            .collect();

        files.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(files.into_iter().map(|(_, name)| name).collect())
    }

    fn get_log(&self, date: NaiveDate) -> Result<Option<Vec<String>>> {
        let path = self.file_for(date);
        if !path.exists() {
            return Ok(None);
        }

        let file = File::open(&path).with_context(|| format!("Failed to open {}", path.display()))?;
        let lines = BufReader::new(file)
            .lines()
            .collect::<std::io::Result<Vec<String>>>()
            .context("Failed to read log file")?;
        Ok(Some(lines))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn lists_only_dated_files_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["analytics.log.2024-06-01", "analytics.log.2024-06-03", "other.txt", "analytics.log.bad"] {
            File::create(dir.path().join(name)).unwrap();
        }

        let repo = LogRepositoryImpl::new(dir.path());
        assert_eq!(
            repo.get_logs().unwrap(),
            vec!["analytics.log.2024-06-03".to_string(), "analytics.log.2024-06-01".to_string()]
        );
    }

    #[test]
    fn reads_lines_of_one_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("analytics.log.2024-06-01")).unwrap();
        writeln!(file, "first").unwrap();
        writeln!(file, "second").unwrap();

        let repo = LogRepositoryImpl::new(dir.path());
        let day = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        assert_eq!(repo.get_log(day).unwrap(), Some(vec!["first".into(), "second".into()]));
        assert_eq!(repo.get_log(day.succ_opt().unwrap()).unwrap(), None);
        assert!(LogRepositoryImpl::new(dir.path().join("missing")).get_logs().unwrap().is_empty());
    }
}
