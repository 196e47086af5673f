use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

use crate::api::dto::system_dto::PaginatedLogResponse;
use crate::core::persistence::logs::log_repository::LogRepository;
use crate::errors::AppError;

pub const DEFAULT_LOG_PAGE: usize = 200;

pub struct LogService<R: LogRepository> {
    repo: R,
}

impl<R: LogRepository> LogService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn get_system_log_file_list(&self) -> Result<Vec<String>> {
        self.repo.get_logs()
    }

    /// One page of a day's log. `cursor` is the index of the first line;
    /// `next_cursor` is absent on the last page.
    pub async fn get_system_log_lines(
        &self,
        date: &str,
        cursor: Option<usize>,
        limit: Option<usize>,
    ) -> Result<PaginatedLogResponse> {
        let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| AppError::ValidationError(format!("invalid log date '{date}', expected YYYY-MM-DD")))?;

        let lines = self
            .repo
            .get_log(day)?
            .ok_or_else(|| AppError::NotFound(format!("log for {date}")))?;

        let total = lines.len();
        let start = cursor.unwrap_or(0).min(total);
        let limit = limit.unwrap_or(DEFAULT_LOG_PAGE).max(1);
        let end = start.saturating_add(limit).min(total);
        debug!(date, start, end, total, "Log page read");

        Ok(PaginatedLogResponse {
            date: date.to_string(),
            lines: lines[start..end].to_vec(),
            total,
            next_cursor: (end < total).then_some(end),
        })
    }
}
