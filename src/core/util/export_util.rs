use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::store::document::FieldValue;
use crate::domain::query::model::query_result::{QueryResult, Row};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

/// Rendered download: body plus the headers the HTTP layer needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub filename: String,
    pub content_type: &'static str,
    pub body: String,
}

impl ExportedFile {
    /// `<prefix>-<unix millis>.<ext>`
    pub fn new(prefix: &str, format: ExportFormat, body: String, at: DateTime<Utc>) -> Self {
        Self {
            filename: format!("{}-{}.{}", prefix, at.timestamp_millis(), format.extension()),
            content_type: format.content_type(),
            body,
        }
    }
}

/// One history entry inside an exported report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ReportEntry<'a> {
    collection: &'a str,
    query: &'a str,
    result_count: usize,
    execution_time: u64,
    timestamp: DateTime<Utc>,
    data: &'a [Row],
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    export_date: DateTime<Utc>,
    query_count: usize,
    queries: Vec<ReportEntry<'a>>,
}

pub struct ExportUtil;

impl ExportUtil {
    pub fn rows_to_json(rows: &[Row]) -> Result<String> {
        serde_json::to_string_pretty(rows).context("failed to serialize rows")
    }

    /// Header comes from the first row's keys; later rows fill those columns only.
    pub fn rows_to_csv(rows: &[Row]) -> Result<String> {
        let Some(first) = rows.first() else {
            return Ok(String::new());
        };
        let headers: Vec<&str> = first.keys().map(String::as_str).collect();

        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&headers).context("failed to write csv header")?;
        for row in rows {
            let record: Vec<String> = headers
                .iter()
                .map(|h| row.get(*h).map(Self::cell).unwrap_or_default())
                .collect();
            writer.write_record(&record).context("failed to write csv row")?;
        }
        Self::finish(writer)
    }

    pub fn export_rows(rows: &[Row], format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Self::rows_to_json(rows),
            ExportFormat::Csv => Self::rows_to_csv(rows),
        }
    }

    pub fn report_to_json(results: &[&QueryResult], export_date: DateTime<Utc>) -> Result<String> {
        let report = Report {
            export_date,
            query_count: results.len(),
            queries: results
                .iter()
                .map(|r| ReportEntry {
                    collection: &r.collection,
                    query: &r.query,
                    result_count: r.row_count,
                    execution_time: r.execution_time_ms,
                    timestamp: r.executed_at,
                    data: &r.rows,
                })
                .collect(),
        };
        serde_json::to_string_pretty(&report).context("failed to serialize report")
    }

    /// One `--- collection (query) ---` section per non-empty result. Commas
    /// inside values become `;` so sections stay unquoted.
    pub fn report_to_csv(results: &[&QueryResult]) -> String {
        let mut out = String::new();
        for result in results {
            let Some(first) = result.rows.first() else {
                continue;
            };
            let headers: Vec<&str> = first.keys().map(String::as_str).collect();

            out.push_str(&format!("\n--- {} ({}) ---\n", result.collection, result.query));
            out.push_str(&headers.join(","));
            out.push('\n');
            for row in &result.rows {
                let line = headers
                    .iter()
                    .map(|h| row.get(*h).map(Self::cell).unwrap_or_default().replace(',', ";"))
                    .collect::<Vec<_>>()
                    .join(",");
                out.push_str(&line);
                out.push('\n');
            }
        }
        out
    }

    pub fn export_report(results: &[&QueryResult], format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => Self::report_to_json(results, Utc::now()),
            ExportFormat::Csv => Ok(Self::report_to_csv(results)),
        }
    }

    fn cell(value: &FieldValue) -> String {
        match value {
            FieldValue::Null => String::new(),
            FieldValue::String(s) => s.clone(),
            other => other.to_json().to_string(),
        }
    }

    fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
        let bytes = writer.into_inner().context("failed to flush csv writer")?;
        String::from_utf8(bytes).context("csv output is not utf-8")
    }
}
