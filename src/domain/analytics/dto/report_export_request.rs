use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::core::util::export_util::ExportFormat;

/// Selected history entries to export as one report.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportExportRequest {
    #[validate(length(min = 1, message = "select at least one query"))]
    pub ids: Vec<Uuid>,
    #[serde(default)]
    pub format: ExportFormat,
}
