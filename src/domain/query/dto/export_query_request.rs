use serde::Deserialize;

use crate::core::util::export_util::ExportFormat;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExportQuery {
    pub format: ExportFormat,
}
