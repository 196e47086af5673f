pub mod chart_response;
pub mod granularity_request;
pub mod overview_response;
pub mod report_export_request;
pub mod report_summary_response;
pub mod time_range_request;
