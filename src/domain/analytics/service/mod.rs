pub mod chart_service;
pub mod granularity_service;
pub mod overview_service;
pub mod report_service;
pub mod time_bucket_service;
pub mod time_range_service;
