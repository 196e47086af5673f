pub mod export_util;
pub mod timestamp_util;
