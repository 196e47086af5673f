use std::sync::Arc;

use crate::api::dto::system_dto::{PaginatedLogResponse, SystemStatusResponse};
use crate::api::middleware::auth::{StaticTokenVerifier, TokenVerifier};
use crate::config::AppConfig;
use crate::core::persistence::logs::log_repository::LogRepositoryImpl;
use crate::core::state::runtime::dashboard::dashboard_state_manager::DashboardStateManager;
use crate::core::state::runtime::dashboard::dashboard_state_repository::DashboardStateRepository;
use crate::core::state::runtime::session::query_session_state_manager::QuerySessionStateManager;
use crate::core::state::runtime::session::query_session_state_repository::QuerySessionStateRepository;
use crate::core::store::document_store_trait::DocumentStore;
use crate::core::util::export_util::ExportedFile;
use crate::domain::analytics::dto::chart_response::{ChartSeriesResponse, ChartView};
use crate::domain::analytics::dto::granularity_request::GranularityRequest;
use crate::domain::analytics::dto::overview_response::OverviewResponse;
use crate::domain::analytics::dto::report_export_request::ReportExportRequest;
use crate::domain::analytics::dto::report_summary_response::ReportSummaryResponse;
use crate::domain::analytics::dto::time_range_request::TimeRangeRequest;
use crate::domain::analytics::service::chart_service::ChartService;
use crate::domain::analytics::service::overview_service::OverviewService;
use crate::domain::analytics::service::report_service::ReportService;
use crate::domain::common::model::TimeRange;
use crate::domain::query::service::query_executor::QueryExecutor;
use crate::domain::query::service::query_terminal_service::QueryTerminalService;
use crate::domain::system::service::log_service::LogService;
use crate::domain::system::service::status_service::StatusService;

macro_rules! delegate_async_service {
    ($(fn $name:ident($($arg:ident : $typ:ty),*) -> $ret:ty => $field:ident . $method:ident;)+) => {
        $(
            pub async fn $name(&self, $($arg: $typ),*) -> anyhow::Result<$ret> {
                self.$field.$method($($arg),*).await
            }
        )+
    };
}

pub type SessionRepo = QuerySessionStateRepository;
pub type DashboardRepo = DashboardStateRepository;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub query_service: Arc<QueryTerminalService<SessionRepo>>,
    pub analytics_service: Arc<AnalyticsService>,
    pub system_service: Arc<SystemService>,
}

pub fn build_app_state(config: &AppConfig, store: Arc<dyn DocumentStore>) -> AppState {
    let session = Arc::new(QuerySessionStateManager::new(
        QuerySessionStateRepository::new(config.history_capacity).shared(),
    ));
    let dashboard = Arc::new(DashboardStateManager::new(DashboardStateRepository::new().shared()));

    AppState {
        token_verifier: Arc::new(StaticTokenVerifier::new(config.api_tokens.clone())),
        query_service: Arc::new(QueryTerminalService::new(
            QueryExecutor::new(store.clone()),
            session.clone(),
        )),
        analytics_service: Arc::new(AnalyticsService {
            overview: OverviewService::new(
                store.clone(),
                session.clone(),
                config.overview_collections.clone(),
            ),
            charts: ChartService::new(store.clone(), dashboard, config.charts.clone()),
            reports: ReportService::new(session.clone()),
        }),
        system_service: Arc::new(SystemService {
            status: StatusService::new(store.clone(), session),
            logs: LogService::new(LogRepositoryImpl::new(config.log_dir.clone())),
        }),
        store,
    }
}

pub struct AnalyticsService {
    overview: OverviewService<SessionRepo>,
    charts: ChartService<DashboardRepo>,
    reports: ReportService<SessionRepo>,
}

impl AnalyticsService {
    delegate_async_service! {
        fn overview() -> OverviewResponse => overview.overview;
        fn report_summary() -> ReportSummaryResponse => reports.summary;
        fn export_report(req: ReportExportRequest) -> ExportedFile => reports.export;
        fn time_range() -> TimeRange => charts.time_range;
        fn commit_time_range(req: TimeRangeRequest) -> TimeRange => charts.commit_time_range;
        fn list_charts() -> Vec<ChartView> => charts.list_charts;
        fn set_granularity(chart_id: &str, req: GranularityRequest) -> ChartView => charts.set_granularity;
        fn series(chart_id: &str) -> ChartSeriesResponse => charts.series;
    }
}

pub struct SystemService {
    status: StatusService<SessionRepo>,
    logs: LogService<LogRepositoryImpl>,
}

impl SystemService {
    delegate_async_service! {
        fn status() -> SystemStatusResponse => status.status;
        fn get_system_log_file_list() -> Vec<String> => logs.get_system_log_file_list;
        fn get_system_log_lines(date: &str, cursor: Option<usize>, limit: Option<usize>) -> PaginatedLogResponse => logs.get_system_log_lines;
    }
}
