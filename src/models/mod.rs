pub mod chart;
pub mod dashboard;
pub mod dataset;
pub mod datasource;
pub mod page;
pub mod user;

pub use chart::{Chart, ChartCreateRequest, ChartData, ChartSeries, ChartUpdateRequest};
pub use dashboard::{
    AttachChartRequest, ChartPosition, Dashboard, DashboardChart, DashboardCreateRequest,
    DashboardUpdateRequest,
};
pub use dataset::{Dataset, DatasetCreateRequest, DatasetUpdateRequest, QueryRequest, TableData};
pub use datasource::{DataSource, DataSourceCreateRequest, DataSourceUpdateRequest};
pub use page::{PageQuery, Paginated};
pub use user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse, RefreshResponse,
    RegisterRequest, User, UserUpdateRequest,
};
