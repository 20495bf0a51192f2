use uuid::Uuid;

use crate::client::ApiClient;
use crate::errors::ApiResult;
use crate::models::dashboard::{
    AttachChartRequest, Dashboard, DashboardChart, DashboardCreateRequest, DashboardUpdateRequest,
};
use crate::models::page::{PageQuery, Paginated};
use crate::models::user::MessageResponse;

impl ApiClient {
    pub async fn list_dashboards(&self, page: PageQuery) -> ApiResult<Paginated<Dashboard>> {
        self.get_with_query("dashboards", &page.to_params()).await
    }

    pub async fn get_dashboard(&self, id: Uuid) -> ApiResult<Dashboard> {
        self.get(&format!("dashboards/{id}")).await
    }

    pub async fn create_dashboard(&self, request: &DashboardCreateRequest) -> ApiResult<Dashboard> {
        self.post("dashboards", request).await
    }

    pub async fn update_dashboard(
        &self,
        id: Uuid,
        request: &DashboardUpdateRequest,
    ) -> ApiResult<Dashboard> {
        self.put(&format!("dashboards/{id}"), request).await
    }

    pub async fn delete_dashboard(&self, id: Uuid) -> ApiResult<()> {
        let _: MessageResponse = self.delete(&format!("dashboards/{id}")).await?;
        Ok(())
    }

    pub async fn attach_chart(
        &self,
        dashboard_id: Uuid,
        request: &AttachChartRequest,
    ) -> ApiResult<DashboardChart> {
        self.post(&format!("dashboards/{dashboard_id}/charts"), request).await
    }

    pub async fn detach_chart(&self, dashboard_id: Uuid, chart_id: Uuid) -> ApiResult<()> {
        let _: MessageResponse = self
            .delete(&format!("dashboards/{dashboard_id}/charts/{chart_id}"))
            .await?;
        Ok(())
    }
}
