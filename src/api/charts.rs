use uuid::Uuid;

use crate::client::ApiClient;
use crate::errors::ApiResult;
use crate::models::chart::{Chart, ChartCreateRequest, ChartData, ChartUpdateRequest};
use crate::models::page::{PageQuery, Paginated};
use crate::models::user::MessageResponse;

impl ApiClient {
    pub async fn list_charts(
        &self,
        page: PageQuery,
        dataset_id: Option<Uuid>,
    ) -> ApiResult<Paginated<Chart>> {
        let mut params = page.to_params();
        if let Some(dataset_id) = dataset_id {
            params.push(("dataset_id", dataset_id.to_string()));
        }
        self.get_with_query("charts", &params).await
    }

    pub async fn get_chart(&self, id: Uuid) -> ApiResult<Chart> {
        self.get(&format!("charts/{id}")).await
    }

    pub async fn create_chart(&self, request: &ChartCreateRequest) -> ApiResult<Chart> {
        self.post("charts", request).await
    }

    pub async fn update_chart(&self, id: Uuid, request: &ChartUpdateRequest) -> ApiResult<Chart> {
        self.put(&format!("charts/{id}"), request).await
    }

    pub async fn delete_chart(&self, id: Uuid) -> ApiResult<()> {
        let _: MessageResponse = self.delete(&format!("charts/{id}")).await?;
        Ok(())
    }

    /// Fetch the chart's rendered series, shaped by the server for the
    /// chart's type.
    pub async fn chart_data(&self, id: Uuid) -> ApiResult<ChartData> {
        self.get(&format!("charts/{id}/data")).await
    }
}
