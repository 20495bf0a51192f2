use uuid::Uuid;

use crate::client::ApiClient;
use crate::errors::ApiResult;
use crate::models::datasource::{DataSource, DataSourceCreateRequest, DataSourceUpdateRequest};
use crate::models::page::{PageQuery, Paginated};
use crate::models::user::MessageResponse;

impl ApiClient {
    pub async fn list_data_sources(&self, page: PageQuery) -> ApiResult<Paginated<DataSource>> {
        self.get_with_query("datasources", &page.to_params()).await
    }

    pub async fn get_data_source(&self, id: Uuid) -> ApiResult<DataSource> {
        self.get(&format!("datasources/{id}")).await
    }

    pub async fn create_data_source(&self, request: &DataSourceCreateRequest) -> ApiResult<DataSource> {
        self.post("datasources", request).await
    }

    pub async fn update_data_source(
        &self,
        id: Uuid,
        request: &DataSourceUpdateRequest,
    ) -> ApiResult<DataSource> {
        self.put(&format!("datasources/{id}"), request).await
    }

    pub async fn delete_data_source(&self, id: Uuid) -> ApiResult<()> {
        let _: MessageResponse = self.delete(&format!("datasources/{id}")).await?;
        Ok(())
    }
}
